use crate::types::SectionMap;

/// Recognized section headers, in tie-break priority order.
pub const SECTION_HEADERS: [&str; 9] = [
    "Abstract",
    "Introduction",
    "Related Work",
    "Methodology",
    "Methods",
    "Results",
    "Discussion",
    "Conclusion",
    "References",
];

/// Bucket for text before the first recognized header.
pub const PREAMBLE: &str = "Preamble";

/// Where the segmenter currently is. `InSection` holds an index into the
/// header vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentState {
    Preamble,
    InSection(usize),
}

/// What a single non-blank line does to the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Line starts with a header: flush, then switch to that section.
    /// The header line itself is not kept in any body.
    OpenSection(usize),
    /// Ordinary body line.
    Accumulate,
}

/// Splits full text into named sections by line-leading header words.
#[derive(Debug, Clone)]
pub struct SectionSegmenter {
    headers: Vec<String>,
    lowered: Vec<String>,
}

impl Default for SectionSegmenter {
    fn default() -> Self {
        Self::with_headers(&SECTION_HEADERS)
    }
}

impl SectionSegmenter {
    pub fn with_headers<S: AsRef<str>>(headers: &[S]) -> Self {
        let headers: Vec<String> = headers.iter().map(|h| h.as_ref().to_string()).collect();
        let lowered = headers.iter().map(|h| h.to_lowercase()).collect();
        Self { headers, lowered }
    }

    /// Case-insensitive prefix match; the first header in vocabulary order wins.
    pub fn classify_line(&self, line: &str) -> Rule {
        let lower = line.to_lowercase();
        self.lowered
            .iter()
            .position(|h| lower.starts_with(h.as_str()))
            .map_or(Rule::Accumulate, Rule::OpenSection)
    }

    fn state_name(&self, state: SegmentState) -> &str {
        match state {
            SegmentState::Preamble => PREAMBLE,
            SegmentState::InSection(idx) => &self.headers[idx],
        }
    }

    pub fn segment(&self, text: &str) -> SectionMap {
        let mut sections = SectionMap::new();
        let mut state = SegmentState::Preamble;
        let mut body: Vec<&str> = Vec::new();

        for line in text.split('\n').map(str::trim).filter(|l| !l.is_empty()) {
            match self.classify_line(line) {
                Rule::OpenSection(idx) => {
                    self.flush(&mut sections, state, &mut body);
                    state = SegmentState::InSection(idx);
                }
                Rule::Accumulate => body.push(line),
            }
        }
        self.flush(&mut sections, state, &mut body);
        sections
    }

    /// Empty bodies are never recorded, so an earlier entry under the same
    /// name survives a later empty restatement.
    fn flush(&self, sections: &mut SectionMap, state: SegmentState, body: &mut Vec<&str>) {
        if body.is_empty() {
            return;
        }
        sections.insert(self.state_name(state), body.join("\n"));
        body.clear();
    }
}

/// Segment with the default header vocabulary.
pub fn segment(text: &str) -> SectionMap {
    SectionSegmenter::default().segment(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headerless_text_is_all_preamble() {
        let map = segment("A Study of Things\n\n  by Someone  \nUniversity of Nowhere\n");
        assert_eq!(map.len(), 1);
        assert_eq!(
            map.get(PREAMBLE),
            Some("A Study of Things\nby Someone\nUniversity of Nowhere")
        );
    }

    #[test]
    fn empty_text_yields_empty_map() {
        assert!(segment("").is_empty());
        assert!(segment("\n   \n\t\n").is_empty());
    }

    #[test]
    fn classify_accumulates_ordinary_lines() {
        let seg = SectionSegmenter::default();
        assert_eq!(seg.classify_line("We propose a method."), Rule::Accumulate);
    }

    #[test]
    fn classify_matches_prefix_case_insensitively() {
        let seg = SectionSegmenter::default();
        assert_eq!(seg.classify_line("ABSTRACT"), Rule::OpenSection(0));
        assert_eq!(seg.classify_line("related work and context"), Rule::OpenSection(2));
        assert_eq!(seg.classify_line("Methods"), Rule::OpenSection(4));
        // Header word must lead the line.
        assert_eq!(seg.classify_line("1 Introduction"), Rule::Accumulate);
    }

    #[test]
    fn classify_tie_breaks_by_vocabulary_order() {
        let seg = SectionSegmenter::with_headers(&["Method", "Methods"]);
        assert_eq!(seg.classify_line("Methods used"), Rule::OpenSection(0));
        let seg = SectionSegmenter::with_headers(&["Methods", "Method"]);
        assert_eq!(seg.classify_line("Methods used"), Rule::OpenSection(0));
        assert_eq!(seg.classify_line("Method used"), Rule::OpenSection(1));
    }

    #[test]
    fn header_opens_section_and_is_consumed() {
        let map = segment("Title line\nAbstract\nWe study X.\nIntroduction\nX matters.\nIt really does.");
        let names: Vec<_> = map.names().collect();
        assert_eq!(names, ["Preamble", "Abstract", "Introduction"]);
        assert_eq!(map.get("Preamble"), Some("Title line"));
        assert_eq!(map.get("Abstract"), Some("We study X."));
        assert_eq!(map.get("Introduction"), Some("X matters.\nIt really does."));
    }

    #[test]
    fn header_line_with_trailing_text_drops_the_text() {
        let map = segment("Abstract: we study X.\nMore abstract.");
        assert_eq!(map.get("Abstract"), Some("More abstract."));
    }

    #[test]
    fn empty_section_is_not_recorded() {
        let map = segment("Abstract\nIntroduction\nBody.");
        assert_eq!(map.get("Abstract"), None);
        assert_eq!(map.get("Introduction"), Some("Body."));
    }

    #[test]
    fn order_follows_document_not_vocabulary() {
        let map = segment("Results\nr\nAbstract\na");
        let names: Vec<_> = map.names().collect();
        assert_eq!(names, ["Results", "Abstract"]);
    }

    #[test]
    fn repeated_header_overwrites_in_place() {
        let map = segment("Methods\nfirst\nResults\nr\nMethods\nsecond");
        let names: Vec<_> = map.names().collect();
        assert_eq!(names, ["Methods", "Results"]);
        assert_eq!(map.get("Methods"), Some("second"));
    }

    #[test]
    fn repeated_header_with_empty_body_keeps_earlier() {
        let map = segment("Methods\nfirst\nMethods\nResults\nr");
        assert_eq!(map.get("Methods"), Some("first"));
    }

    #[test]
    fn bodies_reconstruct_non_header_lines() {
        let text = "Paper\nAbstract\na1\na2\nIntroduction\ni1\n\nConclusion\nc1\nReferences\n[1] x";
        let map = segment(text);
        let rebuilt: Vec<&str> = map.iter().flat_map(|(_, body)| body.split('\n')).collect();
        assert_eq!(rebuilt, ["Paper", "a1", "a2", "i1", "c1", "[1] x"]);
    }

    #[test]
    fn segmenting_is_deterministic() {
        let text = "Intro\nAbstract\nx\nMethods\ny\nMethods\nz";
        assert_eq!(segment(text), segment(text));
    }
}
