use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::KeywordSet;

pub const MAX_KEYWORDS: usize = 5;

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w{4,}\b").unwrap());

/// Frequent function words, ranked after every content word.
const STOPWORDS: &[&str] = &[
    "about", "also", "been", "being", "between", "both", "could", "does", "each", "from",
    "have", "having", "here", "into", "more", "most", "much", "only", "other", "over",
    "same", "should", "some", "such", "than", "that", "their", "them", "then", "there",
    "these", "they", "this", "those", "through", "under", "very", "were", "what", "when",
    "where", "which", "while", "will", "with", "within", "would", "your",
];

/// Pick up to five search terms from `text`.
///
/// Candidates are all lowercase word runs of four or more characters. They
/// are ranked by frequency, ties broken by first occurrence, so the result is
/// stable for identical input. Stopwords and pure numbers stay candidates but
/// rank below every other word.
pub fn extract_keywords(text: &str) -> KeywordSet {
    let lowered = text.to_lowercase();
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();

    for (position, m) in WORD_RE.find_iter(&lowered).enumerate() {
        counts.entry(m.as_str()).or_insert((0, position)).0 += 1;
    }

    let mut ranked: Vec<(&str, (usize, usize))> = counts.into_iter().collect();
    ranked.sort_by(|(wa, (ca, fa)), (wb, (cb, fb))| {
        is_noise(wa)
            .cmp(&is_noise(wb))
            .then(cb.cmp(ca))
            .then(fa.cmp(fb))
    });
    ranked
        .into_iter()
        .take(MAX_KEYWORDS)
        .map(|(word, _)| word.to_string())
        .collect()
}

fn is_noise(word: &str) -> bool {
    word.chars().all(|c| c.is_ascii_digit()) || STOPWORDS.contains(&word)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_come_from_long_lowercase_tokens() {
        let kws = extract_keywords("Neural networks improve neural performance significantly");
        let allowed = ["neural", "networks", "improve", "performance", "significantly"];
        assert!(kws.len() <= MAX_KEYWORDS);
        assert!(kws.iter().all(|k| allowed.contains(&k.as_str())));
        assert_eq!(kws[0], "neural");
    }

    #[test]
    fn short_tokens_are_excluded() {
        let kws = extract_keywords("A cat and a dog ran far; GPU RAM too");
        assert!(kws.is_empty());
    }

    #[test]
    fn result_is_capped_and_distinct() {
        let kws = extract_keywords(
            "alpha beta gamma delta epsilon zeta theta iota kappa lambda alpha beta",
        );
        assert_eq!(kws.len(), MAX_KEYWORDS);
        let mut dedup = kws.clone();
        dedup.sort();
        dedup.dedup();
        assert_eq!(dedup.len(), kws.len());
        assert_eq!(&kws[..2], ["alpha", "beta"]);
    }

    #[test]
    fn ties_keep_first_occurrence_order() {
        let kws = extract_keywords("graph kernel graph kernel spectral");
        assert_eq!(kws, ["graph", "kernel", "spectral"]);
    }

    #[test]
    fn numbers_and_stopwords_rank_last() {
        let kws = extract_keywords("2019 2019 2019 that that with transformer");
        assert_eq!(kws, ["transformer", "2019", "that", "with"]);
    }

    #[test]
    fn function_words_alone_still_yield_keywords() {
        let kws = extract_keywords("2019 2020 that with this from");
        assert_eq!(kws, ["2019", "2020", "that", "with", "this"]);
    }

    #[test]
    fn every_long_token_is_a_candidate() {
        let kws = extract_keywords("Results from these experiments");
        assert_eq!(kws, ["results", "experiments", "from", "these"]);
    }

    #[test]
    fn extraction_is_deterministic() {
        let text = "Sparse attention mechanisms reduce memory usage for long sequences";
        assert_eq!(extract_keywords(text), extract_keywords(text));
    }
}
