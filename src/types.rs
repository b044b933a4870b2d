use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Document info dictionary fields, with sentinels for missing values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentMetadata {
    pub title: String,
    pub author: String,
    pub subject: String,
    pub keywords: String,
}

impl DocumentMetadata {
    pub const UNTITLED: &'static str = "Untitled";
    pub const UNKNOWN_AUTHOR: &'static str = "Unknown";

    /// Build from optional raw fields, substituting the sentinels for
    /// absent or blank values.
    pub fn from_fields(
        title: Option<String>,
        author: Option<String>,
        subject: Option<String>,
        keywords: Option<String>,
    ) -> Self {
        Self {
            title: non_blank(title).unwrap_or_else(|| Self::UNTITLED.to_string()),
            author: non_blank(author).unwrap_or_else(|| Self::UNKNOWN_AUTHOR.to_string()),
            subject: non_blank(subject).unwrap_or_default(),
            keywords: non_blank(keywords).unwrap_or_default(),
        }
    }
}

impl Default for DocumentMetadata {
    fn default() -> Self {
        Self::from_fields(None, None, None, None)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Section name to body, kept in first-occurrence document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionMap {
    entries: Vec<(String, String)>,
}

impl SectionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a section body. A name already present keeps its position and
    /// takes the new body (last write wins).
    pub fn insert(&mut self, name: &str, body: String) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = body,
            None => self.entries.push((name.to_string(), body)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, body)| body.as_str())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, b)| (n.as_str(), b.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for SectionMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, body) in &self.entries {
            map.serialize_entry(name, body)?;
        }
        map.end()
    }
}

/// One entry from the references block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceEntry {
    /// 1-based position after splitting.
    pub index: usize,
    pub raw_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authors: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
}

/// Up to five distinct lowercase search terms, highest ranked first.
pub type KeywordSet = Vec<String>;

/// A paper returned by an external literature search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperRecord {
    pub title: String,
    pub authors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(rename = "abstract", skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,
    pub source: String,
}

/// Everything derived from one paper, ready for JSON output.
#[derive(Debug, Clone, Serialize)]
pub struct PaperAnalysis {
    pub metadata: DocumentMetadata,
    pub page_count: usize,
    pub sections: SectionMap,
    pub references: Vec<ReferenceEntry>,
    pub keywords: KeywordSet,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub related_papers: Vec<PaperRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_sentinels_for_missing_fields() {
        let meta = DocumentMetadata::from_fields(None, Some("  ".into()), None, Some("ml".into()));
        assert_eq!(meta.title, "Untitled");
        assert_eq!(meta.author, "Unknown");
        assert_eq!(meta.subject, "");
        assert_eq!(meta.keywords, "ml");
    }

    #[test]
    fn section_map_overwrites_in_place() {
        let mut map = SectionMap::new();
        map.insert("Preamble", "a".into());
        map.insert("Methods", "b".into());
        map.insert("Results", "c".into());
        map.insert("Methods", "d".into());
        let names: Vec<_> = map.names().collect();
        assert_eq!(names, ["Preamble", "Methods", "Results"]);
        assert_eq!(map.get("Methods"), Some("d"));
    }

    #[test]
    fn section_map_serializes_in_document_order() {
        let mut map = SectionMap::new();
        map.insert("Preamble", "x".into());
        map.insert("Abstract", "y".into());
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"Preamble":"x","Abstract":"y"}"#);
    }

    #[test]
    fn reference_entry_omits_absent_fields() {
        let entry = ReferenceEntry {
            index: 1,
            raw_text: "Untitled note".into(),
            year: None,
            title: Some("Untitled note".into()),
            authors: None,
            venue: None,
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(json, r#"{"index":1,"raw_text":"Untitled note","title":"Untitled note"}"#);
    }
}
