use std::collections::HashSet;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use quick_xml::Reader;
use quick_xml::events::Event;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::cache::SearchCache;
use crate::types::PaperRecord;

/// Records requested per keyword from each backend.
pub const RESULTS_PER_KEYWORD: usize = 5;

/// An external paper-search API.
pub trait PaperSearch {
    fn source(&self) -> &str;

    fn search(&self, query: &str, limit: usize) -> Result<Vec<PaperRecord>>;
}

/// Build the HTTP agent shared by all backends.
pub fn http_agent(timeout: Duration) -> ureq::Agent {
    ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .build()
        .into()
}

fn fetch(request: ureq::RequestBuilder<ureq::typestate::WithoutBody>) -> Result<String> {
    match request.call() {
        Ok(resp) => resp
            .into_body()
            .read_to_string()
            .context("Failed to read response body"),
        Err(ureq::Error::StatusCode(429)) => bail!("rate limited (429)"),
        Err(ureq::Error::StatusCode(code)) => bail!("HTTP {code}"),
        Err(e) => Err(e).context("request failed"),
    }
}

pub struct SemanticScholar {
    agent: ureq::Agent,
    api_key: Option<String>,
}

impl SemanticScholar {
    const ENDPOINT: &'static str = "https://api.semanticscholar.org/graph/v1/paper/search";

    pub fn new(agent: ureq::Agent, api_key: Option<String>) -> Self {
        Self { agent, api_key }
    }
}

#[derive(Deserialize)]
struct S2Response {
    #[serde(default)]
    data: Vec<S2Paper>,
}

#[derive(Deserialize)]
struct S2Paper {
    title: Option<String>,
    #[serde(default)]
    authors: Vec<S2Author>,
    year: Option<i32>,
    url: Option<String>,
    #[serde(rename = "abstract")]
    abstract_text: Option<String>,
}

#[derive(Deserialize)]
struct S2Author {
    name: Option<String>,
}

impl PaperSearch for SemanticScholar {
    fn source(&self) -> &str {
        "Semantic Scholar"
    }

    fn search(&self, query: &str, limit: usize) -> Result<Vec<PaperRecord>> {
        let mut request = self
            .agent
            .get(Self::ENDPOINT)
            .query("query", query)
            .query("limit", limit.to_string())
            .query("fields", "title,authors,year,url,abstract");
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }
        let body = fetch(request)?;
        parse_semantic_scholar(&body, self.source())
    }
}

fn parse_semantic_scholar(body: &str, source: &str) -> Result<Vec<PaperRecord>> {
    let response: S2Response =
        serde_json::from_str(body).context("Malformed Semantic Scholar response")?;
    Ok(response
        .data
        .into_iter()
        .filter_map(|p| {
            let title = p.title.filter(|t| !t.trim().is_empty())?;
            Some(PaperRecord {
                title,
                authors: p.authors.into_iter().filter_map(|a| a.name).collect(),
                year: p.year,
                url: p.url,
                abstract_text: p.abstract_text,
                source: source.to_string(),
            })
        })
        .collect())
}

pub struct Arxiv {
    agent: ureq::Agent,
}

impl Arxiv {
    const ENDPOINT: &'static str = "http://export.arxiv.org/api/query";

    pub fn new(agent: ureq::Agent) -> Self {
        Self { agent }
    }
}

impl PaperSearch for Arxiv {
    fn source(&self) -> &str {
        "arXiv"
    }

    fn search(&self, query: &str, limit: usize) -> Result<Vec<PaperRecord>> {
        let request = self
            .agent
            .get(Self::ENDPOINT)
            .query("search_query", format!("all:{query}"))
            .query("start", "0")
            .query("max_results", limit.to_string())
            .query("sortBy", "relevance");
        let body = fetch(request)?;
        parse_arxiv_feed(&body, self.source())
    }
}

#[derive(Default)]
struct AtomEntry {
    title: String,
    summary: String,
    published: String,
    id: String,
    authors: Vec<String>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum AtomField {
    None,
    Title,
    Summary,
    Published,
    Id,
    AuthorName,
}

/// Parse an arXiv Atom feed into records.
fn parse_arxiv_feed(xml: &str, source: &str) -> Result<Vec<PaperRecord>> {
    let mut reader = Reader::from_str(xml);
    let mut records = Vec::new();
    let mut entry: Option<AtomEntry> = None;
    let mut field = AtomField::None;
    let mut in_author = false;

    loop {
        match reader.read_event().context("Malformed arXiv feed")? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"entry" => entry = Some(AtomEntry::default()),
                b"author" => in_author = true,
                b"title" if entry.is_some() => field = AtomField::Title,
                b"summary" if entry.is_some() => field = AtomField::Summary,
                b"published" if entry.is_some() => field = AtomField::Published,
                b"id" if entry.is_some() => field = AtomField::Id,
                b"name" if in_author => field = AtomField::AuthorName,
                _ => {}
            },
            Event::Text(t) => {
                if let Some(current) = entry.as_mut() {
                    let text = t.unescape().context("Bad text in arXiv feed")?;
                    append_field(current, field, &text);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"entry" => {
                    if let Some(done) = entry.take() {
                        records.extend(atom_to_record(done, source));
                    }
                }
                b"author" => in_author = false,
                _ => field = AtomField::None,
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(records)
}

fn append_field(entry: &mut AtomEntry, field: AtomField, text: &str) {
    match field {
        AtomField::Title => entry.title.push_str(text),
        AtomField::Summary => entry.summary.push_str(text),
        AtomField::Published => entry.published.push_str(text),
        AtomField::Id => entry.id.push_str(text),
        AtomField::AuthorName => entry.authors.push(text.trim().to_string()),
        AtomField::None => {}
    }
}

fn atom_to_record(entry: AtomEntry, source: &str) -> Option<PaperRecord> {
    let title = collapse_whitespace(&entry.title);
    if title.is_empty() {
        return None;
    }
    let summary = collapse_whitespace(&entry.summary);
    let id = entry.id.trim();
    Some(PaperRecord {
        title,
        authors: entry.authors,
        year: entry.published.trim().get(..4).and_then(|y| y.parse().ok()),
        url: (!id.is_empty()).then(|| id.to_string()),
        abstract_text: (!summary.is_empty()).then_some(summary),
        source: source.to_string(),
    })
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Keyword-driven search across several backends, with an optional cache.
/// Constructed once by the caller and passed to whatever needs it.
pub struct LiteratureSearch {
    backends: Vec<Box<dyn PaperSearch>>,
    cache: Option<SearchCache>,
    per_keyword: usize,
}

impl LiteratureSearch {
    pub fn new(backends: Vec<Box<dyn PaperSearch>>, cache: Option<SearchCache>) -> Self {
        Self {
            backends,
            cache,
            per_keyword: RESULTS_PER_KEYWORD,
        }
    }

    /// Search every backend for every keyword. Backend failures are logged
    /// and skipped; duplicates (by URL, else title) are dropped.
    pub fn related_papers(&self, keywords: &[String]) -> Vec<PaperRecord> {
        let mut seen = HashSet::new();
        let mut results = Vec::new();
        for keyword in keywords {
            for backend in &self.backends {
                for record in self.lookup(backend.as_ref(), keyword) {
                    if seen.insert(dedup_key(&record)) {
                        results.push(record);
                    }
                }
            }
        }
        info!(keywords = keywords.len(), found = results.len(), "literature search done");
        results
    }

    fn lookup(&self, backend: &dyn PaperSearch, keyword: &str) -> Vec<PaperRecord> {
        let key = SearchCache::key(backend.source(), keyword);
        if let Some(cache) = &self.cache {
            match cache.get(&key) {
                Ok(Some(hit)) => {
                    debug!(source = backend.source(), keyword, "search cache hit");
                    return hit;
                }
                Ok(None) => {}
                Err(e) => warn!("search cache read failed: {e:#}"),
            }
        }
        match backend.search(keyword, self.per_keyword) {
            Ok(records) => {
                if let Some(cache) = &self.cache {
                    if let Err(e) = cache.put(&key, &records) {
                        warn!("search cache write failed: {e:#}");
                    }
                }
                records
            }
            Err(e) => {
                warn!(source = backend.source(), keyword, "search failed: {e:#}");
                Vec::new()
            }
        }
    }
}

fn dedup_key(record: &PaperRecord) -> String {
    match &record.url {
        Some(url) => url.clone(),
        None => record.title.to_lowercase(),
    }
}
