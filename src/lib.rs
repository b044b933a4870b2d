use pdfium_render::prelude::Pdfium;
use thiserror::Error;
use tracing::info;

pub mod cache;
pub mod keywords;
pub mod pdf;
pub mod references;
pub mod search;
pub mod sections;
pub mod sniff;
pub mod types;

pub use pdf::{DecodedDocument, PdfiumDocument};
pub use search::{LiteratureSearch, PaperSearch};
pub use sections::SectionSegmenter;
pub use sniff::{InferSniffer, MimeSniffer};
pub use types::{DocumentMetadata, KeywordSet, PaperAnalysis, PaperRecord, ReferenceEntry, SectionMap};

#[derive(Error, Debug)]
pub enum PaperError {
    #[error("not a valid PDF: {0}")]
    Validation(String),
    #[error("failed to open PDF: {0}")]
    Open(String),
    #[error("failed to extract text from page {page}: {reason}")]
    Extraction { page: usize, reason: String },
}

/// Analyze an uploaded paper.
///
/// Pipeline:
/// 1. Sniff the content type; anything but a PDF stops here
/// 2. Decode the document with pdfium
/// 3. Extract full text (any unreadable page fails the document)
/// 4. Segment sections, parse references, pick keywords
pub fn analyze_pdf(
    pdfium: &Pdfium,
    bytes: &[u8],
    sniffer: &dyn MimeSniffer,
) -> Result<PaperAnalysis, PaperError> {
    analyze_bytes(bytes, sniffer, |b| PdfiumDocument::load(pdfium, b))
}

/// Validate `bytes`, then decode them with `decode` and analyze the result.
/// `decode` is never called when validation fails.
pub fn analyze_bytes<'b, D, F>(
    bytes: &'b [u8],
    sniffer: &dyn MimeSniffer,
    decode: F,
) -> Result<PaperAnalysis, PaperError>
where
    D: DecodedDocument,
    F: FnOnce(&'b [u8]) -> Result<D, PaperError>,
{
    sniff::ensure_pdf(bytes, sniffer)?;
    let document = decode(bytes)?;
    analyze_document(&document)
}

/// Analyze an already decoded document.
pub fn analyze_document(doc: &dyn DecodedDocument) -> Result<PaperAnalysis, PaperError> {
    let text = pdf::extract_text(doc)?;
    Ok(analyze_text(&text, doc.metadata(), doc.page_count()))
}

/// Run the three text analyses independently over the same text.
pub fn analyze_text(text: &str, metadata: DocumentMetadata, page_count: usize) -> PaperAnalysis {
    let sections = sections::segment(text);
    let references = references::find_references(text);
    let keywords = keywords::extract_keywords(text);
    info!(
        sections = sections.len(),
        references = references.len(),
        keywords = keywords.len(),
        "analyzed paper"
    );
    PaperAnalysis {
        metadata,
        page_count,
        sections,
        references,
        keywords,
        related_papers: Vec::new(),
    }
}
