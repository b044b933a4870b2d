use anyhow::{Context, Result};
use pdfium_render::prelude::*;
use tracing::debug;

use crate::PaperError;
use crate::types::DocumentMetadata;

/// A decoded document: ordered page text plus the info dictionary.
pub trait DecodedDocument {
    fn page_count(&self) -> usize;

    /// Text of the page at `index` (0-based).
    fn page_text(&self, index: usize) -> Result<String, PaperError>;

    fn metadata(&self) -> DocumentMetadata;
}

/// Bind pdfium from an explicit library path, or the system library.
pub fn bind_pdfium(pdfium_path: Option<&str>) -> Result<Pdfium> {
    let bindings = if let Some(path) = pdfium_path {
        Pdfium::bind_to_library(path)
            .with_context(|| format!("Failed to load pdfium from: {path}"))?
    } else {
        Pdfium::bind_to_system_library()
            .context("Failed to find pdfium. Install pdfium-binaries or use --pdfium-path")?
    };
    Ok(Pdfium::new(bindings))
}

pub struct PdfiumDocument<'a> {
    document: PdfDocument<'a>,
}

impl<'a> PdfiumDocument<'a> {
    pub fn load(pdfium: &'a Pdfium, bytes: &'a [u8]) -> Result<Self, PaperError> {
        let document = pdfium
            .load_pdf_from_byte_slice(bytes, None)
            .map_err(|e| PaperError::Open(e.to_string()))?;
        Ok(Self { document })
    }

    fn tag(&self, tag: PdfDocumentMetadataTagType) -> Option<String> {
        self.document
            .metadata()
            .get(tag)
            .map(|t| t.value().to_string())
    }
}

impl DecodedDocument for PdfiumDocument<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn page_text(&self, index: usize) -> Result<String, PaperError> {
        let page_err = |reason: String| PaperError::Extraction { page: index + 1, reason };
        let page_index = PdfPageIndex::try_from(index).map_err(|e| page_err(e.to_string()))?;
        let page = self
            .document
            .pages()
            .get(page_index)
            .map_err(|e| page_err(e.to_string()))?;
        let text = page.text().map_err(|e| page_err(e.to_string()))?;
        Ok(text.all())
    }

    fn metadata(&self) -> DocumentMetadata {
        DocumentMetadata::from_fields(
            self.tag(PdfDocumentMetadataTagType::Title),
            self.tag(PdfDocumentMetadataTagType::Author),
            self.tag(PdfDocumentMetadataTagType::Subject),
            self.tag(PdfDocumentMetadataTagType::Keywords),
        )
    }
}

/// Concatenate page text in page order, one newline between pages.
/// Any page that fails to decode fails the whole document.
pub fn extract_text(doc: &dyn DecodedDocument) -> Result<String, PaperError> {
    let count = doc.page_count();
    let pages = (0..count)
        .map(|idx| doc.page_text(idx))
        .collect::<Result<Vec<_>, _>>()?;
    let text = pages.join("\n");
    debug!(pages = count, chars = text.len(), "extracted document text");
    Ok(text)
}
