use tracing::debug;

use crate::PaperError;

pub const PDF_MIME: &str = "application/pdf";

/// Content-based MIME detection. Filenames are never consulted.
pub trait MimeSniffer: Send + Sync {
    fn sniff(&self, bytes: &[u8]) -> Option<String>;
}

/// Magic-byte detection via the `infer` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct InferSniffer;

impl MimeSniffer for InferSniffer {
    fn sniff(&self, bytes: &[u8]) -> Option<String> {
        infer::get(bytes).map(|kind| kind.mime_type().to_string())
    }
}

pub fn is_pdf(bytes: &[u8], sniffer: &dyn MimeSniffer) -> bool {
    ensure_pdf(bytes, sniffer).is_ok()
}

/// Reject anything whose content does not sniff as a PDF.
pub fn ensure_pdf(bytes: &[u8], sniffer: &dyn MimeSniffer) -> Result<(), PaperError> {
    match sniffer.sniff(bytes) {
        Some(mime) if mime == PDF_MIME => Ok(()),
        Some(mime) => {
            debug!(%mime, "rejecting non-PDF upload");
            Err(PaperError::Validation(format!("content type is {mime}")))
        }
        None => Err(PaperError::Validation("content type not recognized".into())),
    }
}
