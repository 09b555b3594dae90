//! PDF text extraction
//!
//! Loads the PDF structure to count pages, then pulls the text of every page
//! out with pdf-extract and merges it into one string in page order.
//!
//! # Example
//! ```no_run
//! use shared_pdf::{extract_document, ExtractionError};
//!
//! fn describe(pdf_bytes: &[u8]) -> Result<(), ExtractionError> {
//!     let document = extract_document(pdf_bytes)?;
//!     println!("{} pages, {} chars", document.page_count, document.text.len());
//!     Ok(())
//! }
//! ```

use pdf_extract::{extract_text_from_mem, Document};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Errors raised while decoding an uploaded PDF
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("Invalid PDF: {0}")]
    InvalidPdf(String),

    #[error("Password-protected PDF")]
    PasswordProtected,

    #[error("PDF text extraction failed: {0}")]
    TextExtraction(String),
}

/// Text and page count of one uploaded document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfDocument {
    /// Number of pages in the page tree
    pub page_count: u32,

    /// Text of all pages, merged in natural page order
    pub text: String,
}

/// Decode a PDF byte buffer into its merged text and page count.
///
/// # Errors
/// - `ExtractionError::InvalidPdf` - the buffer is not a loadable PDF
/// - `ExtractionError::PasswordProtected` - the document is encrypted
/// - `ExtractionError::TextExtraction` - the structure loaded but text decoding failed
pub fn extract_document(pdf_bytes: &[u8]) -> Result<PdfDocument, ExtractionError> {
    if !looks_like_pdf(pdf_bytes) {
        return Err(ExtractionError::InvalidPdf(
            "missing %PDF header".to_string(),
        ));
    }

    // pdf-extract re-exports Document from lopdf
    let document = Document::load_mem(pdf_bytes).map_err(|e| classify_error(&e.to_string()))?;

    if document.trailer.get(b"Encrypt").is_ok() {
        return Err(ExtractionError::PasswordProtected);
    }

    let page_count = document.get_pages().len() as u32;

    let text = extract_text_from_mem(pdf_bytes).map_err(|e| match classify_error(&e.to_string()) {
        ExtractionError::InvalidPdf(msg) => ExtractionError::TextExtraction(msg),
        other => other,
    })?;

    debug!(page_count, chars = text.chars().count(), "Extracted PDF text");

    Ok(PdfDocument { page_count, text })
}

/// Cheap header sniff; the header may follow a few bytes of junk
fn looks_like_pdf(data: &[u8]) -> bool {
    data.windows(5).take(1024).any(|w| w == b"%PDF-")
}

fn classify_error(message: &str) -> ExtractionError {
    let lower = message.to_lowercase();
    if lower.contains("encrypt") || lower.contains("password") {
        ExtractionError::PasswordProtected
    } else {
        ExtractionError::InvalidPdf(message.to_string())
    }
}
