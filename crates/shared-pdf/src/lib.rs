//! Shared PDF handling utilities
//!
//! This crate turns an uploaded PDF buffer into plain text plus a page
//! count, the only view of the document the rule checker needs.

pub mod extract;
#[cfg(any(test, feature = "test-utils"))]
pub mod fixtures;

pub use extract::{extract_document, ExtractionError, PdfDocument};
