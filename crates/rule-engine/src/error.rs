//! Error types for the analysis pipeline

use model_judge::JudgeError;
use shared_pdf::ExtractionError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Unusable rule input
    #[error("{0}")]
    Validation(String),

    #[error("PDF must be between {min} and {max} pages.")]
    PageCount { pages: u32, min: u32, max: u32 },

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Judge(#[from] JudgeError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AnalysisError {
    /// Failures caused by the request itself rather than by the service
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AnalysisError::Validation(_)
                | AnalysisError::PageCount { .. }
                | AnalysisError::Extraction(_)
        )
    }
}
