//! Error types for the model judge

use thiserror::Error;

#[derive(Error, Debug)]
pub enum JudgeError {
    /// The model answered, but not with the JSON array we asked for.
    /// `raw` is kept for logs only and never shown to callers.
    #[error("{message}")]
    Protocol { message: String, raw: String },

    #[error("Model backend returned HTTP {status}")]
    Backend { status: u16, body: String },

    #[error("Model request timed out after {0}s")]
    Timeout(u64),

    #[error("Model backend unreachable: {0}")]
    Transport(String),

    #[error("Model returned no content")]
    EmptyResponse,

    #[error("Invalid judge configuration: {0}")]
    Config(String),
}

impl JudgeError {
    pub(crate) fn protocol(message: impl Into<String>, raw: impl Into<String>) -> Self {
        JudgeError::Protocol {
            message: message.into(),
            raw: raw.into(),
        }
    }

    /// Whether retrying the same request could succeed
    pub fn is_transient(&self) -> bool {
        match self {
            JudgeError::Backend { status, .. } => *status == 429 || *status >= 500,
            JudgeError::Timeout(_) | JudgeError::Transport(_) => true,
            _ => false,
        }
    }

    /// Raw model output attached to protocol errors
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            JudgeError::Protocol { raw, .. } => Some(raw),
            _ => None,
        }
    }
}
