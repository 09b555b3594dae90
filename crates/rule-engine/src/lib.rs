//! Rule verification engine
//!
//! Runs the full check of natural-language rules against a PDF: text
//! extraction, the model judge, and deterministic overrides for rules the
//! document can answer on its own (page count).

pub mod error;
pub mod overrides;
pub mod patterns;
pub mod pipeline;

pub use error::AnalysisError;
pub use overrides::{OverrideKind, RuleOverride, RuleOverrideEngine};
pub use pipeline::{check_page_bounds, clean_rules, AnalysisPipeline, PipelineLimits};
