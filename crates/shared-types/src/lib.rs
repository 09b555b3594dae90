pub mod types;

pub use types::{AnalysisResult, UploadedFile, Verdict, VerdictStatus};
