/// A PDF handed over by the upload layer, with the name the client gave it.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }
}

/// Outcome of a single rule check
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerdictStatus {
    Pass,
    Fail,
}

impl VerdictStatus {
    pub fn from_passed(passed: bool) -> Self {
        if passed {
            VerdictStatus::Pass
        } else {
            VerdictStatus::Fail
        }
    }

    pub fn is_pass(self) -> bool {
        self == VerdictStatus::Pass
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Verdict {
    pub rule: String,
    pub status: VerdictStatus,
    pub evidence: String, // One sentence, ideally "Found on page N: ..."
    pub reasoning: String,
    pub confidence: f64, // 0-100, not clamped
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub file_name: String,
    pub total_pages: u32,
    pub results: Vec<Verdict>,
}
