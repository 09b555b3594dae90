//! Validation of the judge's raw reply into trusted [`Verdict`]s
//!
//! The reply is untrusted: the envelope (valid JSON, an array) is checked
//! strictly, while individual fields are coerced to safe defaults.

use serde_json::Value;
use shared_types::{Verdict, VerdictStatus};

use crate::error::JudgeError;

/// Parse the raw reply and check that it is a JSON array.
pub fn parse_verdict_array(raw: &str) -> Result<Vec<Value>, JudgeError> {
    let parsed: Value = serde_json::from_str(raw)
        .map_err(|_| JudgeError::protocol("LLM returned invalid JSON", raw))?;

    match parsed {
        Value::Array(items) => Ok(items),
        _ => Err(JudgeError::protocol("LLM result is not an array", raw)),
    }
}

/// Coerce one array element into a verdict. Never fails.
pub fn normalize_verdict(item: &Value) -> Verdict {
    Verdict {
        rule: string_field(item, "rule"),
        status: match item.get("status") {
            Some(Value::String(s)) if s == "pass" => VerdictStatus::Pass,
            _ => VerdictStatus::Fail,
        },
        evidence: string_field(item, "evidence"),
        reasoning: string_field(item, "reasoning"),
        confidence: item
            .get("confidence")
            .and_then(Value::as_f64)
            .filter(|c| c.is_finite())
            .unwrap_or(0.0),
    }
}

/// Strings pass through, other scalars are stringified, missing/null/false/""
/// become the empty string.
fn string_field(item: &Value, key: &str) -> String {
    match item.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | Some(Value::Bool(false)) | None => String::new(),
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => String::new(),
        Some(Value::Bool(true)) => "true".to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => other.to_string(),
    }
}
