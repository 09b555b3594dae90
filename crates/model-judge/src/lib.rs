//! Generative-model judge
//!
//! Renders the judge prompt, sends it to a [`GenerativeBackend`] and turns
//! the untrusted reply into exactly one [`Verdict`] per submitted rule.

pub mod backend;
pub mod error;
pub mod gemini;
pub mod normalize;
pub mod prompt;

use std::sync::Arc;

use shared_types::Verdict;
use tracing::{debug, warn};

pub use backend::{GenerativeBackend, MockBackend};
pub use error::JudgeError;
pub use gemini::{GeminiClient, JudgeConfig};
pub use normalize::{normalize_verdict, parse_verdict_array};
pub use prompt::{build_prompt, truncate_text, MAX_DOCUMENT_CHARS};

/// Evaluates rules against document text through a generative model
#[derive(Clone)]
pub struct ModelJudge {
    backend: Arc<dyn GenerativeBackend>,
}

impl ModelJudge {
    pub fn new(backend: Arc<dyn GenerativeBackend>) -> Self {
        Self { backend }
    }

    pub fn model_name(&self) -> &str {
        self.backend.model_name()
    }

    /// Judge `rules` against `text`, returning verdicts in rule order.
    ///
    /// Each verdict's `rule` is the submitted rule text at the same index;
    /// whatever the model echoed back is discarded.
    ///
    /// # Errors
    /// - `JudgeError::Protocol` - reply is not JSON, not an array, or has
    ///   fewer elements than rules
    /// - any backend error, unchanged
    pub async fn judge(&self, text: &str, rules: &[String]) -> Result<Vec<Verdict>, JudgeError> {
        let prompt = build_prompt(text, rules);
        debug!(
            model = self.backend.model_name(),
            prompt_chars = prompt.chars().count(),
            rules = rules.len(),
            "Sending judge prompt"
        );

        let raw = self.backend.generate_json(&prompt).await?;
        let items = parse_verdict_array(&raw).map_err(log_protocol_error)?;

        if items.len() < rules.len() {
            return Err(log_protocol_error(JudgeError::Protocol {
                message: format!(
                    "LLM returned {} verdicts for {} rules",
                    items.len(),
                    rules.len()
                ),
                raw,
            }));
        }
        if items.len() > rules.len() {
            debug!(
                "Ignoring {} surplus verdicts from model",
                items.len() - rules.len()
            );
        }

        let verdicts = items
            .iter()
            .zip(rules)
            .map(|(item, rule)| {
                let mut verdict = normalize_verdict(item);
                if verdict.rule != *rule {
                    debug!(echoed = %verdict.rule, submitted = %rule, "Model altered rule text");
                }
                verdict.rule = rule.clone();
                verdict
            })
            .collect();

        Ok(verdicts)
    }
}

fn log_protocol_error(err: JudgeError) -> JudgeError {
    if let Some(raw) = err.raw_response() {
        warn!("Failed to parse judge reply ({}): {}", err, raw);
    }
    err
}
