//! Gemini `generateContent` client
//!
//! Sends one JSON-mode generation request per prompt. Transient failures
//! (5xx, 429, timeouts, connection errors) are retried with exponential
//! backoff up to `max_retries` times; everything else fails immediately.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::backend::GenerativeBackend;
use crate::error::JudgeError;

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Connection settings for the judge, fixed at process start
#[derive(Clone)]
pub struct JudgeConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    /// Per-attempt request timeout
    pub timeout_secs: u64,
    /// Extra attempts after the first one, for transient failures only
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each further retry
    pub retry_backoff_ms: u64,
}

impl JudgeConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    fn backoff_for(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.retry_backoff_ms.saturating_mul(1u64 << attempt.min(16)))
    }
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 60,
            max_retries: 2,
            retry_backoff_ms: 500,
        }
    }
}

// Keep the key out of logs
impl fmt::Debug for JudgeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JudgeConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .finish()
    }
}

/// HTTP client for the Gemini API
pub struct GeminiClient {
    config: JudgeConfig,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(config: JudgeConfig) -> Result<Self, JudgeError> {
        if config.api_key.trim().is_empty() {
            return Err(JudgeError::Config("GEMINI_API_KEY is not set".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| JudgeError::Config(e.to_string()))?;

        Ok(Self {
            config: JudgeConfig {
                base_url: config.base_url.trim_end_matches('/').to_string(),
                ..config
            },
            client,
        })
    }

    pub fn config(&self) -> &JudgeConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url, self.config.model
        )
    }

    async fn send_once(&self, prompt: &str) -> Result<String, JudgeError> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
            },
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    JudgeError::Timeout(self.config.timeout_secs)
                } else {
                    JudgeError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(JudgeError::Backend {
                status: status.as_u16(),
                body,
            });
        }

        let raw = response.text().await.map_err(|e| {
            if e.is_timeout() {
                JudgeError::Timeout(self.config.timeout_secs)
            } else {
                JudgeError::Transport(e.to_string())
            }
        })?;

        let parsed: GenerateContentResponse = serde_json::from_str(&raw).map_err(|_| {
            JudgeError::protocol("Model backend returned a malformed response", raw.as_str())
        })?;

        parsed.into_text().ok_or(JudgeError::EmptyResponse)
    }
}

#[async_trait]
impl GenerativeBackend for GeminiClient {
    async fn generate_json(&self, prompt: &str) -> Result<String, JudgeError> {
        let mut attempt = 0;
        loop {
            match self.send_once(prompt).await {
                Ok(text) => {
                    debug!(attempt, chars = text.len(), "Gemini reply received");
                    return Ok(text);
                }
                Err(err) if err.is_transient() && attempt < self.config.max_retries => {
                    let delay = self.config.backoff_for(attempt);
                    warn!(
                        "Gemini call failed ({}), retrying in {}ms ({}/{})",
                        err,
                        delay.as_millis(),
                        attempt + 1,
                        self.config.max_retries
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

/// Request body for generateContent
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

/// Response body from generateContent
#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first candidate, all parts joined
    fn into_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content
            .parts
            .into_iter()
            .filter_map(|part| part.text)
            .collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}
