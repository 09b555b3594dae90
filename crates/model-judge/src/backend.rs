use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::JudgeError;

/// A generative model that answers a prompt with JSON text.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// Send `prompt` in JSON-only mode and return the raw reply text.
    async fn generate_json(&self, prompt: &str) -> Result<String, JudgeError>;

    /// Model identifier, for logs
    fn model_name(&self) -> &str;
}

/// Mock backend for testing — replays queued replies and records prompts.
///
/// Once the queue is drained the last reply is repeated.
pub struct MockBackend {
    replies: Mutex<VecDeque<Result<String, JudgeError>>>,
    last_reply: Mutex<Option<String>>,
    prompts: Mutex<Vec<String>>,
}

impl MockBackend {
    pub fn new(reply: &str) -> Self {
        let backend = Self::empty();
        backend.push_reply(reply);
        backend
    }

    pub fn failing(error: JudgeError) -> Self {
        let backend = Self::empty();
        backend.push_error(error);
        backend
    }

    fn empty() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            last_reply: Mutex::new(None),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn push_reply(&self, reply: &str) {
        lock(&self.replies).push_back(Ok(reply.to_string()));
    }

    pub fn push_error(&self, error: JudgeError) {
        lock(&self.replies).push_back(Err(error));
    }

    /// Prompts received so far, oldest first
    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.prompts).len()
    }
}

#[async_trait]
impl GenerativeBackend for MockBackend {
    async fn generate_json(&self, prompt: &str) -> Result<String, JudgeError> {
        lock(&self.prompts).push(prompt.to_string());

        match lock(&self.replies).pop_front() {
            Some(Ok(reply)) => {
                *lock(&self.last_reply) = Some(reply.clone());
                Ok(reply)
            }
            Some(Err(err)) => Err(err),
            None => lock(&self.last_reply).clone().ok_or(JudgeError::EmptyResponse),
        }
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}

// A poisoned mock only means another test thread panicked; keep its data.
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
