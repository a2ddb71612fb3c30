//! Deterministic model for tests and offline demos

use super::traits::{LanguageModel, ModelError, ModelResponse};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Replays a fixed queue of responses and records every prompt it receives
///
/// Once the queue is empty every call fails with [`ModelError::Unavailable`],
/// which makes "the model was called more often than expected" visible in tests.
#[derive(Debug, Default)]
pub struct ScriptedModel {
    responses: Mutex<VecDeque<Result<ModelResponse, ModelError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new(responses: impl IntoIterator<Item = ModelResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(Ok).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Queue plain text responses
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(texts.into_iter().map(ModelResponse::text))
    }

    pub fn push(&self, response: ModelResponse) {
        self.responses.lock().push_back(Ok(response));
    }

    pub fn push_error(&self, error: ModelError) {
        self.responses.lock().push_back(Err(error));
    }

    /// Number of calls made so far
    pub fn calls(&self) -> usize {
        self.prompts.lock().len()
    }

    /// Prompts received, in call order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    pub fn remaining(&self) -> usize {
        self.responses.lock().len()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn invoke(&self, prompt: &str) -> Result<ModelResponse, ModelError> {
        self.prompts.lock().push(prompt.to_string());
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(ModelError::Unavailable("script exhausted".into())))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
