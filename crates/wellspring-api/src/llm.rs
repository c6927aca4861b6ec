//! LLM completion abstraction.
//!
//! Thin wrapper over a `rig` completion model, mirroring the shape of
//! [`wellspring_ingest::semantic_chunking::EmbeddingProvider`]: callers
//! depend on [`LlmClient`], not on any one provider, so swapping Ollama for
//! a cloud model is a construction-site change only.

use async_trait::async_trait;
use rig::client::CompletionClient;
use rig::completion::{CompletionModel, Message as RigMessage};
use rig::providers::ollama;

use crate::error::ApiError;

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, preamble: &str, prompt: &str, temperature: f64) -> Result<String, ApiError>;
}

/// Ollama-backed client, selecting a model by name per call site (agents and
/// the query executor may use different models for the same request).
pub struct OllamaClient {
    client: ollama::Client,
}

impl OllamaClient {
    pub fn new() -> Self {
        Self {
            client: ollama::Client::new(),
        }
    }

    pub async fn complete_with_model(
        &self,
        model: &str,
        preamble: &str,
        prompt: &str,
        temperature: f64,
    ) -> Result<String, ApiError> {
        let completion_model = self.client.completion_model(model);
        let request = completion_model
            .completion_request(RigMessage::user(prompt.to_string()))
            .preamble(preamble.to_string())
            .temperature(temperature)
            .build();

        let response = completion_model
            .completion(request)
            .await
            .map_err(|e| ApiError::LlmUnavailable(e.to_string()))?;

        response
            .choice
            .into_iter()
            .next()
            .map(|choice| format!("{choice:?}"))
            .ok_or_else(|| ApiError::LlmUnavailable("empty completion response".to_string()))
    }
}

impl Default for OllamaClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn complete(&self, preamble: &str, prompt: &str, temperature: f64) -> Result<String, ApiError> {
        self.complete_with_model("llama3", preamble, prompt, temperature).await
    }
}
