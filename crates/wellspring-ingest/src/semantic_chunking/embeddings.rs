//! Embedding-provider abstraction for the chunking service.
//!
//! Deliberately thin: the chunker only needs "give me a vector for this
//! text", so providers (rig-core models, a local ONNX model, a test double)
//! all implement the same trait rather than the chunker depending on any
//! one embedding backend directly.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding model unavailable: {0}")]
    ModelUnavailable(String),
    #[error("embedding rate limited")]
    RateLimited,
    #[error("invalid input for embedding: {0}")]
    InvalidInput(String),
}

/// Produces dense vectors for text (and, for multimodal models, images).
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    fn dimension(&self) -> usize;

    async fn embed_text(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Default: multimodal is opt-in, most providers are text-only.
    async fn embed_image(&self, _images: &[Vec<u8>]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Err(EmbeddingError::InvalidInput(
            "this provider does not support image embeddings".to_string(),
        ))
    }
}

/// A provider wrapping a `rig`-style embedding model. The concrete rig
/// client type is generic so both cloud and local rig backends work here.
pub struct RigEmbeddingProvider<M> {
    model: M,
    dimension: usize,
}

impl<M> RigEmbeddingProvider<M> {
    pub fn new(model: M, dimension: usize) -> Self {
        Self { model, dimension }
    }
}

#[async_trait]
impl<M> EmbeddingProvider for RigEmbeddingProvider<M>
where
    M: rig::embeddings::EmbeddingModel + Clone + Send + Sync,
{
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_text(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let docs: Vec<String> = texts.to_vec();
        let embeddings = self
            .model
            .embed_texts(docs)
            .await
            .map_err(|e| EmbeddingError::ModelUnavailable(e.to_string()))?;
        Ok(embeddings
            .into_iter()
            .map(|e| e.vec.into_iter().map(|v| v as f32).collect())
            .collect())
    }
}

/// A fixed-dimension, deterministic provider for tests and offline runs.
/// Hashes each input's bytes into a pseudo-vector so identical text always
/// yields identical vectors without calling out to a model.
pub struct DeterministicTestProvider {
    dimension: usize,
}

impl DeterministicTestProvider {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

#[async_trait]
impl EmbeddingProvider for DeterministicTestProvider {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_text(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|t| hash_vector(t, self.dimension)).collect())
    }
}

fn hash_vector(text: &str, dimension: usize) -> Vec<f32> {
    use std::hash::{Hash, Hasher};
    let mut out = Vec::with_capacity(dimension);
    for i in 0..dimension {
        let mut hasher = rustc_hash::FxHasher::default();
        text.hash(&mut hasher);
        i.hash(&mut hasher);
        let bits = hasher.finish();
        out.push(((bits % 2000) as f32 / 1000.0) - 1.0);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn deterministic_provider_is_stable() {
        let provider = DeterministicTestProvider::new(8);
        let a = provider.embed_text(&["hello".to_string()]).await.unwrap();
        let b = provider.embed_text(&["hello".to_string()]).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a[0].len(), 8);
    }

    #[tokio::test]
    async fn empty_input_yields_empty_output() {
        let provider = DeterministicTestProvider::new(8);
        let out = provider.embed_text(&[]).await.unwrap();
        assert!(out.is_empty());
    }
}
