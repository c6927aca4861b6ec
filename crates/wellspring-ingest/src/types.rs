//! Shared error and identifier types for the ingestion pipeline.

use thiserror::Error;

/// Errors surfaced by ingestion, chunking and vector-store operations.
///
/// Variants map onto the `SOURCE_*`, `EMBEDDING_*`, `VECTOR_STORE_*` and
/// `VALIDATION` error families; callers one layer up (the build job
/// coordinator) translate these into the user-facing error envelope.
#[derive(Debug, Error)]
pub enum RagError {
    #[error("chunking failed: {0}")]
    Chunking(String),

    #[error("storage failed: {0}")]
    Storage(String),

    #[error("io error: {0}")]
    Io(String),

    #[error("source unreachable: {0}")]
    SourceUnreachable(String),

    #[error("source authentication failed: {0}")]
    SourceAuth(String),

    #[error("source not found: {0}")]
    SourceNotFound(String),

    #[error("embedding model unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("embedding rate limited: {0}")]
    EmbeddingRateLimited(String),

    #[error("invalid embedding input: {0}")]
    EmbeddingInvalidInput(String),

    #[error("vector store unavailable: {0}")]
    VectorStoreUnavailable(String),

    #[error("vector store index missing: {0}")]
    VectorStoreIndexMissing(String),

    #[error("validation failed: {0}")]
    Validation(String),
}

impl From<std::io::Error> for RagError {
    fn from(err: std::io::Error) -> Self {
        RagError::Io(err.to_string())
    }
}

impl From<crate::ingestion::normalizer::NormalizeError> for RagError {
    fn from(err: crate::ingestion::normalizer::NormalizeError) -> Self {
        RagError::Chunking(err.to_string())
    }
}

impl From<reqwest::Error> for RagError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() {
            RagError::SourceUnreachable(err.to_string())
        } else {
            RagError::Io(err.to_string())
        }
    }
}

/// Opaque identifier for a persisted [`SourceFile`](crate::sources::SourceFile).
pub type SourceId = String;
