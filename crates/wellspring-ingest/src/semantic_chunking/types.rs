//! Core value types for semantic chunking.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

/// Decoded input handed to the chunking service. The decoder stage
/// (normalizer) has already reduced HTML/PDF/CSV/text to one of these.
#[derive(Debug, Clone)]
pub enum ChunkSource {
    Html(String),
    PlainText(String),
    Json(Value),
}

/// Provenance carried alongside each chunk's text.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChunkMetadata {
    pub source_id: String,
    pub ordinal: usize,
    pub start_offset: usize,
    pub end_offset: usize,
    #[serde(default)]
    pub heading_hierarchy: Vec<String>,
}

/// A bounded text fragment produced by the chunker, optionally embedded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticChunk {
    pub id: Uuid,
    pub content: String,
    pub token_count: usize,
    pub metadata: ChunkMetadata,
    pub embedding: Option<Vec<f32>>,
}

impl SemanticChunk {
    pub fn new(content: impl Into<String>, token_count: usize, metadata: ChunkMetadata) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            token_count,
            metadata,
            embedding: None,
        }
    }
}

/// Aggregate counts describing one chunking run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChunkingStats {
    pub total_segments: usize,
    pub total_chunks: usize,
    pub average_tokens: f64,
}

/// Result of chunking one document: the chunks themselves, an optional
/// human-readable trace of the packing decisions, and summary stats.
#[derive(Debug, Clone)]
pub struct ChunkingOutcome {
    pub chunks: Vec<SemanticChunk>,
    pub trace: Option<Vec<String>>,
    pub stats: ChunkingStats,
}

#[derive(Debug, Error)]
pub enum ChunkingError {
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("tokenizer failed: {0}")]
    Tokenizer(String),
    #[error("embedding failed: {0}")]
    Embedding(String),
}
