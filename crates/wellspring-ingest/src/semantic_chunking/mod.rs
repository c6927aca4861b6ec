//! Sentence-aware chunking: segmentation, token-budgeted packing, chunk
//! assembly with provenance, an embedding-provider abstraction, and a
//! content-hash cache in front of all of it.

pub mod assembly;
pub mod batcher;
pub mod breakpoints;
pub mod cache;
pub mod config;
pub mod embeddings;
pub mod segmenter;
pub mod service;
pub mod tokenizer;
pub mod types;

pub use batcher::{embed_batched, embed_multimodal, BatcherConfig, CancelFlag, EmbedBatchOutcome, MultimodalVectors};
pub use cache::ChunkCache;
pub use config::{ChunkingConfig, HtmlConfig, JsonConfig};
pub use embeddings::{DeterministicTestProvider, EmbeddingError, EmbeddingProvider, RigEmbeddingProvider};
pub use service::{ChunkDocumentRequest, ChunkDocumentResponse, ChunkTelemetry, SemanticChunkingService};
pub use types::{ChunkMetadata, ChunkSource, ChunkingError, ChunkingOutcome, ChunkingStats, SemanticChunk};
