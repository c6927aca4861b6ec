//! Agent-runtime node implementations for RAG pipelines.
//!
//! This module provides ready-to-use `Node` implementations that integrate
//! wellspring-ingest's chunking and embedding capabilities into the agent
//! execution graph.
//!
//! # Feature Flag
//!
//! This module requires the `core-nodes` feature:
//!
//! ```toml
//! [dependencies]
//! wellspring-ingest = { version = "0.1", features = ["core-nodes"] }
//! ```
//!
//! # Available Nodes
//!
//! - [`ChunkingNode`] - Semantic chunking of documents into retrievable segments
//!
//! # Usage Example
//!
//! ```rust,ignore
//! use wellspring_core::graphs::GraphBuilder;
//! use wellspring_ingest::nodes::ChunkingNode;
//!
//! let chunking_node = ChunkingNode::builder()
//!     .service(chunking_service)
//!     .input_key("document_html")
//!     .output_key("chunks")
//!     .build();
//!
//! let mut builder = GraphBuilder::new();
//! builder.add_node("chunker", chunking_node);
//! builder.add_edge("Start", "chunker");
//! builder.add_edge("chunker", "End");
//! ```

mod chunking;

pub use chunking::{ChunkingNode, ChunkingNodeBuilder, ChunkingNodeError};
