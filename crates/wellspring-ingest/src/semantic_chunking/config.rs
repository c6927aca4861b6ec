//! Tunables for the chunking pipeline, with the defaults named in the
//! component design: 1,000-token chunks with 100 tokens of overlap.

#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    pub max_tokens: usize,
    pub overlap_tokens: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_tokens: 1_000,
            overlap_tokens: 100,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct HtmlConfig {
    /// CSS selectors whose subtrees are dropped before text extraction.
    pub strip_selectors: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct JsonConfig {
    /// Dotted-path fields to concatenate, in order, as the chunk source text.
    /// Empty means the whole JSON value is serialized compactly.
    pub text_fields: Vec<String>,
}
