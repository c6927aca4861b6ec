//! Public façade over segmentation, packing and assembly: the single entry
//! point the ingestion nodes call to turn a decoded source into chunks.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

use super::breakpoints::pack_sentences;
use super::cache::ChunkCache;
use super::config::{ChunkingConfig, HtmlConfig, JsonConfig};
use super::embeddings::EmbeddingProvider;
use super::segmenter::split_sentences_with_offsets;
use super::types::{ChunkSource, ChunkingError, ChunkingOutcome, ChunkingStats, SemanticChunk};

/// Everything the service needs to chunk (and optionally embed) one source.
/// `source_id` seeds the provenance on each chunk's metadata; when omitted
/// (the common case from workflow nodes that don't track a source id
/// explicitly) it defaults to an empty string.
pub struct ChunkDocumentRequest {
    pub source_id: Option<String>,
    pub source: ChunkSource,
    pub chunking_config: Option<ChunkingConfig>,
    pub html_config: Option<HtmlConfig>,
    pub json_config: Option<JsonConfig>,
    pub embedder: Option<Arc<dyn EmbeddingProvider>>,
}

/// Telemetry describing one chunking run, independent of the chunk payload
/// itself, so callers can log/emit metrics without holding the chunks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkTelemetry {
    pub embedder: String,
    pub source: String,
    pub duration_ms: u64,
    pub fallback_used: bool,
    pub cache_hits: usize,
    pub cache_misses: usize,
    pub smoothing_window: Option<usize>,
    pub strategy: String,
    pub chunk_count: usize,
    pub average_tokens: f64,
}

pub struct ChunkDocumentResponse {
    pub outcome: ChunkingOutcome,
    pub telemetry: ChunkTelemetry,
}

#[derive(Clone, Default)]
pub struct SemanticChunkingService {
    cache: ChunkCache,
}

fn source_label(source: &ChunkSource) -> &'static str {
    match source {
        ChunkSource::Html(_) => "html",
        ChunkSource::PlainText(_) => "text",
        ChunkSource::Json(_) => "json",
    }
}

fn average_tokens(chunks: &[SemanticChunk]) -> f64 {
    if chunks.is_empty() {
        return 0.0;
    }
    chunks.iter().map(|c| c.token_count as f64).sum::<f64>() / chunks.len() as f64
}

impl SemanticChunkingService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extracts plain text from whichever [`ChunkSource`] variant was decoded
    /// upstream by the normalizer. HTML cleaning happens at the source-adapter
    /// layer (see `sources::web::clean_text`); by the time text reaches here
    /// it is already free of script/style/nav noise.
    fn source_text(&self, source: &ChunkSource, json_config: &JsonConfig) -> Result<String, ChunkingError> {
        match source {
            ChunkSource::Html(text) | ChunkSource::PlainText(text) => Ok(text.clone()),
            ChunkSource::Json(value) => Ok(flatten_json(value, json_config)),
        }
    }

    #[instrument(skip(self, request), fields(source_id = %request.source_id.as_deref().unwrap_or("")))]
    pub async fn chunk_document(
        &self,
        request: ChunkDocumentRequest,
    ) -> Result<ChunkDocumentResponse, ChunkingError> {
        let started = Instant::now();
        let mut trace = Vec::new();
        let source = source_label(&request.source).to_string();
        let embedder_label = if request.embedder.is_some() { "configured" } else { "none" }.to_string();
        let source_id = request.source_id.unwrap_or_default();
        let chunking_config = request.chunking_config.unwrap_or_default();
        let json_config = request.json_config.unwrap_or_default();

        let text = self.source_text(&request.source, &json_config)?;

        if let Some(cached) = self.cache.get(&text) {
            trace.push("cache hit".to_string());
            let stats = ChunkingStats {
                total_segments: 0,
                total_chunks: cached.len(),
                average_tokens: average_tokens(&cached),
            };
            let telemetry = ChunkTelemetry {
                embedder: embedder_label,
                source,
                duration_ms: started.elapsed().as_millis() as u64,
                fallback_used: false,
                cache_hits: 1,
                cache_misses: 0,
                smoothing_window: None,
                strategy: "token-budget".to_string(),
                chunk_count: cached.len(),
                average_tokens: stats.average_tokens,
            };
            return Ok(ChunkDocumentResponse {
                outcome: ChunkingOutcome { chunks: cached, trace: Some(trace), stats },
                telemetry,
            });
        }

        let sentences = split_sentences_with_offsets(&text);
        trace.push(format!("segmented into {} sentences", sentences.len()));

        let spans = pack_sentences(&sentences, chunking_config.max_tokens, chunking_config.overlap_tokens);
        trace.push(format!("packed into {} spans", spans.len()));

        let heading_hierarchy: Vec<String> = Vec::new();

        let mut chunks = super::assembly::assemble_chunks(&source_id, &sentences, &spans, &heading_hierarchy);

        let mut embedded_count = 0;
        if let Some(embedder) = &request.embedder {
            let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
            let vectors = embedder
                .embed_text(&texts)
                .await
                .map_err(|e| ChunkingError::Embedding(e.to_string()))?;
            for (chunk, vector) in chunks.iter_mut().zip(vectors.into_iter()) {
                chunk.embedding = Some(vector);
                embedded_count += 1;
            }
            trace.push(format!("embedded {embedded_count} chunks"));
        }

        self.cache.put(&text, chunks.clone());

        let stats = ChunkingStats {
            total_segments: sentences.len(),
            total_chunks: chunks.len(),
            average_tokens: average_tokens(&chunks),
        };
        let telemetry = ChunkTelemetry {
            embedder: embedder_label,
            source,
            duration_ms: started.elapsed().as_millis() as u64,
            fallback_used: false,
            cache_hits: 0,
            cache_misses: 1,
            smoothing_window: Some(chunking_config.overlap_tokens),
            strategy: "token-budget".to_string(),
            chunk_count: chunks.len(),
            average_tokens: stats.average_tokens,
        };

        Ok(ChunkDocumentResponse {
            outcome: ChunkingOutcome { chunks, trace: Some(trace), stats },
            telemetry,
        })
    }
}

fn flatten_json(value: &Value, config: &JsonConfig) -> String {
    if config.text_fields.is_empty() {
        return value.to_string();
    }
    let mut parts = Vec::new();
    for path in &config.text_fields {
        if let Some(found) = path.split('.').try_fold(value, |cur, key| cur.get(key)) {
            if let Some(s) = found.as_str() {
                parts.push(s.to_string());
            } else {
                parts.push(found.to_string());
            }
        }
    }
    parts.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn chunk_document_produces_at_least_one_chunk() {
        let service = SemanticChunkingService::new();
        let request = ChunkDocumentRequest {
            source_id: Some("doc-1".to_string()),
            source: ChunkSource::PlainText("Hello world. This is a test.".to_string()),
            chunking_config: None,
            html_config: None,
            json_config: None,
            embedder: None,
        };
        let response = service.chunk_document(request).await.unwrap();
        assert!(!response.outcome.chunks.is_empty());
        assert_eq!(response.telemetry.cache_hits, 0);
    }

    #[tokio::test]
    async fn repeated_identical_source_hits_cache() {
        let service = SemanticChunkingService::new();
        let make_request = || ChunkDocumentRequest {
            source_id: Some("doc-1".to_string()),
            source: ChunkSource::PlainText("Same text every time.".to_string()),
            chunking_config: None,
            html_config: None,
            json_config: None,
            embedder: None,
        };
        service.chunk_document(make_request()).await.unwrap();
        let second = service.chunk_document(make_request()).await.unwrap();
        assert_eq!(second.telemetry.cache_hits, 1);
    }

    #[test]
    fn flatten_json_joins_configured_fields() {
        let value = serde_json::json!({"title": "Hi", "body": "There"});
        let config = JsonConfig { text_fields: vec!["title".to_string(), "body".to_string()] };
        let flattened = flatten_json(&value, &config);
        assert_eq!(flattened, "Hi\n\nThere");
    }
}
