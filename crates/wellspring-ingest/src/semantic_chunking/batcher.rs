//! Concurrent, rate-limited batched embedding.
//!
//! Chunks are grouped into batches of `batch_size`, dispatched to a worker
//! pool of `workers` tasks, each call gated by a global token-bucket rate
//! limiter. A batch failing doesn't fail the run: the per-chunk success
//! mask records which chunks got a vector, and chunks with none are
//! retried once, in a single final batch, after the main pass finishes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;

use super::embeddings::EmbeddingProvider;
use super::types::SemanticChunk;

#[derive(Clone, Copy, Debug)]
pub struct BatcherConfig {
    pub batch_size: usize,
    pub workers: usize,
    pub rate_per_sec: f64,
}

impl Default for BatcherConfig {
    fn default() -> Self {
        Self {
            batch_size: 5,
            workers: 4,
            rate_per_sec: 10.0,
        }
    }
}

/// Result of one batched embedding run: vectors aligned 1:1 with the input
/// chunk slice, `None` where embedding never succeeded.
#[derive(Debug, Clone)]
pub struct EmbedBatchOutcome {
    pub vectors: Vec<Option<Vec<f32>>>,
    pub success_mask: Vec<bool>,
}

impl EmbedBatchOutcome {
    pub fn succeeded_count(&self) -> usize {
        self.success_mask.iter().filter(|ok| **ok).count()
    }

    pub fn failed_indices(&self) -> Vec<usize> {
        self.success_mask
            .iter()
            .enumerate()
            .filter_map(|(i, ok)| (!ok).then_some(i))
            .collect()
    }
}

struct TokenBucket {
    state: Mutex<(f64, Instant)>,
    capacity: f64,
    refill_per_sec: f64,
}

impl TokenBucket {
    fn new(rate_per_sec: f64) -> Self {
        let rate = rate_per_sec.max(0.1);
        Self {
            state: Mutex::new((rate, Instant::now())),
            capacity: rate,
            refill_per_sec: rate,
        }
    }

    async fn acquire(&self) {
        loop {
            {
                let mut state = self.state.lock().await;
                let now = Instant::now();
                let elapsed = now.duration_since(state.1).as_secs_f64();
                state.0 = (state.0 + elapsed * self.refill_per_sec).min(self.capacity);
                state.1 = now;
                if state.0 >= 1.0 {
                    state.0 -= 1.0;
                    return;
                }
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
    }
}

/// Cooperative cancellation flag shared with a build job's coordinator.
/// Draining in-flight batches before honoring it is the caller's job: this
/// function only stops *enqueuing new batches* once it observes `true`.
pub type CancelFlag = Arc<AtomicBool>;

/// Embeds `chunks`' text content, batched and rate-limited per `config`.
pub async fn embed_batched(
    chunks: &[SemanticChunk],
    embedder: Arc<dyn EmbeddingProvider>,
    config: BatcherConfig,
    cancelled: CancelFlag,
) -> EmbedBatchOutcome {
    let limiter = Arc::new(TokenBucket::new(config.rate_per_sec));
    let semaphore = Arc::new(Semaphore::new(config.workers.max(1)));

    let mut vectors: Vec<Option<Vec<f32>>> = vec![None; chunks.len()];
    let mut success = vec![false; chunks.len()];

    let batches: Vec<Vec<usize>> = (0..chunks.len())
        .collect::<Vec<_>>()
        .chunks(config.batch_size.max(1))
        .map(|c| c.to_vec())
        .collect();

    let mut join_set = JoinSet::new();
    for batch_indices in batches {
        if cancelled.load(Ordering::SeqCst) {
            break;
        }
        let permit = semaphore.clone().acquire_owned().await.expect("semaphore never closed");
        let limiter = limiter.clone();
        let embedder = embedder.clone();
        let texts: Vec<String> = batch_indices.iter().map(|&i| chunks[i].content.clone()).collect();
        join_set.spawn(async move {
            limiter.acquire().await;
            let result = embedder.embed_text(&texts).await;
            drop(permit);
            (batch_indices, result)
        });
    }

    let mut failed_indices = Vec::new();
    while let Some(joined) = join_set.join_next().await {
        let (batch_indices, result) = joined.expect("embedding worker task panicked");
        match result {
            Ok(embedded) => {
                for (i, vector) in batch_indices.iter().zip(embedded.into_iter()) {
                    vectors[*i] = Some(vector);
                    success[*i] = true;
                }
            }
            Err(_) => failed_indices.extend(batch_indices),
        }
    }

    if !failed_indices.is_empty() && !cancelled.load(Ordering::SeqCst) {
        limiter.acquire().await;
        let texts: Vec<String> = failed_indices.iter().map(|&i| chunks[i].content.clone()).collect();
        if let Ok(embedded) = embedder.embed_text(&texts).await {
            for (i, vector) in failed_indices.iter().zip(embedded.into_iter()) {
                vectors[*i] = Some(vector);
                success[*i] = true;
            }
        }
    }

    EmbedBatchOutcome {
        vectors,
        success_mask: success,
    }
}

/// Multimodal result: a text vector and, when the chunk carried an image,
/// an image vector alongside it.
#[derive(Debug, Clone)]
pub struct MultimodalVectors {
    pub text: Vec<f32>,
    pub image: Option<Vec<f32>>,
}

/// Embeds both the text and (when present) the image payload of each chunk.
/// Runs after the text-only pass conceptually, but is a separate entry
/// point since not every build uses a multimodal embedding model.
pub async fn embed_multimodal(
    texts: &[String],
    images: &[Option<Vec<u8>>],
    embedder: Arc<dyn EmbeddingProvider>,
) -> Result<Vec<MultimodalVectors>, super::embeddings::EmbeddingError> {
    let text_vectors = embedder.embed_text(texts).await?;
    let mut out = Vec::with_capacity(text_vectors.len());
    for (i, text_vector) in text_vectors.into_iter().enumerate() {
        let image_vector = match images.get(i).and_then(|img| img.as_ref()) {
            Some(bytes) => Some(embedder.embed_image(std::slice::from_ref(bytes)).await?.remove(0)),
            None => None,
        };
        out.push(MultimodalVectors {
            text: text_vector,
            image: image_vector,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic_chunking::types::ChunkMetadata;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    struct CountingEmbedder {
        calls: AtomicUsize,
        fail_content: Option<String>,
    }

    #[async_trait]
    impl EmbeddingProvider for CountingEmbedder {
        fn dimension(&self) -> usize {
            3
        }

        async fn embed_text(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, super::super::embeddings::EmbeddingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(bad) = &self.fail_content {
                if texts.iter().any(|t| t == bad) {
                    return Err(super::super::embeddings::EmbeddingError::RateLimited);
                }
            }
            Ok(texts.iter().map(|t| vec![t.len() as f32, 0.0, 0.0]).collect())
        }
    }

    fn chunk(content: &str, ordinal: usize) -> SemanticChunk {
        SemanticChunk::new(
            content,
            content.len(),
            ChunkMetadata {
                source_id: "s1".into(),
                ordinal,
                start_offset: 0,
                end_offset: content.len(),
                heading_hierarchy: Vec::new(),
            },
        )
    }

    #[tokio::test]
    async fn every_chunk_gets_a_vector_aligned_by_index() {
        let chunks: Vec<_> = (0..12).map(|i| chunk(&format!("chunk-{i}"), i)).collect();
        let embedder = Arc::new(CountingEmbedder {
            calls: AtomicUsize::new(0),
            fail_content: None,
        });
        let outcome = embed_batched(
            &chunks,
            embedder,
            BatcherConfig {
                batch_size: 5,
                workers: 2,
                rate_per_sec: 1000.0,
            },
            Arc::new(AtomicBool::new(false)),
        )
        .await;
        assert_eq!(outcome.succeeded_count(), 12);
        for (chunk, vector) in chunks.iter().zip(outcome.vectors.iter()) {
            assert_eq!(vector.as_ref().unwrap()[0], chunk.content.len() as f32);
        }
    }

    #[tokio::test]
    async fn failed_batch_is_retried_once_and_can_still_fail() {
        let chunks = vec![chunk("good", 0), chunk("bad", 1)];
        let embedder = Arc::new(CountingEmbedder {
            calls: AtomicUsize::new(0),
            fail_content: Some("bad".to_string()),
        });
        let outcome = embed_batched(
            &chunks,
            embedder,
            BatcherConfig {
                batch_size: 1,
                workers: 2,
                rate_per_sec: 1000.0,
            },
            Arc::new(AtomicBool::new(false)),
        )
        .await;
        assert!(outcome.success_mask[0]);
        assert!(!outcome.success_mask[1]);
        assert_eq!(outcome.failed_indices(), vec![1]);
    }

    #[tokio::test]
    async fn cancellation_stops_enqueuing_new_batches() {
        let chunks: Vec<_> = (0..20).map(|i| chunk(&format!("chunk-{i}"), i)).collect();
        let embedder = Arc::new(CountingEmbedder {
            calls: AtomicUsize::new(0),
            fail_content: None,
        });
        let cancelled = Arc::new(AtomicBool::new(true));
        let outcome = embed_batched(
            &chunks,
            embedder,
            BatcherConfig::default(),
            cancelled,
        )
        .await;
        assert_eq!(outcome.succeeded_count(), 0);
    }
}
