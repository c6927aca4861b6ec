//! Build job coordinator: drives one QueryEngine's ingestion pipeline from
//! source discovery through chunking, embedding and vector-store upsert.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use rig::embeddings::EmbeddingModel;
use rustc_hash::FxHashMap;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use wellspring_ingest::ingestion::normalize;
use wellspring_ingest::semantic_chunking::{
    embed_batched, BatcherConfig, ChunkDocumentRequest, EmbeddingProvider, SemanticChunkingService,
};
use wellspring_ingest::sources::adapter_for_scheme;
use wellspring_ingest::stores::ChunkRecord;
use wellspring_ingest::types::RagError;

use crate::error::ApiError;
use crate::models::{BuildJob, BuildJobParams, EngineState, JobStatus, QueryEngine};
use crate::vector_store::{Metric, VectorStoreRegistry};

/// In-memory store for [`QueryEngine`] and [`BuildJob`] records.
#[derive(Default)]
pub struct EngineStore {
    engines: RwLock<FxHashMap<String, QueryEngine>>,
    jobs: RwLock<FxHashMap<String, BuildJob>>,
    cancel_flags: RwLock<FxHashMap<String, Arc<AtomicBool>>>,
}

impl EngineStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_engine(&self, id: &str) -> Result<QueryEngine, ApiError> {
        self.engines
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("engine {id}")))
    }

    pub fn list_engines(&self, owning_user: &str) -> Vec<QueryEngine> {
        self.engines
            .read()
            .values()
            .filter(|e| e.owning_user == owning_user)
            .cloned()
            .collect()
    }

    pub fn get_job(&self, id: &str) -> Result<BuildJob, ApiError> {
        self.jobs
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("job {id}")))
    }

    fn put_engine(&self, engine: QueryEngine) {
        self.engines.write().insert(engine.id.clone(), engine);
    }

    fn put_job(&self, job: BuildJob) {
        self.jobs.write().insert(job.id.clone(), job.clone());
    }

    pub fn request_cancel(&self, job_id: &str) -> Result<(), ApiError> {
        let flag = self
            .cancel_flags
            .read()
            .get(job_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("job {job_id}")))?;
        flag.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Drives the build pipeline described in the platform's ingestion
/// architecture: discover sources, normalize + chunk each, batch-embed, and
/// upsert into the engine's vector store, recording progress as it goes.
pub struct BuildJobCoordinator<E: EmbeddingModel + Clone + Send + Sync + 'static> {
    pub store: Arc<EngineStore>,
    pub vector_stores: Arc<VectorStoreRegistry<E>>,
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub staging_dir: PathBuf,
    pub batcher_config: BatcherConfig,
}

impl<E: EmbeddingModel + Clone + Send + Sync + 'static> BuildJobCoordinator<E> {
    /// Step 1 of the build algorithm: create the QueryEngine (CREATED) and
    /// BuildJob (PENDING) records. The caller is expected to then call
    /// [`Self::run`] to actually drive the pipeline.
    pub fn create(&self, params: BuildJobParams) -> (QueryEngine, BuildJob) {
        let now = Utc::now();
        let engine = QueryEngine {
            id: format!("engine-{}", Uuid::new_v4()),
            name: params.engine_name.clone(),
            description: params.description.clone(),
            embedding_model: params.embedding_model.clone(),
            vector_store: params.vector_store,
            multimodal: false,
            owning_user: params.owning_user.clone(),
            state: EngineState::Created,
            depth: params.depth,
            source_url: params.source_url.clone(),
            created_at: now,
            updated_at: now,
            chunk_count: 0,
        };
        let job = BuildJob {
            id: format!("job-{}", Uuid::new_v4()),
            engine_id: engine.id.clone(),
            params,
            status: JobStatus::Pending,
            error: None,
            manifest: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.store.put_engine(engine.clone());
        self.store.put_job(job.clone());
        self.store
            .cancel_flags
            .write()
            .insert(job.id.clone(), Arc::new(AtomicBool::new(false)));
        (engine, job)
    }

    /// Runs the pipeline to completion (or failure/cancellation), updating
    /// the engine and job records in place as it progresses.
    #[instrument(skip(self), fields(job_id = %job_id))]
    pub async fn run(&self, job_id: &str) -> Result<(), ApiError> {
        let mut job = self.store.get_job(job_id)?;
        let mut engine = self.store.get_engine(&job.engine_id)?;
        let cancelled = self
            .store
            .cancel_flags
            .read()
            .get(job_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("job {job_id}")))?;

        job.status = JobStatus::Running;
        engine.state = EngineState::Building;
        self.store.put_job(job.clone());
        self.store.put_engine(engine.clone());

        match self.run_inner(&mut job, &mut engine, &cancelled).await {
            Ok(()) if cancelled.load(Ordering::SeqCst) => {
                job.status = JobStatus::Cancelled;
                engine.state = EngineState::Failed;
                warn!(job_id, "build cancelled, partial state left inactive");
            }
            Ok(()) => {
                job.status = JobStatus::Succeeded;
                engine.state = EngineState::Ready;
                info!(job_id, chunk_count = engine.chunk_count, "build succeeded");
            }
            Err(err) => {
                job.status = JobStatus::Failed;
                job.error = Some(err.to_string());
                engine.state = EngineState::Failed;
                let _ = self
                    .vector_stores
                    .delete(&engine.id, engine.vector_store)
                    .await;
                warn!(job_id, error = %err, "build failed, cleaned up partial vector-store state");
            }
        }
        job.updated_at = Utc::now();
        engine.updated_at = Utc::now();
        self.store.put_job(job);
        self.store.put_engine(engine);
        Ok(())
    }

    async fn run_inner(
        &self,
        job: &mut BuildJob,
        engine: &mut QueryEngine,
        cancelled: &Arc<AtomicBool>,
    ) -> Result<(), RagError> {
        let dimension = self.embedder.dimension();
        self.vector_stores
            .create_index(&engine.id, engine.vector_store, dimension, Metric::default())
            .await?;

        let adapter = adapter_for_scheme(&job.params.source_url)?;
        let files = adapter
            .discover(&engine.id, &job.params.source_url, job.params.depth, &self.staging_dir)
            .await?;

        let chunker = SemanticChunkingService::new();
        let mut manifest = Vec::new();
        let mut total_chunks = 0usize;

        for file in files {
            if cancelled.load(Ordering::SeqCst) {
                break;
            }

            let bytes = match adapter.fetch_bytes(&file).await {
                Ok(b) => b,
                Err(err) => {
                    warn!(source = %file.source_url, error = %err, "skipping unreadable source file");
                    continue;
                }
            };
            let source = normalize(&file, &bytes)?;

            let response = chunker
                .chunk_document(ChunkDocumentRequest {
                    source_id: Some(file.source_url.clone()),
                    source,
                    chunking_config: None,
                    html_config: None,
                    json_config: None,
                    embedder: None,
                })
                .await
                .map_err(|e| RagError::Chunking(e.to_string()))?;

            let chunks = response.outcome.chunks;
            if chunks.is_empty() {
                continue;
            }

            let outcome = embed_batched(
                &chunks,
                self.embedder.clone(),
                self.batcher_config,
                Arc::clone(cancelled),
            )
            .await;

            let mut records = Vec::with_capacity(outcome.succeeded_count());
            for (chunk, vector) in chunks.iter().zip(outcome.vectors.into_iter()) {
                let Some(vector) = vector else { continue };
                records.push(
                    ChunkRecord::new(
                        chunk.id.to_string(),
                        file.source_url.clone(),
                        file.display_name.clone(),
                        chunk.metadata.ordinal,
                        chunk.content.clone(),
                    )
                    .with_embedding(vector),
                );
            }

            total_chunks += records.len();
            if !records.is_empty() {
                self.vector_stores
                    .upsert(&engine.id, engine.vector_store, records)
                    .await?;
            }
            manifest.push(file.source_url);
        }

        engine.chunk_count = total_chunks;
        job.manifest = manifest;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creating_a_job_starts_pending_and_created() {
        let store = Arc::new(EngineStore::new());
        let params = BuildJobParams {
            engine_name: "docs".into(),
            source_url: "https://example.com".into(),
            embedding_model: "model-a".into(),
            vector_store: crate::models::VectorStoreKind::Relational,
            depth: 1,
            description: "desc".into(),
            owning_user: "user-1".into(),
        };
        assert!(store.get_engine("missing").is_err());
        let engine = QueryEngine {
            id: "engine-1".into(),
            name: params.engine_name.clone(),
            description: params.description.clone(),
            embedding_model: params.embedding_model.clone(),
            vector_store: params.vector_store,
            multimodal: false,
            owning_user: params.owning_user.clone(),
            state: EngineState::Created,
            depth: params.depth,
            source_url: params.source_url.clone(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            chunk_count: 0,
        };
        store.put_engine(engine.clone());
        assert_eq!(store.get_engine(&engine.id).unwrap().state, EngineState::Created);
        assert_eq!(store.list_engines("user-1").len(), 1);
    }
}
