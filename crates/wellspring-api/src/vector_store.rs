//! Per-engine vector store registry.
//!
//! [`wellspring_ingest::stores::Backend`] is scoped to one already-open
//! store; this registry adds the engine-keyed `create_index`/`query`/`delete`
//! contract on top, opening (and remembering) one backend instance per
//! QueryEngine the first time it's touched.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use rig::embeddings::EmbeddingModel;

use wellspring_ingest::stores::{AnnServiceBackend, AnnServiceConfig, Backend, ChunkRecord, SqliteChunkStore};
use wellspring_ingest::types::RagError;

use crate::models::VectorStoreKind;

/// Distance metric an index was created with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Metric {
    Cosine,
    InnerProduct,
    L2,
}

impl Default for Metric {
    fn default() -> Self {
        Metric::Cosine
    }
}

/// Registry of open vector-store backends, one per engine id.
pub struct VectorStoreRegistry<E: EmbeddingModel + Clone + Send + Sync + 'static> {
    relational_dir: PathBuf,
    ann_config_template: AnnServiceConfig,
    embedding_model: E,
    relational: RwLock<FxHashMap<String, Arc<SqliteChunkStore<E>>>>,
    ann: RwLock<FxHashMap<String, Arc<AnnServiceBackend>>>,
}

impl<E: EmbeddingModel + Clone + Send + Sync + 'static> VectorStoreRegistry<E> {
    pub fn new(relational_dir: PathBuf, ann_config_template: AnnServiceConfig, embedding_model: E) -> Self {
        Self {
            relational_dir,
            ann_config_template,
            embedding_model,
            relational: RwLock::new(FxHashMap::default()),
            ann: RwLock::new(FxHashMap::default()),
        }
    }

    /// Provisions a fresh index for `engine_id`. Idempotent: calling it
    /// again for the same engine returns the already-open backend.
    pub async fn create_index(
        &self,
        engine_id: &str,
        kind: VectorStoreKind,
        _dimension: usize,
        _metric: Metric,
    ) -> Result<(), RagError> {
        match kind {
            VectorStoreKind::Relational => {
                if self.relational.read().contains_key(engine_id) {
                    return Ok(());
                }
                let path = self.relational_dir.join(format!("{engine_id}.db"));
                let store = SqliteChunkStore::open(path, &self.embedding_model).await?;
                self.relational
                    .write()
                    .insert(engine_id.to_string(), Arc::new(store));
            }
            VectorStoreKind::AnnService => {
                if self.ann.read().contains_key(engine_id) {
                    return Ok(());
                }
                let config = AnnServiceConfig {
                    index_name: engine_id.to_string(),
                    ..self.ann_config_template.clone()
                };
                let backend = AnnServiceBackend::new(config)?;
                self.ann
                    .write()
                    .insert(engine_id.to_string(), Arc::new(backend));
            }
        }
        Ok(())
    }

    fn backend_for(&self, engine_id: &str, kind: VectorStoreKind) -> Result<Arc<dyn Backend>, RagError> {
        match kind {
            VectorStoreKind::Relational => self
                .relational
                .read()
                .get(engine_id)
                .map(|b| b.clone() as Arc<dyn Backend>)
                .ok_or_else(|| RagError::VectorStoreIndexMissing(engine_id.to_string())),
            VectorStoreKind::AnnService => self
                .ann
                .read()
                .get(engine_id)
                .map(|b| b.clone() as Arc<dyn Backend>)
                .ok_or_else(|| RagError::VectorStoreIndexMissing(engine_id.to_string())),
        }
    }

    /// Idempotent upsert by `chunk_id`, overwriting any prior vector.
    pub async fn upsert(
        &self,
        engine_id: &str,
        kind: VectorStoreKind,
        records: Vec<ChunkRecord>,
    ) -> Result<(), RagError> {
        self.backend_for(engine_id, kind)?.insert_chunks(records).await
    }

    /// Top-k by `metric`, score convention normalized to "higher is better".
    pub async fn query(
        &self,
        engine_id: &str,
        kind: VectorStoreKind,
        query_vector: &[f32],
        k: usize,
    ) -> Result<Vec<(ChunkRecord, f32)>, RagError> {
        if k == 0 {
            return Ok(Vec::new());
        }
        self.backend_for(engine_id, kind)?
            .search_similar(query_vector, k)
            .await
    }

    /// Removes the index and all vectors for `engine_id`.
    pub async fn delete(&self, engine_id: &str, kind: VectorStoreKind) -> Result<(), RagError> {
        match kind {
            VectorStoreKind::Relational => {
                self.relational.write().remove(engine_id);
                let path = self.relational_dir.join(format!("{engine_id}.db"));
                let _ = tokio::fs::remove_file(path).await;
            }
            VectorStoreKind::AnnService => {
                self.ann.write().remove(engine_id);
            }
        }
        Ok(())
    }
}
