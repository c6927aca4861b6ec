//! External approximate-nearest-neighbor service backend.
//!
//! Talks to a remote vector index service over HTTP instead of embedding the
//! index locally, as [`super::sqlite::SqliteChunkStore`] does. Indexes are
//! addressed by a name the caller controls (typically the owning
//! QueryEngine's id), so one service endpoint can host many engines.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{Backend, ChunkRecord};
use crate::types::RagError;

/// Client configuration for a remote ANN service.
#[derive(Clone, Debug)]
pub struct AnnServiceConfig {
    pub base_url: String,
    pub index_name: String,
    pub api_key: Option<String>,
}

/// [`Backend`] implementation backed by an external ANN HTTP service.
///
/// Expects the service to expose `POST {base_url}/indexes/{index}/upsert`,
/// `POST {base_url}/indexes/{index}/query`, `GET {base_url}/indexes/{index}/chunks/{id}`,
/// `DELETE {base_url}/indexes/{index}?url=...`, and `GET {base_url}/indexes/{index}/count`.
#[derive(Clone)]
pub struct AnnServiceBackend {
    client: reqwest::Client,
    config: AnnServiceConfig,
}

#[derive(Serialize)]
struct UpsertRequest {
    records: Vec<ChunkRecord>,
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
}

#[derive(Deserialize)]
struct QueryResponseEntry {
    record: ChunkRecord,
    score: f32,
}

impl AnnServiceBackend {
    pub fn new(config: AnnServiceConfig) -> Result<Self, RagError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|err| RagError::VectorStoreUnavailable(err.to_string()))?;
        Ok(Self { client, config })
    }

    fn index_url(&self, suffix: &str) -> String {
        format!(
            "{}/indexes/{}{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.index_name,
            suffix
        )
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }
}

#[async_trait]
impl Backend for AnnServiceBackend {
    async fn insert_chunks(&self, chunks: Vec<ChunkRecord>) -> Result<(), RagError> {
        let request = self.authed(self.client.post(self.index_url("/upsert")));
        let response = request
            .json(&UpsertRequest { records: chunks })
            .send()
            .await
            .map_err(|err| RagError::VectorStoreUnavailable(err.to_string()))?;
        if !response.status().is_success() {
            return Err(RagError::VectorStoreUnavailable(format!(
                "ann service returned {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn get_chunks_by_url(&self, url: &str) -> Result<Vec<ChunkRecord>, RagError> {
        let request = self.authed(
            self.client
                .get(self.index_url("/chunks"))
                .query(&[("url", url)]),
        );
        let response = request
            .send()
            .await
            .map_err(|err| RagError::VectorStoreUnavailable(err.to_string()))?;
        response
            .json::<Vec<ChunkRecord>>()
            .await
            .map_err(|err| RagError::VectorStoreUnavailable(err.to_string()))
    }

    async fn get_chunk_by_id(&self, id: &str) -> Result<Option<ChunkRecord>, RagError> {
        let request = self.authed(self.client.get(self.index_url(&format!("/chunks/{id}"))));
        let response = request
            .send()
            .await
            .map_err(|err| RagError::VectorStoreUnavailable(err.to_string()))?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        response
            .json::<ChunkRecord>()
            .await
            .map(Some)
            .map_err(|err| RagError::VectorStoreUnavailable(err.to_string()))
    }

    async fn delete_chunks_by_url(&self, url: &str) -> Result<usize, RagError> {
        let request = self.authed(
            self.client
                .delete(self.index_url(""))
                .query(&[("url", url)]),
        );
        let response = request
            .send()
            .await
            .map_err(|err| RagError::VectorStoreUnavailable(err.to_string()))?;
        #[derive(Deserialize)]
        struct DeleteResponse {
            deleted: usize,
        }
        response
            .json::<DeleteResponse>()
            .await
            .map(|body| body.deleted)
            .map_err(|err| RagError::VectorStoreUnavailable(err.to_string()))
    }

    async fn search_similar(
        &self,
        query_embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<(ChunkRecord, f32)>, RagError> {
        let request = self.authed(self.client.post(self.index_url("/query")));
        let response = request
            .json(&QueryRequest {
                vector: query_embedding,
                top_k,
            })
            .send()
            .await
            .map_err(|err| RagError::VectorStoreUnavailable(err.to_string()))?;
        let entries = response
            .json::<Vec<QueryResponseEntry>>()
            .await
            .map_err(|err| RagError::VectorStoreUnavailable(err.to_string()))?;
        Ok(entries.into_iter().map(|e| (e.record, e.score)).collect())
    }

    async fn count(&self) -> Result<usize, RagError> {
        let request = self.authed(self.client.get(self.index_url("/count")));
        let response = request
            .send()
            .await
            .map_err(|err| RagError::VectorStoreUnavailable(err.to_string()))?;
        #[derive(Deserialize)]
        struct CountResponse {
            count: usize,
        }
        response
            .json::<CountResponse>()
            .await
            .map(|body| body.count)
            .map_err(|err| RagError::VectorStoreUnavailable(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_url_joins_base_and_index_name() {
        let backend = AnnServiceBackend::new(AnnServiceConfig {
            base_url: "https://ann.example.com/".to_string(),
            index_name: "engine-1".to_string(),
            api_key: None,
        })
        .unwrap();
        assert_eq!(
            backend.index_url("/query"),
            "https://ann.example.com/indexes/engine-1/query"
        );
    }
}
