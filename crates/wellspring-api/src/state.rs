//! Application state: one shared, cloneable handle wiring together every
//! collaborator a route handler needs. Built once at startup in `main.rs`
//! and threaded through axum via `State`.

use std::path::PathBuf;
use std::sync::Arc;

use rig::client::EmbeddingsClient;
use rig::providers::ollama;
use rustc_hash::FxHashMap;

use wellspring_ingest::semantic_chunking::{BatcherConfig, EmbeddingProvider, RigEmbeddingProvider};
use wellspring_ingest::stores::AnnServiceConfig;

use crate::agents::chat::ChatAgent;
use crate::agents::dbquery::DbQueryAgent;
use crate::agents::plan::{PlanAgent, PlanStore};
use crate::agents::rag::RagAgent;
use crate::agents::routing::RoutingAgent;
use crate::agents::Agent;
use crate::auth::TokenVerifier;
use crate::cache::TtlCache;
use crate::chat_store::ChatStore;
use crate::config::RuntimeConfig;
use crate::jobs::{BuildJobCoordinator, EngineStore};
use crate::llm::{LlmClient, OllamaClient};
use crate::query::QueryExecutor;
use crate::vector_store::VectorStoreRegistry;

/// Concrete embedding model this deployment is wired to. The rest of the
/// stack (`RigEmbeddingProvider`, `VectorStoreRegistry`, `QueryExecutor`) is
/// generic over this so a future deployment can swap providers here alone.
pub type Embedder = ollama::EmbeddingModel;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RuntimeConfig>,
    pub token_verifier: Arc<TokenVerifier>,
    pub engines: Arc<EngineStore>,
    pub vector_stores: Arc<VectorStoreRegistry<Embedder>>,
    pub chats: Arc<ChatStore>,
    pub plans: Arc<PlanStore>,
    pub coordinator: Arc<BuildJobCoordinator<Embedder>>,
    pub query_executor: Arc<QueryExecutor<Embedder>>,
    pub llm: Arc<dyn LlmClient>,
    pub agents: Arc<FxHashMap<String, Arc<dyn Agent>>>,
}

impl AppState {
    pub async fn new(config: RuntimeConfig, token_verifier: Arc<TokenVerifier>) -> Result<Self, crate::error::ApiError> {
        let config = Arc::new(config);

        let ollama_client = ollama::Client::new();
        let embedding_model = ollama_client.embedding_model(&config.embedding_model);
        let llm: Arc<dyn LlmClient> = Arc::new(OllamaClient::new());

        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(RigEmbeddingProvider::new(
            embedding_model.clone(),
            config.embedding_dimension,
        ));

        let vector_stores = Arc::new(VectorStoreRegistry::new(
            config.staging_dir.join("indexes"),
            AnnServiceConfig {
                base_url: std::env::var("ANN_SERVICE_URL").unwrap_or_default(),
                index_name: String::new(),
                api_key: std::env::var("ANN_SERVICE_API_KEY").ok(),
            },
            embedding_model,
        ));

        let engines = Arc::new(EngineStore::new());
        let chats = Arc::new(ChatStore::new());
        let plans = Arc::new(PlanStore::new());

        let coordinator = Arc::new(BuildJobCoordinator {
            store: Arc::clone(&engines),
            vector_stores: Arc::clone(&vector_stores),
            embedder: Arc::clone(&embedder),
            staging_dir: config.staging_dir.clone(),
            batcher_config: BatcherConfig::default(),
        });

        let query_executor = Arc::new(QueryExecutor {
            engines: Arc::clone(&engines),
            vector_stores: Arc::clone(&vector_stores),
            embedder: Arc::clone(&embedder),
            embedding_model_name: config.embedding_model.clone(),
            embedding_cache: TtlCache::with_default_ttl(),
            chats: Arc::clone(&chats),
            llm: Arc::clone(&llm),
        });

        let dataset_pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(4)
            .connect(&format!(
                "sqlite://{}?mode=rwc",
                config.staging_dir.join("datasets.db").display()
            ))
            .await
            .map_err(|e| crate::error::ApiError::Internal(format!("dataset pool: {e}")))?;

        let agents = Arc::new(build_agent_registry(
            Arc::clone(&llm),
            Arc::clone(&chats),
            Arc::clone(&plans),
            Arc::clone(&query_executor),
            dataset_pool,
        ));

        Ok(Self {
            config,
            token_verifier,
            engines,
            vector_stores,
            chats,
            plans,
            coordinator,
            query_executor,
            llm,
            agents,
        })
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.config.staging_dir.clone()
    }
}

/// Builds the named-agent registry: one entry per concrete agent (matching
/// the platform's static `AgentConfig` listing), plus the routing agent
/// dispatching across them by tag, not by type introspection.
fn build_agent_registry(
    llm: Arc<dyn LlmClient>,
    chats: Arc<ChatStore>,
    plans: Arc<PlanStore>,
    query_executor: Arc<QueryExecutor<Embedder>>,
    dataset_pool: sqlx::SqlitePool,
) -> FxHashMap<String, Arc<dyn Agent>> {
    let chat_agent: Arc<dyn Agent> = Arc::new(ChatAgent {
        llm: Arc::clone(&llm),
        chats: Arc::clone(&chats),
    });
    let plan_agent: Arc<dyn Agent> = Arc::new(PlanAgent {
        llm: Arc::clone(&llm),
        plans: Arc::clone(&plans),
        declared_tools: vec!["search_web".to_string(), "vector_search".to_string(), "sql_query".to_string()],
        chats: Some(Arc::clone(&chats)),
    });
    let rag_agent: Arc<dyn Agent> = Arc::new(RagAgent {
        executor: Arc::clone(&query_executor),
        engine_id: String::new(),
        k: 5,
    });
    let dbquery_agent: Arc<dyn Agent> = Arc::new(DbQueryAgent {
        llm: Arc::clone(&llm),
        pool: dataset_pool,
        dataset_name: "default".to_string(),
        schema_description: "no schema registered yet".to_string(),
        chats: Some(Arc::clone(&chats)),
    });

    let mut route_registry: FxHashMap<String, Arc<dyn Agent>> = FxHashMap::default();
    route_registry.insert("chat".to_string(), Arc::clone(&chat_agent));
    route_registry.insert("plan".to_string(), Arc::clone(&plan_agent));
    route_registry.insert("query".to_string(), Arc::clone(&rag_agent));
    route_registry.insert("dbagent".to_string(), Arc::clone(&dbquery_agent));

    let mut registry = FxHashMap::default();
    registry.insert("chat".to_string(), chat_agent);
    registry.insert("plan".to_string(), plan_agent);
    registry.insert("rag".to_string(), rag_agent);
    registry.insert("dbquery".to_string(), dbquery_agent);
    registry.insert(
        "routing".to_string(),
        Arc::new(RoutingAgent::new(llm, route_registry)) as Arc<dyn Agent>,
    );
    registry
}
