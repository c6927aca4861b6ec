//! RAG agent: the query-executor path exposed through the agent interface.

use std::sync::Arc;

use async_trait::async_trait;
use rig::embeddings::EmbeddingModel;

use crate::agents::{Agent, AgentOutput, ToolCapability};
use crate::error::ApiError;
use crate::query::QueryExecutor;

pub struct RagAgent<E: EmbeddingModel + Clone + Send + Sync + 'static> {
    pub executor: Arc<QueryExecutor<E>>,
    pub engine_id: String,
    pub k: usize,
}

#[async_trait]
impl<E: EmbeddingModel + Clone + Send + Sync + 'static> Agent for RagAgent<E> {
    fn name(&self) -> &str {
        "rag"
    }

    fn capabilities(&self) -> Vec<ToolCapability> {
        vec![ToolCapability {
            name: "vector_search".to_string(),
            description: format!("Searches engine {} for relevant context", self.engine_id),
            input_schema: serde_json::json!({"type": "object", "properties": {"prompt": {"type": "string"}}}),
            output_schema: serde_json::json!({"type": "object", "properties": {"answer": {"type": "string"}, "references": {"type": "array"}}}),
        }]
    }

    fn tools(&self) -> Vec<String> {
        vec!["vector_search".to_string()]
    }

    async fn run(&self, prompt: &str, chat_id: Option<&str>) -> Result<AgentOutput, ApiError> {
        let started = std::time::Instant::now();
        let (text, references) = self
            .executor
            .query(&self.engine_id, prompt, self.k, chat_id)
            .await?;
        crate::agents::log_invocation(0, "vector_search", prompt, "ok", started.elapsed());

        Ok(AgentOutput {
            text,
            plan_id: None,
            references,
        })
    }
}
