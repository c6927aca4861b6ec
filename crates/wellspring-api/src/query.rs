//! Query Executor: embeds a prompt, retrieves references, assembles the
//! grounded prompt, and calls the LLM.

use std::sync::Arc;

use chrono::Utc;
use rig::embeddings::EmbeddingModel;

use wellspring_ingest::semantic_chunking::EmbeddingProvider;

use crate::cache::{embedding_key, TtlCache};
use crate::chat_store::ChatStore;
use crate::error::ApiError;
use crate::jobs::EngineStore;
use crate::llm::LlmClient;
use crate::models::{ChatEntry, QueryReference};
use crate::vector_store::VectorStoreRegistry;

const GROUNDED_PROMPT_TEMPLATE: &str = "You are a helpful and truthful AI Assistant.\nUse the following pieces of context and the chat history\nto answer the question at the end. If you don't know the\nanswer, just say that you don't know.\n\nContext:\n{context}\n\nChat History:\n{chat_history}\n\nQuestion: {question}\nHelpful Answer:";

pub fn render_grounded_prompt(context: &str, chat_history: &str, question: &str) -> String {
    GROUNDED_PROMPT_TEMPLATE
        .replace("{context}", context)
        .replace("{chat_history}", chat_history)
        .replace("{question}", question)
}

pub struct QueryExecutor<E: EmbeddingModel + Clone + Send + Sync + 'static> {
    pub engines: Arc<EngineStore>,
    pub vector_stores: Arc<VectorStoreRegistry<E>>,
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub embedding_model_name: String,
    pub embedding_cache: TtlCache<Vec<f32>>,
    pub chats: Arc<ChatStore>,
    pub llm: Arc<dyn LlmClient>,
}

/// Orders references the way the executor's tie-break rule requires: equal
/// scores prefer the lower ordinal within a source, then the smaller
/// source_id across sources.
fn order_references(mut refs: Vec<(QueryReference, usize, f32)>) -> Vec<QueryReference> {
    refs.sort_by(|a, b| {
        b.2.partial_cmp(&a.2)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.source_url.cmp(&b.0.source_url))
            .then_with(|| a.1.cmp(&b.1))
    });
    refs.into_iter().map(|(r, _, _)| r).collect()
}

impl<E: EmbeddingModel + Clone + Send + Sync + 'static> QueryExecutor<E> {
    pub async fn query(
        &self,
        engine_id: &str,
        prompt: &str,
        k: usize,
        chat_id: Option<&str>,
    ) -> Result<(String, Vec<QueryReference>), ApiError> {
        let engine = self.engines.get_engine(engine_id)?;
        if !engine.is_ready() {
            return Err(ApiError::QueryEngineUnavailable(format!(
                "engine {engine_id} is {:?}",
                engine.state
            )));
        }

        let query_vector = self.embed_prompt(prompt).await?;

        let hits = self
            .vector_stores
            .query(engine_id, engine.vector_store, &query_vector, k)
            .await?;

        let mut seen = std::collections::HashSet::new();
        let mut candidates = Vec::new();
        for (record, score) in hits {
            if !seen.insert(record.id.clone()) {
                continue;
            }
            candidates.push((
                QueryReference {
                    chunk_id: record.id,
                    source_url: record.url,
                    excerpt: record.content,
                    image_url: None,
                    relevance_score: score,
                },
                record.chunk_index,
                score,
            ));
        }
        let references: Vec<QueryReference> = order_references(candidates).into_iter().take(k).collect();

        let context = references
            .iter()
            .map(|r| r.excerpt.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        let chat_history = match chat_id {
            Some(id) => ChatStore::render_history(&self.chats.get_history(id)?),
            None => String::new(),
        };
        let grounded_prompt = render_grounded_prompt(&context, &chat_history, prompt);

        let response_text = self
            .llm
            .complete(
                "You are a helpful and truthful AI Assistant.",
                &grounded_prompt,
                0.2,
            )
            .await?;

        if let Some(chat_id) = chat_id {
            let now = Utc::now();
            self.chats.append_entry(
                chat_id,
                ChatEntry::HumanText {
                    text: prompt.to_string(),
                    at: now,
                },
            )?;
            self.chats.append_entry(
                chat_id,
                ChatEntry::AiText {
                    text: response_text.clone(),
                    at: now,
                },
            )?;
            self.chats.append_entry(
                chat_id,
                ChatEntry::QueryRefs {
                    references: references.clone(),
                    at: now,
                },
            )?;
        }

        Ok((response_text, references))
    }

    async fn embed_prompt(&self, prompt: &str) -> Result<Vec<f32>, ApiError> {
        let key = embedding_key(&self.embedding_model_name, prompt);
        if let Some(cached) = self.embedding_cache.get(&key) {
            return Ok(cached);
        }
        let texts = vec![prompt.to_string()];
        let vectors = self
            .embedder
            .embed_text(&texts)
            .await
            .map_err(|e| ApiError::EmbeddingUnavailable(e.to_string()))?;
        let vector = vectors
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::EmbeddingUnavailable("embedder returned no vector".to_string()))?;
        self.embedding_cache.put(key, vector.clone());
        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QueryReference;

    fn reference(source: &str, ordinal: usize, score: f32) -> (QueryReference, usize, f32) {
        (
            QueryReference {
                chunk_id: format!("{source}-{ordinal}"),
                source_url: source.to_string(),
                excerpt: String::new(),
                image_url: None,
                relevance_score: score,
            },
            ordinal,
            score,
        )
    }

    #[test]
    fn ties_prefer_lower_ordinal_then_smaller_source() {
        let refs = vec![
            reference("b", 2, 0.9),
            reference("a", 0, 0.9),
            reference("a", 1, 0.9),
        ];
        let ordered = order_references(refs);
        assert_eq!(
            ordered.iter().map(|r| r.chunk_id.as_str()).collect::<Vec<_>>(),
            vec!["a-0", "a-1", "b-2"]
        );
    }

    #[test]
    fn higher_score_always_wins_regardless_of_source() {
        let refs = vec![reference("b", 0, 0.5), reference("a", 0, 0.9)];
        let ordered = order_references(refs);
        assert_eq!(ordered[0].chunk_id, "a-0");
    }

    #[test]
    fn grounded_prompt_matches_the_fixed_template() {
        let rendered = render_grounded_prompt("ctx", "history", "question?");
        assert!(rendered.starts_with("You are a helpful and truthful AI Assistant."));
        assert!(rendered.contains("Context:\nctx"));
        assert!(rendered.contains("Chat History:\nhistory"));
        assert!(rendered.ends_with("Question: question?\nHelpful Answer:"));
    }
}
