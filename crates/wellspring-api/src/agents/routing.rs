//! Routing agent: classifies a prompt into one of {chat, plan, query,
//! dbagent} and dispatches to the matching registered agent by tag, never by
//! inspecting the concrete type of the dispatched-to agent.

use std::sync::Arc;

use async_trait::async_trait;
use rustc_hash::FxHashMap;

use crate::agents::{Agent, AgentOutput, ToolCapability};
use crate::error::ApiError;
use crate::llm::LlmClient;

const ROUTE_TAGS: &[&str] = &["chat", "plan", "query", "dbagent"];

/// Classifies free text into one of [`ROUTE_TAGS`]. Falls back to `chat` if
/// the LLM's response doesn't parse to a known tag.
fn parse_route_tag(raw: &str) -> &'static str {
    let lowered = raw.trim().to_lowercase();
    ROUTE_TAGS
        .iter()
        .find(|tag| lowered.contains(**tag))
        .copied()
        .unwrap_or("chat")
}

pub struct RoutingAgent {
    pub llm: Arc<dyn LlmClient>,
    /// Concrete agents keyed by route tag (`chat`, `plan`, `query`, `dbagent`).
    pub registry: FxHashMap<String, Arc<dyn Agent>>,
}

impl RoutingAgent {
    pub fn new(llm: Arc<dyn LlmClient>, registry: FxHashMap<String, Arc<dyn Agent>>) -> Self {
        Self { llm, registry }
    }

    async fn classify(&self, prompt: &str) -> Result<String, ApiError> {
        let preamble = "Classify the user's request as exactly one word: chat, plan, query, \
             or dbagent. \"query\" means it asks a question answerable from indexed documents. \
             \"dbagent\" means it asks for a computation or lookup over tabular data. \"plan\" \
             means it asks for a sequence of steps or actions. Otherwise answer \"chat\". \
             Respond with only that one word.";
        let raw = self.llm.complete(preamble, prompt, 0.0).await?;
        Ok(parse_route_tag(&raw).to_string())
    }
}

#[async_trait]
impl Agent for RoutingAgent {
    fn name(&self) -> &str {
        "routing"
    }

    fn capabilities(&self) -> Vec<ToolCapability> {
        Vec::new()
    }

    fn tools(&self) -> Vec<String> {
        self.registry.keys().cloned().collect()
    }

    async fn run(&self, prompt: &str, chat_id: Option<&str>) -> Result<AgentOutput, ApiError> {
        let started = std::time::Instant::now();
        let tag = self.classify(prompt).await?;
        crate::agents::log_invocation(0, "classify", prompt, &tag, started.elapsed());

        let agent = self
            .registry
            .get(&tag)
            .ok_or_else(|| ApiError::Internal(format!("no agent registered for route tag {tag}")))?;
        agent.run(prompt, chat_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_tags_case_insensitively() {
        assert_eq!(parse_route_tag("Query"), "query");
        assert_eq!(parse_route_tag("  dbagent\n"), "dbagent");
    }

    #[test]
    fn unknown_response_falls_back_to_chat() {
        assert_eq!(parse_route_tag("I'm not sure"), "chat");
    }
}
