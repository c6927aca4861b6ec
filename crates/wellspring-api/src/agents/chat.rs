//! Chat agent: a direct LLM call grounded in the chat's prior history.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::agents::{Agent, AgentOutput, ToolCapability};
use crate::chat_store::ChatStore;
use crate::error::ApiError;
use crate::llm::LlmClient;
use crate::models::ChatEntry;

pub struct ChatAgent {
    pub llm: Arc<dyn LlmClient>,
    pub chats: Arc<ChatStore>,
}

#[async_trait]
impl Agent for ChatAgent {
    fn name(&self) -> &str {
        "chat"
    }

    fn capabilities(&self) -> Vec<ToolCapability> {
        Vec::new()
    }

    fn tools(&self) -> Vec<String> {
        Vec::new()
    }

    async fn run(&self, prompt: &str, chat_id: Option<&str>) -> Result<AgentOutput, ApiError> {
        let history = match chat_id {
            Some(id) => ChatStore::render_history(&self.chats.get_history(id)?),
            None => String::new(),
        };
        let preamble = if history.is_empty() {
            "You are a helpful assistant.".to_string()
        } else {
            format!("You are a helpful assistant. Prior conversation:\n{history}")
        };
        let text = self.llm.complete(&preamble, prompt, 0.7).await?;

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
                    text: text.clone(),
                    at: now,
                },
            )?;
        }

        Ok(AgentOutput::text_only(text))
    }
}
