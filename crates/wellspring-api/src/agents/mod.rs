//! Agent runtime: a dispatcher over named variants, each exposing the same
//! capability interface so the routing agent and the `/agents/{name}/run`
//! handler can treat them uniformly.

pub mod chat;
pub mod dbquery;
pub mod plan;
pub mod rag;
pub mod routing;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::ApiError;

/// One logged tool invocation: step id, tool name, a digest of the input
/// (not the raw input, so logs don't carry sensitive payloads), outcome and
/// duration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub step_id: usize,
    pub tool_name: String,
    pub input_digest: String,
    pub outcome: String,
    pub duration_ms: u64,
}

pub fn digest_input(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub fn log_invocation(step_id: usize, tool_name: &str, input: &str, outcome: &str, elapsed: Duration) {
    let invocation = ToolInvocation {
        step_id,
        tool_name: tool_name.to_string(),
        input_digest: digest_input(input),
        outcome: outcome.to_string(),
        duration_ms: elapsed.as_millis() as u64,
    };
    tracing::info!(
        step_id = invocation.step_id,
        tool = %invocation.tool_name,
        digest = %invocation.input_digest,
        outcome = %invocation.outcome,
        duration_ms = invocation.duration_ms,
        "tool invocation"
    );
}

/// A capability an agent declares: a name, a description, and an
/// invocation contract expressed as input/output JSON schemas.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolCapability {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
    pub output_schema: serde_json::Value,
}

/// Output of one agent invocation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AgentOutput {
    pub text: String,
    pub plan_id: Option<String>,
    pub references: Vec<crate::models::QueryReference>,
}

impl AgentOutput {
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            plan_id: None,
            references: Vec::new(),
        }
    }
}

/// The capability interface every agent variant implements.
#[async_trait]
pub trait Agent: Send + Sync {
    fn name(&self) -> &str;
    fn capabilities(&self) -> Vec<ToolCapability>;
    fn tools(&self) -> Vec<String>;
    async fn run(&self, prompt: &str, chat_id: Option<&str>) -> Result<AgentOutput, ApiError>;
}
