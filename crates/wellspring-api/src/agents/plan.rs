//! Plan agent: asks the LLM for a numbered `Use [tool] to [action]` list,
//! flags steps whose tool isn't in the agent's declared tool list, and
//! persists the result as a [`Plan`] record.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use regex::Regex;
use rustc_hash::FxHashMap;
use uuid::Uuid;

use crate::agents::{Agent, AgentOutput, ToolCapability};
use crate::error::ApiError;
use crate::llm::LlmClient;
use crate::models::{ChatEntry, Plan, PlanStep, StepStatus};

static STEP_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\*?\s*\d+\.\s*Use\s+(.+?)\s+to\s+(.+)$").unwrap());

/// In-memory store of generated plans, keyed by id.
#[derive(Default)]
pub struct PlanStore {
    plans: RwLock<FxHashMap<String, Plan>>,
}

impl PlanStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, plan: Plan) {
        self.plans.write().insert(plan.id.clone(), plan);
    }

    pub fn get(&self, id: &str) -> Result<Plan, ApiError> {
        self.plans
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("plan {id}")))
    }
}

/// Parses lines of the form `N. Use [tool] to [action]` into [`PlanStep`]s,
/// flagging any tool not present in `declared_tools`.
pub fn parse_plan_text(text: &str, declared_tools: &[String]) -> Vec<PlanStep> {
    text.lines()
        .filter_map(|line| STEP_LINE.captures(line))
        .map(|caps| {
            let tool_tag = caps[1].trim().to_string();
            let action = caps[2].trim().to_string();
            let tool_known = declared_tools.iter().any(|t| t == &tool_tag);
            PlanStep {
                description: format!("Use {tool_tag} to {action}"),
                tool_tag,
                status: StepStatus::Pending,
                tool_known,
            }
        })
        .collect()
}

/// Renders a plan back to the template's text form, prefixing unknown tools
/// with `*` per the platform's plan-prompt convention.
pub fn render_plan_text(steps: &[PlanStep]) -> String {
    steps
        .iter()
        .enumerate()
        .map(|(i, step)| {
            let marker = if step.tool_known { "" } else { "*" };
            format!("{marker}{}. {}", i + 1, step.description)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub struct PlanAgent {
    pub llm: Arc<dyn LlmClient>,
    pub plans: Arc<PlanStore>,
    pub declared_tools: Vec<String>,
    pub chats: Option<Arc<crate::chat_store::ChatStore>>,
}

#[async_trait]
impl Agent for PlanAgent {
    fn name(&self) -> &str {
        "plan"
    }

    fn capabilities(&self) -> Vec<ToolCapability> {
        Vec::new()
    }

    fn tools(&self) -> Vec<String> {
        self.declared_tools.clone()
    }

    async fn run(&self, prompt: &str, chat_id: Option<&str>) -> Result<AgentOutput, ApiError> {
        let preamble = format!(
            "You are a planning assistant. Break the request into a numbered list of steps, \
             each written as \"Use [tool] to [action]\", using only these tools when possible: {}.",
            self.declared_tools.join(", ")
        );
        let raw_text = self.llm.complete(&preamble, prompt, 0.3).await?;
        let steps = parse_plan_text(&raw_text, &self.declared_tools);

        let plan = Plan {
            id: format!("plan-{}", Uuid::new_v4()),
            chat_id: chat_id.map(|s| s.to_string()),
            steps,
            created_at: Utc::now(),
        };
        self.plans.put(plan.clone());

        if let (Some(chat_id), Some(chats)) = (chat_id, &self.chats) {
            chats.append_entry(
                chat_id,
                ChatEntry::PlanRef {
                    plan_id: plan.id.clone(),
                    at: Utc::now(),
                },
            )?;
        }

        Ok(AgentOutput {
            text: render_plan_text(&plan.steps),
            plan_id: Some(plan.id),
            references: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_tool_is_flagged_not_dropped() {
        let text = "1. Use search_web to find recent articles\n2. Use summarize_doc to condense them";
        let steps = parse_plan_text(text, &["search_web".to_string()]);
        assert_eq!(steps.len(), 2);
        assert!(steps[0].tool_known);
        assert!(!steps[1].tool_known);
    }

    #[test]
    fn render_prefixes_unknown_tools_with_asterisk() {
        let steps = vec![
            PlanStep {
                description: "Use search_web to find articles".into(),
                tool_tag: "search_web".into(),
                status: StepStatus::Pending,
                tool_known: true,
            },
            PlanStep {
                description: "Use unknown_tool to do something".into(),
                tool_tag: "unknown_tool".into(),
                status: StepStatus::Pending,
                tool_known: false,
            },
        ];
        let rendered = render_plan_text(&steps);
        assert!(rendered.contains("1. Use search_web"));
        assert!(rendered.contains("*2. Use unknown_tool"));
    }
}
