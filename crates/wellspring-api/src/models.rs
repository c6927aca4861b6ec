//! Core data-model entities shared across the build pipeline and the query
//! runtime: [`QueryEngine`], [`Chunk`], [`UserChat`] and its entries,
//! [`Plan`], [`BuildJob`] and [`Agent`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a [`QueryEngine`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EngineState {
    Created,
    Building,
    Ready,
    Failed,
    Archived,
}

/// Vector-store backend a [`QueryEngine`] was built against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorStoreKind {
    Relational,
    AnnService,
}

/// A named, immutable-after-build logical index over one ingested source.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QueryEngine {
    pub id: String,
    pub name: String,
    pub description: String,
    pub embedding_model: String,
    pub vector_store: VectorStoreKind,
    pub multimodal: bool,
    pub owning_user: String,
    pub state: EngineState,
    pub depth: u32,
    pub source_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set once the build records a manifest; `Ready` requires this non-empty.
    pub chunk_count: usize,
}

impl QueryEngine {
    pub fn is_ready(&self) -> bool {
        self.state == EngineState::Ready
    }
}

/// A bounded text fragment, the unit of retrieval.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub engine_id: String,
    pub source_id: String,
    pub ordinal: usize,
    pub text: String,
    pub image_ref: Option<String>,
    pub start_offset: usize,
    pub end_offset: usize,
}

/// One entry in a [`UserChat`]'s append-only history.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ChatEntry {
    HumanText {
        text: String,
        at: DateTime<Utc>,
    },
    AiText {
        text: String,
        at: DateTime<Utc>,
    },
    HumanFile {
        url: String,
        at: DateTime<Utc>,
    },
    AiFile {
        url: String,
        at: DateTime<Utc>,
    },
    PlanRef {
        plan_id: String,
        at: DateTime<Utc>,
    },
    QueryRefs {
        references: Vec<QueryReference>,
        at: DateTime<Utc>,
    },
    DbResult {
        columns: Vec<String>,
        rows: Vec<Vec<serde_json::Value>>,
        spreadsheet_url: Option<String>,
        at: DateTime<Utc>,
    },
    /// Forward-compatibility catch-all for entry tags this build doesn't know.
    #[serde(other)]
    Unknown,
}

impl ChatEntry {
    pub fn at(&self) -> Option<DateTime<Utc>> {
        match self {
            ChatEntry::HumanText { at, .. }
            | ChatEntry::AiText { at, .. }
            | ChatEntry::HumanFile { at, .. }
            | ChatEntry::AiFile { at, .. }
            | ChatEntry::PlanRef { at, .. }
            | ChatEntry::QueryRefs { at, .. }
            | ChatEntry::DbResult { at, .. } => Some(*at),
            ChatEntry::Unknown => None,
        }
    }
}

/// An ordered, append-only chat owned by exactly one user.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserChat {
    pub id: String,
    pub user_id: String,
    pub agent_name: String,
    pub entries: Vec<ChatEntry>,
    pub created_at: DateTime<Utc>,
}

/// A citation returned alongside a query response.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QueryReference {
    pub chunk_id: String,
    pub source_url: String,
    pub excerpt: String,
    pub image_url: Option<String>,
    pub relevance_score: f32,
}

/// Execution status of one [`PlanStep`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepStatus {
    Pending,
    Running,
    Done,
    Failed,
}

/// One action in a [`Plan`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlanStep {
    pub description: String,
    pub tool_tag: String,
    pub status: StepStatus,
    /// A step missing from the agent's declared tool list is flagged, not
    /// dropped, so the plan stays a faithful record of what the agent asked for.
    pub tool_known: bool,
}

/// An ordered, immutable-once-generated list of [`PlanStep`]s.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Plan {
    pub id: String,
    pub chat_id: Option<String>,
    pub steps: Vec<PlanStep>,
    pub created_at: DateTime<Utc>,
}

/// Status of a [`BuildJob`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

/// Parameters a build was requested with.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuildJobParams {
    pub engine_name: String,
    pub source_url: String,
    pub embedding_model: String,
    pub vector_store: VectorStoreKind,
    pub depth: u32,
    pub description: String,
    pub owning_user: String,
}

/// Lifecycle record for one ingestion pipeline execution.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuildJob {
    pub id: String,
    pub engine_id: String,
    pub params: BuildJobParams,
    pub status: JobStatus,
    pub error: Option<String>,
    pub manifest: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A named capability set, loaded from static configuration at startup.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AgentConfig {
    pub name: String,
    pub agent_class: String,
    pub llm_id: String,
    pub tools: Vec<String>,
    pub capabilities: Vec<String>,
}
