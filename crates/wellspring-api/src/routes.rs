//! The REST surface: axum routes wired to `AppState`, matching the
//! platform's design-level operation table.

use std::sync::Arc;

use axum::extract::{Extension, Path, State};
use axum::middleware;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::{auth_middleware, VerifiedIdentity};
use crate::error::{success_envelope, ApiError};
use crate::models::{BuildJobParams, VectorStoreKind};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let state = Arc::new(state);

    let public = Router::new()
        .route("/auth/sign-in/credentials", post(sign_in))
        .route("/auth/token/refresh", post(refresh_token));

    let protected = Router::new()
        .route("/auth/validate", get(validate_token))
        .route("/engines", get(list_engines).post(create_engine))
        .route("/jobs/:id", get(job_status))
        .route("/engines/:id/query", post(query_engine))
        .route("/chats", post(create_chat))
        .route("/chats/:id/generate", post(continue_chat))
        .route("/agents/:name/run", post(run_agent))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state.token_verifier),
            auth_middleware,
        ));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Deserialize)]
struct SignInRequest {
    email: String,
    password: String,
}

async fn sign_in(
    State(_state): State<Arc<AppState>>,
    Json(_req): Json<SignInRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    Err(ApiError::Internal(
        "credential sign-in delegates to the identity collaborator, not configured in this build".to_string(),
    ))
}

#[derive(Deserialize)]
struct RefreshRequest {
    #[allow(dead_code)]
    refresh_token: String,
}

async fn refresh_token(
    State(_state): State<Arc<AppState>>,
    Json(_req): Json<RefreshRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    Err(ApiError::Internal(
        "token refresh delegates to the identity collaborator, not configured in this build".to_string(),
    ))
}

async fn validate_token(Extension(identity): Extension<VerifiedIdentity>) -> Json<serde_json::Value> {
    success_envelope(serde_json::to_value(identity).unwrap_or_default())
}

async fn list_engines(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<VerifiedIdentity>,
) -> Json<serde_json::Value> {
    let engines = state.engines.list_engines(&identity.user_id);
    success_envelope(serde_json::json!(engines))
}

#[derive(Deserialize)]
struct CreateEngineRequest {
    engine_name: String,
    source_url: String,
    embedding_model: String,
    vector_store: VectorStoreKind,
    depth: u32,
    description: String,
}

async fn create_engine(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<VerifiedIdentity>,
    Json(req): Json<CreateEngineRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if req.engine_name.trim().is_empty() {
        return Err(ApiError::Validation("engine_name must not be empty".to_string()));
    }
    if state
        .engines
        .list_engines(&identity.user_id)
        .iter()
        .any(|e| e.name == req.engine_name)
    {
        return Err(ApiError::Conflict(format!(
            "engine named {} already exists",
            req.engine_name
        )));
    }

    let params = BuildJobParams {
        engine_name: req.engine_name,
        source_url: req.source_url,
        embedding_model: req.embedding_model,
        vector_store: req.vector_store,
        depth: req.depth,
        description: req.description,
        owning_user: identity.user_id,
    };
    let (engine, job) = state.coordinator.create(params);

    let coordinator = Arc::clone(&state.coordinator);
    let job_id = job.id.clone();
    tokio::spawn(async move {
        if let Err(err) = coordinator.run(&job_id).await {
            tracing::error!(job_id, error = %err, "build job failed to run");
        }
    });

    Ok(success_envelope(serde_json::json!({"engine": engine, "job": job})))
}

async fn job_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let job = state.engines.get_job(&id)?;
    Ok(success_envelope(serde_json::json!(job)))
}

#[derive(Deserialize)]
struct QueryRequest {
    prompt: String,
    k: Option<usize>,
    chat_id: Option<String>,
}

#[derive(Serialize)]
struct QueryResponse {
    text: String,
    references: Vec<crate::models::QueryReference>,
}

async fn query_engine(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let (text, references) = state
        .query_executor
        .query(&id, &req.prompt, req.k.unwrap_or(5), req.chat_id.as_deref())
        .await?;
    Ok(success_envelope(serde_json::to_value(QueryResponse { text, references }).unwrap_or_default()))
}

#[derive(Deserialize)]
struct CreateChatRequest {
    agent_name: String,
    prompt: Option<String>,
}

async fn create_chat(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<VerifiedIdentity>,
    Json(req): Json<CreateChatRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let chat = state.chats.create_chat(&identity.user_id, &req.agent_name);

    if let Some(prompt) = req.prompt {
        let agent = state
            .agents
            .get(&req.agent_name)
            .ok_or_else(|| ApiError::NotFound(format!("agent {}", req.agent_name)))?;
        agent.run(&prompt, Some(&chat.id)).await?;
    }

    let chat = state.chats.get_chat(&chat.id)?;
    Ok(success_envelope(serde_json::json!(chat)))
}

#[derive(Deserialize)]
struct ContinueChatRequest {
    prompt: String,
    #[allow(dead_code)]
    llm_type: Option<String>,
}

async fn continue_chat(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<ContinueChatRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let chat = state.chats.get_chat(&id)?;
    let agent = state
        .agents
        .get(&chat.agent_name)
        .ok_or_else(|| ApiError::NotFound(format!("agent {}", chat.agent_name)))?;
    agent.run(&req.prompt, Some(&id)).await?;

    let entries = state.chats.get_history(&id)?;
    Ok(success_envelope(serde_json::json!(entries)))
}

#[derive(Deserialize)]
struct RunAgentRequest {
    prompt: String,
}

async fn run_agent(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(req): Json<RunAgentRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let agent = state
        .agents
        .get(&name)
        .ok_or_else(|| ApiError::NotFound(format!("agent {name}")))?;
    let output = agent.run(&req.prompt, None).await?;
    Ok(success_envelope(serde_json::to_value(output).unwrap_or_default()))
}
