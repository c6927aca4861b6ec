//! The error taxonomy: every user-visible failure maps to one of these
//! variants, which in turn maps to an HTTP status and the uniform
//! `{success: false, message, data: {}}` response envelope.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use miette::Diagnostic;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum ApiError {
    #[error("authentication required")]
    #[diagnostic(code(wellspring_api::auth_unauthenticated))]
    AuthUnauthenticated(String),

    #[error("forbidden: {0}")]
    #[diagnostic(code(wellspring_api::auth_forbidden))]
    AuthForbidden(String),

    #[error("validation failed: {0}")]
    #[diagnostic(code(wellspring_api::validation))]
    Validation(String),

    #[error("not found: {0}")]
    #[diagnostic(code(wellspring_api::not_found))]
    NotFound(String),

    #[error("conflict: {0}")]
    #[diagnostic(code(wellspring_api::conflict))]
    Conflict(String),

    #[error("source unreachable: {0}")]
    #[diagnostic(code(wellspring_api::source_unreachable))]
    SourceUnreachable(String),

    #[error("source authentication failed: {0}")]
    #[diagnostic(code(wellspring_api::source_auth))]
    SourceAuth(String),

    #[error("source not found: {0}")]
    #[diagnostic(code(wellspring_api::source_not_found))]
    SourceNotFound(String),

    #[error("embedding model unavailable: {0}")]
    #[diagnostic(code(wellspring_api::embedding_unavailable))]
    EmbeddingUnavailable(String),

    #[error("embedding rate limited: {0}")]
    #[diagnostic(code(wellspring_api::embedding_rate_limited))]
    EmbeddingRateLimited(String),

    #[error("invalid embedding input: {0}")]
    #[diagnostic(code(wellspring_api::embedding_invalid_input))]
    EmbeddingInvalidInput(String),

    #[error("vector store unavailable: {0}")]
    #[diagnostic(code(wellspring_api::vector_store_unavailable))]
    VectorStoreUnavailable(String),

    #[error("vector store index missing: {0}")]
    #[diagnostic(code(wellspring_api::vector_store_index_missing))]
    VectorStoreIndexMissing(String),

    #[error("llm unavailable: {0}")]
    #[diagnostic(code(wellspring_api::llm_unavailable))]
    LlmUnavailable(String),

    #[error("llm call timed out")]
    #[diagnostic(code(wellspring_api::llm_timeout))]
    LlmTimeout,

    #[error("llm rejected content: {0}")]
    #[diagnostic(code(wellspring_api::llm_content_rejected))]
    LlmContentRejected(String),

    #[error("query engine unavailable: {0}")]
    #[diagnostic(code(wellspring_api::query_engine_unavailable))]
    QueryEngineUnavailable(String),

    #[error("internal error: {0}")]
    #[diagnostic(code(wellspring_api::internal))]
    Internal(String),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::AuthUnauthenticated(_) => "AUTH_UNAUTHENTICATED",
            ApiError::AuthForbidden(_) => "AUTH_FORBIDDEN",
            ApiError::Validation(_) => "VALIDATION",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::SourceUnreachable(_) => "SOURCE_UNREACHABLE",
            ApiError::SourceAuth(_) => "SOURCE_AUTH",
            ApiError::SourceNotFound(_) => "SOURCE_NOT_FOUND",
            ApiError::EmbeddingUnavailable(_) => "EMBEDDING_UNAVAILABLE",
            ApiError::EmbeddingRateLimited(_) => "EMBEDDING_RATE_LIMITED",
            ApiError::EmbeddingInvalidInput(_) => "EMBEDDING_INVALID_INPUT",
            ApiError::VectorStoreUnavailable(_) => "VECTOR_STORE_UNAVAILABLE",
            ApiError::VectorStoreIndexMissing(_) => "VECTOR_STORE_INDEX_MISSING",
            ApiError::LlmUnavailable(_) => "LLM_UNAVAILABLE",
            ApiError::LlmTimeout => "LLM_TIMEOUT",
            ApiError::LlmContentRejected(_) => "LLM_CONTENT_REJECTED",
            ApiError::QueryEngineUnavailable(_) => "QUERY_ENGINE_UNAVAILABLE",
            ApiError::Internal(_) => "INTERNAL",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::AuthUnauthenticated(_) => StatusCode::BAD_REQUEST,
            ApiError::AuthForbidden(_) => StatusCode::UNAUTHORIZED,
            ApiError::Validation(_) | ApiError::EmbeddingInvalidInput(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound(_) | ApiError::SourceNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::SourceUnreachable(_)
            | ApiError::SourceAuth(_)
            | ApiError::EmbeddingUnavailable(_)
            | ApiError::EmbeddingRateLimited(_)
            | ApiError::VectorStoreUnavailable(_)
            | ApiError::VectorStoreIndexMissing(_)
            | ApiError::LlmUnavailable(_)
            | ApiError::LlmTimeout
            | ApiError::LlmContentRejected(_)
            | ApiError::QueryEngineUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// True for errors the propagation policy retries with backoff at the
    /// edge of the system before escalating.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ApiError::EmbeddingRateLimited(_)
                | ApiError::VectorStoreUnavailable(_)
                | ApiError::LlmTimeout
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if matches!(self, ApiError::Internal(_)) {
            tracing::error!(error = %self, code = self.code(), "internal error");
        } else {
            tracing::warn!(error = %self, code = self.code(), "request failed");
        }
        let status = self.status();
        let body = json!({
            "success": false,
            "message": self.to_string(),
            "data": {},
        });
        (status, Json(body)).into_response()
    }
}

impl From<wellspring_ingest::types::RagError> for ApiError {
    fn from(err: wellspring_ingest::types::RagError) -> Self {
        use wellspring_ingest::types::RagError;
        match err {
            RagError::SourceUnreachable(m) => ApiError::SourceUnreachable(m),
            RagError::SourceAuth(m) => ApiError::SourceAuth(m),
            RagError::SourceNotFound(m) => ApiError::SourceNotFound(m),
            RagError::EmbeddingUnavailable(m) => ApiError::EmbeddingUnavailable(m),
            RagError::EmbeddingRateLimited(m) => ApiError::EmbeddingRateLimited(m),
            RagError::EmbeddingInvalidInput(m) => ApiError::EmbeddingInvalidInput(m),
            RagError::VectorStoreUnavailable(m) => ApiError::VectorStoreUnavailable(m),
            RagError::VectorStoreIndexMissing(m) => ApiError::VectorStoreIndexMissing(m),
            RagError::Validation(m) => ApiError::Validation(m),
            RagError::Chunking(m) | RagError::Storage(m) | RagError::Io(m) => {
                ApiError::Internal(m)
            }
        }
    }
}

/// Uniform success envelope, mirroring the shape of [`ApiError`]'s response.
pub fn success_envelope(data: serde_json::Value) -> Json<serde_json::Value> {
    Json(json!({
        "success": true,
        "message": "",
        "data": data,
    }))
}
