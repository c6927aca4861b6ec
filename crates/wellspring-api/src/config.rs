//! Environment-driven runtime configuration, loaded once at startup via
//! `dotenvy` + `std::env`, mirroring the platform's original per-service
//! environment contract.

use std::path::PathBuf;

use crate::error::ApiError;

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_required(key: &str) -> Result<String, ApiError> {
    std::env::var(key).map_err(|_| ApiError::Internal(format!("missing required env var {key}")))
}

#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    pub project_id: String,
    pub database_prefix: String,
    pub api_base_url: String,
    pub redis_host: String,
    pub pg_host: String,
    pub pg_port: u16,
    pub pg_dbname: String,
    pub pg_user: String,
    pub pg_password: Option<String>,
    pub default_vector_store: String,
    pub cors_allow_origins: Vec<String>,
    pub port: u16,
    pub staging_dir: PathBuf,
    pub ollama_base_url: String,
    pub embedding_model: String,
    pub embedding_dimension: usize,
}

impl RuntimeConfig {
    /// Loads configuration from the process environment. Call
    /// `dotenvy::dotenv().ok()` once before this, at process start, so a
    /// local `.env` file can populate the environment in development.
    pub fn from_env() -> Result<Self, ApiError> {
        let cors_allow_origins = std::env::var("CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            project_id: env_required("PROJECT_ID")?,
            database_prefix: env_or("DATABASE_PREFIX", "wellspring"),
            api_base_url: env_or("API_BASE_URL", "http://localhost:8080"),
            redis_host: env_or("REDIS_HOST", "localhost"),
            pg_host: env_or("PG_HOST", "localhost"),
            pg_port: env_or("PG_PORT", "5432")
                .parse()
                .map_err(|_| ApiError::Internal("PG_PORT is not a valid port".to_string()))?,
            pg_dbname: env_or("PG_DBNAME", "wellspring"),
            pg_user: env_or("PG_USER", "wellspring"),
            pg_password: std::env::var("PG_PASSWORD").ok(),
            default_vector_store: env_or("DEFAULT_VECTOR_STORE", "relational"),
            cors_allow_origins,
            port: env_or("PORT", "8080")
                .parse()
                .map_err(|_| ApiError::Internal("PORT is not a valid port".to_string()))?,
            staging_dir: PathBuf::from(env_or("STAGING_DIR", "./staging")),
            ollama_base_url: env_or("OLLAMA_BASE_URL", "http://localhost:11434"),
            embedding_model: env_or("EMBEDDING_MODEL", "nomic-embed-text"),
            embedding_dimension: env_or("EMBEDDING_DIMENSION", "768")
                .parse()
                .map_err(|_| ApiError::Internal("EMBEDDING_DIMENSION is not a number".to_string()))?,
        })
    }

    pub fn postgres_url(&self) -> String {
        match &self.pg_password {
            Some(password) => format!(
                "postgres://{}:{}@{}:{}/{}",
                self.pg_user, password, self.pg_host, self.pg_port, self.pg_dbname
            ),
            None => format!(
                "postgres://{}@{}:{}/{}",
                self.pg_user, self.pg_host, self.pg_port, self.pg_dbname
            ),
        }
    }
}
