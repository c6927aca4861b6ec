use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{fmt, EnvFilter};

use wellspring_api::auth::{HttpIdentityVerifier, TokenVerifier, VerifierPolicy};
use wellspring_api::config::RuntimeConfig;
use wellspring_api::routes::build_router;
use wellspring_api::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let config = RuntimeConfig::from_env()?;
    tokio::fs::create_dir_all(&config.staging_dir).await?;

    let identity_base_url = std::env::var("IDENTITY_SERVICE_URL")
        .unwrap_or_else(|_| format!("{}/identity", config.api_base_url));
    let token_verifier = Arc::new(TokenVerifier::new(
        Arc::new(HttpIdentityVerifier::new(identity_base_url)),
        VerifierPolicy::default(),
    ));

    let port = config.port;
    let state = AppState::new(config, token_verifier).await?;
    let router = build_router(state);

    let addr: SocketAddr = format!("0.0.0.0:{port}").parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "wellspring-api listening");
    axum::serve(listener, router.into_make_service()).await?;

    Ok(())
}
