//! Chemquiz · Chemistry Quiz Backend
//!
//! - Axum HTTP API under `/api`
//! - SQLite persistence (users, question cache, attempt history)
//! - Optional question model via an OpenAI-compatible API (Groq by default)
//!
//! Important env variables:
//!   PORT               : u16 (default 3001)
//!   DATABASE_URL       : default "sqlite://chemquiz.db?mode=rwc"
//!   JWT_SECRET         : bearer-token signing secret
//!   GROQ_API_KEY       : enables the question model if present
//!   AI_BASE_URL        : default "https://api.groq.com/openai/v1"
//!   AI_MODEL           : default "llama-3.3-70b-versatile"
//!   PROMPTS_CONFIG_PATH: path to TOML prompt overrides
//!   LOG_LEVEL          : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT         : "pretty" (default) or "json"

use std::{net::SocketAddr, sync::Arc};

use tokio::net::TcpListener;
use tracing::info;

use chemquiz_backend::config::{load_prompts_from_env, ServerConfig};
use chemquiz_backend::routes::build_router;
use chemquiz_backend::state::AppState;
use chemquiz_backend::{db, telemetry};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  // A missing .env file is fine; real deployments set the environment directly.
  let _ = dotenvy::dotenv();
  telemetry::init_tracing();

  let config = ServerConfig::from_env();
  let pool = db::create_pool(&config.database_url, config.database_max_connections).await?;
  info!(target: "chemquiz_backend", "Database ready");

  let state = Arc::new(AppState::from_config(pool, &config, load_prompts_from_env()));
  let app = build_router(state);

  let addr: SocketAddr = format!("{}:{}", config.host, config.port)
    .parse()
    .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], config.port)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "chemquiz_backend", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(target: "chemquiz_backend", error = %e, "Failed to listen for shutdown signal");
    std::future::pending::<()>().await;
  }
  info!(target: "chemquiz_backend", "Shutdown signal received");
}
