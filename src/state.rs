//! Application state: database pool, question synthesizer, token settings.
//!
//! Built once at startup and shared with every handler through `State<Arc<AppState>>`.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::auth::JwtConfig;
use crate::config::{Prompts, ServerConfig};
use crate::db::DbPool;
use crate::logic::DeliveryOptions;
use crate::openai::ChatClient;
use crate::synth::{AiSynthesizer, QuestionSynthesizer};

/// Leaderboard size.
pub const RANKING_LIMIT: usize = 10;
/// Attempts returned by the history endpoint.
pub const HISTORY_LIMIT: usize = 20;

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub synth: Arc<dyn QuestionSynthesizer>,
    pub jwt: JwtConfig,
    pub delivery: DeliveryOptions,
    pub max_questions_per_request: usize,
}

impl AppState {
    /// Wire the production synthesizer from configuration.
    #[instrument(level = "info", skip_all)]
    pub fn from_config(pool: DbPool, config: &ServerConfig, prompts: Prompts) -> Self {
        let client = ChatClient::from_config(&config.ai);
        if let Some(c) = &client {
            info!(target: "chemquiz_backend", base_url = %c.base_url, model = %c.model, timeout = ?c.timeout, "Question model enabled.");
        } else {
            info!(target: "chemquiz_backend", "Question model disabled (no GROQ_API_KEY). Serving cache and offline fallback only.");
        }
        let synth = AiSynthesizer::new(client, prompts, config.ai.temperature);
        Self::new(pool, config, Arc::new(synth))
    }

    /// Build state around an arbitrary synthesizer.
    pub fn new(pool: DbPool, config: &ServerConfig, synth: Arc<dyn QuestionSynthesizer>) -> Self {
        Self {
            pool,
            synth,
            jwt: JwtConfig {
                secret: config.jwt_secret.clone(),
                expiry_days: config.jwt_expiry_days,
            },
            delivery: DeliveryOptions {
                persist_fallback: config.persist_fallback,
            },
            max_questions_per_request: config.max_questions_per_request.max(1),
        }
    }

    /// Clamp a requested count into `1..=max_questions_per_request`.
    pub fn clamp_count(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(1).clamp(1, self.max_questions_per_request)
    }
}
