//! Configuration: server/env settings and prompt templates (optionally from TOML).
//!
//! See `ServerConfig`, `AiConfig` and `Prompts` for the expected schema.

use std::str::FromStr;

use serde::Deserialize;
use tracing::{error, info, warn};

/// Default topic when the client does not send one.
pub const DEFAULT_TOPIC: &str = "Estequiometria";

const DEV_JWT_SECRET: &str = "chemquiz-dev-secret-change-me";

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
  pub host: String,
  pub port: u16,
  pub database_url: String,
  pub database_max_connections: u32,
  pub jwt_secret: String,
  pub jwt_expiry_days: i64,
  /// Upper bound for `count` on question requests.
  pub max_questions_per_request: usize,
  /// Whether offline fallback drafts are written into the shared cache.
  pub persist_fallback: bool,
  pub ai: AiConfig,
}

/// Upstream chat-completions settings. `api_key = None` disables the model.
#[derive(Clone)]
pub struct AiConfig {
  pub api_key: Option<String>,
  pub base_url: String,
  pub model: String,
  pub temperature: f32,
  pub timeout_secs: u64,
}

impl std::fmt::Debug for AiConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("AiConfig")
      .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
      .field("base_url", &self.base_url)
      .field("model", &self.model)
      .field("temperature", &self.temperature)
      .field("timeout_secs", &self.timeout_secs)
      .finish()
  }
}

impl ServerConfig {
  /// Load configuration from environment variables with defaults.
  ///
  /// | Env Var                     | Default                          |
  /// |-----------------------------|----------------------------------|
  /// | `HOST`                      | `0.0.0.0`                        |
  /// | `PORT`                      | `3001`                           |
  /// | `DATABASE_URL`              | `sqlite://chemquiz.db?mode=rwc`  |
  /// | `DATABASE_MAX_CONNECTIONS`  | `5`                              |
  /// | `JWT_SECRET`                | development secret               |
  /// | `JWT_EXPIRY_DAYS`           | `30`                             |
  /// | `MAX_QUESTIONS_PER_REQUEST` | `10`                             |
  /// | `PERSIST_FALLBACK`          | `false`                          |
  ///
  /// Upstream model settings are read by [`AiConfig::from_env`].
  pub fn from_env() -> Self {
    let jwt_secret = match std::env::var("JWT_SECRET") {
      Ok(s) if !s.trim().is_empty() => s,
      _ => {
        warn!(target: "chemquiz_backend", "JWT_SECRET not set; using the development secret");
        DEV_JWT_SECRET.to_string()
      }
    };

    Self {
      host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
      port: env_parse("PORT", 3001),
      database_url: std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite://chemquiz.db?mode=rwc".into()),
      database_max_connections: env_parse("DATABASE_MAX_CONNECTIONS", 5),
      jwt_secret,
      jwt_expiry_days: env_parse("JWT_EXPIRY_DAYS", 30),
      max_questions_per_request: env_parse::<usize>("MAX_QUESTIONS_PER_REQUEST", 10).max(1),
      persist_fallback: env_parse("PERSIST_FALLBACK", false),
      ai: AiConfig::from_env(),
    }
  }
}

impl AiConfig {
  pub fn from_env() -> Self {
    Self {
      api_key: std::env::var("GROQ_API_KEY").ok().filter(|k| !k.trim().is_empty()),
      base_url: std::env::var("AI_BASE_URL")
        .unwrap_or_else(|_| "https://api.groq.com/openai/v1".into()),
      model: std::env::var("AI_MODEL").unwrap_or_else(|_| "llama-3.3-70b-versatile".into()),
      temperature: env_parse("AI_TEMPERATURE", 0.7),
      timeout_secs: env_parse("AI_TIMEOUT_SECS", 20),
    }
  }
}

/// Parse an env var, falling back to `default` (with a warning) when it is malformed.
fn env_parse<T: FromStr + std::fmt::Display>(key: &str, default: T) -> T {
  match std::env::var(key) {
    Ok(raw) => match raw.trim().parse::<T>() {
      Ok(v) => v,
      Err(_) => {
        warn!(target: "chemquiz_backend", %key, value = %raw, %default, "Invalid value; using default");
        default
      }
    },
    Err(_) => default,
  }
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct PromptConfig {
  #[serde(default)]
  pub prompts: Prompts,
}

/// Prompts used for question synthesis. Placeholders: `{topic}`, `{hint}`, `{count}`, `{samples}`.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  pub question_system: String,
  pub question_user_template: String,
  /// Text used for `{hint}` when the caller sent none.
  pub empty_hint: String,
  /// Text used for `{samples}` when the cache has nothing for the topic yet.
  pub no_samples: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      question_system: "Você é um químico rigoroso que gera questões de Química de nível ENEM. \
Responda APENAS com JSON estrito no formato: \
{\"questions\": [{\"topic\": \"...\", \"text\": \"...\", \"options\": [\"A\", \"B\", \"C\", \"D\", \"E\"], \"correctAnswer\": 0, \"explanation\": \"...\"}]}. \
Cada questão tem exatamente 5 alternativas e correctAnswer é o índice (0 a 4) da correta.".into(),
      question_user_template: "TEMA: {topic}\nINSTRUÇÕES EXTRAS: {hint}\n\
AMOSTRAS EXISTENTES NO BANCO (NÃO REPETIR enunciados nem respostas):\n{samples}\n\n\
Gere {count} novas questões inéditas, abordando subtemas diferentes de \"{topic}\".".into(),
      empty_hint: "nenhuma".into(),
      no_samples: "Nenhuma amostra anterior.".into(),
    }
  }
}

/// Attempt to load prompts from PROMPTS_CONFIG_PATH. On any parsing/IO error, returns defaults.
pub fn load_prompts_from_env() -> Prompts {
  let Ok(path) = std::env::var("PROMPTS_CONFIG_PATH") else {
    return Prompts::default();
  };
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<PromptConfig>(&s) {
      Ok(cfg) => {
        info!(target: "chemquiz_backend", %path, "Loaded prompt config (TOML)");
        cfg.prompts
      }
      Err(e) => {
        error!(target: "chemquiz_backend", %path, error = %e, "Failed to parse TOML config; using default prompts");
        Prompts::default()
      }
    },
    Err(e) => {
      error!(target: "chemquiz_backend", %path, error = %e, "Failed to read TOML config file; using default prompts");
      Prompts::default()
    }
  }
}
