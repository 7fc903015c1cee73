//! Domain models used by the backend: users, cached questions, drafts and history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

/// Primary key type for every table.
pub type DbId = i64;

/// Number of options every question carries.
pub const OPTION_COUNT: usize = 5;

/// Correct answers needed per level.
pub const LEVEL_STEP: i64 = 10;

/// Level derived from the cumulative correct count. Never stored independently of it.
pub fn level_for(total_correct: i64) -> i64 {
  total_correct.max(0) / LEVEL_STEP + 1
}

/// Persistent user record. `username` is the natural key.
#[derive(Clone, Debug, Serialize, FromRow)]
pub struct User {
  pub id: DbId,
  pub username: String,
  pub total_acertos: i64,
  pub total_erros: i64,
  pub nivel: i64,
  #[serde(skip)]
  pub created_at: DateTime<Utc>,
}

/// Question stored in the cache. `text` is globally unique.
#[derive(Clone, Debug, FromRow)]
pub struct Question {
  pub id: DbId,
  pub topic: String,
  pub text: String,
  pub options: Json<Vec<String>>,
  pub correct_answer: i64,
  pub explanation: Option<String>,
  pub created_at: DateTime<Utc>,
}

/// Synthesizer output before it is committed to the cache.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuestionDraft {
  pub topic: String,
  pub text: String,
  pub options: Vec<String>,
  pub correct_answer: usize,
  pub explanation: Option<String>,
}

impl QuestionDraft {
  /// Structural validity: non-empty text, exactly five options, index in range.
  pub fn is_valid(&self) -> bool {
    !self.text.trim().is_empty()
      && self.options.len() == OPTION_COUNT
      && self.correct_answer < OPTION_COUNT
  }
}

/// Where a served question came from.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum QuestionSource {
  Cache,     // sampled from the question cache
  Generated, // produced by the model during this request
  Fallback,  // offline placeholder
}

/// One attempt logged by a signed-in user.
#[derive(Clone, Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
  pub id: DbId,
  #[serde(skip)]
  pub user_id: DbId,
  pub topic: String,
  pub correct: bool,
  pub time_taken: i64,
  pub question_text: String,
  pub user_answer: String,
  pub created_at: DateTime<Utc>,
}
