//! Repository for the per-user `history` attempt log.

use chrono::Utc;

use crate::db::DbPool;
use crate::domain::{DbId, HistoryEntry};

const COLUMNS: &str =
    "id, user_id, topic, correct, time_taken, question_text, user_answer, created_at";

#[derive(Debug, Clone)]
pub struct NewHistoryEntry {
    pub topic: String,
    pub correct: bool,
    pub time_taken: i64,
    pub question_text: String,
    pub user_answer: String,
}

pub struct HistoryRepo;

impl HistoryRepo {
    pub async fn create(
        pool: &DbPool,
        user_id: DbId,
        input: &NewHistoryEntry,
    ) -> Result<HistoryEntry, sqlx::Error> {
        let query = format!(
            "INSERT INTO history (user_id, topic, correct, time_taken, question_text, user_answer, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, HistoryEntry>(&query)
            .bind(user_id)
            .bind(&input.topic)
            .bind(input.correct)
            .bind(input.time_taken)
            .bind(&input.question_text)
            .bind(&input.user_answer)
            .bind(Utc::now())
            .fetch_one(pool)
            .await
    }

    /// Most recent attempts for a user, newest first.
    pub async fn list_recent(
        pool: &DbPool,
        user_id: DbId,
        limit: usize,
    ) -> Result<Vec<HistoryEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM history WHERE user_id = ?1 ORDER BY id DESC LIMIT ?2"
        );
        sqlx::query_as::<_, HistoryEntry>(&query)
            .bind(user_id)
            .bind(limit as i64)
            .fetch_all(pool)
            .await
    }
}
