//! Repository for the `questions` cache table.
//!
//! `text` carries a unique constraint in the schema; [`QuestionRepo::find_or_create`]
//! relies on it so that concurrent inserts of the same text resolve to one row.

use chrono::Utc;
use sqlx::types::Json;

use crate::db::DbPool;
use crate::domain::{DbId, Question};

const COLUMNS: &str = "id, topic, text, options, correct_answer, explanation, created_at";

/// Everything but the text (the dedup key) needed to create a cached question.
#[derive(Debug, Clone)]
pub struct QuestionFields {
    pub topic: String,
    pub options: Vec<String>,
    pub correct_answer: i64,
    pub explanation: Option<String>,
}

pub struct QuestionRepo;

impl QuestionRepo {
    /// Up to `limit` random questions for `topic`, without repeats.
    pub async fn sample_by_topic(
        pool: &DbPool,
        topic: &str,
        limit: usize,
    ) -> Result<Vec<Question>, sqlx::Error> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let query =
            format!("SELECT {COLUMNS} FROM questions WHERE topic = ?1 ORDER BY RANDOM() LIMIT ?2");
        sqlx::query_as::<_, Question>(&query)
            .bind(topic)
            .bind(limit as i64)
            .fetch_all(pool)
            .await
    }

    /// Insert-if-absent keyed by `text`. Returns the stored row and whether this call created it.
    ///
    /// A duplicate text is not an error: the existing row is returned with `created = false`.
    pub async fn find_or_create(
        pool: &DbPool,
        text: &str,
        fields: &QuestionFields,
    ) -> Result<(Question, bool), sqlx::Error> {
        let insert = format!(
            "INSERT INTO questions (topic, text, options, correct_answer, explanation, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT (text) DO NOTHING
             RETURNING {COLUMNS}"
        );
        let created = sqlx::query_as::<_, Question>(&insert)
            .bind(&fields.topic)
            .bind(text)
            .bind(Json(&fields.options))
            .bind(fields.correct_answer)
            .bind(&fields.explanation)
            .bind(Utc::now())
            .fetch_optional(pool)
            .await?;

        if let Some(q) = created {
            return Ok((q, true));
        }

        let select = format!("SELECT {COLUMNS} FROM questions WHERE text = ?1");
        let existing = sqlx::query_as::<_, Question>(&select)
            .bind(text)
            .fetch_one(pool)
            .await?;
        Ok((existing, false))
    }

    /// Most recent texts for `topic`, used as anti-duplication context for the model.
    pub async fn list_recent_texts_by_topic(
        pool: &DbPool,
        topic: &str,
        limit: usize,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT text FROM questions WHERE topic = ?1 ORDER BY id DESC LIMIT ?2",
        )
        .bind(topic)
        .bind(limit as i64)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(pool: &DbPool, id: DbId) -> Result<Option<Question>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM questions WHERE id = ?1");
        sqlx::query_as::<_, Question>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Rewrite the correct-option index. Returns `None` if no row with `id` exists.
    pub async fn update_correct_answer(
        pool: &DbPool,
        id: DbId,
        new_index: i64,
    ) -> Result<Option<Question>, sqlx::Error> {
        let query =
            format!("UPDATE questions SET correct_answer = ?2 WHERE id = ?1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Question>(&query)
            .bind(id)
            .bind(new_index)
            .fetch_optional(pool)
            .await
    }

    pub async fn count_by_topic(pool: &DbPool, topic: &str) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM questions WHERE topic = ?1")
            .bind(topic)
            .fetch_one(pool)
            .await
    }
}
