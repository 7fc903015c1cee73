//! Repository for the `users` table.

use chrono::Utc;

use crate::db::DbPool;
use crate::domain::{DbId, User, LEVEL_STEP};

const COLUMNS: &str = "id, username, total_acertos, total_erros, nivel, created_at";

pub struct UserRepo;

impl UserRepo {
    /// Find-or-create by display name (the natural key). The caller trims the name.
    pub async fn find_or_create(pool: &DbPool, username: &str) -> Result<User, sqlx::Error> {
        sqlx::query(
            "INSERT INTO users (username, total_acertos, total_erros, nivel, created_at)
             VALUES (?1, 0, 0, 1, ?2)
             ON CONFLICT (username) DO NOTHING",
        )
        .bind(username)
        .bind(Utc::now())
        .execute(pool)
        .await?;

        let query = format!("SELECT {COLUMNS} FROM users WHERE username = ?1");
        sqlx::query_as::<_, User>(&query)
            .bind(username)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &DbPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = ?1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Add score deltas and recompute the level in one statement.
    ///
    /// SET expressions see the pre-update row, so `nivel` is derived from the new total.
    /// Returns `None` if no row with the given `id` exists.
    pub async fn apply_deltas(
        pool: &DbPool,
        id: DbId,
        correct: i64,
        incorrect: i64,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET
                total_acertos = total_acertos + ?2,
                total_erros = total_erros + ?3,
                nivel = (total_acertos + ?2) / ?4 + 1
             WHERE id = ?1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(correct)
            .bind(incorrect)
            .bind(LEVEL_STEP)
            .fetch_optional(pool)
            .await
    }

    /// Leaderboard: highest cumulative correct count first, ties by seniority.
    pub async fn top_by_correct(pool: &DbPool, limit: usize) -> Result<Vec<User>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM users ORDER BY total_acertos DESC, id ASC LIMIT ?1"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(limit as i64)
            .fetch_all(pool)
            .await
    }
}
