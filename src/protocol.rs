//! Public HTTP request/response structs (serde ready).
//! Field names match what the SPA already sends and reads.

use serde::{Deserialize, Serialize};

use crate::domain::{DbId, HistoryEntry, QuestionSource, User};
use crate::logic::ServedQuestion;

#[derive(Debug, Deserialize)]
pub struct LoginIn {
    #[serde(default)]
    pub username: String,
}

#[derive(Serialize)]
pub struct LoginOut {
    pub token: String,
    pub user: User,
}

#[derive(Serialize)]
pub struct StatsOut {
    pub username: String,
    pub total_acertos: i64,
    pub total_erros: i64,
    pub nivel: i64,
}

impl From<User> for StatsOut {
    fn from(u: User) -> Self {
        Self {
            username: u.username,
            total_acertos: u.total_acertos,
            total_erros: u.total_erros,
            nivel: u.nivel,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatsIn {
    #[serde(default)]
    pub acertos: u32,
    #[serde(default)]
    pub erros: u32,
}

/// `nivel`/`total_acertos` are null for guests.
#[derive(Serialize)]
pub struct UpdateStatsOut {
    pub success: bool,
    pub nivel: Option<i64>,
    pub total_acertos: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionQuery {
    pub topic: Option<String>,
    pub custom_prompt: Option<String>,
    /// Parsed leniently; anything unparsable counts as 1.
    pub count: Option<String>,
}

/// DTO for question delivery.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionOut {
    pub id: String,
    pub question_id: Option<DbId>,
    pub source: QuestionSource,
    pub topic: String,
    pub text: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    pub explanation: Option<String>,
}

impl From<ServedQuestion> for QuestionOut {
    fn from(q: ServedQuestion) -> Self {
        Self {
            id: q.id,
            question_id: q.question_id,
            source: q.source,
            topic: q.topic,
            text: q.text,
            options: q.options,
            correct_answer: q.correct_answer,
            explanation: q.explanation,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixQuestionIn {
    pub question_id: DbId,
    pub correct_answer: i64,
}

#[derive(Serialize)]
pub struct FixQuestionOut {
    pub success: bool,
    pub message: String,
}

#[derive(Serialize)]
pub struct RankingOut {
    pub nickname: String,
    pub xp: i64,
    pub nivel: i64,
}

impl From<User> for RankingOut {
    fn from(u: User) -> Self {
        Self {
            nickname: u.username,
            xp: u.total_acertos,
            nivel: u.nivel,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitIn {
    pub topic: String,
    pub correct: bool,
    pub question_text: String,
    pub user_answer: String,
    #[serde(default)]
    pub time_taken: u32,
}

#[derive(Serialize)]
pub struct SuccessOut {
    pub success: bool,
}

pub type HistoryOut = Vec<HistoryEntry>;

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
