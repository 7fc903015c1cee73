//! HTTP endpoint handlers. These are thin wrappers that forward to core logic
//! and the stores. Each handler is instrumented.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use tracing::{info, instrument};

use crate::auth::{generate_token, AuthUser, MaybeUser};
use crate::config::DEFAULT_TOPIC;
use crate::error::{AppError, AppResult, CoreError};
use crate::logic::{apply_result, fix_correct_answer, get_questions, ProgressOutcome};
use crate::protocol::*;
use crate::state::{AppState, HISTORY_LIMIT, RANKING_LIMIT};
use crate::store::{HistoryRepo, NewHistoryEntry, UserRepo};

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse {
    Json(HealthOut { ok: true })
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginIn>,
) -> AppResult<Json<LoginOut>> {
    let username = body.username.trim();
    if username.is_empty() {
        return Err(AppError::BadRequest("username is required".into()));
    }
    let user = UserRepo::find_or_create(&state.pool, username).await?;
    let token = generate_token(user.id, &user.username, &state.jwt)
        .map_err(|e| CoreError::Internal(format!("token signing failed: {e}")))?;
    info!(target: "progress", user_id = user.id, "Login");
    Ok(Json(LoginOut { token, user }))
}

#[instrument(level = "info", skip(state), fields(user_id = user.user_id))]
pub async fn http_get_stats(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> AppResult<Json<StatsOut>> {
    let stored = UserRepo::find_by_id(&state.pool, user.user_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "User",
            id: user.user_id,
        })?;
    Ok(Json(stored.into()))
}

#[instrument(level = "info", skip(state, body), fields(guest = user.0.is_none(), acertos = body.acertos, erros = body.erros))]
pub async fn http_update_stats(
    State(state): State<Arc<AppState>>,
    user: MaybeUser,
    Json(body): Json<UpdateStatsIn>,
) -> AppResult<Json<UpdateStatsOut>> {
    let outcome = apply_result(&state.pool, user.user_id(), body.acertos, body.erros).await?;
    let out = match outcome {
        ProgressOutcome::Guest => UpdateStatsOut {
            success: true,
            nivel: None,
            total_acertos: None,
        },
        ProgressOutcome::Applied {
            total_correct,
            level,
            ..
        } => UpdateStatsOut {
            success: true,
            nivel: Some(level),
            total_acertos: Some(total_correct),
        },
    };
    Ok(Json(out))
}

#[instrument(level = "info", skip(state, q), fields(guest = user.0.is_none()))]
pub async fn http_generate_question(
    State(state): State<Arc<AppState>>,
    user: MaybeUser,
    Query(q): Query<QuestionQuery>,
) -> AppResult<Json<Vec<QuestionOut>>> {
    let topic = q
        .topic
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_TOPIC.to_string());
    let hint = q.custom_prompt.unwrap_or_default();
    let requested = q.count.as_deref().and_then(|c| c.trim().parse::<usize>().ok());
    let count = state.clamp_count(requested);

    let served = get_questions(
        &state.pool,
        state.synth.as_ref(),
        &state.delivery,
        &topic,
        &hint,
        count,
    )
    .await?;
    info!(target: "questions", %topic, count, served = served.len(), "HTTP questions served");
    Ok(Json(served.into_iter().map(QuestionOut::from).collect()))
}

#[instrument(level = "info", skip(state, _user))]
pub async fn http_fix_question(
    State(state): State<Arc<AppState>>,
    _user: MaybeUser,
    Json(body): Json<FixQuestionIn>,
) -> AppResult<Json<FixQuestionOut>> {
    let q = fix_correct_answer(&state.pool, body.question_id, body.correct_answer).await?;
    Ok(Json(FixQuestionOut {
        success: true,
        message: format!("Gabarito da questão {} atualizado para a alternativa {}", q.id, q.correct_answer),
    }))
}

#[instrument(level = "info", skip(state))]
pub async fn http_rankings(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<RankingOut>>> {
    let users = UserRepo::top_by_correct(&state.pool, RANKING_LIMIT).await?;
    Ok(Json(users.into_iter().map(RankingOut::from).collect()))
}

#[instrument(level = "info", skip(state, body), fields(guest = user.0.is_none(), correct = body.correct))]
pub async fn http_submit(
    State(state): State<Arc<AppState>>,
    user: MaybeUser,
    Json(body): Json<SubmitIn>,
) -> AppResult<Json<SuccessOut>> {
    if let Some(user_id) = user.user_id() {
        let entry = NewHistoryEntry {
            topic: body.topic,
            correct: body.correct,
            time_taken: i64::from(body.time_taken),
            question_text: body.question_text,
            user_answer: body.user_answer,
        };
        HistoryRepo::create(&state.pool, user_id, &entry).await?;
    }
    Ok(Json(SuccessOut { success: true }))
}

#[instrument(level = "info", skip(state), fields(user_id = user.user_id))]
pub async fn http_history(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> AppResult<Json<HistoryOut>> {
    let entries = HistoryRepo::list_recent(&state.pool, user.user_id, HISTORY_LIMIT).await?;
    Ok(Json(entries))
}
