//! Core behaviors behind the HTTP handlers.
//!
//! This includes:
//!   - Question delivery: cache sample, conditional synthesis, idempotent write-back, assembly
//!   - Progress update with derived level (guests are a no-op)
//!   - Gabarito correction of a cached question

use std::collections::HashSet;

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::{DbId, Question, QuestionDraft, QuestionSource, OPTION_COUNT};
use crate::error::{AppResult, CoreError};
use crate::seeds::fallback_id;
use crate::store::{QuestionFields, QuestionRepo, UserRepo};
use crate::synth::{QuestionSynthesizer, SynthesisOrigin, SynthesisRequest, KNOWN_SAMPLE_LIMIT};

/// A question as handed to the client for one response.
#[derive(Clone, Debug)]
pub struct ServedQuestion {
  /// Response-scoped correlation id (fresh per serving).
  pub id: String,
  /// Storage id; `None` for transient fallback items.
  pub question_id: Option<DbId>,
  pub source: QuestionSource,
  pub topic: String,
  pub text: String,
  pub options: Vec<String>,
  pub correct_answer: usize,
  pub explanation: Option<String>,
}

impl ServedQuestion {
  fn from_stored(q: Question, source: QuestionSource) -> Self {
    Self {
      id: Uuid::new_v4().to_string(),
      question_id: Some(q.id),
      source,
      topic: q.topic,
      text: q.text,
      options: q.options.0,
      correct_answer: usize::try_from(q.correct_answer).unwrap_or_default(),
      explanation: q.explanation,
    }
  }

  fn from_fallback(d: QuestionDraft, batch: &str, index: usize) -> Self {
    Self {
      id: fallback_id(batch, index),
      question_id: None,
      source: QuestionSource::Fallback,
      topic: d.topic,
      text: d.text,
      options: d.options,
      correct_answer: d.correct_answer,
      explanation: d.explanation,
    }
  }
}

#[derive(Debug, Clone)]
pub struct DeliveryOptions {
  /// Write fallback drafts into the shared cache like model output.
  pub persist_fallback: bool,
}

/// Resolve a request for `count` questions on `topic`.
///
/// Returns exactly `count` items whenever the sources can supply them, fewer otherwise
/// (possibly none). Model output comes first, then cached questions, then offline
/// placeholders; no stored question appears twice in one response.
#[instrument(level = "info", skip(pool, synth, opts, hint), fields(hint_len = hint.len()))]
pub async fn get_questions(
  pool: &DbPool,
  synth: &dyn QuestionSynthesizer,
  opts: &DeliveryOptions,
  topic: &str,
  hint: &str,
  count: usize,
) -> AppResult<Vec<ServedQuestion>> {
  if count == 0 {
    return Ok(Vec::new());
  }

  let cached = QuestionRepo::sample_by_topic(pool, topic, count).await?;
  if cached.len() >= count {
    info!(target: "questions", %topic, count, "Cache hit; model not called");
    return Ok(cached
      .into_iter()
      .take(count)
      .map(|q| ServedQuestion::from_stored(q, QuestionSource::Cache))
      .collect());
  }

  let known_texts = QuestionRepo::list_recent_texts_by_topic(pool, topic, KNOWN_SAMPLE_LIMIT).await?;
  debug!(target: "questions", %topic, cached = cached.len(), known = known_texts.len(), "Cache short; synthesizing");
  let synthesis = synth
    .synthesize(&SynthesisRequest { topic, hint, count, known_texts: &known_texts })
    .await;

  let mut generated = Vec::new();
  let mut transient = Vec::new();
  match &synthesis.origin {
    SynthesisOrigin::Fallback(reason) if !opts.persist_fallback => {
      warn!(target: "questions", %topic, reason = reason.tag(), "Fallback drafts served without caching");
      transient = synthesis.drafts;
    }
    origin => {
      let source = match origin {
        SynthesisOrigin::Model => QuestionSource::Generated,
        SynthesisOrigin::Fallback(_) => QuestionSource::Fallback,
      };
      let mut created = 0usize;
      for draft in synthesis.drafts {
        let (stored, was_created) = persist_draft(pool, topic, &draft).await?;
        if was_created {
          created += 1;
        }
        generated.push((stored, source));
      }
      info!(target: "questions", %topic, persisted = generated.len(), created, "Drafts written back to cache");
    }
  }

  let served = assemble(generated, cached, transient, count);
  if served.len() < count {
    warn!(target: "questions", %topic, requested = count, served = served.len(), "Partial fulfillment");
  }
  Ok(served)
}

/// Cached rows are always keyed by the requested topic so later samples find them.
async fn persist_draft(pool: &DbPool, topic: &str, draft: &QuestionDraft) -> AppResult<(Question, bool)> {
  let fields = QuestionFields {
    topic: topic.to_string(),
    options: draft.options.clone(),
    correct_answer: draft.correct_answer as i64,
    explanation: draft.explanation.clone(),
  };
  Ok(QuestionRepo::find_or_create(pool, &draft.text, &fields).await?)
}

/// Fresh first, then cache padding, then transient placeholders; unique by storage id.
fn assemble(
  generated: Vec<(Question, QuestionSource)>,
  cached: Vec<Question>,
  transient: Vec<QuestionDraft>,
  count: usize,
) -> Vec<ServedQuestion> {
  let mut seen = HashSet::new();
  let mut out = Vec::with_capacity(count);

  let stored = generated
    .into_iter()
    .chain(cached.into_iter().map(|q| (q, QuestionSource::Cache)));
  for (q, source) in stored {
    if out.len() == count {
      break;
    }
    if seen.insert(q.id) {
      out.push(ServedQuestion::from_stored(q, source));
    }
  }
  let batch = Uuid::new_v4().to_string();
  for (i, draft) in transient.into_iter().enumerate() {
    if out.len() == count {
      break;
    }
    out.push(ServedQuestion::from_fallback(draft, &batch, i));
  }
  out
}

/// Result of a progress submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProgressOutcome {
  /// Guest submission; nothing persisted.
  Guest,
  Applied { total_correct: i64, total_incorrect: i64, level: i64 },
}

/// Apply end-of-session deltas. Guests (`user_id = None`) never persist progress.
#[instrument(level = "info", skip(pool))]
pub async fn apply_result(
  pool: &DbPool,
  user_id: Option<DbId>,
  correct_delta: u32,
  incorrect_delta: u32,
) -> AppResult<ProgressOutcome> {
  let Some(id) = user_id else {
    debug!(target: "progress", "Guest result ignored");
    return Ok(ProgressOutcome::Guest);
  };
  let user = UserRepo::apply_deltas(pool, id, i64::from(correct_delta), i64::from(incorrect_delta))
    .await?
    .ok_or(CoreError::NotFound { entity: "User", id })?;
  info!(target: "progress", user_id = id, total_correct = user.total_acertos, level = user.nivel, "Progress applied");
  Ok(ProgressOutcome::Applied {
    total_correct: user.total_acertos,
    total_incorrect: user.total_erros,
    level: user.nivel,
  })
}

/// Rewrite the correct-option index of a cached question.
#[instrument(level = "info", skip(pool))]
pub async fn fix_correct_answer(pool: &DbPool, question_id: DbId, new_index: i64) -> AppResult<Question> {
  if !(0..OPTION_COUNT as i64).contains(&new_index) {
    return Err(CoreError::Validation(format!(
      "correctAnswer must be between 0 and {}", OPTION_COUNT - 1
    )).into());
  }
  let q = QuestionRepo::update_correct_answer(pool, question_id, new_index)
    .await?
    .ok_or(CoreError::NotFound { entity: "Question", id: question_id })?;
  info!(target: "questions", question_id, new_index, "Gabarito corrected");
  Ok(q)
}
