//! Question synthesis: prompt the model, decode its reply, validate drafts,
//! and fall back to the offline batch on any failure.
//!
//! The fallback is an explicit outcome ([`SynthesisOrigin::Fallback`]) carrying the
//! reason, so callers can tell genuine model content from placeholder content.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info, instrument, warn};

use crate::config::Prompts;
use crate::domain::{QuestionDraft, OPTION_COUNT};
use crate::openai::ChatClient;
use crate::seeds::fallback_batch;
use crate::util::{fill_template, strip_code_fences, trunc_for_log, truncate_chars};

/// How many known texts are shown to the model.
pub const KNOWN_SAMPLE_LIMIT: usize = 10;
/// Per-sample character budget inside the prompt.
const KNOWN_SAMPLE_CHARS: usize = 100;

#[derive(Debug, Clone)]
pub struct SynthesisRequest<'a> {
  pub topic: &'a str,
  pub hint: &'a str,
  pub count: usize,
  pub known_texts: &'a [String],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
  MissingCredentials,
  Upstream(String),
  Malformed(String),
  NoValidDrafts,
}

impl FallbackReason {
  pub fn tag(&self) -> &'static str {
    match self {
      FallbackReason::MissingCredentials => "missing_credentials",
      FallbackReason::Upstream(_) => "upstream_error",
      FallbackReason::Malformed(_) => "malformed_response",
      FallbackReason::NoValidDrafts => "no_valid_drafts",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthesisOrigin {
  Model,
  Fallback(FallbackReason),
}

#[derive(Debug, Clone)]
pub struct Synthesis {
  /// Between 1 and the requested count.
  pub drafts: Vec<QuestionDraft>,
  pub origin: SynthesisOrigin,
}

impl Synthesis {
  pub fn fallback(topic: &str, count: usize, reason: FallbackReason) -> Self {
    Self { drafts: fallback_batch(topic, count.max(1)), origin: SynthesisOrigin::Fallback(reason) }
  }
}

/// Seam between the delivery flow and whatever produces new questions.
#[async_trait]
pub trait QuestionSynthesizer: Send + Sync {
  async fn synthesize(&self, req: &SynthesisRequest<'_>) -> Synthesis;
}

/// Production synthesizer backed by an OpenAI-compatible chat model.
pub struct AiSynthesizer {
  client: Option<ChatClient>,
  prompts: Prompts,
  temperature: f32,
}

impl AiSynthesizer {
  pub fn new(client: Option<ChatClient>, prompts: Prompts, temperature: f32) -> Self {
    Self { client, prompts, temperature }
  }

  pub fn is_enabled(&self) -> bool {
    self.client.is_some()
  }

  /// Render the (system, user) message pair for a request.
  pub fn build_messages(&self, req: &SynthesisRequest<'_>) -> (String, String) {
    let count = req.count.to_string();
    let samples = if req.known_texts.is_empty() {
      self.prompts.no_samples.clone()
    } else {
      req.known_texts
        .iter()
        .take(KNOWN_SAMPLE_LIMIT)
        .map(|t| format!("- {}...", truncate_chars(t, KNOWN_SAMPLE_CHARS)))
        .collect::<Vec<_>>()
        .join("\n")
    };
    let hint = if req.hint.trim().is_empty() { self.prompts.empty_hint.as_str() } else { req.hint.trim() };
    let pairs = [("topic", req.topic), ("hint", hint), ("count", count.as_str()), ("samples", samples.as_str())];
    (
      fill_template(&self.prompts.question_system, &pairs),
      fill_template(&self.prompts.question_user_template, &pairs),
    )
  }
}

#[async_trait]
impl QuestionSynthesizer for AiSynthesizer {
  #[instrument(level = "info", skip(self, req), fields(topic = %req.topic, count = req.count, known = req.known_texts.len()))]
  async fn synthesize(&self, req: &SynthesisRequest<'_>) -> Synthesis {
    let count = req.count.max(1);
    let Some(client) = &self.client else {
      warn!(target: "questions", topic = %req.topic, "GROQ_API_KEY not set; serving offline batch");
      return Synthesis::fallback(req.topic, count, FallbackReason::MissingCredentials);
    };

    let (system, user) = self.build_messages(req);
    let raw = match client.chat_json_raw(&system, &user, self.temperature).await {
      Ok(raw) => raw,
      Err(e) => {
        error!(target: "questions", topic = %req.topic, error = %e, "Model call failed; serving offline batch");
        return Synthesis::fallback(req.topic, count, FallbackReason::Upstream(e));
      }
    };

    match parse_model_reply(&raw, req.topic, count) {
      Ok(drafts) => {
        info!(target: "questions", topic = %req.topic, requested = count, accepted = drafts.len(), "Model drafts accepted");
        Synthesis { drafts, origin: SynthesisOrigin::Model }
      }
      Err(reason) => {
        error!(target: "questions", topic = %req.topic, reason = reason.tag(), preview = %trunc_for_log(&raw, 120), "Unusable model reply; serving offline batch");
        Synthesis::fallback(req.topic, count, reason)
      }
    }
  }
}

/// Either a batch wrapper or a bare single draft.
#[derive(Deserialize)]
#[serde(untagged)]
enum ModelReply {
  Batch { questions: Vec<Value> },
  Single(RawDraft),
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RawDraft {
  #[serde(default)] text: Option<String>,
  #[serde(default)] options: Option<Vec<Value>>,
  #[serde(default, alias = "correct_answer")] correct_answer: Option<Value>,
  #[serde(default)] explanation: Option<String>,
}

impl RawDraft {
  /// Any `topic` the model writes is ignored; drafts are filed under the requested topic.
  fn into_draft(self, topic: &str) -> Option<QuestionDraft> {
    let text = self.text?.trim().to_string();
    let options = self.options?
      .into_iter()
      .map(|v| match v {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
      })
      .collect::<Option<Vec<_>>>()?;
    let correct_answer = match self.correct_answer? {
      Value::Number(n) => usize::try_from(n.as_u64()?).ok()?,
      Value::String(s) => s.trim().parse::<usize>().ok()?,
      _ => return None,
    };
    let explanation = self.explanation
      .map(|e| e.trim().to_string())
      .filter(|e| !e.is_empty());

    let draft = QuestionDraft { topic: topic.to_string(), text, options, correct_answer, explanation };
    draft.is_valid().then_some(draft)
  }
}

/// Decode raw model output into at most `count` valid drafts.
pub fn parse_model_reply(raw: &str, topic: &str, count: usize) -> Result<Vec<QuestionDraft>, FallbackReason> {
  let body = strip_code_fences(raw);
  let reply: ModelReply = serde_json::from_str(body)
    .map_err(|e| FallbackReason::Malformed(e.to_string()))?;

  let mut drafts: Vec<QuestionDraft> = match reply {
    ModelReply::Batch { questions } => questions
      .into_iter()
      .filter_map(|v| serde_json::from_value::<RawDraft>(v).ok())
      .filter_map(|d| d.into_draft(topic))
      .collect(),
    ModelReply::Single(d) => d.into_draft(topic).into_iter().collect(),
  };
  drafts.truncate(count);

  if drafts.is_empty() {
    return Err(FallbackReason::NoValidDrafts);
  }
  debug_assert!(drafts.iter().all(|d| d.options.len() == OPTION_COUNT));
  Ok(drafts)
}
