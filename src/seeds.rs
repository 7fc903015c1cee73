//! Offline content served when the model is unavailable or returns nothing usable.

use crate::domain::QuestionDraft;

/// Marker prepended to every offline question text.
pub const OFFLINE_PREFIX: &str = "(Modo Offline)";

/// Synthetic identifier for the `index`-th fallback item of the response tagged `batch`.
pub fn fallback_id(batch: &str, index: usize) -> String {
  format!("fallback-{batch}-{index}")
}

/// Deterministic fallback batch: `count` copies of one fixed chemistry fact.
pub fn fallback_batch(topic: &str, count: usize) -> Vec<QuestionDraft> {
  let base = QuestionDraft {
    topic: topic.to_string(),
    text: format!("{OFFLINE_PREFIX} Gerador de questões indisponível. Qual a massa de 1 mol de Carbono?"),
    options: ["10g", "12g", "14g", "6g", "24g"].into_iter().map(String::from).collect(),
    correct_answer: 1,
    explanation: Some("A massa molar do Carbono na tabela periódica é 12g/mol.".into()),
  };
  vec![base; count]
}
