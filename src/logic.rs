//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - Topic extraction (non-fatal: failures degrade to an empty list)
//!   - Question generation for the mock test engine
//!   - Mentor chat forwarding
//!   - Standalone MCQ checks

use tracing::{debug, error, info, instrument, warn};

use crate::domain::QuestionSpec;
use crate::gateway::{ChatMessage, GatewayError};
use crate::mcq::{CardView, Mcq, McqCard, McqError};
use crate::mentors::{MentorId, EMPTY_REPLY_FALLBACK};
use crate::mocktest::GenerationRequest;
use crate::state::AppState;

#[instrument(level = "info", skip(state, source), fields(source_len = source.len()))]
pub async fn extract_topics(state: &AppState, source: &str) -> Vec<String> {
  let Some(gw) = &state.gateway else {
    error!(target: "mocktest", "Topic extraction skipped: AI gateway not configured");
    return Vec::new();
  };
  match gw.extract_topics(&state.prompts, source, state.settings.topic_excerpt_chars).await {
    Ok(topics) => topics,
    Err(e) => {
      error!(target: "mocktest", error = %e, "Topic extraction failed");
      Vec::new()
    }
  }
}

/// Errors come back as text; the engine shows them in its setup notice.
#[instrument(level = "info", skip(state, req), fields(count = req.config.total_questions))]
pub async fn generate_questions(state: &AppState, req: &GenerationRequest) -> Result<Vec<QuestionSpec>, String> {
  let gw = state.gateway.as_ref().ok_or_else(|| GatewayError::NotConfigured.to_string())?;
  gw.generate_questions(&state.prompts, req, state.settings.question_excerpt_chars)
    .await
    .map_err(|e| e.to_string())
}

/// Only user/assistant turns are forwarded; the persona's system prompt is ours to set.
#[instrument(level = "info", skip(state, messages), fields(mentor = mentor.as_str(), turns = messages.len()))]
pub async fn mentor_chat(state: &AppState, mentor: MentorId, messages: Vec<ChatMessage>) -> Result<String, GatewayError> {
  let gw = state.gateway.as_ref().ok_or(GatewayError::NotConfigured)?;
  let total = messages.len();
  let history: Vec<ChatMessage> = messages
    .into_iter()
    .filter(|m| m.role == "user" || m.role == "assistant")
    .filter(|m| !m.content.trim().is_empty())
    .collect();
  if history.len() != total {
    warn!(target: "upsc_backend", dropped = total - history.len(), "Dropped non-conversation turns");
  }

  info!(target: "upsc_backend", turns = history.len(), "Processing mentor request");
  let text = gw.mentor_reply(mentor, &history).await?;
  if text.is_empty() {
    debug!(target: "upsc_backend", "Empty mentor reply; using fallback text");
    return Ok(EMPTY_REPLY_FALLBACK.to_string());
  }
  Ok(text)
}

/// A standalone card is stateless on the server: build, select once, report.
pub fn check_mcq(mcq: Mcq, selected: usize) -> Result<CardView, McqError> {
  mcq.validate()?;
  let mut card = McqCard::new(mcq);
  card.select(selected)?;
  Ok(card.view())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::{MockTestSettings, Prompts};
  use crate::domain::TestConfig;

  fn offline_state() -> AppState {
    AppState::with_parts(None, Prompts::default(), MockTestSettings::default())
  }

  #[tokio::test]
  async fn topics_degrade_to_empty_without_gateway() {
    assert!(extract_topics(&offline_state(), "text").await.is_empty());
  }

  #[tokio::test]
  async fn generation_without_gateway_is_an_error() {
    let req = GenerationRequest { config: TestConfig::default(), source: "text".into() };
    let err = generate_questions(&offline_state(), &req).await.unwrap_err();
    assert!(err.contains("not configured"));
  }

  #[tokio::test]
  async fn mentor_chat_without_gateway_is_not_configured() {
    let res = mentor_chat(&offline_state(), MentorId::Mentor, vec![ChatMessage::user("hi")]).await;
    assert!(matches!(res, Err(GatewayError::NotConfigured)));
  }

  #[test]
  fn standalone_check_reveals_answer() {
    let mcq = Mcq {
      question: "Who wrote Discovery of India?".into(),
      options: vec!["Gandhi".into(), "Nehru".into()],
      correct: 1,
      explanation: "Written in Ahmednagar Fort.".into(),
    };
    let view = check_mcq(mcq, 0).expect("view");
    assert_eq!(view.is_correct, Some(false));
    assert_eq!(view.correct, Some(1));
  }

  #[test]
  fn standalone_check_rejects_unanswerable_card() {
    let mcq = Mcq { question: "Q".into(), options: vec!["a".into(), "b".into()], correct: 99, explanation: String::new() };
    assert_eq!(check_mcq(mcq, 0), Err(McqError::InvalidCorrect { correct: 99, count: 2 }));
  }
}
