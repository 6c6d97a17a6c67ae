//! Minimal AI gateway client (OpenAI-compatible chat completions).
//!
//! Three uses: mentor chat replies, topic extraction and MCQ generation.
//! Calls are instrumented and log model names, latencies, and response sizes (not contents).
//!
//! NOTE: We never log the API key and we keep payload truncations short to avoid PII leaks.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, instrument};

use crate::config::Prompts;
use crate::domain::QuestionSpec;
use crate::mentors::MentorId;
use crate::mocktest::GenerationRequest;
use crate::util::{excerpt, extract_json_array, fill_template, trunc_for_log};

pub const DEFAULT_BASE_URL: &str = "https://ai.gateway.lovable.dev/v1";
pub const DEFAULT_MODEL: &str = "google/gemini-2.5-flash";

#[derive(Debug, Error)]
pub enum GatewayError {
  #[error("AI gateway is not configured")]
  NotConfigured,
  #[error("transport error: {0}")]
  Transport(String),
  #[error("AI gateway HTTP {status}: {message}")]
  Http { status: u16, message: String },
  #[error("JSON parse error: {0}")]
  Parse(String),
  #[error("AI gateway returned an empty reply")]
  Empty,
}

impl From<reqwest::Error> for GatewayError {
  fn from(e: reqwest::Error) -> Self {
    GatewayError::Transport(e.to_string())
  }
}

/// One turn of a conversation, as the gateway expects it.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
  pub role: String,
  pub content: String,
}

impl ChatMessage {
  pub fn system(content: impl Into<String>) -> Self {
    Self { role: "system".into(), content: content.into() }
  }
  pub fn user(content: impl Into<String>) -> Self {
    Self { role: "user".into(), content: content.into() }
  }
}

#[derive(Clone)]
pub struct Gateway {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub model: String,
}

impl Gateway {
  /// Construct the client if we find AI_GATEWAY_API_KEY; otherwise return None.
  pub fn from_env() -> Option<Self> {
    let api_key = std::env::var("AI_GATEWAY_API_KEY").ok()?;
    let base_url = std::env::var("AI_GATEWAY_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
    let model = std::env::var("AI_GATEWAY_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into());
    Self::new(api_key, base_url, model).ok()
  }

  pub fn new(api_key: String, base_url: String, model: String) -> Result<Self, GatewayError> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(60))
      .build()?;
    Ok(Self { client, api_key, base_url: base_url.trim_end_matches('/').to_string(), model })
  }

  /// Raw chat completion: returns the first choice's text, trimmed.
  #[instrument(level = "info", skip(self, messages), fields(model = %self.model, turns = messages.len()))]
  async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String, GatewayError> {
    let url = format!("{}/chat/completions", self.base_url);
    let req = ChatCompletionRequest {
      model: self.model.clone(),
      messages,
    };

    let start = std::time::Instant::now();
    let res = self.client.post(&url)
      .header(USER_AGENT, "upsc-mentor-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req).send().await?;

    if !res.status().is_success() {
      let status = res.status().as_u16();
      let body = res.text().await.unwrap_or_default();
      let message = extract_gateway_error(&body).unwrap_or(body);
      error!(target: "gateway", status, error = %trunc_for_log(&message, 200), "AI gateway error");
      return Err(GatewayError::Http { status, message });
    }

    let body: ChatCompletionResponse = res.json().await.map_err(|e| GatewayError::Parse(e.to_string()))?;
    if let Some(usage) = &body.usage {
      info!(target: "gateway", prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "Gateway usage");
    }
    let text = body.choices.first()
      .and_then(|c| c.message.content.clone())
      .unwrap_or_default().trim().to_string();
    info!(target: "gateway", elapsed = ?start.elapsed(), reply_len = text.len(), "Gateway reply received");
    Ok(text)
  }

  /// Reply text is expected to contain a JSON array of `T`.
  async fn chat_json_array<T: for<'a> Deserialize<'a>>(
    &self,
    system: &str,
    user: &str,
  ) -> Result<Vec<T>, GatewayError> {
    let text = self.chat(vec![ChatMessage::system(system), ChatMessage::user(user)]).await?;
    if text.is_empty() {
      return Err(GatewayError::Empty);
    }
    let raw = extract_json_array(&text).ok_or_else(|| {
      debug!(target: "gateway", reply = %trunc_for_log(&text, 120), "No JSON array in reply");
      GatewayError::Parse("reply does not contain a JSON array".into())
    })?;
    serde_json::from_str::<Vec<T>>(raw).map_err(|e| GatewayError::Parse(e.to_string()))
  }

  // --- High-level helpers (domain-specialized) ---

  /// Forward a conversation to a mentor persona.
  #[instrument(level = "info", skip(self, history), fields(mentor = mentor.as_str(), turns = history.len()))]
  pub async fn mentor_reply(&self, mentor: MentorId, history: &[ChatMessage]) -> Result<String, GatewayError> {
    let mut messages = Vec::with_capacity(history.len() + 1);
    messages.push(ChatMessage::system(mentor.system_prompt()));
    messages.extend(history.iter().cloned());
    self.chat(messages).await
  }

  /// Short topic titles for the setup screen's topic picker.
  #[instrument(level = "info", skip(self, prompts, source), fields(source_len = source.len()))]
  pub async fn extract_topics(
    &self,
    prompts: &Prompts,
    source: &str,
    excerpt_chars: usize,
  ) -> Result<Vec<String>, GatewayError> {
    let user = fill_template(&prompts.topics_user_template, &[("context", excerpt(source, excerpt_chars))]);
    let topics: Vec<String> = self.chat_json_array(&prompts.topics_system, &user).await?;
    let topics: Vec<String> = topics
      .into_iter()
      .map(|t| t.trim().to_string())
      .filter(|t| !t.is_empty())
      .collect();
    info!(target: "gateway", count = topics.len(), "Topics extracted");
    Ok(topics)
  }

  /// Ask for a full question set matching the test configuration.
  #[instrument(
    level = "info",
    skip(self, prompts, req),
    fields(count = req.config.total_questions, difficulty = req.config.difficulty.as_str())
  )]
  pub async fn generate_questions(
    &self,
    prompts: &Prompts,
    req: &GenerationRequest,
    excerpt_chars: usize,
  ) -> Result<Vec<QuestionSpec>, GatewayError> {
    let count = req.config.total_questions.to_string();
    let weak_topics = if req.config.weak_topics.is_empty() {
      "none in particular".to_string()
    } else {
      req.config.weak_topics.join(", ")
    };
    let user = fill_template(
      &prompts.questions_user_template,
      &[
        ("count", count.as_str()),
        ("difficulty", req.config.difficulty.as_str()),
        ("weak_topics", weak_topics.as_str()),
        ("context", excerpt(&req.source, excerpt_chars)),
      ],
    );
    let questions: Vec<QuestionSpec> = self.chat_json_array(&prompts.questions_system, &user).await?;
    if questions.is_empty() {
      return Err(GatewayError::Empty);
    }
    info!(target: "gateway", count = questions.len(), "Questions generated");
    Ok(questions)
  }
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessage>,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

/// Try to extract a clean error message from an OpenAI-style error body.
fn extract_gateway_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  match serde_json::from_str::<EWrap>(body) {
    Ok(w) => Some(w.error.message),
    Err(_) => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{Difficulty, TestConfig};
  use wiremock::matchers::{header, method, path};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  fn reply(content: &str) -> serde_json::Value {
    serde_json::json!({
      "choices": [{"message": {"role": "assistant", "content": content}, "index": 0}],
      "usage": {"prompt_tokens": 40, "completion_tokens": 15, "total_tokens": 55}
    })
  }

  async fn gateway_for(server: &MockServer) -> Gateway {
    Gateway::new("test-key".into(), format!("{}/v1", server.uri()), DEFAULT_MODEL.into()).expect("client")
  }

  fn request() -> GenerationRequest {
    GenerationRequest {
      config: TestConfig { difficulty: Difficulty::Hard, weak_topics: vec!["Federalism".into()], total_questions: 5 },
      source: "The Constitution of India ...".into(),
    }
  }

  #[tokio::test]
  async fn mentor_reply_sends_system_prompt_and_auth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/v1/chat/completions"))
      .and(header("Authorization", "Bearer test-key"))
      .respond_with(ResponseTemplate::new(200).set_body_json(reply("  Article 17 abolishes untouchability.  ")))
      .expect(1)
      .mount(&server)
      .await;

    let gw = gateway_for(&server).await;
    let text = gw
      .mentor_reply(MentorId::Polity, &[ChatMessage::user("What does Article 17 do?")])
      .await
      .expect("reply");
    assert_eq!(text, "Article 17 abolishes untouchability.");

    let received = server.received_requests().await.expect("recorded");
    let body: serde_json::Value = serde_json::from_slice(&received[0].body).expect("json body");
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][1]["content"], "What does Article 17 do?");
  }

  #[tokio::test]
  async fn rate_limit_surfaces_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/v1/chat/completions"))
      .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({"error": {"message": "slow down"}})))
      .mount(&server)
      .await;

    let gw = gateway_for(&server).await;
    let err = gw.mentor_reply(MentorId::Mentor, &[ChatMessage::user("hi")]).await.unwrap_err();
    match err {
      GatewayError::Http { status, message } => {
        assert_eq!(status, 429);
        assert_eq!(message, "slow down");
      }
      other => panic!("unexpected error {other:?}"),
    }
  }

  #[tokio::test]
  async fn topics_tolerate_fenced_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/v1/chat/completions"))
      .respond_with(ResponseTemplate::new(200).set_body_json(reply("```json\n[\"Preamble\", \" \", \"Federalism\"]\n```")))
      .mount(&server)
      .await;

    let gw = gateway_for(&server).await;
    let topics = gw.extract_topics(&Prompts::default(), "some text", 100).await.expect("topics");
    assert_eq!(topics, vec!["Preamble".to_string(), "Federalism".to_string()]);
  }

  #[tokio::test]
  async fn generated_questions_parse() {
    let server = MockServer::start().await;
    let payload = r#"[{"id":"1","type":"SINGLE_CORRECT","question":"Q","options":["a","b"],"correctAnswer":1,"explanation":"e","topic":"t","marks":2},
                      {"id":"2","type":"MULTIPLE_CORRECT","question":"Q2","options":["a","b","c"],"correctAnswer":[0,2],"explanation":"e","topic":"t","marks":2}]"#;
    Mock::given(method("POST"))
      .and(path("/v1/chat/completions"))
      .respond_with(ResponseTemplate::new(200).set_body_json(reply(payload)))
      .mount(&server)
      .await;

    let gw = gateway_for(&server).await;
    let qs = gw.generate_questions(&Prompts::default(), &request(), 1000).await.expect("questions");
    assert_eq!(qs.len(), 2);

    let received = server.received_requests().await.expect("recorded");
    let body: serde_json::Value = serde_json::from_slice(&received[0].body).expect("json body");
    let user = body["messages"][1]["content"].as_str().expect("user prompt");
    assert!(user.contains("Generate 5 UPSC-style MCQs"));
    assert!(user.contains("Difficulty: HARD"));
    assert!(user.contains("Federalism"));
  }

  #[tokio::test]
  async fn malformed_and_empty_replies_are_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/v1/chat/completions"))
      .respond_with(ResponseTemplate::new(200).set_body_json(reply("[{\"id\": 1}]")))
      .up_to_n_times(1)
      .mount(&server)
      .await;
    Mock::given(method("POST"))
      .and(path("/v1/chat/completions"))
      .respond_with(ResponseTemplate::new(200).set_body_json(reply("[]")))
      .mount(&server)
      .await;

    let gw = gateway_for(&server).await;
    let first = gw.generate_questions(&Prompts::default(), &request(), 1000).await;
    assert!(matches!(first, Err(GatewayError::Parse(_))));
    let second = gw.generate_questions(&Prompts::default(), &request(), 1000).await;
    assert!(matches!(second, Err(GatewayError::Empty)));
  }
}
