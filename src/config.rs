//! Loading agent configuration (prompts + mock test settings) from TOML.
//!
//! See `AgentConfig`, `Prompts` and `MockTestSettings` for expected schema.

use serde::Deserialize;
use tracing::{info, error};

use crate::mocktest::DEFAULT_VIOLATION_LIMIT;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AgentConfig {
  #[serde(default)]
  pub prompts: Prompts,
  #[serde(default)]
  pub mocktest: MockTestSettings,
}

/// Prompts used for topic extraction and question generation.
/// Mentor personas are fixed and live in `mentors`.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  pub topics_system: String,
  pub topics_user_template: String,
  pub questions_system: String,
  pub questions_user_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      topics_system: "You extract study topics from UPSC preparation material. Respond ONLY with a JSON array of strings.".into(),
      topics_user_template: "Based on the following PDF text, list 5-8 distinct study topic titles. Return ONLY a JSON array of strings: [\"Topic 1\", \"Topic 2\", ...]\n\nPDF: {context}".into(),
      questions_system: "You are a UPSC Prelims paper setter. Respond ONLY with strict JSON.".into(),
      questions_user_template: "Generate {count} UPSC-style MCQs based on the PDF.\nDifficulty: {difficulty}.\nWeak Topics to prioritize: {weak_topics}.\nInclude a mix of types: SINGLE_CORRECT, MULTIPLE_CORRECT (return index array), TRUE_FALSE.\nOutput ONLY a JSON array of objects:\n[{\"id\": \"1\", \"type\": \"...\", \"question\": \"...\", \"options\": [\"...\", \"...\"], \"correctAnswer\": 0 or [0,1], \"explanation\": \"...\", \"topic\": \"...\", \"marks\": 2}]\n\nPDF CONTENT: {context}".into(),
    }
  }
}

/// Tunables for the mock test engine and its collaborator calls.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct MockTestSettings {
  /// Violation number that terminates a test.
  pub violation_limit: u32,
  /// Characters of source text sent for topic extraction.
  pub topic_excerpt_chars: usize,
  /// Characters of source text sent for question generation.
  pub question_excerpt_chars: usize,
}

impl Default for MockTestSettings {
  fn default() -> Self {
    Self {
      violation_limit: DEFAULT_VIOLATION_LIMIT,
      topic_excerpt_chars: 10_000,
      question_excerpt_chars: 15_000,
    }
  }
}

/// Attempt to load `AgentConfig` from AGENT_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_agent_config_from_env() -> Option<AgentConfig> {
  let path = std::env::var("AGENT_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_agent_config(&s) {
      Ok(cfg) => {
        info!(target: "upsc_backend", %path, "Loaded agent config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "upsc_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "upsc_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

pub fn parse_agent_config(raw: &str) -> Result<AgentConfig, toml::de::Error> {
  toml::from_str::<AgentConfig>(raw)
}
