//! Domain models used by the backend: question specs, answers, difficulty and test configuration.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Smallest selectable test size.
pub const MIN_QUESTIONS: u32 = 5;
/// Largest selectable test size.
pub const MAX_QUESTIONS: u32 = 30;
/// Test sizes are quantized to this step.
pub const QUESTION_STEP: u32 = 5;
/// Upper bound on a single question's marks; anything above is treated as malformed output.
pub const MAX_MARKS: u32 = 100;

/// What kind of MCQ is this?
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionType {
  SingleCorrect,
  MultipleCorrect,
  TrueFalse,
}

/// Either a single option index or a set of indices.
/// Used for both the correct answer of a question and the user's submission.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Answer {
  Single(usize),
  Multiple(Vec<usize>),
}

impl Answer {
  /// All indices referenced by this answer.
  pub fn indices(&self) -> Vec<usize> {
    match self {
      Answer::Single(i) => vec![*i],
      Answer::Multiple(v) => v.clone(),
    }
  }

  /// Reshape to a set (`multi`) or a single index. A set with more or fewer
  /// than one member cannot become a single index and is left as is.
  pub fn into_shape(self, multi: bool) -> Answer {
    match (self, multi) {
      (Answer::Single(i), true) => Answer::Multiple(vec![i]),
      (Answer::Multiple(v), false) if v.len() == 1 => Answer::Single(v[0]),
      (other, _) => other,
    }
  }

  /// Does `submitted` earn the marks when `self` is the correct answer?
  ///
  /// Multi-index answers compare as sets: same members, order and duplicates ignored.
  /// A single correct index only accepts the same single index.
  pub fn accepts(&self, submitted: &Answer) -> bool {
    match (self, submitted) {
      (Answer::Single(c), Answer::Single(s)) => c == s,
      (Answer::Single(_), Answer::Multiple(_)) => false,
      (Answer::Multiple(c), Answer::Multiple(s)) => {
        let c: BTreeSet<usize> = c.iter().copied().collect();
        let s: BTreeSet<usize> = s.iter().copied().collect();
        c == s
      }
      (Answer::Multiple(_), Answer::Single(_)) => false,
    }
  }
}

/// One generated MCQ. Immutable once generated.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuestionSpec {
  pub id: String,
  #[serde(rename = "type")]
  pub kind: QuestionType,
  pub question: String,
  pub options: Vec<String>,
  pub correct_answer: Answer,
  #[serde(default)] pub explanation: String,
  #[serde(default)] pub topic: String,
  pub marks: u32,
}

impl QuestionSpec {
  /// Only MULTIPLE_CORRECT takes a set; the other types take one index.
  pub fn is_multi_select(&self) -> bool {
    self.kind == QuestionType::MultipleCorrect
  }

  /// Bring the answer key into the shape the type implies. Models often send
  /// `[1]` for a single-answer question or `2` for a multiple-correct one.
  pub fn conform_answer(&mut self) {
    let multi = self.is_multi_select();
    let key = std::mem::replace(&mut self.correct_answer, Answer::Multiple(Vec::new()));
    self.correct_answer = key.into_shape(multi);
  }

  /// Structural checks applied to model output before a test may start.
  pub fn validate(&self) -> Result<(), String> {
    if self.id.trim().is_empty() {
      return Err("question has an empty id".into());
    }
    if self.question.trim().is_empty() {
      return Err(format!("question {} has no text", self.id));
    }
    if self.options.is_empty() {
      return Err(format!("question {} has no options", self.id));
    }
    let indices = self.correct_answer.indices();
    if indices.is_empty() {
      return Err(format!("question {} has an empty correct answer", self.id));
    }
    if !self.is_multi_select() && indices.len() != 1 {
      return Err(format!("question {} expects one correct option, got {}", self.id, indices.len()));
    }
    if self.is_multi_select() && matches!(self.correct_answer, Answer::Single(_)) {
      return Err(format!("question {} expects a set of correct options", self.id));
    }
    if self.marks > MAX_MARKS {
      return Err(format!("question {} is worth {} marks (max {})", self.id, self.marks, MAX_MARKS));
    }
    if let Some(bad) = indices.iter().find(|i| **i >= self.options.len()) {
      return Err(format!(
        "question {} marks option {} correct but has only {} options",
        self.id, bad, self.options.len()
      ));
    }
    Ok(())
  }
}

/// Difficulty levels offered in the setup phase.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Difficulty {
  Easy,
  #[default]
  Medium,
  Hard,
}

impl Difficulty {
  pub fn as_str(&self) -> &'static str {
    match self {
      Difficulty::Easy => "EASY",
      Difficulty::Medium => "MEDIUM",
      Difficulty::Hard => "HARD",
    }
  }
}

/// Mock test configuration, edited during setup only.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TestConfig {
  pub difficulty: Difficulty,
  pub weak_topics: Vec<String>,
  pub total_questions: u32,
}

impl Default for TestConfig {
  fn default() -> Self {
    Self { difficulty: Difficulty::Medium, weak_topics: Vec::new(), total_questions: 10 }
  }
}

impl TestConfig {
  /// Select the topic if absent, deselect it if present.
  pub fn toggle_topic(&mut self, topic: &str) {
    if let Some(pos) = self.weak_topics.iter().position(|t| t == topic) {
      self.weak_topics.remove(pos);
    } else {
      self.weak_topics.push(topic.to_string());
    }
  }

  /// Clamp into `[MIN_QUESTIONS, MAX_QUESTIONS]` and round to the nearest step.
  pub fn set_total_questions(&mut self, requested: u32) -> u32 {
    let clamped = requested.clamp(MIN_QUESTIONS, MAX_QUESTIONS);
    let rounded = ((clamped + QUESTION_STEP / 2) / QUESTION_STEP) * QUESTION_STEP;
    self.total_questions = rounded.clamp(MIN_QUESTIONS, MAX_QUESTIONS);
    self.total_questions
  }
}
