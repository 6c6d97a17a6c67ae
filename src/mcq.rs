//! MCQ review card: one question, immutable options, locks after the first pick.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Answer, QuestionSpec};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum McqError {
  #[error("this question has already been answered")]
  AlreadyAnswered,
  #[error("option {index} does not exist (question has {count} options)")]
  NoSuchOption { index: usize, count: usize },
  #[error("correct option {correct} is out of range (question has {count} options)")]
  InvalidCorrect { correct: usize, count: usize },
}

/// The question payload a card is built from.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Mcq {
  pub question: String,
  pub options: Vec<String>,
  pub correct: usize,
  #[serde(default)] pub explanation: String,
}

impl Mcq {
  /// A card must have options and a correct index that points at one of them.
  pub fn validate(&self) -> Result<(), McqError> {
    let count = self.options.len();
    if self.correct >= count {
      return Err(McqError::InvalidCorrect { correct: self.correct, count });
    }
    Ok(())
  }

  /// Cards only exist for single-answer questions.
  pub fn from_question(q: &QuestionSpec) -> Option<Self> {
    match q.correct_answer {
      Answer::Single(correct) => Some(Self {
        question: q.question.clone(),
        options: q.options.clone(),
        correct,
        explanation: q.explanation.clone(),
      }),
      Answer::Multiple(_) => None,
    }
  }
}

#[derive(Clone, Debug)]
pub struct McqCard {
  mcq: Mcq,
  selected: Option<usize>,
}

/// What the client renders after a selection. Correct option and explanation
/// are only present once the card is locked.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CardView {
  pub question: String,
  pub options: Vec<String>,
  pub selected: Option<usize>,
  pub correct: Option<usize>,
  pub is_correct: Option<bool>,
  pub explanation: Option<String>,
}

impl McqCard {
  pub fn new(mcq: Mcq) -> Self {
    Self { mcq, selected: None }
  }

  pub fn is_locked(&self) -> bool {
    self.selected.is_some()
  }

  /// First selection locks the card. Returns whether the pick was correct.
  pub fn select(&mut self, index: usize) -> Result<bool, McqError> {
    if self.is_locked() {
      return Err(McqError::AlreadyAnswered);
    }
    let count = self.mcq.options.len();
    if index >= count {
      return Err(McqError::NoSuchOption { index, count });
    }
    self.selected = Some(index);
    Ok(index == self.mcq.correct)
  }

  pub fn view(&self) -> CardView {
    let revealed = self.is_locked();
    CardView {
      question: self.mcq.question.clone(),
      options: self.mcq.options.clone(),
      selected: self.selected,
      correct: revealed.then_some(self.mcq.correct),
      is_correct: self.selected.map(|s| s == self.mcq.correct),
      explanation: revealed.then(|| self.mcq.explanation.clone()),
    }
  }
}
