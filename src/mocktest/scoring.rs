//! Scoring a finished attempt. Pure: no clocks, no progress side effects.

use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;

use crate::domain::{Answer, QuestionSpec};

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReviewItem {
  pub question: QuestionSpec,
  pub user_answer: Option<Answer>,
  pub is_correct: bool,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
  pub score: u32,
  pub total_marks: u32,
  pub percentage: f64,
  pub correct_count: usize,
  pub incorrect_count: usize,
  pub unanswered_count: usize,
  pub time_spent_secs: u64,
  pub violations: u32,
  /// Ended by the integrity monitor rather than by the user.
  pub terminated: bool,
  pub question_review: Vec<ReviewItem>,
}

/// Score / total as a percentage, 0 when nothing was worth any marks.
pub fn percentage(score: u32, total: u32) -> f64 {
  if total == 0 {
    0.0
  } else {
    f64::from(score) / f64::from(total) * 100.0
  }
}

pub fn evaluate(
  questions: &[QuestionSpec],
  answers: &HashMap<String, Answer>,
  elapsed: Duration,
  violations: u32,
  terminated: bool,
) -> TestResult {
  let mut score = 0u32;
  let mut total_marks = 0u32;
  let mut correct_count = 0usize;
  let mut incorrect_count = 0usize;
  let mut unanswered_count = 0usize;

  let question_review: Vec<ReviewItem> = questions
    .iter()
    .map(|q| {
      total_marks = total_marks.saturating_add(q.marks);
      let Some(ans) = answers.get(&q.id) else {
        unanswered_count += 1;
        return ReviewItem { question: q.clone(), user_answer: None, is_correct: false };
      };
      let is_correct = q.correct_answer.accepts(ans);
      if is_correct {
        score = score.saturating_add(q.marks);
        correct_count += 1;
      } else {
        incorrect_count += 1;
      }
      ReviewItem { question: q.clone(), user_answer: Some(ans.clone()), is_correct }
    })
    .collect();

  TestResult {
    score,
    total_marks,
    percentage: percentage(score, total_marks),
    correct_count,
    incorrect_count,
    unanswered_count,
    time_spent_secs: (elapsed.as_millis() as u64 + 500) / 1000,
    violations,
    terminated,
    question_review,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::QuestionType;

  fn single(id: &str, correct: usize, marks: u32) -> QuestionSpec {
    QuestionSpec {
      id: id.into(),
      kind: QuestionType::SingleCorrect,
      question: format!("Q{id}"),
      options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
      correct_answer: Answer::Single(correct),
      explanation: String::new(),
      topic: "Polity".into(),
      marks,
    }
  }

  #[test]
  fn huge_marks_saturate_instead_of_overflowing() {
    let questions = vec![single("a", 0, u32::MAX), single("b", 0, 2)];
    let answers: HashMap<String, Answer> =
      [("a".to_string(), Answer::Single(0)), ("b".to_string(), Answer::Single(0))].into_iter().collect();
    let r = evaluate(&questions, &answers, Duration::ZERO, 0, false);
    assert_eq!(r.total_marks, u32::MAX);
    assert_eq!(r.score, u32::MAX);
    assert_eq!(r.percentage, 100.0);
  }

  #[test]
  fn seven_of_ten_with_three_unanswered() {
    let questions: Vec<_> = (0..10).map(|i| single(&i.to_string(), 1, 2)).collect();
    let answers: HashMap<String, Answer> =
      (0..7).map(|i| (i.to_string(), Answer::Single(1))).collect();

    let r = evaluate(&questions, &answers, Duration::from_secs(95), 0, false);
    assert_eq!(r.score, 14);
    assert_eq!(r.total_marks, 20);
    assert!((r.percentage - 70.0).abs() < 1e-9);
    assert_eq!(r.correct_count, 7);
    assert_eq!(r.unanswered_count, 3);
    assert_eq!(r.incorrect_count, 0);
    assert_eq!(r.question_review.len(), 10);
    assert_eq!(r.time_spent_secs, 95);
  }

  #[test]
  fn unanswered_scores_zero_and_is_incorrect() {
    let questions = vec![single("a", 0, 5)];
    let r = evaluate(&questions, &HashMap::new(), Duration::ZERO, 0, false);
    assert_eq!(r.score, 0);
    let item = &r.question_review[0];
    assert!(!item.is_correct);
    assert_eq!(item.user_answer, None);
  }

  #[test]
  fn superset_on_multi_correct_is_rejected() {
    let mut q = single("m", 0, 2);
    q.kind = QuestionType::MultipleCorrect;
    q.correct_answer = Answer::Multiple(vec![0, 2]);
    let mut answers = HashMap::new();
    answers.insert("m".to_string(), Answer::Multiple(vec![0, 1, 2]));
    let r = evaluate(&[q], &answers, Duration::ZERO, 0, false);
    assert!(!r.question_review[0].is_correct);
    assert_eq!(r.incorrect_count, 1);
  }

  #[test]
  fn zero_total_marks_is_zero_percent() {
    let questions = vec![single("z", 0, 0)];
    let mut answers = HashMap::new();
    answers.insert("z".to_string(), Answer::Single(0));
    let r = evaluate(&questions, &answers, Duration::ZERO, 0, false);
    assert_eq!(r.percentage, 0.0);
    assert_eq!(r.correct_count, 1);
  }
}
