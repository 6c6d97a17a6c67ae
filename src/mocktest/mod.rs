//! Mock test engine: setup → loading → test → results, with restart back to setup.
//!
//! The engine is synchronous and owns no I/O. Network work (topic extraction,
//! question generation) happens outside; callers hand results back through
//! `set_topics` and `complete_generation`. Every method that can end a test
//! takes the learner's `Progress` so the reward is applied in the same step
//! as the transition into results.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::{Answer, Difficulty, QuestionSpec, QuestionType, TestConfig};
use crate::mcq::{CardView, Mcq, McqCard, McqError};
use crate::progress::{Award, Progress};

pub mod integrity;
pub mod scoring;

use integrity::{IntegrityEvent, IntegrityMonitor, Verdict};
use scoring::{evaluate, TestResult};

/// Violation number that ends a test: two warnings, the third one terminates.
pub const DEFAULT_VIOLATION_LIMIT: u32 = 3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MockTestError {
  #[error("a study source is required before a mock test can be configured")]
  ContextRequired,
  #[error("not allowed during {actual} (expected {expected})")]
  WrongPhase { expected: &'static str, actual: &'static str },
  #[error("question generation is already in progress")]
  GenerationInFlight,
  #[error("question {index} does not exist (test has {count})")]
  NoSuchQuestion { index: usize, count: usize },
  #[error("option {index} does not exist (question has {count} options)")]
  NoSuchOption { index: usize, count: usize },
  #[error("toggling options is only possible on multiple-correct questions")]
  NotMultiSelect,
  #[error("review item {0} has no single-answer card")]
  NoReviewCard(usize),
  #[error(transparent)]
  Review(#[from] McqError),
}

/// Topic selector contents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TopicList {
  Extracting,
  Ready(Vec<String>),
}

/// What the generation collaborator needs to produce a test.
#[derive(Clone, Debug)]
pub struct GenerationRequest {
  pub config: TestConfig,
  pub source: String,
}

#[derive(Debug)]
pub struct TestSession {
  questions: Vec<QuestionSpec>,
  answers: HashMap<String, Answer>,
  current: usize,
  started_at: Instant,
  monitor: IntegrityMonitor,
}

impl TestSession {
  fn question(&self) -> &QuestionSpec {
    &self.questions[self.current]
  }

  fn is_last(&self) -> bool {
    self.current + 1 == self.questions.len()
  }
}

#[derive(Debug)]
pub struct Report {
  pub result: TestResult,
  pub award: Award,
  /// One slot per review item; `None` for multiple-correct questions.
  cards: Vec<Option<McqCard>>,
}

#[derive(Debug)]
pub enum Phase {
  Setup { notice: Option<String> },
  Loading,
  Test(TestSession),
  Results(Report),
}

impl Phase {
  pub fn name(&self) -> &'static str {
    match self {
      Phase::Setup { .. } => "setup",
      Phase::Loading => "loading",
      Phase::Test(_) => "test",
      Phase::Results(_) => "results",
    }
  }
}

/// Result of moving forward from the current question.
#[derive(Debug, PartialEq)]
pub enum Advance {
  Moved(usize),
  Finished,
}

/// Result of reporting a browser event.
#[derive(Debug, PartialEq)]
pub enum IntegrityOutcome {
  /// Not in the test phase; nothing is listening.
  Ignored,
  Suppressed,
  Warning { count: u32, limit: u32, remaining: u32 },
  Terminated,
}

pub struct MockTest {
  source: Option<String>,
  config: TestConfig,
  topics: TopicList,
  phase: Phase,
  violation_limit: u32,
}

impl MockTest {
  /// A blank or absent source leaves the engine in the "context required" state for good.
  pub fn new(source: Option<String>, violation_limit: u32) -> Self {
    let source = source.filter(|s| !s.trim().is_empty());
    let topics = if source.is_some() { TopicList::Extracting } else { TopicList::Ready(Vec::new()) };
    Self {
      source,
      config: TestConfig::default(),
      topics,
      phase: Phase::Setup { notice: None },
      violation_limit,
    }
  }

  pub fn has_context(&self) -> bool {
    self.source.is_some()
  }

  pub fn source(&self) -> Option<&str> {
    self.source.as_deref()
  }

  pub fn phase(&self) -> &Phase {
    &self.phase
  }

  pub fn config(&self) -> &TestConfig {
    &self.config
  }

  pub fn topics(&self) -> &TopicList {
    &self.topics
  }

  /// Topic extraction finished. Failures arrive here as an empty list.
  pub fn set_topics(&mut self, topics: Vec<String>) {
    if !self.has_context() {
      return;
    }
    self.topics = TopicList::Ready(topics);
  }

  fn guard(&self) -> Result<(), MockTestError> {
    if self.has_context() { Ok(()) } else { Err(MockTestError::ContextRequired) }
  }

  fn setup_mut(&mut self) -> Result<&mut TestConfig, MockTestError> {
    self.guard()?;
    match &self.phase {
      Phase::Setup { .. } => Ok(&mut self.config),
      other => Err(MockTestError::WrongPhase { expected: "setup", actual: other.name() }),
    }
  }

  fn test_mut(&mut self) -> Result<&mut TestSession, MockTestError> {
    self.guard()?;
    match &mut self.phase {
      Phase::Test(session) => Ok(session),
      other => Err(MockTestError::WrongPhase { expected: "test", actual: other.name() }),
    }
  }

  // --- setup ---

  pub fn set_difficulty(&mut self, difficulty: Difficulty) -> Result<(), MockTestError> {
    self.setup_mut()?.difficulty = difficulty;
    Ok(())
  }

  pub fn toggle_topic(&mut self, topic: &str) -> Result<(), MockTestError> {
    self.setup_mut()?.toggle_topic(topic);
    Ok(())
  }

  pub fn set_question_count(&mut self, requested: u32) -> Result<u32, MockTestError> {
    Ok(self.setup_mut()?.set_total_questions(requested))
  }

  /// setup → loading. The returned request is what should be sent to the generator.
  pub fn begin_generation(&mut self) -> Result<GenerationRequest, MockTestError> {
    self.guard()?;
    match &self.phase {
      Phase::Setup { .. } => {}
      Phase::Loading => return Err(MockTestError::GenerationInFlight),
      other => return Err(MockTestError::WrongPhase { expected: "setup", actual: other.name() }),
    }
    self.phase = Phase::Loading;
    info!(target: "mocktest", difficulty = self.config.difficulty.as_str(), count = self.config.total_questions, topics = self.config.weak_topics.len(), "Question generation requested");
    Ok(GenerationRequest {
      config: self.config.clone(),
      source: self.source.clone().unwrap_or_default(),
    })
  }

  /// loading → test on success, loading → setup with a notice on any failure.
  pub fn complete_generation(
    &mut self,
    outcome: Result<Vec<QuestionSpec>, String>,
    now: Instant,
  ) -> Result<(), MockTestError> {
    self.guard()?;
    if !matches!(self.phase, Phase::Loading) {
      return Err(MockTestError::WrongPhase { expected: "loading", actual: self.phase.name() });
    }

    let questions = outcome.and_then(|qs| accept_questions(qs, self.config.total_questions as usize));
    match questions {
      Ok(questions) => {
        info!(target: "mocktest", count = questions.len(), "Test started");
        self.phase = Phase::Test(TestSession {
          questions,
          answers: HashMap::new(),
          current: 0,
          started_at: now,
          monitor: IntegrityMonitor::new(self.violation_limit),
        });
      }
      Err(e) => {
        warn!(target: "mocktest", error = %e, "Question generation failed; back to setup");
        self.phase = Phase::Setup {
          notice: Some(format!("Question generation failed. Please try again. ({e})")),
        };
      }
    }
    Ok(())
  }

  // --- test ---

  pub fn current_index(&self) -> Option<usize> {
    match &self.phase {
      Phase::Test(s) => Some(s.current),
      _ => None,
    }
  }

  /// Store (or overwrite) the answer to the current question.
  pub fn answer(&mut self, answer: Answer) -> Result<(), MockTestError> {
    let session = self.test_mut()?;
    let q = session.question();
    let count = q.options.len();
    if let Some(bad) = answer.indices().into_iter().find(|i| *i >= count) {
      return Err(MockTestError::NoSuchOption { index: bad, count });
    }
    let id = q.id.clone();
    let answer = answer.into_shape(q.is_multi_select());
    session.answers.insert(id, answer);
    Ok(())
  }

  /// Add or remove one option from the current multiple-correct answer.
  pub fn toggle_option(&mut self, option: usize) -> Result<(), MockTestError> {
    let session = self.test_mut()?;
    let q = session.question();
    if !q.is_multi_select() {
      return Err(MockTestError::NotMultiSelect);
    }
    let count = q.options.len();
    if option >= count {
      return Err(MockTestError::NoSuchOption { index: option, count });
    }
    let id = q.id.clone();
    let mut selected = match session.answers.get(&id) {
      Some(Answer::Multiple(v)) => v.clone(),
      Some(Answer::Single(i)) => vec![*i],
      None => Vec::new(),
    };
    if let Some(pos) = selected.iter().position(|i| *i == option) {
      selected.remove(pos);
    } else {
      selected.push(option);
    }
    session.answers.insert(id, Answer::Multiple(selected));
    Ok(())
  }

  pub fn go_to(&mut self, index: usize) -> Result<usize, MockTestError> {
    let session = self.test_mut()?;
    let count = session.questions.len();
    if index >= count {
      return Err(MockTestError::NoSuchQuestion { index, count });
    }
    session.current = index;
    Ok(index)
  }

  /// Move back one question; stays put on the first.
  pub fn previous(&mut self) -> Result<usize, MockTestError> {
    let session = self.test_mut()?;
    session.current = session.current.saturating_sub(1);
    Ok(session.current)
  }

  /// Move forward one question; stays put on the last.
  pub fn next(&mut self) -> Result<usize, MockTestError> {
    let session = self.test_mut()?;
    if !session.is_last() {
      session.current += 1;
    }
    Ok(session.current)
  }

  /// The primary "next" action: moves forward, or evaluates on the last question.
  pub fn advance(&mut self, progress: &mut Progress, now: Instant) -> Result<Advance, MockTestError> {
    let session = self.test_mut()?;
    if session.is_last() {
      self.conclude(false, progress, now)?;
      Ok(Advance::Finished)
    } else {
      session.current += 1;
      Ok(Advance::Moved(session.current))
    }
  }

  /// Submit the test from any question.
  pub fn finish(&mut self, progress: &mut Progress, now: Instant) -> Result<&TestResult, MockTestError> {
    self.test_mut()?;
    self.conclude(false, progress, now)?;
    self.result().ok_or(MockTestError::WrongPhase { expected: "results", actual: "test" })
  }

  /// Feed a browser event to the integrity monitor.
  pub fn report_integrity(
    &mut self,
    event: IntegrityEvent,
    progress: &mut Progress,
    now: Instant,
  ) -> Result<IntegrityOutcome, MockTestError> {
    self.guard()?;
    let Phase::Test(session) = &mut self.phase else {
      return Ok(IntegrityOutcome::Ignored);
    };
    match session.monitor.observe(event) {
      Verdict::Suppressed => Ok(IntegrityOutcome::Suppressed),
      Verdict::Warning { count, limit, remaining } => {
        warn!(target: "mocktest", ?event, count, limit, "Integrity warning");
        Ok(IntegrityOutcome::Warning { count, limit, remaining })
      }
      Verdict::Terminate { count } => {
        warn!(target: "mocktest", ?event, count, "Integrity limit reached; terminating test");
        self.conclude(true, progress, now)?;
        Ok(IntegrityOutcome::Terminated)
      }
    }
  }

  /// test → results. Consumes the test payload, so it can only run once per attempt.
  fn conclude(&mut self, terminated: bool, progress: &mut Progress, now: Instant) -> Result<(), MockTestError> {
    let phase = std::mem::replace(&mut self.phase, Phase::Loading);
    let session = match phase {
      Phase::Test(session) => session,
      other => {
        let actual = other.name();
        self.phase = other;
        return Err(MockTestError::WrongPhase { expected: "test", actual });
      }
    };

    let elapsed = now.saturating_duration_since(session.started_at);
    let result = evaluate(&session.questions, &session.answers, elapsed, session.monitor.violations(), terminated);
    let award = progress.apply_test_reward(result.percentage);
    let cards = session
      .questions
      .iter()
      .map(|q| Mcq::from_question(q).map(McqCard::new))
      .collect();

    info!(
      target: "mocktest",
      score = result.score,
      total = result.total_marks,
      percentage = %format!("{:.1}", result.percentage),
      terminated,
      xp_gained = award.xp_gained,
      level_up = award.level_up,
      "Test evaluated"
    );
    self.phase = Phase::Results(Report { result, award, cards });
    Ok(())
  }

  // --- results ---

  pub fn report(&self) -> Option<&Report> {
    match &self.phase {
      Phase::Results(report) => Some(report),
      _ => None,
    }
  }

  pub fn result(&self) -> Option<&TestResult> {
    self.report().map(|r| &r.result)
  }

  /// Pick an option on the review card of question `index`.
  pub fn review_select(&mut self, index: usize, option: usize) -> Result<CardView, MockTestError> {
    self.guard()?;
    let actual = self.phase.name();
    let Phase::Results(report) = &mut self.phase else {
      return Err(MockTestError::WrongPhase { expected: "results", actual });
    };
    let count = report.cards.len();
    let slot = report.cards.get_mut(index).ok_or(MockTestError::NoSuchQuestion { index, count })?;
    let card = slot.as_mut().ok_or(MockTestError::NoReviewCard(index))?;
    card.select(option)?;
    Ok(card.view())
  }

  /// results → setup. Keeps topics and configuration, drops everything per attempt.
  pub fn restart(&mut self) -> Result<(), MockTestError> {
    self.guard()?;
    match &self.phase {
      Phase::Results(_) => {
        self.phase = Phase::Setup { notice: None };
        info!(target: "mocktest", "Restarted to setup");
        Ok(())
      }
      other => Err(MockTestError::WrongPhase { expected: "results", actual: other.name() }),
    }
  }

  // --- snapshots ---

  pub fn view(&self) -> EngineView {
    if !self.has_context() {
      return EngineView::ContextRequired;
    }
    match &self.phase {
      Phase::Setup { notice } => EngineView::Setup {
        notice: notice.clone(),
        config: self.config.clone(),
        topics: match &self.topics {
          TopicList::Extracting => None,
          TopicList::Ready(t) => Some(t.clone()),
        },
      },
      Phase::Loading => EngineView::Loading { config: self.config.clone() },
      Phase::Test(s) => {
        let q = s.question();
        EngineView::Test {
          index: s.current,
          total: s.questions.len(),
          question: QuestionView::from(q),
          answer: s.answers.get(&q.id).cloned(),
          answered: s.answers.len(),
          violations: s.monitor.violations(),
        }
      }
      Phase::Results(r) => EngineView::Results { result: r.result.clone(), award: r.award },
    }
  }
}

/// Validate generator output and cut it to the requested size.
fn accept_questions(mut questions: Vec<QuestionSpec>, requested: usize) -> Result<Vec<QuestionSpec>, String> {
  if questions.is_empty() {
    return Err("the generator returned no questions".into());
  }
  questions.iter_mut().for_each(QuestionSpec::conform_answer);
  let mut seen = HashSet::new();
  for q in &questions {
    q.validate()?;
    if !seen.insert(q.id.as_str()) {
      return Err(format!("duplicate question id {}", q.id));
    }
  }
  questions.truncate(requested.max(1));
  Ok(questions)
}

/// A question as shown during the test: no answer key, no explanation.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
  pub id: String,
  #[serde(rename = "type")]
  pub kind: QuestionType,
  pub question: String,
  pub options: Vec<String>,
  pub topic: String,
  pub marks: u32,
}

impl From<&QuestionSpec> for QuestionView {
  fn from(q: &QuestionSpec) -> Self {
    Self {
      id: q.id.clone(),
      kind: q.kind,
      question: q.question.clone(),
      options: q.options.clone(),
      topic: q.topic.clone(),
      marks: q.marks,
    }
  }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum EngineView {
  ContextRequired,
  Setup {
    notice: Option<String>,
    config: TestConfig,
    /// `None` while topics are still being extracted.
    topics: Option<Vec<String>>,
  },
  Loading {
    config: TestConfig,
  },
  Test {
    index: usize,
    total: usize,
    question: QuestionView,
    answer: Option<Answer>,
    answered: usize,
    violations: u32,
  },
  Results {
    result: TestResult,
    award: Award,
  },
}
