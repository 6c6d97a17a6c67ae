//! WebSocket upgrade + mock test loop. Each connection owns one engine and the
//! learner's progress. Gateway calls run on spawned tasks and report back
//! through a channel, so the socket keeps serving messages (and integrity
//! events) while topics or questions are being produced.

use std::sync::Arc;
use std::time::Instant;

use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::domain::QuestionSpec;
use crate::logic::{extract_topics, generate_questions};
use crate::mocktest::{Advance, IntegrityOutcome, MockTest, MockTestError, TopicList};
use crate::progress::Progress;
use crate::protocol::{ClientWsMessage, Direction, ServerWsMessage};
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "upsc_backend", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

/// Work finished off the socket task. `epoch` ties it to the engine that asked for it.
#[derive(Debug)]
enum Completion {
  Topics { epoch: u64, topics: Vec<String> },
  Questions { epoch: u64, outcome: Result<Vec<QuestionSpec>, String> },
}

struct Connection {
  engine: MockTest,
  progress: Progress,
  /// Bumped on every `init`; completions from older engines are dropped.
  epoch: u64,
}

impl Connection {
  fn new(state: &AppState) -> Self {
    Self { engine: state.new_mock_test(None), progress: Progress::default(), epoch: 0 }
  }

  fn snapshot(&self) -> ServerWsMessage {
    ServerWsMessage::Snapshot { view: self.engine.view(), progress: self.progress }
  }

  fn results(&self) -> Option<ServerWsMessage> {
    self.engine.report().map(|r| ServerWsMessage::Results {
      result: r.result.clone(),
      award: r.award,
      progress: self.progress,
    })
  }

  /// Results followed by the new snapshot, used whenever a test just ended.
  fn concluded(&self) -> Vec<ServerWsMessage> {
    self.results().into_iter().chain(std::iter::once(self.snapshot())).collect()
  }
}

#[instrument(level = "info", skip(socket, state), fields(conn = %Uuid::new_v4()))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "upsc_backend", "WebSocket connected");
  let (tx, mut rx) = mpsc::unbounded_channel::<Completion>();
  let mut conn = Connection::new(&state);

  loop {
    let replies = tokio::select! {
      incoming = socket.recv() => match incoming {
        Some(Ok(Message::Text(txt))) => match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(msg) => {
            debug!(target: "upsc_backend", "WS received: {:?}", &msg);
            let replies = handle_client_ws(msg, &mut conn, &state, &tx);
            debug!(target: "mocktest", phase = conn.engine.phase().name(), replies = replies.len(), "WS message handled");
            replies
          }
          Err(e) => vec![ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) }],
        },
        Some(Ok(Message::Ping(payload))) => {
          let _ = socket.send(Message::Pong(payload)).await;
          continue;
        }
        Some(Ok(Message::Close(_))) | None => break,
        Some(Err(e)) => {
          warn!(target: "upsc_backend", error = %e, "WS receive error");
          break;
        }
        Some(Ok(_)) => continue,
      },
      Some(done) = rx.recv() => handle_completion(done, &mut conn),
    };

    if send_all(&mut socket, replies).await.is_err() {
      break;
    }
  }
  info!(target: "upsc_backend", "WebSocket disconnected");
}

async fn send_all(socket: &mut WebSocket, replies: Vec<ServerWsMessage>) -> Result<(), axum::Error> {
  for reply in replies {
    let out = serde_json::to_string(&reply).unwrap_or_else(|e| {
      serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
    });
    if let Err(e) = socket.send(Message::Text(out)).await {
      error!(target: "upsc_backend", error = %e, "WS send error");
      return Err(e);
    }
  }
  Ok(())
}

fn engine_error(e: MockTestError) -> Vec<ServerWsMessage> {
  debug!(target: "mocktest", error = %e, "Rejected engine action");
  vec![ServerWsMessage::Error { message: e.to_string() }]
}

/// Snapshot on success, error message otherwise.
fn after<T>(res: Result<T, MockTestError>, conn: &Connection) -> Vec<ServerWsMessage> {
  match res {
    Ok(_) => vec![conn.snapshot()],
    Err(e) => engine_error(e),
  }
}

fn handle_client_ws(
  msg: ClientWsMessage,
  conn: &mut Connection,
  state: &Arc<AppState>,
  tx: &mpsc::UnboundedSender<Completion>,
) -> Vec<ServerWsMessage> {
  match msg {
    ClientWsMessage::Ping => vec![ServerWsMessage::Pong],

    ClientWsMessage::Init { source_text, xp, level } => {
      conn.epoch += 1;
      conn.engine = state.new_mock_test(source_text);
      conn.progress = Progress::new(xp, level);
      info!(target: "mocktest", context = conn.engine.has_context(), xp, level, "Mock test initialised");

      if let Some(source) = conn.engine.source().map(str::to_owned) {
        let (state, tx, epoch) = (state.clone(), tx.clone(), conn.epoch);
        tokio::spawn(async move {
          let topics = extract_topics(&state, &source).await;
          let _ = tx.send(Completion::Topics { epoch, topics });
        });
      }
      vec![conn.snapshot()]
    }

    ClientWsMessage::SetDifficulty { difficulty } => {
      let res = conn.engine.set_difficulty(difficulty);
      after(res, conn)
    }

    ClientWsMessage::ToggleTopic { topic } => {
      let res = conn.engine.toggle_topic(&topic);
      after(res, conn)
    }

    ClientWsMessage::SetQuestionCount { count } => {
      let res = conn.engine.set_question_count(count);
      after(res, conn)
    }

    ClientWsMessage::Start => match conn.engine.begin_generation() {
      Ok(req) => {
        let topics_ready = matches!(conn.engine.topics(), TopicList::Ready(_));
        info!(target: "mocktest", count = conn.engine.config().total_questions, topics_ready, "Spawning question generation");
        let (state, tx, epoch) = (state.clone(), tx.clone(), conn.epoch);
        tokio::spawn(async move {
          let outcome = generate_questions(&state, &req).await;
          let _ = tx.send(Completion::Questions { epoch, outcome });
        });
        vec![conn.snapshot()]
      }
      Err(e) => engine_error(e),
    },

    ClientWsMessage::Answer { answer } => {
      let res = conn.engine.answer(answer);
      after(res, conn)
    }

    ClientWsMessage::ToggleOption { option } => {
      let res = conn.engine.toggle_option(option);
      after(res, conn)
    }

    ClientWsMessage::Navigate { direction, index } => {
      let res = match (index, direction) {
        (Some(i), _) => conn.engine.go_to(i).map(Advance::Moved),
        (None, Some(Direction::Previous)) => conn.engine.previous().map(Advance::Moved),
        (None, Some(Direction::Next)) => conn.engine.next().map(Advance::Moved),
        (None, Some(Direction::Advance)) => conn.engine.advance(&mut conn.progress, Instant::now()),
        (None, None) => return vec![ServerWsMessage::Error { message: "navigate needs a direction or an index".into() }],
      };
      match res {
        Ok(Advance::Finished) => conn.concluded(),
        Ok(Advance::Moved(_)) => {
          debug!(target: "mocktest", index = ?conn.engine.current_index(), "Moved");
          vec![conn.snapshot()]
        }
        Err(e) => engine_error(e),
      }
    }

    ClientWsMessage::Integrity { event } => {
      match conn.engine.report_integrity(event, &mut conn.progress, Instant::now()) {
        Ok(IntegrityOutcome::Ignored) | Ok(IntegrityOutcome::Suppressed) => Vec::new(),
        Ok(IntegrityOutcome::Warning { count, limit, remaining }) => vec![
          ServerWsMessage::Warning {
            message: format!(
              "ANTI-CHEAT WARNING ({}/{}): Window focus lost. The test ends automatically at {} violations.",
              count, limit, limit
            ),
            count,
            limit,
            remaining,
          },
          conn.snapshot(),
        ],
        Ok(IntegrityOutcome::Terminated) => conn.concluded(),
        Err(e) => engine_error(e),
      }
    }

    ClientWsMessage::Finish => match conn.engine.finish(&mut conn.progress, Instant::now()) {
      Ok(_) => conn.concluded(),
      Err(e) => engine_error(e),
    },

    ClientWsMessage::Restart => {
      let res = conn.engine.restart();
      after(res, conn)
    }

    ClientWsMessage::ReviewSelect { index, option } => match conn.engine.review_select(index, option) {
      Ok(card) => vec![ServerWsMessage::ReviewCard { index, card }],
      Err(e) => engine_error(e),
    },
  }
}

fn handle_completion(done: Completion, conn: &mut Connection) -> Vec<ServerWsMessage> {
  match done {
    Completion::Topics { epoch, topics } => {
      if epoch != conn.epoch {
        debug!(target: "mocktest", epoch, "Dropping topics for a replaced engine");
        return Vec::new();
      }
      info!(target: "mocktest", count = topics.len(), "Topics ready");
      conn.engine.set_topics(topics.clone());
      vec![ServerWsMessage::Topics { topics }, conn.snapshot()]
    }
    Completion::Questions { epoch, outcome } => {
      if epoch != conn.epoch {
        debug!(target: "mocktest", epoch, "Dropping questions for a replaced engine");
        return Vec::new();
      }
      let res = conn.engine.complete_generation(outcome, Instant::now());
      after(res, conn)
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::{MockTestSettings, Prompts};
  use crate::domain::{Answer, QuestionType};
  use crate::mocktest::integrity::IntegrityEvent;
  use crate::mocktest::EngineView;

  fn setup() -> (Arc<AppState>, Connection, mpsc::UnboundedSender<Completion>, mpsc::UnboundedReceiver<Completion>) {
    let state = Arc::new(AppState::with_parts(None, Prompts::default(), MockTestSettings::default()));
    let conn = Connection::new(&state);
    let (tx, rx) = mpsc::unbounded_channel();
    (state, conn, tx, rx)
  }

  fn question(id: &str) -> QuestionSpec {
    QuestionSpec {
      id: id.into(),
      kind: QuestionType::SingleCorrect,
      question: format!("Question {}", id),
      options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
      correct_answer: Answer::Single(0),
      explanation: "Because.".into(),
      topic: "Polity".into(),
      marks: 2,
    }
  }

  fn init(conn: &mut Connection, state: &Arc<AppState>, tx: &mpsc::UnboundedSender<Completion>) {
    let msg = ClientWsMessage::Init { source_text: Some("Fundamental rights notes".into()), xp: 90, level: 1 };
    handle_client_ws(msg, conn, state, tx);
  }

  #[tokio::test]
  async fn actions_before_init_need_context() {
    let (state, mut conn, tx, _rx) = setup();
    let out = handle_client_ws(ClientWsMessage::Start, &mut conn, &state, &tx);
    assert!(matches!(&out[..], [ServerWsMessage::Error { .. }]));
  }

  #[tokio::test]
  async fn init_extracts_topics_in_background() {
    let (state, mut conn, tx, mut rx) = setup();
    init(&mut conn, &state, &tx);

    // No gateway configured: extraction degrades to an empty list.
    let done = rx.recv().await.expect("completion");
    let out = handle_completion(done, &mut conn);
    assert!(matches!(&out[0], ServerWsMessage::Topics { topics } if topics.is_empty()));
    assert!(matches!(&out[1], ServerWsMessage::Snapshot { view: EngineView::Setup { topics: Some(_), .. }, .. }));
  }

  #[tokio::test]
  async fn failed_generation_returns_to_setup_with_notice() {
    let (state, mut conn, tx, mut rx) = setup();
    init(&mut conn, &state, &tx);
    let _topics = rx.recv().await.expect("topics");

    let out = handle_client_ws(ClientWsMessage::Start, &mut conn, &state, &tx);
    assert!(matches!(&out[0], ServerWsMessage::Snapshot { view: EngineView::Loading { .. }, .. }));

    let again = handle_client_ws(ClientWsMessage::Start, &mut conn, &state, &tx);
    assert!(matches!(&again[..], [ServerWsMessage::Error { .. }]));

    let done = rx.recv().await.expect("questions");
    let out = handle_completion(done, &mut conn);
    assert!(matches!(&out[0], ServerWsMessage::Snapshot { view: EngineView::Setup { notice: Some(_), .. }, .. }));
  }

  #[tokio::test]
  async fn stale_completions_are_dropped() {
    let (state, mut conn, tx, _rx) = setup();
    init(&mut conn, &state, &tx);
    let stale = Completion::Topics { epoch: conn.epoch - 1, topics: vec!["Old".into()] };
    assert!(handle_completion(stale, &mut conn).is_empty());
  }

  #[tokio::test]
  async fn third_violation_ends_test_with_results() {
    let (state, mut conn, tx, _rx) = setup();
    init(&mut conn, &state, &tx);
    handle_client_ws(ClientWsMessage::Start, &mut conn, &state, &tx);
    let questions: Vec<_> = (1..=5).map(|i| question(&i.to_string())).collect();
    handle_completion(Completion::Questions { epoch: conn.epoch, outcome: Ok(questions) }, &mut conn);

    handle_client_ws(ClientWsMessage::Answer { answer: Answer::Single(0) }, &mut conn, &state, &tx);

    let blur = || ClientWsMessage::Integrity { event: IntegrityEvent::WindowBlur };
    let out = handle_client_ws(blur(), &mut conn, &state, &tx);
    assert!(matches!(&out[0], ServerWsMessage::Warning { count: 1, limit: 3, remaining: 2, .. }));
    let out = handle_client_ws(ClientWsMessage::Integrity { event: IntegrityEvent::Copy }, &mut conn, &state, &tx);
    assert!(out.is_empty());
    handle_client_ws(blur(), &mut conn, &state, &tx);
    let out = handle_client_ws(blur(), &mut conn, &state, &tx);

    match &out[0] {
      ServerWsMessage::Results { result, award, progress } => {
        assert!(result.terminated);
        assert_eq!(result.violations, 3);
        assert_eq!(result.score, 2);
        assert_eq!(award.xp_gained, 10);
        assert_eq!(progress.xp, 0);
      }
      other => panic!("expected results, got {:?}", other),
    }

    // Events after the test are ignored.
    assert!(handle_client_ws(blur(), &mut conn, &state, &tx).is_empty());
  }

  #[tokio::test]
  async fn advance_on_last_question_submits() {
    let (state, mut conn, tx, _rx) = setup();
    init(&mut conn, &state, &tx);
    handle_client_ws(ClientWsMessage::Start, &mut conn, &state, &tx);
    let questions: Vec<_> = (1..=5).map(|i| question(&i.to_string())).collect();
    handle_completion(Completion::Questions { epoch: conn.epoch, outcome: Ok(questions) }, &mut conn);

    let nav = ClientWsMessage::Navigate { direction: None, index: Some(4) };
    handle_client_ws(nav, &mut conn, &state, &tx);
    let adv = ClientWsMessage::Navigate { direction: Some(Direction::Advance), index: None };
    let out = handle_client_ws(adv, &mut conn, &state, &tx);
    assert!(matches!(&out[0], ServerWsMessage::Results { .. }));
    assert!(matches!(&out[1], ServerWsMessage::Snapshot { view: EngineView::Results { .. }, .. }));

    let out = handle_client_ws(ClientWsMessage::ReviewSelect { index: 0, option: 1 }, &mut conn, &state, &tx);
    assert!(matches!(&out[0], ServerWsMessage::ReviewCard { index: 0, card } if card.is_correct == Some(false)));
  }
}
