//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::{Answer, Difficulty};
use crate::gateway::ChatMessage;
use crate::mcq::{CardView, Mcq};
use crate::mentors::MentorInfo;
use crate::mocktest::integrity::IntegrityEvent;
use crate::mocktest::scoring::TestResult;
use crate::mocktest::EngineView;
use crate::progress::{Award, Progress};
use crate::seeds::Quest;

/// Messages the client can send over the mock test WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    Init {
        #[serde(rename = "sourceText", default)]
        source_text: Option<String>,
        #[serde(default)]
        xp: u32,
        #[serde(default)]
        level: u32,
    },
    SetDifficulty {
        difficulty: Difficulty,
    },
    ToggleTopic {
        topic: String,
    },
    SetQuestionCount {
        count: u32,
    },
    Start,
    Answer {
        answer: Answer,
    },
    ToggleOption {
        option: usize,
    },
    /// Either `direction` or `index`; `index` wins when both are present.
    Navigate {
        #[serde(default)]
        direction: Option<Direction>,
        #[serde(default)]
        index: Option<usize>,
    },
    Integrity {
        event: IntegrityEvent,
    },
    Finish,
    Restart,
    ReviewSelect {
        index: usize,
        option: usize,
    },
}

#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Previous,
    Next,
    /// Like `Next`, but submits the test on the last question.
    Advance,
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Snapshot {
        view: EngineView,
        progress: Progress,
    },
    Topics {
        topics: Vec<String>,
    },
    Warning {
        message: String,
        count: u32,
        limit: u32,
        remaining: u32,
    },
    Results {
        result: TestResult,
        award: Award,
        progress: Progress,
    },
    ReviewCard {
        index: usize,
        card: CardView,
    },
    Error {
        message: String,
    },
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct MentorChatIn {
    pub messages: Vec<ChatMessage>,
}
#[derive(Serialize)]
pub struct MentorChatOut {
    pub content: String,
}

#[derive(Serialize)]
pub struct ErrorOut {
    pub error: String,
}

#[derive(Serialize)]
pub struct MentorsOut {
    pub mentors: Vec<MentorInfo>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestsOut {
    pub quests: Vec<Quest>,
    pub completed: usize,
    pub total_xp: u32,
}

#[derive(Debug, Deserialize)]
pub struct McqCheckIn {
    pub mcq: Mcq,
    pub selected: usize,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
    pub gateway: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_navigation_by_direction_and_index() {
        let m: ClientWsMessage = serde_json::from_str(r#"{"type":"navigate","direction":"next"}"#).unwrap();
        assert!(matches!(m, ClientWsMessage::Navigate { direction: Some(Direction::Next), index: None }));
        let m: ClientWsMessage = serde_json::from_str(r#"{"type":"navigate","index":4}"#).unwrap();
        assert!(matches!(m, ClientWsMessage::Navigate { direction: None, index: Some(4) }));
    }

    #[test]
    fn parses_single_and_multi_answers() {
        let m: ClientWsMessage = serde_json::from_str(r#"{"type":"answer","answer":[0,2]}"#).unwrap();
        assert!(matches!(m, ClientWsMessage::Answer { answer: Answer::Multiple(_) }));
        let m: ClientWsMessage = serde_json::from_str(r#"{"type":"answer","answer":1}"#).unwrap();
        assert!(matches!(m, ClientWsMessage::Answer { answer: Answer::Single(1) }));
    }

    #[test]
    fn parses_init_and_integrity() {
        let m: ClientWsMessage =
            serde_json::from_str(r#"{"type":"init","sourceText":"Polity notes","xp":40,"level":2}"#).unwrap();
        assert!(matches!(m, ClientWsMessage::Init { xp: 40, level: 2, .. }));
        let m: ClientWsMessage = serde_json::from_str(r#"{"type":"integrity","event":"visibility_hidden"}"#).unwrap();
        assert!(matches!(m, ClientWsMessage::Integrity { event: IntegrityEvent::VisibilityHidden }));
    }
}
