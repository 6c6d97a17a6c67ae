//! Built-in content that doesn't depend on the gateway: the daily quest board.

use serde::Serialize;

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QuestStatus {
  Pending,
  InProgress,
  Completed,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quest {
  pub title: &'static str,
  pub description: &'static str,
  pub xp_reward: u32,
  pub status: QuestStatus,
  pub category: &'static str,
}

pub fn daily_quests() -> Vec<Quest> {
  vec![
    Quest {
      title: "Complete NCERT Reading",
      description: "Read Chapter 5 of Class 11 History NCERT - Understanding Ancient Civilizations",
      xp_reward: 150,
      status: QuestStatus::InProgress,
      category: "GS Paper I",
    },
    Quest {
      title: "Practice Answer Writing",
      description: "Write a 250-word answer on the topic: Role of Women in Indian Freedom Struggle",
      xp_reward: 200,
      status: QuestStatus::Pending,
      category: "Mains Practice",
    },
    Quest {
      title: "Current Affairs Review",
      description: "Study today's important news and make notes on relevant UPSC topics",
      xp_reward: 100,
      status: QuestStatus::Completed,
      category: "Current Affairs",
    },
    Quest {
      title: "Polity MCQ Practice",
      description: "Solve 25 MCQs from Laxmikanth - Parliament Chapter",
      xp_reward: 175,
      status: QuestStatus::Pending,
      category: "Prelims",
    },
    Quest {
      title: "Ethics Case Study",
      description: "Analyze and write on: Ethical dilemmas faced by civil servants in rural postings",
      xp_reward: 225,
      status: QuestStatus::Pending,
      category: "GS Paper IV",
    },
  ]
}

/// (completed, total xp on offer)
pub fn quest_summary(quests: &[Quest]) -> (usize, u32) {
  let completed = quests.iter().filter(|q| q.status == QuestStatus::Completed).count();
  let total_xp = quests.iter().map(|q| q.xp_reward).sum();
  (completed, total_xp)
}
