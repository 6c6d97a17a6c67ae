//! Experience points and level shown in the XP bar.
//!
//! XP lives in `0..XP_PER_LEVEL` and wraps; overflow past the wrap is discarded
//! rather than carried into `level`. Level only moves on an excellent test.

use serde::{Deserialize, Serialize};

pub const XP_PER_LEVEL: u32 = 100;
/// Percentage strictly above this earns a level.
pub const EXCELLENCE_THRESHOLD: f64 = 80.0;

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Progress {
  pub xp: u32,
  pub level: u32,
}

/// What a single evaluation added.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Award {
  pub xp_gained: u32,
  pub level_up: bool,
}

impl Progress {
  pub fn new(xp: u32, level: u32) -> Self {
    Self { xp: xp % XP_PER_LEVEL, level }
  }

  /// Apply the reward for a finished test scored at `percentage`.
  pub fn apply_test_reward(&mut self, percentage: f64) -> Award {
    let xp_gained = if percentage.is_finite() && percentage > 0.0 {
      (percentage / 2.0).floor() as u32
    } else {
      0
    };
    self.xp = (self.xp + xp_gained) % XP_PER_LEVEL;
    let level_up = percentage > EXCELLENCE_THRESHOLD;
    if level_up {
      self.level = self.level.saturating_add(1);
    }
    Award { xp_gained, level_up }
  }
}
