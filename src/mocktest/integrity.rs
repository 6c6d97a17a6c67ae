//! Focus-loss monitor for the test phase.
//!
//! A monitor is created when a test starts and dropped with the test payload,
//! so there is nothing to unsubscribe and no count survives into the next attempt.

use serde::{Deserialize, Serialize};

/// Client-reported browser events while a test is on screen.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IntegrityEvent {
  WindowBlur,
  VisibilityHidden,
  ContextMenu,
  Copy,
}

impl IntegrityEvent {
  /// Only focus loss counts; context menu and copy are merely blocked.
  pub fn is_violation(&self) -> bool {
    matches!(self, IntegrityEvent::WindowBlur | IntegrityEvent::VisibilityHidden)
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
  Suppressed,
  Warning { count: u32, limit: u32, remaining: u32 },
  Terminate { count: u32 },
}

#[derive(Clone, Debug)]
pub struct IntegrityMonitor {
  violations: u32,
  limit: u32,
}

impl IntegrityMonitor {
  /// `limit` is the violation number that ends the test (3 = two warnings, then out).
  pub fn new(limit: u32) -> Self {
    Self { violations: 0, limit: limit.max(1) }
  }

  pub fn violations(&self) -> u32 {
    self.violations
  }

  pub fn observe(&mut self, event: IntegrityEvent) -> Verdict {
    if !event.is_violation() {
      return Verdict::Suppressed;
    }
    self.violations += 1;
    if self.violations >= self.limit {
      Verdict::Terminate { count: self.violations }
    } else {
      Verdict::Warning {
        count: self.violations,
        limit: self.limit,
        remaining: self.limit - self.violations,
      }
    }
  }
}
