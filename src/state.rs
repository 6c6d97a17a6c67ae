//! Application state: prompts, mock test settings and the optional gateway client.
//!
//! Everything here is read-only after startup. Per-learner state (a mock test
//! engine and its progress counters) lives in the WebSocket connection that owns it.

use tracing::{info, instrument};

use crate::config::{load_agent_config_from_env, MockTestSettings, Prompts};
use crate::gateway::Gateway;
use crate::mocktest::MockTest;

#[derive(Clone)]
pub struct AppState {
    pub gateway: Option<Gateway>,
    pub prompts: Prompts,
    pub settings: MockTestSettings,
}

impl AppState {
    /// Build state from env: load config, init the gateway client.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let cfg = load_agent_config_from_env().unwrap_or_default();

        let gateway = Gateway::from_env();
        if let Some(gw) = &gateway {
            info!(target: "upsc_backend", base_url = %gw.base_url, model = %gw.model, "AI gateway enabled.");
        } else {
            info!(target: "upsc_backend", "AI gateway disabled (no AI_GATEWAY_API_KEY). Mentor chat and question generation will fail.");
        }
        info!(
            target: "upsc_backend",
            violation_limit = cfg.mocktest.violation_limit,
            topic_excerpt_chars = cfg.mocktest.topic_excerpt_chars,
            question_excerpt_chars = cfg.mocktest.question_excerpt_chars,
            "Mock test settings"
        );

        Self::with_parts(gateway, cfg.prompts, cfg.mocktest)
    }

    pub fn with_parts(gateway: Option<Gateway>, prompts: Prompts, settings: MockTestSettings) -> Self {
        Self { gateway, prompts, settings }
    }

    /// Fresh engine for a learner's study source.
    pub fn new_mock_test(&self, source: Option<String>) -> MockTest {
        MockTest::new(source, self.settings.violation_limit)
    }
}
