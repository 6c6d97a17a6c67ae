//! Tracing setup for the UPSC mentor backend.
//!
//! Log targets in use:
//! - `upsc_backend`: startup, config loading, HTTP handlers, WebSocket lifecycle
//! - `mocktest`: engine transitions, integrity verdicts, evaluation results
//! - `gateway`: AI gateway calls (status, token usage, latency; never payloads or keys)
//!
//! LOG_LEVEL takes an EnvFilter directive string; the default keeps our own
//! targets at debug and framework crates at info. LOG_FORMAT=json switches to
//! structured output, anything else gives the human-readable format.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,mocktest=debug,upsc_backend=debug,gateway=debug,tower_http=info,axum=info";

pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    // Two concrete subscriber types, so init in each arm.
    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => builder.json().init(),
        _ => builder.init(),
    }
}
