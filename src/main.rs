//! UPSC Mentor · Exam Prep Backend
//!
//! - Axum HTTP + WebSocket API
//! - Mock test engine per WebSocket connection (setup, loading, test, results)
//! - Optional AI gateway integration (via environment variables)
//! - Static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT                : u16 (default 3000)
//!   AI_GATEWAY_API_KEY  : enables the AI gateway if present
//!   AI_GATEWAY_BASE_URL : default "https://ai.gateway.lovable.dev/v1"
//!   AI_GATEWAY_MODEL    : default "google/gemini-2.5-flash"
//!   AGENT_CONFIG_PATH   : path to TOML config (prompts + mock test settings)
//!   LOG_LEVEL           : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT          : "pretty" (default) or "json"

mod telemetry;
mod util;
mod domain;
mod config;
mod seeds;
mod state;
mod protocol;
mod logic;
mod gateway;
mod mentors;
mod mcq;
mod progress;
mod mocktest;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, instrument};

use crate::routes::build_router;
use crate::state::AppState;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Shared, read-only state (gateway client, prompts, mock test settings).
  let state = Arc::new(AppState::new());

  let app = build_router(state.clone());

  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "upsc_backend", %addr, "HTTP server listening");
  axum::serve(listener, app).await?;
  Ok(())
}
