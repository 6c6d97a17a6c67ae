//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and log include parameters and basic result info.

use std::sync::Arc;
use axum::{extract::{Path, State}, http::StatusCode, Json, response::IntoResponse};
use tracing::{info, error, instrument};

use crate::gateway::GatewayError;
use crate::logic::{check_mcq, mentor_chat};
use crate::mentors::{MentorId, MENTORS};
use crate::protocol::*;
use crate::seeds::{daily_quests, quest_summary};
use crate::state::AppState;

type ApiError = (StatusCode, Json<ErrorOut>);

fn api_error(status: StatusCode, msg: impl Into<String>) -> ApiError {
  (status, Json(ErrorOut { error: msg.into() }))
}

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(HealthOut { ok: true, gateway: state.gateway.is_some() })
}

#[instrument(level = "info")]
pub async fn http_get_mentors() -> impl IntoResponse {
  Json(MentorsOut { mentors: MENTORS.to_vec() })
}

#[instrument(level = "info", skip(state, body), fields(%mentor, turns = body.messages.len()))]
pub async fn http_post_mentor_chat(
  State(state): State<Arc<AppState>>,
  Path(mentor): Path<String>,
  Json(body): Json<MentorChatIn>,
) -> Result<Json<MentorChatOut>, ApiError> {
  let id = MentorId::parse(&mentor)
    .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("Unknown mentor: {}", mentor)))?;

  match mentor_chat(&state, id, body.messages).await {
    Ok(content) => {
      info!(target: "upsc_backend", mentor = id.as_str(), reply_len = content.len(), "Successfully generated response");
      Ok(Json(MentorChatOut { content }))
    }
    Err(e) => {
      error!(target: "upsc_backend", mentor = id.as_str(), error = %e, "Mentor chat failed");
      Err(match e {
        GatewayError::NotConfigured => api_error(StatusCode::SERVICE_UNAVAILABLE, e.to_string()),
        GatewayError::Http { status: 429, .. } =>
          api_error(StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded. Please try again later."),
        GatewayError::Http { status: 402, .. } =>
          api_error(StatusCode::PAYMENT_REQUIRED, "Service credits exhausted. Please try again later."),
        other => api_error(StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
      })
    }
  }
}

#[instrument(level = "info")]
pub async fn http_get_quests() -> impl IntoResponse {
  let quests = daily_quests();
  let (completed, total_xp) = quest_summary(&quests);
  Json(QuestsOut { quests, completed, total_xp })
}

#[instrument(level = "info", skip(body), fields(selected = body.selected))]
pub async fn http_post_mcq_check(Json(body): Json<McqCheckIn>) -> Result<Json<crate::mcq::CardView>, ApiError> {
  check_mcq(body.mcq, body.selected)
    .map(Json)
    .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))
}
