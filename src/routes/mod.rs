//! Router assembly: HTTP endpoints, mock test WebSocket, static files, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;
pub mod ws;

/// Build the application router with:
/// - Mock test WebSocket at `/ws/mocktest`
/// - REST-ish API under `/api/v1/...`
/// - Static SPA from `./static` with index fallback
/// - CORS (allow any origin/method/headers), matching the old serverless functions
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    // Static files with SPA fallback
    let static_service = ServeDir::new("./static")
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new("./static/index.html"));

    Router::new()
        // WebSocket
        .route("/ws/mocktest", get(ws::ws_upgrade))
        // HTTP API
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/mentors", get(http::http_get_mentors))
        .route("/api/v1/mentor/:mentor/chat", post(http::http_post_mentor_chat))
        .route("/api/v1/quests", get(http::http_get_quests))
        .route("/api/v1/mcq/check", post(http::http_post_mcq_check))
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Frontend fallback
        .fallback_service(static_service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::config::{MockTestSettings, Prompts};

    fn app() -> Router {
        let state = AppState::with_parts(None, Prompts::default(), MockTestSettings::default());
        build_router(Arc::new(state))
    }

    async fn json_body(resp: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.expect("body");
        serde_json::from_slice(&bytes).expect("json")
    }

    #[tokio::test]
    async fn health_reports_gateway_state() {
        let resp = app()
            .oneshot(Request::get("/api/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(body["ok"], true);
        assert_eq!(body["gateway"], false);
    }

    #[tokio::test]
    async fn quests_include_summary() {
        let resp = app()
            .oneshot(Request::get("/api/v1/quests").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = json_body(resp).await;
        assert_eq!(body["completed"], 1);
        assert_eq!(body["totalXp"], 850);
        assert_eq!(body["quests"].as_array().map(|a| a.len()), Some(5));
    }

    #[tokio::test]
    async fn unknown_mentor_is_404_and_missing_gateway_is_503() {
        let chat = r#"{"messages":[{"role":"user","content":"Explain Article 21"}]}"#;

        let resp = app()
            .oneshot(
                Request::post("/api/v1/mentor/chemistry/chat")
                    .header("content-type", "application/json")
                    .body(Body::from(chat))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = app()
            .oneshot(
                Request::post("/api/v1/mentor/polity/chat")
                    .header("content-type", "application/json")
                    .body(Body::from(chat))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(json_body(resp).await["error"].is_string());
    }

    #[tokio::test]
    async fn standalone_mcq_check() {
        let body = r#"{"mcq":{"question":"Q","options":["a","b"],"correct":1,"explanation":"e"},"selected":1}"#;
        let resp = app()
            .oneshot(
                Request::post("/api/v1/mcq/check")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let v = json_body(resp).await;
        assert_eq!(v["isCorrect"], true);
        assert_eq!(v["explanation"], "e");
    }

    #[tokio::test]
    async fn mcq_check_with_out_of_range_key_is_400() {
        let body = r#"{"mcq":{"question":"Q","options":["a","b"],"correct":99},"selected":0}"#;
        let resp = app()
            .oneshot(
                Request::post("/api/v1/mcq/check")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(resp).await["error"].as_str().unwrap_or_default().contains("out of range"));
    }
}
