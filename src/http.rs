//! HTTP rendition of the companion surface
//!
//! | Method | Path | |
//! |---|---|---|
//! | GET  | `/api/health` | service status |
//! | POST | `/api/pose/analyze` | single-frame analysis, no session |
//! | POST | `/api/pose/session/start` | start a session |
//! | POST | `/api/pose/session/end` | end a session, returns the summary |
//! | GET  | `/api/pose/session/:id` | live counters |
//!
//! Bodies are read as raw bytes so malformed JSON still gets the envelope.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::api::{parse_frame, ApiResponse, SessionRef, StartSessionRequest};
use crate::engine::Engine;
use crate::error::{EngineError, Result};
use crate::pose::FrameAnalysis;

type SharedEngine = Arc<Engine>;

/// Build the companion router
pub fn router(engine: SharedEngine) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/pose/analyze", post(analyze))
        .route("/api/pose/session/start", post(start_session))
        .route("/api/pose/session/end", post(end_session))
        .route("/api/pose/session/:id", get(session_status))
        .with_state(engine)
}

/// Wraps an operation result in the envelope with a matching status code
struct Reply<T>(Result<T>);

impl<T: Serialize> IntoResponse for Reply<T> {
    fn into_response(self) -> Response {
        match self.0 {
            Ok(data) => (StatusCode::OK, Json(ApiResponse::ok(data))).into_response(),
            Err(e) => {
                let status = StatusCode::from_u16(e.status_code())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                if status.is_server_error() {
                    tracing::warn!("Request failed: {}", e);
                }
                (status, Json(ApiResponse::<()>::err(&e))).into_response()
            }
        }
    }
}

fn parse_body<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| EngineError::invalid_message(format!("Invalid request body: {}", e)))
}

async fn health(State(engine): State<SharedEngine>) -> impl IntoResponse {
    Reply(Ok(engine.service_status()))
}

async fn analyze(State(engine): State<SharedEngine>, body: Bytes) -> impl IntoResponse {
    Reply(analyze_body(&engine, &body).await)
}

async fn analyze_body(engine: &Engine, body: &[u8]) -> Result<FrameAnalysis> {
    let value = serde_json::from_slice(body)
        .map_err(|e| EngineError::invalid_message(format!("Invalid request body: {}", e)))?;
    let frame = parse_frame(value)?;
    engine.analyze_frame(&frame).await
}

async fn start_session(State(engine): State<SharedEngine>, body: Bytes) -> impl IntoResponse {
    Reply(
        parse_body::<StartSessionRequest>(&body)
            .and_then(|request| engine.start_session(request)),
    )
}

async fn end_session(State(engine): State<SharedEngine>, body: Bytes) -> impl IntoResponse {
    Reply(
        parse_body::<SessionRef>(&body)
            .and_then(|target| engine.end_session(target.require()?)),
    )
}

async fn session_status(
    State(engine): State<SharedEngine>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    Reply(engine.session_status(&id))
}
