//! Companion request/response surface
//!
//! Stateless operations for polling and testing outside a stream: start and
//! end a session, read its status, analyze a single frame. The same
//! operations are exposed over HTTP (`crate::http`) and as `query` messages on
//! the streaming socket. Every reply uses one envelope:
//!
//! ```json
//! {"success": true, "data": {...}}
//! {"success": false, "error": {"code": "not_found", "message": "..."}}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::engine::Engine;
use crate::error::{EngineError, Result};
use crate::pose::FramePayload;
use crate::session::{SessionId, SessionOptions, SessionOptionsOverride};

/// Uniform reply envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

/// Error body inside the envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl From<&EngineError> for ApiError {
    fn from(e: &EngineError) -> Self {
        Self {
            code: e.code().to_string(),
            message: e.to_string(),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: &EngineError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

/// Body of a start request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StartSessionRequest {
    #[serde(default)]
    pub session_id: Option<SessionId>,
    #[serde(default)]
    pub options: SessionOptionsOverride,
}

/// Reply to a start request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStarted {
    pub session_id: SessionId,
    pub start_time: i64,
    /// Effective options after merging defaults
    pub options: SessionOptions,
}

/// Body of an end request or a status query
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionRef {
    #[serde(default)]
    pub session_id: Option<SessionId>,
}

impl SessionRef {
    /// The referenced id, or a protocol error when it is missing
    pub fn require(&self) -> Result<&str> {
        self.session_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| EngineError::invalid_message("Session ID is required"))
    }
}

fn parse_params<T: serde::de::DeserializeOwned + Default>(params: Value) -> Result<T> {
    if params.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(params)
        .map_err(|e| EngineError::invalid_message(format!("Invalid params: {}", e)))
}

/// Read a frame payload, either bare or wrapped as `{"frame": ...}`
pub fn parse_frame(value: Value) -> Result<FramePayload> {
    let value = match value {
        Value::Object(mut map) if map.contains_key("frame") => {
            map.remove("frame").unwrap_or(Value::Null)
        }
        other => other,
    };
    serde_json::from_value(value)
        .map_err(|e| EngineError::invalid_message(format!("Invalid frame: {}", e)))
}

fn to_value<T: Serialize>(value: T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| EngineError::invalid_message(e.to_string()))
}

/// Answer a companion-surface query by method name
pub async fn dispatch_query(engine: &Engine, method: &str, params: Value) -> Result<Value> {
    match method {
        "start_session" => {
            let request: StartSessionRequest = parse_params(params)?;
            to_value(engine.start_session(request)?)
        }

        "end_session" => {
            let target: SessionRef = parse_params(params)?;
            to_value(engine.end_session(target.require()?)?)
        }

        "get_session_status" => {
            let target: SessionRef = parse_params(params)?;
            to_value(engine.session_status(target.require()?)?)
        }

        "analyze_frame" => {
            let frame = parse_frame(params)?;
            to_value(engine.analyze_frame(&frame).await?)
        }

        "list_sessions" => to_value(engine.registry().active_sessions()),

        "get_service_status" => to_value(engine.service_status()),

        _ => Err(EngineError::invalid_message(format!(
            "Unknown method: {}",
            method
        ))),
    }
}
