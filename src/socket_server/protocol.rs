//! Streaming protocol message types
//!
//! Defines the JSON message format for client-server communication.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::pose::{FrameAnalysis, FramePayload};
use crate::session::{SessionId, SessionOptions, SessionOptionsOverride, SessionSummary};

/// Client-to-server message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Start (or restart) a session and bind it to this connection
    StartSession {
        #[serde(default)]
        session_id: Option<SessionId>,
        #[serde(default)]
        options: SessionOptionsOverride,
    },
    /// One camera frame for the bound session
    Frame { frame: FramePayload },
    /// End the bound session
    EndSession,
    /// Companion-surface query
    Query {
        id: u64,
        method: String,
        #[serde(default)]
        params: serde_json::Value,
    },
    /// Ping to check connection
    Ping,
}

/// Server-to-client message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Session created and bound to the connection
    SessionStarted {
        session_id: SessionId,
        start_time: i64,
        options: SessionOptions,
    },
    /// Analysis of one frame plus the session's live counters
    PoseDetected {
        analysis: FrameAnalysis,
        rep_count: u32,
        valid_rep_count: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rep_completed: Option<u32>,
    },
    /// A frame could not be processed; the session is unchanged
    PoseError { code: String, error: String },
    /// Final summary of an ended session
    SessionEnded { summary: SessionSummary },
    /// Query response
    Response {
        id: u64,
        result: serde_json::Value,
    },
    /// Error response
    Error {
        id: Option<u64>,
        code: String,
        message: String,
        /// HTTP-style status of the same failure on the companion surface
        status: u16,
    },
    /// Pong response
    Pong,
}

impl ServerMessage {
    pub fn pose_error(error: &EngineError) -> Self {
        Self::PoseError {
            code: error.code().to_string(),
            error: error.to_string(),
        }
    }

    pub fn error(id: Option<u64>, error: &EngineError) -> Self {
        Self::Error {
            id,
            code: error.code().to_string(),
            message: error.to_string(),
            status: error.status_code(),
        }
    }
}
