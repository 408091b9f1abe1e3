//! Error types and status mapping for repcount-engine

use std::process::ExitCode;
use thiserror::Error;

use crate::pose::EstimatorError;

/// Main error type for repcount-engine operations
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Session not found: {session_id}")]
    SessionNotFound { session_id: String },

    #[error("No active session")]
    NoActiveSession,

    #[error("Invalid message: {message}")]
    InvalidMessage { message: String },

    #[error("Invalid session options: {message}")]
    InvalidOptions { message: String },

    #[error("Pose estimator failed: {0}")]
    Estimator(#[from] EstimatorError),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Stable category string carried in wire error payloads
    pub fn code(&self) -> &'static str {
        match self {
            Self::SessionNotFound { .. } => "not_found",
            Self::NoActiveSession => "no_active_session",
            Self::InvalidMessage { .. } => "invalid_message",
            Self::InvalidOptions { .. } => "invalid_options",
            Self::Estimator(_) => "estimator_failure",
            Self::Config { .. } => "config_error",
            Self::Io(_) => "internal_error",
        }
    }

    /// HTTP-style status for the companion request/response surface
    pub fn status_code(&self) -> u16 {
        match self {
            Self::SessionNotFound { .. } => 404,
            Self::NoActiveSession | Self::InvalidMessage { .. } | Self::InvalidOptions { .. } => {
                400
            }
            Self::Estimator(_) | Self::Config { .. } | Self::Io(_) => 500,
        }
    }

    /// Process exit code for the CLI:
    /// - 1: IO error
    /// - 2: Configuration error
    /// - 3: Invalid input
    /// - 4: Estimator failure
    /// - 5: Session errors
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::Io(_) => ExitCode::from(1),
            Self::Config { .. } => ExitCode::from(2),
            Self::InvalidMessage { .. } | Self::InvalidOptions { .. } => ExitCode::from(3),
            Self::Estimator(_) => ExitCode::from(4),
            Self::SessionNotFound { .. } | Self::NoActiveSession => ExitCode::from(5),
        }
    }

    pub(crate) fn not_found(session_id: &str) -> Self {
        Self::SessionNotFound {
            session_id: session_id.to_string(),
        }
    }

    pub(crate) fn invalid_message(message: impl Into<String>) -> Self {
        Self::InvalidMessage {
            message: message.into(),
        }
    }
}

/// Result type alias for repcount-engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
