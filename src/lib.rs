//! repcount-engine: real-time push-up repetition counting
//!
//! Turns a stream of pose observations into per-frame form analysis and a
//! per-session repetition count.
//!
//! # Pipeline
//!
//! ```text
//! frame ─► PoseEstimator ─► PoseFrameAnalyzer ─► SessionRegistry ─► reply
//!            (landmarks)      (angles, phase,      (rep counter,
//!                              alignment,           live counters,
//!                              feedback)            summary)
//! ```
//!
//! - [`pose`] - landmark geometry, frame analysis and the estimator seam
//! - [`session`] - session state, the rep transition rule and the registry
//! - [`engine`] - the shared context tying the pipeline together
//! - [`socket_server`] - WebSocket streaming with connection/session binding
//! - [`api`] / [`http`] - the stateless companion surface
//!
//! # Example
//!
//! ```
//! use repcount_engine::pose::{pushup_pose, PhaseThresholds, PoseFrameAnalyzer};
//! use repcount_engine::session::{SessionOptionsOverride, SessionRegistry};
//!
//! let registry = SessionRegistry::new();
//! registry.start("demo", &SessionOptionsOverride::default()).unwrap();
//!
//! let analyzer = PoseFrameAnalyzer::default();
//! for angle in [170.0, 70.0, 170.0] {
//!     let pose = pushup_pose(angle, angle, 0.0);
//!     let analysis = analyzer.analyze(Some(&pose), PhaseThresholds::default());
//!     registry.update("demo", &analysis).unwrap();
//! }
//!
//! let summary = registry.end("demo").unwrap();
//! assert_eq!(summary.total_reps, 1);
//! ```

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod http;
pub mod logging;
pub mod pose;
pub mod session;
pub mod socket_server;

// Re-export commonly used types
pub use api::{ApiError, ApiResponse, SessionStarted, StartSessionRequest};
pub use config::EngineConfig;
pub use engine::{Engine, ProcessedFrame, ServiceStatus};
pub use error::{EngineError, Result};
pub use pose::{
    FrameAnalysis, FramePayload, Landmark, Phase, PhaseThresholds, PoseEstimator,
    PoseFrameAnalyzer, PoseObservation,
};
pub use session::{
    SessionId, SessionOptions, SessionOptionsOverride, SessionRegistry, SessionStatus,
    SessionSummary,
};
pub use socket_server::{ClientMessage, ServerMessage, StreamMultiplexer};
