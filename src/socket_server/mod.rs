//! Streaming server
//!
//! A WebSocket daemon that binds each client connection to one exercise
//! session and pushes per-frame analysis back to that connection.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                   REPCOUNT DAEMON (repcount-daemon)                 │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │                                                                     │
//! │  WebSocket Server ──► ConnectionState per client (sequential)       │
//! │          │                                                          │
//! │          ▼                                                          │
//! │  StreamMultiplexer   connection id ──► session id                   │
//! │          │                                                          │
//! │          ▼                                                          │
//! │  Engine ──► PoseEstimator ──► PoseFrameAnalyzer ──► SessionRegistry │
//! │                                                                     │
//! │  HTTP companion surface (axum) ──► Engine                           │
//! │                                                                     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Protocol
//!
//! All messages are JSON over WebSocket:
//!
//! ```json
//! // Client -> Server
//! {"type": "start_session", "session_id": "s1", "options": {"min_depth_angle": 85}}
//! {"type": "frame", "frame": {"kind": "landmarks", "landmarks": [...]}}
//! {"type": "end_session"}
//! {"type": "query", "id": 1, "method": "get_service_status", "params": {}}
//!
//! // Server -> Client
//! {"type": "session_started", "session_id": "s1", "start_time": 1700000000000, "options": {...}}
//! {"type": "pose_detected", "analysis": {...}, "rep_count": 3, "valid_rep_count": 3}
//! {"type": "pose_error", "code": "no_active_session", "error": "No active session"}
//! {"type": "session_ended", "summary": {...}}
//! {"type": "response", "id": 1, "result": {...}}
//! ```

pub mod connection;
pub mod multiplexer;
pub mod protocol;

use std::sync::Arc;

use tokio::net::TcpListener;

use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::error::Result;

pub use connection::handle_connection;
pub use multiplexer::{ConnectionId, StreamMultiplexer};
pub use protocol::{ClientMessage, ServerMessage};

/// Accept WebSocket connections until the listener fails permanently
pub async fn serve(listener: TcpListener, mux: Arc<StreamMultiplexer>) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                tracing::debug!("Accepted connection from {}", addr);
                let mux = Arc::clone(&mux);
                tokio::spawn(async move {
                    handle_connection(stream, mux).await;
                });
            }
            Err(e) => {
                tracing::error!("Failed to accept connection: {}", e);
            }
        }
    }
}

/// Bind the streaming listener (and the HTTP surface unless disabled) and
/// run until Ctrl-C.
pub async fn run(config: &EngineConfig) -> Result<()> {
    let engine = Arc::new(Engine::from_config(config));
    let mux = Arc::new(StreamMultiplexer::new(Arc::clone(&engine)));

    let stream_addr = config.server.stream_addr()?;
    let listener = TcpListener::bind(stream_addr).await?;
    tracing::info!(
        "repcount daemon v{} listening on ws://{} (estimator: {})",
        env!("CARGO_PKG_VERSION"),
        listener.local_addr()?,
        engine.estimator_name()
    );

    let http = match config.server.http_addr()? {
        Some(addr) => {
            let http_listener = TcpListener::bind(addr).await?;
            tracing::info!("Companion HTTP surface on http://{}", http_listener.local_addr()?);
            let app = crate::http::router(Arc::clone(&engine));
            Some(tokio::spawn(async move {
                if let Err(e) = axum::serve(http_listener, app).await {
                    tracing::error!("HTTP server stopped: {}", e);
                }
            }))
        }
        None => {
            tracing::info!("Companion HTTP surface disabled");
            None
        }
    };

    tokio::select! {
        _ = serve(listener, mux) => {}
        result = tokio::signal::ctrl_c() => {
            result?;
            tracing::info!("Shutting down");
        }
    }

    if let Some(handle) = http {
        handle.abort();
    }
    Ok(())
}
