//! Connection to session routing
//!
//! Each connection owns at most one session at a time, and each session is
//! owned by at most one connection. Results are only ever returned to the
//! connection that sent the message.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::api::{dispatch_query, StartSessionRequest};
use crate::engine::Engine;
use crate::error::EngineError;
use crate::pose::analyzer::now_millis;
use crate::pose::FramePayload;
use crate::session::{SessionId, SessionOptionsOverride};
use crate::socket_server::protocol::{ClientMessage, ServerMessage};

/// Identity of one client connection
pub type ConnectionId = String;

pub struct StreamMultiplexer {
    engine: Arc<Engine>,
    bindings: RwLock<HashMap<ConnectionId, SessionId>>,
}

impl StreamMultiplexer {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self {
            engine,
            bindings: RwLock::new(HashMap::new()),
        }
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    /// Session currently bound to a connection
    pub fn session_for(&self, conn: &str) -> Option<SessionId> {
        self.bindings.read().get(conn).cloned()
    }

    /// Number of connections with a bound session
    pub fn bound_connections(&self) -> usize {
        self.bindings.read().len()
    }

    /// Handle one inbound message and produce the reply for the same connection
    pub async fn handle(&self, conn: &str, msg: ClientMessage) -> ServerMessage {
        match msg {
            ClientMessage::StartSession {
                session_id,
                options,
            } => self.start(conn, session_id, options),

            ClientMessage::Frame { frame } => self.frame(conn, &frame).await,

            ClientMessage::EndSession => self.end(conn),

            ClientMessage::Query { id, method, params } => {
                match dispatch_query(&self.engine, &method, params).await {
                    Ok(result) => ServerMessage::Response { id, result },
                    Err(e) => ServerMessage::error(Some(id), &e),
                }
            }

            ClientMessage::Ping => ServerMessage::Pong,
        }
    }

    fn start(
        &self,
        conn: &str,
        session_id: Option<SessionId>,
        options: SessionOptionsOverride,
    ) -> ServerMessage {
        let session_id = session_id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| format!("session_{}_{}", now_millis(), conn));

        let started = match self.engine.start_session(StartSessionRequest {
            session_id: Some(session_id),
            options,
        }) {
            Ok(started) => started,
            Err(e) => return ServerMessage::error(None, &e),
        };

        let previous = {
            let mut bindings = self.bindings.write();
            bindings.retain(|other, bound| {
                let stolen = other != conn && *bound == started.session_id;
                if stolen {
                    tracing::info!(
                        "Session {} moved from {} to {}",
                        started.session_id,
                        other,
                        conn
                    );
                }
                !stolen
            });
            bindings.insert(conn.to_string(), started.session_id.clone())
        };

        if let Some(previous) = previous.filter(|p| *p != started.session_id) {
            if self.engine.registry().cleanup(&previous) {
                tracing::info!("Connection {} replaced session {}", conn, previous);
            }
        }

        ServerMessage::SessionStarted {
            session_id: started.session_id,
            start_time: started.start_time,
            options: started.options,
        }
    }

    async fn frame(&self, conn: &str, frame: &FramePayload) -> ServerMessage {
        let Some(session_id) = self.session_for(conn) else {
            tracing::debug!("Dropping frame from {}: no active session", conn);
            return ServerMessage::pose_error(&EngineError::NoActiveSession);
        };

        match self.engine.process_frame(&session_id, frame).await {
            Ok(processed) => ServerMessage::PoseDetected {
                rep_count: processed.update.status.rep_count,
                valid_rep_count: processed.update.status.valid_rep_count,
                rep_completed: processed.update.rep_completed,
                analysis: processed.analysis,
            },
            Err(e) => {
                if matches!(e, EngineError::SessionNotFound { .. }) {
                    // Ended elsewhere; forget the stale binding
                    let mut bindings = self.bindings.write();
                    if bindings.get(conn) == Some(&session_id) {
                        bindings.remove(conn);
                    }
                } else {
                    tracing::warn!("Frame for session {} failed: {}", session_id, e);
                }
                ServerMessage::pose_error(&e)
            }
        }
    }

    fn end(&self, conn: &str) -> ServerMessage {
        let Some(session_id) = self.bindings.write().remove(conn) else {
            return ServerMessage::error(None, &EngineError::NoActiveSession);
        };

        match self.engine.end_session(&session_id) {
            Ok(summary) => {
                tracing::info!(
                    "Session {} ended: {} reps ({} valid)",
                    session_id,
                    summary.total_reps,
                    summary.valid_reps
                );
                ServerMessage::SessionEnded { summary }
            }
            Err(e) => ServerMessage::error(None, &e),
        }
    }

    /// Release whatever the connection still holds. No summary is produced.
    pub fn disconnect(&self, conn: &str) {
        let bound = self.bindings.write().remove(conn);
        if let Some(session_id) = bound {
            if self.engine.registry().cleanup(&session_id) {
                tracing::info!("Cleaned up session {} after {} disconnected", session_id, conn);
            }
        }
    }
}

impl std::fmt::Debug for StreamMultiplexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamMultiplexer")
            .field("engine", &self.engine)
            .field("bound_connections", &self.bound_connections())
            .finish()
    }
}
