//! Session registry
//!
//! Owns every live [`Session`] and serializes mutation per session.
//!
//! # Locking
//!
//! - `sessions` (RwLock): shared for frame updates and status reads,
//!   exclusive for start/end/cleanup which change membership
//! - each `Mutex<Session>`: a single writer per session at a time
//!
//! Updates for different sessions only share the map read lock and run in
//! parallel. A status read takes the session mutex too, so it never sees a
//! half-applied frame. Locks are never held across an `.await`; pose
//! estimation happens between [`SessionRegistry::ticket`] and
//! [`SessionRegistry::update_for`].
//!
//! # Generations
//!
//! Every start, including a restart of an existing id, gets a fresh
//! generation. A frame admitted under one generation is rejected as
//! `not_found` if the id was restarted or ended while it was being estimated.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};

use crate::error::{EngineError, Result};
use crate::pose::analyzer::now_millis;
use crate::pose::FrameAnalysis;
use crate::session::state::{
    Session, SessionId, SessionOptions, SessionOptionsOverride, SessionStatus, SessionSummary,
};

/// Outcome of folding one frame into a session
#[derive(Debug, Clone, PartialEq)]
pub struct FrameUpdate {
    pub status: SessionStatus,
    /// Rep number when this frame completed a repetition
    pub rep_completed: Option<u32>,
}

/// Session state captured when a frame is admitted, before estimation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTicket {
    pub options: SessionOptions,
    pub generation: u64,
    /// Frames the session had recorded when this one was admitted
    pub frame_index: u64,
}

/// Registry of all live sessions
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, Mutex<Session>>>,
    /// Options applied where a start request leaves a field unset
    defaults: SessionOptions,
    last_generation: AtomicU64,
}

impl SessionRegistry {
    /// Create an empty registry with the built-in default options
    pub fn new() -> Self {
        Self::with_defaults(SessionOptions::default())
    }

    /// Create an empty registry with configured default options
    pub fn with_defaults(defaults: SessionOptions) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            defaults,
            last_generation: AtomicU64::new(0),
        }
    }

    pub fn defaults(&self) -> SessionOptions {
        self.defaults
    }

    /// Start a session. Restarting an existing id replaces it.
    pub fn start(&self, session_id: &str, overrides: &SessionOptionsOverride) -> Result<Session> {
        let options = self.defaults.merged(overrides);
        options.validate()?;

        let mut session = Session::new(session_id.to_string(), options, now_millis());
        session.generation = self.last_generation.fetch_add(1, Ordering::Relaxed) + 1;
        let replaced = self
            .sessions
            .write()
            .insert(session_id.to_string(), Mutex::new(session.clone()))
            .is_some();

        if replaced {
            tracing::info!("Restarted session {} (previous state discarded)", session_id);
        } else {
            tracing::info!("Started session {}", session_id);
        }
        Ok(session)
    }

    /// Admit a frame: capture what estimation and analysis need
    pub fn ticket(&self, session_id: &str) -> Result<FrameTicket> {
        self.with_session(session_id, |session| FrameTicket {
            options: session.options,
            generation: session.generation,
            frame_index: session.total_frames,
        })
    }

    /// Apply one analyzed frame to whatever session currently holds the id
    pub fn update(&self, session_id: &str, analysis: &FrameAnalysis) -> Result<FrameUpdate> {
        self.apply(session_id, None, analysis)
    }

    /// Apply a frame admitted by [`ticket`](Self::ticket). Fails with
    /// `not_found` when the session was restarted in the meantime.
    pub fn update_for(
        &self,
        session_id: &str,
        ticket: &FrameTicket,
        analysis: &FrameAnalysis,
    ) -> Result<FrameUpdate> {
        self.apply(session_id, Some(ticket.generation), analysis)
    }

    fn apply(
        &self,
        session_id: &str,
        generation: Option<u64>,
        analysis: &FrameAnalysis,
    ) -> Result<FrameUpdate> {
        let sessions = self.sessions.read();
        let mut session = sessions
            .get(session_id)
            .ok_or_else(|| EngineError::not_found(session_id))?
            .lock();

        if generation.is_some_and(|g| g != session.generation) {
            tracing::debug!("Dropping stale frame for restarted session {}", session_id);
            return Err(EngineError::not_found(session_id));
        }

        let rep_completed = session.record_frame(analysis);
        if let Some(rep) = rep_completed {
            tracing::info!("Rep {} completed for session {}", rep, session_id);
        }

        Ok(FrameUpdate {
            status: session.status(),
            rep_completed,
        })
    }

    /// End a session now, removing it and returning its summary
    pub fn end(&self, session_id: &str) -> Result<SessionSummary> {
        self.end_at(session_id, now_millis())
    }

    /// End a session at an explicit timestamp (milliseconds since the epoch)
    pub fn end_at(&self, session_id: &str, end_time: i64) -> Result<SessionSummary> {
        let session = self
            .sessions
            .write()
            .remove(session_id)
            .ok_or_else(|| EngineError::not_found(session_id))?
            .into_inner();

        let summary = session.finish(end_time);
        tracing::info!(
            "Ended session {}: {} reps, {}% accuracy, {} ms",
            session_id,
            summary.total_reps,
            summary.accuracy,
            summary.duration
        );
        Ok(summary)
    }

    /// Drop a session without a summary. Returns whether it existed.
    pub fn cleanup(&self, session_id: &str) -> bool {
        let removed = self.sessions.write().remove(session_id).is_some();
        if removed {
            tracing::info!("Cleaned up session {}", session_id);
        }
        removed
    }

    /// Consistent snapshot of a session's live counters
    pub fn status(&self, session_id: &str) -> Result<SessionStatus> {
        self.with_session(session_id, Session::status)
    }

    /// Options a session was started with
    pub fn options(&self, session_id: &str) -> Result<SessionOptions> {
        self.with_session(session_id, |session| session.options)
    }

    fn with_session<F, R>(&self, session_id: &str, f: F) -> Result<R>
    where
        F: FnOnce(&Session) -> R,
    {
        let sessions = self.sessions.read();
        let session = sessions
            .get(session_id)
            .ok_or_else(|| EngineError::not_found(session_id))?
            .lock();
        Ok(f(&*session))
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.read().contains_key(session_id)
    }

    /// Snapshots of every live session, ordered by id
    pub fn active_sessions(&self) -> Vec<SessionStatus> {
        let sessions = self.sessions.read();
        let mut list: Vec<SessionStatus> = sessions.values().map(|s| s.lock().status()).collect();
        list.sort_by(|a, b| a.session_id.cmp(&b.session_id));
        list
    }

    /// Get stats about the registry
    pub fn stats(&self) -> RegistryStats {
        let sessions = self.sessions.read();
        let total_reps = sessions.values().map(|s| s.lock().rep_count as u64).sum();
        RegistryStats {
            session_count: sessions.len(),
            total_reps,
        }
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics about the registry
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryStats {
    pub session_count: usize,
    pub total_reps: u64,
}
