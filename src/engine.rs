//! Shared engine context
//!
//! Bundles the session registry, the pose estimator and the analysis settings.
//! One `Engine` is created per process and handed (behind an `Arc`) to the
//! stream multiplexer and the HTTP surface.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::api::{SessionStarted, StartSessionRequest};
use crate::config::{AnalysisConfig, EngineConfig};
use crate::error::Result;
use crate::pose::{FrameAnalysis, FrameContext, FramePayload, PoseEstimator, PoseFrameAnalyzer};
use crate::session::{FrameUpdate, SessionRegistry, SessionStatus, SessionSummary};

/// Health and load snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub status: String,
    pub active_sessions: usize,
    pub total_reps: u64,
    pub estimator: String,
    pub uptime_secs: u64,
}

/// Result of pushing one frame through a session
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedFrame {
    pub analysis: FrameAnalysis,
    pub update: FrameUpdate,
}

pub struct Engine {
    registry: Arc<SessionRegistry>,
    estimator: Arc<dyn PoseEstimator>,
    analyzer: PoseFrameAnalyzer,
    analysis: AnalysisConfig,
    started: Instant,
}

impl Engine {
    pub fn new(
        registry: Arc<SessionRegistry>,
        estimator: Arc<dyn PoseEstimator>,
        analysis: AnalysisConfig,
    ) -> Self {
        Self {
            registry,
            estimator,
            analyzer: PoseFrameAnalyzer::new(analysis.min_visibility),
            analysis,
            started: Instant::now(),
        }
    }

    /// Build an engine from configuration
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            Arc::new(SessionRegistry::with_defaults(config.session)),
            config.estimator.kind.build(),
            config.analysis.clone(),
        )
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    pub fn estimator_name(&self) -> &'static str {
        self.estimator.name()
    }

    /// Start (or restart) a session; a missing id gets a generated one
    pub fn start_session(&self, request: StartSessionRequest) -> Result<SessionStarted> {
        let session_id = request
            .session_id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| format!("session_{}", uuid::Uuid::new_v4().simple()));
        let session = self.registry.start(&session_id, &request.options)?;
        Ok(SessionStarted {
            session_id: session.session_id,
            start_time: session.start_time,
            options: session.options,
        })
    }

    pub fn end_session(&self, session_id: &str) -> Result<SessionSummary> {
        self.registry.end(session_id)
    }

    pub fn session_status(&self, session_id: &str) -> Result<SessionStatus> {
        self.registry.status(session_id)
    }

    /// Estimate, analyze and count one frame for a session.
    ///
    /// The session is only touched after the estimator succeeded, so an
    /// estimator failure leaves every counter unchanged. A session restarted
    /// while the frame was being estimated rejects it as `not_found`.
    pub async fn process_frame(
        &self,
        session_id: &str,
        frame: &FramePayload,
    ) -> Result<ProcessedFrame> {
        let ticket = self.registry.ticket(session_id)?;
        let thresholds = self.analysis.thresholds_for(&ticket.options);

        let observation = self
            .estimator
            .observe(frame, FrameContext::in_session(ticket.frame_index))
            .await?;
        let analysis = self.analyzer.analyze(observation.as_ref(), thresholds);
        tracing::debug!(
            "Session {} frame: phase={:?} valid={} angle={:.1}",
            session_id,
            analysis.phase,
            analysis.is_valid_pose,
            analysis.avg_elbow_angle
        );

        let update = self.registry.update_for(session_id, &ticket, &analysis)?;
        Ok(ProcessedFrame { analysis, update })
    }

    /// Analyze a frame without touching any session
    pub async fn analyze_frame(&self, frame: &FramePayload) -> Result<FrameAnalysis> {
        let observation = self.estimator.observe(frame, FrameContext::default()).await?;
        let thresholds = self.analysis.thresholds_for(&self.registry.defaults());
        Ok(self.analyzer.analyze(observation.as_ref(), thresholds))
    }

    pub fn service_status(&self) -> ServiceStatus {
        let stats = self.registry.stats();
        ServiceStatus {
            status: "ok".to_string(),
            active_sessions: stats.session_count,
            total_reps: stats.total_reps,
            estimator: self.estimator.name().to_string(),
            uptime_secs: self.started.elapsed().as_secs(),
        }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("estimator", &self.estimator.name())
            .field("analysis", &self.analysis)
            .field("sessions", &self.registry.stats())
            .finish()
    }
}
