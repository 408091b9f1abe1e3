//! Session aggregate and the repetition counting rule
//!
//! A session holds nothing beyond counters, the last observed phase and the
//! per-rep feedback log. A rep is counted on the exact `down → up` edge when
//! the `up` frame is a valid pose.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::pose::{FrameAnalysis, Phase};

/// Unique identifier for a session
pub type SessionId = String;

/// Per-session configuration, fixed at creation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionOptions {
    /// Elbow angle below which the phase is `down`
    #[serde(default = "default_min_depth_angle")]
    pub min_depth_angle: f64,
    /// Elbow angle above which the phase is `up`
    #[serde(default = "default_min_extension_angle")]
    pub min_extension_angle: f64,
}

fn default_min_depth_angle() -> f64 {
    90.0
}

fn default_min_extension_angle() -> f64 {
    140.0
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            min_depth_angle: default_min_depth_angle(),
            min_extension_angle: default_min_extension_angle(),
        }
    }
}

/// Options as requested by a client; unset fields fall back to defaults
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionOptionsOverride {
    #[serde(default)]
    pub min_depth_angle: Option<f64>,
    #[serde(default)]
    pub min_extension_angle: Option<f64>,
}

impl SessionOptions {
    /// Apply explicit values over `self`
    pub fn merged(&self, overrides: &SessionOptionsOverride) -> Self {
        Self {
            min_depth_angle: overrides.min_depth_angle.unwrap_or(self.min_depth_angle),
            min_extension_angle: overrides
                .min_extension_angle
                .unwrap_or(self.min_extension_angle),
        }
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        for (name, value) in [
            ("min_depth_angle", self.min_depth_angle),
            ("min_extension_angle", self.min_extension_angle),
        ] {
            if !value.is_finite() || !(0.0..=180.0).contains(&value) {
                return Err(EngineError::InvalidOptions {
                    message: format!("{} must be within [0, 180], got {}", name, value),
                });
            }
        }
        if self.min_depth_angle > self.min_extension_angle {
            return Err(EngineError::InvalidOptions {
                message: format!(
                    "min_depth_angle ({}) must not exceed min_extension_angle ({})",
                    self.min_depth_angle, self.min_extension_angle
                ),
            });
        }
        Ok(())
    }
}

/// One exercise attempt
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    pub session_id: SessionId,
    /// Milliseconds since the Unix epoch
    pub start_time: i64,
    pub options: SessionOptions,
    pub rep_count: u32,
    pub valid_rep_count: u32,
    /// Phase of the most recent frame; `None` after a frame with no pose
    pub last_phase: Option<Phase>,
    pub total_frames: u64,
    pub valid_frames: u64,
    pub feedback_log: Vec<String>,
    /// Set once the session is closed
    pub end_time: Option<i64>,
    /// Distinguishes this incarnation from earlier sessions under the same id
    #[serde(skip)]
    pub generation: u64,
}

impl Session {
    pub fn new(session_id: SessionId, options: SessionOptions, start_time: i64) -> Self {
        Self {
            session_id,
            start_time,
            options,
            rep_count: 0,
            valid_rep_count: 0,
            last_phase: Some(Phase::Up),
            total_frames: 0,
            valid_frames: 0,
            feedback_log: Vec::new(),
            end_time: None,
            generation: 0,
        }
    }

    /// Stamp the end time. The first stamp wins.
    pub fn mark_ended(&mut self, end_time: i64) {
        if self.end_time.is_none() {
            self.end_time = Some(end_time);
        }
    }

    /// Fold one analyzed frame into the counters.
    ///
    /// Returns the rep number when this frame completed a repetition.
    pub fn record_frame(&mut self, analysis: &FrameAnalysis) -> Option<u32> {
        self.total_frames += 1;
        if analysis.is_valid_pose {
            self.valid_frames += 1;
        }

        let completed = self.last_phase == Some(Phase::Down)
            && analysis.phase == Some(Phase::Up)
            && analysis.is_valid_pose;

        self.last_phase = analysis.phase;

        if !completed {
            return None;
        }

        self.rep_count += 1;
        self.valid_rep_count += 1;
        self.feedback_log
            .push(format!("Rep {} completed!", self.rep_count));
        Some(self.rep_count)
    }

    /// Share of valid frames, in percent
    pub fn accuracy(&self) -> f64 {
        if self.valid_frames > 0 {
            self.valid_frames as f64 / self.total_frames as f64 * 100.0
        } else {
            0.0
        }
    }

    /// Read-only snapshot of the live counters
    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            session_id: self.session_id.clone(),
            rep_count: self.rep_count,
            valid_rep_count: self.valid_rep_count,
            start_time: self.start_time,
            last_phase: self.last_phase,
            total_frames: self.total_frames,
            valid_frames: self.valid_frames,
            accuracy: self.accuracy(),
        }
    }

    /// Close the session at `end_time` and produce its summary
    pub fn finish(mut self, end_time: i64) -> SessionSummary {
        self.mark_ended(end_time);
        let end_time = self.end_time.unwrap_or(end_time);
        let duration = end_time.saturating_sub(self.start_time).max(0) as u64;
        let avg_rep_time = if self.rep_count > 0 {
            (duration as f64 / self.rep_count as f64).round() as u64
        } else {
            0
        };

        SessionSummary {
            accuracy: self.accuracy().round(),
            session_id: self.session_id,
            total_reps: self.rep_count,
            valid_reps: self.valid_rep_count,
            duration,
            avg_rep_time,
            feedback: self.feedback_log,
            start_time: self.start_time,
            end_time,
            total_frames: self.total_frames,
            valid_frames: self.valid_frames,
        }
    }
}

/// Live counters of a running session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub session_id: SessionId,
    pub rep_count: u32,
    pub valid_rep_count: u32,
    pub start_time: i64,
    pub last_phase: Option<Phase>,
    pub total_frames: u64,
    pub valid_frames: u64,
    /// Percent of valid frames, unrounded
    pub accuracy: f64,
}

/// Final result of an ended session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub total_reps: u32,
    pub valid_reps: u32,
    /// Milliseconds between start and end
    pub duration: u64,
    /// Percent of valid frames, rounded
    pub accuracy: f64,
    /// Milliseconds per rep, rounded
    pub avg_rep_time: u64,
    pub feedback: Vec<String>,
    pub start_time: i64,
    pub end_time: i64,
    pub total_frames: u64,
    pub valid_frames: u64,
}
