//! Per-frame pose analysis
//!
//! Turns one landmark observation into a [`FrameAnalysis`]: elbow angles,
//! motion phase, torso alignment, validity and form feedback. Analysis is pure
//! apart from the timestamp; it never fails. Degenerate input produces the
//! "no pose" sentinel instead of an error.

use serde::{Deserialize, Serialize};

use super::geometry::{check_alignment, joint_angle, Alignment};
use super::landmark::{
    Landmark, PoseObservation, LEFT_ELBOW, LEFT_SHOULDER, LEFT_WRIST, RIGHT_ELBOW,
    RIGHT_SHOULDER, RIGHT_WRIST,
};
use crate::session::SessionOptions;

pub const NO_POSE_FEEDBACK: &str = "No pose detected";
pub const KEEP_STRAIGHT_FEEDBACK: &str = "Keep your body straight";
pub const LOWER_CHEST_FEEDBACK: &str = "Lower your chest further";
pub const BALANCE_FEEDBACK: &str = "Keep both arms balanced";
pub const FULL_EXTENSION_FEEDBACK: &str = "Good form - full extension";
pub const GOOD_DEPTH_FEEDBACK: &str = "Good depth";
pub const GOOD_FORM_FEEDBACK: &str = "Good form!";

/// Average elbow angle below which the chest is considered too low
const CHEST_TOO_LOW_ANGLE: f64 = 45.0;
/// Left/right elbow difference above which the arms are unbalanced
const ARM_IMBALANCE_ANGLE: f64 = 20.0;

/// Discrete motion phase derived from the elbow angle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Up,
    Down,
    Transition,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Up => "up",
            Phase::Down => "down",
            Phase::Transition => "transition",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Angle limits used to classify a phase
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseThresholds {
    /// Below this the phase is `down`
    pub depth: f64,
    /// Above this the phase is `up`
    pub extension: f64,
}

impl Default for PhaseThresholds {
    fn default() -> Self {
        Self {
            depth: 90.0,
            extension: 140.0,
        }
    }
}

impl From<&SessionOptions> for PhaseThresholds {
    fn from(options: &SessionOptions) -> Self {
        Self {
            depth: options.min_depth_angle,
            extension: options.min_extension_angle,
        }
    }
}

impl PhaseThresholds {
    /// Map an average elbow angle to a phase
    pub fn classify(&self, angle: f64) -> Phase {
        if angle > self.extension {
            Phase::Up
        } else if angle < self.depth {
            Phase::Down
        } else {
            Phase::Transition
        }
    }
}

/// Result of analyzing a single frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameAnalysis {
    /// Angles are kept exact in memory and serialized as whole degrees
    #[serde(serialize_with = "whole_degrees")]
    pub left_elbow_angle: f64,
    #[serde(serialize_with = "whole_degrees")]
    pub right_elbow_angle: f64,
    #[serde(serialize_with = "whole_degrees")]
    pub avg_elbow_angle: f64,
    /// `None` when no usable pose was found
    pub phase: Option<Phase>,
    pub alignment: Option<Alignment>,
    pub feedback: Vec<String>,
    pub is_valid_pose: bool,
    pub confidence: f64,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landmarks: Option<Vec<Landmark>>,
}

impl FrameAnalysis {
    /// Sentinel for frames without a usable pose
    pub fn no_pose() -> Self {
        Self {
            left_elbow_angle: 0.0,
            right_elbow_angle: 0.0,
            avg_elbow_angle: 0.0,
            phase: None,
            alignment: None,
            feedback: vec![NO_POSE_FEEDBACK.to_string()],
            is_valid_pose: false,
            confidence: 0.0,
            timestamp: now_millis(),
            landmarks: None,
        }
    }

    pub fn is_no_pose(&self) -> bool {
        self.phase.is_none()
    }
}

fn whole_degrees<S: serde::Serializer>(angle: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(angle.round())
}

pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Stateless per-frame analyzer
#[derive(Debug, Clone, Copy, Default)]
pub struct PoseFrameAnalyzer {
    /// Required landmarks below this visibility make the frame "no pose"
    min_visibility: f64,
}

impl PoseFrameAnalyzer {
    pub fn new(min_visibility: f64) -> Self {
        Self { min_visibility }
    }

    /// Analyze one observation, classifying the phase with `thresholds`
    pub fn analyze(
        &self,
        observation: Option<&PoseObservation>,
        thresholds: PhaseThresholds,
    ) -> FrameAnalysis {
        let Some(observation) = observation else {
            return FrameAnalysis::no_pose();
        };

        if let Err(reason) = observation.check_required(self.min_visibility) {
            tracing::debug!("Discarding malformed observation: {:?}", reason);
            return FrameAnalysis::no_pose();
        }

        let (Some(left), Some(right), Some(alignment)) = (
            elbow_angle(observation, LEFT_SHOULDER, LEFT_ELBOW, LEFT_WRIST),
            elbow_angle(observation, RIGHT_SHOULDER, RIGHT_ELBOW, RIGHT_WRIST),
            check_alignment(observation),
        ) else {
            return FrameAnalysis::no_pose();
        };

        let avg = (left + right) / 2.0;
        let phase = thresholds.classify(avg);
        let feedback = form_feedback(left, right, &alignment, thresholds);

        FrameAnalysis {
            left_elbow_angle: left,
            right_elbow_angle: right,
            avg_elbow_angle: avg,
            phase: Some(phase),
            alignment: Some(alignment),
            feedback,
            is_valid_pose: alignment.is_aligned,
            confidence: observation.confidence,
            timestamp: now_millis(),
            landmarks: Some(observation.landmarks.clone()),
        }
    }
}

fn elbow_angle(
    observation: &PoseObservation,
    shoulder: usize,
    elbow: usize,
    wrist: usize,
) -> Option<f64> {
    let angle = joint_angle(
        observation.get(shoulder)?.into(),
        observation.get(elbow)?.into(),
        observation.get(wrist)?.into(),
    );
    angle.is_finite().then_some(angle)
}

/// Advisory messages, in priority order. Conditions are independent.
fn form_feedback(
    left: f64,
    right: f64,
    alignment: &Alignment,
    thresholds: PhaseThresholds,
) -> Vec<String> {
    let avg = (left + right) / 2.0;
    let mut feedback = Vec::new();

    if !alignment.is_aligned {
        feedback.push(KEEP_STRAIGHT_FEEDBACK);
    }
    if avg < CHEST_TOO_LOW_ANGLE {
        feedback.push(LOWER_CHEST_FEEDBACK);
    }
    if (left - right).abs() > ARM_IMBALANCE_ANGLE {
        feedback.push(BALANCE_FEEDBACK);
    }
    if alignment.is_aligned && avg > thresholds.extension {
        feedback.push(FULL_EXTENSION_FEEDBACK);
    }
    if alignment.is_aligned && avg < thresholds.depth {
        feedback.push(GOOD_DEPTH_FEEDBACK);
    }
    if feedback.is_empty() {
        feedback.push(GOOD_FORM_FEEDBACK);
    }

    feedback.into_iter().map(String::from).collect()
}
