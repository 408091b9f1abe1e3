//! Pose estimator capability
//!
//! The engine does not run pose models itself. A [`PoseEstimator`] turns a raw
//! frame into a landmark observation (or reports that no pose was found) and
//! may suspend while doing so. Implementations are swappable without touching
//! the analyzer or the session state machine.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::landmark::{
    Landmark, PoseObservation, LEFT_ELBOW, LEFT_HIP, LEFT_SHOULDER, LEFT_WRIST,
    POSE_LANDMARK_COUNT, RIGHT_ELBOW, RIGHT_HIP, RIGHT_SHOULDER, RIGHT_WRIST,
};

/// Raw frame as delivered by a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FramePayload {
    /// Landmarks already extracted on the client
    Landmarks {
        landmarks: Vec<Landmark>,
        #[serde(default = "default_confidence")]
        confidence: f64,
    },
    /// Encoded image (base64) for a server-side model
    Image {
        data: String,
        #[serde(default)]
        format: Option<String>,
    },
}

fn default_confidence() -> f64 {
    1.0
}

impl FramePayload {
    pub fn kind(&self) -> &'static str {
        match self {
            FramePayload::Landmarks { .. } => "landmarks",
            FramePayload::Image { .. } => "image",
        }
    }
}

/// Failures raised by an estimator
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EstimatorError {
    #[error("{estimator} estimator cannot process {payload} frames")]
    Unsupported {
        estimator: &'static str,
        payload: &'static str,
    },

    #[error("Failed to decode frame: {message}")]
    Decode { message: String },

    #[error("Estimator unavailable: {message}")]
    Unavailable { message: String },
}

/// Where a frame sits in its stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameContext {
    /// Frames the session had recorded before this one; `None` outside a session
    pub frame_index: Option<u64>,
}

impl FrameContext {
    pub fn in_session(frame_index: u64) -> Self {
        Self {
            frame_index: Some(frame_index),
        }
    }
}

/// Capability: observe a frame, yielding landmarks, "no pose", or a failure
pub trait PoseEstimator: Send + Sync {
    /// Short name used in logs and service status
    fn name(&self) -> &'static str;

    fn observe<'a>(
        &'a self,
        frame: &'a FramePayload,
        context: FrameContext,
    ) -> BoxFuture<'a, Result<Option<PoseObservation>, EstimatorError>>;
}

const EXTENDED_ANGLE: f64 = 170.0;
const DEPTH_ANGLE: f64 = 65.0;

/// Which estimator implementation to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimatorKind {
    #[default]
    Passthrough,
    Synthetic,
}

impl EstimatorKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "passthrough" => Some(Self::Passthrough),
            "synthetic" => Some(Self::Synthetic),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Passthrough => "passthrough",
            Self::Synthetic => "synthetic",
        }
    }

    pub fn build(&self) -> Arc<dyn PoseEstimator> {
        match self {
            Self::Passthrough => Arc::new(LandmarkPassthrough),
            Self::Synthetic => Arc::new(SyntheticEstimator::default()),
        }
    }
}

/// Accepts landmarks computed client-side; rejects images
#[derive(Debug, Clone, Copy, Default)]
pub struct LandmarkPassthrough;

impl PoseEstimator for LandmarkPassthrough {
    fn name(&self) -> &'static str {
        "passthrough"
    }

    fn observe<'a>(
        &'a self,
        frame: &'a FramePayload,
        _context: FrameContext,
    ) -> BoxFuture<'a, Result<Option<PoseObservation>, EstimatorError>> {
        async move {
            match frame {
                FramePayload::Landmarks { landmarks, .. } if landmarks.is_empty() => Ok(None),
                FramePayload::Landmarks {
                    landmarks,
                    confidence,
                } => Ok(Some(PoseObservation::new(landmarks.clone(), *confidence))),
                FramePayload::Image { .. } => Err(EstimatorError::Unsupported {
                    estimator: self.name(),
                    payload: frame.kind(),
                }),
            }
        }
        .boxed()
    }
}

/// Stand-in for a real model: ignores frame content and replays push-up
/// keyframes. Each cycle holds full extension for its first half and full
/// depth for the second, so every cycle boundary is a down to up edge.
///
/// The simulation step is the frame's position within its session, so
/// concurrent sessions each see their own sequence.
#[derive(Debug)]
pub struct SyntheticEstimator {
    /// Step counter for observations made outside any session
    tick: AtomicU64,
    frames_per_rep: u64,
}

impl Default for SyntheticEstimator {
    fn default() -> Self {
        Self::new(30)
    }
}

impl SyntheticEstimator {
    pub fn new(frames_per_rep: u64) -> Self {
        Self {
            tick: AtomicU64::new(0),
            frames_per_rep: frames_per_rep.max(2),
        }
    }

    /// Elbow angle at a simulation step
    fn angle_at(&self, tick: u64) -> f64 {
        if tick % self.frames_per_rep < self.frames_per_rep / 2 {
            EXTENDED_ANGLE
        } else {
            DEPTH_ANGLE
        }
    }
}

impl PoseEstimator for SyntheticEstimator {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    fn observe<'a>(
        &'a self,
        _frame: &'a FramePayload,
        context: FrameContext,
    ) -> BoxFuture<'a, Result<Option<PoseObservation>, EstimatorError>> {
        async move {
            let tick = context
                .frame_index
                .unwrap_or_else(|| self.tick.fetch_add(1, Ordering::Relaxed));
            let angle = self.angle_at(tick);
            Ok(Some(pushup_pose(angle, angle, 0.0)))
        }
        .boxed()
    }
}

/// Build a full observation whose elbows bend at the given angles.
///
/// Upper arms hang straight down from the shoulders; forearms rotate away
/// from them by the elbow angle. `torso_offset` shifts the hips sideways,
/// which breaks alignment once it reaches 0.1.
pub fn pushup_pose(left_angle: f64, right_angle: f64, torso_offset: f64) -> PoseObservation {
    const SEGMENT: f64 = 0.15;
    let mut landmarks = vec![Landmark::new(0.5, 0.5); POSE_LANDMARK_COUNT];

    let left_shoulder = Landmark::new(0.45, 0.4);
    let right_shoulder = Landmark::new(0.55, 0.4);
    let left_elbow = Landmark::new(left_shoulder.x, left_shoulder.y + SEGMENT);
    let right_elbow = Landmark::new(right_shoulder.x, right_shoulder.y + SEGMENT);

    // The shoulder ray points at -90 degrees; the forearm sits the elbow angle away
    let left_dir = (left_angle - 90.0).to_radians();
    let right_dir = (-90.0 - right_angle).to_radians();

    landmarks[LEFT_SHOULDER] = left_shoulder;
    landmarks[RIGHT_SHOULDER] = right_shoulder;
    landmarks[LEFT_ELBOW] = left_elbow;
    landmarks[RIGHT_ELBOW] = right_elbow;
    landmarks[LEFT_WRIST] = Landmark::new(
        left_elbow.x + SEGMENT * left_dir.cos(),
        left_elbow.y + SEGMENT * left_dir.sin(),
    );
    landmarks[RIGHT_WRIST] = Landmark::new(
        right_elbow.x + SEGMENT * right_dir.cos(),
        right_elbow.y + SEGMENT * right_dir.sin(),
    );
    landmarks[LEFT_HIP] = Landmark::new(0.45 + torso_offset, 0.45);
    landmarks[RIGHT_HIP] = Landmark::new(0.55 + torso_offset, 0.45);

    PoseObservation::new(landmarks, 0.9)
}
