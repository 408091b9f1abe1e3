//! Landmark → angle → phase pipeline
//!
//! # Modules
//!
//! - `landmark` - Landmark layout and degenerate-input checks
//! - `geometry` - Joint angles and torso alignment
//! - `analyzer` - Per-frame phase classification and form feedback
//! - `estimator` - Pose estimator capability and built-in implementations

pub mod analyzer;
pub mod estimator;
pub mod geometry;
pub mod landmark;

pub use analyzer::{FrameAnalysis, Phase, PhaseThresholds, PoseFrameAnalyzer};
pub use estimator::{
    pushup_pose, EstimatorError, EstimatorKind, FrameContext, FramePayload, LandmarkPassthrough,
    PoseEstimator, SyntheticEstimator,
};
pub use geometry::{check_alignment, joint_angle, Alignment, ALIGNMENT_THRESHOLD};
pub use landmark::{Landmark, MalformedLandmark, Point2, PoseObservation};
