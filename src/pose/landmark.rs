//! Landmark storage and anatomical indices
//!
//! Observations use the 33-point body layout produced by common pose
//! estimators. Only the upper-body points listed below are read.

use serde::{Deserialize, Serialize};

pub const LEFT_SHOULDER: usize = 11;
pub const RIGHT_SHOULDER: usize = 12;
pub const LEFT_ELBOW: usize = 13;
pub const RIGHT_ELBOW: usize = 14;
pub const LEFT_WRIST: usize = 15;
pub const RIGHT_WRIST: usize = 16;
pub const LEFT_HIP: usize = 23;
pub const RIGHT_HIP: usize = 24;

/// Number of points in a full observation
pub const POSE_LANDMARK_COUNT: usize = 33;

/// Points closer than this (normalized units) are treated as the same point
pub const COINCIDENT_EPSILON: f64 = 1e-6;

/// (shoulder, elbow, wrist) triples whose elbow angle is measured
pub const ARM_TRIPLES: [(usize, usize, usize); 2] = [
    (LEFT_SHOULDER, LEFT_ELBOW, LEFT_WRIST),
    (RIGHT_SHOULDER, RIGHT_ELBOW, RIGHT_WRIST),
];

/// Landmarks the analyzer reads
pub const REQUIRED_LANDMARKS: [usize; 8] = [
    LEFT_SHOULDER,
    RIGHT_SHOULDER,
    LEFT_ELBOW,
    RIGHT_ELBOW,
    LEFT_WRIST,
    RIGHT_WRIST,
    LEFT_HIP,
    RIGHT_HIP,
];

/// A single tracked body point in normalized image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    #[serde(default = "full_visibility")]
    pub visibility: f64,
}

fn full_visibility() -> f64 {
    1.0
}

impl Landmark {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            z: 0.0,
            visibility: 1.0,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Planar distance to another landmark
    pub fn distance(&self, other: &Landmark) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// A 2D point, used for derived positions such as midpoints
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl From<Landmark> for Point2 {
    fn from(l: Landmark) -> Self {
        Self { x: l.x, y: l.y }
    }
}

/// One pose observation from the estimator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseObservation {
    pub landmarks: Vec<Landmark>,
    #[serde(default = "full_visibility")]
    pub confidence: f64,
}

/// Why an observation cannot be analyzed
#[derive(Debug, Clone, PartialEq)]
pub enum MalformedLandmark {
    /// Fewer points than the layout requires
    Missing { index: usize },
    /// NaN or infinite coordinates
    NonFinite { index: usize },
    /// Visibility below the configured gate
    Occluded { index: usize, visibility: f64 },
    /// Sits on top of the elbow it forms an angle with, so the angle is undefined
    Coincident { index: usize },
}

impl PoseObservation {
    pub fn new(landmarks: Vec<Landmark>, confidence: f64) -> Self {
        Self {
            landmarks,
            confidence,
        }
    }

    /// Landmark at an anatomical index
    pub fn get(&self, index: usize) -> Option<Landmark> {
        self.landmarks.get(index).copied()
    }

    /// Check every required landmark is present, finite and visible enough,
    /// and that no shoulder or wrist collapses onto its elbow
    pub fn check_required(&self, min_visibility: f64) -> Result<(), MalformedLandmark> {
        for &index in REQUIRED_LANDMARKS.iter() {
            let landmark = self.get(index).ok_or(MalformedLandmark::Missing { index })?;
            if !landmark.is_finite() {
                return Err(MalformedLandmark::NonFinite { index });
            }
            if landmark.visibility < min_visibility {
                return Err(MalformedLandmark::Occluded {
                    index,
                    visibility: landmark.visibility,
                });
            }
        }

        for &(shoulder, elbow, wrist) in ARM_TRIPLES.iter() {
            let vertex = self.get(elbow).ok_or(MalformedLandmark::Missing { index: elbow })?;
            for index in [shoulder, wrist] {
                let end = self.get(index).ok_or(MalformedLandmark::Missing { index })?;
                if end.distance(&vertex) < COINCIDENT_EPSILON {
                    return Err(MalformedLandmark::Coincident { index });
                }
            }
        }
        Ok(())
    }
}
