//! Joint angle and torso alignment geometry

use serde::{Deserialize, Serialize};

use super::landmark::{Point2, PoseObservation, LEFT_HIP, LEFT_SHOULDER, RIGHT_HIP, RIGHT_SHOULDER};

/// Shoulder/hip midpoints further apart than this (horizontally) are misaligned
pub const ALIGNMENT_THRESHOLD: f64 = 0.1;

/// Angle at `vertex` formed by the rays towards `a` and `c`, in degrees within [0, 180].
///
/// Non-finite input yields a non-finite result; callers guard against it.
pub fn joint_angle(a: Point2, vertex: Point2, c: Point2) -> f64 {
    let radians = (c.y - vertex.y).atan2(c.x - vertex.x) - (a.y - vertex.y).atan2(a.x - vertex.x);
    let angle = radians.to_degrees().abs();
    if angle > 180.0 {
        360.0 - angle
    } else {
        angle
    }
}

/// Torso straightness derived from shoulder and hip midpoints
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Alignment {
    pub is_aligned: bool,
    /// Absolute horizontal offset between the two midpoints
    pub deviation: f64,
    pub shoulder: Point2,
    pub hip: Point2,
}

fn midpoint(a: Point2, b: Point2) -> Point2 {
    Point2 {
        x: (a.x + b.x) / 2.0,
        y: (a.y + b.y) / 2.0,
    }
}

/// Compare the shoulder midpoint with the hip midpoint.
///
/// Returns `None` when any of the four landmarks is absent.
pub fn check_alignment(observation: &PoseObservation) -> Option<Alignment> {
    let shoulder = midpoint(
        observation.get(LEFT_SHOULDER)?.into(),
        observation.get(RIGHT_SHOULDER)?.into(),
    );
    let hip = midpoint(
        observation.get(LEFT_HIP)?.into(),
        observation.get(RIGHT_HIP)?.into(),
    );
    let deviation = (shoulder.x - hip.x).abs();

    Some(Alignment {
        is_aligned: deviation < ALIGNMENT_THRESHOLD,
        deviation,
        shoulder,
        hip,
    })
}
