//! Head pose and frontality.

use serde::{Deserialize, Serialize};

use super::FaceConfig;
use crate::domain::{landmark_index as idx, EulerAngles, FaceLandmarks};

/// Head orientation from the anchor landmarks.
///
/// Yaw comes from the depth difference across the cheeks, pitch from the
/// depth difference between the cheek midpoint and the forehead, and roll
/// from the slope of the outer eye corners.
///
/// Pitch reads zero only when the cheeks and the forehead sit at the same
/// depth. Real meshes place landmarks 234/454 behind landmark 10, so a
/// level head has a non-zero raw pitch; [`head_pose`] removes that offset.
#[must_use]
pub fn euler_angles(landmarks: &FaceLandmarks) -> Option<EulerAngles> {
    let forehead = landmarks.point(idx::FOREHEAD)?;
    let left_cheek = landmarks.point(idx::LEFT_CHEEK)?;
    let right_cheek = landmarks.point(idx::RIGHT_CHEEK)?;
    let left_eye = landmarks.point(idx::LEFT_EYE_OUTER)?;
    let right_eye = landmarks.point(idx::RIGHT_EYE_OUTER)?;

    let yaw = (right_cheek.z - left_cheek.z).atan2(right_cheek.x - left_cheek.x);
    let mid = left_cheek.midpoint(right_cheek);
    let pitch = (mid.z - forehead.z).atan2(mid.y - forehead.y);
    let roll = (right_eye.y - left_eye.y).atan2(right_eye.x - left_eye.x);

    let angles = EulerAngles::new(pitch, yaw, roll);
    [pitch, yaw, roll]
        .iter()
        .all(|a| a.is_finite())
        .then_some(angles)
}

/// [`euler_angles`] with the detector's level-head pitch subtracted.
#[must_use]
pub fn head_pose(landmarks: &FaceLandmarks, config: &FaceConfig) -> Option<EulerAngles> {
    let raw = euler_angles(landmarks)?;
    Some(EulerAngles::new(
        raw.pitch - config.neutral_pitch_degrees.to_radians(),
        raw.yaw,
        raw.roll,
    ))
}

/// Largest `|angle| / limit` over the three axes; above 1 means a violation.
#[must_use]
pub fn worst_axis_ratio(angles: EulerAngles, config: &FaceConfig) -> f64 {
    let (pitch, yaw, roll) = angles.degrees();
    [
        (pitch, config.max_pitch_degrees),
        (yaw, config.max_yaw_degrees),
        (roll, config.max_roll_degrees),
    ]
    .into_iter()
    .map(|(deg, limit)| if limit > 0.0 { deg.abs() / limit } else { f64::INFINITY })
    .fold(0.0, f64::max)
}

/// `100 × Σ wᵢ·max(0, 1 − |angleᵢ| / thresholdᵢ)`, normalized by the weight sum.
#[must_use]
pub fn frontality_score(angles: EulerAngles, config: &FaceConfig) -> f64 {
    let (pitch, yaw, roll) = angles.degrees();
    let w = &config.frontality_weights;
    let term = |deg: f64, limit: f64| {
        if limit > 0.0 {
            (1.0 - deg.abs() / limit).max(0.0)
        } else {
            0.0
        }
    };
    let weight_sum = w.pitch + w.yaw + w.roll;
    if weight_sum <= 0.0 {
        return 0.0;
    }
    let weighted = w.pitch * term(pitch, config.max_pitch_degrees)
        + w.yaw * term(yaw, config.max_yaw_degrees)
        + w.roll * term(roll, config.max_roll_degrees);
    (100.0 * weighted / weight_sum).clamp(0.0, 100.0)
}

/// An axis on which the head is rotated too far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoseViolation {
    /// Chin raised.
    ChinUp,
    /// Chin lowered.
    ChinDown,
    /// Face turned toward the left of the frame.
    TurnedLeft,
    /// Face turned toward the right of the frame.
    TurnedRight,
    /// Head tilted toward the left of the frame.
    TiltedLeft,
    /// Head tilted toward the right of the frame.
    TiltedRight,
}

impl PoseViolation {
    /// Corrective instruction.
    #[must_use]
    pub const fn feedback(self) -> &'static str {
        match self {
            Self::ChinUp => "Lower your chin slightly.",
            Self::ChinDown => "Raise your chin slightly.",
            Self::TurnedLeft => "Turn your head slightly right to face the camera.",
            Self::TurnedRight => "Turn your head slightly left to face the camera.",
            Self::TiltedLeft => "Straighten your head; it is tilted to the left.",
            Self::TiltedRight => "Straighten your head; it is tilted to the right.",
        }
    }
}

/// Violated axes, in pitch, yaw, roll order.
#[must_use]
pub fn pose_violations(angles: EulerAngles, config: &FaceConfig) -> Vec<PoseViolation> {
    let (pitch, yaw, roll) = angles.degrees();
    let mut out = Vec::new();
    if pitch.abs() > config.max_pitch_degrees {
        out.push(if pitch > 0.0 {
            PoseViolation::ChinDown
        } else {
            PoseViolation::ChinUp
        });
    }
    if yaw.abs() > config.max_yaw_degrees {
        out.push(if yaw > 0.0 {
            PoseViolation::TurnedLeft
        } else {
            PoseViolation::TurnedRight
        });
    }
    if roll.abs() > config.max_roll_degrees {
        out.push(if roll > 0.0 {
            PoseViolation::TiltedRight
        } else {
            PoseViolation::TiltedLeft
        });
    }
    out
}

/// Frontality band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrontalityVerdict {
    /// Every angle within its limit.
    Frontal,
    /// Some angle over its limit, none by more than `slightly_turned_ratio`.
    SlightlyTurned,
    /// Too far from frontal.
    NotFrontal,
    /// Nothing to measure.
    NoFace,
}

impl FrontalityVerdict {
    /// User-facing message for this band.
    #[must_use]
    pub const fn feedback(self) -> &'static str {
        match self {
            Self::Frontal => "Your face is well positioned.",
            Self::SlightlyTurned => "Face the camera a little more directly.",
            Self::NotFrontal => "Look straight into the camera.",
            Self::NoFace => "No face was detected. Center your face in the frame.",
        }
    }
}

/// Frontality of the selected face.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrontalityResult {
    /// Score, 0–100.
    pub score: f64,
    /// Pitch in degrees.
    pub pitch_degrees: f64,
    /// Yaw in degrees.
    pub yaw_degrees: f64,
    /// Roll in degrees.
    pub roll_degrees: f64,
    /// No axis exceeds its limit.
    pub is_frontal: bool,
    /// Band.
    pub verdict: FrontalityVerdict,
    /// Axes over their limits.
    pub violations: Vec<PoseViolation>,
    /// Verdict message followed by one instruction per violation.
    pub feedback: Vec<String>,
}

impl FrontalityResult {
    /// Evaluates a head pose.
    #[must_use]
    pub fn evaluate(angles: EulerAngles, config: &FaceConfig) -> Self {
        let score = frontality_score(angles, config);
        let violations = pose_violations(angles, config);
        let verdict = if violations.is_empty() {
            FrontalityVerdict::Frontal
        } else if worst_axis_ratio(angles, config) <= config.slightly_turned_ratio {
            FrontalityVerdict::SlightlyTurned
        } else {
            FrontalityVerdict::NotFrontal
        };
        let feedback = std::iter::once(verdict.feedback())
            .chain(violations.iter().map(|v| v.feedback()))
            .map(str::to_string)
            .collect();
        let (pitch_degrees, yaw_degrees, roll_degrees) = angles.degrees();
        Self {
            score,
            pitch_degrees,
            yaw_degrees,
            roll_degrees,
            is_frontal: violations.is_empty(),
            verdict,
            violations,
            feedback,
        }
    }

    /// Zero-score record used when no face was found.
    #[must_use]
    pub fn no_face() -> Self {
        Self {
            score: 0.0,
            pitch_degrees: 0.0,
            yaw_degrees: 0.0,
            roll_degrees: 0.0,
            is_frontal: false,
            verdict: FrontalityVerdict::NoFace,
            violations: Vec::new(),
            feedback: vec![FrontalityVerdict::NoFace.feedback().to_string()],
        }
    }
}
