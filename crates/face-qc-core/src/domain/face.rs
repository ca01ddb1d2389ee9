//! Face landmark types.
//!
//! Landmarks follow the 468-point face mesh layout. "Left" and "right" in
//! index names refer to the image, not the subject.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{BoundingBox, NormalizedRect, Point3, RgbImageData};

/// Points a detection must carry to be usable.
pub const LANDMARK_COUNT: usize = 468;

/// Indices of the anchor landmarks used by the geometry code.
pub mod landmark_index {
    /// Top of the forehead.
    pub const FOREHEAD: usize = 10;
    /// Forehead center between the brows.
    pub const FOREHEAD_CENTER: usize = 151;
    /// Chin.
    pub const CHIN: usize = 152;
    /// Nose tip.
    pub const NOSE_TIP: usize = 1;
    /// Cheek contour on the image-left side.
    pub const LEFT_CHEEK: usize = 234;
    /// Cheek contour on the image-right side.
    pub const RIGHT_CHEEK: usize = 454;
    /// Outer corner of the image-left eye.
    pub const LEFT_EYE_OUTER: usize = 33;
    /// Outer corner of the image-right eye.
    pub const RIGHT_EYE_OUTER: usize = 263;
    /// Inner corner of the image-left eye.
    pub const LEFT_EYE_INNER: usize = 133;
    /// Inner corner of the image-right eye.
    pub const RIGHT_EYE_INNER: usize = 362;
    /// Outer end of the image-left brow.
    pub const LEFT_BROW_OUTER: usize = 70;
    /// Outer end of the image-right brow.
    pub const RIGHT_BROW_OUTER: usize = 300;
    /// Arch of the image-left brow.
    pub const LEFT_BROW_ARCH: usize = 105;
    /// Arch of the image-right brow.
    pub const RIGHT_BROW_ARCH: usize = 334;
}

/// One face as reported by an external landmark detector.
///
/// Coordinates are normalized: `x` and `y` in `[0, 1]` of the image size,
/// `z` relative depth scaled like `x`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFaceDetection {
    /// Mesh points as `[x, y, z]`.
    pub landmarks: Vec<[f32; 3]>,
    /// Detector bounding box, if it reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<NormalizedRect>,
    /// Detector confidence in `[0, 1]`, if it reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

/// Landmarks converted to pixel space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceLandmarks {
    points: Vec<Point3>,
    confidence: f64,
}

impl FaceLandmarks {
    /// Converts normalized detector points to pixel space.
    ///
    /// Returns `None` when fewer than [`LANDMARK_COUNT`] points are given.
    #[must_use]
    pub fn from_normalized(
        raw: &[[f32; 3]],
        image_width: u32,
        image_height: u32,
        confidence: f64,
    ) -> Option<Self> {
        if raw.len() < LANDMARK_COUNT {
            return None;
        }
        let w = f64::from(image_width);
        let h = f64::from(image_height);
        let points = raw
            .iter()
            .map(|&[x, y, z]| Point3::new(f64::from(x) * w, f64::from(y) * h, f64::from(z) * w))
            .collect();
        Some(Self {
            points,
            confidence: confidence.clamp(0.0, 1.0),
        })
    }

    /// All points in detector order.
    #[must_use]
    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    /// Point at `index`.
    #[must_use]
    pub fn point(&self, index: usize) -> Option<Point3> {
        self.points.get(index).copied()
    }

    /// Detector confidence in `[0, 1]`.
    #[must_use]
    pub const fn confidence(&self) -> f64 {
        self.confidence
    }

    /// `(min_x, min_y, max_x, max_y)` over all points.
    #[must_use]
    pub fn extent(&self) -> (f64, f64, f64, f64) {
        self.points.iter().fold(
            (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
            |(x0, y0, x1, y1), p| (x0.min(p.x), y0.min(p.y), x1.max(p.x), y1.max(p.y)),
        )
    }

    /// Shifts every point so that `(origin_x, origin_y)` becomes `(0, 0)`.
    #[must_use]
    pub fn rebased(&self, origin_x: f64, origin_y: f64) -> Self {
        Self {
            points: self
                .points
                .iter()
                .map(|p| Point3::new(p.x - origin_x, p.y - origin_y, p.z))
                .collect(),
            confidence: self.confidence,
        }
    }
}

/// Head orientation in radians. Zero on every axis faces the camera.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EulerAngles {
    /// Nod; positive tilts the chin down.
    pub pitch: f64,
    /// Turn; positive turns the image-right cheek away from the camera.
    pub yaw: f64,
    /// Tilt; positive lowers the image-right eye.
    pub roll: f64,
}

impl EulerAngles {
    /// Creates angles from radians.
    #[must_use]
    pub const fn new(pitch: f64, yaw: f64, roll: f64) -> Self {
        Self { pitch, yaw, roll }
    }

    /// Creates angles from degrees.
    #[must_use]
    pub fn from_degrees(pitch: f64, yaw: f64, roll: f64) -> Self {
        Self::new(pitch.to_radians(), yaw.to_radians(), roll.to_radians())
    }

    /// `(pitch, yaw, roll)` in degrees.
    #[must_use]
    pub fn degrees(&self) -> (f64, f64, f64) {
        (
            self.pitch.to_degrees(),
            self.yaw.to_degrees(),
            self.roll.to_degrees(),
        )
    }
}

/// A face with geometry computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedFace {
    /// Pixel-space landmarks.
    pub landmarks: FaceLandmarks,
    /// Face box in pixels.
    pub bounding_box: BoundingBox,
    /// Head orientation.
    pub angles: EulerAngles,
    /// Frontality score, 0–100.
    pub frontality_score: f64,
    /// Detector confidence, 0–1.
    pub confidence: f64,
}

/// The selected face cut out of the image.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FaceRegion {
    /// Padded region in pixels.
    pub bounding_box: BoundingBox,
    /// Padded region as fractions of the image.
    pub normalized: NormalizedRect,
    /// Cropped pixels.
    #[serde(skip)]
    pub image: Option<Arc<RgbImageData>>,
    /// Landmarks relative to the region origin.
    #[serde(skip)]
    pub landmarks: Option<FaceLandmarks>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn raw(n: usize) -> Vec<[f32; 3]> {
        (0..n)
            .map(|i| {
                #[allow(clippy::cast_precision_loss)]
                let t = i as f32 / n as f32;
                [0.25 + 0.5 * t, 0.2 + 0.6 * t, 0.01]
            })
            .collect()
    }

    #[test]
    fn test_rejects_short_landmark_sets() {
        assert!(FaceLandmarks::from_normalized(&raw(467), 100, 100, 0.9).is_none());
        assert!(FaceLandmarks::from_normalized(&raw(468), 100, 100, 0.9).is_some());
    }

    #[test]
    fn test_scales_to_pixels() {
        let lm = FaceLandmarks::from_normalized(&raw(468), 200, 100, 0.9).unwrap();
        let p = lm.point(0).unwrap();
        assert!((p.x - 50.0).abs() < 1e-4);
        assert!((p.y - 20.0).abs() < 1e-4);
        assert!((p.z - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_confidence_clamped() {
        let lm = FaceLandmarks::from_normalized(&raw(468), 10, 10, 3.0).unwrap();
        assert!((lm.confidence() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_extent_and_rebase() {
        let lm = FaceLandmarks::from_normalized(&raw(468), 100, 100, 0.9).unwrap();
        let (x0, y0, x1, y1) = lm.extent();
        assert!(x0 < x1 && y0 < y1);
        let moved = lm.rebased(x0, y0);
        let (mx0, my0, _, _) = moved.extent();
        assert!(mx0.abs() < 1e-9 && my0.abs() < 1e-9);
    }

    #[test]
    fn test_degrees_round_trip() {
        let angles = EulerAngles::from_degrees(10.0, -20.0, 5.0);
        let (p, y, r) = angles.degrees();
        assert!((p - 10.0).abs() < 1e-9);
        assert!((y + 20.0).abs() < 1e-9);
        assert!((r - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_raw_detection_defaults_from_json() {
        let det: RawFaceDetection = serde_json::from_str(r#"{"landmarks":[[0.1,0.2,0.0]]}"#).unwrap();
        assert_eq!(det.landmarks.len(), 1);
        assert!(det.bounding_box.is_none());
        assert!(det.confidence.is_none());
    }
}
