//! Landmark detector port.
//!
//! The face stage never runs a detector itself. It asks a [`LandmarkProvider`]
//! for 468-point meshes, so the same code runs against a real detector's
//! output, a JSON sidecar, or the deterministic synthetic face below.

use crate::domain::{landmark_index as idx, EulerAngles, RawFaceDetection, RgbImageData, LANDMARK_COUNT};

/// Port for obtaining face landmarks for an image.
pub trait LandmarkProvider: Send + Sync {
    /// Returns the name of this provider.
    fn name(&self) -> &'static str;

    /// Detects faces in `image`.
    ///
    /// An empty vector means no face was found.
    ///
    /// # Errors
    ///
    /// Returns an error if the detector fails.
    fn detect_faces(&self, image: &RgbImageData) -> anyhow::Result<Vec<RawFaceDetection>>;
}

/// Returns a fixed set of detections for every image.
#[derive(Debug, Clone, Default)]
pub struct StaticLandmarkProvider {
    detections: Vec<RawFaceDetection>,
}

impl StaticLandmarkProvider {
    /// Creates a provider returning `detections`.
    #[must_use]
    pub const fn new(detections: Vec<RawFaceDetection>) -> Self {
        Self { detections }
    }

    /// A provider that never finds a face.
    #[must_use]
    pub const fn empty() -> Self {
        Self::new(Vec::new())
    }
}

impl LandmarkProvider for StaticLandmarkProvider {
    fn name(&self) -> &'static str {
        "static"
    }

    fn detect_faces(&self, _image: &RgbImageData) -> anyhow::Result<Vec<RawFaceDetection>> {
        Ok(self.detections.clone())
    }
}

const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;

/// Generates one deterministic face mesh per image.
///
/// The face is an ellipse centered at `center` (fractions of the image) whose
/// height is `scale` times the shorter image side. Anchor landmarks sit at
/// fixed positions; the remaining points fill the ellipse. A pose rotates the
/// whole mesh about the face center (roll, then pitch, then yaw).
#[derive(Debug, Clone, Copy)]
pub struct SyntheticLandmarkProvider {
    center: (f64, f64),
    scale: f64,
    pose: EulerAngles,
    confidence: f32,
}

impl Default for SyntheticLandmarkProvider {
    fn default() -> Self {
        Self {
            center: (0.5, 0.5),
            scale: 0.6,
            pose: EulerAngles::default(),
            confidence: 0.95,
        }
    }
}

impl SyntheticLandmarkProvider {
    /// Frontal face in the middle of the image.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rotates the face by the given angles in degrees.
    #[must_use]
    pub fn with_pose(mut self, pitch: f64, yaw: f64, roll: f64) -> Self {
        self.pose = EulerAngles::from_degrees(pitch, yaw, roll);
        self
    }

    /// Moves the face center, in fractions of the image size.
    #[must_use]
    pub const fn with_center(mut self, x: f64, y: f64) -> Self {
        self.center = (x, y);
        self
    }

    /// Sets the face height as a fraction of the shorter image side.
    #[must_use]
    pub const fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// Sets the reported detector confidence.
    #[must_use]
    pub const fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    /// Builds the mesh for a `width`×`height` image.
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    #[must_use]
    pub fn detection_for(&self, width: u32, height: u32) -> RawFaceDetection {
        let w = f64::from(width.max(1));
        let h = f64::from(height.max(1));
        let half_h = self.scale * w.min(h) / 2.0;
        let half_w = half_h * 0.8;

        let mut offsets = vec![[0.0f64; 3]; LANDMARK_COUNT];
        let n = LANDMARK_COUNT as f64;
        for (i, slot) in offsets.iter_mut().enumerate() {
            let r = ((i as f64 + 0.5) / n).sqrt() * 0.95;
            let theta = i as f64 * GOLDEN_ANGLE;
            *slot = [
                half_w * r * theta.cos(),
                half_h * r * theta.sin(),
                -0.2 * half_w * r.mul_add(-r, 1.0),
            ];
        }
        let anchors: [(usize, [f64; 3]); 14] = [
            (idx::FOREHEAD, [0.0, -0.9, 0.0]),
            (idx::FOREHEAD_CENTER, [0.0, -0.6, 0.0]),
            (idx::CHIN, [0.0, 1.0, 0.0]),
            (idx::NOSE_TIP, [0.0, 0.1, -0.3]),
            (idx::LEFT_CHEEK, [-1.0, 0.0, 0.0]),
            (idx::RIGHT_CHEEK, [1.0, 0.0, 0.0]),
            (idx::LEFT_EYE_OUTER, [-0.6, -0.2, 0.0]),
            (idx::RIGHT_EYE_OUTER, [0.6, -0.2, 0.0]),
            (idx::LEFT_EYE_INNER, [-0.2, -0.2, 0.0]),
            (idx::RIGHT_EYE_INNER, [0.2, -0.2, 0.0]),
            (idx::LEFT_BROW_OUTER, [-0.75, -0.35, 0.0]),
            (idx::RIGHT_BROW_OUTER, [0.75, -0.35, 0.0]),
            (idx::LEFT_BROW_ARCH, [-0.45, -0.4, 0.0]),
            (idx::RIGHT_BROW_ARCH, [0.45, -0.4, 0.0]),
        ];
        for (index, [u, v, d]) in anchors {
            offsets[index] = [u * half_w, v * half_h, d * half_w];
        }

        let (cx, cy) = (self.center.0 * w, self.center.1 * h);
        let landmarks = offsets
            .into_iter()
            .map(|p| {
                let [x, y, z] = rotate(p, self.pose);
                [((cx + x) / w) as f32, ((cy + y) / h) as f32, (z / w) as f32]
            })
            .collect();

        RawFaceDetection {
            landmarks,
            bounding_box: None,
            confidence: Some(self.confidence),
        }
    }
}

impl LandmarkProvider for SyntheticLandmarkProvider {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    fn detect_faces(&self, image: &RgbImageData) -> anyhow::Result<Vec<RawFaceDetection>> {
        Ok(vec![self.detection_for(image.width(), image.height())])
    }
}

fn rotate([x, y, z]: [f64; 3], pose: EulerAngles) -> [f64; 3] {
    let (sr, cr) = pose.roll.sin_cos();
    let (x, y) = (x * cr - y * sr, x * sr + y * cr);

    let (sp, cp) = pose.pitch.sin_cos();
    let (y, z) = (y * cp - z * sp, y * sp + z * cp);

    let (sy, cy) = pose.yaw.sin_cos();
    let (x, z) = (x * cy - z * sy, x * sy + z * cy);

    [x, y, z]
}
