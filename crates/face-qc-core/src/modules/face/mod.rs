//! Stage 2: face geometry.
//!
//! Turns detector meshes into typed faces, measures head pose and
//! frontality, picks one face and cuts out its region for the lighting stage.

pub mod fallback;
mod pose;
mod region;
mod selection;

pub use pose::{
    euler_angles, frontality_score, head_pose, pose_violations, worst_axis_ratio,
    FrontalityResult, FrontalityVerdict, PoseViolation,
};
pub use region::{extract_region, forehead_rect};
pub use selection::{select_best, selection_score};

use std::sync::Arc;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::{
    BoundingBox, DetectedFace, EulerAngles, FaceLandmarks, FaceRegion, NormalizedRect, QaStage,
    RawFaceDetection, RgbImageData, LANDMARK_COUNT,
};
use crate::error::ConfigError;
use crate::ports::LandmarkProvider;

/// Weights of the three axes in the frontality score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontalityWeights {
    /// Pitch weight.
    pub pitch: f64,
    /// Yaw weight.
    pub yaw: f64,
    /// Roll weight.
    pub roll: f64,
}

impl Default for FrontalityWeights {
    fn default() -> Self {
        Self {
            pitch: 0.3,
            yaw: 0.4,
            roll: 0.3,
        }
    }
}

/// Weights used to pick one of several faces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionWeights {
    /// Frontality weight.
    pub frontality: f64,
    /// Relative face area weight.
    pub area: f64,
    /// Closeness to the image center weight.
    pub centeredness: f64,
}

impl Default for SelectionWeights {
    fn default() -> Self {
        Self {
            frontality: 0.4,
            area: 0.3,
            centeredness: 0.3,
        }
    }
}

/// Configuration for the face stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceConfig {
    /// Largest acceptable pitch.
    pub max_pitch_degrees: f64,
    /// Largest acceptable yaw.
    pub max_yaw_degrees: f64,
    /// Largest acceptable roll.
    pub max_roll_degrees: f64,
    /// Raw pitch the detector reports for a level head.
    pub neutral_pitch_degrees: f64,
    /// Worst `|angle| / limit` still graded as slightly turned.
    pub slightly_turned_ratio: f64,
    /// Frontality weights.
    pub frontality_weights: FrontalityWeights,
    /// Face selection weights.
    pub selection_weights: SelectionWeights,
    /// Face area ratio at which the area term saturates.
    pub max_area_ratio: f64,
    /// Total growth of a box derived from landmark extent (half per side).
    pub bbox_padding: f64,
    /// Padding added to each side of the face box for the region crop.
    pub region_padding: f64,
    /// Confidence assumed when the detector reports none.
    pub default_confidence: f64,
}

impl Default for FaceConfig {
    fn default() -> Self {
        Self {
            max_pitch_degrees: 15.0,
            max_yaw_degrees: 20.0,
            max_roll_degrees: 15.0,
            neutral_pitch_degrees: 0.0,
            slightly_turned_ratio: 1.5,
            frontality_weights: FrontalityWeights::default(),
            selection_weights: SelectionWeights::default(),
            max_area_ratio: 0.5,
            bbox_padding: 0.2,
            region_padding: 0.2,
            default_confidence: 0.9,
        }
    }
}

impl FaceConfig {
    /// Checks limits are positive and fractions are fractions.
    ///
    /// # Errors
    ///
    /// Returns the first invalid setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::check_range("face.max_pitch_degrees", self.max_pitch_degrees, 0.1, 90.0)?;
        ConfigError::check_range("face.max_yaw_degrees", self.max_yaw_degrees, 0.1, 90.0)?;
        ConfigError::check_range("face.max_roll_degrees", self.max_roll_degrees, 0.1, 90.0)?;
        ConfigError::check_range("face.neutral_pitch_degrees", self.neutral_pitch_degrees, -45.0, 45.0)?;
        ConfigError::check_range("face.slightly_turned_ratio", self.slightly_turned_ratio, 1.0, 10.0)?;
        ConfigError::check_range("face.max_area_ratio", self.max_area_ratio, 0.01, 1.0)?;
        ConfigError::check_range("face.bbox_padding", self.bbox_padding, 0.0, 2.0)?;
        ConfigError::check_range("face.region_padding", self.region_padding, 0.0, 2.0)?;
        ConfigError::check_range("face.default_confidence", self.default_confidence, 0.0, 1.0)?;
        let f = &self.frontality_weights;
        ConfigError::check_weights("face.frontality", &[f.pitch, f.yaw, f.roll])?;
        let s = &self.selection_weights;
        ConfigError::check_weights("face.selection", &[s.frontality, s.area, s.centeredness])
    }
}

/// Output of the face stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceAnalysis {
    /// At least one usable face was found.
    pub face_detected: bool,
    /// Usable faces found.
    pub face_count: usize,
    /// Selected face box in pixels.
    pub bounding_box: Option<BoundingBox>,
    /// Selected face box as fractions of the image.
    pub normalized_box: Option<NormalizedRect>,
    /// Head orientation of the selected face.
    pub angles: Option<EulerAngles>,
    /// Frontality of the selected face.
    pub frontality: FrontalityResult,
    /// Padded crop around the selected face.
    pub region: Option<FaceRegion>,
    /// Forehead patch as fractions of the image.
    pub forehead: Option<NormalizedRect>,
    /// Detector confidence of the selected face (0 without a face).
    pub confidence: f64,
    /// User-facing messages.
    pub feedback: Vec<String>,
    /// Produced by the fallback path rather than measured.
    #[serde(default)]
    pub is_fallback: bool,
    /// The selected face with its full mesh.
    #[serde(skip)]
    pub selected_face: Option<DetectedFace>,
}

impl FaceAnalysis {
    /// Result for an image without a usable face.
    #[must_use]
    pub fn no_face() -> Self {
        let frontality = FrontalityResult::no_face();
        Self {
            face_detected: false,
            face_count: 0,
            bounding_box: None,
            normalized_box: None,
            angles: None,
            feedback: frontality.feedback.clone(),
            frontality,
            region: None,
            forehead: None,
            confidence: 0.0,
            is_fallback: false,
            selected_face: None,
        }
    }

    /// Stage score, 0–100.
    #[must_use]
    pub const fn score(&self) -> f64 {
        self.frontality.score
    }

    /// A measured face that is too far from frontal to analyze.
    #[must_use]
    pub const fn is_turned_away(&self) -> bool {
        !self.is_fallback
            && self.face_detected
            && matches!(self.frontality.verdict, FrontalityVerdict::NotFrontal)
    }
}

/// Face geometry stage.
pub struct FaceProcessor {
    config: FaceConfig,
    provider: Arc<dyn LandmarkProvider>,
}

impl FaceProcessor {
    /// Creates a processor pulling landmarks from `provider`.
    #[must_use]
    pub fn new(config: FaceConfig, provider: Arc<dyn LandmarkProvider>) -> Self {
        Self { config, provider }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &FaceConfig {
        &self.config
    }

    /// Detects faces with the provider and analyzes them.
    ///
    /// # Errors
    ///
    /// Returns an error if the landmark provider fails.
    pub fn analyze(&self, image: &RgbImageData) -> anyhow::Result<FaceAnalysis> {
        let detections = self
            .provider
            .detect_faces(image)
            .with_context(|| format!("landmark provider '{}' failed", self.provider.name()))?;
        Ok(self.analyze_detections(image, &detections))
    }

    /// Analyzes already-obtained detections.
    #[must_use]
    pub fn analyze_detections(&self, image: &RgbImageData, detections: &[RawFaceDetection]) -> FaceAnalysis {
        let (w, h) = (image.width(), image.height());
        let faces: Vec<DetectedFace> = detections
            .iter()
            .enumerate()
            .filter_map(|(i, raw)| self.build_face(i, raw, w, h))
            .collect();

        let Some(best) = select_best(&faces, w, h, &self.config) else {
            debug!(detections = detections.len(), "No usable face");
            return FaceAnalysis::no_face();
        };
        let face = faces[best].clone();

        let frontality = FrontalityResult::evaluate(face.angles, &self.config);
        let region = extract_region(image, &face, self.config.region_padding);
        let forehead = forehead_rect(&face.landmarks, w, h);

        debug!(
            faces = faces.len(),
            selected = best,
            frontality = frontality.score,
            "Face selected"
        );

        FaceAnalysis {
            face_detected: true,
            face_count: faces.len(),
            bounding_box: Some(face.bounding_box),
            normalized_box: Some(face.bounding_box.to_normalized(w, h)),
            angles: Some(face.angles),
            feedback: frontality.feedback.clone(),
            frontality,
            region,
            forehead,
            confidence: face.confidence,
            is_fallback: false,
            selected_face: Some(face),
        }
    }

    fn build_face(&self, index: usize, raw: &RawFaceDetection, width: u32, height: u32) -> Option<DetectedFace> {
        let confidence = raw
            .confidence
            .map_or(self.config.default_confidence, f64::from)
            .clamp(0.0, 1.0);
        let Some(landmarks) = FaceLandmarks::from_normalized(&raw.landmarks, width, height, confidence) else {
            warn!(
                index,
                points = raw.landmarks.len(),
                expected = LANDMARK_COUNT,
                "Ignoring detection with too few landmarks"
            );
            return None;
        };

        let bounding_box = raw.bounding_box.map_or_else(
            || {
                let (x0, y0, x1, y1) = landmarks.extent();
                BoundingBox::from_extent(x0, y0, x1, y1, width, height).padded(
                    self.config.bbox_padding / 2.0,
                    width,
                    height,
                )
            },
            |rect| rect.to_pixels(width, height),
        );
        if bounding_box.is_empty() {
            warn!(index, "Ignoring detection outside the image");
            return None;
        }

        let Some(angles) = head_pose(&landmarks, &self.config) else {
            warn!(index, "Ignoring detection with degenerate geometry");
            return None;
        };

        Some(DetectedFace {
            frontality_score: frontality_score(angles, &self.config),
            landmarks,
            bounding_box,
            angles,
            confidence,
        })
    }
}

impl QaStage for FaceProcessor {
    type Input = RgbImageData;
    type Output = FaceAnalysis;

    fn name(&self) -> &'static str {
        "face"
    }

    fn run(&self, input: &RgbImageData) -> anyhow::Result<FaceAnalysis> {
        self.analyze(input)
    }
}
