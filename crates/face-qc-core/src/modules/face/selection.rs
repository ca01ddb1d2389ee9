//! Picking one face when several are detected.

use super::FaceConfig;
use crate::domain::DetectedFace;

/// Selection score in `[0, 1]`: frontality, relative size (capped) and
/// closeness to the image center, weighted by the config.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn selection_score(face: &DetectedFace, image_width: u32, image_height: u32, config: &FaceConfig) -> f64 {
    let w = &config.selection_weights;
    let weight_sum = w.frontality + w.area + w.centeredness;
    if weight_sum <= 0.0 {
        return 0.0;
    }

    let image_area = (f64::from(image_width) * f64::from(image_height)).max(1.0);
    let cap = config.max_area_ratio.max(f64::EPSILON);
    let area = ((face.bounding_box.area() as f64 / image_area).min(cap)) / cap;

    let (fx, fy) = face.bounding_box.center();
    let (cx, cy) = (f64::from(image_width) / 2.0, f64::from(image_height) / 2.0);
    let half_diagonal = cx.hypot(cy).max(f64::EPSILON);
    let centeredness = (1.0 - (fx - cx).hypot(fy - cy) / half_diagonal).clamp(0.0, 1.0);

    let frontality = (face.frontality_score / 100.0).clamp(0.0, 1.0);

    (w.frontality * frontality + w.area * area + w.centeredness * centeredness) / weight_sum
}

/// Index of the best face; the first one wins ties.
#[must_use]
pub fn select_best(faces: &[DetectedFace], image_width: u32, image_height: u32, config: &FaceConfig) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, face) in faces.iter().enumerate() {
        let score = selection_score(face, image_width, image_height, config);
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((i, score));
        }
    }
    best.map(|(i, _)| i)
}
