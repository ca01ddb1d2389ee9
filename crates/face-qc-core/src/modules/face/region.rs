//! Face region and forehead extraction.

use std::sync::Arc;

use crate::domain::{
    landmark_index as idx, BoundingBox, DetectedFace, FaceLandmarks, FaceRegion, NormalizedRect,
    RgbImageData,
};

/// Crops the padded face box into its own buffer and rebases the landmarks.
///
/// Returns `None` if the padded box falls outside the image.
#[must_use]
pub fn extract_region(image: &RgbImageData, face: &DetectedFace, padding: f64) -> Option<FaceRegion> {
    let (w, h) = (image.width(), image.height());
    let bounding_box = face.bounding_box.padded(padding, w, h);
    let cropped = image.crop(bounding_box).ok()?;
    Some(FaceRegion {
        bounding_box,
        normalized: bounding_box.to_normalized(w, h),
        image: Some(Arc::new(cropped)),
        landmarks: Some(
            face.landmarks
                .rebased(f64::from(bounding_box.x), f64::from(bounding_box.y)),
        ),
    })
}

/// Forehead patch between the hairline landmark and the brow arches, spanning
/// the outer brow ends.
#[must_use]
pub fn forehead_rect(landmarks: &FaceLandmarks, image_width: u32, image_height: u32) -> Option<NormalizedRect> {
    let top = landmarks.point(idx::FOREHEAD)?;
    let left_arch = landmarks.point(idx::LEFT_BROW_ARCH)?;
    let right_arch = landmarks.point(idx::RIGHT_BROW_ARCH)?;
    let left_outer = landmarks.point(idx::LEFT_BROW_OUTER)?;
    let right_outer = landmarks.point(idx::RIGHT_BROW_OUTER)?;

    let min_x = left_outer.x.min(right_outer.x);
    let max_x = left_outer.x.max(right_outer.x);
    let min_y = top.y;
    let max_y = left_arch.y.min(right_arch.y);
    if !(max_x > min_x && max_y > min_y) {
        return None;
    }
    let bbox = BoundingBox::from_extent(min_x, min_y, max_x, max_y, image_width, image_height);
    (!bbox.is_empty()).then(|| bbox.to_normalized(image_width, image_height))
}
