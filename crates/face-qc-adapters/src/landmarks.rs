//! Landmark sidecar files.
//!
//! An external detector can store its output next to each photo as
//! `<photo>.landmarks.json`:
//!
//! ```json
//! {"faces": [{"landmarks": [[0.5, 0.4, 0.0], ...], "confidence": 0.97}]}
//! ```
//!
//! Coordinates are normalized to the image size. An empty `faces` array
//! records that the detector ran and found nothing.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use face_qc_core::domain::RawFaceDetection;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Contents of a sidecar file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LandmarkSidecar {
    /// One entry per detected face.
    #[serde(default)]
    pub faces: Vec<RawFaceDetection>,
}

/// Sidecar path for `image`: the full file name plus `.landmarks.json`.
#[must_use]
pub fn sidecar_path(image: &Path) -> PathBuf {
    let mut name = image.file_name().map(ToOwned::to_owned).unwrap_or_default();
    name.push(".landmarks.json");
    image.with_file_name(name)
}

/// Loads the detections stored next to `image`.
///
/// Returns `Ok(None)` when there is no sidecar.
///
/// # Errors
///
/// Returns an error if the sidecar exists but cannot be read or parsed.
pub fn load_detections(image: &Path) -> Result<Option<Vec<RawFaceDetection>>> {
    let path = sidecar_path(image);
    if !path.is_file() {
        debug!(path = %path.display(), "No landmark sidecar");
        return Ok(None);
    }
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read landmark sidecar: {}", path.display()))?;
    let sidecar: LandmarkSidecar = serde_json::from_str(&text)
        .with_context(|| format!("Invalid landmark sidecar: {}", path.display()))?;
    debug!(path = %path.display(), faces = sidecar.faces.len(), "Loaded landmark sidecar");
    Ok(Some(sidecar.faces))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sidecar_path_keeps_extension() {
        assert_eq!(
            sidecar_path(Path::new("/photos/me.jpg")),
            PathBuf::from("/photos/me.jpg.landmarks.json")
        );
        assert_eq!(
            sidecar_path(Path::new("a.png")),
            PathBuf::from("a.png.landmarks.json")
        );
    }
}
