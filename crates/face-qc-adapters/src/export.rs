//! Writing images back to disk.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use face_qc_core::RgbImageData;
use image::ImageFormat;
use tracing::debug;

/// Where the corrected version of `source` goes inside `out_dir`.
///
/// `portrait.jpg` becomes `<out_dir>/portrait.corrected.png`.
#[must_use]
pub fn corrected_path(source: &Path, out_dir: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map_or_else(|| "image".into(), |s| s.to_string_lossy());
    out_dir.join(format!("{stem}.corrected.png"))
}

/// Saves `image` as PNG, creating parent directories. Alpha is dropped.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be written.
pub fn save_image(image: &RgbImageData, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    image
        .to_rgb_image()
        .save_with_format(path, ImageFormat::Png)
        .with_context(|| format!("Failed to write image: {}", path.display()))?;
    debug!(path = %path.display(), "Saved image");
    Ok(())
}
