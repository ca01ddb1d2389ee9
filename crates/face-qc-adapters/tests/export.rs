//! Integration tests for image export.

#![allow(clippy::unwrap_used, clippy::cast_possible_truncation)]

use face_qc_adapters::{corrected_path, load_image, save_image};
use face_qc_core::RgbImageData;

#[test]
fn test_saved_png_reloads_identically() {
    let dir = tempfile::tempdir().unwrap();
    let image = RgbImageData::from_fn(5, 3, |x, y| [x as u8 * 40, y as u8 * 80, 7]).unwrap();
    let path = corrected_path(std::path::Path::new("portrait.jpg"), &dir.path().join("out"));

    save_image(&image, &path).unwrap();

    assert!(path.ends_with("out/portrait.corrected.png"));
    let loaded = load_image(&path).unwrap();
    assert_eq!(*loaded.image, image);
}

#[test]
fn test_alpha_is_dropped_on_save() {
    let dir = tempfile::tempdir().unwrap();
    let rgba = RgbImageData::new(1, 1, 4, vec![1, 2, 3, 4]).unwrap();
    let path = dir.path().join("a.png");

    save_image(&rgba, &path).unwrap();

    let loaded = load_image(&path).unwrap();
    assert_eq!(loaded.image.channels(), 3);
    assert_eq!(loaded.image.get(0, 0), Some([1, 2, 3]));
}
