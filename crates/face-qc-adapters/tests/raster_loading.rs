//! Integration tests for raster image loading.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use face_qc_adapters::{load_image, FsImageSource};
use face_qc_core::{ImageInfo, ImageSource};
use face_qc_test_support::{SyntheticImageBuilder, SKIN};
use image::ImageFormat;
use std::path::Path;

fn write_fixture(dir: &Path, name: &str, format: ImageFormat) {
    let info = SyntheticImageBuilder::uniform(8, 8, SKIN);
    SyntheticImageBuilder::to_dynamic(&info)
        .save_with_format(dir.join(name), format)
        .unwrap();
}

fn load_single(name: &str, format: ImageFormat) -> ImageInfo {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path(), name, format);
    let source = FsImageSource::new(vec![dir.path().join(name)], false);

    let images: Vec<_> = source.images().collect();
    assert_eq!(images.len(), 1);
    images.into_iter().next().unwrap().expect("should load")
}

#[test]
fn test_load_png_is_lossless() {
    let info = load_single("face.png", ImageFormat::Png);
    assert_eq!((info.width, info.height), (8, 8));
    assert!(info.path.ends_with("face.png"));
    assert_eq!(info.image.get(3, 3), Some(SKIN));
}

#[test]
fn test_load_jpeg() {
    let info = load_single("face.jpg", ImageFormat::Jpeg);
    assert_eq!((info.width, info.height), (8, 8));
    let [r, g, b] = info.image.get(4, 4).unwrap();
    assert!(r > g && g > b, "skin tone survives compression: {r} {g} {b}");
}

#[test]
fn test_load_tiff_and_bmp() {
    let tiff = load_single("face.tiff", ImageFormat::Tiff);
    assert_eq!(tiff.image.get(0, 0), Some(SKIN));
    let bmp = load_single("face.bmp", ImageFormat::Bmp);
    assert_eq!(bmp.image.get(7, 7), Some(SKIN));
}

#[test]
fn test_rgba_keeps_alpha_channel() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("alpha.png");
    image::RgbaImage::from_pixel(4, 4, image::Rgba([10, 20, 30, 128]))
        .save(&path)
        .unwrap();

    let info = load_image(&path).unwrap();
    assert_eq!(info.image.channels(), 4);
    assert_eq!(info.image.get(1, 1), Some([10, 20, 30]));
}

#[test]
fn test_grayscale_is_expanded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gray.png");
    image::GrayImage::from_pixel(4, 4, image::Luma([77])).save(&path).unwrap();

    let info = load_image(&path).unwrap();
    assert_eq!(info.image.channels(), 3);
    assert_eq!(info.image.get(0, 0), Some([77, 77, 77]));
}

#[test]
fn test_corrupt_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.jpg");
    std::fs::write(&path, b"not an image").unwrap();

    let source = FsImageSource::new(vec![path], false);
    let images: Vec<_> = source.images().collect();
    assert_eq!(images.len(), 1);
    let err = images.into_iter().next().unwrap().unwrap_err();
    assert!(err.to_string().contains("broken.jpg"));
}

#[test]
fn test_load_directory_skips_other_files() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path(), "b.png", ImageFormat::Png);
    write_fixture(dir.path(), "a.png", ImageFormat::Png);
    std::fs::write(dir.path().join("a.png.landmarks.json"), "{}").unwrap();
    std::fs::write(dir.path().join("notes.txt"), "hi").unwrap();

    let source = FsImageSource::new(vec![dir.path().to_path_buf()], false);
    assert_eq!(source.count_hint(), Some(2));

    let paths: Vec<String> = source.images().map(|r| r.unwrap().path).collect();
    assert!(paths[0].ends_with("a.png"));
    assert!(paths[1].ends_with("b.png"));
}

#[test]
fn test_recursive_scan() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("nested");
    std::fs::create_dir(&nested).unwrap();
    write_fixture(dir.path(), "top.png", ImageFormat::Png);
    write_fixture(&nested, "deep.png", ImageFormat::Png);

    let flat = FsImageSource::new(vec![dir.path().to_path_buf()], false);
    assert_eq!(flat.count_hint(), Some(1));
    let recursive = FsImageSource::new(vec![dir.path().to_path_buf()], true);
    assert_eq!(recursive.count_hint(), Some(2));
}

#[test]
fn test_missing_path_yields_nothing() {
    let source = FsImageSource::new(vec!["/definitely/not/here.png".into()], false);
    assert_eq!(source.images().count(), 0);
}
