//! Integration tests for landmark sidecar files.

#![allow(clippy::unwrap_used)]

use face_qc_adapters::{load_detections, sidecar_path, LandmarkSidecar};
use face_qc_core::domain::LANDMARK_COUNT;
use face_qc_core::ports::SyntheticLandmarkProvider;

#[test]
fn test_missing_sidecar_is_none() {
    let dir = tempfile::tempdir().unwrap();
    assert!(load_detections(&dir.path().join("me.jpg")).unwrap().is_none());
}

#[test]
fn test_round_trip_through_file() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("me.jpg");
    let detection = SyntheticLandmarkProvider::new().detection_for(640, 480);
    let sidecar = LandmarkSidecar {
        faces: vec![detection.clone()],
    };
    std::fs::write(sidecar_path(&image), serde_json::to_string(&sidecar).unwrap()).unwrap();

    let faces = load_detections(&image).unwrap().unwrap();
    assert_eq!(faces.len(), 1);
    assert_eq!(faces[0].landmarks.len(), LANDMARK_COUNT);
    assert_eq!(faces[0], detection);
}

#[test]
fn test_optional_fields_may_be_omitted() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("me.png");
    std::fs::write(
        sidecar_path(&image),
        r#"{"faces":[{"landmarks":[[0.5,0.5,0.0]]}]}"#,
    )
    .unwrap();

    let faces = load_detections(&image).unwrap().unwrap();
    assert_eq!(faces[0].confidence, None);
    assert!(faces[0].bounding_box.is_none());
}

#[test]
fn test_empty_faces_means_no_face() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("me.png");
    std::fs::write(sidecar_path(&image), r#"{"faces":[]}"#).unwrap();
    assert_eq!(load_detections(&image).unwrap(), Some(vec![]));
}

#[test]
fn test_malformed_sidecar_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("me.png");
    std::fs::write(sidecar_path(&image), "{faces: nope").unwrap();

    let err = load_detections(&image).unwrap_err();
    assert!(format!("{err:#}").contains("me.png.landmarks.json"));
}
