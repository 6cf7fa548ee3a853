//! Single-threaded tests for PairedImageFolder against real files on disk.
//!
//! Tests cover:
//! - Sample counts across classes and nested folders
//! - Dropping files without a counterpart
//! - Class index assignment
//! - Empty datasets and bad indices
//! - Decoding, transforms and target transforms
//! - Reading sidecars on demand

mod common;
use common::Fixture;
use paired_folder::{
    config::PairedFolderConfig,
    transforms::{
        vision::{CenterCrop, Resize},
        FnTransform, Transform,
    },
    CounterpartKind, DatasetError, PairedImageFolder, RandomSampler, Sampler,
};

use anyhow::Result;
use image::{imageops::FilterType, DynamicImage, GenericImageView, Rgb};

fn open(fixture: &Fixture) -> paired_folder::Result<PairedImageFolder> {
    PairedImageFolder::new(&PairedFolderConfig::new(fixture.root()))
}

// ================================================================================================
// 1. Index construction
// ================================================================================================
#[test]
fn test_counts_every_complete_pair() -> Result<()> {
    let fixture = Fixture::new()?;
    for class in ["bus_stop", "curb_ramp", "obstacle"] {
        for base in ["a", "b", "c", "d"] {
            fixture.pair(class, base)?;
        }
    }

    let dataset = open(&fixture)?;
    assert_eq!(dataset.len(), 12);
    assert_eq!(dataset.targets().len(), 12);
    assert_eq!(dataset.index().class_counts(), vec![4, 4, 4]);
    assert_eq!(dataset.missing_count(), 0);
    Ok(())
}

#[test]
fn test_unpaired_files_are_excluded() -> Result<()> {
    let fixture = Fixture::new()?;
    fixture.pair("ramp", "ok")?;
    fixture.image("ramp/no_meta.jpg", 4, 4, [0, 0, 0])?;
    fixture.metadata("ramp/no_image.json", "{}")?;
    fixture.raw("ramp/readme.txt", b"ignored")?;

    let dataset = open(&fixture)?;
    assert_eq!(dataset.len(), 1);
    assert_eq!(dataset.samples()[0].image_path, fixture.root().join("ramp/ok.jpg"));

    let missing = dataset.index().missing();
    assert_eq!(missing.len(), 2);
    assert_eq!(missing[0].kind, CounterpartKind::Image);
    assert_eq!(missing[0].path, fixture.root().join("ramp/no_image.jpg"));
    assert_eq!(missing[1].kind, CounterpartKind::Metadata);
    assert_eq!(missing[1].path, fixture.root().join("ramp/no_meta.json"));
    Ok(())
}

#[test]
fn test_class_indices_follow_lexicographic_order() -> Result<()> {
    let fixture = Fixture::new()?;
    fixture.pair("dog", "1")?;
    fixture.pair("cat", "1")?;

    let dataset = open(&fixture)?;
    assert_eq!(dataset.classes(), &["cat".to_string(), "dog".to_string()]);
    assert_eq!(dataset.class_to_idx()["cat"], 0);
    assert_eq!(dataset.class_to_idx()["dog"], 1);
    assert_eq!(dataset.targets(), &[0, 1]);
    Ok(())
}

#[test]
fn test_nested_folders_are_scanned() -> Result<()> {
    let fixture = Fixture::new()?;
    fixture.pair("ramp/seattle/2019", "p1")?;
    fixture.pair("ramp", "p0")?;
    fixture.pair("ramp/dc", "p2")?;

    let dataset = open(&fixture)?;
    let images: Vec<_> = dataset
        .samples()
        .iter()
        .map(|s| s.image_path.strip_prefix(fixture.root()).unwrap().to_path_buf())
        .collect();
    assert_eq!(
        images,
        vec![
            std::path::PathBuf::from("ramp/p0.jpg"),
            std::path::PathBuf::from("ramp/dc/p2.jpg"),
            std::path::PathBuf::from("ramp/seattle/2019/p1.jpg"),
        ]
    );
    assert!(dataset.targets().iter().all(|&t| t == 0));
    Ok(())
}

#[test]
fn test_directories_are_scanned_in_full_path_order() -> Result<()> {
    let fixture = Fixture::new()?;
    fixture.pair("ramp/a/sub", "x")?;
    fixture.pair("ramp/a-b", "y")?;

    let dataset = open(&fixture)?;
    let images: Vec<_> = dataset
        .samples()
        .iter()
        .map(|s| s.image_path.strip_prefix(fixture.root()).unwrap().to_path_buf())
        .collect();
    assert_eq!(
        images,
        vec![
            std::path::PathBuf::from("ramp/a-b/y.jpg"),
            std::path::PathBuf::from("ramp/a/sub/x.jpg"),
        ]
    );
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_dangling_link_is_reported_as_missing() -> Result<()> {
    use std::os::unix::fs::symlink;

    let fixture = Fixture::new()?;
    fixture.pair("ramp", "ok")?;
    let ramp = fixture.root().join("ramp");
    symlink(ramp.join("gone.jpg"), ramp.join("dead.jpg"))?;

    let dataset = open(&fixture)?;
    assert_eq!(dataset.len(), 1);
    let missing = dataset.index().missing();
    assert_eq!(missing.len(), 2);
    assert_eq!(missing[0].kind, CounterpartKind::Image);
    assert_eq!(missing[0].path, ramp.join("dead.jpg"));
    assert_eq!(missing[1].kind, CounterpartKind::Metadata);
    assert_eq!(missing[1].path, ramp.join("dead.json"));
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_directory_link_loop_is_not_followed() -> Result<()> {
    use std::os::unix::fs::symlink;

    let fixture = Fixture::new()?;
    fixture.pair("ramp", "ok")?;
    let ramp = fixture.root().join("ramp");
    symlink(&ramp, ramp.join("loop"))?;

    let dataset = open(&fixture)?;
    assert_eq!(dataset.len(), 1);
    assert_eq!(dataset.missing_count(), 0);
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_linked_class_folder_is_scanned() -> Result<()> {
    use std::os::unix::fs::symlink;

    let fixture = Fixture::new()?;
    let outside = Fixture::new()?;
    outside.pair("shared", "s")?;
    fixture.pair("ramp", "r")?;
    symlink(outside.root().join("shared"), fixture.root().join("stop"))?;

    let dataset = open(&fixture)?;
    assert_eq!(dataset.classes(), &["ramp".to_string(), "stop".to_string()]);
    assert_eq!(dataset.targets(), &[0, 1]);
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_non_utf8_basename_is_paired() -> Result<()> {
    use std::os::unix::ffi::OsStrExt;

    let fixture = Fixture::new()?;
    fixture.pair("ramp", "ok")?;
    let ramp = fixture.root().join("ramp");
    let image = ramp.join(std::ffi::OsStr::from_bytes(b"caf\xe9.jpg"));
    let metadata = ramp.join(std::ffi::OsStr::from_bytes(b"caf\xe9.json"));
    // some filesystems refuse names that are not valid UTF-8
    if std::fs::copy(ramp.join("ok.jpg"), &image).is_err() {
        return Ok(());
    }
    std::fs::write(&metadata, "{}")?;

    let dataset = open(&fixture)?;
    assert_eq!(dataset.len(), 2);
    assert_eq!(dataset.missing_count(), 0);
    assert!(dataset.samples().iter().any(|s| s.image_path == image));
    Ok(())
}

#[test]
fn test_no_pairs_fails_with_configuration_error() -> Result<()> {
    let fixture = Fixture::new()?;
    fixture.image("ramp/only.jpg", 2, 2, [1, 2, 3])?;

    match open(&fixture) {
        Err(DatasetError::NoSamples { root, extensions }) => {
            assert_eq!(root, fixture.root());
            assert_eq!(extensions, vec![".jpg".to_string(), ".json".to_string()]);
        }
        other => panic!("expected NoSamples, got {:?}", other.map(|d| d.len())),
    }
    Ok(())
}

#[test]
fn test_missing_root_is_an_io_error() {
    let result = PairedImageFolder::new(&PairedFolderConfig::new("/definitely/not/here"));
    assert!(matches!(result, Err(DatasetError::Io { .. })));
}

#[test]
fn test_round_trip_two_classes() -> Result<()> {
    let fixture = Fixture::new()?;
    fixture.pair("catB", "x")?;
    fixture.pair("catA", "x")?;

    let dataset = open(&fixture)?;
    assert_eq!(dataset.len(), 2);
    let (image, target) = dataset.get(0)?;
    assert_eq!(target, 0);
    assert_eq!(image.dimensions(), (8, 6));
    assert_eq!(dataset.get(1)?.1, 1);
    Ok(())
}

// ================================================================================================
// 2. Retrieval
// ================================================================================================
#[test]
fn test_get_decodes_rgb() -> Result<()> {
    let fixture = Fixture::new()?;
    fixture.pair("ramp", "a")?;

    let dataset = open(&fixture)?;
    let (image, _) = dataset.get(0)?;
    assert!(matches!(image, DynamicImage::ImageRgb8(_)));
    let Rgb([r, g, b]) = *image.to_rgb8().get_pixel(4, 3);
    // JPEG is lossy; the colour only has to be close
    assert!(r > 150 && g < 90 && b < 90);
    Ok(())
}

#[test]
fn test_out_of_range_index() -> Result<()> {
    let fixture = Fixture::new()?;
    fixture.pair("ramp", "a")?;
    fixture.pair("ramp", "b")?;

    let dataset = open(&fixture)?;
    assert!(matches!(
        dataset.get(dataset.len()),
        Err(DatasetError::IndexOutOfRange { index: 2, len: 2 })
    ));
    assert!(matches!(
        dataset.read_metadata(5),
        Err(DatasetError::IndexOutOfRange { .. })
    ));
    Ok(())
}

#[test]
fn test_corrupt_image_is_a_decode_error() -> Result<()> {
    let fixture = Fixture::new()?;
    fixture.raw("ramp/bad.jpg", b"\xff\xd8 truncated")?;
    fixture.metadata("ramp/bad.json", "{}")?;

    let dataset = open(&fixture)?;
    assert_eq!(dataset.len(), 1);
    match dataset.get(0) {
        Err(DatasetError::Decode { path, .. }) => {
            assert_eq!(path, fixture.root().join("ramp/bad.jpg"))
        }
        other => panic!("expected Decode, got {:?}", other.map(|(_, t)| t)),
    }
    Ok(())
}

#[test]
fn test_resize_transform_gives_exact_dimensions() -> Result<()> {
    let fixture = Fixture::new()?;
    fixture.image("ramp/wide.jpg", 40, 10, [10, 200, 10])?;
    fixture.metadata("ramp/wide.json", "{}")?;

    let dataset = open(&fixture)?.with_transform(Resize::new(16, 16, FilterType::Triangle)?);
    let (image, _) = dataset.get(0)?;
    assert_eq!(image.dimensions(), (16, 16));
    Ok(())
}

#[test]
fn test_transform_pipeline_and_target_transform() -> Result<()> {
    let fixture = Fixture::new()?;
    fixture.image("a/s.jpg", 30, 20, [0, 0, 0])?;
    fixture.metadata("a/s.json", "{}")?;
    fixture.image("b/s.jpg", 30, 20, [0, 0, 0])?;
    fixture.metadata("b/s.json", "{}")?;

    let pipeline = Resize::new(24, 24, FilterType::Nearest)?.then(CenterCrop::new(10, 12)?);
    let dataset = open(&fixture)?
        .with_transform(pipeline)
        .with_target_transform(FnTransform::new("OneHotOffset", |t: usize| -> Result<usize> {
            Ok(100 + t)
        }));

    let (image, target) = dataset.get(1)?;
    assert_eq!(image.dimensions(), (10, 12));
    assert_eq!(target, 101);
    // the index itself is untouched by target transforms
    assert_eq!(dataset.targets(), &[0, 1]);
    Ok(())
}

#[test]
fn test_failing_transform_is_reported_with_index() -> Result<()> {
    let fixture = Fixture::new()?;
    fixture.pair("ramp", "a")?;

    let dataset = open(&fixture)?.with_transform(CenterCrop::new(100, 100)?);
    assert!(matches!(
        dataset.get(0),
        Err(DatasetError::Transform { index: 0, .. })
    ));
    Ok(())
}

#[test]
fn test_describe_lists_transforms() -> Result<()> {
    let fixture = Fixture::new()?;
    fixture.pair("ramp", "a")?;

    let dataset = open(&fixture)?.with_transform(Resize::new(4, 4, FilterType::Nearest)?);
    let text = dataset.describe();
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines[0], "Dataset PairedImageFolder");
    assert_eq!(lines[1], "    Number of datapoints: 1");
    assert_eq!(
        lines[2],
        format!("    Root Location: {}", fixture.root().display())
    );
    assert_eq!(
        lines[3],
        "    Transforms (if any): Resize(size=(4, 4), filter=Nearest)"
    );
    assert_eq!(lines[4], "    Target Transforms (if any): None");
    Ok(())
}

#[test]
fn test_read_metadata() -> Result<()> {
    let fixture = Fixture::new()?;
    fixture.pair("ramp", "pano_7")?;
    fixture.image("ramp/broken.jpg", 2, 2, [0, 0, 0])?;
    fixture.metadata("ramp/broken.json", "{ not json")?;

    let dataset = open(&fixture)?;
    // samples: broken, pano_7
    let value = dataset.read_metadata(1)?;
    assert_eq!(value["pano_id"], "pano_7");
    assert_eq!(value["label"], "ramp");
    assert!(matches!(
        dataset.read_metadata(0),
        Err(DatasetError::Metadata { .. })
    ));
    Ok(())
}

#[test]
fn test_custom_extensions_from_config() -> Result<()> {
    let fixture = Fixture::new()?;
    fixture.image("ramp/a.png", 3, 3, [9, 9, 9])?;
    fixture.metadata("ramp/a.meta", "{}")?;
    fixture.pair("ramp", "b")?;

    let config = PairedFolderConfig::builder(fixture.root())
        .image_extension(".png")
        .metadata_extension("meta")
        .build()?;
    let dataset = PairedImageFolder::new(&config)?;
    assert_eq!(dataset.len(), 1);
    assert_eq!(dataset.get(0)?.0.dimensions(), (3, 3));
    Ok(())
}

// ================================================================================================
// 3. Sampling
// ================================================================================================
#[test]
fn test_random_sampler_visits_every_sample() -> Result<()> {
    let fixture = Fixture::new()?;
    for base in ["a", "b", "c", "d", "e"] {
        fixture.pair("x", base)?;
    }
    let dataset = open(&fixture)?;

    let sampler = RandomSampler::new(dataset.len(), false, None, 7)?;
    let mut seen: Vec<usize> = sampler.iter(0).collect();
    for &i in &seen {
        dataset.get(i)?;
    }
    seen.sort();
    assert_eq!(seen, vec![0, 1, 2, 3, 4]);
    Ok(())
}
