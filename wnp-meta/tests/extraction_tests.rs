//! Tag extraction against real files on disk

mod helpers;

use helpers::{generate_test_m4a, generate_test_wav, tag_file, tag_m4a, TestTags};
use id3::frame::ExtendedText;
use id3::{TagLike, Version};
use std::sync::Arc;
use tempfile::tempdir;
use wnp_common::Settings;
use wnp_meta::extractors::mp4_freeform::read_freeform;
use wnp_meta::extractors::{LoftyTagReader, SymphoniaTagReader};
use wnp_meta::{HostMetaProvider, Metadata, MetadataProcessors, TagExtractor};

struct NoHost;

impl HostMetaProvider for NoHost {
    fn gethostmeta(&self) -> Metadata {
        Metadata::new()
    }
}

#[test]
fn test_lofty_reads_id3_tags_from_wav() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tagged.wav");
    generate_test_wav(&path, 1.0).unwrap();
    tag_file(
        &path,
        &TestTags {
            title: "Purple Rain",
            artist: "Prince",
            album: "Purple Rain",
            track: 2,
            track_total: 10,
        },
    )
    .unwrap();

    let metadata = LoftyTagReader::new().extract(&path).unwrap();

    assert_eq!(metadata.get_text("title").as_deref(), Some("Purple Rain"));
    assert_eq!(metadata.get_text("artist").as_deref(), Some("Prince"));
    assert_eq!(metadata.get_text("album").as_deref(), Some("Purple Rain"));
    assert_eq!(metadata.get_text("track").as_deref(), Some("2"));
    assert_eq!(metadata.get_text("track_total").as_deref(), Some("10"));
    assert!(metadata.contains("bitrate"));
}

#[test]
fn test_user_text_frames_map_to_canonical_fields() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("usertext.wav");
    generate_test_wav(&path, 1.0).unwrap();

    let mut tag = id3::Tag::new();
    tag.set_title("Rock Lobster");
    tag.add_frame(ExtendedText {
        description: "MusicBrainz Track Id".to_string(),
        value: "8a5a3bd8-0a8f-4d1f-9a9e-1b2c3d4e5f60".to_string(),
    });
    tag.add_frame(ExtendedText {
        description: "LABEL".to_string(),
        value: "Warner Bros.".to_string(),
    });
    tag.write_to_path(&path, Version::Id3v24).unwrap();

    let metadata = LoftyTagReader::new().extract(&path).unwrap();

    assert_eq!(
        metadata.get_text("musicbrainzrecordingid").as_deref(),
        Some("8a5a3bd8-0a8f-4d1f-9a9e-1b2c3d4e5f60")
    );
    assert_eq!(metadata.get_text("label").as_deref(), Some("Warner Bros."));
}

#[test]
fn test_mp4_freeform_atoms_map_to_canonical_fields() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("freeform.m4a");
    generate_test_m4a(&path, 1).unwrap();
    tag_m4a(
        &path,
        "Rock Lobster",
        &[
            (
                "com.apple.iTunes",
                "MusicBrainz Track Id",
                "8a5a3bd8-0a8f-4d1f-9a9e-1b2c3d4e5f60",
            ),
            ("com.apple.iTunes", "LABEL", "Warner Bros."),
            // Only the iTunes namespace is consulted
            ("com.example.tagger", "Acoustid Id", "not-an-itunes-atom"),
        ],
    )
    .unwrap();

    let metadata = LoftyTagReader::new().extract(&path).unwrap();

    assert_eq!(metadata.get_text("title").as_deref(), Some("Rock Lobster"));
    assert_eq!(
        metadata.get_text("musicbrainzrecordingid").as_deref(),
        Some("8a5a3bd8-0a8f-4d1f-9a9e-1b2c3d4e5f60")
    );
    assert_eq!(metadata.get_text("label").as_deref(), Some("Warner Bros."));
    assert!(!metadata.contains("acoustidid"));
}

#[test]
fn test_mp4_freeform_reader_ignores_other_namespaces() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("namespaces.m4a");
    generate_test_m4a(&path, 1).unwrap();
    tag_m4a(
        &path,
        "Song",
        &[
            ("com.apple.iTunes", "Acoustid Id", "acoustid-1"),
            ("com.example.tagger", "LABEL", "Elsewhere"),
        ],
    )
    .unwrap();

    let pairs = read_freeform(&path).unwrap();

    assert_eq!(pairs, vec![("Acoustid Id".to_string(), "acoustid-1".to_string())]);
}

#[test]
fn test_readers_fail_on_missing_file() {
    let missing = std::path::Path::new("/nonexistent/dir/missing.flac");
    assert!(LoftyTagReader::new().extract(missing).is_err());
    assert!(SymphoniaTagReader::new().extract(missing).is_err());
}

#[tokio::test]
async fn test_pipeline_over_tagged_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pipeline.wav");
    generate_test_wav(&path, 1.0).unwrap();
    tag_file(
        &path,
        &TestTags {
            title: "Closer",
            artist: "Nine Inch Nails",
            album: "The Downward Spiral",
            track: 8,
            track_total: 14,
        },
    )
    .unwrap();

    let processors =
        MetadataProcessors::new(Arc::new(Settings::new())).with_host_meta(Arc::new(NoHost));
    let first = processors.process(Metadata::for_file(&path)).await;
    let second = processors.process(Metadata::for_file(&path)).await;

    assert_eq!(first.get_text("artist").as_deref(), Some("Nine Inch Nails"));
    assert_eq!(first.get_text("track").as_deref(), Some("8"));
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_pipeline_survives_unreadable_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("garbage.mp3");
    std::fs::write(&path, b"this is not audio").unwrap();

    let processors =
        MetadataProcessors::new(Arc::new(Settings::new())).with_host_meta(Arc::new(NoHost));
    let metadata = processors.process(Metadata::for_file(&path)).await;

    assert_eq!(metadata.len(), 1);
    assert!(metadata.contains("filename"));
}
