//! Integration tests for playlist enumeration.
//!
//! Runs the scanner against both the in-memory storage and a real directory
//! through `LocalFileStorage`.

use library::scanner::{collect_playlist, is_mp3, track_file_name};
use platform::mocks::MemoryStorage;
use platform::storage_local::LocalFileStorage;
use tempfile::TempDir;

#[test]
fn test_scanner_rejects_non_audio() {
    assert!(!is_mp3("cover.jpg"));
    assert!(!is_mp3("video.mp4"));
    assert!(!is_mp3("notes.txt"));
    assert!(!is_mp3(""));
}

#[test]
fn test_track_names_round_the_range() {
    let names: Vec<_> = [1u16, 10, 100]
        .into_iter()
        .filter_map(track_file_name)
        .map(|name| name.as_str().to_owned())
        .collect();
    assert_eq!(names, ["track001.mp3", "track010.mp3", "track100.mp3"]);
}

#[tokio::test]
async fn test_memory_playlist_keeps_directory_order() {
    let mut storage = MemoryStorage::new()
        .with_file("track002.mp3", b"")
        .with_file("cover.jpg", b"")
        .with_file("track001.MP3", b"")
        .with_file("album/inner.mp3", b"");
    let playlist = collect_playlist(&mut storage, "/").await.unwrap();
    assert_eq!(playlist, ["track002.mp3", "track001.MP3"]);
}

#[tokio::test]
async fn test_memory_playlist_prefixes_subdirectory() {
    let mut storage = MemoryStorage::new()
        .with_file("album/a.mp3", b"")
        .with_file("album/b.txt", b"");
    let playlist = collect_playlist(&mut storage, "album").await.unwrap();
    assert_eq!(playlist, ["album/a.mp3"]);
}

#[tokio::test]
async fn test_local_playlist_filters_extensions() {
    let tmp = TempDir::new().unwrap();
    for name in ["b.mp3", "a.Mp3", "readme.txt", "c.mp3.bak"] {
        std::fs::write(tmp.path().join(name), b"x").unwrap();
    }
    let mut storage = LocalFileStorage::mount(tmp.path().to_str().unwrap()).unwrap();
    let playlist = collect_playlist(&mut storage, "").await.unwrap();
    assert_eq!(playlist, ["a.Mp3", "b.mp3"]);
}

#[tokio::test]
async fn test_missing_directory_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let mut storage = LocalFileStorage::mount(tmp.path().to_str().unwrap()).unwrap();
    assert!(collect_playlist(&mut storage, "nope").await.is_err());
}
