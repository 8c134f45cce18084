//! End-to-end tag extraction against real files.
//!
//! Uses tempfiles and `LocalFileStorage`, the same `Storage` seam the player
//! reads the card through.

use library::id3::{read_field, read_v1, read_v2, skip_offset, TagError, TagField};
use platform::storage_local::LocalFileStorage;
use platform::Storage;
use tempfile::TempDir;

fn synchsafe(size: u32) -> [u8; 4] {
    [
        ((size >> 21) & 0x7F) as u8,
        ((size >> 14) & 0x7F) as u8,
        ((size >> 7) & 0x7F) as u8,
        (size & 0x7F) as u8,
    ]
}

/// ID3v2.2 tag holding `TT2` and `TP1` text frames (Latin-1 encoding byte).
fn v22_tag(title: &[u8], artist: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    for (id, text) in [(b"TT2", title), (b"TP1", artist)] {
        body.extend_from_slice(id);
        let len = (text.len() + 1) as u32;
        body.extend_from_slice(&len.to_be_bytes()[1..]);
        body.push(0x00);
        body.extend_from_slice(text);
    }
    let mut tag = b"ID3\x02\x00\x00".to_vec();
    tag.extend_from_slice(&synchsafe(body.len() as u32));
    tag.extend_from_slice(&body);
    tag
}

/// ID3v2.3 tag holding `TIT2`, `TPE1` and `TALB` text frames.
fn v23_tag(title: &[u8], artist: &[u8], album: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    for (id, text) in [(b"TIT2", title), (b"TPE1", artist), (b"TALB", album)] {
        body.extend_from_slice(id);
        body.extend_from_slice(&(text.len() as u32).to_be_bytes());
        body.extend_from_slice(&[0, 0]);
        body.extend_from_slice(text);
    }
    let mut tag = b"ID3\x03\x00\x00".to_vec();
    tag.extend_from_slice(&synchsafe(body.len() as u32));
    tag.extend_from_slice(&body);
    tag
}

/// 128-byte ID3v1 trailer with space-padded slots.
fn v1_trailer(title: &str, artist: &str, album: &str) -> Vec<u8> {
    let mut t = b"TAG".to_vec();
    for field in [title, artist, album] {
        let mut slot = [b' '; 30];
        slot[..field.len()].copy_from_slice(field.as_bytes());
        t.extend_from_slice(&slot);
    }
    t.resize(128, 0);
    t
}

fn audio(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8 | 0x80).collect()
}

async fn open(dir: &TempDir, name: &str, bytes: &[u8]) -> platform::storage_local::LocalFile {
    std::fs::write(dir.path().join(name), bytes).unwrap();
    let mut storage = LocalFileStorage::mount(dir.path().to_str().unwrap()).unwrap();
    storage.open_file(name).await.unwrap()
}

#[tokio::test]
async fn test_v1_fields_are_exact_30_byte_slots() {
    let tmp = TempDir::new().unwrap();
    let mut bytes = audio(1000);
    bytes.extend(v1_trailer("Title", "Artist", "Album"));
    let mut file = open(&tmp, "v1.mp3", &bytes).await;

    let title = read_v1(&mut file, TagField::Title).await.unwrap().unwrap();
    assert_eq!(title.as_bytes().len(), 30);
    assert_eq!(&title.as_bytes()[..5], b"Title");
    assert_eq!(title.text(), "Title");

    let artist = read_v1(&mut file, TagField::Artist).await.unwrap().unwrap();
    assert_eq!(artist.text(), "Artist");
    let album = read_v1(&mut file, TagField::Album).await.unwrap().unwrap();
    assert_eq!(album.text(), "Album");
}

#[tokio::test]
async fn test_v1_absent_without_marker() {
    let tmp = TempDir::new().unwrap();
    let mut bytes = audio(1000);
    let mut trailer = v1_trailer("Title", "Artist", "Album");
    trailer[0] = b'X';
    bytes.extend(trailer);
    let mut file = open(&tmp, "nov1.mp3", &bytes).await;
    assert_eq!(read_v1(&mut file, TagField::Title).await.unwrap(), None);
}

#[tokio::test]
async fn test_v22_frames_skip_encoding_byte() {
    let tmp = TempDir::new().unwrap();
    let mut bytes = v22_tag(b"Short Title", b"Someone");
    bytes.extend(audio(512));
    let mut file = open(&tmp, "v22.mp3", &bytes).await;

    let title = read_v2(&mut file, TagField::Title).await.unwrap().unwrap();
    assert_eq!(title.as_bytes(), b"Short Title");
    let artist = read_v2(&mut file, TagField::Artist).await.unwrap().unwrap();
    assert_eq!(artist.as_bytes(), b"Someone");
    assert_eq!(read_v2(&mut file, TagField::Album).await.unwrap(), None);
}

#[tokio::test]
async fn test_v23_frames_yield_declared_length() {
    let tmp = TempDir::new().unwrap();
    let mut bytes = v23_tag(b"\0A Song", b"\0A Band", b"\0A Record");
    bytes.extend(audio(512));
    let mut file = open(&tmp, "v23.mp3", &bytes).await;

    let album = read_v2(&mut file, TagField::Album).await.unwrap().unwrap();
    assert_eq!(album.as_bytes(), b"\0A Record");
    assert_eq!(album.text(), "A Record");
    let artist = read_v2(&mut file, TagField::Artist).await.unwrap().unwrap();
    assert_eq!(artist.text(), "A Band");
}

#[tokio::test]
async fn test_v1_wins_over_v2() {
    let tmp = TempDir::new().unwrap();
    let mut bytes = v23_tag(b"\0From v2", b"\0x", b"\0y");
    bytes.extend(audio(300));
    bytes.extend(v1_trailer("From v1", "", ""));
    let mut file = open(&tmp, "both.mp3", &bytes).await;

    let title = read_field(&mut file, TagField::Title).await.unwrap().unwrap();
    assert_eq!(title.text(), "From v1");
}

#[tokio::test]
async fn test_falls_back_to_v2() {
    let tmp = TempDir::new().unwrap();
    let mut bytes = v23_tag(b"\0Only v2", b"\0x", b"\0y");
    bytes.extend(audio(300));
    let mut file = open(&tmp, "v2only.mp3", &bytes).await;

    let title = read_field(&mut file, TagField::Title).await.unwrap().unwrap();
    assert_eq!(title.text(), "Only v2");
}

#[tokio::test]
async fn test_untagged_file_has_no_fields() {
    let tmp = TempDir::new().unwrap();
    let mut file = open(&tmp, "plain.mp3", &audio(4096)).await;
    assert_eq!(read_field(&mut file, TagField::Artist).await.unwrap(), None);
    assert_eq!(skip_offset(&mut file).await.unwrap(), 0);
}

#[tokio::test]
async fn test_v24_reports_version() {
    let tmp = TempDir::new().unwrap();
    let mut bytes = v23_tag(b"\0x", b"\0y", b"\0z");
    bytes[3] = 4;
    let mut file = open(&tmp, "v24.mp3", &bytes).await;
    let err = read_field(&mut file, TagField::Title).await.unwrap_err();
    assert!(matches!(err, TagError::UnsupportedVersion(4)));
}

#[tokio::test]
async fn test_skip_offset_lands_on_audio() {
    let tmp = TempDir::new().unwrap();
    let tag = v22_tag(b"T", b"A");
    let mut bytes = tag.clone();
    bytes.extend(audio(64));
    let mut file = open(&tmp, "skip.mp3", &bytes).await;
    assert_eq!(skip_offset(&mut file).await.unwrap(), tag.len() as u64);
}
