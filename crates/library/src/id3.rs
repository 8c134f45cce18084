//! ID3 tags: title, artist and album lookup in MP3 files.
//!
//! Three dialects are understood:
//!
//! | Dialect  | Location             | Frame ids            | Length field              |
//! |----------|----------------------|----------------------|---------------------------|
//! | ID3v1    | last 128 bytes       | fixed 30-byte slots  | none                      |
//! | ID3v2.2  | file start, "ID3" 2  | `TT2` `TP1` `TAL`    | 3 bytes BE, incl. encoding|
//! | ID3v2.3  | file start, "ID3" 3  | `TIT2` `TPE1` `TALB` | 4 bytes BE, + 2 flag bytes|
//!
//! The functions here only move the file cursor; restoring it is the
//! caller's job.

use alloc::string::String;
use alloc::vec::Vec;

use platform::storage::{read_full, File};

/// Size of the ID3v1 trailer.
pub const ID3V1_LEN: u64 = 128;

/// Width of each ID3v1 text slot.
pub const ID3V1_FIELD_LEN: usize = 30;

/// Size of the ID3v2 header.
pub const ID3V2_HEADER_LEN: usize = 10;

/// Text field to look up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagField {
    /// Song title
    Title,
    /// Performer
    Artist,
    /// Album
    Album,
}

impl TagField {
    /// Offset of the ID3v1 slot, counted from the end of the `TAG` marker.
    pub const fn v1_offset(self) -> u64 {
        match self {
            Self::Title => 0,
            Self::Artist => 30,
            Self::Album => 60,
        }
    }

    /// ID3v2.2 frame id.
    pub const fn v22_id(self) -> [u8; 3] {
        match self {
            Self::Title => *b"TT2",
            Self::Artist => *b"TP1",
            Self::Album => *b"TAL",
        }
    }

    /// ID3v2.3 frame id.
    pub const fn v23_id(self) -> [u8; 4] {
        match self {
            Self::Title => *b"TIT2",
            Self::Artist => *b"TPE1",
            Self::Album => *b"TALB",
        }
    }
}

/// Decode a 28-bit synchsafe integer (7 bits per byte, MSB first).
///
/// The top bit of each byte is ignored.
pub fn decode_synchsafe(bytes: [u8; 4]) -> u32 {
    bytes
        .iter()
        .fold(0u32, |acc, b| (acc << 7) | u32::from(b & 0x7F))
}

/// ID3v2 header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Id3v2Header {
    /// Major version (2, 3, 4...)
    pub version: u8,
    /// Revision
    pub revision: u8,
    /// Header flags
    pub flags: u8,
    /// Tag size excluding the header
    pub size: u32,
}

impl Id3v2Header {
    /// Parse the first ten bytes of a file; `None` without the `ID3` marker.
    pub fn parse(raw: &[u8; ID3V2_HEADER_LEN]) -> Option<Self> {
        match *raw {
            [b'I', b'D', b'3', version, revision, flags, s0, s1, s2, s3] => Some(Self {
                version,
                revision,
                flags,
                size: decode_synchsafe([s0, s1, s2, s3]),
            }),
            _ => None,
        }
    }

    /// File offset of the first byte after the tag.
    pub fn end_offset(&self) -> u64 {
        u64::from(self.size).saturating_add(ID3V2_HEADER_LEN as u64)
    }
}

/// Tag lookup failure.
#[derive(Debug, thiserror::Error)]
pub enum TagError<E> {
    /// Read or seek failed.
    #[error("storage error: {0:?}")]
    Storage(E),
    /// ID3v2 tag of a version other than 2 or 3.
    #[error("unsupported ID3v2 version {0}")]
    UnsupportedVersion(u8),
}

impl<E> From<E> for TagError<E> {
    fn from(e: E) -> Self {
        Self::Storage(e)
    }
}

/// Raw field content as stored in the file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TagValue(Vec<u8>);

impl TagValue {
    /// The raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Take the raw bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Latin-1 text with NUL and space padding trimmed from both ends.
    pub fn text(&self) -> String {
        let decoded: String = self.0.iter().map(|&b| char::from(b)).collect();
        String::from(decoded.trim_matches(|c| c == '\0' || c == ' '))
    }
}

impl From<Vec<u8>> for TagValue {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

/// Look up `field` in the ID3v1 trailer.
///
/// Returns the 30 raw bytes of the slot, or `None` when the file is shorter
/// than the trailer or the trailer lacks the `TAG` marker.
pub async fn read_v1<F: File>(file: &mut F, field: TagField) -> Result<Option<TagValue>, F::Error> {
    let Some(start) = file.size().checked_sub(ID3V1_LEN) else {
        return Ok(None);
    };
    file.seek(start).await?;
    let mut marker = [0u8; 3];
    if read_full(file, &mut marker).await? < marker.len() || &marker != b"TAG" {
        return Ok(None);
    }

    file.seek(start.saturating_add(3).saturating_add(field.v1_offset()))
        .await?;
    let mut slot = [0u8; ID3V1_FIELD_LEN];
    let n = read_full(file, &mut slot).await?;
    let bytes = slot.get(..n).unwrap_or_default();
    tracing::debug!(?field, "ID3v1 field found");
    Ok(Some(TagValue(Vec::from(bytes))))
}

/// Look up `field` in a leading ID3v2.2 or ID3v2.3 tag.
///
/// Scans forward from the end of the header to end of file.
pub async fn read_v2<F: File>(
    file: &mut F,
    field: TagField,
) -> Result<Option<TagValue>, TagError<F::Error>> {
    let Some(header) = read_header(file).await? else {
        return Ok(None);
    };
    let mut reader = ByteReader::new(file);
    let value = match header.version {
        2 => find_v22(&mut reader, field).await?,
        3 => find_v23(&mut reader, field).await?,
        v => {
            tracing::warn!(version = v, "unsupported ID3v2 version");
            return Err(TagError::UnsupportedVersion(v));
        }
    };
    if value.is_some() {
        tracing::debug!(?field, version = header.version, "ID3v2 frame found");
    }
    Ok(value)
}

/// Look up `field`, trying the ID3v1 trailer before a leading ID3v2 tag.
pub async fn read_field<F: File>(
    file: &mut F,
    field: TagField,
) -> Result<Option<TagValue>, TagError<F::Error>> {
    if let Some(value) = read_v1(file, field).await? {
        return Ok(Some(value));
    }
    read_v2(file, field).await
}

/// Offset of the first audio frame: past a leading ID3v2 tag, else 0.
pub async fn skip_offset<F: File>(file: &mut F) -> Result<u64, F::Error> {
    Ok(read_header(file)
        .await?
        .map_or(0, |header| header.end_offset()))
}

async fn read_header<F: File>(file: &mut F) -> Result<Option<Id3v2Header>, F::Error> {
    file.seek(0).await?;
    let mut raw = [0u8; ID3V2_HEADER_LEN];
    if read_full(file, &mut raw).await? < ID3V2_HEADER_LEN {
        return Ok(None);
    }
    Ok(Id3v2Header::parse(&raw))
}

async fn find_v22<F: File>(
    reader: &mut ByteReader<'_, F>,
    field: TagField,
) -> Result<Option<TagValue>, F::Error> {
    let id = field.v22_id();
    let mut window = [0u8; 3];
    while let Some(b) = reader.next_byte().await? {
        window.rotate_left(1);
        if let Some(last) = window.last_mut() {
            *last = b;
        }
        if window == id {
            // 3-byte length, then the text encoding byte it includes
            let mut head = [0u8; 4];
            if reader.fill(&mut head).await? < head.len() {
                return Ok(None);
            }
            let [l0, l1, l2, _encoding] = head;
            let len = u32::from_be_bytes([0, l0, l1, l2]).saturating_sub(1);
            return reader.take(len).await.map(Some);
        }
    }
    Ok(None)
}

async fn find_v23<F: File>(
    reader: &mut ByteReader<'_, F>,
    field: TagField,
) -> Result<Option<TagValue>, F::Error> {
    let id = field.v23_id();
    let mut window = [0u8; 4];
    while let Some(b) = reader.next_byte().await? {
        window.rotate_left(1);
        if let Some(last) = window.last_mut() {
            *last = b;
        }
        if window == id {
            // 4-byte length, then 2 flag bytes
            let mut head = [0u8; 6];
            if reader.fill(&mut head).await? < head.len() {
                return Ok(None);
            }
            let [l0, l1, l2, l3, _, _] = head;
            let len = u32::from_be_bytes([l0, l1, l2, l3]);
            return reader.take(len).await.map(Some);
        }
    }
    Ok(None)
}

/// Buffered forward reader for the frame scan.
struct ByteReader<'f, F> {
    file: &'f mut F,
    buf: [u8; 64],
    len: usize,
    pos: usize,
}

impl<'f, F: File> ByteReader<'f, F> {
    fn new(file: &'f mut F) -> Self {
        Self {
            file,
            buf: [0; 64],
            len: 0,
            pos: 0,
        }
    }

    async fn next_byte(&mut self) -> Result<Option<u8>, F::Error> {
        if self.pos >= self.len {
            self.len = self.file.read(&mut self.buf).await?;
            self.pos = 0;
        }
        let b = self.buf.get(self.pos).copied().filter(|_| self.pos < self.len);
        if b.is_some() {
            self.pos = self.pos.saturating_add(1);
        }
        Ok(b)
    }

    /// Fill `out` as far as the file allows.
    async fn fill(&mut self, out: &mut [u8]) -> Result<usize, F::Error> {
        let mut n: usize = 0;
        for slot in out.iter_mut() {
            match self.next_byte().await? {
                Some(b) => *slot = b,
                None => break,
            }
            n = n.saturating_add(1);
        }
        Ok(n)
    }

    /// Collect up to `len` bytes, stopping early at end of file.
    async fn take(&mut self, len: u32) -> Result<TagValue, F::Error> {
        let mut bytes = Vec::new();
        let mut remaining = len;
        while remaining > 0 {
            let Some(b) = self.next_byte().await? else { break };
            bytes.push(b);
            remaining = remaining.saturating_sub(1);
        }
        Ok(TagValue(bytes))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use platform::mocks::MemoryStorage;
    use platform::Storage;

    fn v23_tag(id: &[u8; 4], content: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(id);
        body.extend_from_slice(&(content.len() as u32).to_be_bytes());
        body.extend_from_slice(&[0, 0]);
        body.extend_from_slice(content);
        let mut tag = Vec::from(*b"ID3\x03\x00\x00");
        let size = body.len() as u32;
        tag.extend_from_slice(&[
            ((size >> 21) & 0x7F) as u8,
            ((size >> 14) & 0x7F) as u8,
            ((size >> 7) & 0x7F) as u8,
            (size & 0x7F) as u8,
        ]);
        tag.extend_from_slice(&body);
        tag
    }

    async fn open(bytes: &[u8]) -> platform::mocks::MemoryFile {
        let mut storage = MemoryStorage::new().with_file("t.mp3", bytes);
        storage.open_file("t.mp3").await.unwrap()
    }

    #[test]
    fn synchsafe_decodes_257() {
        assert_eq!(decode_synchsafe([0x00, 0x00, 0x02, 0x01]), 257);
    }

    #[test]
    fn header_parse_requires_marker() {
        assert!(Id3v2Header::parse(b"ID4\x03\x00\x00\x00\x00\x00\x00").is_none());
        let h = Id3v2Header::parse(b"ID3\x03\x00\x00\x00\x00\x02\x01").unwrap();
        assert_eq!((h.version, h.size, h.end_offset()), (3, 257, 267));
    }

    #[test]
    fn text_trims_padding() {
        let v = TagValue::from(Vec::from(*b"\0Hello \0\0"));
        assert_eq!(v.text(), "Hello");
        let v = TagValue::from(Vec::from([b'C', 0xE9]));
        assert_eq!(v.text(), "C\u{e9}");
    }

    #[tokio::test]
    async fn v23_title_includes_encoding_byte() {
        let mut bytes = v23_tag(b"TIT2", b"\0Song");
        bytes.extend_from_slice(&[0xFF; 64]);
        let mut file = open(&bytes).await;
        let v = read_v2(&mut file, TagField::Title).await.unwrap().unwrap();
        assert_eq!(v.as_bytes(), b"\0Song");
        assert_eq!(v.text(), "Song");
    }

    #[tokio::test]
    async fn v23_missing_frame_is_absent() {
        let bytes = v23_tag(b"TIT2", b"\0Song");
        let mut file = open(&bytes).await;
        assert_eq!(read_v2(&mut file, TagField::Album).await.unwrap(), None);
    }

    #[tokio::test]
    async fn v4_tag_is_unsupported() {
        let mut bytes = v23_tag(b"TIT2", b"\0Song");
        bytes[3] = 4;
        let mut file = open(&bytes).await;
        let err = read_v2(&mut file, TagField::Title).await.unwrap_err();
        assert!(matches!(err, TagError::UnsupportedVersion(4)));
    }

    #[tokio::test]
    async fn short_file_has_no_trailer() {
        let mut file = open(b"TAG tiny").await;
        assert_eq!(read_v1(&mut file, TagField::Title).await.unwrap(), None);
    }

    #[tokio::test]
    async fn skip_offset_without_tag_is_zero() {
        let mut file = open(&[0xFF, 0xFB, 0x90, 0x00]).await;
        assert_eq!(skip_offset(&mut file).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn skip_offset_past_header() {
        let bytes = v23_tag(b"TALB", b"\0Album");
        let len = bytes.len() as u64;
        let mut file = open(&bytes).await;
        assert_eq!(skip_offset(&mut file).await.unwrap(), len);
    }

    proptest::proptest! {
        #[test]
        fn synchsafe_matches_weighted_sum(b0 in 0u8..128, b1 in 0u8..128, b2 in 0u8..128, b3 in 0u8..128) {
            let expected = (u32::from(b0) << 21) | (u32::from(b1) << 14) | (u32::from(b2) << 7) | u32::from(b3);
            proptest::prop_assert_eq!(decode_synchsafe([b0, b1, b2, b3]), expected);
        }
    }
}
