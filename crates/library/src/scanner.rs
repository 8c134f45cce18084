//! Scanner: finds playable files and builds track names.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::Write;

use platform::storage::Storage;

/// Longest name produced by [`track_file_name`] (`track999.mp3`).
pub const TRACK_NAME_LEN: usize = 12;

/// Highest number [`track_file_name`] accepts.
pub const MAX_TRACK_NUMBER: u16 = 999;

/// Returns `true` when `name` ends in `.mp3` and has a non-empty stem.
///
/// The comparison is **case-insensitive** and does not allocate.
pub fn is_mp3(name: &str) -> bool {
    name.len()
        .checked_sub(4)
        .filter(|&stem| stem > 0)
        .and_then(|stem| name.get(stem..))
        .is_some_and(|ext| ext.eq_ignore_ascii_case(".mp3"))
}

/// `trackNNN.mp3` for `n` in `0..=999`, zero padded to three digits.
pub fn track_file_name(n: u16) -> Option<heapless::String<TRACK_NAME_LEN>> {
    if n > MAX_TRACK_NUMBER {
        return None;
    }
    let mut name = heapless::String::new();
    write!(name, "track{n:03}.mp3").ok()?;
    Some(name)
}

/// Every `.mp3` entry of `dir`, in directory order, as paths that can be
/// passed straight to [`Storage::open_file`].
pub async fn collect_playlist<S: Storage>(storage: &mut S, dir: &str) -> Result<Vec<String>, S::Error> {
    let prefix = dir.trim_matches('/');
    let mut tracks = Vec::new();
    storage
        .read_dir(dir, &mut |name: &str| {
            if !is_mp3(name) {
                return;
            }
            let mut path = String::with_capacity(prefix.len().saturating_add(name.len()).saturating_add(1));
            if !prefix.is_empty() {
                path.push_str(prefix);
                path.push('/');
            }
            path.push_str(name);
            tracks.push(path);
        })
        .await?;
    tracing::debug!(dir, count = tracks.len(), "playlist collected");
    Ok(tracks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_mp3_accepts_lower_and_upper() {
        assert!(is_mp3("song.mp3"));
        assert!(is_mp3("SONG.MP3"));
        assert!(is_mp3("Mixed.Mp3"));
    }

    #[test]
    fn test_is_mp3_rejects_other_extensions() {
        assert!(!is_mp3("song.mp4"));
        assert!(!is_mp3("song.wav"));
        assert!(!is_mp3("mp3"));
        assert!(!is_mp3(".mp3"));
        assert!(!is_mp3(""));
    }

    #[test]
    fn test_is_mp3_requires_exact_suffix() {
        // only the last four characters count
        assert!(!is_mp3("song.mp3.txt"));
        assert!(!is_mp3("songXmp3"));
    }

    #[test]
    fn test_is_mp3_multibyte_name() {
        assert!(is_mp3("\u{e9}t\u{e9}.mp3"));
        assert!(!is_mp3("\u{e9}\u{e9}"));
    }

    #[test]
    fn test_track_file_name_pads() {
        assert_eq!(track_file_name(7).as_deref(), Some("track007.mp3"));
        assert_eq!(track_file_name(0).as_deref(), Some("track000.mp3"));
        assert_eq!(track_file_name(999).as_deref(), Some("track999.mp3"));
    }

    #[test]
    fn test_track_file_name_rejects_four_digits() {
        assert!(track_file_name(1000).is_none());
    }
}
