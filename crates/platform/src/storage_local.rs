//! Local filesystem Storage implementation for host builds.
//!
//! `LocalFileStorage` implements `platform::Storage` using `std::fs`.
//! Used when the `std` feature is enabled (host tools and tests).
//! All paths are resolved relative to the music root provided at construction.

use std::fs;
use std::io::{Read, Seek, SeekFrom};
use std::path::PathBuf;
use std::string::String;

use crate::storage::{File, Storage};

/// Error type for local filesystem operations.
#[derive(Debug)]
pub struct LocalStorageError(pub std::io::Error);

impl core::fmt::Display for LocalStorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "local storage error: {}", self.0)
    }
}

impl std::error::Error for LocalStorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

/// The storage volume could not be brought up.
///
/// Playback is impossible without storage, so callers treat this as fatal.
#[derive(Debug, thiserror::Error)]
#[error("storage root {root} is not a readable directory")]
pub struct StorageInitError {
    /// The root that failed to open.
    pub root: String,
}

/// An open file on the local filesystem.
pub struct LocalFile {
    inner: fs::File,
    size: u64,
    position: u64,
}

impl File for LocalFile {
    type Error = LocalStorageError;

    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let n = Read::read(&mut self.inner, buf).map_err(LocalStorageError)?;
        self.position = self.position.saturating_add(n as u64);
        Ok(n)
    }

    async fn seek(&mut self, pos: u64) -> Result<u64, Self::Error> {
        self.position = Seek::seek(&mut self.inner, SeekFrom::Start(pos)).map_err(LocalStorageError)?;
        Ok(self.position)
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn size(&self) -> u64 {
        self.size
    }
}

/// A `platform::Storage` implementation backed by `std::fs`.
///
/// Paths passed to [`LocalFileStorage::open_file`] and [`LocalFileStorage::exists`]
/// are resolved relative to the music root provided at construction.
///
/// # Example
/// ```no_run
/// # async fn example() {
/// use platform::storage_local::LocalFileStorage;
/// use platform::Storage;
/// let mut storage = LocalFileStorage::mount("/home/user/music").unwrap();
/// let file = storage.open_file("track001.mp3").await.unwrap();
/// # }
/// ```
pub struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    /// Create a new storage rooted at `music_root` without checking it.
    #[must_use]
    pub fn new(music_root: &str) -> Self {
        Self { root: PathBuf::from(music_root) }
    }

    /// Create a storage rooted at `music_root`, verifying the root is a
    /// directory.
    pub fn mount(music_root: &str) -> Result<Self, StorageInitError> {
        let root = PathBuf::from(music_root);
        if root.is_dir() {
            tracing::info!(root = music_root, "storage mounted");
            Ok(Self { root })
        } else {
            tracing::error!(root = music_root, "storage root missing");
            Err(StorageInitError { root: String::from(music_root) })
        }
    }

    /// Create from the `MUSIC_PATH` environment variable.
    ///
    /// Returns `None` if `MUSIC_PATH` is not set or is not valid UTF-8.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        std::env::var("MUSIC_PATH").ok().map(|p| Self::new(&p))
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}

impl Storage for LocalFileStorage {
    type Error = LocalStorageError;
    type File = LocalFile;

    async fn open_file(&mut self, path: &str) -> Result<Self::File, Self::Error> {
        let full = self.resolve(path);
        let file = fs::File::open(&full).map_err(LocalStorageError)?;
        let meta = file.metadata().map_err(LocalStorageError)?;
        Ok(LocalFile { inner: file, size: meta.len(), position: 0 })
    }

    async fn exists(&mut self, path: &str) -> Result<bool, Self::Error> {
        Ok(self.resolve(path).exists())
    }

    async fn read_dir(&mut self, dir: &str, visit: &mut dyn FnMut(&str)) -> Result<(), Self::Error> {
        let mut names = std::vec::Vec::new();
        for entry in fs::read_dir(self.resolve(dir)).map_err(LocalStorageError)? {
            let entry = entry.map_err(LocalStorageError)?;
            if let Some(name) = entry.file_name().to_str() {
                names.push(String::from(name));
            }
        }
        // std::fs gives no ordering guarantee; FAT directory order is
        // approximated by name order.
        names.sort();
        for name in &names {
            visit(name);
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::storage::{read_full, File, Storage};
    use std::fs;
    use std::vec::Vec;
    use tempfile::TempDir;

    #[tokio::test]
    async fn local_storage_read_full_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("test.bin"), b"hello world").unwrap();
        let mut storage = LocalFileStorage::new(tmp.path().to_str().unwrap());
        let mut file = storage.open_file("test.bin").await.unwrap();
        let mut buf = [0u8; 11];
        let n = file.read(&mut buf).await.unwrap();
        assert_eq!(n, 11);
        assert_eq!(&buf, b"hello world");
        assert_eq!(file.position(), 11);
    }

    #[tokio::test]
    async fn local_storage_size_matches() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("size.bin"), [0u8; 64]).unwrap();
        let mut storage = LocalFileStorage::new(tmp.path().to_str().unwrap());
        let file = storage.open_file("size.bin").await.unwrap();
        assert_eq!(file.size(), 64);
    }

    #[tokio::test]
    async fn local_storage_seek_and_read() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("seek.bin"), b"ABCDEFGH").unwrap();
        let mut storage = LocalFileStorage::new(tmp.path().to_str().unwrap());
        let mut file = storage.open_file("seek.bin").await.unwrap();
        file.seek(4).await.unwrap();
        assert_eq!(file.position(), 4);
        let mut buf = [0u8; 4];
        file.read(&mut buf).await.unwrap();
        assert_eq!(&buf, b"EFGH");
    }

    #[tokio::test]
    async fn local_storage_short_read_at_end() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("short.bin"), [7u8; 40]).unwrap();
        let mut storage = LocalFileStorage::new(tmp.path().to_str().unwrap());
        let mut file = storage.open_file("short.bin").await.unwrap();
        let mut buf = [0u8; 32];
        assert_eq!(read_full(&mut file, &mut buf).await.unwrap(), 32);
        assert_eq!(read_full(&mut file, &mut buf).await.unwrap(), 8);
        assert_eq!(read_full(&mut file, &mut buf).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn local_storage_exists_true() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("exists.bin"), b"x").unwrap();
        let mut storage = LocalFileStorage::new(tmp.path().to_str().unwrap());
        assert!(storage.exists("exists.bin").await.unwrap());
    }

    #[tokio::test]
    async fn local_storage_exists_false() {
        let tmp = TempDir::new().unwrap();
        let mut storage = LocalFileStorage::new(tmp.path().to_str().unwrap());
        assert!(!storage.exists("missing.bin").await.unwrap());
    }

    #[tokio::test]
    async fn local_storage_read_dir_lists_names() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("b.mp3"), b"x").unwrap();
        fs::write(tmp.path().join("a.mp3"), b"x").unwrap();
        let mut storage = LocalFileStorage::new(tmp.path().to_str().unwrap());
        let mut seen = Vec::new();
        storage
            .read_dir("", &mut |name: &str| seen.push(String::from(name)))
            .await
            .unwrap();
        assert_eq!(seen, ["a.mp3", "b.mp3"]);
    }

    #[test]
    fn mount_rejects_missing_root() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope");
        let err = LocalFileStorage::mount(missing.to_str().unwrap())
            .err()
            .expect("missing root must fail");
        assert!(err.root.ends_with("nope"));
    }

    #[test]
    fn mount_accepts_directory() {
        let tmp = TempDir::new().unwrap();
        assert!(LocalFileStorage::mount(tmp.path().to_str().unwrap()).is_ok());
    }
}
