//! Storage abstraction for file systems
//!
//! The player only ever reads: tracks are opened read-only, streamed in
//! 32-byte chunks and seeked for tag lookups. Closing a file is dropping its
//! handle.

/// Storage trait for file system access
pub trait Storage {
    /// Error type
    type Error: core::fmt::Debug;
    /// File type; shares the storage error so callers handle one type
    type File: File<Error = Self::Error>;

    /// Open file for reading
    fn open_file(
        &mut self,
        path: &str,
    ) -> impl core::future::Future<Output = Result<Self::File, Self::Error>>;

    /// Check if path exists
    fn exists(
        &mut self,
        path: &str,
    ) -> impl core::future::Future<Output = Result<bool, Self::Error>>;

    /// Enumerate the entries of `dir`, calling `visit` once per entry name
    /// in directory order. Names are relative to `dir`.
    fn read_dir(
        &mut self,
        dir: &str,
        visit: &mut dyn FnMut(&str),
    ) -> impl core::future::Future<Output = Result<(), Self::Error>>;
}

/// File trait for reading files
pub trait File {
    /// Error type
    type Error: core::fmt::Debug;

    /// Read from current position.
    ///
    /// Returns the number of bytes read; `0` means end of file.
    fn read(
        &mut self,
        buf: &mut [u8],
    ) -> impl core::future::Future<Output = Result<usize, Self::Error>>;

    /// Seek to an absolute position
    fn seek(&mut self, pos: u64) -> impl core::future::Future<Output = Result<u64, Self::Error>>;

    /// Current absolute position
    fn position(&self) -> u64;

    /// Get file size
    fn size(&self) -> u64;
}

/// Fill `buf` from `file`, stopping early only at end of file.
///
/// Returns the number of bytes placed in `buf`; anything short of
/// `buf.len()` means the file is exhausted.
pub async fn read_full<F: File>(file: &mut F, buf: &mut [u8]) -> Result<usize, F::Error> {
    let mut filled = 0;
    while let Some(rest) = buf.get_mut(filled..) {
        if rest.is_empty() {
            break;
        }
        let n = file.read(rest).await?;
        if n == 0 {
            break;
        }
        filled = filled.saturating_add(n);
    }
    Ok(filled)
}
