//! Track files on the storage card: tag extraction and track enumeration.
//!
//! # Modules
//!
//! - [`id3`]: ID3v1 trailer and ID3v2.2 / ID3v2.3 frame lookup
//! - [`scanner`]: `.mp3` filtering, `trackNNN.mp3` names, playlists

#![cfg_attr(not(test), no_std)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::panic)]
#![deny(clippy::expect_used)]
#![warn(missing_docs)]

extern crate alloc;

pub mod id3;
pub mod scanner;

// Top-level re-exports for convenience
pub use id3::{read_field, skip_offset, Id3v2Header, TagError, TagField, TagValue};
pub use scanner::{collect_playlist, is_mp3, track_file_name};
