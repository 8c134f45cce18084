//! MP3 playback: stream feeding to the VS1011e under DREQ flow control
//!
//! - [`engine`]: the `Player` state machine and feed cycle
//! - [`tags`]: tag lookup on the open track
//! - [`task`]: edge notification and playlist tasks

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(unused_must_use)]
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod engine;
pub mod tags;
pub mod task;

pub use engine::{PlayError, PlaybackState, Player, PlayerConfig, DEFAULT_DRAIN_LEN};
pub use task::{feed_until_idle, play_playlist, play_track_range, ReadyEdge};
