//! Event-driven feeding for multi-task firmware.
//!
//! The DREQ interrupt handler only calls [`ReadyEdge::notify`]; the feed
//! cycle itself runs in task context with the player locked:
//!
//! ```text
//!   EXTI (DREQ ↑) ──notify──▶ ReadyEdge ──wait──▶ feed_until_idle
//!                                                   │ lock
//!                                                   ▼
//!                                          Mutex<Player> ◀── UI task (pause, tags, volume)
//! ```

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::Mutex;
use embassy_sync::signal::Signal;
use embedded_hal::delay::DelayNs;
use library::scanner::track_file_name;
use platform::storage::Storage;
use platform::vs1011e::ChipLink;

use crate::engine::{PlayError, PlaybackState, Player};

/// Rising-edge notification from the DREQ interrupt.
///
/// Edges that arrive while nobody waits collapse into one.
pub struct ReadyEdge<M: RawMutex> {
    signal: Signal<M, ()>,
}

impl<M: RawMutex> ReadyEdge<M> {
    /// Create a new, unsignalled edge.
    pub const fn new() -> Self {
        Self {
            signal: Signal::new(),
        }
    }

    /// Record an edge. Safe to call from interrupt context with a
    /// critical-section mutex.
    pub fn notify(&self) {
        self.signal.signal(());
    }

    /// Wait for the next edge.
    pub async fn wait(&self) {
        self.signal.wait().await;
    }
}

impl<M: RawMutex> Default for ReadyEdge<M> {
    fn default() -> Self {
        Self::new()
    }
}

/// Run feed cycles on every edge until the player goes idle.
///
/// Returns immediately when the player is already idle.
pub async fn feed_until_idle<M, E, S, L, D>(
    player: &Mutex<M, Player<S, L, D>>,
    edge: &ReadyEdge<E>,
) -> Result<(), PlayError<S::Error>>
where
    M: RawMutex,
    E: RawMutex,
    S: Storage,
    L: ChipLink,
    D: DelayNs,
{
    loop {
        if player.lock().await.state() == PlaybackState::Idle {
            return Ok(());
        }
        edge.wait().await;
        player.lock().await.on_ready_edge().await?;
    }
}

/// Play each track in turn, waiting for one to finish before the next.
///
/// Missing tracks are skipped. Returns how many tracks were played.
pub async fn play_playlist<M, E, S, L, D, I, N>(
    player: &Mutex<M, Player<S, L, D>>,
    edge: &ReadyEdge<E>,
    tracks: I,
) -> Result<usize, PlayError<S::Error>>
where
    M: RawMutex,
    E: RawMutex,
    S: Storage,
    L: ChipLink,
    D: DelayNs,
    I: IntoIterator<Item = N>,
    N: AsRef<str>,
{
    let mut played = 0usize;
    for track in tracks {
        let started = {
            let mut p = player.lock().await;
            p.play(track.as_ref()).await
        };
        match started {
            Ok(()) => {}
            Err(PlayError::SourceNotFound) => continue,
            Err(e) => return Err(e),
        }
        feed_until_idle(player, edge).await?;
        played = played.saturating_add(1);
    }
    tracing::info!(played, "playlist finished");
    Ok(played)
}

/// Play `trackNNN.mp3` for every number in `first..=last`.
pub async fn play_track_range<M, E, S, L, D>(
    player: &Mutex<M, Player<S, L, D>>,
    edge: &ReadyEdge<E>,
    first: u16,
    last: u16,
) -> Result<usize, PlayError<S::Error>>
where
    M: RawMutex,
    E: RawMutex,
    S: Storage,
    L: ChipLink,
    D: DelayNs,
{
    let names = (first..=last).filter_map(track_file_name);
    play_playlist(player, edge, names).await
}
