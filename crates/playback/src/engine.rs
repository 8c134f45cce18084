//! Playback state machine and stream feeder.
//!
//! `Player` owns the storage, the codec driver and at most one open track.
//! Audio moves in 32-byte chunks: one chunk per DREQ-high observation, which
//! the VS1011e guarantees it can buffer.
//!
//! Feeding is edge driven. After [`Player::play`] primes the FIFO, the DREQ
//! rising-edge trigger is armed and the interrupt glue calls
//! [`Player::on_ready_edge`] (directly, or through
//! [`task::feed_until_idle`](crate::task::feed_until_idle)). Each data burst
//! runs with the trigger disarmed so a nested edge cannot split a chunk or
//! interleave a register access with it.
//!
//! ```text
//!          play            pause
//!   Idle ───────▶ Playing ───────▶ Paused
//!    ▲  ◀───────    │  ◀───────      │
//!    │  stop / EOF  │    resume      │
//!    └──────────────┴────────────────┘
//!                 stop
//! ```

use embedded_hal::delay::DelayNs;
use library::id3::{skip_offset, TagError};
use library::scanner::track_file_name;
use platform::storage::{read_full, File, Storage};
use platform::vs1011e::registers::SDI_CHUNK;
use platform::vs1011e::{ChipLink, LinkError, Vs1011e};

/// Zero bytes sent after the last audio byte so the decoder flushes its
/// pipeline (2048 + 4 bytes of end fill).
pub const DEFAULT_DRAIN_LEN: usize = 2052;

/// Current playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlaybackState {
    /// No track is open.
    Idle,
    /// A track is open and being fed to the codec.
    Playing,
    /// A track is open; feeding is suspended and the position preserved.
    Paused,
}

/// Errors returned by [`Player`] operations.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum PlayError<E> {
    /// `play` was called while a track is open.
    #[error("a track is already playing")]
    AlreadyPlaying,
    /// The track could not be opened.
    #[error("track not found")]
    SourceNotFound,
    /// Reading or seeking the open track failed.
    #[error("storage error: {0:?}")]
    Storage(E),
    /// Bus or pin fault talking to the codec.
    #[error(transparent)]
    Link(#[from] LinkError),
    /// The track carries an ID3v2 tag of a version other than 2 or 3.
    #[error("unsupported ID3v2 version {0}")]
    UnsupportedTagVersion(u8),
}

impl<E> From<TagError<E>> for PlayError<E> {
    fn from(e: TagError<E>) -> Self {
        match e {
            TagError::Storage(e) => Self::Storage(e),
            TagError::UnsupportedVersion(v) => Self::UnsupportedTagVersion(v),
        }
    }
}

/// Player settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerConfig {
    /// Zero bytes written after end of stream and on stop.
    pub drain_len: usize,
    /// Start feeding after a leading ID3v2 tag instead of at byte 0.
    pub skip_id3v2: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            drain_len: DEFAULT_DRAIN_LEN,
            skip_id3v2: true,
        }
    }
}

/// A playback session: storage, codec and the open track.
pub struct Player<S: Storage, L, D> {
    storage: S,
    codec: Vs1011e<L, D>,
    config: PlayerConfig,
    source: Option<S::File>,
    state: PlaybackState,
    trigger_attached: bool,
    chunk: [u8; SDI_CHUNK],
}

impl<S, L, D> Player<S, L, D>
where
    S: Storage,
    L: ChipLink,
    D: DelayNs,
{
    /// Create an idle player. `codec` should already be initialised.
    pub fn new(storage: S, codec: Vs1011e<L, D>, config: PlayerConfig) -> Self {
        Self {
            storage,
            codec,
            config,
            source: None,
            state: PlaybackState::Idle,
            trigger_attached: false,
            chunk: [0; SDI_CHUNK],
        }
    }

    /// Open `name` and start feeding it to the codec.
    ///
    /// Primes the FIFO before returning and arms the DREQ trigger if the
    /// track is still playing afterwards.
    pub async fn play(&mut self, name: &str) -> Result<(), PlayError<S::Error>> {
        if self.state != PlaybackState::Idle {
            return Err(PlayError::AlreadyPlaying);
        }
        let mut file = match self.storage.open_file(name).await {
            Ok(file) => file,
            Err(e) => {
                tracing::warn!(track = name, error = ?e, "track not found");
                return Err(PlayError::SourceNotFound);
            }
        };

        self.codec.reset_decode_time()?;

        let start = if self.config.skip_id3v2 {
            skip_offset(&mut file)
                .await
                .map_err(PlayError::Storage)?
                .min(file.size())
        } else {
            0
        };
        file.seek(start).await.map_err(PlayError::Storage)?;

        tracing::info!(track = name, start, size = file.size(), "playing");
        self.source = Some(file);
        self.state = PlaybackState::Playing;

        self.feed_and_arm().await
    }

    /// Play `trackNNN.mp3`.
    pub async fn play_track(&mut self, number: u16) -> Result<(), PlayError<S::Error>> {
        let Some(name) = track_file_name(number) else {
            tracing::warn!(number, "track number out of range");
            return Err(PlayError::SourceNotFound);
        };
        self.play(&name).await
    }

    /// Suspend feeding. No-op unless playing.
    pub fn pause(&mut self) -> Result<(), PlayError<S::Error>> {
        if self.state != PlaybackState::Playing {
            return Ok(());
        }
        self.detach_trigger()?;
        self.state = PlaybackState::Paused;
        tracing::debug!(position = self.position(), "paused");
        Ok(())
    }

    /// Continue feeding from where [`pause`](Self::pause) left off. No-op
    /// unless paused.
    pub async fn resume(&mut self) -> Result<(), PlayError<S::Error>> {
        if self.state != PlaybackState::Paused {
            return Ok(());
        }
        self.state = PlaybackState::Playing;
        tracing::debug!(position = self.position(), "resumed");
        self.feed_and_arm().await
    }

    /// Close the track and flush the codec. No-op when idle.
    pub fn stop(&mut self) -> Result<(), PlayError<S::Error>> {
        if self.state == PlaybackState::Idle {
            return Ok(());
        }
        self.detach_trigger()?;
        self.source = None;
        self.drain()?;
        self.state = PlaybackState::Idle;
        tracing::info!("stopped");
        Ok(())
    }

    /// Feed cycle for a DREQ rising edge. Ignored unless playing with the
    /// trigger attached.
    ///
    /// A failed cycle abandons the track; the player is idle afterwards.
    pub async fn on_ready_edge(&mut self) -> Result<(), PlayError<S::Error>> {
        if self.state != PlaybackState::Playing || !self.trigger_attached {
            return Ok(());
        }
        let fed = self.feed().await;
        if fed.is_err() {
            self.abandon();
        }
        fed
    }

    /// Prime the FIFO and arm the trigger, abandoning the track on failure.
    async fn feed_and_arm(&mut self) -> Result<(), PlayError<S::Error>> {
        let fed = match self.feed().await {
            Ok(()) => self.attach_trigger(),
            Err(e) => Err(e),
        };
        if fed.is_err() {
            self.abandon();
        }
        fed
    }

    /// Send chunks while DREQ stays high; finish the track on a short read.
    async fn feed(&mut self) -> Result<(), PlayError<S::Error>> {
        let mut chunks = 0u32;
        while self.state == PlaybackState::Playing && self.codec.link_mut().is_ready()? {
            let Some(source) = self.source.as_mut() else {
                break;
            };
            let n = read_full(source, &mut self.chunk)
                .await
                .map_err(PlayError::Storage)?;
            let bytes = self.chunk.get(..n).unwrap_or_default();
            burst(&mut self.codec, &mut self.trigger_attached, bytes)?;
            chunks = chunks.saturating_add(1);
            if n < SDI_CHUNK {
                self.finish()?;
            }
        }
        tracing::trace!(chunks, "feed cycle");
        Ok(())
    }

    /// End of stream: close, detach, drain, idle.
    fn finish(&mut self) -> Result<(), PlayError<S::Error>> {
        self.source = None;
        self.detach_trigger()?;
        self.drain()?;
        self.state = PlaybackState::Idle;
        tracing::debug!("end of stream");
        Ok(())
    }

    /// Close the track after an error and force the trigger off. No drain:
    /// the link may be the thing that failed.
    fn abandon(&mut self) {
        self.source = None;
        if self.trigger_attached {
            if let Err(e) = self.codec.link_mut().disarm_trigger() {
                tracing::warn!(error = ?e, "trigger disarm failed");
            }
            self.trigger_attached = false;
        }
        self.state = PlaybackState::Idle;
        tracing::warn!("track abandoned");
    }

    fn drain(&mut self) -> Result<(), LinkError> {
        let zeros = [0u8; SDI_CHUNK];
        let mut left = self.config.drain_len;
        while left > 0 {
            let n = left.min(SDI_CHUNK);
            self.codec.write_data(zeros.get(..n).unwrap_or_default())?;
            left = left.saturating_sub(n);
        }
        tracing::debug!(bytes = self.config.drain_len, "drained");
        Ok(())
    }

    fn attach_trigger(&mut self) -> Result<(), PlayError<S::Error>> {
        if self.state == PlaybackState::Playing && !self.trigger_attached {
            self.codec.link_mut().arm_trigger()?;
            self.trigger_attached = true;
        }
        Ok(())
    }

    fn detach_trigger(&mut self) -> Result<(), LinkError> {
        if self.trigger_attached {
            self.codec.link_mut().disarm_trigger()?;
            self.trigger_attached = false;
        }
        Ok(())
    }

    /// Current state.
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Whether the DREQ trigger is attached.
    pub fn trigger_attached(&self) -> bool {
        self.trigger_attached
    }

    /// Byte offset into the open track.
    pub fn position(&self) -> Option<u64> {
        self.source.as_ref().map(File::position)
    }

    /// Settings in use.
    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// The codec driver, e.g. for volume changes.
    pub fn codec_mut(&mut self) -> &mut Vs1011e<L, D> {
        &mut self.codec
    }

    /// The storage backend.
    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub(crate) fn source_mut(&mut self) -> Option<&mut S::File> {
        self.source.as_mut()
    }
}

/// One data burst with the DREQ trigger masked.
///
/// The trigger is re-armed even when the write fails; if re-arming fails
/// `attached` is cleared to match the hardware.
fn burst<L: ChipLink, D: DelayNs>(
    codec: &mut Vs1011e<L, D>,
    attached: &mut bool,
    bytes: &[u8],
) -> Result<(), LinkError> {
    if bytes.is_empty() {
        return Ok(());
    }
    if *attached {
        codec.link_mut().disarm_trigger()?;
    }
    let written = codec.write_data(bytes);
    if *attached {
        if let Err(e) = codec.link_mut().arm_trigger() {
            *attached = false;
            return Err(e);
        }
    }
    written
}
