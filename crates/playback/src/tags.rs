//! Tag lookup on the open track.
//!
//! A lookup seeks around the file, so a playing track is paused for its
//! duration and resumed afterwards from the same byte offset.

use embedded_hal::delay::DelayNs;
use library::id3::{read_field, TagField, TagValue};
use platform::storage::{File, Storage};
use platform::vs1011e::ChipLink;

use crate::engine::{PlayError, PlaybackState, Player};

impl<S, L, D> Player<S, L, D>
where
    S: Storage,
    L: ChipLink,
    D: DelayNs,
{
    /// Look up `field` in the open track's ID3v1 trailer, then its ID3v2 tag.
    ///
    /// `Ok(None)` when no track is open or neither tag has the field.
    pub async fn field(&mut self, field: TagField) -> Result<Option<TagValue>, PlayError<S::Error>> {
        if self.source_mut().is_none() {
            return Ok(None);
        }
        let was_playing = self.state() == PlaybackState::Playing;
        if was_playing {
            self.pause()?;
        }

        let found = self.lookup(field).await;

        if was_playing {
            self.resume().await?;
        }
        found
    }

    /// Title of the open track.
    pub async fn title(&mut self) -> Result<Option<TagValue>, PlayError<S::Error>> {
        self.field(TagField::Title).await
    }

    /// Artist of the open track.
    pub async fn artist(&mut self) -> Result<Option<TagValue>, PlayError<S::Error>> {
        self.field(TagField::Artist).await
    }

    /// Album of the open track.
    pub async fn album(&mut self) -> Result<Option<TagValue>, PlayError<S::Error>> {
        self.field(TagField::Album).await
    }

    async fn lookup(&mut self, field: TagField) -> Result<Option<TagValue>, PlayError<S::Error>> {
        let Some(source) = self.source_mut() else {
            return Ok(None);
        };
        let position = source.position();
        let found = read_field(source, field).await;
        source.seek(position).await.map_err(PlayError::Storage)?;
        Ok(found?)
    }
}
