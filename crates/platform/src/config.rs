//! Application configuration and constants
//!
//! Central values for the codec shield. Board bring-up code and the drivers
//! reference these rather than hardcoding bus speeds or crystal frequencies.

use crate::audio_types::VolumeLevel;
use crate::peripheral::{BitOrder, SpiConfig, SpiMode};

/// The application name
pub const APP_NAME: &str = "Tune";

/// Application version (synchronized with Cargo.toml)
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// SPI settings for the codec and the storage card, which share one bus.
///
/// The VS1011e accepts SCI reads up to CLKI/7; 4 MHz stays below that
/// before the clock doubler is configured.
pub const CODEC_SPI: SpiConfig = SpiConfig {
    frequency: 4_000_000,
    mode: SpiMode::Mode0,
    bit_order: BitOrder::MsbFirst,
};

/// Crystal fitted on the reference shield.
pub const DEFAULT_CRYSTAL_HZ: u32 = 26_000_000;

/// Codec bring-up settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CodecConfig {
    /// Crystal frequency in Hz, used to program CLOCKF.
    pub crystal_hz: u32,
    /// Level applied to both channels once the chip is up.
    pub initial_volume: VolumeLevel,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            crystal_hz: DEFAULT_CRYSTAL_HZ,
            initial_volume: VolumeLevel::new(200),
        }
    }
}

/// CLOCKF register value for a crystal of `hz`.
///
/// Bit 15 enables the clock doubler, which the chip needs below 16 MHz. The
/// low 15 bits hold the frequency in 2 kHz units, rounded to nearest.
#[must_use]
pub const fn clockf_for_crystal(hz: u32) -> u16 {
    let doubler: u16 = if hz < 16_000_000 { 0x8000 } else { 0 };
    let units = hz.saturating_add(1000) / 2000;
    let units = if units > 0x7FFF { 0x7FFF } else { units };
    #[allow(clippy::cast_possible_truncation)] // bounded to 0x7FFF above
    let units = units as u16;
    doubler | units
}
