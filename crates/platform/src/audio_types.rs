//! Audio domain newtypes for compile-time safety.
//!
//! These zero-cost wrappers keep out-of-range values away from the codec
//! registers:
//! - `VolumeLevel`: clamps 0–254 (0 = silence, 254 = loudest)
//! - `Attenuation`: VS1011e VOL register byte, derived from `VolumeLevel` only
//! - `BassBoost` / `TrebleBoost`: the two halves of the BASS register
//! - `SineTone`: frequency code for the built-in sine test

// ── Error type ───────────────────────────────────────────────────────────────

/// Error returned when a value is out of the valid range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[error("value {value} outside {min}..={max}")]
pub struct OutOfRangeError {
    /// The value that was out of range.
    pub value: i32,
    /// The inclusive minimum allowed value.
    pub min: i32,
    /// The inclusive maximum allowed value.
    pub max: i32,
}

// ── VolumeLevel ──────────────────────────────────────────────────────────────

/// Output level, clamped to 0–254.
///
/// Wraps a `u8` with the invariant `value <= 254`. Higher is louder.
/// Construct with [`VolumeLevel::new`] (clamping) or
/// [`VolumeLevel::try_new`] (fallible, strict).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct VolumeLevel(u8);

impl VolumeLevel {
    /// Loudest level.
    pub const MAX: Self = Self(254);
    /// Silence.
    pub const SILENT: Self = Self(0);

    /// Create a `VolumeLevel`, clamping 255 to 254.
    #[must_use]
    pub fn new(value: u8) -> Self {
        Self(value.min(254))
    }

    /// Create a `VolumeLevel`, returning an error if `value > 254`.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRangeError`] if `value > 254`.
    pub fn try_new(value: u8) -> Result<Self, OutOfRangeError> {
        if value > 254 {
            Err(OutOfRangeError {
                value: i32::from(value),
                min: 0,
                max: 254,
            })
        } else {
            Ok(Self(value))
        }
    }

    /// Return the inner level (0–254).
    #[must_use]
    pub fn get(self) -> u8 {
        self.0
    }
}

// ── Attenuation ──────────────────────────────────────────────────────────────

/// One channel byte of the VS1011e VOL register.
///
/// The chip attenuates in 0.5 dB steps: 0x00 is full volume, 0xFE is
/// silence (0xFF powers the analog stage down and is never produced here).
///
/// Formula: `attenuation = 254 - level`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct Attenuation(u8);

impl Attenuation {
    /// Convert a [`VolumeLevel`] to its attenuation byte.
    #[must_use]
    pub fn from_level(level: VolumeLevel) -> Self {
        // level <= 254 by construction
        Self(254_u8.saturating_sub(level.get()))
    }

    /// Return the raw register byte.
    #[must_use]
    pub fn get(self) -> u8 {
        self.0
    }

    /// Pack a left/right pair into a VOL register value (left in the high byte).
    #[must_use]
    pub fn pack(left: Self, right: Self) -> u16 {
        u16::from_be_bytes([left.0, right.0])
    }
}

// ── BassBoost ────────────────────────────────────────────────────────────────

/// Bass enhancer setting: low byte of the BASS register.
///
/// `amplitude` is in 1 dB steps (0 = off, max 15 dB); `frequency` is the lower
/// limit in 10 Hz steps (2–15, i.e. 20–150 Hz).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BassBoost {
    amplitude: u8,
    frequency: u8,
}

impl BassBoost {
    /// Bass enhancer disabled.
    pub const OFF: Self = Self { amplitude: 0, frequency: 2 };

    /// Create a `BassBoost`, clamping each field into range.
    #[must_use]
    pub fn new(amplitude: u8, frequency: u8) -> Self {
        Self {
            amplitude: amplitude.min(15),
            frequency: frequency.clamp(2, 15),
        }
    }

    /// Amplitude in dB (0–15).
    #[must_use]
    pub fn amplitude(self) -> u8 {
        self.amplitude
    }

    /// Lower limit frequency code (2–15).
    #[must_use]
    pub fn frequency(self) -> u8 {
        self.frequency
    }

    /// The register byte: amplitude in bits 7..4, frequency in bits 3..0.
    #[must_use]
    pub fn register_byte(self) -> u8 {
        (self.amplitude << 4) | self.frequency
    }
}

// ── TrebleBoost ──────────────────────────────────────────────────────────────

/// Treble control setting: high byte of the BASS register.
///
/// `amplitude` is in 1.5 dB steps, -8..=7 (negative cuts); `frequency` is the
/// lower limit in kHz (0–15).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TrebleBoost {
    amplitude: i8,
    frequency: u8,
}

impl TrebleBoost {
    /// Treble control disabled.
    pub const OFF: Self = Self { amplitude: 0, frequency: 0 };

    /// Create a `TrebleBoost`, clamping each field into range.
    #[must_use]
    pub fn new(amplitude: i8, frequency: u8) -> Self {
        Self {
            amplitude: amplitude.clamp(-8, 7),
            frequency: frequency.min(15),
        }
    }

    /// Amplitude in 1.5 dB steps (-8–7).
    #[must_use]
    pub fn amplitude(self) -> i8 {
        self.amplitude
    }

    /// Lower limit frequency in kHz (0–15).
    #[must_use]
    pub fn frequency(self) -> u8 {
        self.frequency
    }

    /// The register byte: two's complement amplitude nibble in bits 7..4,
    /// frequency in bits 3..0.
    #[must_use]
    #[allow(clippy::cast_sign_loss)] // nibble of a two's complement value
    pub fn register_byte(self) -> u8 {
        ((self.amplitude as u8 & 0x0F) << 4) | self.frequency
    }
}

// ── SineTone ─────────────────────────────────────────────────────────────────

/// Frequency code for the sine test.
///
/// Bits 7..5 select the sample rate, bits 4..0 the skip speed; the resulting
/// tone is `Fs * S / 128`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct SineTone(pub u8);

impl SineTone {
    /// 86 Hz.
    pub const LOWEST: Self = Self(0xC1);
    /// 1 kHz at 48 kHz sample rate.
    pub const STANDARD: Self = Self(0x44);
    /// 5.1 kHz.
    pub const HIGHEST: Self = Self(0x3F);

    /// Return the raw frequency code.
    #[must_use]
    pub fn get(self) -> u8 {
        self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn treble_negative_amplitude_is_twos_complement_nibble() {
        assert_eq!(TrebleBoost::new(-1, 3).register_byte(), 0xF3);
        assert_eq!(TrebleBoost::new(-8, 0).register_byte(), 0x80);
        assert_eq!(TrebleBoost::new(7, 15).register_byte(), 0x7F);
    }

    #[test]
    fn bass_register_byte_packs_nibbles() {
        assert_eq!(BassBoost::new(15, 15).register_byte(), 0xFF);
        assert_eq!(BassBoost::new(10, 6).register_byte(), 0xA6);
        assert_eq!(BassBoost::OFF.register_byte(), 0x02);
    }

    #[test]
    fn attenuation_pack_puts_left_high() {
        let l = Attenuation::from_level(VolumeLevel::new(254));
        let r = Attenuation::from_level(VolumeLevel::new(0));
        assert_eq!(Attenuation::pack(l, r), 0x00FE);
    }

    #[test]
    fn out_of_range_error_names_the_bounds() {
        let err = VolumeLevel::try_new(255).unwrap_err();
        assert_eq!(err.to_string(), "value 255 outside 0..=254");
    }
}
