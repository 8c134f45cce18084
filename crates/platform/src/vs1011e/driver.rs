//! VS1011e register and data interface
//!
//! Synchronous over [`ChipLink`]: every SCI byte and every SDI chunk waits for
//! DREQ by busy-polling, matching how the chip is specified to be driven. The
//! waits are unbounded.
//!
//! # Bring-up
//!
//! | Step | Action                                   |
//! |------|------------------------------------------|
//! | 1    | release select lines, settle 10 ms       |
//! | 2    | soft reset with `SM_SDINEW` kept set     |
//! | 3    | program CLOCKF for the fitted crystal    |
//! | 4    | wait for DREQ, settle 100 ms             |
//! | 5    | apply the initial volume                 |

use core::fmt;

use embedded_hal::delay::DelayNs;

use super::link::{Channel, ChipLink, LinkError};
use super::registers::*;
use crate::audio_types::{Attenuation, BassBoost, SineTone, TrebleBoost, VolumeLevel};
use crate::config::{clockf_for_crystal, CodecConfig, APP_NAME, APP_VERSION};

/// Time the chip needs after a reset or clock change.
const SETTLE_MS: u32 = 5;

/// How long the sine test tone plays.
const SINE_TEST_MS: u32 = 2000;

/// Chip version as reported in `SCI_STATUS` bits 7..4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChipVersion(pub u8);

impl ChipVersion {
    /// Whether the chip identifies as a VS1011.
    #[must_use]
    pub fn is_vs1011(self) -> bool {
        self.0 == SS_VER_VS1011
    }
}

/// Snapshot of all sixteen SCI registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterDump {
    values: [u16; 16],
}

impl RegisterDump {
    /// Value captured for `reg`.
    #[must_use]
    pub fn get(&self, reg: Register) -> u16 {
        self.values
            .get(usize::from(reg.addr()))
            .copied()
            .unwrap_or_default()
    }
}

impl fmt::Display for RegisterDump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, value) in self.values.iter().enumerate() {
            writeln!(f, "Reg {i} = 0x{value:X}")?;
        }
        Ok(())
    }
}

/// VS1011e driver
pub struct Vs1011e<L, D> {
    link: L,
    delay: D,
}

impl<L: ChipLink, D: DelayNs> Vs1011e<L, D> {
    /// Create a driver over an already-constructed link.
    pub fn new(link: L, delay: D) -> Self {
        Self { link, delay }
    }

    /// Reset and configure the chip, returning the version it reports.
    pub fn init(&mut self, config: &CodecConfig) -> Result<ChipVersion, LinkError> {
        tracing::info!(app = APP_NAME, version = APP_VERSION, "initialising VS1011e");

        self.link.release()?;
        self.delay.delay_ms(10);

        // Soft reset, staying in new mode
        self.write_register(Register::Mode, SM_SDINEW | SM_RESET)?;
        self.delay.delay_ms(SETTLE_MS);

        let clockf = clockf_for_crystal(config.crystal_hz);
        self.write_register(Register::Clockf, clockf)?;
        self.delay.delay_ms(SETTLE_MS);

        self.link.wait_ready()?;
        self.delay.delay_ms(100);

        self.set_master_volume(config.initial_volume)?;

        let version = self.version()?;
        tracing::info!(version = version.0, clockf, "VS1011e ready");
        if !version.is_vs1011() {
            tracing::warn!(version = version.0, "unexpected chip version");
        }
        Ok(version)
    }

    /// Clock one SCI byte, waiting for DREQ first.
    fn control_byte(&mut self, byte: u8) -> Result<u8, LinkError> {
        self.link.wait_ready()?;
        self.link.exchange(byte)
    }

    /// Run `frame` with the control channel selected, always releasing it.
    fn with_control<T>(
        &mut self,
        frame: impl FnOnce(&mut Self) -> Result<T, LinkError>,
    ) -> Result<T, LinkError> {
        self.link.wait_ready()?;
        self.link.select(Channel::Control)?;
        let result = frame(self).and_then(|value| {
            // command completion
            self.link.wait_ready()?;
            Ok(value)
        });
        let released = self.link.release();
        let value = result?;
        released?;
        Ok(value)
    }

    /// Read a 16-bit register.
    pub fn read_register(&mut self, reg: Register) -> Result<u16, LinkError> {
        let value = self.with_control(|this| {
            this.control_byte(OP_READ)?;
            this.control_byte(reg.addr())?;
            let hi = this.control_byte(0xFF)?;
            let lo = this.control_byte(0xFF)?;
            Ok(u16::from_be_bytes([hi, lo]))
        })?;
        tracing::trace!(addr = reg.addr(), value, "sci read");
        Ok(value)
    }

    /// Write a 16-bit register.
    pub fn write_register(&mut self, reg: Register, value: u16) -> Result<(), LinkError> {
        tracing::trace!(addr = reg.addr(), value, "sci write");
        let [hi, lo] = value.to_be_bytes();
        self.with_control(|this| {
            this.control_byte(OP_WRITE)?;
            this.control_byte(reg.addr())?;
            this.control_byte(hi)?;
            this.control_byte(lo)?;
            Ok(())
        })
    }

    /// Set `mask` bits in `reg`.
    pub fn set_bits(&mut self, reg: Register, mask: u16) -> Result<(), LinkError> {
        let value = self.read_register(reg)?;
        self.write_register(reg, value | mask)
    }

    /// Clear `mask` bits in `reg`.
    pub fn clear_bits(&mut self, reg: Register, mask: u16) -> Result<(), LinkError> {
        let value = self.read_register(reg)?;
        self.write_register(reg, value & !mask)
    }

    /// Set per-channel output level.
    pub fn set_volume(&mut self, left: VolumeLevel, right: VolumeLevel) -> Result<(), LinkError> {
        let vol = Attenuation::pack(Attenuation::from_level(left), Attenuation::from_level(right));
        self.write_register(Register::Vol, vol)
    }

    /// Set the same output level on both channels.
    pub fn set_master_volume(&mut self, level: VolumeLevel) -> Result<(), LinkError> {
        self.set_volume(level, level)
    }

    /// Configure the bass enhancer, leaving the treble half untouched.
    pub fn set_bass(&mut self, bass: BassBoost) -> Result<(), LinkError> {
        let current = self.read_register(Register::Bass)?;
        let value = (current & BASS_TREBLE_MASK) | u16::from(bass.register_byte());
        self.write_register(Register::Bass, value)
    }

    /// Configure the treble control, leaving the bass half untouched.
    pub fn set_treble(&mut self, treble: TrebleBoost) -> Result<(), LinkError> {
        let current = self.read_register(Register::Bass)?;
        let value = (current & BASS_BASS_MASK) | u16::from_be_bytes([treble.register_byte(), 0]);
        self.write_register(Register::Bass, value)
    }

    /// Play a sine tone for two seconds.
    ///
    /// Blocks for the whole duration. Must not run while a stream is playing.
    pub fn sine_test(&mut self, tone: SineTone) -> Result<(), LinkError> {
        tracing::info!(code = tone.get(), "sine test");
        self.set_bits(Register::Mode, SM_TESTS)?;

        let mut start = SINE_TEST_START;
        if let Some(code) = start.get_mut(SINE_TEST_FREQ_INDEX) {
            *code = tone.get();
        }
        self.write_data(&start)?;
        self.delay.delay_ms(SINE_TEST_MS);
        self.write_data(&SINE_TEST_STOP)?;

        self.clear_bits(Register::Mode, SM_TESTS)
    }

    /// Send bytes over the data interface in 32-byte chunks, waiting for
    /// DREQ before each chunk.
    pub fn write_data(&mut self, bytes: &[u8]) -> Result<(), LinkError> {
        for chunk in bytes.chunks(SDI_CHUNK) {
            self.link.wait_ready()?;
            self.link.select(Channel::Data)?;
            let written = self.link.write(chunk);
            let released = self.link.release();
            written?;
            released?;
        }
        Ok(())
    }

    /// Zero the decode time counter.
    pub fn reset_decode_time(&mut self) -> Result<(), LinkError> {
        self.write_register(Register::DecodeTime, 0)
    }

    /// Seconds decoded since the last reset.
    pub fn decode_time(&mut self) -> Result<u16, LinkError> {
        self.read_register(Register::DecodeTime)
    }

    /// Version reported in `SCI_STATUS`.
    pub fn version(&mut self) -> Result<ChipVersion, LinkError> {
        let status = self.read_register(Register::Status)?;
        let ver = (status & SS_VER_MASK).wrapping_shr(u32::from(SS_VER_SHIFT));
        Ok(ChipVersion(u8::try_from(ver).unwrap_or_default()))
    }

    /// Read every register in address order.
    pub fn register_dump(&mut self) -> Result<RegisterDump, LinkError> {
        let mut values = [0u16; 16];
        for (slot, reg) in values.iter_mut().zip(Register::ALL) {
            *slot = self.read_register(reg)?;
        }
        Ok(RegisterDump { values })
    }

    /// Write the register dump to a diagnostic sink.
    pub fn write_register_dump<W: fmt::Write>(&mut self, out: &mut W) -> Result<(), LinkError> {
        let dump = self.register_dump()?;
        if write!(out, "{dump}").is_err() {
            tracing::warn!("register dump sink rejected output");
        }
        Ok(())
    }

    /// Borrow the link.
    pub fn link(&self) -> &L {
        &self.link
    }

    /// Mutably borrow the link.
    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    /// Release the link and delay.
    pub fn free(self) -> (L, D) {
        (self.link, self.delay)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::mocks::{NoopDelay, SimLink, SimulatedChip};
    use std::string::String;

    fn driver(chip: &SimulatedChip) -> Vs1011e<SimLink, NoopDelay> {
        Vs1011e::new(chip.link(), NoopDelay::new())
    }

    #[test]
    fn init_resets_and_programs_clock() {
        let chip = SimulatedChip::new();
        let mut drv = driver(&chip);
        let version = drv.init(&CodecConfig::default()).unwrap();

        assert!(version.is_vs1011());
        assert_eq!(chip.register(Register::Clockf), 0x32C8);
        // reset bit self-clears, new mode stays
        assert_eq!(chip.register(Register::Mode), SM_SDINEW);
        assert_eq!(chip.register(Register::Vol), 0x3636);
        assert!(chip.violations().is_clean());
    }

    #[test]
    fn write_then_read_register() {
        let chip = SimulatedChip::new();
        let mut drv = driver(&chip);
        drv.write_register(Register::AiCtrl0, 0xBEEF).unwrap();
        assert_eq!(drv.read_register(Register::AiCtrl0).unwrap(), 0xBEEF);
        assert!(chip.violations().is_clean());
    }

    #[test]
    fn volume_maps_level_to_attenuation() {
        let chip = SimulatedChip::new();
        let mut drv = driver(&chip);
        drv.set_volume(VolumeLevel::new(254), VolumeLevel::new(0)).unwrap();
        assert_eq!(chip.register(Register::Vol), 0x00FE);
        drv.set_master_volume(VolumeLevel::new(255)).unwrap();
        assert_eq!(chip.register(Register::Vol), 0x0000);
    }

    #[test]
    fn bass_and_treble_touch_only_their_byte() {
        let chip = SimulatedChip::new();
        let mut drv = driver(&chip);
        drv.set_treble(TrebleBoost::new(-2, 10)).unwrap();
        drv.set_bass(BassBoost::new(12, 5)).unwrap();
        assert_eq!(chip.register(Register::Bass), 0xEAC5);
        drv.set_treble(TrebleBoost::OFF).unwrap();
        assert_eq!(chip.register(Register::Bass), 0x00C5);
    }

    #[test]
    fn sine_test_sends_start_and_stop_sequences() {
        let chip = SimulatedChip::new();
        let mut drv = driver(&chip);
        drv.write_register(Register::Mode, SM_SDINEW).unwrap();
        drv.sine_test(SineTone::STANDARD).unwrap();

        assert_eq!(
            chip.data(),
            [0x53, 0xEF, 0x6E, 0x44, 0, 0, 0, 0, 0x45, 0x78, 0x69, 0x74, 0, 0, 0, 0]
        );
        assert_eq!(chip.register(Register::Mode), SM_SDINEW);
        let (_, delay) = drv.free();
        assert_eq!(delay.elapsed_ms(), 2000);
    }

    #[test]
    fn write_data_waits_per_chunk() {
        let chip = SimulatedChip::with_capacity(64, 32);
        let mut drv = driver(&chip);
        drv.write_data(&[0xA5; 200]).unwrap();
        assert_eq!(chip.data().len(), 200);
        assert!(chip.violations().is_clean());
    }

    #[test]
    fn register_dump_lists_all_registers() {
        let chip = SimulatedChip::new();
        let mut drv = driver(&chip);
        drv.write_register(Register::Clockf, 0x32C8).unwrap();
        let mut out = String::new();
        drv.write_register_dump(&mut out).unwrap();

        assert_eq!(out.lines().count(), 16);
        assert!(out.contains("Reg 1 = 0x10\n"));
        assert!(out.contains("Reg 3 = 0x32C8\n"));
    }

    proptest::proptest! {
        // MODE excluded: its reset bit self-clears
        #[test]
        fn register_write_read_round_trip(addr in 1u8..16, value in proptest::num::u16::ANY) {
            let chip = SimulatedChip::new();
            let mut drv = driver(&chip);
            let reg = Register::from_addr(addr).unwrap();
            drv.write_register(reg, value).unwrap();
            proptest::prop_assert_eq!(drv.read_register(reg).unwrap(), value);
            proptest::prop_assert!(chip.violations().is_clean());
        }

        #[test]
        fn master_volume_sets_both_attenuations(level in 0u8..=255u8) {
            let chip = SimulatedChip::new();
            let mut drv = driver(&chip);
            drv.set_master_volume(VolumeLevel::new(level)).unwrap();
            let att = u16::from(254 - level.min(254));
            proptest::prop_assert_eq!(chip.register(Register::Vol), (att << 8) | att);
        }
    }

    #[test]
    fn decode_time_reset() {
        let chip = SimulatedChip::new();
        chip.set_register(Register::DecodeTime, 42);
        let mut drv = driver(&chip);
        drv.reset_decode_time().unwrap();
        assert_eq!(drv.decode_time().unwrap(), 0);
    }
}
