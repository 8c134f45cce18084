//! VS1011e serial control interface (SCI) register map
//!
//! Source: VLSI Solution VS1011e Datasheet v1.04, section 8.7.
//!
//! # Key SCI Constraints
//!
//! ## Every register is 16 bits, big-endian on the wire
//! A read is `0x03, addr` followed by two clocked bytes; a write is
//! `0x02, addr, hi, lo`. XCS must stay asserted for the whole frame.
//!
//! ## DREQ gates every access
//! The chip drops DREQ while it is busy executing an SCI operation. A new
//! frame, and each byte inside one, must wait for DREQ high. On the data
//! interface DREQ high means at least 32 bytes of FIFO space.
//!
//! ## SM_SDINEW
//! The reference shield wires separate XCS and XDCS lines, so the chip runs in
//! "new mode" with SM_SDINEW set. Clearing it would turn XDCS into a bit
//! clock input.

// ---------------------------------------------------------------------------
// Opcodes
// ---------------------------------------------------------------------------

/// SCI read instruction
pub const OP_READ: u8 = 0x03;

/// SCI write instruction
pub const OP_WRITE: u8 = 0x02;

// ---------------------------------------------------------------------------
// Register addresses
// ---------------------------------------------------------------------------

/// SCI register address (0x00–0x0F).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Register {
    /// Mode control
    Mode = 0x00,
    /// Status, including the chip version in bits 7..4
    Status = 0x01,
    /// Built-in bass/treble enhancer
    Bass = 0x02,
    /// Clock frequency and multiplier
    Clockf = 0x03,
    /// Decode time in seconds
    DecodeTime = 0x04,
    /// Misc. audio data (sample rate, channel count)
    Audata = 0x05,
    /// RAM write/read
    Wram = 0x06,
    /// Base address for RAM write/read
    WramAddr = 0x07,
    /// Stream header data 0
    Hdat0 = 0x08,
    /// Stream header data 1
    Hdat1 = 0x09,
    /// Start address of application
    AiAddr = 0x0A,
    /// Volume control
    Vol = 0x0B,
    /// Application control register 0
    AiCtrl0 = 0x0C,
    /// Application control register 1
    AiCtrl1 = 0x0D,
    /// Application control register 2
    AiCtrl2 = 0x0E,
    /// Application control register 3
    AiCtrl3 = 0x0F,
}

impl Register {
    /// All registers in address order.
    pub const ALL: [Self; 16] = [
        Self::Mode,
        Self::Status,
        Self::Bass,
        Self::Clockf,
        Self::DecodeTime,
        Self::Audata,
        Self::Wram,
        Self::WramAddr,
        Self::Hdat0,
        Self::Hdat1,
        Self::AiAddr,
        Self::Vol,
        Self::AiCtrl0,
        Self::AiCtrl1,
        Self::AiCtrl2,
        Self::AiCtrl3,
    ];

    /// Wire address of the register.
    #[must_use]
    pub const fn addr(self) -> u8 {
        self as u8
    }

    /// Register at `addr`, if it is in the map.
    #[must_use]
    pub fn from_addr(addr: u8) -> Option<Self> {
        Self::ALL.get(usize::from(addr)).copied()
    }
}

// ---------------------------------------------------------------------------
// SCI_MODE bits
// ---------------------------------------------------------------------------

/// Differential output (left channel inverted)
pub const SM_DIFF: u16 = 1 << 0;
/// Allow MPEG layers I and II
pub const SM_LAYER12: u16 = 1 << 1;
/// Soft reset (self-clearing)
pub const SM_RESET: u16 = 1 << 2;
/// Jump out of WAV decoding
pub const SM_OUTOFWAV: u16 = 1 << 3;
/// Allow SDI tests (sine test, memory test)
pub const SM_TESTS: u16 = 1 << 5;
/// Stream mode
pub const SM_STREAM: u16 = 1 << 6;
/// DCLK active edge
pub const SM_DACT: u16 = 1 << 8;
/// SDI bit order
pub const SM_SDIORD: u16 = 1 << 9;
/// Share SPI chip select
pub const SM_SDISHARE: u16 = 1 << 10;
/// VS1002 native SPI modes ("new mode")
pub const SM_SDINEW: u16 = 1 << 11;

// ---------------------------------------------------------------------------
// SCI_STATUS fields
// ---------------------------------------------------------------------------

/// Version field mask (bits 7..4)
pub const SS_VER_MASK: u16 = 0x00F0;
/// Version field shift
pub const SS_VER_SHIFT: u16 = 4;
/// `SS_VER` value reported by the VS1011
pub const SS_VER_VS1011: u8 = 1;

// ---------------------------------------------------------------------------
// SCI_BASS layout
// ---------------------------------------------------------------------------

/// Treble half of SCI_BASS (amplitude 15..12, frequency 11..8)
pub const BASS_TREBLE_MASK: u16 = 0xFF00;
/// Bass half of SCI_BASS (amplitude 7..4, frequency 3..0)
pub const BASS_BASS_MASK: u16 = 0x00FF;

// ---------------------------------------------------------------------------
// SDI test sequences
// ---------------------------------------------------------------------------

/// Sine test start; byte 3 is replaced by the frequency code.
pub const SINE_TEST_START: [u8; 8] = [0x53, 0xEF, 0x6E, 0x00, 0, 0, 0, 0];

/// Byte index of the frequency code inside [`SINE_TEST_START`].
pub const SINE_TEST_FREQ_INDEX: usize = 3;

/// Sine test stop ("Exit").
pub const SINE_TEST_STOP: [u8; 8] = [0x45, 0x78, 0x69, 0x74, 0, 0, 0, 0];

/// Data interface FIFO space guaranteed by one DREQ-high observation.
pub const SDI_CHUNK: usize = 32;
