//! Byte-level link to the VS1011e
//!
//! The codec and the storage card share one SPI bus. Three active-low select
//! lines pick the target:
//!
//! | Line   | Channel            |
//! |--------|--------------------|
//! | `XCS`  | control (SCI)      |
//! | `XDCS` | data (SDI)         |
//! | `SDCS` | storage card       |
//!
//! At most one line is low at any instant. [`CodecLink::select`] raises the
//! other two before lowering the target; [`CodecLink::release`] raises the
//! codec lines again. The storage line belongs to the storage driver and is
//! only ever driven high here.

use embedded_hal::digital::{self, InputPin, OutputPin};
use embedded_hal::spi::{self, SpiBus};

use crate::gpio::InterruptPin;

/// Bus target selected by one of the three select lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    /// Serial control interface (register access)
    Control,
    /// Serial data interface (compressed audio)
    Data,
    /// Removable storage card
    Storage,
}

/// Bus or pin fault on the codec link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LinkError {
    /// SPI transfer failed.
    #[error("spi transfer failed: {0:?}")]
    Spi(spi::ErrorKind),
    /// A select line could not be driven.
    #[error("select line fault: {0:?}")]
    Select(digital::ErrorKind),
    /// The ready line could not be read or its trigger reconfigured.
    #[error("ready line fault: {0:?}")]
    Ready(digital::ErrorKind),
}

fn spi_err<E: spi::Error>(e: E) -> LinkError {
    LinkError::Spi(e.kind())
}

fn select_err<E: digital::Error>(e: E) -> LinkError {
    LinkError::Select(e.kind())
}

fn ready_err<E: digital::Error>(e: E) -> LinkError {
    LinkError::Ready(e.kind())
}

/// Transfer framing used by the register interface and the stream feeder.
///
/// Implemented by [`CodecLink`]; the seam exists so the driver is generic over
/// one type instead of five pin and bus parameters.
pub trait ChipLink {
    /// Sample the ready line (DREQ).
    fn is_ready(&mut self) -> Result<bool, LinkError>;

    /// Busy-wait until the ready line is observed high.
    ///
    /// Unbounded: a chip that never raises DREQ hangs the caller.
    fn wait_ready(&mut self) -> Result<(), LinkError> {
        while !self.is_ready()? {
            core::hint::spin_loop();
        }
        Ok(())
    }

    /// Assert exactly one select line, raising the others first.
    fn select(&mut self, channel: Channel) -> Result<(), LinkError>;

    /// Flush the bus and raise the codec select lines.
    fn release(&mut self) -> Result<(), LinkError>;

    /// Clock one byte out and return the byte clocked in.
    fn exchange(&mut self, byte: u8) -> Result<u8, LinkError>;

    /// Clock `bytes` out, discarding what comes back.
    fn write(&mut self, bytes: &[u8]) -> Result<(), LinkError>;

    /// Arm the rising-edge trigger on the ready line.
    fn arm_trigger(&mut self) -> Result<(), LinkError>;

    /// Disarm the ready-line trigger.
    fn disarm_trigger(&mut self) -> Result<(), LinkError>;

    /// Whether the ready-line trigger is armed.
    fn trigger_armed(&self) -> bool;

    /// Currently selected channel, if any.
    fn selected(&self) -> Option<Channel>;
}

/// [`ChipLink`] over `embedded-hal` SPI and GPIO.
pub struct CodecLink<SPI, XCS, XDCS, SDCS, DREQ> {
    spi: SPI,
    xcs: XCS,
    xdcs: XDCS,
    sdcs: SDCS,
    dreq: DREQ,
    selected: Option<Channel>,
}

impl<SPI, XCS, XDCS, SDCS, DREQ> CodecLink<SPI, XCS, XDCS, SDCS, DREQ>
where
    SPI: SpiBus<u8>,
    XCS: OutputPin,
    XDCS: OutputPin,
    SDCS: OutputPin,
    DREQ: InterruptPin,
{
    /// Take ownership of the bus and pins, driving every select line high.
    ///
    /// `spi` must already be configured per [`crate::config::CODEC_SPI`].
    pub fn new(spi: SPI, xcs: XCS, xdcs: XDCS, sdcs: SDCS, dreq: DREQ) -> Result<Self, LinkError> {
        let mut link = Self {
            spi,
            xcs,
            xdcs,
            sdcs,
            dreq,
            selected: None,
        };
        link.release_all()?;
        Ok(link)
    }

    /// Raise all three select lines, including the storage line.
    pub fn release_all(&mut self) -> Result<(), LinkError> {
        self.xcs.set_high().map_err(select_err)?;
        self.xdcs.set_high().map_err(select_err)?;
        self.sdcs.set_high().map_err(select_err)?;
        self.selected = None;
        Ok(())
    }

    /// Give back the bus and pins.
    pub fn free(self) -> (SPI, XCS, XDCS, SDCS, DREQ) {
        (self.spi, self.xcs, self.xdcs, self.sdcs, self.dreq)
    }
}

impl<SPI, XCS, XDCS, SDCS, DREQ> ChipLink for CodecLink<SPI, XCS, XDCS, SDCS, DREQ>
where
    SPI: SpiBus<u8>,
    XCS: OutputPin,
    XDCS: OutputPin,
    SDCS: OutputPin,
    DREQ: InterruptPin,
{
    fn is_ready(&mut self) -> Result<bool, LinkError> {
        InputPin::is_high(&mut self.dreq).map_err(ready_err)
    }

    fn select(&mut self, channel: Channel) -> Result<(), LinkError> {
        // raise everything that is not the target before lowering it
        if channel != Channel::Control {
            self.xcs.set_high().map_err(select_err)?;
        }
        if channel != Channel::Data {
            self.xdcs.set_high().map_err(select_err)?;
        }
        if channel != Channel::Storage {
            self.sdcs.set_high().map_err(select_err)?;
        }
        match channel {
            Channel::Control => self.xcs.set_low().map_err(select_err)?,
            Channel::Data => self.xdcs.set_low().map_err(select_err)?,
            Channel::Storage => self.sdcs.set_low().map_err(select_err)?,
        }
        self.selected = Some(channel);
        Ok(())
    }

    fn release(&mut self) -> Result<(), LinkError> {
        self.spi.flush().map_err(spi_err)?;
        self.xcs.set_high().map_err(select_err)?;
        self.xdcs.set_high().map_err(select_err)?;
        if self.selected == Some(Channel::Storage) {
            self.sdcs.set_high().map_err(select_err)?;
        }
        self.selected = None;
        Ok(())
    }

    fn exchange(&mut self, byte: u8) -> Result<u8, LinkError> {
        let mut buf = [byte];
        self.spi.transfer_in_place(&mut buf).map_err(spi_err)?;
        let [received] = buf;
        Ok(received)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), LinkError> {
        self.spi.write(bytes).map_err(spi_err)
    }

    fn arm_trigger(&mut self) -> Result<(), LinkError> {
        self.dreq.enable_interrupt().map_err(ready_err)
    }

    fn disarm_trigger(&mut self) -> Result<(), LinkError> {
        self.dreq.disable_interrupt().map_err(ready_err)
    }

    fn trigger_armed(&self) -> bool {
        self.dreq.interrupt_enabled()
    }

    fn selected(&self) -> Option<Channel> {
        self.selected
    }
}
