//! GPIO abstractions beyond `embedded-hal`
//!
//! `embedded-hal` 1.0 covers plain input and output pins. The codec's ready
//! line additionally needs edge-interrupt control: the stream feeder attaches
//! a rising-edge trigger while playing and masks it around every data burst.

use embedded_hal::digital::InputPin;

/// Input pin with edge-interrupt control.
///
/// Enabling the interrupt only arms the hardware trigger; delivering the
/// notification to the feed task is the job of the interrupt glue (see
/// `playback::task::ReadyEdge`).
pub trait InterruptPin: InputPin {
    /// Arm the rising-edge trigger.
    fn enable_interrupt(&mut self) -> Result<(), Self::Error>;

    /// Disarm the edge trigger. Pending edges are discarded.
    fn disable_interrupt(&mut self) -> Result<(), Self::Error>;

    /// Whether the trigger is currently armed.
    fn interrupt_enabled(&self) -> bool;
}
