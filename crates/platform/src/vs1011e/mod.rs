//! VLSI VS1011e MP3 decoder
//!
//! - [`link`]: select-line discipline and raw byte transfer
//! - [`driver`]: register access, derived settings and data writes
//! - [`registers`]: SCI register map and bit fields

pub mod driver;
pub mod link;
pub mod registers;

pub use driver::{ChipVersion, RegisterDump, Vs1011e};
pub use link::{Channel, ChipLink, CodecLink, LinkError};
pub use registers::Register;
