//! Hardware Abstraction Layer (HAL) for the Tune MP3 shield
//!
//! This crate provides the hardware seams and the VS1011e codec driver,
//! enabling development and testing without physical hardware.
//!
//! # Architecture Layers
//!
//! ```text
//! Feature Layers (playback, library)
//!         ↓
//! Platform HAL (this crate - traits + codec driver)
//!         ↓
//! Board HAL (any embedded-hal 1.0 implementation)
//! ```
//!
//! # Contents
//!
//! - [`vs1011e`] - codec link, register interface and register map
//! - [`Storage`] / [`File`] - read-only file access for tracks
//! - [`gpio`] - ready-line edge interrupt control
//! - [`audio_types`] - range-checked volume and tone newtypes
//! - [`config`] - bus and bring-up constants
//!
//! # Features
//!
//! - `std`: host storage backend and simulators (for testing)
//! - `defmt`: Enable defmt derives
//!
//! # Example
//!
//! ```no_run
//! use platform::config::CodecConfig;
//! use platform::vs1011e::{ChipLink, Vs1011e};
//! use embedded_hal::delay::DelayNs;
//!
//! fn bring_up<L: ChipLink, D: DelayNs>(codec: &mut Vs1011e<L, D>) {
//!     codec.init(&CodecConfig::default()).unwrap();
//! }
//! ```

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(clippy::unreachable)] // no unreachable!() that isn't documented
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)] // unsafe fn body is not implicitly unsafe block
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
// Pedantic lints suppressed for this hardware HAL crate:
#![allow(clippy::doc_markdown)] // register names in doc comments
#![allow(clippy::must_use_candidate)] // hardware accessors, callers decide
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(async_fn_in_trait)] // Embassy no_std: single-threaded, Send bounds not needed

#[cfg(feature = "std")]
extern crate std;

pub mod audio_types;
pub mod config;
pub mod gpio;
pub mod peripheral;
pub mod storage;
pub mod vs1011e;

#[cfg(any(test, feature = "std"))]
pub mod mocks;
#[cfg(any(test, feature = "std"))]
pub mod storage_local;

pub use storage::{read_full, File, Storage};

// Re-export GPIO types
pub use embedded_hal::digital::{InputPin, OutputPin};
pub use gpio::InterruptPin;

// Re-export peripheral types
pub use peripheral::{BitOrder, SpiConfig, SpiMode};

// Re-export codec types
pub use vs1011e::{Channel, ChipLink, CodecLink, LinkError, Register, Vs1011e};
