//! AM2302 Sensor Decoder for Embedded Rust
//!
//! This crate provides a platform-agnostic driver for the AM2302 (DHT22) temperature
//! and humidity sensor, built on top of the [`embedded-hal`] traits.
//!
//! Unlike a bit-synchronous driver, a read first records the duration of every
//! edge of the transmission and only then decodes it. Keeping the raw timings
//! allows a frame with one late-detected edge to be repaired instead of dropped.
//!
//! # Features
//! - Blocking synchronous API using `embedded-hal` traits
//! - Designed for `no_std` environments
//! - Capture, decode, validation and single-defect correction usable separately
//! - Optional logging support via `defmt`
//!
//! # Dependencies
//! This driver depends on the following `embedded-hal` traits:
//! - [`InputPin`] and [`OutputPin`] for GPIO access (open-drain pin)
//! - [`DelayNs`] for accurate timing
//!
//! plus a [`MicroClock`] implementation for a free-running microsecond counter.
//!
//! # Optional Features
//! - `defmt`: Implements `defmt::Format` for logging support and emits
//!   diagnostics for failed frames
//!
//! [`embedded-hal`]: https://docs.rs/embedded-hal
//! [`InputPin`]: embedded_hal::digital::InputPin
//! [`OutputPin`]: embedded_hal::digital::OutputPin
//! [`DelayNs`]: embedded_hal::delay::DelayNs

#![cfg_attr(not(test), no_std)]

pub mod am2302;
pub mod correct;
pub mod edge;
pub mod error;
pub mod frame;
pub mod timer;
pub mod validate;

pub use am2302::{Am2302, Capture, Config, Reading};
pub use correct::{Correction, Defects};
pub use edge::EdgeWaiter;
pub use error::Am2302Error;
pub use frame::{EdgeTimings, FRAME_BITS, Frame, StartSequence};
pub use timer::{ElapsedTimer, MicroClock};
pub use validate::Validation;
