//! Trait definitions for hardware and transport abstraction.
//!
//! This module defines the seams that let joystick-compass:
//! - Run on different hardware (ESP32 ADC, desktop mock)
//! - Sit behind different socket stacks (lwIP-style callbacks, std, tokio)
//!
//! # Submodules
//!
//! - `hardware`: Analog channel selection and raw sampling
//! - `network`: Connection handle and data-received events
//!
//! # Key Traits
//!
//! - [`AnalogSampler`]: Multiplexed ADC used by the sensor reader
//! - [`Connection`]: Acknowledge, write, flush and close for one exchange

pub mod hardware;
pub mod network;

pub use hardware::*;
pub use network::*;
