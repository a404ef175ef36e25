//! ESP32-C3 hardware abstraction layer for the joystick compass.
//!
//! This module provides hardware implementations for an ESP32-C3 board with
//! a two-axis analog joystick wired to ADC1.
//!
//! # Hardware Configuration
//!
//! - **MCU**: ESP32-C3 (RISC-V 160MHz, 4MB Flash)
//! - **Joystick**: two potentiometers (VRx, VRy) at 3.3V full scale
//! - **Network**: on-chip WiFi in station mode
//!
//! # Pin Assignments
//!
//! See the [`pins`] module for GPIO assignments.

mod joystick;

pub use joystick::Esp32Joystick;

#[cfg(feature = "wifi")]
mod wifi;
#[cfg(feature = "wifi")]
pub use wifi::Esp32Wifi;

/// Pin assignments for the joystick board.
///
/// On the ESP32-C3, GPIO0 and GPIO1 are ADC1 channels 0 and 1, so the
/// channel numbers used by [`SensorReader`](crate::SensorReader) match the
/// GPIO numbers.
pub mod pins {
    // =========================================================================
    // Joystick (ADC1)
    // =========================================================================

    /// Y axis (VRy), ADC1 channel 0
    pub const JOYSTICK_Y: i32 = 0;

    /// X axis (VRx), ADC1 channel 1
    pub const JOYSTICK_X: i32 = 1;
}
