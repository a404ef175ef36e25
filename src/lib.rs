//! # joystick-compass
//!
//! Firmware core for a two-axis analog joystick that reports its position
//! as a compass-rose direction over a tiny HTTP interface.
//!
//! ## Features
//!
//! - **Hardware abstraction**: an [`AnalogSampler`] trait for the ADC and a
//!   [`Connection`] trait for the transport, with mocks for desktop testing
//! - **Direction classification**: nine directions from a dead-zone tendency
//!   table
//! - **Two routes**: `GET /data` returns JSON telemetry, everything else gets
//!   a self-refreshing HTML dashboard
//! - **Bounded memory**: responses are rendered into a fixed buffer owned by
//!   the dispatcher
//!
//! ## Architecture
//!
//! The crate is structured to allow testing on desktop without hardware:
//!
//! - `traits` - Hardware and transport abstractions
//! - `sensor` - Axis sampling and percentage scaling
//! - `direction` - Dead zone, tendencies and the compass rose
//! - `router` - Request-line route selection
//! - `response` - HTTP response rendering
//! - `dispatcher` - Per-connection state machine that ties everything together
//! - `hal` - Concrete implementations (mock for testing, esp32 for hardware)
//! - `services` - Socket transports (blocking std, async tokio)
//!
//! ## Example
//!
//! ```rust
//! use joystick_compass::{
//!     classify, hal::MockAdc, AxisReading, DeadZone, Direction, SensorReader,
//! };
//!
//! // Classify a reading directly
//! let x = AxisReading::new(90).unwrap();
//! let y = AxisReading::new(50).unwrap();
//! assert_eq!(classify(x, y, DeadZone::DEFAULT), Direction::East);
//!
//! // Or sample through a reader with a mock ADC
//! let adc = MockAdc::new().with_percent(1, 10).with_percent(0, 90);
//! let mut reader = SensorReader::new(adc);
//! let sample = reader.sample(DeadZone::DEFAULT);
//! assert_eq!(sample.direction.name(), "Noroeste");
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

/// Shared configuration system for desktop and ESP32.
pub mod config;
/// Dead zone, axis tendencies and compass-rose classification.
pub mod direction;
/// Per-connection request state machine.
pub mod dispatcher;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// HTTP response rendering into a bounded buffer.
pub mod response;
/// Request-line route selection.
pub mod router;
/// Joystick axis sampling.
pub mod sensor;
/// Core traits for hardware and transport abstraction.
pub mod traits;

/// Socket transports driving the dispatcher (requires `std`).
#[cfg(feature = "std")]
pub mod services;

// Re-exports for convenience
pub use direction::{classify, DeadZone, DeadZoneError, Direction, Tendency};
pub use dispatcher::{
    ConnectionPhase, DispatchError, DispatchOutcome, DropReason, RequestDispatcher, Session,
    REQUEST_SCRATCH_CAPACITY,
};
pub use response::{ContentType, FormatError, ResponseFormatter, RESPONSE_CAPACITY};
pub use router::Route;
pub use sensor::{AxisReading, JoystickSample, SensorReader};
pub use traits::{AnalogSampler, Connection, DataEvent};

// Config re-exports
pub use config::{Config, ConfigError, DeviceConfig, JoystickConfig, WebConfig, WifiConfig};
