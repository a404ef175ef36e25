//! Mock implementations for testing without hardware.
//!
//! This module provides test doubles for the hardware and transport traits,
//! enabling development and testing on desktop without a board or a socket.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockAdc`] | [`AnalogSampler`] | Per-channel raw values, records selections |
//! | [`MockConnection`] | [`Connection`] | Records acks, writes, flushes and close |
//!
//! # Example
//!
//! ```rust
//! use joystick_compass::hal::{MockAdc, MockConnection};
//! use joystick_compass::{DataEvent, RequestDispatcher};
//!
//! let adc = MockAdc::new()
//!     .with_percent(1, 90)
//!     .with_percent(0, 50);
//! let mut dispatcher: RequestDispatcher<_> = RequestDispatcher::new(adc);
//!
//! let mut conn = MockConnection::new();
//! let mut session = dispatcher.on_accept();
//! dispatcher
//!     .on_data(&mut session, &mut conn, DataEvent::data(b"GET /data HTTP/1.1\r\n\r\n"))
//!     .unwrap();
//!
//! assert!(conn.closed);
//! assert!(conn.body().ends_with(br#""direcao":"Leste"}"#));
//! ```
//!
//! [`AnalogSampler`]: crate::traits::AnalogSampler
//! [`Connection`]: crate::traits::Connection

use alloc::vec::Vec;

use crate::sensor::DEFAULT_MAX_CODE;
use crate::traits::{AnalogSampler, Connection};

/// Number of channels a [`MockAdc`] can hold.
pub const MOCK_ADC_CHANNELS: usize = 8;

// ============================================================================
// Hardware Mocks
// ============================================================================

/// Mock multiplexed ADC.
///
/// Each channel holds a fixed raw value that is returned on every read.
/// Channel selections are recorded in order for verification.
///
/// # Example
///
/// ```rust
/// use joystick_compass::hal::MockAdc;
/// use joystick_compass::traits::AnalogSampler;
///
/// let mut adc = MockAdc::new().with_raw(0, 1234);
/// assert_eq!(adc.sample(0), 1234);
/// assert_eq!(adc.sample(5), 0); // Unset channels read 0
/// assert_eq!(adc.selections(), &[0, 5]);
/// ```
#[derive(Debug, Default, Clone)]
pub struct MockAdc {
    raw: [u16; MOCK_ADC_CHANNELS],
    selected: Option<u8>,
    selections: Vec<u8>,
    reads: usize,
}

impl MockAdc {
    /// Creates a mock ADC with every channel at 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock ADC with every channel at the 12-bit midpoint.
    pub fn centered() -> Self {
        let mid = Self::raw_for_percent(50, DEFAULT_MAX_CODE);
        Self {
            raw: [mid; MOCK_ADC_CHANNELS],
            ..Self::default()
        }
    }

    /// Smallest raw code that scales to `percent` on a `max_code` converter.
    ///
    /// Exact for any `max_code` above 100.
    pub const fn raw_for_percent(percent: u8, max_code: u16) -> u16 {
        ((percent as u32 * max_code as u32 + 99) / 100) as u16
    }

    /// Set the raw value returned for `channel`.
    pub fn with_raw(mut self, channel: u8, raw: u16) -> Self {
        self.set_raw(channel, raw);
        self
    }

    /// Set `channel` so a 12-bit reader sees `percent`.
    pub fn with_percent(self, channel: u8, percent: u8) -> Self {
        self.with_raw(channel, Self::raw_for_percent(percent, DEFAULT_MAX_CODE))
    }

    /// Change the raw value returned for `channel`.
    ///
    /// Channels beyond [`MOCK_ADC_CHANNELS`] are ignored.
    pub fn set_raw(&mut self, channel: u8, raw: u16) {
        if let Some(slot) = self.raw.get_mut(channel as usize) {
            *slot = raw;
        }
    }

    /// Change `channel` so a 12-bit reader sees `percent`.
    pub fn set_percent(&mut self, channel: u8, percent: u8) {
        self.set_raw(channel, Self::raw_for_percent(percent, DEFAULT_MAX_CODE));
    }

    /// Channels selected so far, oldest first.
    pub fn selections(&self) -> &[u8] {
        &self.selections
    }

    /// Number of conversions taken.
    pub fn read_count(&self) -> usize {
        self.reads
    }
}

impl AnalogSampler for MockAdc {
    fn select_channel(&mut self, channel: u8) {
        self.selected = Some(channel);
        self.selections.push(channel);
    }

    fn read_raw(&mut self) -> u16 {
        self.reads += 1;
        self.selected
            .and_then(|ch| self.raw.get(ch as usize).copied())
            .unwrap_or(0)
    }
}

// ============================================================================
// Transport Mocks
// ============================================================================

/// Calls made on a [`MockConnection`], in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConnectionCall {
    /// `acknowledge(len)`
    Acknowledge(usize),
    /// `write(bytes)` with the byte count
    Write(usize),
    /// `flush()`
    Flush,
    /// `close()`
    Close,
}

/// Error returned by a [`MockConnection`] set to fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MockTransportError;

/// Mock connection handle.
///
/// Records every call for verification. Use the public fields to inspect
/// state after an exchange.
#[derive(Debug, Default)]
pub struct MockConnection {
    /// Total bytes acknowledged.
    pub acknowledged: usize,
    /// Bytes queued by `write`.
    pub written: Vec<u8>,
    /// Number of `flush` calls.
    pub flush_count: usize,
    /// Whether `close` was called.
    pub closed: bool,
    /// Every call, oldest first.
    pub calls: Vec<ConnectionCall>,
    /// When true, `write` fails with [`MockTransportError`].
    pub fail_writes: bool,
}

impl MockConnection {
    /// Creates a connection that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a connection whose writes fail.
    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    /// Written bytes after the header block (empty if no header yet).
    pub fn body(&self) -> &[u8] {
        self.written
            .windows(4)
            .position(|w| w == b"\r\n\r\n")
            .map(|i| &self.written[i + 4..])
            .unwrap_or(&[])
    }

    /// Written bytes as UTF-8, if valid.
    pub fn written_str(&self) -> Option<&str> {
        core::str::from_utf8(&self.written).ok()
    }
}

impl Connection for MockConnection {
    type Error = MockTransportError;

    fn acknowledge(&mut self, len: usize) {
        self.acknowledged += len;
        self.calls.push(ConnectionCall::Acknowledge(len));
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), MockTransportError> {
        if self.fail_writes {
            return Err(MockTransportError);
        }
        self.written.extend_from_slice(bytes);
        self.calls.push(ConnectionCall::Write(bytes.len()));
        Ok(())
    }

    fn flush(&mut self) -> Result<(), MockTransportError> {
        self.flush_count += 1;
        self.calls.push(ConnectionCall::Flush);
        Ok(())
    }

    fn close(&mut self) -> Result<(), MockTransportError> {
        self.closed = true;
        self.calls.push(ConnectionCall::Close);
        Ok(())
    }
}
