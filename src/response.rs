//! HTTP response rendering into a fixed-capacity buffer.
//!
//! Both routes produce the same framing:
//!
//! ```text
//! HTTP/1.1 200 OK\r\n
//! Content-Type: <type>\r\n
//! Content-Length: <body bytes>\r\n
//! Connection: close\r\n
//! \r\n
//! <body>
//! ```
//!
//! `Content-Length` is always the byte length of the body that follows. The
//! whole response is checked against the buffer capacity before anything is
//! copied in, so the buffer holds either a complete response or nothing.

use core::fmt::{self, Write as _};

use heapless::{String, Vec};
use serde::Serialize;

use crate::sensor::{AxisReading, JoystickSample};

/// Default response buffer capacity in bytes.
pub const RESPONSE_CAPACITY: usize = 1024;

/// Scratch space for the JSON telemetry body.
pub const JSON_BODY_CAPACITY: usize = 64;

/// Scratch space for the status line and headers.
const HEAD_CAPACITY: usize = 128;

/// Static dashboard document. Polls the telemetry path once per second.
pub const DASHBOARD_HTML: &str = include_str!("../www/dashboard.html");

// ============================================================================
// Content Types
// ============================================================================

/// Body type announced in the `Content-Type` header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContentType {
    /// `application/json`
    Json,
    /// `text/html; charset=utf-8`
    Html,
}

impl ContentType {
    /// Header value.
    pub const fn as_str(self) -> &'static str {
        match self {
            ContentType::Json => "application/json",
            ContentType::Html => "text/html; charset=utf-8",
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// A response could not be rendered.
///
/// Neither case is reachable with the default capacities; they exist so a
/// smaller buffer fails loudly instead of truncating.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatError {
    /// Header plus body would not fit in the response buffer.
    Capacity {
        /// Bytes the full response needs.
        needed: usize,
        /// Bytes the buffer holds.
        capacity: usize,
    },
    /// The JSON body did not fit its scratch buffer.
    Body,
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::Capacity { needed, capacity } => write!(
                f,
                "response needs {} bytes, buffer holds {}",
                needed, capacity
            ),
            FormatError::Body => f.write_str("telemetry body exceeds scratch buffer"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for FormatError {}

// ============================================================================
// Telemetry Body
// ============================================================================

/// Wire shape of the telemetry document.
#[derive(Serialize)]
struct TelemetryBody<'a> {
    #[serde(rename = "eixo_x")]
    x: AxisReading,
    #[serde(rename = "eixo_y")]
    y: AxisReading,
    #[serde(rename = "direcao")]
    direction: &'a str,
}

impl<'a> From<&'a JoystickSample> for TelemetryBody<'a> {
    fn from(sample: &'a JoystickSample) -> Self {
        Self {
            x: sample.x,
            y: sample.y,
            direction: sample.direction.name(),
        }
    }
}

/// Render the compact telemetry object into `out`, returning its length.
pub fn render_telemetry_body(sample: &JoystickSample, out: &mut [u8]) -> Result<usize, FormatError> {
    serde_json_core::to_slice(&TelemetryBody::from(sample), out).map_err(|_| FormatError::Body)
}

// ============================================================================
// Response Formatter
// ============================================================================

/// Owns the response buffer and renders complete responses into it.
///
/// One formatter is reused for every request. Each call overwrites the
/// previous response.
///
/// # Example
///
/// ```rust
/// use joystick_compass::{AxisReading, DeadZone, JoystickSample, ResponseFormatter};
///
/// let sample = JoystickSample::new(
///     AxisReading::new(90).unwrap(),
///     AxisReading::new(50).unwrap(),
///     DeadZone::DEFAULT,
/// );
///
/// let mut formatter: ResponseFormatter = ResponseFormatter::new();
/// formatter.format_telemetry(&sample).unwrap();
///
/// let text = core::str::from_utf8(formatter.as_bytes()).unwrap();
/// assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
/// assert!(text.ends_with(r#"{"eixo_x":90,"eixo_y":50,"direcao":"Leste"}"#));
/// ```
#[derive(Debug, Default)]
pub struct ResponseFormatter<const N: usize = RESPONSE_CAPACITY> {
    buf: Vec<u8, N>,
}

impl<const N: usize> ResponseFormatter<N> {
    /// Empty formatter.
    pub const fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Render the JSON telemetry response for `sample`.
    pub fn format_telemetry(&mut self, sample: &JoystickSample) -> Result<usize, FormatError> {
        let mut body = [0u8; JSON_BODY_CAPACITY];
        let len = match render_telemetry_body(sample, &mut body) {
            Ok(len) => len,
            Err(e) => {
                self.buf.clear();
                return Err(e);
            }
        };
        self.render(ContentType::Json, &body[..len])
    }

    /// Render the static dashboard response.
    pub fn format_dashboard(&mut self) -> Result<usize, FormatError> {
        self.render(ContentType::Html, DASHBOARD_HTML.as_bytes())
    }

    /// Bytes of the last rendered response (empty after a failure).
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Length of the last rendered response.
    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether the buffer is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Buffer capacity in bytes.
    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Discard the last response.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    fn render(&mut self, content_type: ContentType, body: &[u8]) -> Result<usize, FormatError> {
        self.buf.clear();

        let mut head: String<HEAD_CAPACITY> = String::new();
        write!(
            head,
            "HTTP/1.1 200 OK\r\n\
             Content-Type: {}\r\n\
             Content-Length: {}\r\n\
             Connection: close\r\n\
             \r\n",
            content_type.as_str(),
            body.len()
        )
        .map_err(|_| FormatError::Capacity {
            needed: HEAD_CAPACITY + body.len(),
            capacity: N,
        })?;

        let needed = head.len() + body.len();
        if needed > N {
            return Err(FormatError::Capacity {
                needed,
                capacity: N,
            });
        }

        let overflow = FormatError::Capacity {
            needed,
            capacity: N,
        };
        if self.buf.extend_from_slice(head.as_bytes()).is_err()
            || self.buf.extend_from_slice(body).is_err()
        {
            self.buf.clear();
            return Err(overflow);
        }
        Ok(self.buf.len())
    }
}
