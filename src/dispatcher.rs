//! Per-connection request handling.
//!
//! This module provides [`RequestDispatcher`], the component that turns
//! transport events into HTTP responses. It owns the sensor reader, the
//! response buffer and the request-line scratch space. Exclusive `&mut self`
//! access is the only thing that guards the response buffer, so the
//! dispatcher must be driven by one task at a time.
//!
//! # Connection Lifecycle
//!
//! ```text
//! on_accept ──► Idle ──on_data(bytes)──► RequestReceived ──write──► ResponseSent
//!                 │                                                      │
//!                 └──on_data(end of stream, no bytes)──► Closed ◄──close─┘
//! ```
//!
//! Once a session has left `Idle`, further events on it are ignored.
//!
//! # Example
//!
//! ```rust
//! use joystick_compass::{
//!     hal::{MockAdc, MockConnection},
//!     ConnectionPhase, DataEvent, DispatchOutcome, RequestDispatcher, Route,
//! };
//!
//! let adc = MockAdc::new().with_percent(1, 50).with_percent(0, 90);
//! let mut dispatcher = RequestDispatcher::new(adc);
//!
//! let mut conn = MockConnection::new();
//! let mut session = dispatcher.on_accept();
//! let outcome = dispatcher
//!     .on_data(&mut session, &mut conn, DataEvent::data(b"GET /data HTTP/1.1\r\n\r\n"))
//!     .unwrap();
//!
//! assert!(matches!(outcome, DispatchOutcome::Responded { route: Route::Telemetry, .. }));
//! assert_eq!(session.phase(), ConnectionPhase::Closed);
//! assert!(conn.body().ends_with(br#""direcao":"Norte"}"#));
//! ```

use core::fmt;

use heapless::Vec;
use log::{debug, error, info, warn};

use crate::config::JoystickConfig;
use crate::direction::DeadZone;
use crate::response::{FormatError, ResponseFormatter, RESPONSE_CAPACITY};
use crate::router::{request_line, Route};
use crate::sensor::SensorReader;
use crate::traits::{AnalogSampler, Connection, DataEvent};

/// Default request-line scratch capacity in bytes.
///
/// Only the request line is held; headers and body are acknowledged
/// without being copied.
pub const REQUEST_SCRATCH_CAPACITY: usize = 1024;

// ============================================================================
// Session State
// ============================================================================

/// Where a connection is in its single exchange.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ConnectionPhase {
    /// Accepted, nothing received yet.
    #[default]
    Idle,
    /// Request bytes consumed and acknowledged.
    RequestReceived,
    /// Response queued on the transport.
    ResponseSent,
    /// Closed by the dispatcher. Terminal.
    Closed,
}

/// Per-connection state, created by [`RequestDispatcher::on_accept`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Session {
    phase: ConnectionPhase,
}

impl Session {
    /// Current phase.
    #[inline]
    pub fn phase(&self) -> ConnectionPhase {
        self.phase
    }

    /// Whether the session still accepts a request.
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.phase == ConnectionPhase::Idle
    }

    /// Whether the dispatcher has closed the connection.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.phase == ConnectionPhase::Closed
    }
}

// ============================================================================
// Outcomes and Errors
// ============================================================================

/// What [`RequestDispatcher::on_data`] did with an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A response was written and the connection closed.
    Responded {
        /// Route the request matched.
        route: Route,
        /// Bytes written, header included.
        len: usize,
    },
    /// The peer ended the stream without a request. Closed, nothing sent.
    IdleClosed,
    /// The request was discarded without acknowledgement or response.
    ///
    /// The session stays `Idle`; the transport decides whether to retry.
    Dropped(DropReason),
    /// Nothing to do: an empty delivery, or the session already finished.
    Ignored,
}

/// Why a request was dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropReason {
    /// The request line did not fit the scratch buffer.
    ScratchExhausted {
        /// Length of the request line.
        len: usize,
        /// Scratch capacity.
        capacity: usize,
    },
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::ScratchExhausted { len, capacity } => write!(
                f,
                "request line of {} bytes exceeds {} byte scratch",
                len, capacity
            ),
        }
    }
}

/// A request could not be answered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchError<E> {
    /// The transport failed while writing, flushing or closing.
    Transport(E),
    /// The response did not fit the buffer. The connection was closed.
    Format(FormatError),
}

impl<E: fmt::Debug> fmt::Display for DispatchError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::Transport(e) => write!(f, "transport error: {:?}", e),
            DispatchError::Format(e) => write!(f, "format error: {}", e),
        }
    }
}

#[cfg(feature = "std")]
impl<E: fmt::Debug> std::error::Error for DispatchError<E> {}

impl<E> From<FormatError> for DispatchError<E> {
    fn from(e: FormatError) -> Self {
        DispatchError::Format(e)
    }
}

// ============================================================================
// Request Dispatcher
// ============================================================================

/// Answers one request per connection from a live joystick reading.
///
/// `RESP` is the response buffer capacity and `REQ` the request-line
/// scratch capacity, both in bytes.
#[derive(Debug)]
pub struct RequestDispatcher<
    A,
    const RESP: usize = RESPONSE_CAPACITY,
    const REQ: usize = REQUEST_SCRATCH_CAPACITY,
> {
    sensor: SensorReader<A>,
    dead_zone: DeadZone,
    formatter: ResponseFormatter<RESP>,
    scratch: Vec<u8, REQ>,
    served: u32,
}

impl<A: AnalogSampler> RequestDispatcher<A> {
    /// Dispatcher with the stock channel layout, a 12-bit scale and the
    /// default dead zone.
    pub fn new(sampler: A) -> Self {
        Self::with_reader(SensorReader::new(sampler), DeadZone::DEFAULT)
    }

    /// Dispatcher using the channels, scale and dead zone from `config`.
    pub fn from_config(sampler: A, config: &JoystickConfig) -> Self {
        Self::with_reader(SensorReader::from_config(sampler, config), config.dead_zone)
    }
}

impl<A: AnalogSampler, const RESP: usize, const REQ: usize> RequestDispatcher<A, RESP, REQ> {
    /// Dispatcher over an already configured reader.
    pub fn with_reader(sensor: SensorReader<A>, dead_zone: DeadZone) -> Self {
        Self {
            sensor,
            dead_zone,
            formatter: ResponseFormatter::new(),
            scratch: Vec::new(),
            served: 0,
        }
    }

    /// Start tracking a newly accepted connection. Nothing is sent.
    pub fn on_accept(&mut self) -> Session {
        debug!("connection accepted");
        Session::default()
    }

    /// Handle a data event on `session`.
    ///
    /// An end-of-stream with no bytes closes the connection. Any other
    /// non-empty delivery is taken as the whole request. Its request line
    /// is copied to scratch and routed, the full delivery is acknowledged,
    /// and the connection is answered and closed. A request line longer
    /// than `REQ` drops the request.
    ///
    /// # Errors
    ///
    /// [`DispatchError::Transport`] if the connection fails, and
    /// [`DispatchError::Format`] if the response does not fit `RESP` bytes.
    /// The session is `Closed` after either.
    pub fn on_data<C: Connection>(
        &mut self,
        session: &mut Session,
        conn: &mut C,
        event: DataEvent<'_>,
    ) -> Result<DispatchOutcome, DispatchError<C::Error>> {
        if !session.is_idle() {
            debug!("event on finished session ignored ({:?})", session.phase);
            return Ok(DispatchOutcome::Ignored);
        }

        if event.is_idle_close() {
            debug!("peer closed before sending a request");
            session.phase = ConnectionPhase::Closed;
            conn.close().map_err(DispatchError::Transport)?;
            return Ok(DispatchOutcome::IdleClosed);
        }

        let payload = event.payload();
        if payload.is_empty() {
            return Ok(DispatchOutcome::Ignored);
        }

        let line = request_line(payload);
        self.scratch.clear();
        if self.scratch.extend_from_slice(line).is_err() {
            let reason = DropReason::ScratchExhausted {
                len: line.len(),
                capacity: REQ,
            };
            warn!("request dropped: {}", reason);
            return Ok(DispatchOutcome::Dropped(reason));
        }

        conn.acknowledge(payload.len());
        session.phase = ConnectionPhase::RequestReceived;
        debug!("received {} byte request", payload.len());

        let route = Route::from_request(&self.scratch);
        self.scratch.clear();

        let sample = self.sensor.sample(self.dead_zone);
        debug!(
            "sample x={} y={} direction={}",
            sample.x.value(),
            sample.y.value(),
            sample.direction
        );

        let formatted = match route {
            Route::Telemetry => self.formatter.format_telemetry(&sample),
            Route::Dashboard => self.formatter.format_dashboard(),
        };
        let len = match formatted {
            Ok(len) => len,
            Err(e) => {
                error!("{} response not rendered: {}", route.as_str(), e);
                session.phase = ConnectionPhase::Closed;
                conn.close().map_err(DispatchError::Transport)?;
                return Err(DispatchError::Format(e));
            }
        };

        if let Err(e) = conn.write(self.formatter.as_bytes()) {
            session.phase = ConnectionPhase::Closed;
            return Err(DispatchError::Transport(e));
        }
        session.phase = ConnectionPhase::ResponseSent;

        let finished = conn.flush().and_then(|()| conn.close());
        session.phase = ConnectionPhase::Closed;
        finished.map_err(DispatchError::Transport)?;

        self.served = self.served.wrapping_add(1);
        info!("{} response, {} bytes", route.as_str(), len);
        Ok(DispatchOutcome::Responded { route, len })
    }

    /// Bytes of the most recent response (empty after a format failure).
    pub fn last_response(&self) -> &[u8] {
        self.formatter.as_bytes()
    }

    /// Dead zone used for classification.
    pub fn dead_zone(&self) -> DeadZone {
        self.dead_zone
    }

    /// Change the dead zone for subsequent requests.
    pub fn set_dead_zone(&mut self, dead_zone: DeadZone) {
        self.dead_zone = dead_zone;
    }

    /// Number of responses written since construction.
    pub fn served(&self) -> u32 {
        self.served
    }

    /// Borrow the sensor reader.
    pub fn sensor(&self) -> &SensorReader<A> {
        &self.sensor
    }

    /// Mutably borrow the sensor reader.
    pub fn sensor_mut(&mut self) -> &mut SensorReader<A> {
        &mut self.sensor
    }

    /// Give back the sensor reader.
    pub fn into_sensor(self) -> SensorReader<A> {
        self.sensor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::{ConnectionCall, MockAdc, MockConnection, MockTransportError};

    const TELEMETRY_REQUEST: &[u8] = b"GET /data HTTP/1.1\r\nHost: 192.168.4.1\r\n\r\n";
    const ROOT_REQUEST: &[u8] = b"GET / HTTP/1.1\r\nHost: 192.168.4.1\r\n\r\n";

    fn dispatcher(x: u8, y: u8) -> RequestDispatcher<MockAdc> {
        RequestDispatcher::new(MockAdc::new().with_percent(1, x).with_percent(0, y))
    }

    // =========================================================================
    // Lifecycle Tests
    // =========================================================================

    #[test]
    fn accept_starts_idle_and_sends_nothing() {
        let mut d = dispatcher(50, 50);
        let session = d.on_accept();
        assert_eq!(session.phase(), ConnectionPhase::Idle);
        assert!(d.last_response().is_empty());
    }

    #[test]
    fn idle_close_sends_nothing() {
        let mut d = dispatcher(50, 50);
        let mut conn = MockConnection::new();
        let mut session = d.on_accept();

        let outcome = d
            .on_data(&mut session, &mut conn, DataEvent::end_of_stream())
            .unwrap();

        assert_eq!(outcome, DispatchOutcome::IdleClosed);
        assert!(session.is_closed());
        assert_eq!(conn.calls, vec![ConnectionCall::Close]);
        assert_eq!(d.sensor().sampler().read_count(), 0);
    }

    #[test]
    fn empty_delivery_is_ignored() {
        let mut d = dispatcher(50, 50);
        let mut conn = MockConnection::new();
        let mut session = d.on_accept();

        let outcome = d.on_data(&mut session, &mut conn, DataEvent::data(&[])).unwrap();

        assert_eq!(outcome, DispatchOutcome::Ignored);
        assert!(session.is_idle());
        assert!(conn.calls.is_empty());
    }

    #[test]
    fn response_call_order() {
        let mut d = dispatcher(50, 50);
        let mut conn = MockConnection::new();
        let mut session = d.on_accept();

        let outcome = d
            .on_data(&mut session, &mut conn, DataEvent::data(TELEMETRY_REQUEST))
            .unwrap();
        let len = match outcome {
            DispatchOutcome::Responded { len, .. } => len,
            other => panic!("unexpected outcome: {:?}", other),
        };

        assert_eq!(
            conn.calls,
            vec![
                ConnectionCall::Acknowledge(TELEMETRY_REQUEST.len()),
                ConnectionCall::Write(len),
                ConnectionCall::Flush,
                ConnectionCall::Close,
            ]
        );
        assert_eq!(conn.written, d.last_response());
        assert!(session.is_closed());
        assert_eq!(d.served(), 1);
    }

    #[test]
    fn finished_session_ignores_further_events() {
        let mut d = dispatcher(50, 50);
        let mut conn = MockConnection::new();
        let mut session = d.on_accept();
        d.on_data(&mut session, &mut conn, DataEvent::data(ROOT_REQUEST))
            .unwrap();
        let calls = conn.calls.len();

        let again = d
            .on_data(&mut session, &mut conn, DataEvent::data(ROOT_REQUEST))
            .unwrap();
        let eos = d
            .on_data(&mut session, &mut conn, DataEvent::end_of_stream())
            .unwrap();

        assert_eq!(again, DispatchOutcome::Ignored);
        assert_eq!(eos, DispatchOutcome::Ignored);
        assert_eq!(conn.calls.len(), calls);
        assert_eq!(d.served(), 1);
    }

    #[test]
    fn last_chunk_with_end_of_stream_is_answered() {
        let mut d = dispatcher(50, 50);
        let mut conn = MockConnection::new();
        let mut session = d.on_accept();

        let outcome = d
            .on_data(&mut session, &mut conn, DataEvent::last(b"GET /data"))
            .unwrap();

        assert!(matches!(
            outcome,
            DispatchOutcome::Responded {
                route: Route::Telemetry,
                ..
            }
        ));
    }

    // =========================================================================
    // Routing Tests
    // =========================================================================

    #[test]
    fn telemetry_uses_live_reading() {
        let mut d = dispatcher(90, 50);
        let mut conn = MockConnection::new();
        let mut session = d.on_accept();
        d.on_data(&mut session, &mut conn, DataEvent::data(TELEMETRY_REQUEST))
            .unwrap();

        assert_eq!(conn.body(), br#"{"eixo_x":90,"eixo_y":50,"direcao":"Leste"}"#);
    }

    #[test]
    fn sensor_is_sampled_per_request() {
        let mut d = dispatcher(50, 50);

        let mut first = MockConnection::new();
        let mut s = d.on_accept();
        d.on_data(&mut s, &mut first, DataEvent::data(TELEMETRY_REQUEST))
            .unwrap();

        d.sensor_mut().sampler_mut().set_percent(1, 10);
        d.sensor_mut().sampler_mut().set_percent(0, 10);

        let mut second = MockConnection::new();
        let mut s = d.on_accept();
        d.on_data(&mut s, &mut second, DataEvent::data(TELEMETRY_REQUEST))
            .unwrap();

        assert!(first.body().ends_with(br#""direcao":"Centro"}"#));
        assert!(second.body().ends_with(br#""direcao":"Sudoeste"}"#));
        assert_eq!(d.sensor().sampler().read_count(), 4);
    }

    #[test]
    fn dashboard_also_samples() {
        let mut d = dispatcher(50, 50);
        let mut conn = MockConnection::new();
        let mut session = d.on_accept();
        let outcome = d
            .on_data(&mut session, &mut conn, DataEvent::data(ROOT_REQUEST))
            .unwrap();

        assert!(matches!(
            outcome,
            DispatchOutcome::Responded {
                route: Route::Dashboard,
                ..
            }
        ));
        assert_eq!(d.sensor().sampler().read_count(), 2);
    }

    #[test]
    fn garbage_gets_dashboard() {
        let mut d = dispatcher(50, 50);
        let mut conn = MockConnection::new();
        let mut session = d.on_accept();
        d.on_data(&mut session, &mut conn, DataEvent::data(&[0xff, 0x00, 0x13]))
            .unwrap();

        assert!(conn
            .written_str()
            .unwrap()
            .contains("Content-Type: text/html; charset=utf-8"));
    }

    #[test]
    fn dead_zone_applies_to_classification() {
        let mut d = dispatcher(55, 50);
        d.set_dead_zone(DeadZone::NONE);
        let mut conn = MockConnection::new();
        let mut session = d.on_accept();
        d.on_data(&mut session, &mut conn, DataEvent::data(TELEMETRY_REQUEST))
            .unwrap();

        assert!(conn.body().ends_with(br#""direcao":"Leste"}"#));
        assert_eq!(d.dead_zone(), DeadZone::NONE);
    }

    #[test]
    fn from_config_uses_joystick_section() {
        let config = JoystickConfig::default()
            .with_channels(4, 5)
            .with_dead_zone(DeadZone::new(30).unwrap());
        let adc = MockAdc::new().with_percent(4, 75).with_percent(5, 50);
        let mut d = RequestDispatcher::from_config(adc, &config);
        let mut conn = MockConnection::new();
        let mut session = d.on_accept();
        d.on_data(&mut session, &mut conn, DataEvent::data(TELEMETRY_REQUEST))
            .unwrap();

        // 75 is inside 50 +/- 30.
        assert!(conn.body().ends_with(br#""direcao":"Centro"}"#));
        assert_eq!(d.sensor().sampler().selections(), &[4, 5]);
    }

    // =========================================================================
    // Failure Tests
    // =========================================================================

    #[test]
    fn oversized_request_line_is_dropped_silently() {
        let mut d: RequestDispatcher<MockAdc, RESPONSE_CAPACITY, 16> =
            RequestDispatcher::with_reader(SensorReader::new(MockAdc::new()), DeadZone::DEFAULT);
        let mut conn = MockConnection::new();
        let mut session = d.on_accept();

        let outcome = d
            .on_data(&mut session, &mut conn, DataEvent::data(TELEMETRY_REQUEST))
            .unwrap();

        assert_eq!(
            outcome,
            DispatchOutcome::Dropped(DropReason::ScratchExhausted {
                len: b"GET /data HTTP/1.1\r".len(),
                capacity: 16,
            })
        );
        assert!(conn.calls.is_empty());
        assert!(session.is_idle());
        assert_eq!(d.sensor().sampler().read_count(), 0);
    }

    #[test]
    fn request_line_exactly_filling_scratch_is_answered() {
        // 19-byte request line, "\r" included
        let mut d: RequestDispatcher<MockAdc, RESPONSE_CAPACITY, 19> =
            RequestDispatcher::with_reader(SensorReader::new(MockAdc::new()), DeadZone::DEFAULT);

        let mut conn = MockConnection::new();
        let mut session = d.on_accept();
        let outcome = d
            .on_data(&mut session, &mut conn, DataEvent::data(TELEMETRY_REQUEST))
            .unwrap();
        assert!(matches!(
            outcome,
            DispatchOutcome::Responded {
                route: Route::Telemetry,
                ..
            }
        ));
        assert_eq!(conn.acknowledged, TELEMETRY_REQUEST.len());
    }

    #[test]
    fn headers_larger_than_scratch_are_acknowledged_and_answered() {
        let mut request = b"GET /data HTTP/1.1\r\nHost: 192.168.4.1\r\nCookie: ".to_vec();
        request.resize(1100, b'c');
        request.extend_from_slice(b"\r\n\r\n");
        let mut d: RequestDispatcher<MockAdc, RESPONSE_CAPACITY, 64> =
            RequestDispatcher::with_reader(SensorReader::new(MockAdc::new()), DeadZone::DEFAULT);

        let mut conn = MockConnection::new();
        let mut session = d.on_accept();
        let outcome = d
            .on_data(&mut session, &mut conn, DataEvent::data(&request))
            .unwrap();

        assert!(matches!(
            outcome,
            DispatchOutcome::Responded {
                route: Route::Telemetry,
                ..
            }
        ));
        assert_eq!(conn.calls[0], ConnectionCall::Acknowledge(1104));
        assert!(session.is_closed());
    }

    #[test]
    fn format_overflow_closes_without_writing() {
        let mut d: RequestDispatcher<MockAdc, 256> =
            RequestDispatcher::with_reader(SensorReader::new(MockAdc::new()), DeadZone::DEFAULT);
        let mut conn = MockConnection::new();
        let mut session = d.on_accept();

        let err = d
            .on_data(&mut session, &mut conn, DataEvent::data(ROOT_REQUEST))
            .unwrap_err();

        assert!(matches!(err, DispatchError::Format(FormatError::Capacity { .. })));
        assert_eq!(
            conn.calls,
            vec![ConnectionCall::Acknowledge(ROOT_REQUEST.len()), ConnectionCall::Close]
        );
        assert!(conn.written.is_empty());
        assert!(session.is_closed());
    }

    #[test]
    fn transport_failure_is_propagated() {
        let mut d = dispatcher(50, 50);
        let mut conn = MockConnection::failing();
        let mut session = d.on_accept();

        let err = d
            .on_data(&mut session, &mut conn, DataEvent::data(TELEMETRY_REQUEST))
            .unwrap_err();

        assert_eq!(err, DispatchError::Transport(MockTransportError));
        assert!(session.is_closed());
        assert_eq!(d.served(), 0);
    }

    #[test]
    fn error_display() {
        let e: DispatchError<MockTransportError> = FormatError::Body.into();
        assert!(format!("{}", e).starts_with("format error"));
        let e = DispatchError::Transport(MockTransportError);
        assert!(format!("{}", e).contains("MockTransportError"));
        let r = DropReason::ScratchExhausted {
            len: 2000,
            capacity: 1024,
        };
        assert!(format!("{}", r).contains("2000"));
    }
}
