//! Blocking socket transport for the dispatcher.
//!
//! Socket I/O is kept out of the dispatcher: each exchange runs against a
//! [`BufferedConnection`] that queues the response, and the transport writes
//! the queued bytes to the socket afterwards. [`exchange`] is shared by this
//! blocking loop and the async one in `services::web`.
//!
//! Works anywhere `std::net` does, including ESP-IDF.
//!
//! # Example
//!
//! ```no_run
//! use std::net::TcpListener;
//! use joystick_compass::{hal::MockAdc, services::serve_blocking, RequestDispatcher};
//!
//! let listener = TcpListener::bind("0.0.0.0:8080")?;
//! let mut dispatcher = RequestDispatcher::new(MockAdc::centered());
//! serve_blocking(&listener, &mut dispatcher)?;
//! # Ok::<(), std::io::Error>(())
//! ```

use std::convert::Infallible;
use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpListener};
use std::time::Duration;

use log::{debug, info, warn};

use crate::dispatcher::{DispatchError, DispatchOutcome, RequestDispatcher};
use crate::response::FormatError;
use crate::traits::{AnalogSampler, Connection, DataEvent};

/// Bytes read from a socket for one request.
///
/// Requests with long headers fit whole; only their request line has to fit
/// the dispatcher's scratch.
pub const READ_BUFFER_SIZE: usize = 1536;

/// How long a connection may stay silent before it is abandoned.
pub const READ_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// Buffered Connection
// ============================================================================

/// In-memory [`Connection`] that queues the response for a socket transport.
#[derive(Debug, Default)]
pub struct BufferedConnection {
    output: Vec<u8>,
    acknowledged: usize,
    flushed: bool,
    closed: bool,
}

impl BufferedConnection {
    /// Empty connection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes queued for the peer.
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    /// Received bytes the dispatcher consumed.
    pub fn acknowledged(&self) -> usize {
        self.acknowledged
    }

    /// Whether the dispatcher asked for a flush.
    pub fn is_flushed(&self) -> bool {
        self.flushed
    }

    /// Whether the dispatcher closed the connection.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Connection for BufferedConnection {
    type Error = Infallible;

    fn acknowledge(&mut self, len: usize) {
        self.acknowledged += len;
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), Infallible> {
        self.output.extend_from_slice(bytes);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Infallible> {
        self.flushed = true;
        Ok(())
    }

    fn close(&mut self) -> Result<(), Infallible> {
        self.closed = true;
        Ok(())
    }
}

// ============================================================================
// Exchange
// ============================================================================

/// Run one accepted connection through the dispatcher.
///
/// `received` is the result of a single socket read: empty means the peer
/// closed without sending anything.
pub fn exchange<A, const RESP: usize, const REQ: usize>(
    dispatcher: &mut RequestDispatcher<A, RESP, REQ>,
    received: &[u8],
) -> Result<(DispatchOutcome, BufferedConnection), FormatError>
where
    A: AnalogSampler,
{
    let event = if received.is_empty() {
        DataEvent::end_of_stream()
    } else {
        DataEvent::data(received)
    };

    let mut conn = BufferedConnection::new();
    let mut session = dispatcher.on_accept();
    match dispatcher.on_data(&mut session, &mut conn, event) {
        Ok(outcome) => Ok((outcome, conn)),
        Err(DispatchError::Format(e)) => Err(e),
        Err(DispatchError::Transport(never)) => match never {},
    }
}

pub(crate) fn format_to_io(e: FormatError) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e)
}

// ============================================================================
// Blocking Server
// ============================================================================

/// Serve one request on an already accepted stream.
///
/// Reads once, dispatches, then writes whatever the dispatcher queued.
///
/// # Errors
///
/// Socket errors, or an `Other` error wrapping [`FormatError`].
pub fn serve_stream<S, A, const RESP: usize, const REQ: usize>(
    dispatcher: &mut RequestDispatcher<A, RESP, REQ>,
    stream: &mut S,
) -> io::Result<DispatchOutcome>
where
    S: Read + Write,
    A: AnalogSampler,
{
    let mut buf = [0u8; READ_BUFFER_SIZE];
    let n = stream.read(&mut buf)?;

    let (outcome, conn) = exchange(dispatcher, &buf[..n]).map_err(format_to_io)?;

    if !conn.output().is_empty() {
        stream.write_all(conn.output())?;
    }
    if conn.is_flushed() {
        stream.flush()?;
    }
    Ok(outcome)
}

/// Accept and serve connections one at a time, forever.
///
/// Per-connection failures are logged and the loop moves on. Sockets are
/// shut down after each exchange, including dropped requests.
///
/// # Errors
///
/// Only if the listener's address cannot be read at startup.
pub fn serve_blocking<A, const RESP: usize, const REQ: usize>(
    listener: &TcpListener,
    dispatcher: &mut RequestDispatcher<A, RESP, REQ>,
) -> io::Result<()>
where
    A: AnalogSampler,
{
    info!("HTTP server listening on {}", listener.local_addr()?);

    for stream in listener.incoming() {
        let mut stream = match stream {
            Ok(stream) => stream,
            Err(e) => {
                warn!("accept failed: {}", e);
                continue;
            }
        };

        if let Ok(peer) = stream.peer_addr() {
            debug!("connection from {}", peer);
        }
        if let Err(e) = stream.set_read_timeout(Some(READ_TIMEOUT)) {
            warn!("could not set read timeout: {}", e);
        }

        match serve_stream(dispatcher, &mut stream) {
            Ok(DispatchOutcome::Dropped(reason)) => debug!("closing after drop: {}", reason),
            Ok(_) => {}
            Err(e) => warn!("connection error: {}", e),
        }
        let _ = stream.shutdown(Shutdown::Both);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::direction::DeadZone;
    use crate::dispatcher::REQUEST_SCRATCH_CAPACITY;
    use crate::hal::MockAdc;
    use crate::response::RESPONSE_CAPACITY;
    use crate::router::Route;
    use crate::sensor::SensorReader;
    use std::io::Cursor;

    /// Read side from a fixed request, write side into a Vec.
    struct FakeStream {
        input: Cursor<Vec<u8>>,
        output: Vec<u8>,
        flushes: usize,
    }

    impl FakeStream {
        fn new(request: &[u8]) -> Self {
            Self {
                input: Cursor::new(request.to_vec()),
                output: Vec::new(),
                flushes: 0,
            }
        }
    }

    impl Read for FakeStream {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.input.read(buf)
        }
    }

    impl Write for FakeStream {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.output.write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            self.flushes += 1;
            Ok(())
        }
    }

    fn dispatcher() -> RequestDispatcher<MockAdc> {
        RequestDispatcher::new(MockAdc::new().with_percent(1, 50).with_percent(0, 10))
    }

    // =========================================================================
    // BufferedConnection Tests
    // =========================================================================

    #[test]
    fn buffered_connection_records_state() {
        let mut conn = BufferedConnection::new();
        conn.acknowledge(12);
        conn.write(b"abc").unwrap();
        conn.write(b"def").unwrap();
        conn.flush().unwrap();
        conn.close().unwrap();

        assert_eq!(conn.acknowledged(), 12);
        assert_eq!(conn.output(), b"abcdef");
        assert!(conn.is_flushed());
        assert!(conn.is_closed());
    }

    // =========================================================================
    // Exchange Tests
    // =========================================================================

    #[test]
    fn exchange_empty_read_is_idle_close() {
        let mut d = dispatcher();
        let (outcome, conn) = exchange(&mut d, &[]).unwrap();
        assert_eq!(outcome, DispatchOutcome::IdleClosed);
        assert!(conn.output().is_empty());
        assert!(conn.is_closed());
    }

    #[test]
    fn exchange_queues_response() {
        let mut d = dispatcher();
        let request = b"GET /data HTTP/1.1\r\n\r\n";
        let (outcome, conn) = exchange(&mut d, request).unwrap();

        assert!(matches!(
            outcome,
            DispatchOutcome::Responded {
                route: Route::Telemetry,
                ..
            }
        ));
        assert_eq!(conn.acknowledged(), request.len());
        assert!(conn.output().ends_with(br#""direcao":"Sul"}"#));
    }

    #[test]
    fn exchange_answers_request_longer_than_scratch() {
        let mut d = dispatcher();
        let mut request = b"GET /data HTTP/1.1\r\n\
            Host: 192.168.4.1\r\n\
            User-Agent: Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 Chrome/126.0 Safari/537.36\r\n\
            Accept-Language: pt-BR,pt;q=0.9,en-US;q=0.8,en;q=0.7\r\n\
            Cookie: session="
            .to_vec();
        request.resize(1300, b'z');
        request.extend_from_slice(b"\r\n\r\n");
        assert!(request.len() > REQUEST_SCRATCH_CAPACITY && request.len() <= READ_BUFFER_SIZE);

        let (outcome, conn) = exchange(&mut d, &request).unwrap();

        assert!(matches!(
            outcome,
            DispatchOutcome::Responded {
                route: Route::Telemetry,
                ..
            }
        ));
        assert_eq!(conn.acknowledged(), request.len());
        assert!(conn.is_closed());
    }

    #[test]
    fn exchange_surfaces_format_error() {
        let mut d: RequestDispatcher<MockAdc, 128> =
            RequestDispatcher::with_reader(SensorReader::new(MockAdc::new()), DeadZone::DEFAULT);
        let err = exchange(&mut d, b"GET / HTTP/1.1\r\n\r\n").unwrap_err();
        assert!(matches!(err, FormatError::Capacity { capacity: 128, .. }));
        assert_eq!(format_to_io(err).kind(), io::ErrorKind::Other);
    }

    // =========================================================================
    // Stream Tests
    // =========================================================================

    #[test]
    fn serve_stream_writes_and_flushes() {
        let mut d = dispatcher();
        let mut stream = FakeStream::new(b"GET / HTTP/1.1\r\nHost: x\r\n\r\n");

        let outcome = serve_stream(&mut d, &mut stream).unwrap();

        assert!(matches!(
            outcome,
            DispatchOutcome::Responded {
                route: Route::Dashboard,
                ..
            }
        ));
        assert_eq!(stream.output, d.last_response());
        assert_eq!(stream.flushes, 1);
    }

    #[test]
    fn serve_stream_drops_oversized_request_line() {
        let mut d: RequestDispatcher<MockAdc, RESPONSE_CAPACITY, 64> =
            RequestDispatcher::with_reader(SensorReader::new(MockAdc::new()), DeadZone::DEFAULT);
        let mut request = b"GET /data?pad=".to_vec();
        request.resize(200, b'a');
        request.extend_from_slice(b" HTTP/1.1\r\n\r\n");
        let mut stream = FakeStream::new(&request);

        let outcome = serve_stream(&mut d, &mut stream).unwrap();

        assert!(matches!(outcome, DispatchOutcome::Dropped(_)));
        assert!(stream.output.is_empty());
        assert_eq!(stream.flushes, 0);
    }

    #[test]
    fn serve_stream_eof_writes_nothing() {
        let mut d = dispatcher();
        let mut stream = FakeStream::new(b"");
        let outcome = serve_stream(&mut d, &mut stream).unwrap();
        assert_eq!(outcome, DispatchOutcome::IdleClosed);
        assert!(stream.output.is_empty());
    }
}
