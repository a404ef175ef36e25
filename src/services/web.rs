//! Tokio-based HTTP transport for desktop use.
//!
//! Accepts connections sequentially on a single task: each connection is
//! read, dispatched and answered before the next `accept`. Nothing is
//! spawned, so the dispatcher needs neither `Send` nor a lock, and the
//! server runs fine on a `current_thread` runtime.
//!
//! # Example
//!
//! ```no_run
//! use joystick_compass::{hal::MockAdc, services::run_server, RequestDispatcher, WebConfig};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> std::io::Result<()> {
//!     let mut dispatcher = RequestDispatcher::new(MockAdc::centered());
//!     run_server(&mut dispatcher, &WebConfig::default().with_port(8080)).await
//! }
//! ```

use std::io;

use log::{debug, info, warn};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;

use crate::config::WebConfig;
use crate::dispatcher::{DispatchOutcome, RequestDispatcher};
use crate::traits::AnalogSampler;

use super::transport::{exchange, format_to_io, READ_BUFFER_SIZE, READ_TIMEOUT};

// ============================================================================
// Connection Handling
// ============================================================================

/// Serve one request on an accepted stream.
///
/// Reads once (bounded by [`READ_TIMEOUT`]), dispatches, writes whatever the
/// dispatcher queued, then shuts the write side down if it asked to close.
///
/// # Errors
///
/// Socket errors, `TimedOut` for a silent peer, or an `Other` error wrapping
/// a [`FormatError`](crate::FormatError).
pub async fn handle_connection<S, A, const RESP: usize, const REQ: usize>(
    dispatcher: &mut RequestDispatcher<A, RESP, REQ>,
    stream: &mut S,
) -> io::Result<DispatchOutcome>
where
    S: AsyncRead + AsyncWrite + Unpin,
    A: AnalogSampler,
{
    let mut buf = [0u8; READ_BUFFER_SIZE];
    let n = tokio::time::timeout(READ_TIMEOUT, stream.read(&mut buf))
        .await
        .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "no request received"))??;

    let (outcome, conn) = exchange(dispatcher, &buf[..n]).map_err(format_to_io)?;

    if !conn.output().is_empty() {
        stream.write_all(conn.output()).await?;
    }
    if conn.is_flushed() {
        stream.flush().await?;
    }
    if conn.is_closed() {
        stream.shutdown().await?;
    }
    Ok(outcome)
}

// ============================================================================
// Server Loop
// ============================================================================

/// Accept and serve connections on `listener` one at a time, forever.
///
/// Accept and per-connection errors are logged and the loop continues.
pub async fn serve<A, const RESP: usize, const REQ: usize>(
    listener: &TcpListener,
    dispatcher: &mut RequestDispatcher<A, RESP, REQ>,
) -> io::Result<()>
where
    A: AnalogSampler,
{
    loop {
        let (mut stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!("accept failed: {}", e);
                continue;
            }
        };
        debug!("connection from {}", peer);

        match handle_connection(dispatcher, &mut stream).await {
            Ok(DispatchOutcome::Dropped(reason)) => debug!("closing after drop: {}", reason),
            Ok(_) => {}
            Err(e) => warn!("connection from {} failed: {}", peer, e),
        }
    }
}

/// Bind to the configured port and serve forever.
///
/// # Errors
///
/// Returns an error if the port cannot be bound.
pub async fn run_server<A, const RESP: usize, const REQ: usize>(
    dispatcher: &mut RequestDispatcher<A, RESP, REQ>,
    config: &WebConfig,
) -> io::Result<()>
where
    A: AnalogSampler,
{
    let addr = config.bind_addr();
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on http://{}", addr);

    serve(&listener, dispatcher).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::MockAdc;
    use crate::router::Route;
    use tokio::io::duplex;

    fn dispatcher() -> RequestDispatcher<MockAdc> {
        RequestDispatcher::new(MockAdc::new().with_percent(1, 90).with_percent(0, 90))
    }

    #[tokio::test]
    async fn handle_connection_answers_over_duplex() {
        let mut d = dispatcher();
        let (mut client, mut server) = duplex(4096);

        client
            .write_all(b"GET /data HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .await
            .unwrap();

        let outcome = handle_connection(&mut d, &mut server).await.unwrap();
        assert!(matches!(
            outcome,
            DispatchOutcome::Responded {
                route: Route::Telemetry,
                ..
            }
        ));

        let mut response = Vec::new();
        client.read_to_end(&mut response).await.unwrap();
        assert!(response.ends_with(br#"{"eixo_x":90,"eixo_y":90,"direcao":"Nordeste"}"#));
    }

    #[tokio::test]
    async fn handle_connection_idle_close() {
        let mut d = dispatcher();
        let (mut client, mut server) = duplex(64);
        client.shutdown().await.unwrap();

        let outcome = handle_connection(&mut d, &mut server).await.unwrap();
        assert_eq!(outcome, DispatchOutcome::IdleClosed);

        let mut response = Vec::new();
        client.read_to_end(&mut response).await.unwrap();
        assert!(response.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn silent_peer_times_out() {
        let mut d = dispatcher();
        let (_client, mut server) = duplex(64);

        let err = handle_connection(&mut d, &mut server).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
        assert_eq!(d.served(), 0);
    }
}
