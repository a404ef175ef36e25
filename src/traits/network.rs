//! Transport abstraction for the one-request-per-connection HTTP surface.
//!
//! The socket stack is an external collaborator. It tells the core about new
//! connections and delivered bytes, and the core answers through
//! [`Connection`]: acknowledge what it consumed, queue the response, flush,
//! close.
//!
//! # Event Flow
//!
//! ```text
//! transport                        core
//! ---------                        ----
//! connection accepted   ------->   RequestDispatcher::on_accept  -> Session
//! bytes delivered       ------->   RequestDispatcher::on_data
//!                       <-------   acknowledge(len)
//!                       <-------   write(response)
//!                       <-------   flush()
//!                       <-------   close()
//! ```
//!
//! A stream-end event with no bytes is answered with `close()` only.

// ============================================================================
// Connection Trait
// ============================================================================

/// Transport-level handle for one accepted connection.
///
/// Owned by the transport, borrowed by the dispatcher for the duration of a
/// single exchange.
///
/// # Implementation Notes
///
/// - `write` queues bytes; nothing needs to reach the wire before `flush`.
/// - `acknowledge` lets the stack reclaim receive buffering (lwIP's
///   `tcp_recved`, or a no-op for stream sockets).
/// - After `close` the handle is not used again by the core.
pub trait Connection {
    /// Error type for transport operations.
    type Error;

    /// Report that `len` received bytes were consumed.
    fn acknowledge(&mut self, len: usize);

    /// Queue bytes for transmission.
    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Push queued bytes towards the peer.
    fn flush(&mut self) -> Result<(), Self::Error>;

    /// Close the connection once queued bytes are sent.
    fn close(&mut self) -> Result<(), Self::Error>;
}

impl<T: Connection + ?Sized> Connection for &mut T {
    type Error = T::Error;

    fn acknowledge(&mut self, len: usize) {
        (**self).acknowledge(len);
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        (**self).write(bytes)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        (**self).flush()
    }

    fn close(&mut self) -> Result<(), Self::Error> {
        (**self).close()
    }
}

// ============================================================================
// Data Events
// ============================================================================

/// A data-received notification from the transport.
///
/// Carries zero or more bytes plus an end-of-stream flag. The payload is
/// borrowed: it is released back to the transport when the handler returns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DataEvent<'a> {
    payload: &'a [u8],
    end_of_stream: bool,
}

impl<'a> DataEvent<'a> {
    /// Bytes delivered on an open stream.
    pub const fn data(payload: &'a [u8]) -> Self {
        Self {
            payload,
            end_of_stream: false,
        }
    }

    /// The peer closed its side without sending anything further.
    pub const fn end_of_stream() -> Self {
        Self {
            payload: &[],
            end_of_stream: true,
        }
    }

    /// Final bytes delivered together with the end-of-stream flag.
    pub const fn last(payload: &'a [u8]) -> Self {
        Self {
            payload,
            end_of_stream: true,
        }
    }

    /// The delivered bytes.
    #[inline]
    pub const fn payload(&self) -> &'a [u8] {
        self.payload
    }

    /// Whether the peer signalled end of stream.
    #[inline]
    pub const fn is_end_of_stream(&self) -> bool {
        self.end_of_stream
    }

    /// Stream ended and nothing was delivered: an idle teardown.
    #[inline]
    pub const fn is_idle_close(&self) -> bool {
        self.end_of_stream && self.payload.is_empty()
    }
}
