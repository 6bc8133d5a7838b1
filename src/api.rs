//! API family: raw verbs and bytes over a writer that defers the status line
//! until the first body write.

use http::{HeaderMap, StatusCode};
use std::io;
use tracing::debug;

use crate::interceptor::{Family, ShortCircuit};
use crate::server::ResponseSink;

/// Marker for the API handler family.
pub struct Api;

impl Family for Api {
    type Response<'a> = DeferredWriter<'a>;
    const NAME: &'static str = "api";
}

/// Header state of a [`DeferredWriter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderState {
    /// Nothing recorded yet.
    NoStatus,
    /// A status was recorded but not transmitted.
    Pending(StatusCode),
    /// The head went out with this status.
    Committed(StatusCode),
}

/// Writer handed to API handlers and interceptors.
///
/// `write_header` only records a pending status. The first body write
/// transmits the head exactly once, using the most recent pending status or
/// `200 OK`. After that, status changes have no effect.
pub struct DeferredWriter<'a> {
    sink: &'a mut dyn ResponseSink,
    state: HeaderState,
}

impl<'a> DeferredWriter<'a> {
    pub fn new(sink: &'a mut dyn ResponseSink) -> Self {
        Self {
            sink,
            state: HeaderState::NoStatus,
        }
    }

    /// Record `status` for the eventual head.
    pub fn write_header(&mut self, status: StatusCode) {
        match self.state {
            HeaderState::Committed(sent) => {
                debug!(
                    sent = sent.as_u16(),
                    ignored = status.as_u16(),
                    "Status set after head was written"
                );
            }
            _ => self.state = HeaderState::Pending(status),
        }
    }

    #[must_use]
    pub fn state(&self) -> HeaderState {
        self.state
    }

    /// Pending or transmitted status, if any was set.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self.state {
            HeaderState::NoStatus => None,
            HeaderState::Pending(s) | HeaderState::Committed(s) => Some(s),
        }
    }

    /// Whether the head has been transmitted.
    #[must_use]
    pub fn is_realized(&self) -> bool {
        matches!(self.state, HeaderState::Committed(_))
    }

    /// Response headers; only effective before the head is transmitted.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        self.sink.headers_mut()
    }

    /// Write body bytes, transmitting the head first if needed.
    ///
    /// # Errors
    ///
    /// Propagates the sink's write error.
    pub fn write_body(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.realize();
        self.sink.write_body(bytes)
    }

    /// End-of-pipeline flush: transmit the head if no body was ever written.
    ///
    /// # Errors
    ///
    /// Propagates the sink's write error.
    pub fn finish(mut self) -> io::Result<()> {
        if !self.is_realized() {
            self.write_body(&[])?;
        }
        Ok(())
    }

    fn realize(&mut self) {
        let status = match self.state {
            HeaderState::Committed(_) => return,
            HeaderState::NoStatus => StatusCode::OK,
            HeaderState::Pending(status) => status,
        };
        self.sink.write_head(status);
        self.state = HeaderState::Committed(status);
    }
}

impl io::Write for DeferredWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_body(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl ShortCircuit for DeferredWriter<'_> {
    /// A status was set or a write already happened.
    fn should_short_circuit(&self) -> bool {
        !matches!(self.state, HeaderState::NoStatus)
    }
}
