use http::{HeaderMap, StatusCode};
use std::io;
use tracing::warn;

/// Raw output side of one HTTP exchange.
///
/// Mirrors the usual server contract: headers are mutable until the head is
/// written, the head is written at most once, and a body write without a head
/// implies `200 OK`.
pub trait ResponseSink {
    /// Headers that will accompany the head.
    fn headers(&self) -> &HeaderMap;

    /// Mutable access to the headers; changes after the head is sent are not transmitted.
    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Send the status line and current headers. Calls after the first are ignored.
    fn write_head(&mut self, status: StatusCode);

    /// Append body bytes, sending an implicit `200 OK` head first if needed.
    fn write_body(&mut self, bytes: &[u8]) -> io::Result<usize>;

    /// Whether the head has already been written.
    fn head_sent(&self) -> bool;
}

/// In-memory [`ResponseSink`].
///
/// The hosting service serves every request into one of these and then copies
/// it onto the wire; tests inspect it directly.
#[derive(Debug, Default)]
pub struct BufferedSink {
    headers: HeaderMap,
    sent_headers: HeaderMap,
    status: Option<StatusCode>,
    head_writes: usize,
    body: Vec<u8>,
}

impl BufferedSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Status that reached the wire, `200 OK` if nothing was ever written.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    /// Number of `write_head` calls received, superfluous ones included.
    #[must_use]
    pub fn head_writes(&self) -> usize {
        self.head_writes
    }

    /// Headers as transmitted with the head (or as they stand, if no head yet).
    #[must_use]
    pub fn sent_headers(&self) -> &HeaderMap {
        if self.status.is_some() {
            &self.sent_headers
        } else {
            &self.headers
        }
    }

    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Lossy UTF-8 view of the body, handy for HTML assertions.
    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Split into the transmitted status, headers and body.
    #[must_use]
    pub fn into_parts(self) -> (StatusCode, HeaderMap, Vec<u8>) {
        let status = self.status();
        let headers = if self.status.is_some() {
            self.sent_headers
        } else {
            self.headers
        };
        (status, headers, self.body)
    }
}

impl ResponseSink for BufferedSink {
    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write_head(&mut self, status: StatusCode) {
        self.head_writes += 1;
        if let Some(sent) = self.status {
            warn!(
                sent = sent.as_u16(),
                ignored = status.as_u16(),
                "superfluous write_head call"
            );
            return;
        }
        self.status = Some(status);
        self.sent_headers = self.headers.clone();
    }

    fn write_body(&mut self, bytes: &[u8]) -> io::Result<usize> {
        if self.status.is_none() {
            self.write_head(StatusCode::OK);
        }
        self.body.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn head_sent(&self) -> bool {
        self.status.is_some()
    }
}
