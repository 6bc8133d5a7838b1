use http::header::{HeaderName, HeaderValue};
use std::io::{self, Read};
use tracing::{debug, info};

/// Request value threaded through interceptors and handlers.
pub type Request = http::Request<Vec<u8>>;

/// Convert a `may_minihttp` request into the pipeline's [`Request`].
///
/// Header lines that are not valid HTTP tokens are dropped with a debug log
/// rather than failing the whole request.
///
/// # Errors
///
/// Returns `InvalidData` when the method or path cannot form a valid request,
/// and propagates body read failures.
pub fn into_http_request(req: may_minihttp::Request) -> io::Result<Request> {
    let method = req.method().to_string();
    let path = req.path().to_string();

    let mut builder = http::Request::builder().method(method.as_str()).uri(path.as_str());
    let mut dropped = 0usize;
    if let Some(headers) = builder.headers_mut() {
        for h in req.headers() {
            match (
                HeaderName::from_bytes(h.name.as_bytes()),
                HeaderValue::from_bytes(h.value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.append(name, value);
                }
                _ => dropped += 1,
            }
        }
    }
    if dropped > 0 {
        debug!(dropped = dropped, "Invalid header lines dropped");
    }

    let mut body = Vec::new();
    let size = req.body().read_to_end(&mut body)?;

    info!(
        method = %method,
        path = %path,
        body_size_bytes = size,
        "HTTP request parsed"
    );

    builder
        .body(body)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Build a pipeline request without a connection; used by tests and tools.
///
/// # Errors
///
/// Returns the `http` builder error for an invalid method or URI.
pub fn build_request(method: &str, uri: &str, body: Vec<u8>) -> Result<Request, http::Error> {
    http::Request::builder().method(method).uri(uri).body(body)
}
