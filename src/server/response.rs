use std::collections::HashSet;
use std::sync::{Mutex, OnceLock};

use http::header::CONTENT_LENGTH;
use http::{HeaderMap, StatusCode};
use may_minihttp::Response;
use serde_json::Value;
use tracing::{debug, error, warn};

use super::sink::BufferedSink;

/// Most distinct header lines ever interned for the wire.
pub const MAX_INTERNED_HEADER_LINES: usize = 1024;

/// Header slots `may_minihttp` offers per response.
pub const MAX_WIRE_HEADERS: usize = 16;

/// Interned `name: value` lines for `may_minihttp`, which only accepts
/// `&'static str` headers.
///
/// Each distinct line is leaked once and reused afterwards. Once `limit`
/// lines are held, new lines are refused instead of leaked, so the memory
/// spent here is bounded no matter how many distinct cookie or redirect
/// values pass through.
pub struct HeaderLines {
    lines: Mutex<HashSet<&'static str>>,
    limit: usize,
}

impl HeaderLines {
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            lines: Mutex::new(HashSet::new()),
            limit,
        }
    }

    /// Process-wide set used by [`write_sink`].
    pub fn global() -> &'static HeaderLines {
        static GLOBAL: OnceLock<HeaderLines> = OnceLock::new();
        GLOBAL.get_or_init(|| HeaderLines::with_limit(MAX_INTERNED_HEADER_LINES))
    }

    /// Static line for `name: value`, or `None` when the set is full and the
    /// line was never seen before.
    pub fn intern(&self, name: &str, value: &str) -> Option<&'static str> {
        let line = format!("{name}: {value}");
        let mut lines = self.lines.lock().ok()?;
        if let Some(existing) = lines.get(line.as_str()) {
            return Some(existing);
        }
        if lines.len() >= self.limit {
            error!(
                header = name,
                limit = self.limit,
                "Header line cache full, header dropped"
            );
            return None;
        }
        let leaked: &'static str = Box::leak(line.into_boxed_str());
        lines.insert(leaked);
        Some(leaked)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.lock().map(|l| l.len()).unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn reason(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("Unknown")
}

/// Header lines to put on the wire for `headers`.
///
/// `Content-Length` is computed by `may_minihttp` and skipped. Values that are
/// not visible ASCII, lines the cache refuses and lines past
/// [`MAX_WIRE_HEADERS`] are dropped with a log.
fn wire_headers(headers: &HeaderMap, lines: &HeaderLines) -> Vec<&'static str> {
    let mut out = Vec::with_capacity(headers.len().min(MAX_WIRE_HEADERS));
    for (name, value) in headers {
        if *name == CONTENT_LENGTH {
            continue;
        }
        if out.len() == MAX_WIRE_HEADERS {
            warn!(header = %name, max = MAX_WIRE_HEADERS, "Too many response headers, dropped");
            continue;
        }
        let Ok(text) = value.to_str() else {
            debug!(header = %name, "Header not transmittable as text, dropped");
            continue;
        };
        if let Some(line) = lines.intern(name.as_str(), text) {
            out.push(line);
        }
    }
    out
}

/// Copy a served [`BufferedSink`] onto the wire response.
pub fn write_sink(res: &mut Response, sink: BufferedSink) {
    let (status, headers, body) = sink.into_parts();
    res.status_code(usize::from(status.as_u16()), reason(status));
    for line in wire_headers(&headers, HeaderLines::global()) {
        res.header(line);
    }
    res.body_vec(body);
}

pub fn write_json_error(res: &mut Response, status: StatusCode, body: Value) {
    res.status_code(usize::from(status.as_u16()), reason(status));
    res.header("Content-Type: application/json");
    res.body_vec(body.to_string().into_bytes());
}
