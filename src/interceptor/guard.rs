use http::header::HeaderName;
use http::{HeaderValue, StatusCode};
use tracing::debug;

use super::Interceptor;
use crate::api::{Api, DeferredWriter};
use crate::page::{Page, PageResponse};
use crate::server::Request;

/// Rejects requests whose `header` does not carry the expected value.
///
/// Pages are redirected to `login_url` with `302 Found`; API requests get a
/// pending `401 Unauthorized`. Either way the chain short-circuits.
#[derive(Debug, Clone)]
pub struct RequireHeader {
    header: HeaderName,
    expected: HeaderValue,
    login_url: String,
}

impl RequireHeader {
    pub fn new(header: HeaderName, expected: HeaderValue) -> Self {
        Self {
            header,
            expected,
            login_url: "/login".to_string(),
        }
    }

    /// Redirect target for rejected page requests (default `/login`).
    #[must_use]
    pub fn login_url(mut self, url: impl Into<String>) -> Self {
        self.login_url = url.into();
        self
    }

    fn admits(&self, req: &Request) -> bool {
        let ok = req.headers().get(&self.header) == Some(&self.expected);
        if !ok {
            debug!(
                header = %self.header,
                path = %req.uri().path(),
                "Required header missing or wrong"
            );
        }
        ok
    }
}

impl Interceptor<Page> for RequireHeader {
    fn before(&self, res: &mut PageResponse<'_>, req: &Request) {
        if !self.admits(req) {
            res.redirect(self.login_url.clone(), StatusCode::FOUND);
        }
    }
}

impl Interceptor<Api> for RequireHeader {
    fn before(&self, w: &mut DeferredWriter<'_>, req: &Request) {
        if !self.admits(req) {
            w.write_header(StatusCode::UNAUTHORIZED);
        }
    }
}
