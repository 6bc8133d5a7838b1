use tracing::{debug, info};

use super::Interceptor;
use crate::api::{Api, DeferredWriter};
use crate::page::{Page, PageResponse};
use crate::server::Request;

/// Logs chain entry and, on the way out, the decision or status.
///
/// Carries no state, so one instance can be shared by every chain. Request
/// latency is recorded by the adapter around the whole pipeline.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingInterceptor;

impl TracingInterceptor {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn log_entry(family: &'static str, req: &Request) {
    debug!(
        family,
        method = %req.method(),
        path = %req.uri().path(),
        "Entering interceptor chain"
    );
}

impl Interceptor<Page> for TracingInterceptor {
    fn before(&self, _res: &mut PageResponse<'_>, req: &Request) {
        log_entry("page", req);
    }

    fn after(&self, res: &mut PageResponse<'_>, req: &Request) {
        let decision = if res.redirect_target().is_some() {
            "redirect"
        } else if res.template_selection().is_some() {
            "template"
        } else {
            "none"
        };
        info!(
            family = "page",
            method = %req.method(),
            path = %req.uri().path(),
            decision,
            template_group = res.template_group(),
            "Page request handled"
        );
    }
}

impl Interceptor<Api> for TracingInterceptor {
    fn before(&self, _res: &mut DeferredWriter<'_>, req: &Request) {
        log_entry("api", req);
    }

    fn after(&self, res: &mut DeferredWriter<'_>, req: &Request) {
        info!(
            family = "api",
            method = %req.method(),
            path = %req.uri().path(),
            status = res.status().map(|s| s.as_u16()),
            head_sent = res.is_realized(),
            "API request handled"
        );
    }
}
