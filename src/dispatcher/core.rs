use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, info_span, warn};

use crate::api::{Api, DeferredWriter};
use crate::binding::{decode_uri_vars, UriVars};
use crate::error::{tracing_logger, ErrorLogger};
use crate::handler::{
    dispatch_api, dispatch_page, ApiConstructor, ApiHandler, PageConstructor, PageHandler,
};
use crate::ids::RequestId;
use crate::interceptor::{ChainOutcome, Family};
use crate::page::{Page, PageResponse, RenderContext, DEFAULT_TEMPLATE_GROUP};
use crate::server::{Request, ResponseSink};
use crate::templates::TemplateGroupSet;

/// Serve one request into a sink.
pub trait Serve: Send + Sync {
    fn serve(&self, sink: &mut dyn ResponseSink, req: &Request, vars: &UriVars);
}

/// Pipeline for page handlers.
#[derive(Clone)]
pub struct PagePipeline {
    constructor: PageConstructor,
    templates: Arc<TemplateGroupSet>,
    error_template: Option<String>,
    default_group: String,
    logger: ErrorLogger,
}

impl Serve for PagePipeline {
    fn serve(&self, sink: &mut dyn ResponseSink, req: &Request, _vars: &UriVars) {
        let ctx = RenderContext {
            templates: &self.templates,
            error_template: self.error_template.as_deref(),
            logger: &self.logger,
        };
        let mut handler = (self.constructor)();
        let chain = handler.interceptors();

        let mut res = PageResponse::new(sink, req, ctx);
        res.set_template_group(self.default_group.as_str());
        let outcome = chain.run(&mut res, req, |res: &mut PageResponse<'_>| {
            dispatch_page(handler.as_mut(), res, req);
        });
        log_outcome(Page::NAME, chain.len(), outcome);
        res.commit();
    }
}

/// Pipeline for API handlers.
#[derive(Clone)]
pub struct ApiPipeline {
    constructor: ApiConstructor,
    logger: ErrorLogger,
}

impl Serve for ApiPipeline {
    fn serve(&self, sink: &mut dyn ResponseSink, req: &Request, vars: &UriVars) {
        let mut handler = (self.constructor)();
        let mut w = DeferredWriter::new(sink);

        decode_uri_vars(handler.as_mut(), vars, &self.logger);
        let chain = handler.interceptors();
        let outcome = chain.run(&mut w, req, |w: &mut DeferredWriter<'_>| {
            dispatch_api(handler.as_mut(), w, req);
        });
        log_outcome(Api::NAME, chain.len(), outcome);

        if let Err(err) = w.finish() {
            warn!(error = %err, "Failed to flush API response");
        }
    }
}

fn log_outcome(family: &'static str, chain_len: usize, outcome: ChainOutcome) {
    debug!(
        family,
        chain_len,
        entered = outcome.entered,
        short_circuited_at = ?outcome.short_circuited_at,
        dispatched = outcome.dispatched,
        "Interceptor chain finished"
    );
}

#[derive(Clone)]
enum Route {
    Page(PagePipeline),
    Api(ApiPipeline),
}

/// Route-level entry point wrapping exactly one handler family.
///
/// The family is fixed when the adapter is built and never changes.
#[derive(Clone)]
pub struct Adapter {
    route: Route,
}

impl Adapter {
    /// Serve page handlers built by `ctor`, rendering with `templates`.
    pub fn page<H, C>(ctor: C, templates: Arc<TemplateGroupSet>) -> Self
    where
        H: PageHandler + 'static,
        C: Fn() -> H + Send + Sync + 'static,
    {
        let constructor: PageConstructor =
            Arc::new(move || Box::new(ctor()) as Box<dyn PageHandler>);
        Self {
            route: Route::Page(PagePipeline {
                constructor,
                templates,
                error_template: None,
                default_group: DEFAULT_TEMPLATE_GROUP.to_string(),
                logger: tracing_logger(),
            }),
        }
    }

    /// Serve API handlers built by `ctor`.
    pub fn api<H, C>(ctor: C) -> Self
    where
        H: ApiHandler + 'static,
        C: Fn() -> H + Send + Sync + 'static,
    {
        let constructor: ApiConstructor = Arc::new(move || Box::new(ctor()) as Box<dyn ApiHandler>);
        Self {
            route: Route::Api(ApiPipeline {
                constructor,
                logger: tracing_logger(),
            }),
        }
    }

    /// Replace the error callback (default: [`tracing_logger`]).
    #[must_use]
    pub fn with_logger(mut self, logger: ErrorLogger) -> Self {
        match &mut self.route {
            Route::Page(p) => p.logger = logger,
            Route::Api(a) => a.logger = logger,
        }
        self
    }

    /// Template rendered when the selected one fails. Page routes only.
    #[must_use]
    pub fn with_error_template(mut self, name: impl Into<String>) -> Self {
        if let Route::Page(p) = &mut self.route {
            p.error_template = Some(name.into());
        }
        self
    }

    /// Template group selected before any handler code runs. Page routes only.
    #[must_use]
    pub fn with_default_group(mut self, name: impl Into<String>) -> Self {
        if let Route::Page(p) = &mut self.route {
            p.default_group = name.into();
        }
        self
    }

    #[must_use]
    pub fn family(&self) -> &'static str {
        match self.route {
            Route::Page(_) => Page::NAME,
            Route::Api(_) => Api::NAME,
        }
    }
}

impl Serve for Adapter {
    fn serve(&self, sink: &mut dyn ResponseSink, req: &Request, vars: &UriVars) {
        let request_id = RequestId::from_headers(req.headers());
        let span = info_span!(
            "request",
            request_id = %request_id,
            method = %req.method(),
            path = %req.uri().path(),
            family = self.family()
        );
        let _enter = span.enter();
        let started = Instant::now();

        match &self.route {
            Route::Page(p) => p.serve(sink, req, vars),
            Route::Api(a) => a.serve(sink, req, vars),
        }

        info!(
            head_sent = sink.head_sent(),
            latency_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX),
            "Request served"
        );
    }
}
