//! Handler traits for both families and verb dispatch.
//!
//! A handler is constructed fresh for every request by the route's
//! constructor, so `&mut self` methods may keep per-request state.

use http::{Method, StatusCode};
use std::sync::Arc;
use tracing::debug;

use crate::api::{Api, DeferredWriter};
use crate::binding::Binder;
use crate::interceptor::InterceptorChain;
use crate::page::{Page, PageResponse};
use crate::server::Request;

/// Handler that answers by deciding on a redirect or a template.
///
/// Verb methods that are not overridden leave the response undecided, which
/// commits as `500`.
pub trait PageHandler: Send {
    /// Interceptors wrapped around this handler, in `before` order.
    fn interceptors(&self) -> InterceptorChain<Page> {
        InterceptorChain::new()
    }

    fn get(&mut self, _res: &mut PageResponse<'_>, _req: &Request) {}

    fn post(&mut self, _res: &mut PageResponse<'_>, _req: &Request) {}
}

/// Handler that speaks raw verbs and bytes.
///
/// Verb methods that are not overridden answer `405 Method Not Allowed`.
pub trait ApiHandler: Send {
    fn interceptors(&self) -> InterceptorChain<Api> {
        InterceptorChain::new()
    }

    /// Declare the fields bound from URI variables before the chain runs.
    fn bind(&mut self, _binder: &mut Binder<'_>) {}

    fn get(&mut self, w: &mut DeferredWriter<'_>, _req: &Request) {
        w.write_header(StatusCode::METHOD_NOT_ALLOWED);
    }

    fn post(&mut self, w: &mut DeferredWriter<'_>, _req: &Request) {
        w.write_header(StatusCode::METHOD_NOT_ALLOWED);
    }

    fn put(&mut self, w: &mut DeferredWriter<'_>, _req: &Request) {
        w.write_header(StatusCode::METHOD_NOT_ALLOWED);
    }

    fn delete(&mut self, w: &mut DeferredWriter<'_>, _req: &Request) {
        w.write_header(StatusCode::METHOD_NOT_ALLOWED);
    }

    fn patch(&mut self, w: &mut DeferredWriter<'_>, _req: &Request) {
        w.write_header(StatusCode::METHOD_NOT_ALLOWED);
    }

    fn head(&mut self, w: &mut DeferredWriter<'_>, _req: &Request) {
        w.write_header(StatusCode::METHOD_NOT_ALLOWED);
    }
}

/// Produces a fresh page handler per request.
pub type PageConstructor = Arc<dyn Fn() -> Box<dyn PageHandler> + Send + Sync>;

/// Produces a fresh API handler per request.
pub type ApiConstructor = Arc<dyn Fn() -> Box<dyn ApiHandler> + Send + Sync>;

/// Route the request verb to the page handler; other verbs get a fixed `501`.
pub(crate) fn dispatch_page(
    handler: &mut dyn PageHandler,
    res: &mut PageResponse<'_>,
    req: &Request,
) {
    match *req.method() {
        Method::GET => handler.get(res, req),
        Method::POST => handler.post(res, req),
        ref other => {
            debug!(method = %other, family = "page", "Unsupported method");
            res.reject(StatusCode::NOT_IMPLEMENTED);
        }
    }
}

/// Route the request verb to the API handler; other verbs get `501`.
pub(crate) fn dispatch_api(
    handler: &mut dyn ApiHandler,
    w: &mut DeferredWriter<'_>,
    req: &Request,
) {
    match *req.method() {
        Method::GET => handler.get(w, req),
        Method::POST => handler.post(w, req),
        Method::PUT => handler.put(w, req),
        Method::DELETE => handler.delete(w, req),
        Method::PATCH => handler.patch(w, req),
        Method::HEAD => handler.head(w, req),
        ref other => {
            debug!(method = %other, family = "api", "Unsupported method");
            w.write_header(StatusCode::NOT_IMPLEMENTED);
        }
    }
}
