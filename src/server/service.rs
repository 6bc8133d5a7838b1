use http::{Method, StatusCode};
use may_minihttp::{HttpService, Request, Response};
use serde_json::json;
use std::io;
use std::sync::Arc;
use tracing::{debug, warn};

use super::request::{into_http_request, Request as PipelineRequest};
use super::response::{write_json_error, write_sink};
use super::sink::BufferedSink;
use crate::binding::UriVars;
use crate::dispatcher::Serve;

/// Selects the adapter for a path and extracts its URI variables.
///
/// The matching algorithm is up to the implementor.
pub trait RouteResolver: Send + Sync {
    fn resolve(&self, path: &str) -> Option<(&dyn Serve, UriVars)>;
}

/// `may_minihttp` service bridging connections to resolved adapters.
pub struct AppService<R> {
    resolver: Arc<R>,
}

impl<R> Clone for AppService<R> {
    fn clone(&self) -> Self {
        Self {
            resolver: Arc::clone(&self.resolver),
        }
    }
}

impl<R: RouteResolver> AppService<R> {
    pub fn new(resolver: R) -> Self {
        Self {
            resolver: Arc::new(resolver),
        }
    }

    /// Serve `req` into a fresh buffer; `None` when no route matches.
    #[must_use]
    pub fn handle(&self, req: &PipelineRequest) -> Option<BufferedSink> {
        let (adapter, vars) = self.resolver.resolve(req.uri().path())?;
        let mut sink = BufferedSink::new();
        adapter.serve(&mut sink, req, &vars);
        Some(sink)
    }
}

/// Liveness endpoint answering `{"status":"ok"}`.
pub fn health_endpoint(res: &mut Response) -> io::Result<()> {
    res.status_code(200, "OK");
    res.header("Content-Type: application/json");
    res.body_vec(json!({ "status": "ok" }).to_string().into_bytes());
    Ok(())
}

impl<R: RouteResolver + 'static> HttpService for AppService<R> {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let request = match into_http_request(req) {
            Ok(r) => r,
            Err(err) => {
                warn!(error = %err, "Rejecting malformed request");
                write_json_error(
                    res,
                    StatusCode::BAD_REQUEST,
                    json!({ "error": "Bad Request" }),
                );
                return Ok(());
            }
        };

        if request.method() == Method::GET && request.uri().path() == "/health" {
            return health_endpoint(res);
        }

        match self.handle(&request) {
            Some(sink) => write_sink(res, sink),
            None => {
                debug!(path = %request.uri().path(), "No route matched");
                write_json_error(
                    res,
                    StatusCode::NOT_FOUND,
                    json!({
                        "error": "Not Found",
                        "method": request.method().as_str(),
                        "path": request.uri().path()
                    }),
                );
            }
        }
        Ok(())
    }
}
