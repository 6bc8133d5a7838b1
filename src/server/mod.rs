//! Hosting: the raw response sink and the `may_minihttp` bridge.

pub mod http_server;
pub mod request;
pub mod response;
pub mod service;
pub mod sink;

pub use http_server::{HttpServer, ServerHandle};
pub use request::{build_request, into_http_request, Request};
pub use service::{health_endpoint, AppService, RouteResolver};
pub use sink::{BufferedSink, ResponseSink};
