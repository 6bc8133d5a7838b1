//! # portico
//!
//! Request-dispatch core for a small server-side web framework, hosted on the
//! `may` coroutine runtime through `may_minihttp`.
//!
//! ## Overview
//!
//! A route is served by an [`Adapter`](dispatcher::Adapter) wrapping exactly
//! one handler family:
//!
//! - **Page handlers** ([`PageHandler`](handler::PageHandler)) decide on a
//!   redirect or a template. The decision is rendered once, after every
//!   interceptor has run. A handler that decides nothing yields `500`.
//! - **API handlers** ([`ApiHandler`](handler::ApiHandler)) write a status and
//!   raw bytes through a [`DeferredWriter`](api::DeferredWriter) that sends the
//!   status line exactly once, on the first body write.
//!
//! Both families share one interceptor model. Each handler supplies an ordered
//! [`InterceptorChain`](interceptor::InterceptorChain); `before` hooks run in
//! order and any of them may decide the response, which skips the handler and
//! every later interceptor. `after` hooks run in reverse for exactly the
//! interceptors whose `before` ran.
//!
//! ## Modules
//!
//! - **[`interceptor`]** - the `Interceptor` trait, chains and built-in interceptors
//! - **[`page`]** - deferred page responses and their commit step
//! - **[`api`]** - the deferred-header writer
//! - **[`handler`]** - handler traits and verb dispatch
//! - **[`binding`]** - best-effort URI variable binding
//! - **[`dispatcher`]** - the per-route adapter
//! - **[`templates`]** - template groups (`minijinja`-backed)
//! - **[`server`]** - response sinks and the `may_minihttp` service
//! - **[`error`]** - pipeline errors and the error callback
//! - **[`logging`]** / **[`runtime_config`]** - process setup
//!
//! ## Example
//!
//! ```rust,ignore
//! use portico::dispatcher::{Adapter, Serve};
//! use portico::handler::PageHandler;
//! use portico::page::PageResponse;
//! use portico::server::Request;
//! use serde_json::json;
//!
//! struct Home;
//!
//! impl PageHandler for Home {
//!     fn get(&mut self, res: &mut PageResponse<'_>, _req: &Request) {
//!         res.execute_template("home.html", json!({ "name": "World" }));
//!     }
//! }
//!
//! let adapter = Adapter::page(|| Home, templates);
//! adapter.serve(&mut sink, &request, &vars);
//! ```

pub mod api;
pub mod binding;
pub mod cli;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod ids;
pub mod interceptor;
pub mod logging;
pub mod page;
pub mod runtime_config;
pub mod server;
pub mod templates;

pub use api::{Api, DeferredWriter, HeaderState};
pub use binding::{decode_uri_vars, uri_var, BindReport, Binder, UriVars};
pub use dispatcher::{Adapter, Serve};
pub use error::{tracing_logger, BindError, ErrorLogger, PipelineError, RenderError};
pub use handler::{ApiHandler, PageHandler};
pub use ids::RequestId;
pub use interceptor::{ChainOutcome, Family, Interceptor, InterceptorChain, ShortCircuit};
pub use page::{Page, PageResponse, RedirectTarget, TemplateSelection};
pub use server::{BufferedSink, Request, ResponseSink};
pub use templates::{MiniJinjaGroup, TemplateGroup, TemplateGroupSet};
