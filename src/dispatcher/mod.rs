//! # Dispatcher Module
//!
//! Per-route orchestration of a request through a handler family.
//!
//! ## Overview
//!
//! Every route owns one [`Adapter`]. The adapter is built once, holds only
//! immutable configuration and serves any number of concurrent requests.
//! Per request it:
//!
//! 1. Opens a `request` span carrying a ULID request id
//! 2. Builds the family's response object bound to the output sink
//! 3. Constructs a fresh handler and obtains its interceptor chain
//! 4. Runs the chain: `before` hooks, verb dispatch, `after` hooks in reverse
//! 5. Commits the response exactly once
//!
//! ## Families
//!
//! - **Page**: the handler decides on a redirect or a template. The decision
//!   is rendered at commit; an undecided response becomes `500`.
//! - **API**: the handler writes a status and bytes through a
//!   [`DeferredWriter`](crate::api::DeferredWriter). URI variables are bound
//!   into the handler before the chain runs.
//!
//! ```rust,ignore
//! use portico::dispatcher::{Adapter, Serve};
//!
//! let adapter = Adapter::api(|| ItemsHandler::default());
//! adapter.serve(&mut sink, &request, &vars);
//! ```
//!
//! ## Error Handling
//!
//! Template and binding failures go to the adapter's
//! [`ErrorLogger`](crate::error::ErrorLogger); the client only sees a status.
//! Panics in handlers or interceptors are not caught here.

mod core;

pub use core::{Adapter, ApiPipeline, PagePipeline, Serve};
