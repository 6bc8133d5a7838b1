//! # CLI Module
//!
//! Command-line entry point for running a demo `portico` service.
//!
//! ## Commands
//!
//! ### `serve`
//!
//! Start the demo service:
//!
//! ```bash
//! portico serve --addr 127.0.0.1:8080
//! ```
//!
//! Routes served:
//! - `GET /` and `POST /` - page rendered from the `home.html` template
//! - `GET /account` - page guarded by the `x-demo-token` header
//! - `GET|PUT|DELETE /api/items/{id}` - API handler with a bound `id`
//! - `GET /health` - liveness check
//!
//! Runtime behaviour is tuned through `PORTICO_*` environment variables, see
//! [`crate::runtime_config`] and [`crate::logging`].

mod commands;
mod demo;


pub use commands::{run_cli, Cli, Commands};
pub use demo::{demo_templates, DemoRoutes};
