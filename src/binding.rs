//! Best-effort decoding of URI variables into API handler fields.
//!
//! The router hands over the variables extracted from the matched path. A
//! handler names the fields it wants bound through [`Binder`]; each variable
//! that is present is parsed with `FromStr`. Failures are collected, reported
//! through the adapter's logger and otherwise ignored, so the request proceeds
//! with whatever fields did bind.

use smallvec::SmallVec;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

use crate::error::{BindError, ErrorLogger, PipelineError};
use crate::handler::ApiHandler;

/// Maximum URI variables stored inline before spilling to the heap.
pub const MAX_INLINE_VARS: usize = 8;

/// URI variables as `(name, value)` pairs in path order.
pub type UriVars = SmallVec<[(Arc<str>, String); MAX_INLINE_VARS]>;

/// Look up a URI variable; a later duplicate shadows an earlier one.
#[must_use]
pub fn uri_var<'v>(vars: &'v UriVars, name: &str) -> Option<&'v str> {
    vars.iter()
        .rfind(|(k, _)| k.as_ref() == name)
        .map(|(_, v)| v.as_str())
}

/// Collects field bindings declared by a handler.
pub struct Binder<'v> {
    vars: &'v UriVars,
    bound: usize,
    errors: Vec<BindError>,
}

/// Result of one binding pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BindReport {
    pub bound: usize,
    pub errors: Vec<BindError>,
}

impl<'v> Binder<'v> {
    #[must_use]
    pub fn new(vars: &'v UriVars) -> Self {
        Self {
            vars,
            bound: 0,
            errors: Vec::new(),
        }
    }

    /// Bind variable `name` into `slot` if present. The slot is left untouched
    /// when the variable is absent or does not parse.
    pub fn field<T>(&mut self, name: &str, slot: &mut T) -> &mut Self
    where
        T: FromStr,
        T::Err: Display,
    {
        if let Some(raw) = uri_var(self.vars, name) {
            match raw.parse::<T>() {
                Ok(value) => {
                    *slot = value;
                    self.bound += 1;
                }
                Err(err) => self.errors.push(BindError::new(name, raw, err.to_string())),
            }
        }
        self
    }

    /// Like [`Binder::field`], storing `Some(value)` on success.
    pub fn optional<T>(&mut self, name: &str, slot: &mut Option<T>) -> &mut Self
    where
        T: FromStr,
        T::Err: Display,
    {
        if let Some(raw) = uri_var(self.vars, name) {
            match raw.parse::<T>() {
                Ok(value) => {
                    *slot = Some(value);
                    self.bound += 1;
                }
                Err(err) => self.errors.push(BindError::new(name, raw, err.to_string())),
            }
        }
        self
    }

    #[must_use]
    pub fn finish(self) -> BindReport {
        BindReport {
            bound: self.bound,
            errors: self.errors,
        }
    }
}

/// Bind `vars` into `handler`, logging every failure. Never fails the request.
pub fn decode_uri_vars(
    handler: &mut dyn ApiHandler,
    vars: &UriVars,
    logger: &ErrorLogger,
) -> BindReport {
    let mut binder = Binder::new(vars);
    handler.bind(&mut binder);
    let report = binder.finish();
    for err in &report.errors {
        logger(&PipelineError::Binding(err.clone()));
    }
    debug!(
        vars = vars.len(),
        bound = report.bound,
        failed = report.errors.len(),
        "URI variables decoded"
    );
    report
}
