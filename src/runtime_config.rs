//! # Runtime Configuration Module
//!
//! Environment-driven settings for the coroutine runtime and page rendering.
//!
//! ## Environment Variables
//!
//! ### `PORTICO_STACK_SIZE`
//!
//! Stack size for connection coroutines. Accepts decimal (`32768`) or
//! hexadecimal (`0x8000`). Default: `0x8000` (32 KB).
//!
//! Template rendering runs on the connection coroutine, so this needs more
//! headroom than a plain JSON handler would.
//!
//! ### `PORTICO_ERROR_TEMPLATE`
//!
//! Identifier of the template rendered when a page template fails. Unset
//! means failures answer with an empty `500`.
//!
//! ### `PORTICO_TEMPLATE_GROUP`
//!
//! Template group page responses start with. Default: `default`.
//!
//! ## Usage
//!
//! ```rust
//! use portico::runtime_config::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_env();
//! config.apply();
//! println!("Stack size: {} bytes", config.stack_size);
//! ```

use std::env;

use tracing::info;

use crate::page::DEFAULT_TEMPLATE_GROUP;

/// Default coroutine stack size (32 KB).
pub const DEFAULT_STACK_SIZE: usize = 0x8000;

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Stack size for coroutines in bytes
    pub stack_size: usize,
    pub error_template: Option<String>,
    pub template_group: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            stack_size: DEFAULT_STACK_SIZE,
            error_template: None,
            template_group: DEFAULT_TEMPLATE_GROUP.to_string(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let stack_size = lookup("PORTICO_STACK_SIZE")
            .and_then(|val| parse_size(&val))
            .unwrap_or(DEFAULT_STACK_SIZE);
        let error_template = lookup("PORTICO_ERROR_TEMPLATE").filter(|v| !v.is_empty());
        let template_group = lookup("PORTICO_TEMPLATE_GROUP")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_TEMPLATE_GROUP.to_string());
        RuntimeConfig {
            stack_size,
            error_template,
            template_group,
        }
    }

    /// Configure the `may` runtime. Call once, before starting the server.
    pub fn apply(&self) {
        may::config().set_stack_size(self.stack_size);
        info!(stack_size = self.stack_size, "Coroutine runtime configured");
    }
}

fn parse_size(val: &str) -> Option<usize> {
    let val = val.trim();
    match val.strip_prefix("0x").or_else(|| val.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16).ok(),
        None => val.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        assert_eq!(
            RuntimeConfig::from_lookup(lookup(&[])),
            RuntimeConfig::default()
        );
    }

    #[test]
    fn test_hex_and_decimal_stack_size() {
        let hex = RuntimeConfig::from_lookup(lookup(&[("PORTICO_STACK_SIZE", "0x10000")]));
        assert_eq!(hex.stack_size, 0x10000);
        let dec = RuntimeConfig::from_lookup(lookup(&[("PORTICO_STACK_SIZE", "16384")]));
        assert_eq!(dec.stack_size, 16384);
        let bad = RuntimeConfig::from_lookup(lookup(&[("PORTICO_STACK_SIZE", "lots")]));
        assert_eq!(bad.stack_size, DEFAULT_STACK_SIZE);
    }

    #[test]
    fn test_template_settings() {
        let cfg = RuntimeConfig::from_lookup(lookup(&[
            ("PORTICO_ERROR_TEMPLATE", "error.html"),
            ("PORTICO_TEMPLATE_GROUP", "admin"),
        ]));
        assert_eq!(cfg.error_template.as_deref(), Some("error.html"));
        assert_eq!(cfg.template_group, "admin");

        let empty = RuntimeConfig::from_lookup(lookup(&[("PORTICO_TEMPLATE_GROUP", "")]));
        assert_eq!(empty.template_group, "default");
    }
}
