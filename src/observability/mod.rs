//! # Observability
//!
//! Structured logging setup on the tracing ecosystem. Every reportable
//! condition in the engine (rule-load summary, provider not found, provider
//! error/timeout, missing secret reference, cache invalidation) is emitted
//! as a distinguishable tracing event with structured fields; this module
//! only wires up a subscriber for hosts that do not install their own.

use tracing_subscriber::{fmt, EnvFilter};

/// Initialize a fmt subscriber with an env-filter.
///
/// `default_filter` applies when `RUST_LOG` is unset (e.g. `"info"` or
/// `"credgate=debug"`). Uses `try_init` so calling it when the host already
/// installed a subscriber (or from multiple tests) is harmless.
pub fn init_logging(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter.to_string()));

    let _ = fmt().with_env_filter(filter).with_target(true).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_is_idempotent() {
        init_logging("info");
        init_logging("debug");
    }
}
