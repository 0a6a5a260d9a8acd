//! # Error Handling
//!
//! Error types for the credential-injection engine, built on `thiserror`.
//!
//! Everything except a configuration reload failure is scoped to a single
//! header/rule: resolution failures are logged and the header is left
//! uninjected, never aborting the rest of the request (fail-open).

use std::path::PathBuf;
use std::time::Duration;

/// Custom result type for credgate operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the credential-injection engine.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Configuration load/reload errors. Non-fatal: the prior rule snapshot
    /// stays in place.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed secret placeholder in a header template, e.g. `{secret:`
    /// with no closing brace. A configuration bug, not a runtime condition.
    #[error("Malformed secret template {template:?}: {reason}")]
    TemplateSyntax { template: String, reason: String },

    /// The provider's resolution executable does not exist.
    #[error("Provider executable not found for '{provider}': {path}")]
    ProviderNotFound { provider: String, path: PathBuf },

    /// The provider executable did not finish within the invocation timeout.
    #[error("Provider '{provider}' timed out after {timeout:?} resolving '{reference}'")]
    ProviderTimeout { provider: String, reference: String, timeout: Duration },

    /// The provider executable exited non-zero; `stderr` carries its
    /// diagnostic output.
    #[error("Provider '{provider}' failed for '{reference}': {stderr}")]
    ProviderFailed { provider: String, reference: String, stderr: String },

    /// No secret reference could be determined for a header: neither an
    /// embedded `{secret:<ref>}` override nor a rule-level `secret_ref`.
    #[error("No secret reference for rule '{rule}' header '{header}'")]
    MissingSecretReference { rule: String, header: String },

    /// I/O errors (provider spawn failures and the like).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a new configuration error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new template syntax error.
    pub fn template_syntax<T: Into<String>, R: Into<String>>(template: T, reason: R) -> Self {
        Self::TemplateSyntax { template: template.into(), reason: reason.into() }
    }

    /// Create a new missing-secret-reference error.
    pub fn missing_secret_reference<R: Into<String>, H: Into<String>>(rule: R, header: H) -> Self {
        Self::MissingSecretReference { rule: rule.into(), header: header.into() }
    }
}
