//! Provider registry.
//!
//! Resolves a provider name to a [`SecretProvider`] capability. Explicitly
//! registered in-process providers take precedence; any other name maps to
//! an [`ExecProvider`] executable under the providers directory. Existence
//! of that executable is checked at resolve time, so registration is never
//! required for script-backed providers.

use super::exec::{ExecProvider, PROVIDER_TIMEOUT};
use super::provider::SecretProvider;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Registry of secret providers rooted at a providers directory.
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    providers_dir: PathBuf,
    timeout: Duration,
    in_process: HashMap<String, Arc<dyn SecretProvider>>,
}

impl ProviderRegistry {
    /// Create a registry whose script-backed providers live under
    /// `providers_dir`.
    pub fn new(providers_dir: impl Into<PathBuf>) -> Self {
        Self {
            providers_dir: providers_dir.into(),
            timeout: PROVIDER_TIMEOUT,
            in_process: HashMap::new(),
        }
    }

    /// Override the invocation timeout applied to script-backed providers.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Register an in-process provider under its own name, shadowing any
    /// script of the same name.
    pub fn register(&mut self, provider: Arc<dyn SecretProvider>) {
        info!(provider = %provider.name(), "Registering in-process secret provider");
        self.in_process.insert(provider.name().to_string(), provider);
    }

    /// Whether an in-process provider is registered under `name`.
    pub fn has_in_process(&self, name: &str) -> bool {
        self.in_process.contains_key(name)
    }

    /// Directory where provider executables are looked up.
    pub fn providers_dir(&self) -> &Path {
        &self.providers_dir
    }

    /// Resolve a provider name to a capability.
    pub fn provider(&self, name: &str) -> Arc<dyn SecretProvider> {
        if let Some(provider) = self.in_process.get(name) {
            return Arc::clone(provider);
        }
        Arc::new(ExecProvider::new(&self.providers_dir, name).with_timeout(self.timeout))
    }
}
