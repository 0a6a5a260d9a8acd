//! Secret provider capability.
//!
//! A provider resolves an opaque secret reference to a value. The primary
//! variant shells out to an external executable ([`ExecProvider`]), but the
//! trait leaves room for in-process providers without touching the
//! resolution or caching logic.
//!
//! [`ExecProvider`]: super::exec::ExecProvider

use super::types::SecretString;
use crate::errors::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// Trait for secret resolvers.
///
/// Implementations must be `Send + Sync` for use across concurrent request
/// handlers, and must never log the resolved value.
#[async_trait]
pub trait SecretProvider: Send + Sync + std::fmt::Debug {
    /// The provider name rules refer to.
    fn name(&self) -> &str;

    /// Resolve a secret reference.
    ///
    /// `config` carries merged `key=value` parameters: provider-level static
    /// pairs first, rule-level overrides after. When keys collide, treating
    /// the later pair as authoritative is the implementation's concern.
    async fn resolve(&self, reference: &str, config: &[(String, String)]) -> Result<SecretString>;
}

/// In-process provider backed by a fixed reference → value table.
///
/// Useful for tests and for embedders that hold a handful of credentials in
/// memory; production secrets normally come from an [`ExecProvider`] script.
///
/// [`ExecProvider`]: super::exec::ExecProvider
#[derive(Clone, Default)]
pub struct StaticProvider {
    name: String,
    values: HashMap<String, String>,
}

impl std::fmt::Debug for StaticProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Values are secrets; print only the name and entry count.
        f.debug_struct("StaticProvider")
            .field("name", &self.name)
            .field("secrets", &self.values.len())
            .finish()
    }
}

impl StaticProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), values: HashMap::new() }
    }

    /// Add a resolvable reference.
    pub fn with_secret(mut self, reference: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(reference.into(), value.into());
        self
    }
}

#[async_trait]
impl SecretProvider for StaticProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn resolve(
        &self,
        reference: &str,
        _config: &[(String, String)],
    ) -> Result<SecretString> {
        match self.values.get(reference) {
            Some(value) => Ok(SecretString::new(value.clone())),
            None => Err(crate::errors::Error::ProviderFailed {
                provider: self.name.clone(),
                reference: reference.to_string(),
                stderr: "reference not present in static provider".to_string(),
            }),
        }
    }
}
