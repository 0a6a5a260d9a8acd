//! # Secrets
//!
//! Secret resolution and caching: the [`SecretProvider`] capability, the
//! external-process invoker implementing the documented calling convention,
//! the provider registry, and the process-wide TTL cache.
//!
//! Resolved values are wrapped in [`SecretString`] from the moment a
//! provider returns them: Debug, Display, and serialization all redact, and
//! the memory is zeroed on drop. Nothing in this module persists a secret to
//! disk.

pub mod cache;
pub mod exec;
pub mod provider;
pub mod registry;
pub mod types;

pub use cache::{CacheKey, SecretCache};
pub use exec::{ExecProvider, PROVIDER_EXT, PROVIDER_TIMEOUT};
pub use provider::{SecretProvider, StaticProvider};
pub use registry::ProviderRegistry;
pub use types::SecretString;
