//! # Credgate
//!
//! Credential-injection engine for intercepting proxies. An automated
//! client's outbound HTTP(S) traffic passes through a host proxy; this
//! crate decides, per request, which credentials to resolve and embeds them
//! into headers — the client itself never observes the secret values.
//!
//! ## Architecture
//!
//! ```text
//! host proxy ─ on_request ─▶ Request Matcher ─▶ Injection Controller
//!                                                   │
//!                              Template Parser ◀────┤
//!                              Secret Cache    ◀────┤──▶ Provider Invoker
//!                                                   │       (exec scripts)
//! host proxy ─ on_response ─▶ 401 detection ─▶ cache invalidation
//! ```
//!
//! ## Core Components
//!
//! - **Rule Store** ([`config`]): reloadable match/inject rules as atomic
//!   immutable snapshots
//! - **Request Matcher** ([`matcher`]): passthrough exemptions, host globs,
//!   path prefixes
//! - **Template Parser** ([`template`]): `{secret}` / `{secret:<ref>}`
//!   header-value templates
//! - **Secret resolution** ([`secrets`]): pluggable providers, external
//!   executable invocation, process-wide TTL cache
//! - **Injection Controller** ([`inject`]): request/response orchestration,
//!   fail-open per header
//! - **Host seam** ([`intercept`]): traits the host proxy implements, plus
//!   `http` adapters
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use credgate::{ConfigDocument, CredentialInjector, ProviderRegistry, RuleStore, SecretCache};
//! use std::sync::Arc;
//!
//! # async fn run(doc: ConfigDocument) -> credgate::Result<()> {
//! let store = Arc::new(RuleStore::new());
//! store.load(doc).await?;
//!
//! let registry = ProviderRegistry::new("/etc/credgate/providers");
//! let injector = CredentialInjector::new(store, registry, SecretCache::new());
//!
//! let mut request = http::Request::builder()
//!     .uri("https://api.example.com/v1/items")
//!     .body(())
//!     .unwrap();
//! injector.on_request(&mut request).await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod errors;
pub mod inject;
pub mod intercept;
pub mod matcher;
pub mod observability;
pub mod secrets;
pub mod template;

// Re-export commonly used types and traits
pub use config::{ConfigDocument, RuleSnapshot, RuleStore, Settings};
pub use errors::{Error, Result};
pub use inject::CredentialInjector;
pub use intercept::{InterceptedRequest, InterceptedResponse};
pub use observability::init_logging;
pub use secrets::{
    CacheKey, ExecProvider, ProviderRegistry, SecretCache, SecretProvider, SecretString,
    StaticProvider,
};
pub use template::parse_secret_template;

/// Library version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
