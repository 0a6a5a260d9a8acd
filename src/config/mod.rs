//! # Configuration
//!
//! Data model for the consumed configuration document and the reloadable
//! rule store that turns it into immutable snapshots.

pub mod store;
pub mod types;

pub use store::{RuleSnapshot, RuleStore};
pub use types::{
    ConfigDocument, HeaderTemplates, HttpProxyConfig, InjectSpec, MatchSpec, ProviderConfig, Rule,
    Settings, DEFAULT_CACHE_TTL_SECS,
};
