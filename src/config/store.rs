//! # Rule Store
//!
//! Holds the active configuration as an immutable snapshot behind an atomic
//! swap. Request handlers clone an `Arc` to the current snapshot and never
//! observe a half-updated rule set; a failed or empty reload logs the
//! problem and leaves the prior snapshot in place.

use super::types::{ConfigDocument, ProviderConfig, Settings};
use crate::errors::{Error, Result};
use crate::matcher::{self, CompiledRule};
use glob::Pattern;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};

/// One immutable view of the loaded configuration.
///
/// Rules, passthrough patterns, settings, and provider parameters are
/// replaced as a single unit on reload.
#[derive(Debug, Default)]
pub struct RuleSnapshot {
    pub rules: Vec<CompiledRule>,
    pub passthrough: Vec<Pattern>,
    pub settings: Settings,
    pub providers_config: BTreeMap<String, ProviderConfig>,
}

impl RuleSnapshot {
    fn from_document(doc: ConfigDocument) -> Self {
        let passthrough = matcher::compile_passthrough(&doc.http_proxy.passthrough);
        let rules = doc.http_proxy.rules.into_iter().map(CompiledRule::new).collect();
        Self { rules, passthrough, settings: doc.settings, providers_config: doc.providers }
    }

    /// True iff the host is exempt from rule processing.
    pub fn is_passthrough(&self, host: &str) -> bool {
        matcher::is_passthrough(&self.passthrough, host)
    }

    /// Rules matching the given request, in declaration order.
    pub fn matching_rules<'a>(
        &'a self,
        host: &'a str,
        path: &'a str,
    ) -> impl Iterator<Item = &'a CompiledRule> {
        self.rules.iter().filter(move |rule| rule.matches(host, path))
    }

    /// Static parameters for a provider, in deterministic (sorted) order.
    pub fn provider_config(&self, provider: &str) -> Option<&ProviderConfig> {
        self.providers_config.get(provider)
    }
}

/// Shared, reloadable rule store.
///
/// Starts empty (no rules, default settings): every request passes through
/// untouched until the first successful load.
#[derive(Debug, Default)]
pub struct RuleStore {
    snapshot: RwLock<Arc<RuleSnapshot>>,
}

impl RuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current snapshot. Cheap; callers hold the `Arc` for the duration
    /// of one request/response pair so both phases see the same rules.
    pub async fn current(&self) -> Arc<RuleSnapshot> {
        self.snapshot.read().await.clone()
    }

    /// Atomically replace the active snapshot with one built from `doc`.
    ///
    /// An empty document (no rules, no passthrough patterns) is rejected and
    /// the prior snapshot stays active.
    pub async fn load(&self, doc: ConfigDocument) -> Result<()> {
        if doc.is_empty() {
            error!("Configuration document carries no rules or passthrough patterns; keeping prior rule set");
            return Err(Error::config("empty configuration document"));
        }

        let next = Arc::new(RuleSnapshot::from_document(doc));
        info!(
            rules = next.rules.len(),
            passthrough = next.passthrough.len(),
            providers = next.providers_config.len(),
            "Loaded credential rules"
        );

        *self.snapshot.write().await = next;
        Ok(())
    }

    /// Read and parse a YAML rules file, then [`load`](Self::load) it.
    ///
    /// Any failure (missing file, parse error, empty document) is logged and
    /// the prior snapshot stays in place; the returned error exists for
    /// hosts that want to surface it, not because the store needs it
    /// handled.
    pub async fn reload_from_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) => {
                error!(path = %path.display(), error = %e, "Cannot read rules file; keeping prior rule set");
                return Err(Error::config(format!("cannot read {}: {e}", path.display())));
            }
        };

        let doc: ConfigDocument = match serde_yaml::from_str(&raw) {
            Ok(doc) => doc,
            Err(e) => {
                error!(path = %path.display(), error = %e, "Cannot parse rules file; keeping prior rule set");
                return Err(Error::config(format!("cannot parse {}: {e}", path.display())));
            }
        };

        self.load(doc).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_doc() -> ConfigDocument {
        serde_yaml::from_str(
            r#"
settings:
  cache_ttl: 120
http_proxy:
  passthrough: ["*.internal"]
  rules:
    - name: first
      match: { host: api.example.com }
      secret_ref: svc-token
      inject:
        headers:
          Authorization: "Bearer {secret}"
"#,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_load_replaces_snapshot_atomically() {
        let store = RuleStore::new();
        assert!(store.current().await.rules.is_empty());

        store.load(sample_doc()).await.unwrap();

        let snapshot = store.current().await;
        assert_eq!(snapshot.rules.len(), 1);
        assert_eq!(snapshot.settings.cache_ttl, 120);
        assert!(snapshot.is_passthrough("db.internal"));
    }

    #[tokio::test]
    async fn test_empty_document_keeps_prior_snapshot() {
        let store = RuleStore::new();
        store.load(sample_doc()).await.unwrap();

        let result = store.load(ConfigDocument::default()).await;
        assert!(result.is_err());

        // Prior snapshot is still active.
        let snapshot = store.current().await;
        assert_eq!(snapshot.rules.len(), 1);
    }

    #[tokio::test]
    async fn test_matching_rules_in_declaration_order() {
        let store = RuleStore::new();
        let doc: ConfigDocument = serde_yaml::from_str(
            r#"
http_proxy:
  rules:
    - name: first
      match: { host: "*.example.com" }
    - name: second
      match: { host: api.example.com }
    - name: unrelated
      match: { host: other.org }
"#,
        )
        .unwrap();
        store.load(doc).await.unwrap();

        let snapshot = store.current().await;
        let names: Vec<_> = snapshot
            .matching_rules("api.example.com", "/")
            .map(|r| r.rule.display_name().to_string())
            .collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_reload_from_missing_path_keeps_prior() {
        let store = RuleStore::new();
        store.load(sample_doc()).await.unwrap();

        let result = store.reload_from_path("/nonexistent/rules.yaml").await;
        assert!(result.is_err());
        assert_eq!(store.current().await.rules.len(), 1);
    }

    #[tokio::test]
    async fn test_reload_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "http_proxy:\n  rules:\n    - name: from-file\n      match: {{ host: x.y }}\n"
        )
        .unwrap();

        let store = RuleStore::new();
        store.reload_from_path(file.path()).await.unwrap();

        let snapshot = store.current().await;
        assert_eq!(snapshot.rules.len(), 1);
        assert_eq!(snapshot.rules[0].rule.display_name(), "from-file");
    }

    #[tokio::test]
    async fn test_unparseable_file_keeps_prior() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "http_proxy: [not a mapping").unwrap();

        let store = RuleStore::new();
        store.load(sample_doc()).await.unwrap();

        assert!(store.reload_from_path(file.path()).await.is_err());
        assert_eq!(store.current().await.rules.len(), 1);
    }
}
