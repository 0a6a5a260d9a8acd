//! # Configuration Data Model
//!
//! Serde structures for the consumed configuration document:
//!
//! ```yaml
//! settings:
//!   default_provider: vault
//!   cache_ttl: 300
//!   retry_on_401: true
//! providers:
//!   vault:
//!     address: https://vault.internal:8200
//! http_proxy:
//!   passthrough:
//!     - "*.internal.example.com"
//!   rules:
//!     - name: api-token
//!       match: { host: "api.example.com", path_prefix: "/v1" }
//!       provider: vault
//!       secret_ref: svc-token
//!       inject:
//!         headers:
//!           Authorization: "Bearer {secret}"
//! ```
//!
//! Parsing the file itself belongs to the host; these types only give the
//! document a shape. Unknown fields are ignored and missing fields fall back
//! to documented defaults — there is no validation beyond structural
//! presence.

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Default secret cache TTL in seconds.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Per-provider static key/value parameters, merged beneath rule-level
/// overrides when invoking that provider. `BTreeMap` keeps the argument
/// order deterministic.
pub type ProviderConfig = BTreeMap<String, String>;

/// Top-level configuration document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigDocument {
    /// Global defaults.
    #[serde(default)]
    pub settings: Settings,

    /// Static per-provider parameters, keyed by provider name.
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderConfig>,

    /// Injection rules and passthrough patterns.
    #[serde(default)]
    pub http_proxy: HttpProxyConfig,
}

impl ConfigDocument {
    /// A document with no rules and no passthrough patterns carries nothing
    /// worth swapping in; reloads treat it like a failed load.
    pub fn is_empty(&self) -> bool {
        self.http_proxy.rules.is_empty() && self.http_proxy.passthrough.is_empty()
    }
}

/// Global defaults applied when a rule leaves a field unset.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Provider used by rules that name none. When this is also absent, such
    /// rules skip injection (logged, fail-open).
    #[serde(default)]
    pub default_provider: Option<String>,

    /// Secret cache TTL in seconds.
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl: u64,

    /// Whether a 401 response invalidates the cache entries of the matching
    /// rules so the next request re-fetches.
    #[serde(default)]
    pub retry_on_401: bool,
}

fn default_cache_ttl() -> u64 {
    DEFAULT_CACHE_TTL_SECS
}

impl Default for Settings {
    fn default() -> Self {
        Self { default_provider: None, cache_ttl: DEFAULT_CACHE_TTL_SECS, retry_on_401: false }
    }
}

impl Settings {
    /// Cache TTL as a [`Duration`].
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }
}

/// The `http_proxy` section: rules plus passthrough host patterns.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HttpProxyConfig {
    /// Match/inject rules, applied in declaration order.
    #[serde(default)]
    pub rules: Vec<Rule>,

    /// Hosts matching any of these globs are fully exempt from rule
    /// processing on both the request and response path.
    #[serde(default)]
    pub passthrough: Vec<String>,
}

/// One match/inject rule. Immutable after load.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Rule {
    /// Rule name, used only in logs.
    #[serde(default)]
    pub name: Option<String>,

    /// Match constraints; an absent constraint always permits.
    #[serde(default, rename = "match")]
    pub matches: MatchSpec,

    /// Provider resolving this rule's secrets; falls back to
    /// `settings.default_provider`.
    #[serde(default)]
    pub provider: Option<String>,

    /// Secret reference used when a header template carries no embedded
    /// `{secret:<ref>}` override.
    #[serde(default)]
    pub secret_ref: Option<String>,

    /// Rule-level provider parameter overrides, appended after the
    /// provider's static parameters on invocation (last-wins is the provider
    /// script's concern).
    #[serde(default)]
    pub provider_config: Option<ProviderConfig>,

    /// Headers to inject.
    #[serde(default)]
    pub inject: InjectSpec,
}

impl Rule {
    /// Name for log lines; unnamed rules are reported as `"unnamed"`.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("unnamed")
    }
}

/// Match constraints of a rule.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatchSpec {
    /// Hostname glob, e.g. `api.example.com` or `*.example.com`.
    #[serde(default)]
    pub host: Option<String>,

    /// Literal path prefix the request path must start with.
    #[serde(default)]
    pub path_prefix: Option<String>,
}

/// Injection action of a rule.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InjectSpec {
    /// Header name → value template, in declaration order.
    #[serde(default)]
    pub headers: HeaderTemplates,
}

/// An order-preserving header-name → template mapping.
///
/// Header templates are applied in insertion order, and a later rule
/// targeting the same header name wins, so a sorted map would change
/// observable behavior. Deserialized with a hand-written visitor because the
/// dependency stack carries no ordered-map type.
#[derive(Debug, Clone, Default)]
pub struct HeaderTemplates(pub Vec<(String, String)>);

impl HeaderTemplates {
    /// Iterate `(header_name, template)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(name, template)| (name.as_str(), template.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl<'de> Deserialize<'de> for HeaderTemplates {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct HeaderTemplatesVisitor;

        impl<'de> Visitor<'de> for HeaderTemplatesVisitor {
            type Value = HeaderTemplates;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of header names to value templates")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, template)) = access.next_entry::<String, String>()? {
                    entries.push((name, template));
                }
                Ok(HeaderTemplates(entries))
            }
        }

        deserializer.deserialize_map(HeaderTemplatesVisitor)
    }
}

impl FromIterator<(String, String)> for HeaderTemplates {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
settings:
  default_provider: vault
  cache_ttl: 60
  retry_on_401: true
providers:
  vault:
    address: https://vault.internal:8200
    mount: kv
http_proxy:
  passthrough:
    - "*.internal.example.com"
    - localhost
  rules:
    - name: api-token
      match:
        host: api.example.com
        path_prefix: /v1
      provider: vault
      secret_ref: svc-token
      inject:
        headers:
          Authorization: "Bearer {secret}"
          X-Api-Key: "{secret:api-key}"
"#;

    #[test]
    fn test_full_document_parses() {
        let doc: ConfigDocument = serde_yaml::from_str(SAMPLE).unwrap();

        assert_eq!(doc.settings.default_provider.as_deref(), Some("vault"));
        assert_eq!(doc.settings.cache_ttl(), Duration::from_secs(60));
        assert!(doc.settings.retry_on_401);

        assert_eq!(doc.providers["vault"]["mount"], "kv");
        assert_eq!(doc.http_proxy.passthrough.len(), 2);

        let rule = &doc.http_proxy.rules[0];
        assert_eq!(rule.display_name(), "api-token");
        assert_eq!(rule.matches.host.as_deref(), Some("api.example.com"));
        assert_eq!(rule.matches.path_prefix.as_deref(), Some("/v1"));
        assert_eq!(rule.secret_ref.as_deref(), Some("svc-token"));
    }

    #[test]
    fn test_header_templates_preserve_declaration_order() {
        let doc: ConfigDocument = serde_yaml::from_str(SAMPLE).unwrap();
        let headers: Vec<_> = doc.http_proxy.rules[0].inject.headers.iter().collect();
        assert_eq!(
            headers,
            vec![
                ("Authorization", "Bearer {secret}"),
                ("X-Api-Key", "{secret:api-key}"),
            ]
        );
    }

    #[test]
    fn test_missing_fields_fall_back_to_defaults() {
        let doc: ConfigDocument = serde_yaml::from_str("http_proxy:\n  rules:\n    - {}\n").unwrap();

        assert_eq!(doc.settings.default_provider, None);
        assert_eq!(doc.settings.cache_ttl, DEFAULT_CACHE_TTL_SECS);
        assert!(!doc.settings.retry_on_401);

        let rule = &doc.http_proxy.rules[0];
        assert_eq!(rule.display_name(), "unnamed");
        assert!(rule.matches.host.is_none());
        assert!(rule.matches.path_prefix.is_none());
        assert!(rule.inject.headers.is_empty());
    }

    #[test]
    fn test_empty_document_detection() {
        let doc: ConfigDocument = serde_yaml::from_str("settings: {}\n").unwrap();
        assert!(doc.is_empty());

        let doc: ConfigDocument = serde_yaml::from_str(SAMPLE).unwrap();
        assert!(!doc.is_empty());
    }
}
