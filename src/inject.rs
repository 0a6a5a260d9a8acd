//! # Injection Controller
//!
//! Orchestrates one request/response pair: passthrough filtering, rule
//! matching, template parsing, cache-then-provider resolution, and header
//! substitution on the way out; 401 detection and cache invalidation on the
//! way back.
//!
//! The controller is fail-open by design: a resolution failure is logged
//! and only that one header is left uninjected — the remaining headers,
//! rules, and the request itself continue. Upstream services reject the
//! unauthenticated request and the 401-triggered invalidation path
//! self-heals the cache for the next attempt. Do not tighten this into
//! fail-closed without flagging the behavioral change.

use crate::config::store::{RuleSnapshot, RuleStore};
use crate::config::types::Rule;
use crate::errors::{Error, Result};
use crate::intercept::{InterceptedRequest, InterceptedResponse};
use crate::matcher::CompiledRule;
use crate::secrets::{CacheKey, ProviderRegistry, SecretCache, SecretString};
use crate::template;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Credential-injection engine over a rule store, a provider registry, and
/// a shared secret cache.
///
/// One instance serves every in-flight request; both phase handlers are
/// safe to call concurrently and keep no per-request state beyond the
/// shared cache.
#[derive(Debug, Clone)]
pub struct CredentialInjector {
    store: Arc<RuleStore>,
    registry: ProviderRegistry,
    cache: SecretCache,
}

/// The `(provider, reference, rule config)` derivation for one header, used
/// identically by the request and response phases so invalidation hits the
/// same key resolution filled.
struct HeaderKey<'a> {
    provider: String,
    reference: String,
    rule: &'a Rule,
}

impl CredentialInjector {
    /// Create an injector. The cache is passed in (not created internally)
    /// so its lifetime and sharing are the embedder's decision.
    pub fn new(store: Arc<RuleStore>, registry: ProviderRegistry, cache: SecretCache) -> Self {
        Self { store, registry, cache }
    }

    /// The rule store backing this injector.
    pub fn store(&self) -> &Arc<RuleStore> {
        &self.store
    }

    /// The shared secret cache.
    pub fn cache(&self) -> &SecretCache {
        &self.cache
    }

    /// Request phase: inject credentials into a matching outbound request.
    ///
    /// Passthrough hosts are left untouched. Otherwise every matching rule
    /// is applied in declaration order, each header template in insertion
    /// order; when rules collide on a header name the later rule wins.
    pub async fn on_request<R: InterceptedRequest + ?Sized>(&self, request: &mut R) {
        let snapshot = self.store.current().await;
        let host = request.host().to_string();
        let path = request.path().to_string();

        if snapshot.is_passthrough(&host) {
            debug!(host = %host, "Passthrough host; leaving request untouched");
            return;
        }

        for rule in snapshot.matching_rules(&host, &path) {
            for (header_name, header_template) in rule.rule.inject.headers.iter() {
                let (normalized, key) =
                    match self.derive_header_key(&snapshot, rule, header_name, header_template) {
                        Ok(derived) => derived,
                        Err(e) => {
                            warn!(rule = %rule.rule.display_name(), header = %header_name, error = %e,
                                  "Skipping header");
                            continue;
                        }
                    };

                match self.resolve(&snapshot, &key).await {
                    Ok(secret) => {
                        let value = template::fill_template(&normalized, secret.expose_secret());
                        request.set_header(header_name, &value);
                        debug!(rule = %rule.rule.display_name(), header = %header_name,
                               provider = %key.provider, reference = %key.reference,
                               "Injected credential header");
                    }
                    Err(e) => {
                        // Fail-open: the header stays uninjected, the
                        // request goes out, the rest keeps processing.
                        warn!(rule = %rule.rule.display_name(), header = %header_name, error = %e,
                              "Credential resolution failed; header not injected");
                    }
                }
            }
        }
    }

    /// Response phase: on a 401, evict the cache entries the originating
    /// request's rules would use, so the next request re-fetches instead of
    /// reusing a known-bad credential.
    ///
    /// Does nothing unless `settings.retry_on_401` is enabled. Never
    /// re-injects or retries the failed request; each key is invalidated
    /// independently (no cross-key atomicity).
    pub async fn on_response<R, S>(&self, request: &R, response: &S)
    where
        R: InterceptedRequest + ?Sized,
        S: InterceptedResponse + ?Sized,
    {
        if response.status() != 401 {
            return;
        }

        let snapshot = self.store.current().await;
        if !snapshot.settings.retry_on_401 {
            return;
        }

        let host = request.host();
        let path = request.path();
        if snapshot.is_passthrough(host) {
            return;
        }

        for rule in snapshot.matching_rules(host, path) {
            for (header_name, header_template) in rule.rule.inject.headers.iter() {
                let Ok((_, key)) =
                    self.derive_header_key(&snapshot, rule, header_name, header_template)
                else {
                    // Already reported on the request path.
                    continue;
                };

                let cache_key = CacheKey::new(&key.provider, &key.reference);
                self.cache.invalidate(&cache_key).await;
                info!(provider = %key.provider, reference = %key.reference, host = %host,
                      "Invalidated cached credential after 401");
            }
        }
    }

    /// Derive the normalized template and `(provider, reference)` for one
    /// header. The reference is the template's embedded override when
    /// non-empty, else the rule's `secret_ref`; the provider is the rule's,
    /// else the global default.
    fn derive_header_key<'a>(
        &self,
        snapshot: &RuleSnapshot,
        rule: &'a CompiledRule,
        header_name: &str,
        header_template: &str,
    ) -> Result<(String, HeaderKey<'a>)> {
        let (normalized, ref_override) = template::parse_secret_template(header_template)?;

        let reference = ref_override
            .filter(|r| !r.is_empty())
            .or_else(|| rule.rule.secret_ref.clone())
            .filter(|r| !r.is_empty())
            .ok_or_else(|| {
                Error::missing_secret_reference(rule.rule.display_name(), header_name)
            })?;

        let provider = rule
            .rule
            .provider
            .clone()
            .or_else(|| snapshot.settings.default_provider.clone())
            .filter(|p| !p.is_empty())
            .ok_or_else(|| {
                Error::config(format!(
                    "rule '{}' names no provider and no default_provider is set",
                    rule.rule.display_name()
                ))
            })?;

        Ok((normalized, HeaderKey { provider, reference, rule: &rule.rule }))
    }

    /// Cache-then-provider resolution.
    ///
    /// Concurrent misses on the same cold key each invoke the provider (no
    /// single-flight); the cache write is atomic either way.
    async fn resolve(&self, snapshot: &RuleSnapshot, key: &HeaderKey<'_>) -> Result<SecretString> {
        let cache_key = CacheKey::new(&key.provider, &key.reference);
        let ttl = snapshot.settings.cache_ttl();

        if let Some(cached) = self.cache.get(&cache_key, ttl).await {
            return Ok(cached);
        }

        let config = merged_provider_config(snapshot, key);
        let provider = self.registry.provider(&key.provider);
        let value = provider.resolve(&key.reference, &config).await?;

        self.cache.insert(&cache_key, value.clone()).await;
        Ok(value)
    }
}

/// Merge invocation parameters: the provider's static pairs in deterministic
/// (sorted) order, then the rule-level overrides. Colliding keys appear
/// twice with the rule-level pair last; last-wins is delegated to the
/// provider's own argument parsing.
fn merged_provider_config(snapshot: &RuleSnapshot, key: &HeaderKey<'_>) -> Vec<(String, String)> {
    let mut merged = Vec::new();
    if let Some(static_config) = snapshot.provider_config(&key.provider) {
        merged.extend(static_config.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    if let Some(overrides) = &key.rule.provider_config {
        merged.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    merged
}
