//! Request matching.
//!
//! Decides whether an outbound request is exempt (passthrough) or matched by
//! a rule. Host constraints are fnmatch-style globs (`*.example.com`); path
//! constraints are literal prefixes. Patterns are compiled once when a
//! configuration snapshot is built, not per request.

use crate::config::types::Rule;
use glob::Pattern;
use tracing::warn;

/// A compiled hostname constraint.
///
/// `glob::Pattern` can reject patterns (unbalanced `[`) that fnmatch-style
/// matchers accept; a malformed pattern is logged at load time and matches
/// nothing rather than silently widening scope.
#[derive(Debug, Clone)]
pub enum HostPattern {
    /// No constraint: every host matches.
    Any,
    /// Compiled glob constraint.
    Glob(Pattern),
    /// Malformed pattern: no host matches.
    Never,
}

impl HostPattern {
    /// Compile an optional host glob from a rule's match block.
    pub fn compile(pattern: Option<&str>) -> Self {
        match pattern {
            None => Self::Any,
            Some(raw) => match Pattern::new(raw) {
                Ok(compiled) => Self::Glob(compiled),
                Err(error) => {
                    warn!(pattern = %raw, error = %error, "Malformed host pattern; rule will match no host");
                    Self::Never
                }
            },
        }
    }

    pub fn matches(&self, host: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Glob(pattern) => pattern.matches(host),
            Self::Never => false,
        }
    }
}

/// A rule with its host constraint pre-compiled.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub rule: Rule,
    host: HostPattern,
}

impl CompiledRule {
    pub fn new(rule: Rule) -> Self {
        let host = HostPattern::compile(rule.matches.host.as_deref());
        Self { rule, host }
    }

    /// A rule matches iff every present constraint holds; an absent
    /// constraint always permits.
    pub fn matches(&self, host: &str, path: &str) -> bool {
        if !self.host.matches(host) {
            return false;
        }
        match self.rule.matches.path_prefix.as_deref() {
            Some(prefix) => path.starts_with(prefix),
            None => true,
        }
    }
}

/// Compile passthrough patterns, dropping (and logging) malformed ones.
pub fn compile_passthrough(patterns: &[String]) -> Vec<Pattern> {
    patterns
        .iter()
        .filter_map(|raw| match Pattern::new(raw) {
            Ok(compiled) => Some(compiled),
            Err(error) => {
                warn!(pattern = %raw, error = %error, "Malformed passthrough pattern; ignoring");
                None
            }
        })
        .collect()
}

/// True iff the host matches any passthrough glob.
pub fn is_passthrough(passthrough: &[Pattern], host: &str) -> bool {
    passthrough.iter().any(|pattern| pattern.matches(host))
}
