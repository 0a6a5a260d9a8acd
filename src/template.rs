//! Secret template parsing.
//!
//! Header values in injection rules are written as templates containing
//! either the bare placeholder `{secret}` or an embedded reference
//! `{secret:<ref>}`. Parsing normalizes the embedded form back to `{secret}`
//! and surfaces the reference so the resolution path can use it in place of
//! the rule-level `secret_ref`.

use crate::errors::{Error, Result};

/// The substitution point for a resolved secret value.
pub const PLACEHOLDER: &str = "{secret}";

/// Opening marker of an embedded secret reference.
const REF_OPEN: &str = "{secret:";

/// Parse a header-value template into `(normalized, ref_override)`.
///
/// The normalized template always carries the bare `{secret}` placeholder;
/// `ref_override` is `Some` only when the template embedded a reference via
/// `{secret:<ref>}`. Only the first embedded reference is special-cased.
///
/// ```
/// use credgate::template::parse_secret_template;
///
/// let (tpl, r) = parse_secret_template("Bearer {secret:db-pass}").unwrap();
/// assert_eq!(tpl, "Bearer {secret}");
/// assert_eq!(r.as_deref(), Some("db-pass"));
///
/// let (tpl, r) = parse_secret_template("Bearer {secret}").unwrap();
/// assert_eq!(tpl, "Bearer {secret}");
/// assert!(r.is_none());
/// ```
///
/// # Errors
///
/// Returns [`Error::TemplateSyntax`] when `{secret:` appears without a
/// closing `}`. Truncating silently would inject a wrong value, so this is
/// surfaced as a configuration bug instead.
pub fn parse_secret_template(template: &str) -> Result<(String, Option<String>)> {
    let Some(start) = template.find(REF_OPEN) else {
        return Ok((template.to_string(), None));
    };

    let ref_start = start + REF_OPEN.len();
    let Some(ref_len) = template[ref_start..].find('}') else {
        return Err(Error::template_syntax(template, "'{secret:' without closing '}'"));
    };

    let reference = template[ref_start..ref_start + ref_len].to_string();
    let normalized = format!(
        "{}{}{}",
        &template[..start],
        PLACEHOLDER,
        &template[ref_start + ref_len + 1..]
    );
    Ok((normalized, Some(reference)))
}

/// Substitute the resolved secret into a normalized template.
///
/// Every `{secret}` occurrence is replaced; templates produced by
/// [`parse_secret_template`] carry at least one.
pub fn fill_template(normalized: &str, secret: &str) -> String {
    normalized.replace(PLACEHOLDER, secret)
}
