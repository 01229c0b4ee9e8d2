//! Base URL normalization
//!
//! Providers disagree on where the OpenAI-compatible routes live. Some expect
//! `https://host/v1/...`, others expose the same routes under `https://host/api/...`.
//! A [`NormalizationRule`] swaps a single path segment for hosts carrying a given
//! marker, leaving scheme, host and the rest of the path untouched.
//!
//! All functions here are pure string transforms; no I/O and no URL re-encoding.

use serde::{Deserialize, Serialize};

/// Rewrites one path segment for URLs whose authority contains `host_marker`
///
/// Segments are compared whole: a rule from `v1` to `api` rewrites
/// `https://chat-api.tamu.ai/v1` but leaves `https://chat-api.tamu.ai/v10` alone.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "RawRule", into = "RawRule")]
pub struct NormalizationRule {
    host_marker: String,
    from: String,
    to: String,
}

#[derive(Deserialize, Serialize)]
struct RawRule {
    host_marker: String,
    from: String,
    to: String,
}

impl TryFrom<RawRule> for NormalizationRule {
    type Error = String;

    fn try_from(raw: RawRule) -> Result<Self, Self::Error> {
        Self::new(raw.host_marker, raw.from, raw.to)
    }
}

impl From<NormalizationRule> for RawRule {
    fn from(rule: NormalizationRule) -> Self {
        Self {
            host_marker: rule.host_marker,
            from: rule.from,
            to: rule.to,
        }
    }
}

impl NormalizationRule {
    /// Create a validated rule
    ///
    /// Leading and trailing slashes on `from`/`to` are ignored, so `"/v1"` and
    /// `"v1"` are the same rule.
    ///
    /// # Errors
    ///
    /// Returns an error if any field is empty, if `from` spans more than one
    /// segment, or if `to` contains `from` as one of its segments (which would
    /// make the rewrite non-idempotent).
    pub fn new(
        host_marker: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Result<Self, String> {
        let host_marker = host_marker.into().trim().to_string();
        let from = from.into().trim_matches('/').to_string();
        let to = to.into().trim_matches('/').to_string();

        if host_marker.is_empty() {
            return Err("normalization rule host_marker must not be empty".to_string());
        }
        if from.is_empty() || to.is_empty() {
            return Err(format!(
                "normalization rule for '{}' needs non-empty 'from' and 'to' segments",
                host_marker
            ));
        }
        if from.contains('/') {
            return Err(format!(
                "normalization rule 'from' must be a single path segment, got '{}'",
                from
            ));
        }
        if to.split('/').any(|segment| segment.is_empty() || segment == from) {
            return Err(format!(
                "normalization rule '{}' -> '{}' is not idempotent or has empty segments",
                from, to
            ));
        }

        Ok(Self {
            host_marker,
            from,
            to,
        })
    }

    /// The substring that must appear in the URL authority for the rule to apply
    pub fn host_marker(&self) -> &str {
        &self.host_marker
    }

    /// Path segment being replaced
    pub fn from(&self) -> &str {
        &self.from
    }

    /// Replacement path segment(s)
    pub fn to(&self) -> &str {
        &self.to
    }

    /// The rule observed for the TAMU AI chat gateway (`/v1` is served as `/api`)
    pub fn tamu_api() -> Self {
        Self {
            host_marker: "tamu.ai".to_string(),
            from: "v1".to_string(),
            to: "api".to_string(),
        }
    }

    fn applies_to(&self, authority: &str, path: &str) -> bool {
        authority.contains(&self.host_marker) && path.split('/').any(|s| s == self.from)
    }
}

/// Normalize a base URL against a set of rules
///
/// Trims surrounding whitespace and trailing slashes, then applies every rule
/// whose host marker appears in the URL authority. When no rule matches, only
/// the trimming is applied.
///
/// `normalize(normalize(u)) == normalize(u)` holds for any rule set in which no
/// rule's replacement segment equals another rule's `from` segment; config
/// validation enforces that.
pub fn normalize(base_url: &str, rules: &[NormalizationRule]) -> String {
    let trimmed = trim_trailing_slashes(base_url.trim());
    let (authority, path) = split_authority(trimmed);

    let mut path = path.to_string();
    for rule in rules {
        if rule.applies_to(authority, &path) {
            tracing::debug!(
                host_marker = %rule.host_marker,
                from = %rule.from,
                to = %rule.to,
                "Rewriting provider-specific version segment"
            );
            path = path
                .split('/')
                .map(|segment| {
                    if segment == rule.from {
                        rule.to.as_str()
                    } else {
                        segment
                    }
                })
                .collect::<Vec<_>>()
                .join("/");
        }
    }

    format!("{}{}", authority, path)
}

/// Remove a trailing version segment if it is one of `known_versions`
///
/// Used before appending a version candidate so `https://host/v1` probed with
/// `v1beta` becomes `https://host/v1beta`, not `https://host/v1/v1beta`.
pub fn strip_version_suffix<'a, S: AsRef<str>>(base_url: &'a str, known_versions: &[S]) -> &'a str {
    let trimmed = trim_trailing_slashes(base_url);
    let (authority, path) = split_authority(trimmed);
    if path.is_empty() {
        return trimmed;
    }

    match path.rsplit_once('/') {
        Some((_, last))
            if known_versions
                .iter()
                .map(|v| v.as_ref().trim_matches('/'))
                .any(|v| !v.is_empty() && v == last) =>
        {
            &trimmed[..authority.len() + path.len() - last.len() - 1]
        }
        _ => trimmed,
    }
}

/// Join a base URL and a relative path with exactly one slash between them
pub fn join_path(base_url: &str, suffix: &str) -> String {
    let suffix = suffix.trim_start_matches('/');
    let base = trim_trailing_slashes(base_url);
    if suffix.is_empty() {
        base.to_string()
    } else {
        format!("{}/{}", base, suffix)
    }
}

fn trim_trailing_slashes(url: &str) -> &str {
    let (authority, path) = split_authority(url);
    let path = path.trim_end_matches('/');
    &url[..authority.len() + path.len()]
}

/// Split `scheme://authority/path` into (`scheme://authority`, `/path`)
///
/// Inputs without a scheme are treated as all path.
fn split_authority(url: &str) -> (&str, &str) {
    match url.find("://") {
        Some(scheme_end) => {
            let after_scheme = scheme_end + 3;
            match url[after_scheme..].find('/') {
                Some(slash) => url.split_at(after_scheme + slash),
                None => (url, ""),
            }
        }
        None => ("", url),
    }
}
