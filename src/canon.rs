//! URI canonicalization and matching-group rewriting.
//!
//! The canonical form of a URI is fixed at run start by the query-string
//! policy and is applied before any aggregation key is built. Matching
//! groups collapse families of URIs (`/users/42`, `/users/43`) onto the
//! pattern text itself.

use std::borrow::Cow;

use percent_encoding::percent_decode_str;
use regex::Regex;
use url::form_urlencoded;

use crate::error::ConfigError;

/// What happens to the query string when a URI is canonicalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryPolicy {
    /// Drop the query entirely.
    Strip,
    /// Keep the query, re-encoded with parameter keys sorted.
    Keep,
    /// Sorted keys, every value replaced by the literal `xxx`.
    ObscureValues,
}

impl QueryPolicy {
    /// Derive the policy from the `--query-string` / `--qs-ignore-values`
    /// flag pair.
    #[must_use]
    pub fn from_flags(query_string: bool, qs_ignore_values: bool) -> Self {
        match (query_string, qs_ignore_values) {
            (false, _) => QueryPolicy::Strip,
            (true, false) => QueryPolicy::Keep,
            (true, true) => QueryPolicy::ObscureValues,
        }
    }
}

/// Canonicalize a URI reference. Returns `None` for input that cannot form
/// a key (empty); the caller decides whether that is a skip or fatal.
#[must_use]
pub fn canonicalize(uri: &str, policy: QueryPolicy) -> Option<String> {
    if uri.is_empty() {
        return None;
    }

    let (path, query) = match uri.split_once('?') {
        Some((path, query)) => (path, query),
        None => return Some(uri.to_owned()),
    };

    if query.is_empty() {
        return Some(path.to_owned());
    }

    match policy {
        QueryPolicy::Strip => Some(path.to_owned()),
        QueryPolicy::Keep => {
            let mut pairs: Vec<(Cow<'_, str>, Cow<'_, str>)> =
                form_urlencoded::parse(query.as_bytes()).collect();
            pairs.sort_by(|a, b| a.0.cmp(&b.0));
            let encoded = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(pairs)
                .finish();
            Some(format!("{}?{}", path, encoded))
        }
        QueryPolicy::ObscureValues => {
            let mut keys: Vec<Cow<'_, str>> = form_urlencoded::parse(query.as_bytes())
                .map(|(key, _)| key)
                .collect();
            keys.sort();
            keys.dedup();
            let encoded = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(keys.iter().map(|key| (key.as_ref(), "xxx")))
                .finish();
            Some(format!("{}?{}", path, encoded))
        }
    }
}

/// Percent-decode a URI for display (`--decode-uri`). Input that is not
/// valid UTF-8 after decoding is returned unchanged.
#[must_use]
pub fn decode_uri(uri: &str) -> String {
    percent_decode_str(uri)
        .decode_utf8()
        .map(Cow::into_owned)
        .unwrap_or_else(|_| uri.to_owned())
}

/// Ordered set of URI-collapsing patterns. The first pattern that matches
/// replaces the canonical URI with the pattern's source text.
#[derive(Debug, Default)]
pub struct MatchingGroups {
    groups: Vec<Regex>,
}

impl MatchingGroups {
    #[must_use]
    pub fn rewrite<'a>(&'a self, uri: &str) -> Option<&'a str> {
        self.groups
            .iter()
            .find(|re| re.is_match(uri))
            .map(Regex::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Compile `--matching-groups` patterns in declaration order. A bad pattern
/// is a fatal startup error.
pub fn compile_matching_groups(patterns: &[String]) -> Result<MatchingGroups, ConfigError> {
    let mut groups = Vec::with_capacity(patterns.len());
    for pattern in patterns {
        let re = Regex::new(pattern).map_err(|err| ConfigError::InvalidMatchingGroup {
            pattern: pattern.clone(),
            source: err,
        })?;
        groups.push(re);
    }
    Ok(MatchingGroups { groups })
}
