//! URL normalization for join-key matching.
//!
//! Catalog URLs (`https://www.example.com/a/?utm_source=x`) and analytics
//! page paths (`/a/amp`) are reduced to the same canonical key (`/a`):
//! lower-cased, scheme, `www.` and host removed, fragment and every query
//! parameter dropped, slashes collapsed, trailing `/`, `/amp` and `.amp`
//! removed. The home page is `/`; the empty key is reserved for "no URL".
//!
//! Normalization never fails and is idempotent.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical join key derived from a URL.
///
/// Only used for matching, never displayed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedKey(String);

impl NormalizedKey {
    /// Key for a raw URL; `None` and blank input give the empty key.
    pub fn from_url(url: Option<&str>) -> Self {
        Self(url.map(normalize_url).unwrap_or_default())
    }

    /// Key for a site-relative analytics path on `domain`.
    ///
    /// Computed as `normalize(domain + path)`. A path without a leading `/`
    /// (GA4 reports `(not set)`) gets one so it can't merge into the host.
    pub fn from_page_path(domain: &str, path: &str) -> Self {
        let path = path.trim();
        let joined = if path.is_empty() || path.starts_with('/') {
            format!("{}{}", domain.trim(), path)
        } else {
            format!("{}/{}", domain.trim(), path)
        };
        Self(normalize_url(&joined))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the "no URL provided" key.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for NormalizedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for NormalizedKey {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for NormalizedKey {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Canonicalize a URL-like string into a join key.
///
/// Returns `""` for blank input and `"/"` for a bare domain or home path.
pub fn normalize_url(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    if lowered.is_empty() {
        return String::new();
    }

    let rest = strip_scheme(&lowered);
    let rest = rest.strip_prefix("www.").unwrap_or(rest);
    let path = strip_host(rest);

    // Fragment first so a `?` inside it is never read as a query.
    let path = cut_at(path, '#');
    let path = cut_at(path, '?');

    let mut key = collapse_slashes(path);
    if !key.starts_with('/') {
        key.insert(0, '/');
    }

    loop {
        let before = key.len();

        let trimmed_len = key.trim_end().len();
        key.truncate(trimmed_len);

        if key.len() > 1 && key.ends_with('/') {
            key.pop();
        }

        if key.ends_with("/amp") || key.ends_with(".amp") {
            key.truncate(key.len() - 4);
        }

        if key.is_empty() || key.len() == before {
            break;
        }
    }

    if key.is_empty() {
        key.push('/');
    }
    key
}

fn strip_scheme(s: &str) -> &str {
    s.strip_prefix("https://")
        .or_else(|| s.strip_prefix("http://"))
        .unwrap_or(s)
}

/// Drops a leading host segment, leaving the path (possibly empty).
///
/// A leading segment counts as a host when it has a `.` or `:` or is
/// `localhost`; anything else is a relative path and is kept.
fn strip_host(s: &str) -> &str {
    if s.starts_with('/') {
        return s;
    }

    let end = s
        .find(|c: char| matches!(c, '/' | '?' | '#'))
        .unwrap_or(s.len());
    let segment = &s[..end];

    if segment.contains('.') || segment.contains(':') || segment == "localhost" {
        &s[end..]
    } else {
        s
    }
}

fn cut_at(s: &str, delimiter: char) -> &str {
    match s.find(delimiter) {
        Some(idx) => &s[..idx],
        None => s,
    }
}

fn collapse_slashes(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut previous_slash = false;
    for c in s.chars() {
        if c == '/' {
            if !previous_slash {
                out.push(c);
            }
            previous_slash = true;
        } else {
            out.push(c);
            previous_slash = false;
        }
    }
    out
}
