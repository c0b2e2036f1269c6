//! Publisher configuration records.
//!
//! One typed record per publisher drives the whole dashboard pipeline:
//! which domain to keep from the catalog, which analytics property to
//! query, and which two logins (newsroom and client) may see it.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;
use validator::{Validate, ValidationError};

use crate::error::{Error, Result};
use crate::limits::DEFAULT_MONTHLY_GOAL;

static SLUG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9-]*$").expect("invalid slug pattern"));

static COLOR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#[0-9a-fA-F]{6}$").expect("invalid color pattern"));

/// Which audience a login belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DashboardView {
    /// Editorial staff: sees author performance.
    Newsroom,
    /// The publisher's commercial client.
    Client,
}

impl DashboardView {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Newsroom => "newsroom",
            Self::Client => "client",
        }
    }

    pub fn shows_authors(&self) -> bool {
        matches!(self, Self::Newsroom)
    }
}

impl fmt::Display for DashboardView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A username / password pair.
#[derive(Clone, Serialize, Deserialize, Validate)]
pub struct Credential {
    #[validate(length(min = 1, max = 128))]
    pub username: String,
    #[validate(length(min = 1, max = 256))]
    pub password: String,
}

impl Credential {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Checks a login attempt. The password comparison does not
    /// short-circuit on the first differing byte.
    pub fn verify(&self, username: &str, password: &str) -> bool {
        self.username == username && constant_time_eq(self.password.as_bytes(), password.as_bytes())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Configuration for one publisher dashboard.
///
/// Field names stay snake_case: the config loader lowercases keys.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PublisherConfig {
    /// URL slug, e.g. `clarin`.
    #[validate(length(min = 1, max = 64), custom(function = "validate_slug"))]
    pub slug: String,
    /// Display name.
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    /// Bare host, e.g. `clarin.com`.
    #[validate(custom(function = "validate_domain"))]
    pub domain: String,
    /// Analytics property ID.
    #[validate(length(min = 1), custom(function = "validate_numeric"))]
    pub property_id: String,
    /// OAuth account used for this property.
    #[serde(default = "default_account")]
    pub account: String,
    #[serde(default = "default_color")]
    #[validate(custom(function = "validate_color"))]
    pub color: String,
    #[serde(default = "default_monthly_goal")]
    pub monthly_goal: u64,
    #[validate(nested)]
    pub newsroom: Credential,
    #[validate(nested)]
    pub client: Credential,
}

fn default_account() -> String {
    "default".to_string()
}

fn default_color() -> String {
    "#1e88e5".to_string()
}

fn default_monthly_goal() -> u64 {
    DEFAULT_MONTHLY_GOAL
}

fn validate_slug(slug: &str) -> std::result::Result<(), ValidationError> {
    if SLUG_REGEX.is_match(slug) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_slug"))
    }
}

fn validate_color(color: &str) -> std::result::Result<(), ValidationError> {
    if COLOR_REGEX.is_match(color) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_color"))
    }
}

fn validate_domain(domain: &str) -> std::result::Result<(), ValidationError> {
    let parsed = url::Url::parse(&format!("https://{domain}"))
        .map_err(|_| ValidationError::new("invalid_domain"))?;

    // A bare host round-trips unchanged: no scheme, path, port or `www.`.
    match parsed.host_str() {
        Some(host)
            if host == domain
                && host.contains('.')
                && !host.starts_with("www.")
                && parsed.path() == "/"
                && parsed.port().is_none() =>
        {
            Ok(())
        }
        _ => Err(ValidationError::new("invalid_domain")),
    }
}

fn validate_numeric(value: &str) -> std::result::Result<(), ValidationError> {
    if value.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::new("not_numeric"))
    }
}

impl PublisherConfig {
    /// The view a login grants, if it matches either credential.
    pub fn authenticate(&self, username: &str, password: &str) -> Option<DashboardView> {
        if self.newsroom.verify(username, password) {
            Some(DashboardView::Newsroom)
        } else if self.client.verify(username, password) {
            Some(DashboardView::Client)
        } else {
            None
        }
    }
}

/// All configured publishers, keyed by slug.
#[derive(Debug, Clone, Default)]
pub struct PublisherRegistry {
    publishers: BTreeMap<String, PublisherConfig>,
}

impl PublisherRegistry {
    /// Validates every record and rejects duplicate slugs or usernames.
    pub fn new(publishers: Vec<PublisherConfig>) -> Result<Self> {
        let mut by_slug = BTreeMap::new();
        let mut usernames = std::collections::HashSet::new();

        for publisher in publishers {
            publisher
                .validate()
                .map_err(|e| Error::config(format!("publisher {:?}: {e}", publisher.slug)))?;

            for credential in [&publisher.newsroom, &publisher.client] {
                if !usernames.insert(credential.username.clone()) {
                    return Err(Error::config(format!(
                        "username {:?} is used by more than one login",
                        credential.username
                    )));
                }
            }

            let slug = publisher.slug.clone();
            if by_slug.insert(slug.clone(), publisher).is_some() {
                return Err(Error::config(format!("duplicate publisher slug {slug:?}")));
            }
        }

        Ok(Self {
            publishers: by_slug,
        })
    }

    pub fn get(&self, slug: &str) -> Result<&PublisherConfig> {
        self.publishers
            .get(slug)
            .ok_or_else(|| Error::unknown_publisher(slug))
    }

    /// Finds the publisher and view a login belongs to.
    pub fn authenticate(&self, username: &str, password: &str) -> Option<(&PublisherConfig, DashboardView)> {
        self.publishers
            .values()
            .find_map(|p| p.authenticate(username, password).map(|view| (p, view)))
    }

    pub fn iter(&self) -> impl Iterator<Item = &PublisherConfig> {
        self.publishers.values()
    }

    pub fn len(&self) -> usize {
        self.publishers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.publishers.is_empty()
    }
}
