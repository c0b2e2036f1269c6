//! OAuth2 access tokens for the analytics API.
//!
//! Exchanges each account's refresh token at the token endpoint and keeps
//! the access token until shortly before it expires.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use dashboard_core::error::UpstreamErrorCode;
use dashboard_core::limits::TOKEN_REFRESH_MARGIN_SECS;
use dashboard_core::{Error, Result};
use parking_lot::RwLock;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

use crate::config::OAuthAccount;

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + ChronoDuration::seconds(TOKEN_REFRESH_MARGIN_SECS) < self.expires_at
    }
}

/// Token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

/// Hands out access tokens per configured account.
pub struct TokenProvider {
    token_uri: String,
    accounts: BTreeMap<String, OAuthAccount>,
    http_client: reqwest::Client,
    cache: RwLock<HashMap<String, CachedToken>>,
}

impl TokenProvider {
    pub fn new(
        token_uri: impl Into<String>,
        accounts: BTreeMap<String, OAuthAccount>,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            token_uri: token_uri.into(),
            accounts,
            http_client,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn account_names(&self) -> impl Iterator<Item = &str> {
        self.accounts.keys().map(String::as_str)
    }

    /// A valid access token for `account`, refreshing if needed.
    pub async fn access_token(&self, account: &str) -> Result<String> {
        let creds = self.accounts.get(account).ok_or_else(|| {
            Error::upstream(
                UpstreamErrorCode::Analytics,
                format!("No OAuth account named {account:?}"),
            )
        })?;

        if let Some(token) = creds.access_token.as_ref().filter(|t| !t.is_empty()) {
            return Ok(token.clone());
        }

        let now = Utc::now();
        let cached = self
            .cache
            .read()
            .get(account)
            .filter(|c| c.is_fresh(now))
            .map(|c| c.access_token.clone());
        if let Some(token) = cached {
            return Ok(token);
        }

        let fresh = self.refresh(account, creds).await?;
        let token = fresh.access_token.clone();
        self.cache.write().insert(account.to_string(), fresh);
        Ok(token)
    }

    /// Forget a cached token, e.g. after the API rejects it.
    pub fn invalidate(&self, account: &str) {
        self.cache.write().remove(account);
    }

    async fn refresh(&self, account: &str, creds: &OAuthAccount) -> Result<CachedToken> {
        if creds.refresh_token.is_empty() {
            return Err(Error::upstream(
                UpstreamErrorCode::Analytics,
                format!("OAuth account {account:?} has no refresh token"),
            ));
        }

        debug!(account = %account, "Refreshing OAuth access token");

        let params = [
            ("grant_type", "refresh_token"),
            ("client_id", creds.client_id.as_str()),
            ("client_secret", creds.client_secret.as_str()),
            ("refresh_token", creds.refresh_token.as_str()),
        ];
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params)
            .finish();

        let response = self
            .http_client
            .post(&self.token_uri)
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .body(body)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Token endpoint request failed");
                Error::upstream(
                    UpstreamErrorCode::Analytics,
                    format!("Token endpoint unavailable: {e}"),
                )
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, account = %account, "Token refresh rejected");
            return Err(Error::upstream(
                UpstreamErrorCode::Analytics,
                format!("Token refresh for {account:?} returned {status}"),
            ));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            Error::upstream(
                UpstreamErrorCode::Analytics,
                format!("Invalid token response: {e}"),
            )
        })?;

        info!(account = %account, expires_in = token.expires_in, "OAuth access token refreshed");

        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: Utc::now() + ChronoDuration::seconds(token.expires_in),
        })
    }
}
