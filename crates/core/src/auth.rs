//! Session types and token extraction.
//!
//! This module provides:
//! - Session token format validation (UUID v4)
//! - Login request/response types
//! - Header extraction for `Authorization: Bearer` / `X-Session-Token`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AuthErrorCode, Error, Result};
use crate::publisher::DashboardView;

/// Header accepted as an alternative to `Authorization: Bearer`.
pub const SESSION_TOKEN_HEADER: &str = "X-Session-Token";

/// Opaque session token handed out on login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(Uuid);

impl SessionToken {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a token from a header value.
    pub fn parse(token: &str) -> Result<Self> {
        let token = token.trim();
        if token.is_empty() {
            return Err(Error::auth(
                AuthErrorCode::MissingToken,
                "Session token is required",
            ));
        }

        Uuid::parse_str(token).map(Self).map_err(|_| {
            Error::auth(AuthErrorCode::InvalidSession, "Invalid session token")
        })
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl std::fmt::Display for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// An authenticated login, scoped to one publisher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: SessionToken,
    pub publisher: String,
    pub view: DashboardView,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(publisher: impl Into<String>, view: DashboardView, username: impl Into<String>) -> Self {
        Self {
            token: SessionToken::generate(),
            publisher: publisher.into(),
            view,
            username: username.into(),
            created_at: Utc::now(),
        }
    }

    /// Fails with `AUTH_004` unless the session belongs to `slug`.
    pub fn authorize(&self, slug: &str) -> Result<()> {
        if self.publisher == slug {
            Ok(())
        } else {
            Err(Error::auth(
                AuthErrorCode::Forbidden,
                format!("Session does not grant access to publisher {slug:?}"),
            ))
        }
    }
}

/// Login request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Successful login response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: SessionToken,
    pub publisher: String,
    pub view: DashboardView,
    /// Seconds until the session expires.
    pub expires_in: u64,
}

/// Extract the session token from request headers.
///
/// Checks in order:
/// 1. `Authorization: Bearer <token>`
/// 2. `X-Session-Token: <token>`
pub fn extract_session_token(
    auth_header: Option<&str>,
    session_header: Option<&str>,
) -> Result<SessionToken> {
    if let Some(auth) = auth_header {
        if let Some(token) = auth.strip_prefix("Bearer ") {
            return SessionToken::parse(token);
        }
    }

    if let Some(token) = session_header {
        return SessionToken::parse(token);
    }

    Err(Error::auth(
        AuthErrorCode::MissingToken,
        "Session token is required",
    ))
}
