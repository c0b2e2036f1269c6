//! Request extractors.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use dashboard_core::error::AuthErrorCode;
use dashboard_core::{extract_session_token, Error, Session, SESSION_TOKEN_HEADER};

use crate::response::ApiError;
use crate::state::AppState;

/// The logged-in session behind a request.
///
/// Rejects with `AUTH_001` when no token is sent and `AUTH_003` when the
/// token is malformed, unknown or expired.
#[derive(Debug, Clone)]
pub struct SessionContext(pub Session);

#[async_trait]
impl FromRequestParts<AppState> for SessionContext {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        let session_header = parts
            .headers
            .get(SESSION_TOKEN_HEADER)
            .and_then(|h| h.to_str().ok());

        let token = extract_session_token(auth_header, session_header)?;

        let session = state.sessions.get(&token).await.ok_or_else(|| {
            Error::auth(AuthErrorCode::InvalidSession, "Session expired or unknown")
        })?;

        Ok(SessionContext(session))
    }
}

/// Client IP address.
#[derive(Debug, Clone)]
pub struct ClientIp(pub Option<String>);

impl ClientIp {
    /// Key for per-client limits; unknown clients share one bucket.
    pub fn key(&self) -> &str {
        self.0.as_deref().unwrap_or("unknown")
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Try X-Forwarded-For first (for proxied requests)
        if let Some(xff) = parts.headers.get("X-Forwarded-For") {
            if let Ok(xff_str) = xff.to_str() {
                // Take the first IP in the chain
                if let Some(ip) = xff_str.split(',').next() {
                    return Ok(ClientIp(Some(ip.trim().to_string())));
                }
            }
        }

        if let Some(real_ip) = parts.headers.get("X-Real-IP") {
            if let Ok(ip) = real_ip.to_str() {
                return Ok(ClientIp(Some(ip.to_string())));
            }
        }

        Ok(ClientIp(None))
    }
}
