//! Login and logout.

use axum::{extract::State, http::StatusCode, Json};
use dashboard_core::error::AuthErrorCode;
use dashboard_core::{Error, LoginRequest, LoginResponse, Session};
use telemetry::metrics;
use tracing::{info, warn};

use crate::extractors::{ClientIp, SessionContext};
use crate::response::ApiError;
use crate::state::AppState;

/// POST /login - exchange publisher credentials for a session token.
pub async fn login_handler(
    State(state): State<AppState>,
    client_ip: ClientIp,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    if !state.login_limiter.check(client_ip.key()) {
        metrics().rate_limited_requests.inc();
        warn!(client_ip = %client_ip.key(), "Login rate limit exceeded");
        return Err(ApiError::rate_limited(
            "Too many login attempts",
            Some(state.login_limiter.config().retry_after_secs()),
        ));
    }

    let Some((publisher, view)) = state
        .publishers
        .authenticate(&request.username, &request.password)
    else {
        metrics().logins_failed.inc();
        warn!(username = %request.username, client_ip = %client_ip.key(), "Login failed");
        return Err(Error::auth(
            AuthErrorCode::InvalidCredentials,
            "Invalid username or password",
        )
        .into());
    };

    let session = Session::new(&publisher.slug, view, &request.username);
    let response = LoginResponse {
        token: session.token,
        publisher: session.publisher.clone(),
        view,
        expires_in: state.sessions.ttl().as_secs(),
    };

    info!(publisher = %publisher.slug, view = %view, username = %request.username, "Login succeeded");
    metrics().logins_succeeded.inc();
    state.sessions.insert(session).await;

    Ok(Json(response))
}

/// POST /logout - end the current session.
pub async fn logout_handler(
    State(state): State<AppState>,
    SessionContext(session): SessionContext,
) -> StatusCode {
    state.sessions.revoke(&session.token).await;
    info!(publisher = %session.publisher, username = %session.username, "Logged out");
    StatusCode::NO_CONTENT
}
