//! Unified error types for the dashboards.
//!
//! Error codes:
//! - AUTH_001-004: Authentication / session errors
//! - VALID_001-002: Request validation errors
//! - DATA_001: Malformed catalog schema
//! - UPSTREAM_001-002: Catalog / analytics collaborators
//! - RATE_001: Login rate limit

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Authentication error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorCode {
    /// AUTH_001: Session token is required
    MissingToken,
    /// AUTH_002: Username or password rejected
    InvalidCredentials,
    /// AUTH_003: Session token unknown or expired
    InvalidSession,
    /// AUTH_004: Session does not grant access to this publisher
    Forbidden,
}

impl AuthErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingToken => "AUTH_001",
            Self::InvalidCredentials => "AUTH_002",
            Self::InvalidSession => "AUTH_003",
            Self::Forbidden => "AUTH_004",
        }
    }

    /// Get the HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::MissingToken => 401,
            Self::InvalidCredentials => 401,
            Self::InvalidSession => 401,
            Self::Forbidden => 403,
        }
    }
}

/// Validation error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorCode {
    /// VALID_001: Malformed request parameter
    InvalidParameter,
    /// VALID_002: Date range cannot be resolved or start is after end
    InvalidDateRange,
}

impl ValidationErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidParameter => "VALID_001",
            Self::InvalidDateRange => "VALID_002",
        }
    }

    /// Get the HTTP status code.
    pub fn http_status(&self) -> u16 {
        400
    }
}

/// Upstream collaborator error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamErrorCode {
    /// UPSTREAM_001: Catalog spreadsheet could not be fetched or parsed
    Catalog,
    /// UPSTREAM_002: Analytics report could not be fetched or parsed
    Analytics,
}

impl UpstreamErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Catalog => "UPSTREAM_001",
            Self::Analytics => "UPSTREAM_002",
        }
    }

    /// Get the HTTP status code.
    pub fn http_status(&self) -> u16 {
        502
    }
}

/// Unified error type for the dashboards.
#[derive(Debug, Error)]
pub enum Error {
    /// Authentication error with code.
    #[error("[{code}] {message}")]
    Auth {
        code: &'static str,
        message: String,
        http_status: u16,
    },

    /// Validation error with code.
    #[error("[{code}] {message}")]
    ValidationWithCode {
        code: &'static str,
        message: String,
        http_status: u16,
    },

    /// Upstream (catalog / analytics) error with code.
    #[error("[{code}] {message}")]
    Upstream {
        code: &'static str,
        message: String,
        http_status: u16,
    },

    /// A catalog row has no `url` field at all.
    #[error("[DATA_001] catalog row {row} has no url column")]
    MissingJoinColumn { row: usize },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("unknown publisher: {0}")]
    UnknownPublisher(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an authentication error.
    pub fn auth(code: AuthErrorCode, msg: impl Into<String>) -> Self {
        Self::Auth {
            code: code.code(),
            message: msg.into(),
            http_status: code.http_status(),
        }
    }

    /// Create a validation error with code.
    pub fn validation_code(code: ValidationErrorCode, msg: impl Into<String>) -> Self {
        Self::ValidationWithCode {
            code: code.code(),
            message: msg.into(),
            http_status: code.http_status(),
        }
    }

    /// Create an upstream error.
    pub fn upstream(code: UpstreamErrorCode, msg: impl Into<String>) -> Self {
        Self::Upstream {
            code: code.code(),
            message: msg.into(),
            http_status: code.http_status(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn unknown_publisher(slug: impl Into<String>) -> Self {
        Self::UnknownPublisher(slug.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Get the HTTP status code for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Auth { http_status, .. } => *http_status,
            Self::ValidationWithCode { http_status, .. } => *http_status,
            Self::Upstream { http_status, .. } => *http_status,
            Self::MissingJoinColumn { .. } => 422,
            Self::Validation(_) => 400,
            Self::Config(_) => 500,
            Self::Serialization(_) => 400,
            Self::UnknownPublisher(_) => 404,
            Self::RateLimited(_) => 429,
            Self::Internal(_) => 500,
        }
    }

    /// Get the error code if this is a coded error.
    pub fn error_code(&self) -> Option<&'static str> {
        match self {
            Self::Auth { code, .. } => Some(*code),
            Self::ValidationWithCode { code, .. } => Some(*code),
            Self::Upstream { code, .. } => Some(*code),
            Self::MissingJoinColumn { .. } => Some("DATA_001"),
            Self::UnknownPublisher(_) => Some("NOT_FOUND"),
            Self::RateLimited(_) => Some("RATE_001"),
            _ => None,
        }
    }
}
