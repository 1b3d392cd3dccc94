use thiserror::Error;

/// Typed error enum for Emby API operations
///
/// Differentiates failure modes so callers can pick the right recovery:
/// re-authentication for auth failures, retry loops for transient ones.
#[derive(Error, Debug, Clone)]
pub enum ApiError {
    /// Authentication failed (401, 403)
    /// These are permanent errors and should not be retried
    #[error("Authentication failed: {message} (status: {status})")]
    Authentication { status: u16, message: String },

    /// Server error (500+)
    /// Transient errors that should be retried
    #[error("Server error: {message} (status: {status})")]
    ServerError { status: u16, message: String },

    /// Client error (400-499, excluding auth)
    /// Usually permanent errors that should not be retried
    #[error("Client error: {message} (status: {status})")]
    ClientError { status: u16, message: String },

    /// Network/connection errors (timeout, connection refused, etc.)
    /// Transient errors that should be retried
    #[error("Network error: {0}")]
    Network(String),

    /// JSON parsing errors
    /// Usually permanent errors
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Generic errors for cases not covered above
    #[error("API error: {0}")]
    Other(String),
}

impl ApiError {
    /// Check if this error is transient and should be retried
    pub fn is_transient(&self) -> bool {
        matches!(self, ApiError::Network(_) | ApiError::ServerError { .. })
    }

    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ApiError::Authentication { .. })
    }

    /// Create an error from a reqwest error
    pub fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            ApiError::Network(format!("Request timeout: {}", error))
        } else if error.is_connect() {
            ApiError::Network(format!("Connection failed: {}", error))
        } else if error.is_request() {
            ApiError::Network(format!("Request error: {}", error))
        } else {
            ApiError::Other(error.to_string())
        }
    }

    /// Create an error from an HTTP status code and response body
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => ApiError::Authentication {
                status,
                message: body,
            },
            400..=499 => ApiError::ClientError {
                status,
                message: body,
            },
            500..=599 => ApiError::ServerError {
                status,
                message: body,
            },
            _ => ApiError::Other(format!("HTTP {}: {}", status, body)),
        }
    }
}
