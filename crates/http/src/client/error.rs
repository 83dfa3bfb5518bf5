//! Client error types

use thiserror::Error;

/// Client error types
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network or request error
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server returned an error status
    #[error("Server error {status}: {message}")]
    ServerError { status: u16, message: String },

    /// Authentication failed (HTTP 401)
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Bad request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Forbidden
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Login or refresh response lacked a required token
    #[error("Missing token in response: {0}")]
    MissingTokens(&'static str),

    /// No refresh token is stored, so the session cannot be renewed
    #[error("No refresh token available")]
    NoRefreshToken,

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Token storage could not be opened
    #[error("Token storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

impl ClientError {
    /// Create error from HTTP status code
    pub fn from_status(status: reqwest::StatusCode, message: String) -> Self {
        match status.as_u16() {
            400 => Self::BadRequest(message),
            401 => Self::AuthenticationFailed(message),
            403 => Self::Forbidden(message),
            404 => Self::NotFound(message),
            _ => Self::ServerError {
                status: status.as_u16(),
                message,
            },
        }
    }

    /// Build an error from a non-success response, consuming its body
    pub async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status();
        let message = response.text().await.unwrap_or_else(|_| status.to_string());
        Self::from_status(status, message)
    }

    /// Whether the caller should be sent back to the login view
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::AuthenticationFailed(_) | Self::NoRefreshToken)
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::BadRequest(_) => Some(400),
            Self::AuthenticationFailed(_) => Some(401),
            Self::Forbidden(_) => Some(403),
            Self::NotFound(_) => Some(404),
            Self::ServerError { status, .. } => Some(*status),
            Self::Request(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn maps_statuses_to_variants() {
        assert!(matches!(
            ClientError::from_status(StatusCode::UNAUTHORIZED, "nope".into()),
            ClientError::AuthenticationFailed(_)
        ));
        assert!(matches!(
            ClientError::from_status(StatusCode::FORBIDDEN, String::new()),
            ClientError::Forbidden(_)
        ));
        let err = ClientError::from_status(StatusCode::BAD_GATEWAY, "upstream".into());
        assert_eq!(err.status(), Some(502));
        assert!(!err.is_auth_expired());
    }

    #[test]
    fn auth_expiry_covers_missing_refresh_token() {
        assert!(ClientError::NoRefreshToken.is_auth_expired());
        assert!(ClientError::AuthenticationFailed(String::new()).is_auth_expired());
        assert!(!ClientError::NotFound(String::new()).is_auth_expired());
    }
}
