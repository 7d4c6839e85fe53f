//! Error types for the simulated-venue adapter.

use thiserror::Error;

/// Errors that can occur when talking to the venue.
#[derive(Debug, Error)]
pub enum SimError {
    /// API request returned a non-success status.
    #[error("API error: {status_code} - {message}")]
    Api {
        /// HTTP status code.
        status_code: u16,
        /// Error body from the venue.
        message: String,
    },

    /// Network error.
    #[error("network error: {0}")]
    Network(String),

    /// Request timeout.
    #[error("request timeout: {0}")]
    Timeout(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A numeric field could not be represented.
    #[error("bad numeric field `{field}`: {value}")]
    BadNumber {
        /// Field name from the venue payload.
        field: &'static str,
        /// Offending value.
        value: f64,
    },
}

impl SimError {
    /// Creates an API error from status code and message.
    pub fn api(status_code: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status_code,
            message: message.into(),
        }
    }

    /// Returns true if the request is worth retrying on a later tick.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) => true,
            Self::Api { status_code, .. } => *status_code >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for SimError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::Network(format!("connection failed: {err}"))
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SimError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias for venue operations.
pub type Result<T> = std::result::Result<T, SimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_carries_status_and_message() {
        let err = SimError::api(400, "bad request");
        assert!(err.to_string().contains("400"));
        assert!(err.to_string().contains("bad request"));
    }

    #[test]
    fn network_and_server_errors_are_transient() {
        assert!(SimError::Network("refused".to_string()).is_transient());
        assert!(SimError::Timeout("slow".to_string()).is_transient());
        assert!(SimError::api(503, "unavailable").is_transient());
    }

    #[test]
    fn client_errors_are_not_transient() {
        assert!(!SimError::api(401, "bad key").is_transient());
        assert!(!SimError::Serialization("garbage".to_string()).is_transient());
        assert!(!SimError::BadNumber {
            field: "bid",
            value: f64::NAN
        }
        .is_transient());
    }
}
