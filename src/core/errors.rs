//! Custom error types for Lara API operations

use thiserror::Error;

/// Errors surfaced by the client
#[derive(Error, Debug)]
pub enum LaraError {
    /// Request or poll exceeded a deadline
    #[error("TimeoutError: {message}")]
    Timeout {
        message: String,
    },

    /// Transport could not complete the exchange
    #[error("ConnectionError: {message}")]
    Connection {
        message: String,
    },

    /// Server returned a structured error envelope
    #[error("{error_type}: {message}")]
    Api {
        status: u16,
        error_type: String,
        message: String,
    },

    /// Server returned a non-2xx response without a parseable error envelope
    #[error("API error: {body}")]
    GenericApi {
        status: u16,
        body: String,
    },

    /// Response body did not match the expected shape
    #[error("Invalid response: {message}")]
    Decode {
        message: String,
    },

    /// Pre-signed URL exchange was rejected by the object store
    #[error("{operation} failed with status {status}")]
    ObjectStore {
        operation: &'static str,
        status: u16,
    },

    /// Document reached the `error` status
    #[error("document translation failed: {reason}")]
    DocumentFailed {
        reason: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Request body could not be serialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Request could not be built
    #[error("HTTP client error: {0}")]
    Http(String),
}

impl LaraError {
    /// Classify a transport-level failure as timeout or connection error
    pub fn from_transport(err: reqwest::Error) -> Self {
        let message = err.to_string();
        // the URL may contain "timeout" itself, so only the cause text is matched
        let timed_out = err.is_timeout()
            || err
                .without_url()
                .to_string()
                .to_lowercase()
                .contains("timeout");
        if timed_out {
            LaraError::Timeout { message }
        } else {
            LaraError::Connection { message }
        }
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            LaraError::Api { status, .. }
            | LaraError::GenericApi { status, .. }
            | LaraError::ObjectStore { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the server reported the resource as missing
    pub fn is_not_found(&self) -> bool {
        matches!(self, LaraError::Api { status: 404, .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, LaraError::Timeout { .. })
    }
}

/// Result type for Lara operations
pub type Result<T> = std::result::Result<T, LaraError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = LaraError::Api {
            status: 404,
            error_type: "NotFound".to_string(),
            message: "nope".to_string(),
        };
        assert_eq!(err.to_string(), "NotFound: nope");
        assert_eq!(err.status(), Some(404));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_transport_error_display() {
        let timeout = LaraError::Timeout {
            message: "operation timed out".to_string(),
        };
        let connection = LaraError::Connection {
            message: "connection refused".to_string(),
        };
        assert!(timeout.to_string().starts_with("TimeoutError"));
        assert!(connection.to_string().starts_with("ConnectionError"));
        assert!(timeout.is_timeout());
        assert_eq!(connection.status(), None);
    }

    #[test]
    fn test_generic_api_error_is_not_not_found() {
        let err = LaraError::GenericApi {
            status: 404,
            body: "<html>".to_string(),
        };
        assert!(!err.is_not_found());
        assert!(err.to_string().contains("<html>"));
    }
}
