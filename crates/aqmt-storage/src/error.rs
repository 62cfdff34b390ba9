//! Storage error types.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Request failed ({0}): {1}")]
    RequestFailed(u16, String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StorageError {
    pub fn auth_error(msg: impl Into<String>) -> Self {
        Self::AuthError(msg.into())
    }

    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Transient failures worth retrying at a higher level.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_)) || matches!(self, Self::RequestFailed(s, _) if *s >= 500 || *s == 429)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryability() {
        assert!(StorageError::RequestFailed(503, "x".into()).is_retryable());
        assert!(StorageError::RequestFailed(429, "x".into()).is_retryable());
        assert!(!StorageError::RequestFailed(400, "x".into()).is_retryable());
        assert!(!StorageError::NotFound("x".into()).is_retryable());
    }
}
