//! Error types for the Sugoi API client

use thiserror::Error;

/// Errors that can occur when talking to the anime API
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// HTTP request failed before a response arrived
    #[error("Request failed: {0}")]
    Network(String),

    /// Response body could not be decoded
    #[error("Response parsing failed: {0}")]
    Decode(String),

    /// 401 from the backend
    #[error("Unauthorized{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Unauthorized {
        /// `message` field of the error body, when present
        message: Option<String>,
    },

    /// Any other non-success status
    #[error("API error (status {status}){}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Status {
        /// HTTP status code
        status: u16,
        /// `message` field of the error body, when present
        message: Option<String>,
    },
}

impl ApiError {
    /// HTTP status of the failed response, if one was received
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::Status { status, .. } => Some(*status),
            Self::Network(_) | Self::Decode(_) => None,
        }
    }

    /// The backend's own `message`, verbatim
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Unauthorized { message } | Self::Status { message, .. } => message.as_deref(),
            Self::Network(_) | Self::Decode(_) => None,
        }
    }

    /// The backend's message if it sent one, otherwise `fallback`
    ///
    /// Transport failures always surface the fallback.
    #[must_use]
    pub fn message_or(&self, fallback: &str) -> String {
        self.server_message().unwrap_or(fallback).to_string()
    }
}

/// Errors raised by durable client storage
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// A stored value could not be (de)serialized
    #[error("Storage serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The storage mutex was poisoned by a panicking writer
    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_or_prefers_server_message() {
        let error = ApiError::Status {
            status: 400,
            message: Some("Email already registered".to_string()),
        };
        assert_eq!(error.message_or("Registration failed"), "Email already registered");
        assert_eq!(error.status(), Some(400));
    }

    #[test]
    fn test_message_or_falls_back_for_transport_errors() {
        let error = ApiError::Network("connection refused".to_string());
        assert_eq!(error.message_or("Search failed"), "Search failed");
        assert_eq!(error.status(), None);
    }

    #[test]
    fn test_display() {
        let error = ApiError::Unauthorized { message: None };
        assert_eq!(error.to_string(), "Unauthorized");

        let error = ApiError::Status {
            status: 404,
            message: Some("Anime not found".to_string()),
        };
        assert_eq!(error.to_string(), "API error (status 404): Anime not found");
    }
}
