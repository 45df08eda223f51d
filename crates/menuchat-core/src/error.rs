use std::error::Error as StdError;

use thiserror::Error;

/// Why a completion attempt failed. `Display` is the text shown to the user.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("Please add your OpenAI API key in Settings")]
    MissingCredential,
    #[error("{0}")]
    Transport(#[from] TransportError),
    #[error("{0}")]
    ApiError(String),
    #[error("Invalid response from ChatGPT")]
    InvalidResponse,
}

/// No HTTP response was received (connect, TLS, or body read failure)
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(source: impl StdError + Send + Sync + 'static) -> Self {
        Self {
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError::with_source(err)
    }
}

/// Rejected use of a `CompletionSession`
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("a request is already in flight")]
    AlreadyPending,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_display_strings() {
        assert_eq!(
            CompletionError::MissingCredential.to_string(),
            "Please add your OpenAI API key in Settings"
        );
        assert_eq!(
            CompletionError::ApiError("invalid key".to_string()).to_string(),
            "invalid key"
        );
        assert_eq!(
            CompletionError::InvalidResponse.to_string(),
            "Invalid response from ChatGPT"
        );
    }

    #[test]
    fn test_transport_error_keeps_underlying_cause() {
        let cause = io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused");
        let err = CompletionError::from(TransportError::with_source(cause));

        assert_eq!(err.to_string(), "connection refused");
        let transport = err.source().unwrap();
        assert_eq!(transport.to_string(), "connection refused");
        assert!(transport.source().is_some());
    }

    #[test]
    fn test_transport_error_without_cause() {
        let err = TransportError::new("request task ended without a result");
        assert_eq!(err.to_string(), "request task ended without a result");
        assert_eq!(err.message(), "request task ended without a result");
        assert!(err.source().is_none());
    }
}
