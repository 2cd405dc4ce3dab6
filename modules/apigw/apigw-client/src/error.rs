use std::io;

use bytes::Bytes;
use http::StatusCode;
use thiserror::Error;

/// Errors surfaced by the gateway client and its transports.
///
/// The dispatcher itself only produces [`ClientError::Serialization`]; every
/// other variant originates in a transport, in configuration loading, or in the
/// operation helpers, and is passed through to the caller untouched.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Request build error: {0}")]
    BuildError(String),

    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("HTTP error: status={status}")]
    Http { status: StatusCode, body: Bytes },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

impl ClientError {
    /// Status code of a non-success response, if this error carries one.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Serialization(err.to_string())
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::Configuration(format!("invalid URL: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_exposes_status() {
        let err = ClientError::Http {
            status: StatusCode::FORBIDDEN,
            body: Bytes::from_static(b"{\"message\":\"Forbidden\"}"),
        };
        assert_eq!(err.status(), Some(StatusCode::FORBIDDEN));
        assert_eq!(err.to_string(), "HTTP error: status=403 Forbidden");
    }

    #[test]
    fn test_missing_parameter_message() {
        let err = ClientError::MissingParameter("q".into());
        assert_eq!(err.to_string(), "Missing required parameter: q");
        assert!(err.status().is_none());
    }
}
