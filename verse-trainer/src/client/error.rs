//! Client error taxonomy

use std::fmt;

use reqwest::StatusCode;
use thiserror::Error;

/// Broad category of a failed request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Could not reach the server, or the request timed out
    Network,
    /// Server rejected the request body or path (400)
    Validation,
    NotFound,
    /// Poem with the same title and author already exists (409)
    Duplicate,
    /// Server-side failure (5xx), or any other unexpected status
    Server,
    /// Failure with no status to go on
    Unknown,
}

impl ErrorKind {
    pub fn from_status(status: StatusCode) -> Self {
        match status.as_u16() {
            400 | 422 => ErrorKind::Validation,
            404 => ErrorKind::NotFound,
            409 => ErrorKind::Duplicate,
            _ => ErrorKind::Server,
        }
    }

    /// Message shown when the server did not provide one
    pub fn default_message(self) -> &'static str {
        match self {
            ErrorKind::Network => "Could not reach the server. Check that it is running and try again.",
            ErrorKind::Validation => "The server rejected the request as invalid.",
            ErrorKind::NotFound => "The requested item does not exist.",
            ErrorKind::Duplicate => "A poem with the same title and author already exists.",
            ErrorKind::Server => "The server failed to handle the request. Try again later.",
            ErrorKind::Unknown => "An unexpected error occurred.",
        }
    }

    pub fn is_retryable(self) -> bool {
        self == ErrorKind::Network
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Network => "network",
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not found",
            ErrorKind::Duplicate => "duplicate",
            ErrorKind::Server => "server",
            ErrorKind::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// A failed API call
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ClientError {
    pub kind: ErrorKind,
    pub message: String,
    /// HTTP status, when a response was received
    pub status: Option<u16>,
    /// Offending field reported by a validation failure
    pub field: Option<String>,
}

impl ClientError {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: kind.default_message().to_string(),
            status: None,
            field: None,
        }
    }

    pub fn with_message(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::new(kind)
        }
    }

    /// Build from an error response and its (optional) JSON body
    pub fn from_response(status: StatusCode, body: Option<&serde_json::Value>) -> Self {
        let kind = ErrorKind::from_status(status);
        let server_message = body
            .and_then(|b| b.get("error"))
            .and_then(|e| e.as_str())
            .filter(|s| !s.is_empty());

        // Duplicates always get the friendly wording
        let message = match (kind, server_message) {
            (ErrorKind::Duplicate, _) | (_, None) => kind.default_message().to_string(),
            (_, Some(msg)) => msg.to_string(),
        };

        Self {
            kind,
            message,
            status: Some(status.as_u16()),
            field: body
                .and_then(|b| b.get("field"))
                .and_then(|f| f.as_str())
                .map(String::from),
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() || err.is_request() || err.is_body() {
            let mut e = ClientError::new(ErrorKind::Network);
            if err.is_timeout() {
                e.message = "The server did not respond in time. Try again.".to_string();
            }
            return e;
        }
        if let Some(status) = err.status() {
            return ClientError::from_response(status, None);
        }
        ClientError::with_message(ErrorKind::Unknown, format!("Unexpected response: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ErrorKind::from_status(StatusCode::BAD_REQUEST), ErrorKind::Validation);
        assert_eq!(ErrorKind::from_status(StatusCode::NOT_FOUND), ErrorKind::NotFound);
        assert_eq!(ErrorKind::from_status(StatusCode::CONFLICT), ErrorKind::Duplicate);
        assert_eq!(ErrorKind::from_status(StatusCode::BAD_GATEWAY), ErrorKind::Server);
        assert_eq!(ErrorKind::from_status(StatusCode::IM_A_TEAPOT), ErrorKind::Server);
        assert_eq!(ErrorKind::from_status(StatusCode::METHOD_NOT_ALLOWED), ErrorKind::Server);
    }

    #[test]
    fn test_only_network_is_retryable() {
        assert!(ErrorKind::Network.is_retryable());
        for kind in [
            ErrorKind::Validation,
            ErrorKind::NotFound,
            ErrorKind::Duplicate,
            ErrorKind::Server,
            ErrorKind::Unknown,
        ] {
            assert!(!kind.is_retryable(), "{} should not retry", kind);
        }
    }

    #[test]
    fn test_server_message_and_field_are_kept() {
        let body = json!({ "error": "title is too long", "field": "title" });
        let err = ClientError::from_response(StatusCode::BAD_REQUEST, Some(&body));
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(err.message, "title is too long");
        assert_eq!(err.field.as_deref(), Some("title"));
        assert_eq!(err.status, Some(400));
    }

    #[test]
    fn test_missing_body_falls_back_to_default_message() {
        let err = ClientError::from_response(StatusCode::INTERNAL_SERVER_ERROR, None);
        assert_eq!(err.to_string(), ErrorKind::Server.default_message());
    }

    #[test]
    fn test_duplicate_uses_friendly_message() {
        let body = json!({ "error": "Poem already exists: \"x\" by y", "duplicate": true });
        let err = ClientError::from_response(StatusCode::CONFLICT, Some(&body));
        assert_eq!(err.message, ErrorKind::Duplicate.default_message());
    }
}
