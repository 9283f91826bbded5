//! Error types for the SendGrid client.
//!
//! The client is a pass-through layer. Transport failures are surfaced inside
//! [`SendGridError::Transport`] exactly as the transport produced them, and
//! non-2xx responses are ordinary [`Response`](crate::Response) values unless
//! the caller opts into [`SendGridError::Api`].

use serde::Deserialize;
use thiserror::Error;

use crate::response::Response;
use crate::transport::TransportError;

/// Result type alias for SendGrid operations.
pub type SendGridResult<T> = Result<T, SendGridError>;

/// Error type for SendGrid client operations.
#[derive(Debug, Error)]
pub enum SendGridError {
    /// Configuration error (missing API key, malformed host, etc.)
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message describing the configuration issue.
        message: String,
    },

    /// A request could not be assembled from the supplied values.
    #[error("Validation error: {message}")]
    Validation {
        /// Error message.
        message: String,
        /// The offending field, if known.
        field: Option<String>,
    },

    /// A message could not be serialized, or a body could not be decoded.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message.
        message: String,
    },

    /// Failure reported by the HTTP transport, unmodified.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The caller's cancellation token fired before the response arrived.
    #[error("Request cancelled")]
    Cancelled,

    /// Non-2xx response, only produced when the client is configured to
    /// treat HTTP errors as errors.
    #[error("API error (HTTP {status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// First error message from the body, or the status reason.
        message: String,
        /// All error entries from the body.
        errors: Vec<ApiErrorDetail>,
        /// Raw response body.
        body: String,
    },
}

impl SendGridError {
    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        SendGridError::Configuration {
            message: message.into(),
        }
    }

    /// Creates a validation error tied to a field.
    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        SendGridError::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Returns the transport error, if this is one.
    pub fn as_transport(&self) -> Option<&TransportError> {
        match self {
            SendGridError::Transport(err) => Some(err),
            _ => None,
        }
    }

    /// Returns true if the request was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SendGridError::Cancelled)
    }

    /// Returns true if the transport timed out.
    pub fn is_timeout(&self) -> bool {
        self.as_transport().is_some_and(TransportError::is_timeout)
    }

    /// Returns the HTTP status code for API errors.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            SendGridError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Builds an API error from a non-2xx response.
    ///
    /// SendGrid reports failures as `{"errors":[{"message", "field", "help"}]}`.
    /// Bodies in any other shape fall back to the status reason phrase.
    pub fn from_response(response: &Response) -> Self {
        let errors = serde_json::from_str::<ApiErrorResponse>(response.body())
            .map(|parsed| parsed.errors)
            .unwrap_or_default();

        let message = errors
            .first()
            .map(|detail| detail.message.clone())
            .or_else(|| response.status().canonical_reason().map(str::to_string))
            .unwrap_or_else(|| "Unknown error".to_string());

        SendGridError::Api {
            status: response.status().as_u16(),
            message,
            errors,
            body: response.body().to_string(),
        }
    }
}

/// Error body returned by the SendGrid API.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    /// Error entries.
    #[serde(default)]
    pub errors: Vec<ApiErrorDetail>,
}

/// A single SendGrid error entry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApiErrorDetail {
    /// The error message.
    pub message: String,
    /// The request field the error refers to.
    #[serde(default)]
    pub field: Option<String>,
    /// Link or structured hint describing the error.
    #[serde(default)]
    pub help: Option<serde_json::Value>,
}

impl From<serde_json::Error> for SendGridError {
    fn from(err: serde_json::Error) -> Self {
        SendGridError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<url::ParseError> for SendGridError {
    fn from(err: url::ParseError) -> Self {
        SendGridError::Configuration {
            message: format!("Invalid URL: {}", err),
        }
    }
}
