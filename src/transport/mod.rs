//! HTTP transport layer for the SendGrid client.
//!
//! The client assembles a complete [`HttpRequest`] (method, absolute URL,
//! headers, body) and hands it to an [`HttpTransport`]. The transport owns
//! the actual network I/O; the default implementation is backed by reqwest.

mod http;

pub use self::http::{HttpRequest, HttpResponse, HttpTransport, HttpTransportImpl, Method};

/// Transport error types.
///
/// These are produced by the transport and travel to the caller untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Connection could not be established (DNS, refused, reset).
    #[error("Connection error: {message}")]
    Connection {
        /// Error message.
        message: String,
    },

    /// The request did not complete within the transport timeout.
    #[error("Timeout: {message}")]
    Timeout {
        /// Error message.
        message: String,
    },

    /// The request could not be sent (redirect loop, builder failure, etc.).
    #[error("Request error: {message}")]
    Request {
        /// Error message.
        message: String,
    },

    /// The response could not be read.
    #[error("Invalid response: {message}")]
    InvalidResponse {
        /// Error message.
        message: String,
    },
}

impl TransportError {
    /// Returns true if this is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout { .. })
    }

    /// Returns true if this is a connection failure.
    pub fn is_connection(&self) -> bool {
        matches!(self, TransportError::Connection { .. })
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout {
                message: err.to_string(),
            }
        } else if err.is_connect() {
            TransportError::Connection {
                message: err.to_string(),
            }
        } else if err.is_body() || err.is_decode() {
            TransportError::InvalidResponse {
                message: err.to_string(),
            }
        } else {
            TransportError::Request {
                message: err.to_string(),
            }
        }
    }
}
