//! SendGrid Client Library
//!
//! A thin async adapter over the SendGrid v3 REST API. The client holds the
//! per-request configuration (resource path, API version, media type), derives
//! the authorization header from a credential pair, builds one HTTP request
//! per call, and returns a normalized [`Response`].
//!
//! The adapter adds no retries, no rate limiting and no recovery. Transport
//! failures reach the caller unchanged, and non-2xx responses are ordinary
//! responses whose status the caller inspects.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use integrations_sendgrid::{Method, SendGridClient};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = SendGridClient::builder()
//!         .api_key("SG.your_api_key")
//!         .build()?;
//!
//!     let message = json!({
//!         "personalizations": [{ "to": [{ "email": "to@example.com" }] }],
//!         "from": { "email": "from@example.com" },
//!         "subject": "Sending with SendGrid",
//!         "content": [{ "type": "text/plain", "value": "and easy to do anywhere" }]
//!     });
//!
//!     let response = client.send_email(&message, None).await?;
//!     if !response.is_success() {
//!         eprintln!("SendGrid rejected the message: {}", response.body());
//!     }
//!
//!     // Any other endpoint, with pre-encoded query parameters.
//!     let templates = client
//!         .request(Method::Get, None, Some("generations=dynamic"), Some("templates"), None)
//!         .await?;
//!     println!("{}", templates.body());
//!     Ok(())
//! }
//! ```
//!
//! # Cancellation
//!
//! ```rust,no_run
//! use integrations_sendgrid::{CancellationToken, Method, SendGridClient};
//!
//! # async fn example(client: SendGridClient) -> Result<(), Box<dyn std::error::Error>> {
//! let token = CancellationToken::new();
//! let result = client
//!     .request(Method::Get, None, None, Some("scopes"), Some(&token))
//!     .await;
//!
//! if let Err(e) = result {
//!     assert!(e.is_cancelled() || e.as_transport().is_some());
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod auth;
pub mod client;
pub mod config;
pub mod errors;
pub mod observability;
pub mod response;
pub mod transport;

// Re-exports for convenience
pub use auth::{AuthProvider, AuthorizationValue, BasicAuth, BearerAuth, Credential, HeaderValueAuth};
pub use client::{SendGridClient, SendGridClientBuilder, MAIL_SEND_PATH};
pub use config::{SendGridConfig, SendGridConfigBuilder};
pub use errors::{ApiErrorDetail, SendGridError, SendGridResult};
pub use response::Response;
pub use transport::{HttpRequest, HttpResponse, HttpTransport, HttpTransportImpl, Method, TransportError};

pub use tokio_util::sync::CancellationToken;

/// Mock implementations for testing.
#[cfg(any(test, feature = "mocks"))]
pub mod mocks;
