//! Configuration module for the SendGrid client.
//!
//! Provides configuration management including the credential, host, API
//! version, default resource path, media type, timeout, and the extra headers
//! SendGrid supports (subuser impersonation via `on-behalf-of`).

use http::header::{HeaderName, HeaderValue};
use std::time::Duration;
use url::Url;

use crate::auth::Credential;
use crate::errors::{SendGridError, SendGridResult};

/// Default host for the SendGrid API.
pub const DEFAULT_HOST: &str = "https://api.sendgrid.com";

/// Default API version segment.
pub const DEFAULT_VERSION: &str = "v3";

/// Default media type for request bodies.
pub const DEFAULT_MEDIA_TYPE: &str = "application/json";

/// Default request timeout (100 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(100);

/// Default user agent.
pub const DEFAULT_USER_AGENT: &str = concat!("sendgrid/", env!("CARGO_PKG_VERSION"), ";rust");

/// Configuration for the SendGrid client.
#[derive(Clone)]
pub struct SendGridConfig {
    /// Credential used to derive the authorization header.
    pub(crate) credential: Credential,
    /// Scheme and authority of the API, without trailing slash.
    pub host: String,
    /// API version segment; empty means no version segment.
    pub version: String,
    /// Resource path used when a request carries no path override.
    pub url_path: String,
    /// Content type attached to request bodies.
    pub media_type: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Subuser to impersonate via the `on-behalf-of` header.
    pub on_behalf_of: Option<String>,
    /// Extra headers sent with every request.
    pub request_headers: Vec<(String, String)>,
    /// User agent sent with every request.
    pub user_agent: String,
    /// Convert non-2xx responses into [`SendGridError::Api`].
    pub http_errors_as_errors: bool,
}

impl SendGridConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> SendGridConfigBuilder {
        SendGridConfigBuilder::new()
    }

    /// Creates a configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `SENDGRID_API_KEY` (required): API key, sent as a bearer token
    /// - `SENDGRID_HOST` (optional): Custom host
    /// - `SENDGRID_VERSION` (optional): API version segment
    /// - `SENDGRID_TIMEOUT` (optional): Request timeout in seconds
    /// - `SENDGRID_ON_BEHALF_OF` (optional): Subuser to impersonate
    pub fn from_env() -> SendGridResult<Self> {
        let api_key = std::env::var("SENDGRID_API_KEY").map_err(|_| {
            SendGridError::configuration("SENDGRID_API_KEY environment variable not set")
        })?;

        let mut builder = SendGridConfigBuilder::new().api_key(api_key);

        if let Ok(host) = std::env::var("SENDGRID_HOST") {
            builder = builder.host(host);
        }

        if let Ok(version) = std::env::var("SENDGRID_VERSION") {
            builder = builder.version(version);
        }

        if let Ok(timeout_str) = std::env::var("SENDGRID_TIMEOUT") {
            match timeout_str.parse::<u64>() {
                Ok(secs) => builder = builder.timeout_secs(secs),
                Err(_) => tracing::warn!(value = %timeout_str, "Ignoring unparsable SENDGRID_TIMEOUT"),
            }
        }

        if let Ok(subuser) = std::env::var("SENDGRID_ON_BEHALF_OF") {
            builder = builder.on_behalf_of(subuser);
        }

        builder.build()
    }

    /// Returns the credential.
    pub fn credential(&self) -> &Credential {
        &self.credential
    }
}

impl std::fmt::Debug for SendGridConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SendGridConfig")
            .field("credential", &self.credential)
            .field("host", &self.host)
            .field("version", &self.version)
            .field("url_path", &self.url_path)
            .field("media_type", &self.media_type)
            .field("timeout", &self.timeout)
            .field("on_behalf_of", &self.on_behalf_of)
            .field("http_errors_as_errors", &self.http_errors_as_errors)
            .finish()
    }
}

/// Builder for `SendGridConfig`.
#[derive(Default)]
pub struct SendGridConfigBuilder {
    credential: Option<Credential>,
    api_key: Option<String>,
    host: Option<String>,
    version: Option<String>,
    url_path: Option<String>,
    media_type: Option<String>,
    timeout: Option<Duration>,
    on_behalf_of: Option<String>,
    request_headers: Vec<(String, String)>,
    user_agent: Option<String>,
    http_errors_as_errors: bool,
}

impl SendGridConfigBuilder {
    /// Creates a new configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key; it is sent as `Authorization: Bearer <key>`.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self.credential = None;
        self
    }

    /// Sets an explicit credential pair, replacing any API key.
    pub fn credential(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.credential = Some(Credential::new(name, value));
        self.api_key = None;
        self
    }

    /// Sets the host.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Sets the API version segment.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Sets the default resource path.
    pub fn url_path(mut self, url_path: impl Into<String>) -> Self {
        self.url_path = Some(url_path.into());
        self
    }

    /// Sets the request media type.
    pub fn media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the timeout in seconds.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = Some(Duration::from_secs(secs));
        self
    }

    /// Impersonates a subuser.
    pub fn on_behalf_of(mut self, subuser: impl Into<String>) -> Self {
        self.on_behalf_of = Some(subuser.into());
        self
    }

    /// Adds a header sent with every request.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request_headers.push((name.into(), value.into()));
        self
    }

    /// Overrides the user agent.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Treat non-2xx responses as [`SendGridError::Api`].
    pub fn http_errors_as_errors(mut self, enabled: bool) -> Self {
        self.http_errors_as_errors = enabled;
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> SendGridResult<SendGridConfig> {
        let credential = match (self.credential, self.api_key) {
            (Some(credential), _) => credential,
            (None, Some(api_key)) => {
                if api_key.trim().is_empty() {
                    return Err(SendGridError::configuration("API key cannot be empty"));
                }
                if !api_key.starts_with("SG.") {
                    tracing::warn!("API key does not match expected SendGrid format (SG.*)");
                }
                Credential::bearer(api_key)
            }
            (None, None) => {
                return Err(SendGridError::configuration("API key or credential is required"))
            }
        };

        HeaderName::from_bytes(credential.name().as_bytes()).map_err(|_| {
            SendGridError::configuration(format!(
                "Invalid credential header name: {}",
                credential.name()
            ))
        })?;

        let host = self
            .host
            .unwrap_or_else(|| DEFAULT_HOST.to_string())
            .trim_end_matches('/')
            .to_string();

        let parsed = Url::parse(&host)?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(SendGridError::configuration(format!(
                "Host must use http or https, got {}",
                parsed.scheme()
            )));
        }

        let media_type = self
            .media_type
            .unwrap_or_else(|| DEFAULT_MEDIA_TYPE.to_string());
        if media_type.is_empty() || HeaderValue::from_str(&media_type).is_err() {
            return Err(SendGridError::configuration(format!(
                "Invalid media type: {:?}",
                media_type
            )));
        }

        for (name, value) in &self.request_headers {
            HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| SendGridError::configuration(format!("Invalid header name: {}", name)))?;
            HeaderValue::from_str(value).map_err(|_| {
                SendGridError::configuration(format!("Invalid value for header {}", name))
            })?;
        }

        if let Some(subuser) = &self.on_behalf_of {
            HeaderValue::from_str(subuser).map_err(|_| {
                SendGridError::configuration(format!("Invalid on-behalf-of value: {:?}", subuser))
            })?;
        }

        let user_agent = self
            .user_agent
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());
        HeaderValue::from_str(&user_agent).map_err(|_| {
            SendGridError::configuration(format!("Invalid user agent: {:?}", user_agent))
        })?;

        Ok(SendGridConfig {
            credential,
            host,
            version: self.version.unwrap_or_else(|| DEFAULT_VERSION.to_string()),
            url_path: self.url_path.unwrap_or_default(),
            media_type,
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
            on_behalf_of: self.on_behalf_of,
            request_headers: self.request_headers,
            user_agent,
            http_errors_as_errors: self.http_errors_as_errors,
        })
    }
}
