//! SendGrid API client.
//!
//! [`SendGridClient`] is a thin adapter: it turns a verb, an optional body,
//! optional query parameters and an optional path override into an
//! [`HttpRequest`], attaches the authorization header, and hands the request
//! to an [`HttpTransport`]. It never retries and never swallows transport
//! failures.

use http::header::HeaderValue;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::auth::{AuthProvider, AuthorizationValue, Credential, HeaderValueAuth};
use crate::config::{SendGridConfig, SendGridConfigBuilder};
use crate::errors::{SendGridError, SendGridResult};
use crate::response::Response;
use crate::transport::{HttpRequest, HttpTransport, HttpTransportImpl, Method};

/// Resource path of the mail send endpoint.
pub const MAIL_SEND_PATH: &str = "mail/send";

/// The SendGrid client.
///
/// # Example
///
/// ```rust,no_run
/// use integrations_sendgrid::SendGridClient;
/// use serde_json::json;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = SendGridClient::builder()
///         .api_key("SG.your_api_key")
///         .build()?;
///
///     let message = json!({
///         "personalizations": [{ "to": [{ "email": "to@example.com" }] }],
///         "from": { "email": "from@example.com" },
///         "subject": "Hello",
///         "content": [{ "type": "text/plain", "value": "Hi there" }]
///     });
///
///     let response = client.send_email(&message, None).await?;
///     println!("status: {}", response.status());
///     Ok(())
/// }
/// ```
pub struct SendGridClient {
    config: SendGridConfig,
    transport: Arc<dyn HttpTransport>,
    auth: Arc<dyn AuthProvider>,
}

impl SendGridClient {
    /// Creates a new client builder.
    pub fn builder() -> SendGridClientBuilder {
        SendGridClientBuilder::new()
    }

    /// Creates a client with the default transport and authorization strategy.
    pub fn new(config: SendGridConfig) -> SendGridResult<Self> {
        SendGridClientBuilder::from_config(config).build()
    }

    /// Creates a client from environment variables.
    ///
    /// See [`SendGridConfig::from_env`] for the variables read.
    pub fn from_env() -> SendGridResult<Self> {
        Self::new(SendGridConfig::from_env()?)
    }

    /// Creates a client from an API key.
    pub fn from_api_key(api_key: impl Into<String>) -> SendGridResult<Self> {
        SendGridClientBuilder::new().api_key(api_key).build()
    }

    /// Returns the configuration.
    pub fn config(&self) -> &SendGridConfig {
        &self.config
    }

    /// The resource path used when a request has no path override.
    pub fn url_path(&self) -> &str {
        &self.config.url_path
    }

    /// Sets the resource path used when a request has no path override.
    pub fn set_url_path(&mut self, url_path: impl Into<String>) {
        self.config.url_path = url_path.into();
    }

    /// The API version segment.
    pub fn version(&self) -> &str {
        &self.config.version
    }

    /// Sets the API version segment.
    pub fn set_version(&mut self, version: impl Into<String>) {
        self.config.version = version.into();
    }

    /// The content type attached to request bodies.
    pub fn media_type(&self) -> &str {
        &self.config.media_type
    }

    /// Sets the content type attached to request bodies.
    pub fn set_media_type(&mut self, media_type: impl Into<String>) {
        self.config.media_type = media_type.into();
    }

    /// Derives the authorization value for a credential using the configured
    /// strategy. Pure; client state is not touched.
    pub fn add_authorization(&self, credential: &Credential) -> SendGridResult<AuthorizationValue> {
        self.auth.authorize(credential)
    }

    /// Builds the effective URL: `{host}/{version}/{path}[?{query_params}]`.
    ///
    /// `url_path` overrides the configured resource path. Query parameters are
    /// appended verbatim; an empty version or path contributes no segment.
    pub fn build_url(&self, url_path: Option<&str>, query_params: Option<&str>) -> String {
        let path = url_path
            .unwrap_or(&self.config.url_path)
            .trim_start_matches('/');
        let version = self.config.version.trim_matches('/');

        let mut url = self.config.host.clone();
        if !version.is_empty() {
            url.push('/');
            url.push_str(version);
        }
        if !path.is_empty() {
            url.push('/');
            url.push_str(path);
        }
        if let Some(query) = query_params.filter(|q| !q.is_empty()) {
            url.push('?');
            url.push_str(query);
        }
        url
    }

    /// Makes the call to the API server.
    ///
    /// Transport failures are returned as [`SendGridError::Transport`] holding
    /// the transport's own error. A token that is already cancelled, or that
    /// fires while the request is in flight, yields [`SendGridError::Cancelled`].
    #[instrument(skip_all, fields(method = %request.method, url = %request.url))]
    pub async fn make_request(
        &self,
        request: HttpRequest,
        cancellation: Option<&CancellationToken>,
    ) -> SendGridResult<Response> {
        if cancellation.is_some_and(CancellationToken::is_cancelled) {
            debug!("Cancellation requested before dispatch");
            return Err(SendGridError::Cancelled);
        }

        let started = Instant::now();

        let outcome = match cancellation {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        debug!(elapsed_ms = elapsed_ms(started), "Request cancelled in flight");
                        return Err(SendGridError::Cancelled);
                    }
                    result = self.transport.send(request) => result,
                }
            }
            None => self.transport.send(request).await,
        };

        let http_response = outcome.map_err(|e| {
            warn!(error = %e, elapsed_ms = elapsed_ms(started), "Transport failure");
            SendGridError::Transport(e)
        })?;

        let response = Response::from(http_response);
        debug!(
            status = response.status().as_u16(),
            elapsed_ms = elapsed_ms(started),
            "Response received"
        );

        if self.config.http_errors_as_errors && !response.is_success() {
            return Err(SendGridError::from_response(&response));
        }

        Ok(response)
    }

    /// Prepares and sends a request to the API server.
    ///
    /// `body` is sent as-is with the configured media type as `Content-Type`;
    /// an absent or empty body sends no body and no `Content-Type`.
    /// `query_params` must already be encoded. `url_path` replaces the
    /// configured resource path for this call only.
    ///
    /// # Errors
    ///
    /// Transport failures pass through unchanged (see [`Self::make_request`]).
    /// Non-2xx responses are returned as `Ok` unless the client was built with
    /// `http_errors_as_errors`.
    #[instrument(skip_all, fields(method = %method, path_override = ?url_path))]
    pub async fn request(
        &self,
        method: Method,
        body: Option<&str>,
        query_params: Option<&str>,
        url_path: Option<&str>,
        cancellation: Option<&CancellationToken>,
    ) -> SendGridResult<Response> {
        let request = self.build_request(method, body, query_params, url_path)?;
        self.make_request(request, cancellation).await
    }

    /// Sends an email through the mail send endpoint.
    ///
    /// The message is serialized to JSON and posted to `mail/send`.
    #[instrument(skip_all)]
    pub async fn send_email<M>(
        &self,
        message: &M,
        cancellation: Option<&CancellationToken>,
    ) -> SendGridResult<Response>
    where
        M: Serialize + ?Sized,
    {
        let body = serde_json::to_string(message)?;
        self.request(Method::Post, Some(&body), None, Some(MAIL_SEND_PATH), cancellation)
            .await
    }

    fn build_request(
        &self,
        method: Method,
        body: Option<&str>,
        query_params: Option<&str>,
        url_path: Option<&str>,
    ) -> SendGridResult<HttpRequest> {
        let url = self.build_url(url_path, query_params);
        url::Url::parse(&url)
            .map_err(|e| SendGridError::validation(format!("Invalid request URL: {}", e), "url"))?;

        let mut request = HttpRequest::new(method, url)
            .with_header("Accept", "application/json")
            .with_header("User-Agent", self.config.user_agent.as_str());

        for (name, value) in &self.config.request_headers {
            request.set_header(name.as_str(), value.as_str());
        }

        if let Some(subuser) = &self.config.on_behalf_of {
            request.set_header("on-behalf-of", subuser.as_str());
        }

        let credential = &self.config.credential;
        let authorization = self.add_authorization(credential)?.header_value();
        HeaderValue::from_str(&authorization).map_err(|_| {
            SendGridError::validation("Authorization value is not a valid header value", credential.name())
        })?;
        request.set_header(credential.name(), authorization);

        if let Some(body) = body.filter(|b| !b.is_empty()) {
            HeaderValue::from_str(&self.config.media_type).map_err(|_| {
                SendGridError::validation(
                    format!("Invalid media type: {:?}", self.config.media_type),
                    "media_type",
                )
            })?;
            request = request
                .with_header("Content-Type", self.config.media_type.as_str())
                .with_body(body);
        }

        Ok(request)
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

impl std::fmt::Debug for SendGridClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SendGridClient")
            .field("config", &self.config)
            .field("credential", &self.config.credential.hint())
            .field("auth", &self.auth.name())
            .finish()
    }
}

/// Builder for the SendGrid client.
pub struct SendGridClientBuilder {
    config_builder: SendGridConfigBuilder,
    config: Option<SendGridConfig>,
    transport: Option<Arc<dyn HttpTransport>>,
    auth: Option<Arc<dyn AuthProvider>>,
}

impl SendGridClientBuilder {
    /// Creates a new client builder.
    pub fn new() -> Self {
        Self {
            config_builder: SendGridConfigBuilder::new(),
            config: None,
            transport: None,
            auth: None,
        }
    }

    /// Creates a builder from an existing configuration.
    ///
    /// Configuration setters on this builder are ignored once a full
    /// configuration is supplied.
    pub fn from_config(config: SendGridConfig) -> Self {
        Self {
            config: Some(config),
            ..Self::new()
        }
    }

    /// Sets the API key.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.api_key(api_key);
        self
    }

    /// Sets an explicit credential pair.
    pub fn credential(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.credential(name, value);
        self
    }

    /// Sets the host.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.host(host);
        self
    }

    /// Sets the API version segment.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.version(version);
        self
    }

    /// Sets the default resource path.
    pub fn url_path(mut self, url_path: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.url_path(url_path);
        self
    }

    /// Sets the request media type.
    pub fn media_type(mut self, media_type: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.media_type(media_type);
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: std::time::Duration) -> Self {
        self.config_builder = self.config_builder.timeout(timeout);
        self
    }

    /// Impersonates a subuser.
    pub fn on_behalf_of(mut self, subuser: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.on_behalf_of(subuser);
        self
    }

    /// Overrides the `User-Agent` header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.user_agent(user_agent);
        self
    }

    /// Adds a header sent with every request.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.header(name, value);
        self
    }

    /// Treat non-2xx responses as errors.
    pub fn http_errors_as_errors(mut self, enabled: bool) -> Self {
        self.config_builder = self.config_builder.http_errors_as_errors(enabled);
        self
    }

    /// Sets a custom transport.
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Sets a custom authorization strategy.
    pub fn auth(mut self, auth: Arc<dyn AuthProvider>) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Builds the client.
    pub fn build(self) -> SendGridResult<SendGridClient> {
        let config = match self.config {
            Some(config) => config,
            None => self.config_builder.build()?,
        };

        let transport: Arc<dyn HttpTransport> = match self.transport {
            Some(t) => t,
            None => Arc::new(
                HttpTransportImpl::new(config.timeout)
                    .map_err(|e| SendGridError::configuration(e.to_string()))?,
            ),
        };

        let auth: Arc<dyn AuthProvider> = match self.auth {
            Some(a) => a,
            None => Arc::new(HeaderValueAuth),
        };

        debug!(host = %config.host, version = %config.version, auth = auth.name(), "SendGrid client built");

        Ok(SendGridClient {
            config,
            transport,
            auth,
        })
    }
}

impl Default for SendGridClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::BasicAuth;
    use crate::mocks::{MockResponse, MockTransport};
    use crate::transport::TransportError;
    use http::StatusCode;
    use test_case::test_case;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::time::Duration;

    fn client_with(transport: Arc<MockTransport>) -> SendGridClient {
        SendGridClient::builder()
            .credential("Authorization", "Bearer ABC")
            .host("https://api.sendgrid.com")
            .version("v3")
            .url_path("v3/mail/send")
            .media_type("application/json")
            .transport(transport)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_send_email_scenario() {
        let transport = Arc::new(MockTransport::new());
        transport.queue(MockResponse::new(202));
        let client = client_with(Arc::clone(&transport));

        let message = json!({
            "from": { "email": "from@example.com" },
            "subject": "Hi"
        });
        let response = client.send_email(&message, None).await.unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(response.body(), "");

        let sent = transport.last_request().unwrap();
        assert_eq!(sent.method, Method::Post);
        assert_eq!(sent.url, "https://api.sendgrid.com/v3/mail/send");
        assert_eq!(sent.header("Authorization"), Some("Bearer ABC"));
        assert_eq!(sent.header("Content-Type"), Some("application/json"));
        assert_eq!(sent.body, Some(serde_json::to_string(&message).unwrap()));
    }

    #[tokio::test]
    async fn test_path_override_ignores_configured_path() {
        let transport = Arc::new(MockTransport::new());
        let client = client_with(Arc::clone(&transport));

        client
            .request(Method::Get, None, None, Some("templates"), None)
            .await
            .unwrap();

        let sent = transport.last_request().unwrap();
        assert_eq!(sent.url, "https://api.sendgrid.com/v3/templates");
    }

    #[tokio::test]
    async fn test_configured_path_joined_with_version() {
        let transport = Arc::new(MockTransport::new());
        let mut client = client_with(Arc::clone(&transport));
        client.set_url_path("suppression/bounces");

        client.request(Method::Get, None, None, None, None).await.unwrap();

        let sent = transport.last_request().unwrap();
        assert_eq!(sent.url, "https://api.sendgrid.com/v3/suppression/bounces");
    }

    #[tokio::test]
    async fn test_config_mutation_between_requests() {
        let transport = Arc::new(MockTransport::new());
        let mut client = client_with(Arc::clone(&transport));

        client.request(Method::Get, None, None, Some("scopes"), None).await.unwrap();
        client.set_version("v4");
        client.set_media_type("text/plain");
        client
            .request(Method::Post, Some("hello"), None, Some("scopes"), None)
            .await
            .unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].url, "https://api.sendgrid.com/v3/scopes");
        assert_eq!(requests[1].url, "https://api.sendgrid.com/v4/scopes");
        assert_eq!(requests[1].header("Content-Type"), Some("text/plain"));
        assert_eq!(client.version(), "v4");
        assert_eq!(client.media_type(), "text/plain");
    }

    #[tokio::test]
    async fn test_query_params_appended_verbatim() {
        let transport = Arc::new(MockTransport::new());
        let client = client_with(Arc::clone(&transport));

        client
            .request(Method::Get, None, Some("limit=10&offset=20"), Some("templates"), None)
            .await
            .unwrap();

        let sent = transport.last_request().unwrap();
        assert_eq!(sent.url, "https://api.sendgrid.com/v3/templates?limit=10&offset=20");
    }

    #[tokio::test]
    async fn test_no_content_type_without_body() {
        let transport = Arc::new(MockTransport::new());
        let client = client_with(Arc::clone(&transport));

        client.request(Method::Delete, None, None, Some("templates/1"), None).await.unwrap();
        client.request(Method::Post, Some(""), None, Some("templates"), None).await.unwrap();

        for sent in transport.requests() {
            assert_eq!(sent.header("Content-Type"), None);
            assert_eq!(sent.body, None);
        }
    }

    #[tokio::test]
    async fn test_default_headers() {
        let transport = Arc::new(MockTransport::new());
        let client = SendGridClient::builder()
            .api_key("SG.key")
            .on_behalf_of("subuser-1")
            .header("X-Request-Source", "tests")
            .transport(Arc::clone(&transport) as Arc<dyn HttpTransport>)
            .build()
            .unwrap();

        client.request(Method::Get, None, None, Some("scopes"), None).await.unwrap();

        let sent = transport.last_request().unwrap();
        assert_eq!(sent.header("accept"), Some("application/json"));
        assert!(sent.header("user-agent").unwrap().starts_with("sendgrid/"));
        assert_eq!(sent.header("on-behalf-of"), Some("subuser-1"));
        assert_eq!(sent.header("x-request-source"), Some("tests"));
        assert_eq!(sent.header("authorization"), Some("Bearer SG.key"));
    }

    #[tokio::test]
    async fn test_timeout_propagates_unchanged() {
        let transport = Arc::new(MockTransport::new());
        let failure = TransportError::Timeout {
            message: "operation timed out".to_string(),
        };
        transport.queue_failure(failure.clone());
        let client = client_with(Arc::clone(&transport));

        let error = client
            .request(Method::Get, None, None, Some("scopes"), None)
            .await
            .unwrap_err();

        assert_eq!(error.as_transport(), Some(&failure));
    }

    #[tokio::test]
    async fn test_already_cancelled_token() {
        let transport = Arc::new(MockTransport::new());
        let client = client_with(Arc::clone(&transport));
        let token = CancellationToken::new();
        token.cancel();

        let error = client
            .request(Method::Get, None, None, Some("scopes"), Some(&token))
            .await
            .unwrap_err();

        assert!(error.is_cancelled());
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_in_flight() {
        let transport = Arc::new(MockTransport::new().with_delay(Duration::from_secs(30)));
        let client = client_with(Arc::clone(&transport));
        let token = CancellationToken::new();

        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let error = client
            .request(Method::Get, None, None, Some("scopes"), Some(&token))
            .await
            .unwrap_err();

        assert!(error.is_cancelled());
    }

    #[tokio::test]
    async fn test_error_status_is_not_a_failure() {
        let transport = Arc::new(MockTransport::new());
        transport.queue(MockResponse::new(400).with_body(r#"{"errors":[{"message":"bad"}]}"#));
        let client = client_with(Arc::clone(&transport));

        let response = client
            .request(Method::Post, Some("{}"), None, Some("mail/send"), None)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(!response.is_success());
    }

    #[tokio::test]
    async fn test_http_errors_as_errors() {
        let transport = Arc::new(MockTransport::new());
        transport.queue(MockResponse::new(401).with_body(
            r#"{"errors":[{"message":"The provided authorization grant is invalid, expired, or revoked","field":null,"help":null}]}"#,
        ));
        let client = SendGridClient::builder()
            .api_key("SG.key")
            .http_errors_as_errors(true)
            .transport(Arc::clone(&transport) as Arc<dyn HttpTransport>)
            .build()
            .unwrap();

        let error = client
            .request(Method::Get, None, None, Some("scopes"), None)
            .await
            .unwrap_err();

        assert_eq!(error.status_code(), Some(401));
        assert!(error.to_string().contains("authorization grant"));
    }

    #[test]
    fn test_add_authorization_is_pure() {
        let client = client_with(Arc::new(MockTransport::new()));
        let credential = Credential::new("Authorization", "Bearer XYZ");

        let first = client.add_authorization(&credential).unwrap();
        let second = client.add_authorization(&credential).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.header_value(), "Bearer XYZ");
        assert_eq!(client.url_path(), "v3/mail/send");
        assert_eq!(client.version(), "v3");
        assert_eq!(client.media_type(), "application/json");
    }

    #[tokio::test]
    async fn test_custom_auth_strategy() {
        let transport = Arc::new(MockTransport::new());
        let client = SendGridClient::builder()
            .credential("Authorization", "apikey:secret")
            .auth(Arc::new(BasicAuth))
            .transport(Arc::clone(&transport) as Arc<dyn HttpTransport>)
            .build()
            .unwrap();

        client.request(Method::Get, None, None, Some("scopes"), None).await.unwrap();

        let sent = transport.last_request().unwrap();
        assert_eq!(sent.header("Authorization"), Some("Basic YXBpa2V5OnNlY3JldA=="));
    }

    #[tokio::test]
    async fn test_malformed_credential_fails_before_dispatch() {
        let transport = Arc::new(MockTransport::new());
        let client = SendGridClient::builder()
            .credential("Authorization", "no-scheme")
            .transport(Arc::clone(&transport) as Arc<dyn HttpTransport>)
            .build()
            .unwrap();

        let error = client
            .request(Method::Get, None, None, Some("scopes"), None)
            .await
            .unwrap_err();

        assert!(matches!(error, SendGridError::Validation { .. }));
        assert_eq!(transport.request_count(), 0);
    }

    #[test_case(SendGridClient::builder().on_behalf_of("bad\nvalue") ; "on behalf of")]
    #[test_case(SendGridClient::builder().user_agent("ua\r\nx") ; "user agent")]
    fn test_invalid_header_value_rejected_at_build(builder: SendGridClientBuilder) {
        let transport = Arc::new(MockTransport::new());
        let result = builder
            .api_key("SG.key")
            .transport(Arc::clone(&transport) as Arc<dyn HttpTransport>)
            .build();

        assert!(matches!(result, Err(SendGridError::Configuration { .. })));
        assert_eq!(transport.request_count(), 0);
    }

    #[test]
    fn test_build_url_without_version() {
        let mut client = client_with(Arc::new(MockTransport::new()));
        client.set_version("");
        assert_eq!(
            client.build_url(Some("/mail/send"), None),
            "https://api.sendgrid.com/mail/send"
        );
    }

    #[test]
    fn test_debug_redacts_credential() {
        let client = client_with(Arc::new(MockTransport::new()));
        let debug_str = format!("{:?}", client);
        assert!(!debug_str.contains("Bearer ABC"));
        assert!(debug_str.contains("header-value"));
        assert!(debug_str.contains("... ABC"));
    }
}
