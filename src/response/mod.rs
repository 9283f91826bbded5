//! Normalized API response.

use http::StatusCode;
use serde::de::DeserializeOwned;
use std::collections::HashMap;

use crate::errors::SendGridResult;
use crate::transport::HttpResponse;

/// A response from the SendGrid API.
///
/// Any status code is represented here, including 4xx and 5xx; callers
/// inspect [`Response::status`] to detect API-level failures. Header names
/// are stored lower-cased, and lookups ignore case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: StatusCode,
    headers: HashMap<String, String>,
    body: String,
}

impl Response {
    /// Create a new response.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use integrations_sendgrid::Response;
    /// use http::StatusCode;
    /// use std::collections::HashMap;
    ///
    /// let mut headers = HashMap::new();
    /// headers.insert("X-Message-Id".to_string(), "abc123".to_string());
    ///
    /// let response = Response::new(StatusCode::ACCEPTED, headers, "");
    /// assert_eq!(response.header("x-message-id"), Some("abc123"));
    /// ```
    pub fn new(
        status: StatusCode,
        headers: HashMap<String, String>,
        body: impl Into<String>,
    ) -> Self {
        let mut normalized: HashMap<String, String> = HashMap::with_capacity(headers.len());
        for (name, value) in headers {
            normalized
                .entry(name.to_ascii_lowercase())
                .and_modify(|existing| {
                    existing.push_str(", ");
                    existing.push_str(&value);
                })
                .or_insert_with(|| value.clone());
        }
        let headers = normalized;

        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// Get the HTTP status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns true for 2xx status codes.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Get the response body.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Get a header value by name, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Get all headers.
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// The `X-Message-Id` SendGrid assigns to accepted mail.
    pub fn message_id(&self) -> Option<&str> {
        self.header("x-message-id")
    }

    /// Parse the response body as JSON.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use integrations_sendgrid::Response;
    /// use http::StatusCode;
    /// use std::collections::HashMap;
    /// use serde::Deserialize;
    ///
    /// #[derive(Deserialize)]
    /// struct Scopes {
    ///     scopes: Vec<String>,
    /// }
    ///
    /// # fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let response = Response::new(
    ///     StatusCode::OK,
    ///     HashMap::new(),
    ///     r#"{"scopes":["mail.send"]}"#,
    /// );
    /// let scopes: Scopes = response.json()?;
    /// assert_eq!(scopes.scopes, vec!["mail.send"]);
    /// # Ok(())
    /// # }
    /// ```
    pub fn json<T: DeserializeOwned>(&self) -> SendGridResult<T> {
        serde_json::from_str(&self.body).map_err(Into::into)
    }

    /// Consume the response, returning status, headers and body.
    pub fn into_parts(self) -> (StatusCode, HashMap<String, String>, String) {
        (self.status, self.headers, self.body)
    }
}

impl From<HttpResponse> for Response {
    fn from(response: HttpResponse) -> Self {
        Self::new(response.status, response.headers, response.body)
    }
}
