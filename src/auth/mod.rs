//! Authentication module for the SendGrid client.
//!
//! A [`Credential`] is the header-name/header-value pair the caller supplies.
//! An [`AuthProvider`] turns it into an [`AuthorizationValue`] (scheme plus
//! parameter) that the client writes into the request. The default provider,
//! [`HeaderValueAuth`], reads the scheme out of the credential value itself,
//! so `("Authorization", "Bearer SG.xxx")` yields scheme `Bearer`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use secrecy::{ExposeSecret, SecretString};

use crate::errors::{SendGridError, SendGridResult};

/// Header name used for API key authentication.
pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// A header-name/header-value pair used to derive the authorization header.
#[derive(Clone)]
pub struct Credential {
    name: String,
    value: SecretString,
}

impl Credential {
    /// Creates a credential from a header name and value.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: SecretString::new(value.into()),
        }
    }

    /// Creates an `Authorization: Bearer <api_key>` credential.
    pub fn bearer(api_key: impl AsRef<str>) -> Self {
        Self::new(AUTHORIZATION_HEADER, format!("Bearer {}", api_key.as_ref()))
    }

    /// The header name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The header value, exposed.
    pub(crate) fn value(&self) -> &str {
        self.value.expose_secret()
    }

    /// Gets a hint of the value for debugging (last 4 characters).
    pub fn hint(&self) -> String {
        let value = self.value.expose_secret();
        let chars: Vec<char> = value.chars().collect();
        if chars.len() > 4 {
            format!("...{}", chars[chars.len() - 4..].iter().collect::<String>())
        } else {
            "****".to_string()
        }
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("name", &self.name)
            .field("value", &"[REDACTED]")
            .finish()
    }
}

/// A structured authorization header value: `<scheme> <parameter>`.
#[derive(Clone)]
pub struct AuthorizationValue {
    scheme: String,
    parameter: SecretString,
}

impl AuthorizationValue {
    /// Creates an authorization value.
    pub fn new(scheme: impl Into<String>, parameter: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            parameter: SecretString::new(parameter.into()),
        }
    }

    /// The authentication scheme, e.g. `Bearer`.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// The scheme parameter (token or encoded credentials), exposed.
    pub fn parameter(&self) -> &str {
        self.parameter.expose_secret()
    }

    /// Renders the value as it is written into the header.
    pub fn header_value(&self) -> String {
        format!("{} {}", self.scheme, self.parameter.expose_secret())
    }
}

impl PartialEq for AuthorizationValue {
    fn eq(&self, other: &Self) -> bool {
        self.scheme == other.scheme
            && self.parameter.expose_secret() == other.parameter.expose_secret()
    }
}

impl Eq for AuthorizationValue {}

impl std::fmt::Debug for AuthorizationValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationValue")
            .field("scheme", &self.scheme)
            .field("parameter", &"[REDACTED]")
            .finish()
    }
}

/// Authorization strategy.
///
/// Implementations must be pure: the same credential always yields the same
/// value.
pub trait AuthProvider: Send + Sync {
    /// Derive the authorization value for a credential.
    fn authorize(&self, credential: &Credential) -> SendGridResult<AuthorizationValue>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

/// Reads scheme and parameter from the credential value (`"<scheme> <param>"`).
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderValueAuth;

impl AuthProvider for HeaderValueAuth {
    fn authorize(&self, credential: &Credential) -> SendGridResult<AuthorizationValue> {
        let value = credential.value().trim();

        let (scheme, parameter) = value
            .split_once(char::is_whitespace)
            .map(|(scheme, rest)| (scheme, rest.trim()))
            .filter(|(_, parameter)| !parameter.is_empty())
            .ok_or_else(|| {
                SendGridError::validation(
                    "Credential value must have the form '<scheme> <parameter>'",
                    credential.name(),
                )
            })?;

        Ok(AuthorizationValue::new(scheme, parameter))
    }

    fn name(&self) -> &'static str {
        "header-value"
    }
}

/// Treats the whole credential value as a bearer token.
#[derive(Debug, Clone, Copy, Default)]
pub struct BearerAuth;

impl AuthProvider for BearerAuth {
    fn authorize(&self, credential: &Credential) -> SendGridResult<AuthorizationValue> {
        let token = credential.value().trim();
        if token.is_empty() {
            return Err(SendGridError::validation(
                "Bearer token cannot be empty",
                credential.name(),
            ));
        }
        Ok(AuthorizationValue::new("Bearer", token))
    }

    fn name(&self) -> &'static str {
        "bearer"
    }
}

/// Treats the credential value as `user:password` and base64-encodes it.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicAuth;

impl AuthProvider for BasicAuth {
    fn authorize(&self, credential: &Credential) -> SendGridResult<AuthorizationValue> {
        let value = credential.value();
        if !value.contains(':') {
            return Err(SendGridError::validation(
                "Basic credentials must have the form 'user:password'",
                credential.name(),
            ));
        }
        Ok(AuthorizationValue::new("Basic", STANDARD.encode(value)))
    }

    fn name(&self) -> &'static str {
        "basic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_header_value_auth_splits_scheme() {
        let credential = Credential::new("Authorization", "Bearer ABC");
        let value = HeaderValueAuth.authorize(&credential).unwrap();

        assert_eq!(value.scheme(), "Bearer");
        assert_eq!(value.parameter(), "ABC");
        assert_eq!(value.header_value(), "Bearer ABC");
    }

    #[test]
    fn test_header_value_auth_is_deterministic() {
        let credential = Credential::bearer("SG.key");
        let first = HeaderValueAuth.authorize(&credential).unwrap();
        let second = HeaderValueAuth.authorize(&credential).unwrap();
        assert_eq!(first, second);
    }

    #[test_case("ABC" ; "no scheme")]
    #[test_case("Bearer   " ; "empty parameter")]
    #[test_case("" ; "empty value")]
    fn test_header_value_auth_rejects(value: &str) {
        let credential = Credential::new("Authorization", value);
        let error = HeaderValueAuth.authorize(&credential).unwrap_err();
        assert!(matches!(error, SendGridError::Validation { .. }));
    }

    #[test]
    fn test_bearer_auth() {
        let credential = Credential::new("Authorization", "SG.raw-key");
        let value = BearerAuth.authorize(&credential).unwrap();
        assert_eq!(value.header_value(), "Bearer SG.raw-key");

        assert!(BearerAuth
            .authorize(&Credential::new("Authorization", " "))
            .is_err());
    }

    #[test]
    fn test_basic_auth() {
        let credential = Credential::new("Authorization", "apikey:secret");
        let value = BasicAuth.authorize(&credential).unwrap();
        assert_eq!(value.scheme(), "Basic");
        assert_eq!(value.parameter(), "YXBpa2V5OnNlY3JldA==");

        assert!(BasicAuth
            .authorize(&Credential::new("Authorization", "no-colon"))
            .is_err());
    }

    #[test]
    fn test_credential_hint() {
        assert_eq!(Credential::bearer("SG.abcdef1234").hint(), "...1234");
        assert_eq!(Credential::new("Authorization", "abc").hint(), "****");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let credential = Credential::bearer("SG.secret_key");
        let debug_str = format!("{:?}", credential);
        assert!(debug_str.contains("[REDACTED]"));
        assert!(!debug_str.contains("SG.secret_key"));

        let value = HeaderValueAuth.authorize(&credential).unwrap();
        let debug_str = format!("{:?}", value);
        assert!(!debug_str.contains("SG.secret_key"));
    }
}
