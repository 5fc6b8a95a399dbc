//! Credentials and auth header injection

use crate::config::SecretString;
use crate::providers::error::{ClientError, ClientResult};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use std::fmt;

/// Header used by Azure OpenAI for key authentication
pub const API_KEY_HEADER: &str = "api-key";

/// Secret used to authenticate against the API
///
/// The variant selects which auth header the dispatcher emits.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// `Authorization: Bearer <key>`
    Bearer(SecretString),
    /// `API-KEY: <key>`
    ApiKey(SecretString),
}

impl Credential {
    pub fn bearer(key: impl Into<SecretString>) -> Self {
        Self::Bearer(key.into())
    }

    pub fn api_key(key: impl Into<SecretString>) -> Self {
        Self::ApiKey(key.into())
    }

    pub fn secret(&self) -> &SecretString {
        match self {
            Self::Bearer(key) | Self::ApiKey(key) => key,
        }
    }

    /// Name of the header this credential is sent in
    pub fn header_name(&self) -> HeaderName {
        match self {
            Self::Bearer(_) => AUTHORIZATION,
            Self::ApiKey(_) => HeaderName::from_static(API_KEY_HEADER),
        }
    }

    fn header_value(&self) -> ClientResult<HeaderValue> {
        let raw = match self {
            Self::Bearer(key) => format!("Bearer {}", key.expose_secret()),
            Self::ApiKey(key) => key.expose_secret().to_string(),
        };
        let mut value = HeaderValue::from_str(&raw).map_err(|_| {
            ClientError::InvalidRequest("api key contains characters not allowed in a header".to_string())
        })?;
        value.set_sensitive(true);
        Ok(value)
    }

    /// Insert the auth header unless the request already carries one
    ///
    /// A request that already has either `Authorization` or `API-KEY` set is
    /// left alone, so at most one auth header is ever sent.
    pub fn apply(&self, headers: &mut HeaderMap) -> ClientResult<()> {
        if headers.contains_key(AUTHORIZATION) || headers.contains_key(API_KEY_HEADER) {
            return Ok(());
        }
        headers.insert(self.header_name(), self.header_value()?);
        Ok(())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bearer(_) => write!(f, "Bearer([REDACTED])"),
            Self::ApiKey(_) => write!(f, "ApiKey([REDACTED])"),
        }
    }
}
