//! Client settings with serde support

use super::error::ValidationError;
use super::secrets::{SafeLogging, SecretString};
use crate::http::Transport;
use crate::providers::context::CallContext;
use crate::providers::endpoint::DEFAULT_SCHEME;
use crate::providers::{
    ApiClient, AzureOpenAIClient, ClientError, ClientOptions, ClientResult, OpenAIClient,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Which API flavour a settings file targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    OpenAI,
    Azure,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "openai",
            ProviderKind::Azure => "azure",
        }
    }
}

/// Settings needed to build one client
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClientSettings {
    #[serde(default)]
    pub provider: ProviderKind,

    /// Host (and optional port) without scheme or path
    pub domain: String,

    /// API key (supports environment variable interpolation)
    pub api_key: SecretString,

    /// Azure deployment name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment: Option<String>,

    /// Azure `api-version` query value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    #[serde(default = "default_scheme")]
    pub scheme: String,

    /// Per-call timeout in milliseconds
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay between attempts in milliseconds
    #[serde(default = "default_retry_after")]
    pub retry_after_ms: u64,
}

fn default_scheme() -> String {
    DEFAULT_SCHEME.to_string()
}
fn default_timeout() -> u64 {
    30000
}
fn default_max_retries() -> u32 {
    3
}
fn default_retry_after() -> u64 {
    10000
}

impl ClientSettings {
    /// Settings for an OpenAI client with default tuning
    pub fn openai(domain: impl Into<String>, api_key: impl Into<SecretString>) -> Self {
        Self {
            provider: ProviderKind::OpenAI,
            domain: domain.into(),
            api_key: api_key.into(),
            deployment: None,
            api_version: None,
            scheme: default_scheme(),
            timeout_ms: default_timeout(),
            max_retries: default_max_retries(),
            retry_after_ms: default_retry_after(),
        }
    }

    /// Settings for an Azure OpenAI deployment with default tuning
    pub fn azure(
        domain: impl Into<String>,
        api_key: impl Into<SecretString>,
        deployment: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Self {
        Self {
            provider: ProviderKind::Azure,
            deployment: Some(deployment.into()),
            api_version: Some(api_version.into()),
            ..Self::openai(domain, api_key)
        }
    }

    /// Check required fields and value ranges
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.domain.trim().is_empty() {
            return Err(ValidationError::required("domain"));
        }

        if self.api_key.is_empty() {
            return Err(ValidationError::required("api_key"));
        }

        if self.provider == ProviderKind::Azure {
            if self.deployment.as_deref().is_none_or(str::is_empty) {
                return Err(ValidationError::required("deployment")
                    .with_context("azure settings need a deployment name"));
            }
            if self.api_version.as_deref().is_none_or(str::is_empty) {
                return Err(ValidationError::required("api_version")
                    .with_context("azure settings need an api-version"));
            }
        }

        if self.scheme != "http" && self.scheme != "https" {
            return Err(ValidationError::invalid_url(
                "scheme",
                format!("scheme must be http or https, got: {}", self.scheme),
            ));
        }

        if self.timeout_ms == 0 {
            return Err(ValidationError::out_of_range(
                "timeout_ms",
                "Must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Root URL every request of this client starts with
    pub fn base_url(&self) -> String {
        match self.provider {
            ProviderKind::OpenAI => format!("{}://{}/v1", self.scheme, self.domain),
            ProviderKind::Azure => format!(
                "{}://{}/openai/deployments/{}",
                self.scheme,
                self.domain,
                self.deployment.as_deref().unwrap_or_default()
            ),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry_after(&self) -> Duration {
        Duration::from_millis(self.retry_after_ms)
    }

    /// Client options carrying these settings' tuning
    pub fn to_options(&self) -> ClientOptions {
        ClientOptions::new()
            .with_timeout(self.timeout())
            .with_max_retries(self.max_retries)
            .with_retry_after(self.retry_after())
            .with_scheme(self.scheme.clone())
    }

    /// Build the client these settings describe
    ///
    /// Without a `transport` the client sends requests through reqwest.
    pub fn build(&self, transport: Option<Arc<dyn Transport>>) -> ClientResult<ConfiguredClient> {
        self.validate()
            .map_err(|e| ClientError::InvalidRequest(e.to_string()))?;

        let mut options = self.to_options();
        if let Some(transport) = transport {
            options = options.with_transport(transport);
        }

        let client = match self.provider {
            ProviderKind::OpenAI => ConfiguredClient::OpenAI(OpenAIClient::new(
                self.domain.clone(),
                self.api_key.clone(),
                options,
            )?),
            ProviderKind::Azure => ConfiguredClient::Azure(AzureOpenAIClient::new(
                self.domain.clone(),
                self.api_key.clone(),
                self.deployment.clone().unwrap_or_default(),
                self.api_version.clone().unwrap_or_default(),
                options,
            )?),
        };
        Ok(client)
    }
}

impl SafeLogging for ClientSettings {
    fn safe_for_logging(&self) -> String {
        let mut line = format!(
            "provider={} base_url={} api_key={}",
            self.provider.as_str(),
            self.base_url(),
            self.api_key
        );
        if let Some(version) = &self.api_version {
            line.push_str(&format!(" api_version={}", version));
        }
        line
    }
}

/// A client built from [`ClientSettings`]
#[derive(Debug, Clone)]
pub enum ConfiguredClient {
    OpenAI(OpenAIClient),
    Azure(AzureOpenAIClient),
}

impl ConfiguredClient {
    pub fn client(&self) -> &ApiClient {
        match self {
            ConfiguredClient::OpenAI(c) => c.client(),
            ConfiguredClient::Azure(c) => c.client(),
        }
    }

    pub fn endpoint(&self, path: &str) -> String {
        self.client().endpoint(path)
    }

    pub async fn create_chat_completion<Req, Res>(
        &self,
        ctx: &CallContext,
        request: &Req,
    ) -> ClientResult<Res>
    where
        Req: Serialize + ?Sized,
        Res: DeserializeOwned,
    {
        match self {
            ConfiguredClient::OpenAI(c) => c.create_chat_completion(ctx, request).await,
            ConfiguredClient::Azure(c) => c.create_chat_completion(ctx, request).await,
        }
    }

    pub async fn create_text_embeddings<Req, Res>(
        &self,
        ctx: &CallContext,
        request: &Req,
    ) -> ClientResult<Res>
    where
        Req: Serialize + ?Sized,
        Res: DeserializeOwned,
    {
        match self {
            ConfiguredClient::OpenAI(c) => c.create_text_embeddings(ctx, request).await,
            ConfiguredClient::Azure(c) => c.create_text_embeddings(ctx, request).await,
        }
    }
}
