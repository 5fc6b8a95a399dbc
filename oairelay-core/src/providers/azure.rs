//! Azure OpenAI client
//!
//! Talks to deployment-scoped endpoints and authenticates with the
//! `API-KEY` header.

use crate::config::SecretString;
use crate::http::CallKind;
use crate::providers::auth::Credential;
use crate::providers::client::{ApiClient, ClientOptions};
use crate::providers::context::CallContext;
use crate::providers::endpoint::DeploymentEndpoint;
use crate::providers::error::ClientResult;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

/// Alias for [`AzureOpenAIClient`]
pub type AzureOpenAI = AzureOpenAIClient;

/// Client for an Azure OpenAI deployment
#[derive(Debug, Clone)]
pub struct AzureOpenAIClient {
    client: ApiClient,
    deployment: String,
    api_version: String,
}

impl AzureOpenAIClient {
    /// Create a client for `deployment` on `domain`, e.g.
    /// `my-resource.openai.azure.com`
    pub fn new(
        domain: impl Into<String>,
        api_key: impl Into<SecretString>,
        deployment: impl Into<String>,
        api_version: impl Into<String>,
        options: ClientOptions,
    ) -> ClientResult<Self> {
        let deployment = deployment.into();
        let api_version = api_version.into();

        let mut endpoint =
            DeploymentEndpoint::new(domain, deployment.clone(), api_version.clone());
        if let Some(scheme) = &options.scheme {
            endpoint = endpoint.with_scheme(scheme.clone());
        }

        let client = ApiClient::new(Arc::new(endpoint), Credential::api_key(api_key), options)?;
        Ok(Self {
            client,
            deployment,
            api_version,
        })
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn deployment(&self) -> &str {
        &self.deployment
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Full URL of an operation path, api-version included
    pub fn endpoint(&self, path: &str) -> String {
        self.client.endpoint(path)
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
        self.client.call(ctx, CallKind::Chat, request).await
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
        self.client.call(ctx, CallKind::Embeddings, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_shape() {
        let client = AzureOpenAI::new(
            "contoso.openai.azure.com",
            "azure-key",
            "gpt-4o-mini",
            "2024-06-01",
            ClientOptions::new(),
        )
        .unwrap();

        assert_eq!(
            client.endpoint("/chat/completions"),
            "https://contoso.openai.azure.com/openai/deployments/gpt-4o-mini/chat/completions?api-version=2024-06-01"
        );
        assert_eq!(client.deployment(), "gpt-4o-mini");
        assert!(matches!(client.client().credential(), Credential::ApiKey(_)));
    }
}
