//! OpenAI client
//!
//! Talks to `https://{domain}/v1{path}` with `Authorization: Bearer` auth.

use crate::config::SecretString;
use crate::http::CallKind;
use crate::providers::auth::Credential;
use crate::providers::client::{ApiClient, ClientOptions};
use crate::providers::context::CallContext;
use crate::providers::endpoint::StandardEndpoint;
use crate::providers::error::ClientResult;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

/// Default OpenAI API domain
pub const DEFAULT_DOMAIN: &str = "api.openai.com";

/// Alias for [`OpenAIClient`]
pub type OpenAI = OpenAIClient;

/// Client for the OpenAI API and compatible services
#[derive(Debug, Clone)]
pub struct OpenAIClient {
    client: ApiClient,
}

impl OpenAIClient {
    /// Create a client for `domain`, e.g. `api.openai.com`
    pub fn new(
        domain: impl Into<String>,
        api_key: impl Into<SecretString>,
        options: ClientOptions,
    ) -> ClientResult<Self> {
        let mut endpoint = StandardEndpoint::new(domain);
        if let Some(scheme) = &options.scheme {
            endpoint = endpoint.with_scheme(scheme.clone());
        }

        let client = ApiClient::new(Arc::new(endpoint), Credential::bearer(api_key), options)?;
        Ok(Self { client })
    }

    /// The shared pipeline, for operations without a dedicated method
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Full URL of an operation path
    pub fn endpoint(&self, path: &str) -> String {
        self.client.endpoint(path)
    }

    /// https://platform.openai.com/docs/api-reference/chat/create
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

    /// https://platform.openai.com/docs/api-reference/embeddings/create
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
        let client = OpenAI::new(DEFAULT_DOMAIN, "sk-test", ClientOptions::new()).unwrap();
        assert_eq!(
            client.endpoint("/chat/completions"),
            "https://api.openai.com/v1/chat/completions"
        );
        assert!(matches!(client.client().credential(), Credential::Bearer(_)));
    }

    #[test]
    fn test_scheme_option() {
        let options = ClientOptions::new().with_scheme("http");
        let client = OpenAIClient::new("localhost:11434", "sk-test", options).unwrap();
        assert_eq!(
            client.endpoint("/embeddings"),
            "http://localhost:11434/v1/embeddings"
        );
    }
}
