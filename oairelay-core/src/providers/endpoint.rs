//! Endpoint shapes for standard and deployment-scoped APIs

use std::fmt;

/// Scheme used unless overridden
pub const DEFAULT_SCHEME: &str = "https";

/// Builds the full URL of an operation path such as `/chat/completions`
pub trait Endpoint: Send + Sync + fmt::Debug {
    fn url(&self, path: &str) -> String;
}

/// `{scheme}://{domain}/v1{path}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandardEndpoint {
    pub domain: String,
    pub scheme: String,
}

impl StandardEndpoint {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            scheme: DEFAULT_SCHEME.to_string(),
        }
    }

    /// Use a different scheme, e.g. `http` for a local gateway
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }
}

impl Endpoint for StandardEndpoint {
    fn url(&self, path: &str) -> String {
        format!("{}://{}/v1{}", self.scheme, self.domain, path)
    }
}

/// `{scheme}://{domain}/openai/deployments/{deployment}{path}?api-version={version}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentEndpoint {
    pub domain: String,
    pub deployment: String,
    pub api_version: String,
    pub scheme: String,
}

impl DeploymentEndpoint {
    pub fn new(
        domain: impl Into<String>,
        deployment: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            deployment: deployment.into(),
            api_version: api_version.into(),
            scheme: DEFAULT_SCHEME.to_string(),
        }
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }
}

impl Endpoint for DeploymentEndpoint {
    fn url(&self, path: &str) -> String {
        format!(
            "{}://{}/openai/deployments/{}{}?api-version={}",
            self.scheme, self.domain, self.deployment, path, self.api_version
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_endpoint() {
        let endpoint = StandardEndpoint::new("api.openai.com");
        assert_eq!(
            endpoint.url("/chat/completions"),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_deployment_endpoint() {
        let endpoint = DeploymentEndpoint::new("example.openai.azure.com", "gpt4o", "2024-02-01");
        assert_eq!(
            endpoint.url("/embeddings"),
            "https://example.openai.azure.com/openai/deployments/gpt4o/embeddings?api-version=2024-02-01"
        );
    }

    #[test]
    fn test_scheme_override() {
        let endpoint = StandardEndpoint::new("127.0.0.1:8080").with_scheme("http");
        assert_eq!(endpoint.url("/embeddings"), "http://127.0.0.1:8080/v1/embeddings");
    }
}
