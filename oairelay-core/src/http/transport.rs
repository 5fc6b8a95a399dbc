//! Default transport implementation using reqwest

use crate::http::{HttpRequest, HttpResponse, Transport};
use crate::providers::error::{TransportError, TransportErrorKind};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use std::time::Duration;
use tracing::trace;

/// Maximum response size (10MB)
const MAX_RESPONSE_SIZE: usize = 10 * 1024 * 1024;

/// Default user agent
const USER_AGENT: &str = concat!("oairelay/", env!("CARGO_PKG_VERSION"));

/// Transport over a shared reqwest client
///
/// Per-call timeouts are enforced by the dispatcher, so the underlying client
/// is built without a request timeout of its own.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    max_response_size: usize,
}

impl ReqwestTransport {
    /// Create a transport with default connection settings
    pub fn new() -> Result<Self, TransportError> {
        let client = ClientBuilder::new()
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT)
            .gzip(true)
            .build()
            .map_err(|e| {
                TransportError::new(
                    TransportErrorKind::Other,
                    format!("Failed to create HTTP client: {}", e),
                )
            })?;

        Ok(Self::with_client(client))
    }

    /// Wrap an existing reqwest client, e.g. one configured with a proxy
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            max_response_size: MAX_RESPONSE_SIZE,
        }
    }

    /// Limit the size of response bodies read into memory
    pub fn with_max_response_size(mut self, max_response_size: usize) -> Self {
        self.max_response_size = max_response_size;
        self
    }

    fn too_large(&self, size: usize) -> TransportError {
        TransportError::new(
            TransportErrorKind::Body,
            format!(
                "Response size {} exceeds maximum {}",
                size, self.max_response_size
            ),
        )
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let mut response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();

        let expected = match response.content_length() {
            Some(len) if len as usize > self.max_response_size => {
                return Err(self.too_large(len as usize));
            }
            Some(len) => len as usize,
            None => 0,
        };

        // Reading the body to the end hands the connection back to the pool;
        // dropping the response on any early return closes it. Chunked bodies
        // carry no length up front, so the cap is enforced while reading.
        let mut body = Vec::with_capacity(expected);
        while let Some(chunk) = response.chunk().await? {
            let size = body.len() + chunk.len();
            if size > self.max_response_size {
                return Err(self.too_large(size));
            }
            body.extend_from_slice(&chunk);
        }
        trace!("Read {} byte response body with status {}", body.len(), status);

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
