//! HTTP layer for making API requests
//!
//! This module implements the single-attempt half of the call pipeline:
//! - Request body construction ([`request`])
//! - Auth injection and dispatch through an injected [`Transport`] ([`dispatch`])
//! - Response decoding and error mapping ([`error`])
//! - A default reqwest-backed transport ([`transport`])

pub mod dispatch;
pub mod error;
pub mod request;
pub mod transport;

pub use dispatch::Dispatcher;
pub use error::{decode_response, map_http_error};
pub use request::{build_request_body, EncodedBody, Payload, CONTENT_TYPE_JSON};
pub use transport::ReqwestTransport;

use crate::providers::error::TransportError;
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode, Url};
use serde::{Deserialize, Serialize};

/// Type of API call being made
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallKind {
    /// Chat completion request
    Chat,
    /// Text embeddings request
    Embeddings,
}

impl CallKind {
    /// Get the endpoint path for this call kind
    pub fn endpoint(&self) -> &'static str {
        match self {
            CallKind::Chat => "/chat/completions",
            CallKind::Embeddings => "/embeddings",
        }
    }
}

/// A fully constructed outbound request
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }
}

/// A response with its body fully read
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }
}

/// Executes one HTTP exchange
///
/// Implementations must be safe for concurrent use; the client shares one
/// transport across all of its calls. The caller owns the transport's
/// lifecycle (connection pools, shutdown).
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}
