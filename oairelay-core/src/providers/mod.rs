//! OpenAI and Azure OpenAI clients
//!
//! Both flavours share one retry-aware pipeline ([`ApiClient`]) and only
//! differ in how URLs are built and which auth header is sent.

pub mod auth;
pub mod azure;
pub mod client;
pub mod context;
pub mod endpoint;
pub mod error;
pub mod openai;
pub mod retry;

pub use auth::{Credential, API_KEY_HEADER};
pub use azure::{AzureOpenAI, AzureOpenAIClient};
pub use client::{ApiClient, ClientOptions, DEFAULT_TIMEOUT};
pub use context::CallContext;
pub use endpoint::{DeploymentEndpoint, Endpoint, StandardEndpoint};
pub use error::{
    CancelReason, ClientError, ClientResult, ErrorDetail, ResultError, TransportError,
    TransportErrorKind,
};
pub use openai::{OpenAI, OpenAIClient};
pub use retry::{
    is_transient, is_transient_status, DefaultClassifier, Retrier, RetryClassifier, RetryPolicy,
    DEFAULT_MAX_RETRIES, DEFAULT_RETRY_AFTER,
};
