//! OAIRelay Core Library
//!
//! Retry-aware clients for the OpenAI and Azure OpenAI JSON APIs.
//!
//! ```no_run
//! use oairelay_core::{CallContext, ClientOptions, OpenAI};
//! use serde_json::{json, Value};
//!
//! # async fn run() -> oairelay_core::ClientResult<()> {
//! let client = OpenAI::new("api.openai.com", "sk-...", ClientOptions::new())?;
//! let ctx = CallContext::new().with_timeout(std::time::Duration::from_secs(60));
//! let reply: Value = client
//!     .create_chat_completion(&ctx, &json!({
//!         "model": "gpt-4o-mini",
//!         "messages": [{"role": "user", "content": "hello"}]
//!     }))
//!     .await?;
//! # let _ = reply;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod http;
pub mod providers;

pub use config::{load_from_json, load_from_yaml, ClientSettings, ConfiguredClient, SecretString};
pub use http::{CallKind, HttpRequest, HttpResponse, ReqwestTransport, Transport};
pub use providers::{
    ApiClient, AzureOpenAI, AzureOpenAIClient, CallContext, CancelReason, ClientError,
    ClientOptions, ClientResult, Credential, OpenAI, OpenAIClient, ResultError, RetryClassifier,
    RetryPolicy, TransportError,
};

/// Returns the version of the OAIRelay Core library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
