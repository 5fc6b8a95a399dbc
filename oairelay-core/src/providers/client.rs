//! The retry-aware call pipeline shared by every client flavour
//!
//! [`ApiClient`] is parameterized by an [`Endpoint`] and a [`Credential`];
//! the OpenAI and Azure adapters only differ in which of those they supply.

use crate::http::{
    build_request_body, decode_response, CallKind, Dispatcher, HttpRequest, Payload,
    ReqwestTransport, Transport,
};
use crate::providers::auth::Credential;
use crate::providers::context::CallContext;
use crate::providers::endpoint::Endpoint;
use crate::providers::error::{ClientError, ClientResult};
use crate::providers::retry::{
    Retrier, RetryClassifier, RetryPolicy, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_AFTER,
};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

/// Default per-call timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings shared by every client flavour
#[derive(Clone)]
pub struct ClientOptions {
    /// Transport used for every call; a [`ReqwestTransport`] when unset
    pub transport: Option<Arc<dyn Transport>>,

    /// Per-call timeout, zero for none
    pub timeout: Duration,

    /// Maximum number of retry attempts (not including the initial attempt)
    pub max_retries: u32,

    /// Delay between attempts
    pub retry_after: Duration,

    /// Replaces the default retry rule
    pub classifier: Option<Arc<dyn RetryClassifier>>,

    /// URL scheme, `https` unless overridden
    pub scheme: Option<String>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            transport: None,
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_after: DEFAULT_RETRY_AFTER,
            classifier: None,
            scheme: None,
        }
    }
}

impl fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientOptions")
            .field("transport", &self.transport.as_ref().map(|_| "custom"))
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("retry_after", &self.retry_after)
            .field("classifier", &self.classifier.as_ref().map(|_| "custom"))
            .field("scheme", &self.scheme)
            .finish()
    }
}

impl ClientOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_after(mut self, retry_after: Duration) -> Self {
        self.retry_after = retry_after;
        self
    }

    /// Override which failures are retried
    pub fn with_classifier(mut self, classifier: impl RetryClassifier + 'static) -> Self {
        self.classifier = Some(Arc::new(classifier));
        self
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = Some(scheme.into());
        self
    }

    fn retry_policy(&self) -> RetryPolicy {
        let policy = RetryPolicy::new(self.max_retries, self.retry_after);
        match &self.classifier {
            Some(classifier) => policy.with_shared_classifier(classifier.clone()),
            None => policy,
        }
    }
}

/// Authenticated JSON API client with retries
#[derive(Clone)]
pub struct ApiClient {
    endpoint: Arc<dyn Endpoint>,
    credential: Credential,
    dispatcher: Dispatcher,
    policy: RetryPolicy,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("endpoint", &self.endpoint)
            .field("credential", &self.credential)
            .field("dispatcher", &self.dispatcher)
            .field("policy", &self.policy)
            .finish()
    }
}

impl ApiClient {
    /// Build a client; falls back to a [`ReqwestTransport`] if none is given
    pub fn new(
        endpoint: Arc<dyn Endpoint>,
        credential: Credential,
        options: ClientOptions,
    ) -> ClientResult<Self> {
        let transport: Arc<dyn Transport> = match &options.transport {
            Some(transport) => transport.clone(),
            None => Arc::new(ReqwestTransport::new().map_err(ClientError::transport)?),
        };

        Ok(Self {
            endpoint,
            credential,
            dispatcher: Dispatcher::new(transport, options.timeout),
            policy: options.retry_policy(),
        })
    }

    /// Full URL of an operation path
    pub fn endpoint(&self, path: &str) -> String {
        self.endpoint.url(path)
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// POST `request` to the endpoint of a named operation
    pub async fn call<Req, Res>(
        &self,
        ctx: &CallContext,
        kind: CallKind,
        request: &Req,
    ) -> ClientResult<Res>
    where
        Req: Serialize + ?Sized,
        Res: DeserializeOwned,
    {
        let url = self.endpoint(kind.endpoint());
        self.do_post(ctx, &url, request).await
    }

    /// POST a JSON body to `url`
    pub async fn do_post<Req, Res>(
        &self,
        ctx: &CallContext,
        url: &str,
        source: &Req,
    ) -> ClientResult<Res>
    where
        Req: Serialize + ?Sized,
        Res: DeserializeOwned,
    {
        self.execute(ctx, Method::POST, url, HeaderMap::new(), Payload::Json(source))
            .await
    }

    /// POST pre-encoded bytes to `url`
    ///
    /// Without a `content_type` the request is sent as JSON.
    pub async fn do_post_raw<Res>(
        &self,
        ctx: &CallContext,
        url: &str,
        body: &[u8],
        content_type: Option<&str>,
    ) -> ClientResult<Res>
    where
        Res: DeserializeOwned,
    {
        let mut headers = HeaderMap::new();
        if let Some(content_type) = content_type {
            let value = HeaderValue::from_str(content_type)
                .map_err(|e| ClientError::InvalidRequest(format!("content type: {}", e)))?;
            headers.insert(CONTENT_TYPE, value);
        }
        self.execute::<(), Res>(ctx, Method::POST, url, headers, Payload::Raw(body))
            .await
    }

    /// Run a request through the retry loop
    ///
    /// `headers` are sent on every attempt; a `Content-Type` or auth header
    /// set here is never overwritten.
    pub async fn execute<Req, Res>(
        &self,
        ctx: &CallContext,
        method: Method,
        url: &str,
        headers: HeaderMap,
        payload: Payload<'_, Req>,
    ) -> ClientResult<Res>
    where
        Req: Serialize + ?Sized,
        Res: DeserializeOwned,
    {
        let request_id = Uuid::new_v4();
        let url = Url::parse(url)
            .map_err(|e| ClientError::InvalidRequest(format!("invalid url '{}': {}", url, e)))?;

        info!("Executing {} {} [request_id: {}]", method, url, request_id);

        let result = Retrier::new(&self.policy)
            .run(ctx, |attempt| {
                self.attempt(ctx, &method, &url, &headers, &payload, request_id, attempt)
            })
            .await;

        match &result {
            Ok(_) => info!("Request completed successfully [request_id: {}]", request_id),
            Err(e) => warn!("Request failed [request_id: {}]: {}", request_id, e),
        }

        result
    }

    /// One pass of build, dispatch and decode
    #[allow(clippy::too_many_arguments)]
    async fn attempt<Req, Res>(
        &self,
        ctx: &CallContext,
        method: &Method,
        url: &Url,
        headers: &HeaderMap,
        payload: &Payload<'_, Req>,
        request_id: Uuid,
        attempt: u32,
    ) -> ClientResult<Res>
    where
        Req: Serialize + ?Sized,
        Res: DeserializeOwned,
    {
        let body = build_request_body(payload)?;

        let mut request = HttpRequest::new(method.clone(), url.clone());
        request.headers = headers.clone();
        if let Some(content_type) = body.content_type {
            if !request.headers.contains_key(CONTENT_TYPE) {
                request
                    .headers
                    .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
            }
        }
        request.body = body.bytes;

        let response = self
            .dispatcher
            .dispatch(ctx, request, &self.credential, request_id, attempt)
            .await?;

        decode_response(&response)
    }
}
