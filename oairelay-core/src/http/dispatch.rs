//! Single-attempt dispatch through the injected transport

use crate::http::request::CONTENT_TYPE_JSON;
use crate::http::{HttpRequest, HttpResponse, Transport};
use crate::providers::auth::Credential;
use crate::providers::context::CallContext;
use crate::providers::error::{ClientError, ClientResult, TransportError};
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use uuid::Uuid;

/// Sends one authenticated request, bounded by a timeout and the call context
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    timeout: Option<Duration>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// A zero `timeout` disables the per-call timeout
    pub fn new(transport: Arc<dyn Transport>, timeout: Duration) -> Self {
        Self {
            transport,
            timeout: (!timeout.is_zero()).then_some(timeout),
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Attach headers and execute one attempt
    ///
    /// Transport failures come back as unclassified
    /// [`ClientError::Transport`] values. If the context is done, the result
    /// is [`ClientError::Cancelled`] whatever the transport reported.
    pub async fn dispatch(
        &self,
        ctx: &CallContext,
        mut request: HttpRequest,
        credential: &Credential,
        request_id: Uuid,
        attempt: u32,
    ) -> ClientResult<HttpResponse> {
        if !request.headers.contains_key(CONTENT_TYPE) {
            request
                .headers
                .insert(CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_JSON));
        }
        credential.apply(&mut request.headers)?;

        let method = request.method.clone();
        let url = request.url.clone();
        let started = Instant::now();

        let outcome = match ctx.run(self.send(request)).await {
            Err(reason) => Err(ClientError::Cancelled(reason)),
            Ok(Ok(response)) => Ok(response),
            Ok(Err(err)) => Err(match ctx.err() {
                Some(reason) => ClientError::Cancelled(reason),
                None => ClientError::transport(err),
            }),
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &outcome {
            Ok(response) => debug!(
                %request_id,
                attempt,
                %method,
                %url,
                status = response.status.as_u16(),
                elapsed_ms,
                "HTTP attempt completed"
            ),
            Err(err) => warn!(
                %request_id,
                attempt,
                %method,
                %url,
                elapsed_ms,
                error = %err,
                "HTTP attempt failed"
            ),
        }

        outcome
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.transport.send(request))
                .await
                .unwrap_or_else(|_| {
                    Err(TransportError::timeout(format!(
                        "no response within {:?}",
                        timeout
                    )))
                }),
            None => self.transport.send(request).await,
        }
    }
}
