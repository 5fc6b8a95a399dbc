//! Response decoding and HTTP error mapping

use crate::http::HttpResponse;
use crate::providers::error::{ClientError, ClientResult, ErrorDetail, ResultError};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{error, warn};

/// Body shape of a failed call: `{ "error": { ... } }`
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: Option<ErrorDetail>,
}

/// Map a non-200 status and its body to a [`ResultError`]
///
/// The body is decoded best-effort: when it is empty, not JSON, or not in
/// the expected shape, the error carries the status alone.
pub fn map_http_error(status: StatusCode, body: &[u8]) -> ResultError {
    let mut result = ResultError::new(
        status.as_u16(),
        status.canonical_reason().unwrap_or_default(),
    );

    if let Ok(envelope) = serde_json::from_slice::<ErrorEnvelope>(body) {
        result.detail = envelope.error;
    }

    result
}

/// Turn a response into the caller's result shape or a structured error
///
/// Only HTTP 200 counts as success. A 200 body that does not match `R` is a
/// [`ClientError::Decode`]; any other status becomes a
/// [`ClientError::Result`], left unclassified for the caller to stamp.
pub fn decode_response<R>(response: &HttpResponse) -> ClientResult<R>
where
    R: DeserializeOwned,
{
    if response.status == StatusCode::OK {
        return serde_json::from_slice(&response.body).map_err(|source| {
            error!("Failed to parse response body: {}", source);
            ClientError::Decode {
                status: response.status.as_u16(),
                source,
            }
        });
    }

    let result = map_http_error(response.status, &response.body);
    warn!("Request failed with {}", result);
    Err(ClientError::Result(result))
}
