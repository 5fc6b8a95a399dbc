//! Client error types and handling

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Why a call was abandoned by its governing context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The cancellation token was triggered
    Canceled,
    /// The overall call deadline passed
    DeadlineExceeded,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Canceled => write!(f, "context canceled"),
            Self::DeadlineExceeded => write!(f, "context deadline exceeded"),
        }
    }
}

/// Coarse category of a transport failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Could not establish a connection
    Connect,
    /// The per-call timeout elapsed
    Timeout,
    /// The response body could not be read
    Body,
    /// Anything else reported by the transport
    Other,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect => write!(f, "connection failed"),
            Self::Timeout => write!(f, "request timed out"),
            Self::Body => write!(f, "failed to read response body"),
            Self::Other => write!(f, "transport error"),
        }
    }
}

/// Network-level failure reported by a [`Transport`](crate::http::Transport)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn connect(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Connect, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Timeout, message)
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == TransportErrorKind::Timeout
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::timeout(err.to_string())
        } else if err.is_connect() {
            TransportError::connect(err.to_string())
        } else if err.is_body() || err.is_decode() {
            TransportError::new(TransportErrorKind::Body, err.to_string())
        } else {
            TransportError::new(TransportErrorKind::Other, err.to_string())
        }
    }
}

/// Provider-reported error detail, as found under the `error` key of a failure body
///
/// OpenAI format: `{ "error": { "message": "...", "type": "...", "param": ..., "code": ... } }`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    #[serde(default, deserialize_with = "lenient_string")]
    pub message: Option<String>,

    #[serde(default, rename = "type", deserialize_with = "lenient_string")]
    pub error_type: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub param: Option<String>,

    /// Azure reports numeric codes, OpenAI reports strings
    #[serde(default, deserialize_with = "string_or_number")]
    pub code: Option<String>,
}

/// A field of an unexpected type decodes as `None` instead of failing the
/// whole detail
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        _ => None,
    })
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// A non-200 response from the API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultError {
    /// HTTP status code
    pub status_code: u16,

    /// HTTP reason phrase, e.g. "Too Many Requests"
    pub status: String,

    /// Provider detail, when the body could be decoded
    pub detail: Option<ErrorDetail>,

    /// Set if and only if the error was classified retryable
    pub retry_after: Option<Duration>,
}

impl ResultError {
    /// Create a result error carrying only the status
    pub fn new(status_code: u16, status: impl Into<String>) -> Self {
        Self {
            status_code,
            status: status.into(),
            detail: None,
            retry_after: None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        self.detail.as_ref().and_then(|d| d.message.as_deref())
    }

    pub fn code(&self) -> Option<&str> {
        self.detail.as_ref().and_then(|d| d.code.as_deref())
    }

    pub fn error_type(&self) -> Option<&str> {
        self.detail.as_ref().and_then(|d| d.error_type.as_deref())
    }
}

impl fmt::Display for ResultError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {} {}", self.status_code, self.status)?;
        if let Some(detail) = &self.detail {
            if let Some(code) = &detail.code {
                write!(f, " [{}]", code)?;
            }
            if let Some(message) = &detail.message {
                write!(f, ": {}", message)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ResultError {}

/// Errors surfaced by an API call
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request payload could not be serialized
    #[error("Failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    /// The request could not be constructed (bad URL or header value)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The governing context was canceled or its deadline passed
    #[error("Call aborted: {0}")]
    Cancelled(CancelReason),

    /// The transport failed before a response was received
    #[error("Transport error: {source}")]
    Transport {
        #[source]
        source: TransportError,
        retry_after: Option<Duration>,
    },

    /// The API answered with a non-200 status
    #[error("{0}")]
    Result(ResultError),

    /// A 200 response body did not match the expected shape
    #[error("Failed to decode response body (status {status}): {source}")]
    Decode {
        status: u16,
        #[source]
        source: serde_json::Error,
    },
}

impl ClientError {
    /// Wrap a transport failure as an unclassified retry candidate
    pub fn transport(source: TransportError) -> Self {
        Self::Transport {
            source,
            retry_after: None,
        }
    }

    /// HTTP status associated with this error, if a response was received
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Result(re) => Some(re.status_code),
            Self::Decode { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Delay stamped by the classifier, present only on retryable errors
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Transport { retry_after, .. } => *retry_after,
            Self::Result(re) => re.retry_after,
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }

    /// Stamp a retry delay on errors that can carry one
    pub fn with_retry_after(mut self, delay: Duration) -> Self {
        match &mut self {
            Self::Transport { retry_after, .. } => *retry_after = Some(delay),
            Self::Result(re) => re.retry_after = Some(delay),
            _ => {}
        }
        self
    }

    /// The provider detail of a result error
    pub fn detail(&self) -> Option<&ErrorDetail> {
        match self {
            Self::Result(re) => re.detail.as_ref(),
            _ => None,
        }
    }
}

impl From<ResultError> for ClientError {
    fn from(err: ResultError) -> Self {
        ClientError::Result(err)
    }
}
