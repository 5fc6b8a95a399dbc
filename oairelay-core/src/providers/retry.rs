//! Retry policy and error classification for resilient API calls
//!
//! A call is attempted up to `max_retries + 1` times. A failed attempt is
//! retried if and only if classification stamped a delay on its error; the
//! retrier then waits that long while watching the call's [`CallContext`].
//! The delay is flat: there is no exponential growth and no jitter.

use crate::providers::context::CallContext;
use crate::providers::error::{ClientError, ClientResult};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Default number of retries after the first attempt
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default delay between attempts
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(10);

/// Decides whether a failed attempt is transient
///
/// Implemented for any `Fn(&ClientError) -> bool`, so a client can supply a
/// provider-specific rule as a closure. Cancellation is never retried,
/// whatever the classifier answers.
pub trait RetryClassifier: Send + Sync {
    fn should_retry(&self, error: &ClientError) -> bool;
}

impl<F> RetryClassifier for F
where
    F: Fn(&ClientError) -> bool + Send + Sync,
{
    fn should_retry(&self, error: &ClientError) -> bool {
        self(error)
    }
}

/// Retries rate limits (429), server errors (5xx) and transport failures
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultClassifier;

impl RetryClassifier for DefaultClassifier {
    fn should_retry(&self, error: &ClientError) -> bool {
        is_transient(error)
    }
}

/// The default classification rule
pub fn is_transient(error: &ClientError) -> bool {
    match error {
        ClientError::Cancelled(_) => false,
        ClientError::Transport { .. } => true,
        ClientError::Result(re) => is_transient_status(re.status_code),
        ClientError::Encode(_) | ClientError::Decode { .. } | ClientError::InvalidRequest(_) => {
            false
        }
    }
}

/// 429 and the whole 5xx range are transient
pub fn is_transient_status(status: u16) -> bool {
    status == 429 || (500..=599).contains(&status)
}

/// Retry budget, fallback delay and classifier of a client
#[derive(Clone)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts (not including the initial attempt)
    pub max_retries: u32,

    /// Delay stamped on retryable errors and used between attempts
    pub retry_after: Duration,

    classifier: Arc<dyn RetryClassifier>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES, DEFAULT_RETRY_AFTER)
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_retries", &self.max_retries)
            .field("retry_after", &self.retry_after)
            .finish_non_exhaustive()
    }
}

impl RetryPolicy {
    /// Create a policy using the default classifier
    pub fn new(max_retries: u32, retry_after: Duration) -> Self {
        Self {
            max_retries,
            retry_after,
            classifier: Arc::new(DefaultClassifier),
        }
    }

    /// Create a policy with no retries
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Replace the classification rule
    pub fn with_classifier(mut self, classifier: impl RetryClassifier + 'static) -> Self {
        self.classifier = Arc::new(classifier);
        self
    }

    /// Replace the classification rule with a shared one
    pub fn with_shared_classifier(mut self, classifier: Arc<dyn RetryClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Total attempts allowed, the first one included
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Whether the error is transient under this policy
    ///
    /// Only transport and result errors reach the classifier; encode,
    /// decode, invalid-request and cancellation errors are always terminal.
    pub fn should_retry(&self, error: &ClientError) -> bool {
        matches!(
            error,
            ClientError::Transport { .. } | ClientError::Result(_)
        ) && self.classifier.should_retry(error)
    }

    /// Stamp the fallback delay on a retryable error; leave others untouched
    ///
    /// An error that already carries a delay counts as classified and is
    /// returned as is, so the classifier is asked at most once per error.
    pub fn classify(&self, error: ClientError) -> ClientError {
        if error.retry_after().is_some() {
            return error;
        }
        if self.should_retry(&error) {
            error.with_retry_after(self.retry_after)
        } else {
            error
        }
    }
}

/// Drives repeated attempts of one call under a [`RetryPolicy`]
pub struct Retrier<'a> {
    policy: &'a RetryPolicy,
}

impl<'a> Retrier<'a> {
    pub fn new(policy: &'a RetryPolicy) -> Self {
        Self { policy }
    }

    /// Run `attempt` until it succeeds, fails terminally, or the budget is spent
    ///
    /// `attempt` receives the 1-based attempt number. Each failure is
    /// classified once; it is retried if and only if that stamped a delay on
    /// it. On exhaustion the last attempt's error is returned as is.
    pub async fn run<T, F, Fut>(&self, ctx: &CallContext, mut attempt: F) -> ClientResult<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = ClientResult<T>>,
    {
        let max_attempts = self.policy.max_attempts();
        let mut attempts = 0u32;

        loop {
            ctx.check()?;
            attempts += 1;

            let error = match attempt(attempts).await {
                Ok(value) => return Ok(value),
                Err(error) => self.policy.classify(error),
            };

            let Some(delay) = error.retry_after() else {
                debug!("Attempt {} failed with a terminal error: {}", attempts, error);
                return Err(error);
            };

            if attempts >= max_attempts {
                warn!(
                    "Giving up after {} attempt(s), last error: {}",
                    attempts, error
                );
                return Err(error);
            }

            warn!(
                "Attempt {}/{} failed: {}; retrying in {:?}",
                attempts, max_attempts, error, delay
            );

            ctx.sleep(delay).await?;
        }
    }
}
