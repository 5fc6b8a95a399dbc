//! Governing context for a single API call
//!
//! A [`CallContext`] carries a cancellation token and an optional overall
//! deadline. Both the network call and the delay between retry attempts race
//! against it, so a cancellation is observed promptly rather than at the next
//! attempt boundary.

use crate::providers::error::{CancelReason, ClientError, ClientResult};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Cancellation and deadline for one call
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    /// A context that is never canceled and has no deadline
    pub fn new() -> Self {
        Self::default()
    }

    /// Govern the call with an externally owned token
    pub fn with_cancellation(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Set an absolute deadline for the whole call, retries included
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Set a deadline relative to now
    ///
    /// A timeout too large to represent leaves the context without a
    /// deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Instant::now().checked_add(timeout);
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.token
    }

    /// Cancel the call (and every clone of this context)
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Why the context is done, or `None` while it is still live
    pub fn err(&self) -> Option<CancelReason> {
        if self.token.is_cancelled() {
            return Some(CancelReason::Canceled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(CancelReason::DeadlineExceeded),
            _ => None,
        }
    }

    /// Fail with [`ClientError::Cancelled`] if the context is already done
    pub fn check(&self) -> ClientResult<()> {
        match self.err() {
            Some(reason) => Err(ClientError::Cancelled(reason)),
            None => Ok(()),
        }
    }

    /// Resolve once the context is canceled or its deadline passes
    pub async fn done(&self) -> CancelReason {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    biased;
                    _ = self.token.cancelled() => CancelReason::Canceled,
                    _ = tokio::time::sleep_until(deadline) => CancelReason::DeadlineExceeded,
                }
            }
            None => {
                self.token.cancelled().await;
                CancelReason::Canceled
            }
        }
    }

    /// Sleep for `delay` unless the context finishes first
    pub async fn sleep(&self, delay: Duration) -> ClientResult<()> {
        tokio::select! {
            biased;
            reason = self.done() => Err(ClientError::Cancelled(reason)),
            _ = tokio::time::sleep(delay) => Ok(()),
        }
    }

    /// Drive `future` to completion unless the context finishes first
    pub async fn run<F>(&self, future: F) -> Result<F::Output, CancelReason>
    where
        F: Future,
    {
        tokio::select! {
            biased;
            reason = self.done() => Err(reason),
            output = future => Ok(output),
        }
    }
}
