//! Fixed-delay pacing between requests to the search API.
//!
//! The upstream API enforces request-rate limits, so the crawl waits a fixed
//! delay after every successful page and after every zone. A wait can be cut
//! short by cancelling the run.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Default delay between consecutive requests.
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(300);

/// Sleeps a fixed delay between requests.
#[derive(Debug, Clone, Copy)]
pub struct Pacer {
    delay: Duration,
}

impl Pacer {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// A pacer that never waits.
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Wait for the configured delay, uninterruptibly.
    pub async fn wait(&self) {
        if !self.delay.is_zero() {
            tracing::trace!(delay_ms = %self.delay.as_millis(), "Pacing");
            tokio::time::sleep(self.delay).await;
        }
    }

    /// Wait for the configured delay unless the run is cancelled first.
    ///
    /// Returns `false` if the wait was interrupted by `cancel`.
    pub async fn pause(&self, cancel: &CancellationToken) -> bool {
        if cancel.is_cancelled() {
            return false;
        }
        if self.delay.is_zero() {
            return true;
        }

        tracing::trace!(delay_ms = %self.delay.as_millis(), "Pacing");
        tokio::select! {
            () = tokio::time::sleep(self.delay) => true,
            () = cancel.cancelled() => false,
        }
    }
}

impl Default for Pacer {
    fn default() -> Self {
        Self::new(DEFAULT_REQUEST_DELAY)
    }
}
