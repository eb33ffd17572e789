//! Trailing-edge debouncing on the tokio clock.

use std::time::Duration;

use tokio::time::{sleep_until, Instant};

/// Holds the latest pushed value until no new value has arrived for the
/// configured delay.
#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    /// A debouncer with the given quiet period.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Replace the pending value and restart the quiet period.
    pub fn push(&mut self, value: T) {
        self.pending = Some((value, Instant::now() + self.delay));
    }

    /// When the pending value becomes ready, if there is one.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, at)| *at)
    }

    /// Take the pending value if its quiet period is over.
    pub fn take_ready(&mut self) -> Option<T> {
        match &self.pending {
            Some((_, at)) if *at <= Instant::now() => self.pending.take().map(|(value, _)| value),
            _ => None,
        }
    }

    /// Wait out the quiet period and take the value. Returns `None` at once
    /// when nothing is pending.
    pub async fn settled(&mut self) -> Option<T> {
        let deadline = self.deadline()?;
        sleep_until(deadline).await;
        self.pending.take().map(|(value, _)| value)
    }

    /// Drop the pending value.
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}
