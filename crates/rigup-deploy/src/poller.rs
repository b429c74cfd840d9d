//! Fixed-interval polling primitive
//!
//! Both remote-wait sites (SSH connect, cloud-init completion) poll at a
//! fixed interval with no backoff. The classifier decides per attempt whether
//! to keep going, finish, or fail; the poller itself only owns the cadence
//! and the optional attempt bound.

use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// One classified poll attempt.
pub enum PollOutcome<T, E> {
    /// Not there yet; sleep one interval and poll again.
    Pending,
    Ready(T),
    /// Terminal failure; no further attempts.
    Failed(E),
}

#[derive(Error, Debug)]
pub enum PollError<E> {
    #[error(transparent)]
    Failed(E),

    #[error("gave up after {0} attempts")]
    Exhausted(u32),
}

#[derive(Debug, Clone)]
pub struct Poller {
    interval: Duration,
    max_attempts: Option<u32>,
}

impl Poller {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            max_attempts: None,
        }
    }

    /// Bound the number of attempts. Without this the poller runs until the
    /// classifier returns `Ready` or `Failed`.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Run `poll` until it classifies an attempt as `Ready` or `Failed`.
    /// The first attempt happens immediately; the interval sleep sits
    /// between attempts, not before the first.
    pub async fn run<T, E, F, Fut>(&self, mut poll: F) -> std::result::Result<T, PollError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = PollOutcome<T, E>>,
    {
        let mut attempts: u32 = 0;
        loop {
            match poll().await {
                PollOutcome::Ready(value) => return Ok(value),
                PollOutcome::Failed(error) => return Err(PollError::Failed(error)),
                PollOutcome::Pending => {}
            }

            attempts += 1;
            if let Some(max) = self.max_attempts
                && attempts >= max
            {
                return Err(PollError::Exhausted(max));
            }

            tokio::time::sleep(self.interval).await;
        }
    }
}
