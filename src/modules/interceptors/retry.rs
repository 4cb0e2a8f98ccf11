//! Retry-on-transport-failure stage.
//!
//! Only I/O level failures are replayed. A response with an error status is
//! still a response and is returned as-is.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tokio::time::sleep;

use super::{Interceptor, Next};
use crate::modules::events::{EventDispatcher, RequestEvent, RetryEvent};
use crate::transport::{TransportError, WireRequest, WireResponse};

/// Attempt budget and backoff envelope, fixed for the lifetime of a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Never below 1.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Randomly shave up to half of each delay.
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(2),
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Re-attempts straight away, without any delay.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            jitter: false,
        }
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_backoff(mut self, base_delay: Duration, max_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self.max_delay = max_delay.max(base_delay);
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Exponential delay before the attempt following `failed_attempt`
    /// (1-based), capped at `max_delay`.
    pub fn backoff_for(&self, failed_attempt: u32) -> Duration {
        let exponent = failed_attempt.saturating_sub(1).min(16);
        let delay = self
            .base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay);

        if !self.jitter || delay.is_zero() {
            return delay;
        }

        let millis = delay.as_millis() as u64;
        let shave = rand::thread_rng().gen_range(0..=millis / 2);
        Duration::from_millis(millis - shave)
    }
}

/// Replays the identical request on retryable transport failures.
#[derive(Debug, Clone)]
pub struct RetryInterceptor {
    policy: RetryPolicy,
    events: Arc<EventDispatcher>,
}

impl RetryInterceptor {
    pub fn new(policy: RetryPolicy, events: Arc<EventDispatcher>) -> Self {
        Self { policy, events }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

#[async_trait]
impl Interceptor for RetryInterceptor {
    async fn intercept(
        &self,
        request: WireRequest,
        next: Next<'_>,
    ) -> Result<WireResponse, TransportError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            let error = match next.run(request.clone()).await {
                Ok(response) => return Ok(response),
                Err(error) => error,
            };

            if !error.is_retryable() || attempt >= max_attempts {
                if attempt > 1 {
                    log::warn!(
                        "giving up on {} {} after {} attempt(s): {}",
                        request.method,
                        request.url,
                        attempt,
                        error
                    );
                }
                return Err(error);
            }

            let delay = self.policy.backoff_for(attempt);
            self.events.dispatch(RequestEvent::Retry(RetryEvent {
                host: request.host().to_string(),
                attempt: attempt + 1,
                max_attempts,
                reason: error.to_string(),
                scheduled_after: delay,
                timestamp: chrono::Utc::now(),
            }));

            if !delay.is_zero() {
                sleep(delay).await;
            }
        }
    }
}
