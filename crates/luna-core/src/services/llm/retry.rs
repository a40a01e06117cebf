//! Exponential backoff for retryable chat model failures.

use std::future::Future;
use std::time::{Duration, Instant};

use backoff::{backoff::Backoff, ExponentialBackoff};

use super::errors::LlmError;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: usize,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
    pub jitter: bool,
    pub total_timeout: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            jitter: true,
            total_timeout: Duration::from_secs(120),
        }
    }
}

impl RetryConfig {
    pub fn new(max_attempts: usize) -> Self {
        Self {
            max_attempts,
            ..Default::default()
        }
    }

    pub fn with_total_timeout(mut self, timeout: Duration) -> Self {
        self.total_timeout = timeout;
        self
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn without_jitter(mut self) -> Self {
        self.jitter = false;
        self
    }
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// the attempt or time budget is spent. The last error is returned.
pub async fn with_retry<F, Fut, T>(config: RetryConfig, mut operation: F) -> Result<T, LlmError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LlmError>>,
{
    let mut backoff = ExponentialBackoff {
        initial_interval: config.initial_delay,
        max_interval: config.max_delay,
        multiplier: config.multiplier,
        max_elapsed_time: Some(config.total_timeout),
        ..Default::default()
    };
    if !config.jitter {
        backoff.randomization_factor = 0.0;
    }

    let started = Instant::now();
    let mut attempts = 0;

    loop {
        attempts += 1;
        let error = match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };

        if !error.is_retryable()
            || attempts >= config.max_attempts
            || started.elapsed() >= config.total_timeout
        {
            return Err(error);
        }

        let delay = error
            .retry_after_secs()
            .map(Duration::from_secs)
            .or_else(|| backoff.next_backoff())
            .unwrap_or(config.max_delay)
            .min(config.max_delay);

        tracing::warn!(
            attempt = attempts,
            error = %error,
            delay_ms = delay.as_millis() as u64,
            "Retrying chat model request"
        );

        tokio::time::sleep(delay).await;
    }
}
