use std::time::Duration;

use crate::error::ErrorKind;

/// Outer retry budget and per-kind exponential backoff.
///
/// The delay before attempt `n + 1` is
/// `base_delay * 2^(n - 1) * multiplier(kind)`, stretched by a deterministic
/// jitter of `jitter_base + jitter_step * n`.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_delay: Duration,
    pub jitter_base: f64,
    pub jitter_step: f64,
}

/// What the outer loop does after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Stop now and surface the error as-is.
    Abort,
    /// The device itself has no connectivity.
    Offline,
    /// The attempt budget is spent.
    GiveUp,
    Retry(Duration),
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 7,
            base_delay: Duration::from_millis(3000),
            jitter_base: 0.10,
            jitter_step: 0.05,
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn multiplier(kind: ErrorKind) -> f64 {
        match kind {
            ErrorKind::RateLimit => 3.0,
            ErrorKind::ServiceUnavailable => 2.5,
            ErrorKind::ModelError => 2.0,
            ErrorKind::NetworkError => 1.5,
            _ => 1.0,
        }
    }

    /// Wait before the attempt following failed attempt `attempt` (1-based).
    pub fn delay_for(&self, kind: ErrorKind, attempt: usize) -> Duration {
        let attempt = attempt.max(1);
        let exponent = i32::try_from(attempt - 1).unwrap_or(i32::MAX);
        let backoff_ms =
            self.base_delay.as_millis() as f64 * 2f64.powi(exponent) * Self::multiplier(kind);
        let jitter = self.jitter_base + self.jitter_step * attempt as f64;
        let total_ms = backoff_ms * (1.0 + jitter);

        if total_ms.is_finite() {
            Duration::from_millis(total_ms.round() as u64)
        } else {
            Duration::MAX
        }
    }

    /// Decide the next step after attempt `attempt` failed with `kind`.
    ///
    /// `online` is only consulted for [`ErrorKind::NetworkError`].
    pub fn decide(&self, kind: ErrorKind, attempt: usize, online: bool) -> RetryDecision {
        if !kind.is_retryable() {
            return RetryDecision::Abort;
        }
        if kind == ErrorKind::NetworkError && !online {
            return RetryDecision::Offline;
        }
        if attempt >= self.max_attempts {
            return RetryDecision::GiveUp;
        }
        RetryDecision::Retry(self.delay_for(kind, attempt))
    }
}
