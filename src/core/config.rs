use std::time::Duration;

use super::{backoff::RetryPolicy, batch::BatchConfig};
use crate::services::chat_client::DEFAULT_MODEL;

/// Tuning knobs for a [`TripPlanner`](super::TripPlanner).
#[derive(Debug, Clone, PartialEq)]
pub struct PlannerConfig {
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    /// Per-call cutoff inside the timed generator.
    pub generation_timeout: Duration,
    pub generation_attempts: usize,
    pub generation_retry_delay: Duration,
    pub batch: BatchConfig,
    pub retry: RetryPolicy,
    /// Wall-clock cap on a whole `generate_trip_plan` call.
    pub deadline: Option<Duration>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.7,
            max_output_tokens: 8192,
            generation_timeout: Duration::from_millis(60_000),
            generation_attempts: 3,
            generation_retry_delay: Duration::from_millis(1000),
            batch: BatchConfig::default(),
            retry: RetryPolicy::default(),
            deadline: None,
        }
    }
}

impl PlannerConfig {
    /// Defaults, with the model overridden by `TRIP_PLANNER_MODEL` and the
    /// deadline by `TRIP_PLANNER_DEADLINE_SECS` when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(model) = std::env::var("TRIP_PLANNER_MODEL") {
            if !model.trim().is_empty() {
                config.model = model;
            }
        }
        if let Some(seconds) = std::env::var("TRIP_PLANNER_DEADLINE_SECS")
            .ok()
            .and_then(|value| value.trim().parse::<u64>().ok())
        {
            config.deadline = Some(Duration::from_secs(seconds));
        }
        config
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_batch(mut self, batch: BatchConfig) -> Self {
        self.batch = batch;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PlannerConfig::default();

        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.generation_timeout, Duration::from_secs(60));
        assert_eq!(config.generation_attempts, 3);
        assert_eq!(config.batch.initial_timeout, Duration::from_secs(20));
        assert_eq!(config.batch.max_timeout, Duration::from_secs(60));
        assert_eq!(config.retry.max_attempts, 7);
        assert!(config.deadline.is_none());
    }

    #[test]
    fn test_builders() {
        let config = PlannerConfig::default()
            .with_model("openai/gpt-4.1-mini")
            .with_deadline(Duration::from_secs(90))
            .with_retry(RetryPolicy::default().with_max_attempts(2));

        assert_eq!(config.model, "openai/gpt-4.1-mini");
        assert_eq!(config.deadline, Some(Duration::from_secs(90)));
        assert_eq!(config.retry.max_attempts, 2);
    }
}
