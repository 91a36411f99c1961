use std::{future::Future, pin::Pin, time::Duration};

use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use crate::error::{Result, TripError};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A deferred unit of work. Nothing runs until the processor calls it.
pub type BatchTask<'a, T> = Box<dyn FnOnce() -> BoxFuture<'a, Result<T>> + Send + 'a>;

/// Result of one task, in the same position as the task itself.
#[derive(Debug)]
pub enum TaskOutcome<T> {
    Success(T),
    Failure(TripError),
}

impl<T> TaskOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Success(_))
    }

    pub fn error(&self) -> Option<&TripError> {
        match self {
            TaskOutcome::Failure(err) => Some(err),
            TaskOutcome::Success(_) => None,
        }
    }

    pub fn into_result(self) -> Result<T> {
        match self {
            TaskOutcome::Success(value) => Ok(value),
            TaskOutcome::Failure(err) => Err(err),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchConfig {
    pub initial_timeout: Duration,
    pub max_timeout: Duration,
    /// Applied to the current timeout after every failed task.
    pub growth_factor: f64,
    pub failure_delay: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            initial_timeout: Duration::from_millis(20_000),
            max_timeout: Duration::from_millis(60_000),
            growth_factor: 1.5,
            failure_delay: Duration::from_millis(1000),
        }
    }
}

impl BatchConfig {
    pub fn new(initial_timeout: Duration, max_timeout: Duration) -> Self {
        Self {
            initial_timeout,
            max_timeout,
            ..Self::default()
        }
    }

    fn grow(&self, current: Duration) -> Duration {
        let grown = current.mul_f64(self.growth_factor.max(1.0));
        grown.min(self.max_timeout).max(current)
    }
}

/// Runs tasks one after another under an adaptive timeout.
///
/// Every task produces exactly one outcome. A failure grows the timeout
/// toward `max_timeout` and pauses for `failure_delay`; a success resets it
/// to `initial_timeout`.
#[derive(Debug, Clone, Default)]
pub struct BatchProcessor {
    config: BatchConfig,
}

impl BatchProcessor {
    pub fn new(config: BatchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    pub async fn run<'a, T>(&self, tasks: Vec<BatchTask<'a, T>>) -> Vec<TaskOutcome<T>> {
        let total = tasks.len();
        let mut outcomes = Vec::with_capacity(total);
        let mut current = self.config.initial_timeout.min(self.config.max_timeout);

        for (index, task) in tasks.into_iter().enumerate() {
            debug!(
                target: "tripplanner::batch",
                task = index,
                total,
                timeout_ms = current.as_millis() as u64,
                "running task"
            );

            let result = match timeout(current, task()).await {
                Ok(result) => result,
                Err(_) => Err(TripError::Timeout(current)),
            };

            match result {
                Ok(value) => {
                    outcomes.push(TaskOutcome::Success(value));
                    current = self.config.initial_timeout.min(self.config.max_timeout);
                }
                Err(err) => {
                    warn!(
                        target: "tripplanner::batch",
                        task = index,
                        total,
                        kind = %err.kind(),
                        "task failed: {}",
                        err
                    );
                    outcomes.push(TaskOutcome::Failure(err));
                    current = self.config.grow(current);
                    sleep(self.config.failure_delay).await;
                }
            }
        }

        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use tokio::time::Instant;

    fn task<'a, F>(future: F) -> BatchTask<'a, u32>
    where
        F: Future<Output = Result<u32>> + Send + 'a,
    {
        Box::new(move || -> BoxFuture<'a, Result<u32>> { Box::pin(future) })
    }

    fn after(delay: Duration, value: u32) -> BatchTask<'static, u32> {
        task(async move {
            sleep(delay).await;
            Ok(value)
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_outcomes_keep_positions() {
        let processor = BatchProcessor::default();
        let start = Instant::now();

        let outcomes = processor
            .run(vec![
                task(async { Ok(1) }),
                task(async { Err(TripError::Model("refused".to_string())) }),
                task(async { Ok(3) }),
            ])
            .await;

        assert_eq!(outcomes.len(), 3);
        assert!(matches!(outcomes[0], TaskOutcome::Success(1)));
        assert_eq!(outcomes[1].error().unwrap().kind(), ErrorKind::ModelError);
        assert!(matches!(outcomes[2], TaskOutcome::Success(3)));
        // one failure pause
        assert_eq!(start.elapsed(), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_grows_after_failure() {
        let processor = BatchProcessor::default();

        // 25s misses the 20s window but fits the grown 30s one
        let outcomes = processor
            .run(vec![
                after(Duration::from_secs(25), 1),
                after(Duration::from_secs(25), 2),
            ])
            .await;

        match outcomes[0].error() {
            Some(TripError::Timeout(limit)) => assert_eq!(*limit, Duration::from_secs(20)),
            other => panic!("expected timeout, got {:?}", other),
        }
        assert!(matches!(outcomes[1], TaskOutcome::Success(2)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_resets_after_success() {
        let processor = BatchProcessor::default();

        let outcomes = processor
            .run(vec![
                after(Duration::from_secs(25), 1),
                after(Duration::from_secs(1), 2),
                after(Duration::from_secs(25), 3),
            ])
            .await;

        assert!(!outcomes[0].is_success());
        assert!(outcomes[1].is_success());
        assert!(!outcomes[2].is_success());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_capped() {
        let processor = BatchProcessor::new(BatchConfig::new(
            Duration::from_secs(20),
            Duration::from_secs(40),
        ));
        let never = || task(std::future::pending());

        let outcomes = processor.run(vec![never(), never(), never()]).await;

        let limits: Vec<Duration> = outcomes
            .iter()
            .map(|outcome| match outcome.error() {
                Some(TripError::Timeout(limit)) => *limit,
                other => panic!("expected timeout, got {:?}", other),
            })
            .collect();
        assert_eq!(
            limits,
            vec![
                Duration::from_secs(20),
                Duration::from_secs(30),
                Duration::from_secs(40)
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_batch() {
        let outcomes = BatchProcessor::default().run::<u32>(Vec::new()).await;
        assert!(outcomes.is_empty());
    }
}
