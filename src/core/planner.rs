use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use tokio::time::{sleep, timeout};
use tracing::{error, info, warn};

use super::{
    backoff::RetryDecision,
    batch::{BatchProcessor, TaskOutcome},
    cache::TripCache,
    config::PlannerConfig,
    tasks::{build_tasks, TaskData},
};
use crate::{
    error::{ErrorKind, Result, TripError},
    services::{
        chat_client::ChatClient,
        connectivity::{ConnectivityCheck, HttpCheck},
        generator::{TextGenerator, TimedGenerator},
    },
    types::{plan::TripPlan, request::TripRequest},
};

/// Generates complete trip plans with retries, caching and partial results.
///
/// ```rust,no_run
/// use trip_planner_rs::{Budget, TravelerGroup, TripPlanner, TripRequest};
///
/// # async fn run() -> trip_planner_rs::Result<()> {
/// let planner = TripPlanner::from_env()?;
/// let request = TripRequest::new("Goa", 3, Budget::Moderate, TravelerGroup::Couple, ["Beaches"])?;
/// let plan = planner.generate_trip_plan(request).await?;
/// println!("{} days planned", plan.day_count());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TripPlanner {
    generator: TimedGenerator,
    connectivity: Arc<dyn ConnectivityCheck>,
    cache: TripCache,
    config: PlannerConfig,
}

impl TripPlanner {
    pub fn new(backend: Arc<dyn TextGenerator>) -> Self {
        let config = PlannerConfig::default();
        Self {
            generator: TimedGenerator::new(backend).with_retry_delay(config.generation_retry_delay),
            connectivity: Arc::new(HttpCheck::default()),
            cache: TripCache::new(),
            config,
        }
    }

    /// Chat backend and config from the environment, checking the default URL.
    pub fn from_env() -> Result<Self> {
        let client = ChatClient::from_env()?;
        Ok(Self::new(Arc::new(client)).with_config(PlannerConfig::from_env()))
    }

    pub fn with_connectivity(mut self, connectivity: Arc<dyn ConnectivityCheck>) -> Self {
        self.connectivity = connectivity;
        self
    }

    pub fn with_cache(mut self, cache: TripCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_config(mut self, config: PlannerConfig) -> Self {
        self.generator = self
            .generator
            .with_retry_delay(config.generation_retry_delay);
        self.config = config;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.config.deadline = Some(deadline);
        self
    }

    pub fn cache(&self) -> &TripCache {
        &self.cache
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Produce a complete plan for `request`.
    ///
    /// A cached plan for the same fingerprint is returned without any
    /// generation. Otherwise up to `retry.max_attempts` batch attempts run;
    /// every non-empty result is cached, so a final error may still carry a
    /// partial plan via [`TripError::partial_plan`].
    pub async fn generate_trip_plan(&self, request: TripRequest) -> Result<TripPlan> {
        request.validate()?;
        let fingerprint = request.fingerprint();

        if let Some(plan) = self.cache.get(&fingerprint) {
            info!(
                target: "tripplanner::planner",
                fingerprint = %fingerprint,
                days = plan.day_count(),
                "returning cached plan"
            );
            return Ok(plan);
        }

        let attempts = AtomicUsize::new(0);
        match self.config.deadline {
            None => self.run(&request, &fingerprint, &attempts).await,
            Some(deadline) => {
                match timeout(deadline, self.run(&request, &fingerprint, &attempts)).await {
                    Ok(result) => result,
                    Err(_) => {
                        error!(
                            target: "tripplanner::planner",
                            fingerprint = %fingerprint,
                            deadline_ms = deadline.as_millis() as u64,
                            "deadline elapsed"
                        );
                        Err(self.exhausted(
                            ErrorKind::Timeout,
                            attempts.load(Ordering::SeqCst),
                            &fingerprint,
                        ))
                    }
                }
            }
        }
    }

    async fn run(
        &self,
        request: &TripRequest,
        fingerprint: &str,
        attempts: &AtomicUsize,
    ) -> Result<TripPlan> {
        let mut attempt = 1;

        loop {
            attempts.store(attempt, Ordering::SeqCst);
            info!(
                target: "tripplanner::planner",
                attempt,
                max_attempts = self.config.retry.max_attempts,
                destination = %request.destination().label(),
                days = request.days(),
                "starting generation attempt"
            );

            let err = match self.attempt(request, fingerprint).await {
                Ok(plan) => {
                    info!(
                        target: "tripplanner::planner",
                        attempt,
                        days = plan.day_count(),
                        hotels = plan.hotels.len(),
                        "trip plan complete"
                    );
                    return Ok(plan);
                }
                Err(err) => err,
            };

            let kind = err.kind();
            let online = if kind == ErrorKind::NetworkError {
                self.connectivity.is_online().await
            } else {
                true
            };

            match self.config.retry.decide(kind, attempt, online) {
                RetryDecision::Abort => {
                    error!(target: "tripplanner::planner", attempt, kind = %kind, "aborting: {}", err);
                    if kind == ErrorKind::ApiKey {
                        return Err(configuration_error(err));
                    }
                    return Err(err);
                }
                RetryDecision::Offline => {
                    error!(target: "tripplanner::planner", attempt, "device is offline");
                    return Err(TripError::Offline);
                }
                RetryDecision::GiveUp => {
                    error!(
                        target: "tripplanner::planner",
                        attempt,
                        kind = %kind,
                        "giving up: {}",
                        err
                    );
                    return Err(self.exhausted(kind, attempt, fingerprint));
                }
                RetryDecision::Retry(delay) => {
                    warn!(
                        target: "tripplanner::planner",
                        attempt,
                        kind = %kind,
                        delay_ms = delay.as_millis() as u64,
                        "attempt failed, retrying: {}",
                        err
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn attempt(&self, request: &TripRequest, fingerprint: &str) -> Result<TripPlan> {
        let tasks: Vec<_> = build_tasks(request, &self.config)
            .into_iter()
            .map(|task| task.into_batch_task(&self.generator, &self.config))
            .collect();
        let outcomes = BatchProcessor::new(self.config.batch.clone())
            .run(tasks)
            .await;

        let plan = assemble(outcomes)?;
        self.cache.insert(fingerprint, plan.clone());

        if plan.is_complete(request.days()) {
            Ok(plan)
        } else {
            Err(TripError::PartialSuccess {
                plan: Box::new(plan),
                requested: request.days(),
            })
        }
    }

    fn exhausted(&self, kind: ErrorKind, attempts: usize, fingerprint: &str) -> TripError {
        let partial = self.cache.get(fingerprint);
        let cached_days = partial.as_ref().map(TripPlan::day_count).unwrap_or(0);

        TripError::Exhausted {
            kind,
            attempts,
            message: kind.final_message(attempts, cached_days),
            partial: partial.map(Box::new),
        }
    }
}

/// Merge task outcomes into one plan, failing only when nothing succeeded.
fn assemble(outcomes: Vec<TaskOutcome<TaskData>>) -> Result<TripPlan> {
    let mut plan = TripPlan::default();
    let mut failures = Vec::new();

    for outcome in outcomes {
        match outcome.into_result() {
            Ok(TaskData::Hotels(hotels)) => plan.hotels = hotels,
            Ok(TaskData::Day(day)) => plan.itinerary.push(day),
            Err(err) => failures.push(err),
        }
    }

    if plan.is_empty() {
        return Err(batch_failure(failures));
    }
    Ok(plan)
}

// API key failures stay fatal and network failures keep the offline check
// reachable; anything else is a service outage.
fn batch_failure(mut failures: Vec<TripError>) -> TripError {
    if let Some(position) = failures
        .iter()
        .position(|err| err.kind() == ErrorKind::ApiKey)
    {
        return failures.swap_remove(position);
    }

    let total = failures.len();
    let all_network = total > 0
        && failures
            .iter()
            .all(|err| err.kind() == ErrorKind::NetworkError);

    match failures.pop() {
        Some(err) if all_network => err,
        _ => TripError::ServiceUnavailable(format!("All {} generation tasks failed", total)),
    }
}

/// Configuration error shown when the backend rejects the credentials.
fn configuration_error(err: TripError) -> TripError {
    let message = ErrorKind::ApiKey.final_message(0, 0);
    match err {
        TripError::ApiKey(detail) if !detail.trim().is_empty() && detail != message => {
            TripError::ApiKey(format!("{} ({})", message, detail.trim()))
        }
        _ => TripError::ApiKey(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::plan::{DayPlan, Hotel};

    fn day(n: u32) -> TaskOutcome<TaskData> {
        TaskOutcome::Success(TaskData::Day(DayPlan {
            day: n,
            ..DayPlan::default()
        }))
    }

    fn failed(err: TripError) -> TaskOutcome<TaskData> {
        TaskOutcome::Failure(err)
    }

    #[test]
    fn test_assemble_skips_failures() {
        let hotels = TaskOutcome::Success(TaskData::Hotels(vec![Hotel::default()]));
        let plan = assemble(vec![
            hotels,
            day(1),
            failed(TripError::Timeout(Duration::from_secs(20))),
            day(3),
        ])
        .unwrap();

        assert_eq!(plan.hotels.len(), 1);
        let days: Vec<u32> = plan.itinerary.iter().map(|d| d.day).collect();
        assert_eq!(days, vec![1, 3]);
        assert!(!plan.is_complete(3));
    }

    #[test]
    fn test_assemble_without_hotels() {
        let plan = assemble(vec![
            failed(TripError::Model("refused".to_string())),
            day(1),
        ])
        .unwrap();

        assert!(plan.hotels.is_empty());
        assert!(plan.is_complete(1));
    }

    #[test]
    fn test_zero_successes_is_service_unavailable() {
        let err = assemble(vec![
            failed(TripError::Timeout(Duration::from_secs(20))),
            failed(TripError::Model("refused".to_string())),
        ])
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ServiceUnavailable);
        assert!(err.to_string().contains("All 2 generation tasks failed"));
    }

    #[test]
    fn test_uniform_failures_are_service_unavailable() {
        let err = assemble(vec![
            failed(TripError::Timeout(Duration::from_secs(20))),
            failed(TripError::Timeout(Duration::from_secs(30))),
        ])
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ServiceUnavailable);

        let err = assemble(vec![
            failed(TripError::RateLimit("429".to_string())),
            failed(TripError::RateLimit("429".to_string())),
        ])
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ServiceUnavailable);
    }

    #[test]
    fn test_all_network_failures_stay_network() {
        let err = assemble(vec![
            failed(TripError::Network("reset".to_string())),
            failed(TripError::Network("refused".to_string())),
        ])
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NetworkError);
    }

    #[test]
    fn test_configuration_error_message() {
        let expected = ErrorKind::ApiKey.final_message(0, 0);

        let err = configuration_error(TripError::ApiKey("invalid api key".to_string()));
        let message = err.to_string();
        assert!(message.starts_with(&expected));
        assert!(message.ends_with("(invalid api key)"));

        let err = configuration_error(TripError::ApiKey(String::new()));
        assert_eq!(err.to_string(), expected);
    }

    #[test]
    fn test_api_key_failure_wins() {
        let err = assemble(vec![
            failed(TripError::Timeout(Duration::from_secs(20))),
            failed(TripError::ApiKey("bad key".to_string())),
            failed(TripError::Network("reset".to_string())),
        ])
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ApiKey);
    }
}
