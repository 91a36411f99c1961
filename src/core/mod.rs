pub mod backoff;
pub mod batch;
pub mod cache;
pub mod config;
pub mod planner;
pub mod tasks;

pub use backoff::{RetryDecision, RetryPolicy};
pub use batch::{BatchConfig, BatchProcessor, BatchTask, BoxFuture, TaskOutcome};
pub use cache::TripCache;
pub use config::PlannerConfig;
pub use planner::TripPlanner;
pub use tasks::{build_tasks, GenerationTask, TaskData, TaskKind};
