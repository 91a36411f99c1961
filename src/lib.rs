//! trip-planner-rs: generate multi-day travel itineraries with a generative model
//!
//! A trip is split into one hotel task and one task per day. Tasks run in
//! sequence under an adaptive timeout, each through a timed generator with
//! its own retries, and the results are merged into a single [`TripPlan`].
//! An outer retry loop with per-error-kind backoff repeats the batch until
//! the plan is complete, caching every partial result along the way.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use trip_planner_rs::{Budget, TravelerGroup, TripPlanner, TripRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let planner = TripPlanner::from_env()?;
//!     let request = TripRequest::new(
//!         "Jaipur",
//!         2,
//!         Budget::Cheap,
//!         TravelerGroup::Friends,
//!         ["Shopping", "Food Exploration"],
//!     )?;
//!
//!     match planner.generate_trip_plan(request).await {
//!         Ok(plan) => println!("{}", serde_json::to_string_pretty(&plan)?),
//!         Err(err) => {
//!             if let Some(partial) = err.partial_plan() {
//!                 println!("partial plan with {} days", partial.day_count());
//!             }
//!             return Err(err.into());
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod error;
pub mod schemas;
pub mod services;
pub mod types;

pub use core::{
    BatchConfig, BatchProcessor, PlannerConfig, RetryDecision, RetryPolicy, TaskOutcome,
    TripCache, TripPlanner,
};
pub use error::{ErrorKind, Result, TripError};
pub use schemas::{extract_json, parse_payload, HotelsPayload, ResponseSchema};
pub use services::{
    ChatClient, ConnectivityCheck, GenerationRequest, HttpCheck, TextGenerator, TimedGenerator,
};
pub use types::{
    Activity, Budget, DayPlan, Destination, Hotel, TravelerGroup, TripForm, TripHandoff, TripPlan,
    TripRequest,
};

#[cfg(feature = "cli")]
pub mod cli;
