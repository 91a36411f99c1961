use std::time::Duration;

use tracing::debug;

use super::{
    batch::{BatchTask, BoxFuture},
    config::PlannerConfig,
};
use crate::{
    error::{Result, TripError},
    schemas::{extract_json, parse_payload, HotelsPayload, ResponseSchema},
    services::{
        generator::{GenerationRequest, TimedGenerator},
        prompts::{day_prompt, hotel_prompt},
    },
    types::{
        plan::{DayPlan, Hotel},
        request::TripRequest,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Hotels,
    /// 1-based day number.
    Day(u32),
}

/// Parsed result of one generation task.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskData {
    Hotels(Vec<Hotel>),
    Day(DayPlan),
}

/// One prompt to send through the timed generator.
#[derive(Debug, Clone)]
pub struct GenerationTask {
    pub kind: TaskKind,
    pub prompt: String,
    pub required_keys: &'static [&'static str],
    pub timeout: Duration,
    pub max_attempts: usize,
}

/// Hotel task first, then one task per day in order.
pub fn build_tasks(request: &TripRequest, config: &PlannerConfig) -> Vec<GenerationTask> {
    let hotels = GenerationTask {
        kind: TaskKind::Hotels,
        prompt: hotel_prompt(request),
        required_keys: HotelsPayload::REQUIRED_KEYS,
        timeout: config.generation_timeout,
        max_attempts: config.generation_attempts,
    };

    std::iter::once(hotels)
        .chain((1..=request.days()).map(|day| GenerationTask {
            kind: TaskKind::Day(day),
            prompt: day_prompt(request, day),
            required_keys: DayPlan::REQUIRED_KEYS,
            timeout: config.generation_timeout,
            max_attempts: config.generation_attempts,
        }))
        .collect()
}

impl GenerationTask {
    pub async fn execute(self, generator: &TimedGenerator, config: &PlannerConfig) -> Result<TaskData> {
        let request = GenerationRequest::new(self.prompt, config.model.clone())
            .with_temperature(config.temperature)
            .with_max_output_tokens(config.max_output_tokens);

        let text = generator
            .generate(&request, self.timeout, self.max_attempts)
            .await?;
        let payload = extract_json(&text, self.required_keys)?;

        let data = match self.kind {
            TaskKind::Hotels => TaskData::Hotels(parse_payload::<HotelsPayload>(payload)?.hotels),
            TaskKind::Day(day) => {
                let mut plan = parse_payload::<DayPlan>(payload)?;
                if plan.activities.is_empty() {
                    return Err(TripError::InvalidResponse(format!(
                        "Day {} plan has no activities",
                        day
                    )));
                }
                // the model's own numbering is not trusted
                plan.day = day;
                TaskData::Day(plan)
            }
        };
        debug!(target: "tripplanner::planner", task = ?self.kind, "task produced data");
        Ok(data)
    }

    pub fn into_batch_task<'a>(
        self,
        generator: &'a TimedGenerator,
        config: &'a PlannerConfig,
    ) -> BatchTask<'a, TaskData> {
        Box::new(move || -> BoxFuture<'a, Result<TaskData>> {
            Box::pin(self.execute(generator, config))
        })
    }
}
