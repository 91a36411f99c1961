use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::time::{sleep, timeout};
use tracing::debug;

use crate::error::{Result, TripError};

/// One call to the generative backend.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            temperature: 0.7,
            max_output_tokens: 8192,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }
}

/// Generative backend producing free-form text.
#[async_trait]
pub trait TextGenerator: Send + Sync + std::fmt::Debug {
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;
}

#[async_trait]
impl<G: TextGenerator + ?Sized> TextGenerator for Arc<G> {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        (**self).generate(request).await
    }
}

/// Runs a backend call under a per-attempt timeout with linear backoff.
#[derive(Debug, Clone)]
pub struct TimedGenerator {
    backend: Arc<dyn TextGenerator>,
    retry_delay: Duration,
}

impl TimedGenerator {
    pub fn new(backend: Arc<dyn TextGenerator>) -> Self {
        Self {
            backend,
            retry_delay: Duration::from_millis(1000),
        }
    }

    /// Base of the linear backoff; attempt `n` waits `retry_delay * n`.
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub async fn generate(
        &self,
        request: &GenerationRequest,
        per_attempt_timeout: Duration,
        max_attempts: usize,
    ) -> Result<String> {
        let max_attempts = max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let error = match timeout(per_attempt_timeout, self.backend.generate(request)).await {
                Ok(Ok(text)) if !text.trim().is_empty() => return Ok(text),
                Ok(Ok(_)) => TripError::InvalidResponse("model returned empty text".to_string()),
                Ok(Err(err)) => err,
                Err(_) => TripError::Timeout(per_attempt_timeout),
            };

            if attempt >= max_attempts {
                return Err(error);
            }

            let delay = self.retry_delay * attempt as u32;
            debug!(
                target: "tripplanner::generator",
                attempt,
                max_attempts,
                kind = %error.kind(),
                delay_ms = delay.as_millis() as u64,
                "generation attempt failed: {}",
                error
            );
            sleep(delay).await;
            attempt += 1;
        }
    }
}
