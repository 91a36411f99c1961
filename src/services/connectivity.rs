use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

pub const DEFAULT_CHECK_URL: &str = "https://www.google.com/generate_204";

/// Reachability check used to tell "offline" apart from "service down".
#[async_trait]
pub trait ConnectivityCheck: Send + Sync + std::fmt::Debug {
    async fn is_online(&self) -> bool;
}

/// Checks with an HTTP `HEAD` request. Any response counts as online.
#[derive(Debug, Clone)]
pub struct HttpCheck {
    url: String,
    cutoff: Duration,
    http: reqwest::Client,
}

impl HttpCheck {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            cutoff: Duration::from_secs(5),
            http: reqwest::Client::new(),
        }
    }

    pub fn with_cutoff(mut self, cutoff: Duration) -> Self {
        self.cutoff = cutoff;
        self
    }
}

impl Default for HttpCheck {
    fn default() -> Self {
        Self::new(DEFAULT_CHECK_URL)
    }
}

#[async_trait]
impl ConnectivityCheck for HttpCheck {
    async fn is_online(&self) -> bool {
        let result = self
            .http
            .head(&self.url)
            .timeout(self.cutoff)
            .send()
            .await;

        match result {
            Ok(response) => {
                debug!(
                    target: "tripplanner::connectivity",
                    url = %self.url,
                    status = %response.status(),
                    "connectivity check answered"
                );
                true
            }
            Err(err) => {
                debug!(
                    target: "tripplanner::connectivity",
                    url = %self.url,
                    "connectivity check failed: {}",
                    err
                );
                false
            }
        }
    }
}
