use std::{fmt, time::Duration};

use thiserror::Error;

use crate::types::plan::TripPlan;

/// Classification of every failure the planner can observe.
///
/// The first eight variants drive the retry state machine. `InvalidRequest`
/// and `Offline` are terminal and never enter it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ApiKey,
    Timeout,
    InvalidResponse,
    RateLimit,
    NetworkError,
    ModelError,
    PartialSuccess,
    ServiceUnavailable,
    InvalidRequest,
    Offline,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ApiKey => "API_KEY_ERROR",
            ErrorKind::Timeout => "TIMEOUT",
            ErrorKind::InvalidResponse => "INVALID_RESPONSE",
            ErrorKind::RateLimit => "RATE_LIMIT",
            ErrorKind::NetworkError => "NETWORK_ERROR",
            ErrorKind::ModelError => "MODEL_ERROR",
            ErrorKind::PartialSuccess => "PARTIAL_SUCCESS",
            ErrorKind::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            ErrorKind::InvalidRequest => "INVALID_REQUEST",
            ErrorKind::Offline => "OFFLINE",
        }
    }

    /// Whether the outer loop may spend another attempt on this kind.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            ErrorKind::ApiKey | ErrorKind::InvalidRequest | ErrorKind::Offline
        )
    }

    /// User-facing message once `attempts` attempts failed with this kind.
    pub fn final_message(&self, attempts: usize, cached_days: usize) -> String {
        match self {
            ErrorKind::Timeout => "The request is taking longer than expected. Please try a shorter trip (2-3 days) or fewer activities.".to_string(),
            ErrorKind::RateLimit => "We've hit our rate limit. Please wait 5-10 minutes before trying again.".to_string(),
            ErrorKind::InvalidResponse => "We received an invalid response. Try simplifying your requirements or selecting fewer activities.".to_string(),
            ErrorKind::NetworkError => "We're having trouble connecting to the service. Please check your internet connection and try again.".to_string(),
            ErrorKind::ModelError => "The AI model is having trouble processing your request. Try simpler requirements or a different destination.".to_string(),
            ErrorKind::PartialSuccess => format!(
                "We could only generate a partial trip plan. We've saved what we could generate ({} days). View the partial plan or try again for a complete plan.",
                cached_days
            ),
            ErrorKind::ApiKey => "Please configure your API key in the OPENAI_API_KEY environment variable (or a .env file)".to_string(),
            ErrorKind::Offline => "Please check your internet connection and try again.".to_string(),
            ErrorKind::InvalidRequest => "The trip request is invalid. Please review your selections.".to_string(),
            ErrorKind::ServiceUnavailable => format!(
                "The service is temporarily unavailable. We tried {} times but couldn't generate your trip plan. Please wait 5-10 minutes and try again.",
                attempts
            ),
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main error type for trip generation
#[derive(Error, Debug)]
pub enum TripError {
    #[error("{0}")]
    ApiKey(String),

    #[error("Invalid trip request: {0}")]
    InvalidRequest(String),

    #[error("Generation timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Partial trip plan: {} of {requested} days generated", .plan.day_count())]
    PartialSuccess { plan: Box<TripPlan>, requested: u32 },

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Please check your internet connection and try again.")]
    Offline,

    /// Final, user-facing error raised once the retry budget is spent.
    #[error("{message}")]
    Exhausted {
        kind: ErrorKind,
        attempts: usize,
        message: String,
        partial: Option<Box<TripPlan>>,
    },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, TripError>;

impl TripError {
    /// Classify this error. A pure match, no message inspection.
    pub fn kind(&self) -> ErrorKind {
        match self {
            TripError::ApiKey(_) => ErrorKind::ApiKey,
            TripError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            TripError::Timeout(_) => ErrorKind::Timeout,
            TripError::InvalidResponse(_) => ErrorKind::InvalidResponse,
            TripError::RateLimit(_) => ErrorKind::RateLimit,
            TripError::Network(_) => ErrorKind::NetworkError,
            TripError::Model(_) => ErrorKind::ModelError,
            TripError::PartialSuccess { .. } => ErrorKind::PartialSuccess,
            TripError::ServiceUnavailable(_) => ErrorKind::ServiceUnavailable,
            TripError::Offline => ErrorKind::Offline,
            TripError::Exhausted { kind, .. } => *kind,
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            TripError::Exhausted { .. } => false,
            other => other.kind().is_retryable(),
        }
    }

    /// Get the error code for structured responses
    pub fn error_code(&self) -> &'static str {
        self.kind().as_str()
    }

    /// The partial plan carried by this error, if any.
    pub fn partial_plan(&self) -> Option<&TripPlan> {
        match self {
            TripError::PartialSuccess { plan, .. } => Some(plan),
            TripError::Exhausted { partial, .. } => partial.as_deref(),
            _ => None,
        }
    }

    /// Convert to a structured error payload
    pub fn to_error_payload(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
                "retryable": self.is_retryable()
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_is_pure_match() {
        assert_eq!(
            TripError::Timeout(Duration::from_secs(1)).kind(),
            ErrorKind::Timeout
        );
        assert_eq!(
            TripError::Network("connection reset".to_string()).kind(),
            ErrorKind::NetworkError
        );
        // message text never affects classification
        assert_eq!(
            TripError::Model("API key rate network".to_string()).kind(),
            ErrorKind::ModelError
        );
    }

    #[test]
    fn test_api_key_not_retryable() {
        let err = TripError::ApiKey("missing".to_string());
        assert!(!err.is_retryable());
        assert_eq!(err.error_code(), "API_KEY_ERROR");

        let payload = err.to_error_payload();
        assert_eq!(payload["error"]["code"], "API_KEY_ERROR");
        assert_eq!(payload["error"]["retryable"], false);
    }

    #[test]
    fn test_exhausted_keeps_kind_and_message() {
        let err = TripError::Exhausted {
            kind: ErrorKind::RateLimit,
            attempts: 7,
            message: "slow down".to_string(),
            partial: None,
        };
        assert_eq!(err.kind(), ErrorKind::RateLimit);
        assert_eq!(err.to_string(), "slow down");
        assert!(!err.is_retryable());
        assert!(err.partial_plan().is_none());
    }

    #[test]
    fn test_final_messages_are_distinct() {
        let kinds = [
            ErrorKind::Timeout,
            ErrorKind::RateLimit,
            ErrorKind::InvalidResponse,
            ErrorKind::NetworkError,
            ErrorKind::ModelError,
            ErrorKind::PartialSuccess,
            ErrorKind::ServiceUnavailable,
        ];
        let messages: std::collections::HashSet<String> =
            kinds.iter().map(|kind| kind.final_message(7, 2)).collect();
        assert_eq!(messages.len(), kinds.len());

        assert!(ErrorKind::PartialSuccess
            .final_message(7, 2)
            .contains("(2 days)"));
        assert!(ErrorKind::ServiceUnavailable
            .final_message(7, 0)
            .contains("tried 7 times"));
    }

    #[test]
    fn test_serde_failure_is_invalid_response() {
        use crate::schemas::{parse_payload, HotelsPayload};

        let err = parse_payload::<HotelsPayload>(serde_json::json!({ "hotels": 42 })).unwrap_err();
        assert!(matches!(err, TripError::InvalidResponse(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_partial_success_display() {
        let err = TripError::PartialSuccess {
            plan: Box::new(TripPlan::default()),
            requested: 3,
        };
        assert_eq!(err.to_string(), "Partial trip plan: 0 of 3 days generated");
        assert!(err.partial_plan().is_some());
    }
}
