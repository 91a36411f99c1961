use schemars::{schema_for, JsonSchema};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;

use crate::{
    error::{Result, TripError},
    types::plan::{DayPlan, Hotel},
};

/// A response shape the model is asked to produce.
pub trait ResponseSchema: DeserializeOwned + JsonSchema + Send + 'static {
    /// Name used in error messages
    const NAME: &'static str;
    /// Keys that must be present and truthy in the raw JSON
    const REQUIRED_KEYS: &'static [&'static str];

    /// JSON schema of the response type.
    fn schema_json() -> Value {
        serde_json::to_value(schema_for!(Self)).unwrap_or_default()
    }
}

/// Response of the hotel task.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct HotelsPayload {
    /// Two or three hotels matching the budget
    #[serde(default)]
    pub hotels: Vec<Hotel>,
}

impl ResponseSchema for HotelsPayload {
    const NAME: &'static str = "HotelsPayload";
    const REQUIRED_KEYS: &'static [&'static str] = &["hotels"];
}

impl ResponseSchema for DayPlan {
    const NAME: &'static str = "DayPlan";
    const REQUIRED_KEYS: &'static [&'static str] = &["activities"];
}

/// Convert an extracted JSON object into its typed payload.
pub fn parse_payload<T: ResponseSchema>(payload: Value) -> Result<T> {
    serde_path_to_error::deserialize(payload).map_err(|err| {
        let path = err.path().to_string();
        let location = if path.is_empty() || path == "." {
            "<root>".to_string()
        } else {
            path
        };
        TripError::InvalidResponse(format!(
            "failed to deserialize `{}` at {}: {}",
            T::NAME,
            location,
            err.inner()
        ))
    })
}

/// Compact schema text for embedding in a prompt.
pub fn prompt_schema<T: ResponseSchema>() -> String {
    let mut schema = T::schema_json();
    if let Some(object) = schema.as_object_mut() {
        object.remove("$schema");
    }
    schema.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_schema_lists_fields() {
        let schema = DayPlan::schema_json();
        assert_eq!(schema["type"], "object");
        let props = schema["properties"].as_object().unwrap();
        assert!(props.contains_key("activities"));
        assert!(props.contains_key("bestTimeToVisit"));
    }

    #[test]
    fn test_prompt_schema_is_compact() {
        let text = prompt_schema::<HotelsPayload>();
        assert!(text.contains("hotels"));
        assert!(text.contains("hotelName"));
        assert!(!text.contains("$schema"));
        assert!(!text.contains('\n'));
    }

    #[test]
    fn test_parse_payload_reports_path() {
        let err = parse_payload::<HotelsPayload>(json!({ "hotels": "not a list" })).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidResponse);
        assert!(err.to_string().contains("`HotelsPayload` at hotels"));
    }

    #[test]
    fn test_parse_day_payload() {
        let day: DayPlan = parse_payload(json!({
            "day": 1,
            "theme": "Old town",
            "activities": [{ "time": "8 AM", "placeName": "Cafe", "tips": "Go early" }]
        }))
        .unwrap();
        assert_eq!(day.theme.as_deref(), Some("Old town"));
        assert_eq!(day.activities[0].tips, "Go early");
    }
}
