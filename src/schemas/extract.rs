use serde_json::Value;

use crate::error::{Result, TripError};

/// Pull the JSON object out of free-form model output.
///
/// Code fences are stripped, then everything from the first `{` to the last
/// `}` is parsed. Every key in `required_keys` must be present and truthy.
pub fn extract_json(text: &str, required_keys: &[&str]) -> Result<Value> {
    let cleaned = text.replace("```json", "").replace("```", "");
    let cleaned = cleaned.trim();

    let (start, end) = match (cleaned.find('{'), cleaned.rfind('}')) {
        (Some(start), Some(end)) if end > start => (start, end),
        _ => {
            return Err(TripError::InvalidResponse(
                "No valid JSON found in response".to_string(),
            ))
        }
    };

    let value: Value = serde_json::from_str(&cleaned[start..=end])
        .map_err(|err| TripError::InvalidResponse(format!("Malformed JSON in response: {}", err)))?;

    let missing: Vec<&str> = required_keys
        .iter()
        .copied()
        .filter(|key| !value.get(*key).is_some_and(is_truthy))
        .collect();

    if !missing.is_empty() {
        return Err(TripError::InvalidResponse(format!(
            "Missing required keys: {}",
            missing.join(", ")
        )));
    }

    Ok(value)
}

// JavaScript truthiness: containers are present even when empty.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
