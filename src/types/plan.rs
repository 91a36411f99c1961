use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::request::TripRequest;

/// Assembled trip returned by the planner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TripPlan {
    /// Suggested hotels, possibly empty when the hotel task failed
    #[serde(default)]
    pub hotels: Vec<Hotel>,
    /// Day plans ordered by day; may be shorter than the requested length
    #[serde(default)]
    pub itinerary: Vec<DayPlan>,
}

impl TripPlan {
    pub fn new(hotels: Vec<Hotel>, itinerary: Vec<DayPlan>) -> Self {
        Self { hotels, itinerary }
    }

    pub fn day_count(&self) -> usize {
        self.itinerary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hotels.is_empty() && self.itinerary.is_empty()
    }

    /// True when every requested day is present.
    pub fn is_complete(&self, days: u32) -> bool {
        self.itinerary.len() >= days as usize
    }

    pub fn activity_count(&self) -> usize {
        self.itinerary.iter().map(|day| day.activities.len()).sum()
    }
}

/// A hotel suggestion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Hotel {
    /// Actual hotel name
    #[serde(default, deserialize_with = "lenient_string")]
    #[schemars(with = "String")]
    pub hotel_name: String,
    /// Complete street address
    #[serde(default, deserialize_with = "lenient_string")]
    #[schemars(with = "String")]
    pub hotel_address: String,
    /// Price per night
    #[serde(default, deserialize_with = "lenient_string")]
    #[schemars(with = "String")]
    pub price: String,
    /// Guest rating, e.g. "4.5"
    #[serde(default, deserialize_with = "lenient_string")]
    #[schemars(with = "String")]
    pub rating: String,
    /// Brief description
    #[serde(default, deserialize_with = "lenient_string")]
    #[schemars(with = "String")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotel_image_url: Option<String>,
}

/// Plan for a single day of the trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DayPlan {
    /// 1-based day number
    #[serde(default, deserialize_with = "lenient_day")]
    #[schemars(with = "u32")]
    pub day: u32,
    /// Short theme for the day
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    /// Best time of day to follow this plan
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_time_to_visit: Option<String>,
    /// Activities in chronological order, including meals
    #[serde(default)]
    pub activities: Vec<Activity>,
}

/// One stop within a day plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    /// Time slot
    #[serde(default, deserialize_with = "lenient_string")]
    #[schemars(with = "String")]
    pub time: String,
    /// Specific place name
    #[serde(default, deserialize_with = "lenient_string")]
    #[schemars(with = "String")]
    pub place_name: String,
    /// Details about the place
    #[serde(default, deserialize_with = "lenient_string")]
    #[schemars(with = "String")]
    pub place_details: String,
    /// Cost details
    #[serde(default, deserialize_with = "lenient_string")]
    #[schemars(with = "String")]
    pub ticket_pricing: String,
    /// Travel duration from the previous stop
    #[serde(default, deserialize_with = "lenient_string")]
    #[schemars(with = "String")]
    pub time_to_travel: String,
    /// Practical tip
    #[serde(default, deserialize_with = "lenient_string")]
    #[schemars(with = "String")]
    pub tips: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_image_url: Option<String>,
}

/// Document handed to a display surface once a plan is generated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripHandoff {
    pub trip_data: TripPlan,
    pub trip_form_data: TripRequest,
    pub trip_generated_at: DateTime<Utc>,
}

impl TripHandoff {
    pub fn new(trip_data: TripPlan, trip_form_data: TripRequest) -> Self {
        Self {
            trip_data,
            trip_form_data,
            trip_generated_at: Utc::now(),
        }
    }
}

// Models return numbers where strings are asked for and vice versa.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text,
        Some(other) => other.to_string(),
    })
}

fn lenient_day<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(number)) => number.as_u64().map(|n| n as u32).unwrap_or_default(),
        Some(Value::String(text)) => text
            .chars()
            .filter(|c| c.is_ascii_digit())
            .collect::<String>()
            .parse()
            .unwrap_or_default(),
        _ => 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_hotel_accepts_numeric_fields() {
        let hotel: Hotel = serde_json::from_value(json!({
            "hotelName": "Taj Fort Aguada",
            "hotelAddress": "Sinquerim, Goa",
            "price": 12000,
            "rating": 4.6,
            "description": null
        }))
        .unwrap();

        assert_eq!(hotel.price, "12000");
        assert_eq!(hotel.rating, "4.6");
        assert_eq!(hotel.description, "");
    }

    #[test]
    fn test_day_index_from_label() {
        let day: DayPlan = serde_json::from_value(json!({
            "day": "Day 2",
            "activities": [{ "time": "9:00 AM", "placeName": "Baga Beach" }]
        }))
        .unwrap();

        assert_eq!(day.day, 2);
        assert_eq!(day.activities[0].place_name, "Baga Beach");
        assert!(day.theme.is_none());
    }

    #[test]
    fn test_plan_counts() {
        let plan = TripPlan::new(
            vec![Hotel::default()],
            vec![
                DayPlan {
                    day: 1,
                    activities: vec![Activity::default(), Activity::default()],
                    ..Default::default()
                },
                DayPlan {
                    day: 2,
                    activities: vec![Activity::default()],
                    ..Default::default()
                },
            ],
        );

        assert_eq!(plan.day_count(), 2);
        assert_eq!(plan.activity_count(), 3);
        assert!(plan.is_complete(2));
        assert!(!plan.is_complete(3));
        assert!(!plan.is_empty());
        assert!(TripPlan::default().is_empty());
    }

    #[test]
    fn test_plan_serializes_camel_case() {
        let plan = TripPlan::new(
            vec![Hotel {
                hotel_name: "Hotel".to_string(),
                ..Default::default()
            }],
            vec![DayPlan {
                day: 1,
                best_time_to_visit: Some("Morning".to_string()),
                ..Default::default()
            }],
        );

        let value = serde_json::to_value(&plan).unwrap();
        assert_eq!(value["hotels"][0]["hotelName"], "Hotel");
        assert_eq!(value["itinerary"][0]["bestTimeToVisit"], "Morning");
        assert!(value["hotels"][0].get("hotelImageUrl").is_none());
    }
}
