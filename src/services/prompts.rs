use crate::{
    schemas::{prompt_schema, HotelsPayload},
    types::{plan::DayPlan, request::TripRequest},
};

/// Shared travel requirements that open every prompt.
pub fn base_prompt(request: &TripRequest) -> String {
    let activities: Vec<&str> = request.activities().collect();
    let date = request
        .travel_date()
        .map(|date| date.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| "Flexible".to_string());

    format!(
        "Travel requirements for {}:\n- Budget: {} ({}) per person\n- Group: {}\n- Activities: {}\n- Date: {}",
        request.destination().label(),
        request.budget(),
        request.budget().spend_hint(),
        request.traveler(),
        activities.join(", "),
        date
    )
}

/// Prompt for the hotel task.
pub fn hotel_prompt(request: &TripRequest) -> String {
    format!(
        "{}\n\nSuggest 2-3 specific hotels in {} that match the {} budget ({} per person).\nReturn ONLY valid JSON with a top-level \"hotels\" array, following this JSON schema:\n{}",
        base_prompt(request),
        request.destination().label(),
        request.budget(),
        request.budget().spend_hint(),
        prompt_schema::<HotelsPayload>()
    )
}

/// Prompt for day `day` (1-based) of the trip.
pub fn day_prompt(request: &TripRequest, day: u32) -> String {
    let activities: Vec<&str> = request.activities().collect();
    format!(
        "{}\n\nCreate a detailed plan for Day {} of {} in {}.\nInclude 6-8 activities including meals.\nFocus on the following aspects:\n- Activities: {}\n- Budget range: {} per person\n- Group size: {}\n\nReturn ONLY valid JSON with \"day\": {} and a non-empty \"activities\" array, following this JSON schema:\n{}",
        base_prompt(request),
        day,
        request.days(),
        request.destination().label(),
        activities.join(", "),
        request.budget().spend_hint(),
        request.traveler(),
        day,
        prompt_schema::<DayPlan>()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::request::{Budget, TravelerGroup};
    use chrono::NaiveDate;

    fn request() -> TripRequest {
        TripRequest::new(
            "Jaipur",
            3,
            Budget::Cheap,
            TravelerGroup::Friends,
            ["Shopping", "Food Exploration"],
        )
        .unwrap()
    }

    #[test]
    fn test_base_prompt() {
        let prompt = base_prompt(&request());

        assert!(prompt.contains("Travel requirements for Jaipur"));
        assert!(prompt.contains("cheap (INR under 5000)"));
        assert!(prompt.contains("Group: 5 to 10 people"));
        assert!(prompt.contains("Food Exploration, Shopping"));
        assert!(prompt.contains("Date: Flexible"));
    }

    #[test]
    fn test_base_prompt_with_date() {
        let request = request().with_travel_date(NaiveDate::from_ymd_opt(2026, 3, 9).unwrap());
        assert!(base_prompt(&request).contains("Date: 09/03/2026"));
    }

    #[test]
    fn test_hotel_prompt() {
        let prompt = hotel_prompt(&request());

        assert!(prompt.contains("2-3 specific hotels in Jaipur"));
        assert!(prompt.contains("ONLY valid JSON"));
        assert!(prompt.contains("hotelAddress"));
    }

    #[test]
    fn test_day_prompt() {
        let prompt = day_prompt(&request(), 2);

        assert!(prompt.contains("Day 2 of 3 in Jaipur"));
        assert!(prompt.contains("6-8 activities"));
        assert!(prompt.contains("\"day\": 2"));
        assert!(prompt.contains("placeName"));
    }
}
