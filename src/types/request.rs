use std::{collections::BTreeSet, fmt, str::FromStr};

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TripError};

pub const MIN_DAYS: u32 = 1;
pub const MAX_DAYS: u32 = 5;

/// Activity tags offered by the selection UI. Requests may use any tag.
pub const ACTIVITY_OPTIONS: [&str; 9] = [
    "Adventure",
    "beaches",
    "City sightseeing",
    "festival / events",
    "Food Exploration",
    "Nightlife",
    "Shopping",
    "Spa wellness",
    "Spirituality",
];

/// Spending tier for the whole trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Budget {
    Cheap,
    Moderate,
    Luxury,
}

impl Budget {
    pub const ALL: [Budget; 3] = [Budget::Cheap, Budget::Moderate, Budget::Luxury];

    pub fn as_str(&self) -> &'static str {
        match self {
            Budget::Cheap => "cheap",
            Budget::Moderate => "moderate",
            Budget::Luxury => "luxury",
        }
    }

    /// Rough per-person spend used to steer the model.
    pub fn spend_hint(&self) -> &'static str {
        match self {
            Budget::Cheap => "INR under 5000",
            Budget::Moderate => "INR under 15000",
            Budget::Luxury => "INR 20000 - 1 lakh",
        }
    }
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Budget {
    type Err = TripError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "cheap" => Ok(Budget::Cheap),
            "moderate" => Ok(Budget::Moderate),
            "luxury" => Ok(Budget::Luxury),
            other => Err(TripError::InvalidRequest(format!(
                "unknown budget `{}` (expected cheap, moderate or luxury)",
                other
            ))),
        }
    }
}

/// Who is travelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelerGroup {
    Solo,
    Couple,
    Family,
    Friends,
}

impl TravelerGroup {
    pub const ALL: [TravelerGroup; 4] = [
        TravelerGroup::Solo,
        TravelerGroup::Couple,
        TravelerGroup::Family,
        TravelerGroup::Friends,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            TravelerGroup::Solo => "Just Me",
            TravelerGroup::Couple => "A Couple",
            TravelerGroup::Family => "Family",
            TravelerGroup::Friends => "Friends",
        }
    }

    /// Group size descriptor used in prompts and fingerprints.
    pub fn people(&self) -> &'static str {
        match self {
            TravelerGroup::Solo => "1",
            TravelerGroup::Couple => "2 People(couple)",
            TravelerGroup::Family => "3 to 5 people",
            TravelerGroup::Friends => "5 to 10 people",
        }
    }
}

impl fmt::Display for TravelerGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.people())
    }
}

impl FromStr for TravelerGroup {
    type Err = TripError;

    fn from_str(value: &str) -> Result<Self> {
        let normalized = value.trim().to_lowercase();
        TravelerGroup::ALL
            .into_iter()
            .find(|group| {
                let variant = format!("{:?}", group).to_lowercase();
                normalized == variant
                    || normalized == group.title().to_lowercase()
                    || normalized == group.people().to_lowercase()
            })
            .ok_or_else(|| {
                TripError::InvalidRequest(format!(
                    "unknown traveler group `{}` (expected solo, couple, family or friends)",
                    value.trim()
                ))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Where the trip goes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Destination {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Coordinates>,
}

impl Destination {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_formatted_address(mut self, address: impl Into<String>) -> Self {
        self.formatted_address = Some(address.into());
        self
    }

    pub fn with_location(mut self, lat: f64, lng: f64) -> Self {
        self.location = Some(Coordinates { lat, lng });
        self
    }

    /// Human-readable label: the name, falling back to the address.
    pub fn label(&self) -> &str {
        let name = self.name.trim();
        if !name.is_empty() {
            return name;
        }
        self.formatted_address
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
    }
}

impl From<&str> for Destination {
    fn from(name: &str) -> Self {
        Destination::new(name)
    }
}

impl From<String> for Destination {
    fn from(name: String) -> Self {
        Destination::new(name)
    }
}

/// Place as produced by an autocomplete widget, or typed by hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlaceInput {
    Name(String),
    Details {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        formatted_address: Option<String>,
        #[serde(default)]
        place_id: Option<String>,
        #[serde(default)]
        location: Option<Coordinates>,
    },
}

/// Raw selection state before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripForm {
    #[serde(default)]
    pub place: Option<PlaceInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub travel_date: Option<String>,
    #[serde(default)]
    pub no_of_days: Option<i64>,
    #[serde(default)]
    pub budget: Option<String>,
    #[serde(default)]
    pub traveller: Option<String>,
    #[serde(default)]
    pub activities: Vec<String>,
}

/// Validated trip request consumed by the planner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TripForm", into = "TripForm")]
pub struct TripRequest {
    destination: Destination,
    days: u32,
    budget: Budget,
    traveler: TravelerGroup,
    activities: BTreeSet<String>,
    travel_date: Option<NaiveDate>,
}

impl TripRequest {
    pub fn new<I, S>(
        destination: impl Into<Destination>,
        days: u32,
        budget: Budget,
        traveler: TravelerGroup,
        activities: I,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let request = Self {
            destination: destination.into(),
            days,
            budget,
            traveler,
            activities: normalize_activities(activities),
            travel_date: None,
        };
        request.validate()?;
        Ok(request)
    }

    pub fn with_travel_date(mut self, date: NaiveDate) -> Self {
        self.travel_date = Some(date);
        self
    }

    /// Check every invariant, reporting all violations at once.
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();
        if self.destination.label().is_empty() {
            problems.push("Please select a destination".to_string());
        }
        if let Err(problem) = check_days(self.days as i64) {
            problems.push(problem);
        }
        if self.activities.is_empty() {
            problems.push("Please select at least one activity".to_string());
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(TripError::InvalidRequest(problems.join("; ")))
        }
    }

    pub fn destination(&self) -> &Destination {
        &self.destination
    }

    pub fn days(&self) -> u32 {
        self.days
    }

    pub fn budget(&self) -> Budget {
        self.budget
    }

    pub fn traveler(&self) -> TravelerGroup {
        self.traveler
    }

    pub fn activities(&self) -> impl Iterator<Item = &str> {
        self.activities.iter().map(String::as_str)
    }

    pub fn travel_date(&self) -> Option<NaiveDate> {
        self.travel_date
    }

    /// Cache key; identical for requests that differ only in activity order.
    pub fn fingerprint(&self) -> String {
        let activities: Vec<&str> = self.activities().collect();
        format!(
            "{}_{}_{}_{}_{}",
            self.destination.label(),
            self.days,
            self.budget,
            activities.join("."),
            self.traveler
        )
    }
}

impl TryFrom<TripForm> for TripRequest {
    type Error = TripError;

    fn try_from(form: TripForm) -> Result<Self> {
        let mut problems = Vec::new();

        let destination = match form.place {
            Some(PlaceInput::Name(name)) => Destination::new(name.trim()),
            Some(PlaceInput::Details {
                name,
                formatted_address,
                place_id,
                location,
            }) => Destination {
                name: name
                    .filter(|name| !name.trim().is_empty())
                    .or_else(|| formatted_address.clone())
                    .unwrap_or_default()
                    .trim()
                    .to_string(),
                formatted_address,
                place_id,
                location,
            },
            None => Destination::default(),
        };
        if destination.label().is_empty() {
            problems.push("Please select a destination".to_string());
        }

        let travel_date = match form.travel_date.as_deref().map(parse_travel_date) {
            Some(Ok(date)) => Some(date),
            Some(Err(problem)) => {
                problems.push(problem);
                None
            }
            None => None,
        };

        let days = match form.no_of_days {
            Some(days) => match check_days(days) {
                Ok(days) => Some(days),
                Err(problem) => {
                    problems.push(problem);
                    None
                }
            },
            None => {
                problems.push(days_message());
                None
            }
        };

        let budget: Option<Budget> = parse_choice(
            form.budget,
            "Please select your budget preference",
            &mut problems,
        );
        let traveler: Option<TravelerGroup> = parse_choice(
            form.traveller,
            "Please select who you are traveling with",
            &mut problems,
        );

        let activities = normalize_activities(form.activities);
        if activities.is_empty() {
            problems.push("Please select at least one activity".to_string());
        }

        match (days, budget, traveler) {
            (Some(days), Some(budget), Some(traveler)) if problems.is_empty() => Ok(Self {
                destination,
                days,
                budget,
                traveler,
                activities,
                travel_date,
            }),
            _ => Err(TripError::InvalidRequest(problems.join("; "))),
        }
    }
}

impl From<TripRequest> for TripForm {
    fn from(request: TripRequest) -> Self {
        let Destination {
            name,
            formatted_address,
            place_id,
            location,
        } = request.destination;

        TripForm {
            place: Some(PlaceInput::Details {
                name: Some(name),
                formatted_address,
                place_id,
                location,
            }),
            travel_date: request
                .travel_date
                .map(|date| date.format("%Y-%m-%d").to_string()),
            no_of_days: Some(request.days as i64),
            budget: Some(request.budget.to_string()),
            traveller: Some(request.traveler.people().to_string()),
            activities: request.activities.into_iter().collect(),
        }
    }
}

fn days_message() -> String {
    format!("Number of days must be between {} and {}", MIN_DAYS, MAX_DAYS)
}

fn check_days(days: i64) -> std::result::Result<u32, String> {
    if (MIN_DAYS as i64..=MAX_DAYS as i64).contains(&days) {
        Ok(days as u32)
    } else {
        Err(days_message())
    }
}

fn parse_choice<T>(value: Option<String>, missing: &str, problems: &mut Vec<String>) -> Option<T>
where
    T: FromStr<Err = TripError>,
{
    match value.filter(|value| !value.trim().is_empty()) {
        Some(value) => match value.parse() {
            Ok(parsed) => Some(parsed),
            Err(TripError::InvalidRequest(problem)) => {
                problems.push(problem);
                None
            }
            Err(other) => {
                problems.push(other.to_string());
                None
            }
        },
        None => {
            problems.push(missing.to_string());
            None
        }
    }
}

fn parse_travel_date(value: &str) -> std::result::Result<NaiveDate, String> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(value).map(|date| date.date_naive()))
        .map_err(|_| format!("Travel date `{}` is not an ISO-8601 date", value))
}

fn normalize_activities<I, S>(activities: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    activities
        .into_iter()
        .map(|activity| activity.into().trim().to_string())
        .filter(|activity| !activity.is_empty())
        .collect()
}
