pub mod plan;
pub mod request;

pub use plan::{Activity, DayPlan, Hotel, TripHandoff, TripPlan};
pub use request::{
    Budget, Coordinates, Destination, PlaceInput, TravelerGroup, TripForm, TripRequest,
    ACTIVITY_OPTIONS, MAX_DAYS, MIN_DAYS,
};
