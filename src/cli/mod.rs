use crate::{
    services::chat_client::DEFAULT_BASE_URL, types::request::PlaceInput, ChatClient,
    PlannerConfig, TripForm, TripHandoff, TripPlan, TripPlanner, TripRequest,
};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::{env, path::Path, sync::Arc, time::Duration};
use tracing::{error, info, warn};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn build_command() -> Command {
    Command::new("trip-planner")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Generate a day-by-day travel itinerary with hotel suggestions")
        .arg(
            Arg::new("destination")
                .help("Where to travel (overrides the form file)")
                .index(1),
        )
        .arg(
            Arg::new("form")
                .short('f')
                .long("form")
                .value_name("FILE")
                .help("JSON file with the trip form (place, noOfDays, budget, traveller, activities)"),
        )
        .arg(
            Arg::new("days")
                .short('d')
                .long("days")
                .value_name("COUNT")
                .help("Number of days, 1 to 5"),
        )
        .arg(
            Arg::new("budget")
                .short('b')
                .long("budget")
                .value_name("LEVEL")
                .help("cheap, moderate or luxury"),
        )
        .arg(
            Arg::new("traveler")
                .short('p')
                .long("traveler")
                .value_name("GROUP")
                .help("Just Me, A Couple, Family or Friends"),
        )
        .arg(
            Arg::new("activity")
                .short('a')
                .long("activity")
                .value_name("NAME")
                .action(ArgAction::Append)
                .help("Activity to include; repeat for more"),
        )
        .arg(
            Arg::new("date")
                .long("date")
                .value_name("YYYY-MM-DD")
                .help("Travel start date"),
        )
        .arg(
            Arg::new("model")
                .short('m')
                .long("model")
                .value_name("MODEL")
                .help("Model to use (or set TRIP_PLANNER_MODEL)"),
        )
        .arg(
            Arg::new("api-key")
                .short('k')
                .long("api-key")
                .value_name("KEY")
                .help("API key (or set OPENAI_API_KEY env var)"),
        )
        .arg(
            Arg::new("base-url")
                .short('u')
                .long("base-url")
                .value_name("URL")
                .help("API base URL (or set OPENAI_BASE_URL / OPENROUTER_BASE_URL env vars)"),
        )
        .arg(
            Arg::new("deadline")
                .long("deadline")
                .value_name("SECONDS")
                .help("Give up on the whole trip after this many seconds"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Write the plan and form as a handoff JSON file"),
        )
}

/// Merge the optional form file with flag overrides.
fn form_from_matches(matches: &ArgMatches) -> CliResult<TripForm> {
    let mut form = match matches.get_one::<String>("form") {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => TripForm::default(),
    };

    if let Some(destination) = matches.get_one::<String>("destination") {
        form.place = Some(PlaceInput::Name(destination.clone()));
    }
    if let Some(days) = matches.get_one::<String>("days") {
        form.no_of_days = Some(days.trim().parse()?);
    }
    if let Some(budget) = matches.get_one::<String>("budget") {
        form.budget = Some(budget.clone());
    }
    if let Some(traveler) = matches.get_one::<String>("traveler") {
        form.traveller = Some(traveler.clone());
    }
    if let Some(activities) = matches.get_many::<String>("activity") {
        form.activities = activities.cloned().collect();
    }
    if let Some(date) = matches.get_one::<String>("date") {
        form.travel_date = Some(date.clone());
    }
    Ok(form)
}

fn write_handoff(path: &Path, plan: &TripPlan, request: &TripRequest) -> CliResult<()> {
    let handoff = TripHandoff::new(plan.clone(), request.clone());
    std::fs::write(path, serde_json::to_string_pretty(&handoff)?)?;
    info!("Wrote trip handoff to {}", path.display());
    Ok(())
}

/// CLI entry point for the trip-planner tool
pub async fn run() -> CliResult<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let matches = build_command().get_matches();
    let request = TripRequest::try_from(form_from_matches(&matches)?)?;

    let api_key = matches
        .get_one::<String>("api-key")
        .cloned()
        .or_else(|| env::var("OPENAI_API_KEY").ok())
        .ok_or("API key is required. Set OPENAI_API_KEY environment variable or use --api-key")?;

    let base_url = matches
        .get_one::<String>("base-url")
        .cloned()
        .or_else(|| env::var("OPENAI_BASE_URL").ok())
        .or_else(|| env::var("OPENROUTER_BASE_URL").ok())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    let mut config = PlannerConfig::from_env();
    if let Some(model) = matches.get_one::<String>("model") {
        config = config.with_model(model.as_str());
    }
    if let Some(seconds) = matches.get_one::<String>("deadline") {
        config = config.with_deadline(Duration::from_secs(seconds.trim().parse()?));
    }

    info!(
        "Planning {} days in {} using model {}",
        request.days(),
        request.destination().label(),
        config.model
    );
    info!("Base URL: {}", base_url);

    let client = ChatClient::new(api_key).with_base_url(base_url);
    let planner = TripPlanner::new(Arc::new(client)).with_config(config);
    let output = matches.get_one::<String>("output").map(Path::new);

    match planner.generate_trip_plan(request.clone()).await {
        Ok(plan) => {
            println!("{}", serde_json::to_string_pretty(&plan)?);
            if let Some(path) = output {
                write_handoff(path, &plan, &request)?;
            }
            Ok(())
        }
        Err(e) => {
            error!("Trip generation failed [{}]: {}", e.error_code(), e);
            if let Some(partial) = e.partial_plan() {
                warn!("Keeping partial plan with {} days", partial.day_count());
                println!("{}", serde_json::to_string_pretty(partial)?);
                if let Some(path) = output {
                    write_handoff(path, partial, &request)?;
                }
            }
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_build_form() {
        let matches = build_command()
            .try_get_matches_from([
                "trip-planner",
                "Goa",
                "--days",
                "3",
                "--budget",
                "moderate",
                "--traveler",
                "A Couple",
                "-a",
                "Beaches",
                "-a",
                "Nightlife",
            ])
            .unwrap();

        let form = form_from_matches(&matches).unwrap();
        assert_eq!(form.place, Some(PlaceInput::Name("Goa".to_string())));
        assert_eq!(form.no_of_days, Some(3));
        assert_eq!(form.activities, vec!["Beaches", "Nightlife"]);

        let request = TripRequest::try_from(form).unwrap();
        assert_eq!(request.days(), 3);
        assert_eq!(
            request.fingerprint(),
            "Goa_3_moderate_Beaches.Nightlife_2 People(couple)"
        );
    }

    #[test]
    fn test_invalid_days_flag() {
        let matches = build_command()
            .try_get_matches_from(["trip-planner", "Goa", "--days", "three"])
            .unwrap();
        assert!(form_from_matches(&matches).is_err());
    }
}
