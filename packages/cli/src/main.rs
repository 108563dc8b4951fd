#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for the collision speed dashboard.
//!
//! Each subcommand fetches from the backend, runs the same view-state and
//! reconciliation code the dashboard uses, and prints the chart-ready
//! result as pretty JSON.

use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};
use collision_speed_client::ApiClient;
use collision_speed_collision_models::{
    CollisionRecord, CoordinateKey, DATETIME_PARAM_FORMAT, DateTimeRange,
};
use collision_speed_config::AppConfig;
use collision_speed_dashboard::{AnalyzerState, OverviewState};
use serde::Serialize;

#[derive(Parser)]
#[command(
    name = "collision_speed_cli",
    about = "Traffic speed impact of LA collisions, observed vs. predicted"
)]
struct Cli {
    /// TOML file overriding the built-in configuration
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the Google Maps API key served by the backend
    MapsKey,
    /// List collisions in a date range (defaults to the whole dataset)
    Collisions {
        /// First day, `YYYY-MM-DD`
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Last day, `YYYY-MM-DD`
        #[arg(long)]
        to: Option<NaiveDate>,
    },
    /// Observed and predicted before/after speed scatter data
    Scatter,
    /// Observed vs. predicted speed-change histogram, aligned by bucket
    Histogram,
    /// Scatter and histogram fetched together
    Overview,
    /// Speed maps and comparison series around one collision
    Trends {
        /// Collision latitude
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        /// Collision longitude
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        /// Collision time, `YYYY-MM-DD HH:MM`
        #[arg(long, value_parser = parse_datetime)]
        datetime: NaiveDateTime,
        /// Sensor to select, e.g. "(34.05, -118.24)"
        #[arg(long)]
        location: Option<CoordinateKey>,
        /// Only show sensors within this many kilometres of the collision
        #[arg(long)]
        radius_km: Option<f64>,
        /// Snapshot to draw the map markers for
        #[arg(long, default_value = "0")]
        timestamp: usize,
    },
    /// Ask the backend to analyze traffic around one collision
    Analyze {
        /// Collision latitude
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        /// Collision longitude
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        /// Collision date, `YYYY-MM-DD`
        #[arg(long)]
        date: NaiveDate,
        /// Collision time, `HH:MM`
        #[arg(long, value_parser = parse_time)]
        time: chrono::NaiveTime,
    },
}

fn parse_datetime(value: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(value.trim(), DATETIME_PARAM_FORMAT)
        .map_err(|e| format!("expected YYYY-MM-DD HH:MM: {e}"))
}

fn parse_time(value: &str) -> Result<chrono::NaiveTime, String> {
    chrono::NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|e| format!("expected HH:MM: {e}"))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[allow(clippy::too_many_lines)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref())?;
    let client = ApiClient::new(&config.api)?;
    log::debug!("Using backend at {}", config.api.base_url);

    match cli.command {
        Commands::MapsKey => {
            let mut overview = OverviewState::new();
            if !overview.apply_maps_key(client.google_maps_key().await) {
                return Err("failed to fetch maps API key".into());
            }
            println!("{}", overview.maps_key().unwrap_or_default());
        }
        Commands::Collisions { from, to } => {
            let mut analyzer: AnalyzerState = AnalyzerState::new(&config)?;
            if from.is_some() || to.is_some() {
                let range = DateTimeRange::days(
                    from.unwrap_or(config.search.min_date),
                    to.unwrap_or(config.search.max_date),
                )?;
                analyzer.set_search_range(range);
            }
            if !analyzer.search(&client).await {
                return Err("failed to fetch collisions".into());
            }
            print_json(analyzer.collisions())?;
        }
        Commands::Scatter => {
            let mut overview = OverviewState::new();
            if !overview.apply_scatter(client.scatter().await) {
                return Err("failed to fetch scatter data".into());
            }
            print_json(overview.scatter())?;
        }
        Commands::Histogram => {
            let mut overview = OverviewState::new();
            if !overview.apply_histogram(client.histogram().await) {
                return Err("failed to fetch histogram data".into());
            }
            print_json(overview.histogram())?;
        }
        Commands::Overview => {
            let mut overview = OverviewState::new();
            overview.refresh(&client).await;
            print_json(&overview)?;
        }
        Commands::Trends {
            lat,
            lng,
            datetime,
            location,
            radius_km,
            timestamp,
        } => {
            let record = CollisionRecord {
                latitude: lat,
                longitude: lng,
                date: datetime.date(),
                time: datetime.time(),
            };

            let mut analyzer: AnalyzerState = AnalyzerState::new(&config)?;
            analyzer.apply_collisions(Ok(vec![record]));
            analyzer.select_collision(0);
            analyzer.open_headless_detail();

            if !analyzer.load_detail(&client).await {
                return Err("failed to fetch speed trends".into());
            }

            let Some(session) = analyzer.detail_mut() else {
                return Err("detail session closed unexpectedly".into());
            };
            if let Some(radius_km) = radius_km {
                session.controller_mut().set_radius_km(radius_km);
            }
            if let Some(location) = location {
                session.controller_mut().click_marker(location);
            }
            if timestamp > 0 && !session.select_timestamp(timestamp) {
                log::warn!("Showing markers for the first snapshot instead");
            }
            print_json(&session.summary())?;
        }
        Commands::Analyze {
            lat,
            lng,
            date,
            time,
        } => {
            let record = CollisionRecord {
                latitude: lat,
                longitude: lng,
                date,
                time,
            };
            let analysis = client.analyze_traffic(&record).await?;
            print_json(&analysis)?;
        }
    }

    Ok(())
}
