#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! `berlin_map`: command-line entry point for the Berlin map pipeline.
//!
//! Each subcommand runs one piece of the pipeline (places search,
//! geocoding, crime aggregation) or all of it (`compose`), or starts the
//! API server.
//!
//! Uses `indicatif-log-bridge` (via [`berlin_map_cli_utils::init_logger`])
//! so log lines and the geocoding progress bar share the terminal.

mod compose;

use std::path::PathBuf;

use berlin_map_cli_utils::{GeocodeProgress, MultiProgress};
use berlin_map_config::Config;
use berlin_map_geocoder::{Geocode as _, GeocodeCache};
use berlin_map_places_models::PlaceCategory;
use berlin_map_server::pipeline;
use clap::{Parser, Subcommand};

use crate::compose::ComposeArgs;

#[derive(Parser)]
#[command(name = "berlin_map", about = "Berlin travel map pipeline")]
struct Cli {
    /// Path to a TOML config file (overrides `BERLIN_MAP_CONFIG`)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search places of one category (restaurant, hotel, attraction)
    Places {
        category: PlaceCategory,
        /// Minimum rating; unrated places are excluded when set
        #[arg(long)]
        min_rating: Option<f64>,
    },
    /// Geocode a free-text address
    Geocode { address: String },
    /// Aggregate the crime dataset for the latest year
    Crime {
        /// Crime CSV to read instead of the configured one
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Run the full pipeline and write the composed map
    Compose(ComposeArgs),
    /// Start the API server
    Serve,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = berlin_map_cli_utils::init_logger("info");
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Places {
            category,
            min_rating,
        } => places(&config, category, min_rating).await?,
        Commands::Geocode { address } => geocode(&config, &address).await?,
        Commands::Crime { csv } => {
            let mut config = config;
            if let Some(csv) = csv {
                config.crime.csv_path = csv;
            }
            crime(&config, &multi).await?;
        }
        Commands::Compose(args) => compose::run(&config, &args, &multi).await?,
        Commands::Serve => {
            // actix-web brings its own runtime; run it off the tokio
            // worker threads.
            tokio::task::spawn_blocking(move || {
                actix_web::rt::System::new().block_on(berlin_map_server::run_server(config))
            })
            .await??;
        }
    }

    Ok(())
}

async fn places(
    config: &Config,
    category: PlaceCategory,
    min_rating: Option<f64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let Some(query) = config.search.query_for(category) else {
        return Err(format!("'{category}' is not a searchable category").into());
    };

    let fetcher = pipeline::places_fetcher(reqwest::Client::new(), config)?;
    let places = fetcher
        .fetch(query, category, min_rating.or(config.search.min_rating))
        .await?;

    println!("{:<40} {:>6}  ADDRESS", "NAME", "RATING");
    println!("{}", "-".repeat(80));
    for place in &places {
        let rating = place
            .rating
            .map_or_else(|| "-".to_string(), |r| format!("{r:.1}"));
        println!(
            "{:<40} {rating:>6}  {}",
            place.name,
            place.address.as_deref().unwrap_or("")
        );
    }
    println!("\n{} {category} places", places.len());

    Ok(())
}

async fn geocode(config: &Config, address: &str) -> Result<(), Box<dyn std::error::Error>> {
    let geocoder = pipeline::google_geocoder(reqwest::Client::new(), config)?;

    match geocoder.geocode(address).await? {
        Some(coordinate) => println!("{}", coordinate.to_query_param()),
        None => println!("Address not found: {address}"),
    }

    Ok(())
}

async fn crime(config: &Config, multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    let geocoder = pipeline::google_geocoder(reqwest::Client::new(), config)?;
    let mut cache = GeocodeCache::new();
    let progress = GeocodeProgress::attach(multi);

    let aggregate = pipeline::load_crime(&config.crime, &geocoder, &mut cache, &progress).await?;

    let Some(period) = aggregate.period else {
        println!("Crime dataset is empty");
        return Ok(());
    };

    println!("{:<40} {:>8} {:>6}", "LOCATION", "TOTAL", "RISK");
    println!("{}", "-".repeat(56));
    for record in &aggregate.records {
        println!(
            "{:<40} {:>8} {:>6.3}",
            record.location_name, record.crime_total, record.risk_norm
        );
    }
    println!("\n{} locations for {period}", aggregate.records.len());
    if !aggregate.dropped_locations.is_empty() {
        println!("Not geocoded: {}", aggregate.dropped_locations.join(", "));
    }

    Ok(())
}
