//! `compose`: the whole pipeline in one run.
//!
//! Searches every visible category, adds the `--place` entries through a
//! session, aggregates crime unless `--no-crime` is given, and writes the
//! composed view as JSON or `GeoJSON`.

use std::path::PathBuf;

use berlin_map_cli_utils::{GeocodeProgress, MultiProgress};
use berlin_map_composer::{HeatWeight, LayerVisibility};
use berlin_map_config::Config;
use berlin_map_places_models::PlaceCategory;
use berlin_map_server::pipeline;
use berlin_map_server_models::MapFormat;
use berlin_map_session::{Session, SessionError};
use clap::Args;

#[derive(Args)]
#[allow(clippy::struct_excessive_bools)]
pub struct ComposeArgs {
    /// File to write; stdout when omitted
    #[arg(long, short)]
    output: Option<PathBuf>,
    /// Output encoding (json, geojson)
    #[arg(long, default_value = "geojson")]
    format: MapFormat,
    /// Heat point weighting (uniform, crime-total, risk-norm)
    #[arg(long, default_value = "risk-norm")]
    weight: HeatWeight,
    /// Minimum rating for searched places
    #[arg(long)]
    min_rating: Option<f64>,
    /// Add a place by address, as `NAME=ADDRESS` (repeatable)
    #[arg(long = "place", value_parser = parse_place)]
    places: Vec<(String, String)>,
    /// Leave out the crime heatmap
    #[arg(long)]
    no_crime: bool,
    /// Leave out restaurants
    #[arg(long)]
    no_restaurants: bool,
    /// Leave out hotels
    #[arg(long)]
    no_hotels: bool,
    /// Leave out attractions
    #[arg(long)]
    no_attractions: bool,
}

impl ComposeArgs {
    const fn visibility(&self) -> LayerVisibility {
        LayerVisibility {
            restaurants: !self.no_restaurants,
            hotels: !self.no_hotels,
            attractions: !self.no_attractions,
            user_added: true,
            crime_heatmap: !self.no_crime,
        }
    }
}

fn parse_place(value: &str) -> Result<(String, String), String> {
    let (name, address) = value
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=ADDRESS, got '{value}'"))?;
    Ok((name.trim().to_string(), address.trim().to_string()))
}

pub async fn run(
    config: &Config,
    args: &ComposeArgs,
    multi: &MultiProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = reqwest::Client::new();
    let fetcher = pipeline::places_fetcher(client.clone(), config)?;
    let geocoder = pipeline::google_geocoder(client, config)?;
    let visibility = args.visibility();

    let mut layers = pipeline::fetch_places(
        &fetcher,
        &config.search,
        &visibility,
        args.min_rating.or(config.search.min_rating),
    )
    .await?;

    let mut session = Session::new();
    for (name, address) in &args.places {
        match session.add_place_by_address(&geocoder, name, address).await {
            Ok(place) => log::info!("Added '{}'", place.name),
            Err(e @ (SessionError::AddressNotFound { .. } | SessionError::EmptyField { .. })) => {
                log::warn!("Skipping '{name}': {e}");
            }
            Err(e) => return Err(e.into()),
        }
    }
    layers.insert(PlaceCategory::UserAdded, session.custom_places().to_vec());

    let crime = if visibility.crime_heatmap {
        let progress = GeocodeProgress::attach(multi);
        pipeline::load_crime(
            &config.crime,
            &geocoder,
            session.geocode_cache_mut(),
            &progress,
        )
        .await?
        .records
    } else {
        Vec::new()
    };

    log::debug!("Geocode cache holds {} queries", session.geocode_cache().len());

    let view = pipeline::composer(&config.map).compose(&layers, &crime, &visibility, args.weight);

    let json = match args.format {
        MapFormat::Json => serde_json::to_string_pretty(&view)?,
        MapFormat::Geojson => serde_json::to_string_pretty(&view.to_feature_collection())?,
    };

    match &args.output {
        Some(path) => {
            std::fs::write(path, json)?;
            log::info!("Wrote {} layers to {}", view.layers.len(), path.display());
        }
        None => println!("{json}"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn place_argument_splits_on_first_equals() {
        assert_eq!(
            parse_place("Bar = Torstr. 1 = Hinterhof").unwrap(),
            ("Bar".to_string(), "Torstr. 1 = Hinterhof".to_string())
        );
        assert!(parse_place("no separator").is_err());
    }
}
