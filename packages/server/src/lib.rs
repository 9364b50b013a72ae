#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the Berlin map application.
//!
//! Every request re-runs the relevant part of the pipeline: places are
//! searched, the crime table is re-read and the map is composed afresh.
//! The only state kept between requests is per-visitor [`Session`]s,
//! identified by the `X-Session-Id` header, which hold user-added places
//! and the geocode cache.
//!
//! [`Session`]: berlin_map_session::Session

mod handlers;
pub mod pipeline;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, error::InternalError, http::StatusCode, middleware, web};
use berlin_map_composer::MapComposer;
use berlin_map_config::{Config, ConfigError};
use berlin_map_geocoder::Geocode;
use berlin_map_session::SessionStore;
use berlin_map_widgets::{ExchangeRateClient, WeatherClient};

use crate::pipeline::GooglePlacesFetcher;

/// Request/response header carrying the session id.
pub const SESSION_HEADER: &str = "X-Session-Id";

/// Shared application state.
pub struct AppState {
    /// Loaded configuration.
    pub config: Config,
    /// Paginated places search.
    pub places: GooglePlacesFetcher,
    /// Geocoder for crime locations and user addresses.
    pub geocoder: Arc<dyn Geocode>,
    /// Map layer assembly.
    pub composer: MapComposer,
    /// Exchange-rate widget client.
    pub exchange: ExchangeRateClient,
    /// Weather widget client.
    pub weather: WeatherClient,
    /// Live visitor sessions.
    pub sessions: SessionStore,
}

impl AppState {
    /// Builds the state, sharing one HTTP client across all backends.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingApiKey`] if no Google API key is
    /// configured.
    pub fn from_config(config: Config) -> Result<Self, ConfigError> {
        let client = reqwest::Client::new();

        Ok(Self {
            places: pipeline::places_fetcher(client.clone(), &config)?,
            geocoder: Arc::new(pipeline::google_geocoder(client.clone(), &config)?),
            composer: pipeline::composer(&config.map),
            exchange: ExchangeRateClient::new(client.clone(), &config.widgets.exchange_url),
            weather: WeatherClient::new(client, &config.widgets.weather_url),
            sessions: SessionStore::new(),
            config,
        })
    }
}

/// Registers the `/api` routes and JSON error handlers.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::QueryConfig::default().error_handler(|err, _req| {
        let message = err.to_string();
        InternalError::from_response(err, handlers::error_json(StatusCode::BAD_REQUEST, message))
            .into()
    }))
    .app_data(web::JsonConfig::default().error_handler(|err, _req| {
        let message = err.to_string();
        InternalError::from_response(err, handlers::error_json(StatusCode::BAD_REQUEST, message))
            .into()
    }))
    .service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/places", web::get().to(handlers::places))
            .route("/crime", web::get().to(handlers::crime))
            .route("/map", web::get().to(handlers::map))
            .route("/session/places", web::get().to(handlers::session_places))
            .route("/session/places", web::post().to(handlers::add_session_place))
            .route("/session/places", web::delete().to(handlers::end_session))
            .route("/widgets/exchange", web::get().to(handlers::exchange))
            .route("/widgets/weather", web::get().to(handlers::weather)),
    );
}

/// Starts the Berlin map API server.
///
/// This is a regular async function; the caller provides the actix
/// runtime (e.g. via `#[actix_web::main]`) and initializes logging.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the state cannot be built from
/// `config`, or the HTTP server fails to bind or encounters a runtime
/// error.
#[allow(clippy::future_not_send)]
pub async fn run_server(config: Config) -> std::io::Result<()> {
    let bind_addr = config.server.bind_addr.clone();
    let port = config.server.port;

    log::info!("Crime dataset: {}", config.crime.csv_path.display());
    let state = web::Data::new(AppState::from_config(config).map_err(std::io::Error::other)?);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive().expose_headers([SESSION_HEADER]);

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
