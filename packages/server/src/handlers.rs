//! HTTP handler functions for the Berlin map API.

use actix_web::{HttpRequest, HttpResponse, HttpResponseBuilder, http::StatusCode, web};
use berlin_map_crime::{CrimeError, progress::null_progress};
use berlin_map_places_models::{Coordinate, PlaceCategory};
use berlin_map_server_models::{
    ApiAddPlace, ApiCrime, ApiError, ApiHealth, ApiSessionPlaces, ExchangeQueryParams, MapFormat,
    MapQueryParams, PlacesQueryParams, WeatherQueryParams,
};
use berlin_map_session::SessionError;
use uuid::Uuid;

use crate::{AppState, SESSION_HEADER, pipeline};

/// Builds a JSON error response.
pub fn error_json(status: StatusCode, message: impl Into<String>) -> HttpResponse {
    HttpResponse::build(status).json(ApiError {
        error: message.into(),
    })
}

/// Reads the session id the client sent, if it parses.
fn requested_session(req: &HttpRequest) -> Option<Uuid> {
    req.headers()
        .get(SESSION_HEADER)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

/// Echoes a registered session id back to the client.
fn echo_session(response: &mut HttpResponseBuilder, session_id: Option<Uuid>) {
    if let Some(id) = session_id {
        response.insert_header((SESSION_HEADER, id.to_string()));
    }
}

fn crime_error_response(e: &CrimeError) -> HttpResponse {
    log::error!("Failed to aggregate crime data: {e}");
    let status = match e {
        CrimeError::Geocode(_) => StatusCode::BAD_GATEWAY,
        CrimeError::Io(_) | CrimeError::Csv(_) | CrimeError::MissingColumn { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    error_json(status, e.to_string())
}

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/places`
///
/// Runs a full paginated search for one category.
pub async fn places(
    state: web::Data<AppState>,
    params: web::Query<PlacesQueryParams>,
) -> HttpResponse {
    let category = params.category;
    let Some(query) = state.config.search.query_for(category) else {
        return error_json(
            StatusCode::BAD_REQUEST,
            format!("'{category}' is not a searchable category"),
        );
    };
    let min_rating = params.min_rating.or(state.config.search.min_rating);

    match state.places.fetch(query, category, min_rating).await {
        Ok(places) => HttpResponse::Ok().json(places),
        Err(e) => {
            log::error!("Failed to fetch {category} places: {e}");
            error_json(StatusCode::BAD_GATEWAY, e.to_string())
        }
    }
}

/// `GET /api/crime`
///
/// Aggregates the crime dataset, geocoding through the session's cache.
pub async fn crime(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    let (session_id, session) = state.sessions.get_or_transient(requested_session(&req)).await;
    let mut session = session.lock().await;

    match pipeline::load_crime(
        &state.config.crime,
        state.geocoder.as_ref(),
        session.geocode_cache_mut(),
        &null_progress(),
    )
    .await
    {
        Ok(aggregate) => {
            let mut response = HttpResponse::Ok();
            echo_session(&mut response, session_id);
            response.json(ApiCrime::from(aggregate))
        }
        Err(e) => crime_error_response(&e),
    }
}

/// `GET /api/map`
///
/// Runs the whole pipeline and returns the composed view.
pub async fn map(
    req: HttpRequest,
    state: web::Data<AppState>,
    params: web::Query<MapQueryParams>,
) -> HttpResponse {
    let visibility = params.visibility();
    let min_rating = params.min_rating.or(state.config.search.min_rating);

    let mut layers =
        match pipeline::fetch_places(&state.places, &state.config.search, &visibility, min_rating)
            .await
        {
            Ok(layers) => layers,
            Err(e) => {
                log::error!("Failed to fetch places: {e}");
                return error_json(StatusCode::BAD_GATEWAY, e.to_string());
            }
        };

    let (session_id, session) = state.sessions.get_or_transient(requested_session(&req)).await;
    let mut session = session.lock().await;

    if visibility.user_added {
        layers.insert(PlaceCategory::UserAdded, session.custom_places().to_vec());
    }

    let crime = if visibility.crime_heatmap {
        match pipeline::load_crime(
            &state.config.crime,
            state.geocoder.as_ref(),
            session.geocode_cache_mut(),
            &null_progress(),
        )
        .await
        {
            Ok(aggregate) => aggregate.records,
            Err(e) => return crime_error_response(&e),
        }
    } else {
        Vec::new()
    };

    let view = state.composer.compose(
        &layers,
        &crime,
        &visibility,
        params.weight.unwrap_or_default(),
    );

    let mut response = HttpResponse::Ok();
    echo_session(&mut response, session_id);
    match params.format.unwrap_or_default() {
        MapFormat::Json => response.json(view),
        MapFormat::Geojson => response.json(view.to_feature_collection()),
    }
}

/// `GET /api/session/places`
///
/// Lists nothing for a request without a live session; only adding a
/// place starts one.
pub async fn session_places(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    let (session_id, session) = state.sessions.get_or_transient(requested_session(&req)).await;
    let places = session.lock().await.custom_places().to_vec();

    let mut response = HttpResponse::Ok();
    echo_session(&mut response, session_id);
    response.json(ApiSessionPlaces {
        session_id: session_id.map(|id| id.to_string()),
        places,
    })
}

/// `POST /api/session/places`
///
/// Geocodes the submitted address and adds it as a user place.
pub async fn add_session_place(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<ApiAddPlace>,
) -> HttpResponse {
    let (session_id, session) = state.sessions.get_or_create(requested_session(&req)).await;
    let mut session = session.lock().await;

    match session
        .add_place_by_address(state.geocoder.as_ref(), &body.name, &body.address)
        .await
    {
        Ok(place) => HttpResponse::Created()
            .insert_header((SESSION_HEADER, session_id.to_string()))
            .json(place),
        Err(e @ SessionError::AddressNotFound { .. }) => {
            error_json(StatusCode::NOT_FOUND, e.to_string())
        }
        Err(e @ SessionError::EmptyField { .. }) => {
            error_json(StatusCode::BAD_REQUEST, e.to_string())
        }
        Err(e @ SessionError::Geocode(_)) => {
            log::error!("Failed to geocode '{}': {e}", body.address);
            error_json(StatusCode::BAD_GATEWAY, e.to_string())
        }
    }
}

/// `DELETE /api/session/places`
///
/// Ends the session, discarding its places and geocode cache.
pub async fn end_session(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    let Some(id) = requested_session(&req) else {
        return error_json(
            StatusCode::BAD_REQUEST,
            format!("Missing or invalid {SESSION_HEADER} header"),
        );
    };

    if state.sessions.end(id).await {
        log::info!("Ended session {id}, {} still live", state.sessions.len().await);
        HttpResponse::NoContent().finish()
    } else {
        error_json(StatusCode::NOT_FOUND, format!("Unknown session {id}"))
    }
}

/// `GET /api/widgets/exchange`
pub async fn exchange(
    state: web::Data<AppState>,
    params: web::Query<ExchangeQueryParams>,
) -> HttpResponse {
    let widgets = &state.config.widgets;
    let base = params.base.as_deref().unwrap_or(&widgets.base_currency);
    let target = params.target.as_deref().unwrap_or(&widgets.target_currency);

    match state.exchange.rate(base, target).await {
        Ok(rate) => HttpResponse::Ok().json(rate),
        Err(e) => {
            log::error!("Failed to fetch exchange rate {base} -> {target}: {e}");
            error_json(StatusCode::BAD_GATEWAY, e.to_string())
        }
    }
}

/// `GET /api/widgets/weather`
///
/// Defaults to the map center when no position is given.
pub async fn weather(
    state: web::Data<AppState>,
    params: web::Query<WeatherQueryParams>,
) -> HttpResponse {
    let coordinate = match (params.lat, params.lng) {
        (None, None) => state.config.map.center,
        (Some(lat), Some(lng))
            if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng) =>
        {
            Coordinate::new(lat, lng)
        }
        (Some(_), Some(_)) => {
            return error_json(StatusCode::BAD_REQUEST, "Coordinate out of range");
        }
        _ => {
            return error_json(
                StatusCode::BAD_REQUEST,
                "lat and lng must be given together",
            );
        }
    };

    match state.weather.current(coordinate).await {
        Ok(weather) => HttpResponse::Ok().json(weather),
        Err(e) => {
            log::error!("Failed to fetch weather: {e}");
            error_json(StatusCode::BAD_GATEWAY, e.to_string())
        }
    }
}
