use crate::error::{AppError, AppResult};
use crate::services::bus::BusService;
use crate::services::cache::CacheService;
use axum::{extract::Query, response::IntoResponse, Extension, Json};
use chrono::NaiveTime;
use sea_orm::DatabaseConnection;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct BusTimingsQuery {
    pub stop_id: Option<i32>,
    /// HH:mm:ss; defaults to the server's current local time
    pub current_time: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NearbyStopsQuery {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Search radius in meters; defaults to 5000
    pub radius: Option<f64>,
    pub city: Option<String>,
}

fn make_bus_service(db: DatabaseConnection, cache: Option<CacheService>) -> BusService {
    let service = BusService::new(db);
    match cache {
        Some(c) => service.with_cache(c),
        None => service,
    }
}

#[utoipa::path(
    get,
    path = "/api/buses/bus_timings",
    params(
        ("stop_id" = i32, Query, description = "Stop to list arrivals for"),
        ("current_time" = Option<String>, Query, description = "HH:mm:ss lower bound, defaults to now"),
    ),
    responses(
        (status = 200, description = "Upcoming arrivals at the stop, soonest first", body = Vec<crate::models::BusTimingRow>),
        (status = 400, description = "Missing or malformed parameters", body = crate::error::AppError),
    ),
    tag = "buses"
)]
pub async fn bus_timings(
    Extension(db): Extension<DatabaseConnection>,
    cache: Option<Extension<CacheService>>,
    Query(params): Query<BusTimingsQuery>,
) -> AppResult<impl IntoResponse> {
    let stop_id = params.stop_id.ok_or(AppError::Validation(
        "stop_id query parameter is required".to_string(),
    ))?;

    let after = match params.current_time.as_deref() {
        Some(raw) => NaiveTime::parse_from_str(raw, "%H:%M:%S").map_err(|_| {
            AppError::Validation("current_time must be in HH:mm:ss format".to_string())
        })?,
        None => chrono::Local::now().time(),
    };

    let service = make_bus_service(db, cache.map(|c| c.0));
    let timings = service.timings(stop_id, after).await?;
    Ok(Json(timings))
}

#[utoipa::path(
    get,
    path = "/api/buses/bus_stops",
    params(
        ("latitude" = f64, Query, description = "Search center latitude"),
        ("longitude" = f64, Query, description = "Search center longitude"),
        ("radius" = Option<f64>, Query, description = "Radius in meters, defaults to 5000"),
        ("city" = Option<String>, Query, description = "Restrict results to a city"),
    ),
    responses(
        (status = 200, description = "Stops within the radius, nearest first", body = Vec<crate::models::NearbyStop>),
        (status = 400, description = "Missing coordinates", body = crate::error::AppError),
    ),
    tag = "buses"
)]
pub async fn nearby_stops(
    Extension(db): Extension<DatabaseConnection>,
    cache: Option<Extension<CacheService>>,
    Query(params): Query<NearbyStopsQuery>,
) -> AppResult<impl IntoResponse> {
    let (latitude, longitude) = match (params.latitude, params.longitude) {
        (Some(lat), Some(lon)) => (lat, lon),
        _ => {
            return Err(AppError::Validation(
                "Latitude and longitude are required".to_string(),
            ))
        }
    };
    let radius = params.radius.unwrap_or(5000.0);

    // serde happily parses "NaN" and "inf" into f64 query params.
    if !latitude.is_finite() || !longitude.is_finite() || !radius.is_finite() {
        return Err(AppError::Validation(
            "Invalid latitude, longitude, or radius".to_string(),
        ));
    }

    let service = make_bus_service(db, cache.map(|c| c.0));
    let stops = service
        .nearby_stops(latitude, longitude, radius, params.city.as_deref())
        .await?;
    Ok(Json(stops))
}
