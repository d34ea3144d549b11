use crate::config::rate_limit::{RateLimitConfig, RateLimitRule};
use crate::handlers;
use crate::websocket;
use axum::{routing, Router};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};

pub fn create_routes() -> Router {
    Router::new()
        .nest("/api", api_routes())
        // WebSocket route (room membership is negotiated inside the socket)
        .route("/ws", routing::get(websocket::conductor::ws_handler))
}

fn api_routes() -> Router {
    let rate_limit_config = RateLimitConfig::from_env();

    let write = write_routes(&rate_limit_config);
    let read = read_routes(&rate_limit_config);

    write.merge(read)
}

/// Write routes: bookings, status advances and token registration.
fn write_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        .route(
            "/notify",
            routing::post(handlers::notify::create_notification),
        )
        .route(
            "/notify/markseen",
            routing::put(handlers::notify::mark_seen),
        )
        .route(
            "/notify/savePushToken",
            routing::post(handlers::notify::save_push_token),
        )
        .route(
            "/notify/startTravel",
            routing::post(handlers::notify::start_travel),
        )
        .route(
            "/notify/confirmTravel",
            routing::post(handlers::notify::confirm_travel),
        )
        .route(
            "/notify/completeTravel",
            routing::post(handlers::notify::complete_travel),
        );

    with_optional_rate_limit(router, config.enabled, config.write)
}

/// Read routes: conductor roster, timetable and stop lookups.
fn read_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        .route(
            "/notify/conductor/{bus_id}",
            routing::get(handlers::notify::conductor_notifications),
        )
        .route(
            "/buses/bus_timings",
            routing::get(handlers::bus::bus_timings),
        )
        .route(
            "/buses/bus_stops",
            routing::get(handlers::bus::nearby_stops),
        );

    with_optional_rate_limit(router, config.enabled, config.read)
}

fn with_optional_rate_limit(router: Router, enabled: bool, rule: RateLimitRule) -> Router {
    if !enabled {
        return router;
    }

    let governor_conf = GovernorConfigBuilder::default()
        .per_second(rule.per_second)
        .burst_size(rule.burst_size)
        .finish()
        .expect("Invalid rate limit configuration");

    router.layer(GovernorLayer::new(governor_conf))
}
