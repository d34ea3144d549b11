mod config;
mod error;
mod handlers;
mod migration;
mod models;
mod routes;
mod services;
mod utils;
mod websocket;

use axum::{extract::Extension, response::IntoResponse, routing::get, Json, Router};
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use sea_orm_migration::MigratorTrait;
use serde_json::json;
use services::cache::CacheService;
use services::push::PushService;
use std::env;
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use websocket::hub::BusHub;

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        // Notification lifecycle
        crate::handlers::notify::create_notification,
        crate::handlers::notify::conductor_notifications,
        crate::handlers::notify::mark_seen,
        crate::handlers::notify::save_push_token,
        crate::handlers::notify::start_travel,
        crate::handlers::notify::confirm_travel,
        crate::handlers::notify::complete_travel,
        // Timetable and stops
        crate::handlers::bus::bus_timings,
        crate::handlers::bus::nearby_stops,
    ),
    components(
        schemas(
            crate::error::AppError,
            crate::models::BookingStatus,
            crate::models::NotificationKind,
            crate::models::NotificationView,
            crate::models::BusTimingRow,
            crate::models::NearbyStop,
            crate::handlers::notify::CreateNotificationRequest,
            crate::handlers::notify::AdvanceStatusRequest,
            crate::handlers::notify::SavePushTokenRequest,
            crate::handlers::notify::TravelEventRequest,
            crate::handlers::notify::NotificationEnvelope,
            crate::handlers::notify::MessageResponse,
        )
    ),
    tags(
        (name = "notify", description = "Booking and travel lifecycle operations"),
        (name = "buses", description = "Timetable and nearby stop lookups"),
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "buslink=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Validate configuration before doing anything else
    validate_config()?;

    tracing::info!("Starting BusLink API v{}...", env!("CARGO_PKG_VERSION"));

    let db = config::database::get_database().await?;
    tracing::info!("Database connected successfully");

    migration::Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied successfully");

    let hub = BusHub::new();

    let push_service = PushService::from_env();
    if push_service.is_configured() {
        tracing::info!("Expo push gateway configured");
    } else {
        tracing::warn!("Push gateway not configured, passenger pushes will be skipped");
    }

    // Redis/Cache is optional - graceful degradation if unavailable
    let cache = match config::redis::get_redis().await {
        Ok(conn) => {
            tracing::info!("Redis connected successfully");
            Some(CacheService::new(conn))
        }
        Err(e) => {
            tracing::warn!("Redis unavailable, running without cache: {}", e);
            None
        }
    };

    let mut app = create_app()
        .layer(Extension(db))
        .layer(Extension(hub))
        .layer(Extension(push_service));

    if let Some(cache) = cache {
        app = app.layer(Extension(cache));
    }

    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// Validate all required configuration at startup (fail-fast).
fn validate_config() -> anyhow::Result<()> {
    // DATABASE_URL — checked here for early error; actual connection happens later
    if env::var("DATABASE_URL").is_err() {
        return Err(anyhow::anyhow!(
            "DATABASE_URL environment variable must be set"
        ));
    }

    Ok(())
}

fn build_cors_layer() -> CorsLayer {
    use axum::http::{header, HeaderValue, Method};

    let origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if origins_str == "*" {
        cors.allow_origin(tower_http::cors::Any)
    } else {
        let origins: Vec<HeaderValue> = origins_str
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}

fn create_app() -> Router {
    Router::new()
        .route("/", get(health_check))
        .merge(routes::create_routes())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer())
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Health check successful", body = serde_json::Value)
    )
)]
async fn health_check(Extension(db): Extension<DatabaseConnection>) -> impl IntoResponse {
    let db_ok = db
        .query_one(Statement::from_string(
            sea_orm::DatabaseBackend::Postgres,
            "SELECT 1".to_string(),
        ))
        .await
        .is_ok();

    let status = if db_ok { "ok" } else { "degraded" };

    Json(json!({
        "status": status,
        "service": "BusLink API",
        "version": env!("CARGO_PKG_VERSION"),
        "database": db_ok,
    }))
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C signal handler");
    tracing::info!("Shutdown signal received, gracefully shutting down...");
}
