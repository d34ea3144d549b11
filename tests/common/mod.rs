#![allow(dead_code)]

use chrono::NaiveTime;
use reqwest::Client;
use sea_orm::{ConnectionTrait, DatabaseBackend, DatabaseConnection, Statement};
use sea_orm_migration::MigratorTrait;
use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Once,
};

static INIT: Once = Once::new();
static MIGRATIONS_RAN: AtomicBool = AtomicBool::new(false);
static SEED_COUNTER: AtomicUsize = AtomicUsize::new(0);

// Tests in one binary share a database and spawn_app truncates it, so each
// test holds this lock for its whole lifetime.
static DB_LOCK: tokio::sync::Mutex<()> = tokio::sync::Mutex::const_new(());

fn init_env() {
    INIT.call_once(|| {
        dotenv::dotenv().ok();
        // No outbound push calls and no throttling inside the test suite.
        std::env::set_var("PUSH_ENABLED", "false");
        std::env::set_var("RATE_LIMIT_ENABLED", "false");
    });
}

fn next_seed() -> usize {
    SEED_COUNTER.fetch_add(1, Ordering::SeqCst)
}

pub struct TestApp {
    pub addr: String,
    pub db: DatabaseConnection,
    pub client: Client,
    _db_guard: tokio::sync::MutexGuard<'static, ()>,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.addr, path)
    }

    pub fn ws_url(&self) -> String {
        format!("{}/ws", self.addr.replace("http", "ws"))
    }
}

pub async fn spawn_app() -> TestApp {
    init_env();

    let db_guard = DB_LOCK.lock().await;

    let database_url = std::env::var("TEST_DATABASE_URL")
        .unwrap_or_else(|_| std::env::var("DATABASE_URL").expect("DATABASE_URL must be set"));

    let db = sea_orm::Database::connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    // Run migrations only once globally (using atomic bool for thread safety)
    if !MIGRATIONS_RAN.swap(true, Ordering::SeqCst) {
        buslink::migration::Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");
    }

    // Clean data tables (reverse dependency order)
    cleanup_tables(&db).await;

    let hub = buslink::websocket::hub::BusHub::new();
    let push_service = buslink::services::push::PushService::from_env();

    let app = axum::Router::new()
        .route("/", axum::routing::get(|| async { "ok" }))
        .merge(buslink::routes::create_routes())
        .layer(axum::extract::Extension(db.clone()))
        .layer(axum::extract::Extension(hub))
        .layer(axum::extract::Extension(push_service));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    let addr_str = format!("http://{}", addr);
    let client = Client::new();

    TestApp {
        addr: addr_str,
        db,
        client,
        _db_guard: db_guard,
    }
}

async fn cleanup_tables(db: &DatabaseConnection) {
    let tables = ["notifications", "bus_timings", "users", "bus_stops", "buses"];

    for table in tables {
        let sql = format!("TRUNCATE TABLE {} CASCADE", table);
        let _ = db
            .execute(Statement::from_string(DatabaseBackend::Postgres, sql))
            .await;
    }
}

async fn insert_returning_id(
    db: &DatabaseConnection,
    sql: &str,
    values: Vec<sea_orm::Value>,
) -> i32 {
    let row = db
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            sql,
            values,
        ))
        .await
        .expect("Failed to execute seed insert")
        .expect("Seed insert returned no row");
    row.try_get::<i32>("", "id").expect("Seed row missing id")
}

pub async fn seed_bus(db: &DatabaseConnection, name: &str) -> i32 {
    let n = next_seed();
    insert_returning_id(
        db,
        "INSERT INTO buses (name, trip_code, device_id) VALUES ($1, $2, $3) RETURNING id",
        vec![
            name.into(),
            format!("TRIP-{}", n).into(),
            format!("device-{}", n).into(),
        ],
    )
    .await
}

pub async fn seed_accessible_bus(db: &DatabaseConnection, name: &str) -> i32 {
    let n = next_seed();
    insert_returning_id(
        db,
        "INSERT INTO buses (name, trip_code, device_id, wheelchair_accessible) \
         VALUES ($1, $2, $3, TRUE) RETURNING id",
        vec![
            name.into(),
            format!("TRIP-{}", n).into(),
            format!("device-{}", n).into(),
        ],
    )
    .await
}

pub async fn seed_user(db: &DatabaseConnection, name: &str) -> i32 {
    let n = next_seed();
    insert_returning_id(
        db,
        "INSERT INTO users (name, email) VALUES ($1, $2) RETURNING id",
        vec![name.into(), format!("{}_{}@test.com", name, n).into()],
    )
    .await
}

pub async fn seed_user_with_token(db: &DatabaseConnection, name: &str, token: &str) -> i32 {
    let n = next_seed();
    insert_returning_id(
        db,
        "INSERT INTO users (name, email, expo_token) VALUES ($1, $2, $3) RETURNING id",
        vec![
            name.into(),
            format!("{}_{}@test.com", name, n).into(),
            token.into(),
        ],
    )
    .await
}

pub async fn seed_stop(
    db: &DatabaseConnection,
    stop_name: &str,
    latitude: f64,
    longitude: f64,
    city: Option<&str>,
) -> i32 {
    insert_returning_id(
        db,
        "INSERT INTO bus_stops (stop_name, latitude, longitude, city) \
         VALUES ($1, $2, $3, $4) RETURNING id",
        vec![
            stop_name.into(),
            latitude.into(),
            longitude.into(),
            city.map(|c| c.to_string()).into(),
        ],
    )
    .await
}

pub async fn seed_timing(db: &DatabaseConnection, bus_id: i32, stop_id: i32, arrival: &str) -> i32 {
    let arrival = NaiveTime::parse_from_str(arrival, "%H:%M:%S").expect("Bad arrival time in seed");
    insert_returning_id(
        db,
        "INSERT INTO bus_timings (bus_id, stop_id, arrival_time) \
         VALUES ($1, $2, $3) RETURNING id",
        vec![bus_id.into(), stop_id.into(), arrival.into()],
    )
    .await
}

/// Create a booking through the API and return the joined notification body.
pub async fn create_booking(
    app: &TestApp,
    bus_id: i32,
    bus_stop_id: i32,
    user_id: i32,
) -> serde_json::Value {
    let resp = app
        .client
        .post(app.url("/notify"))
        .json(&serde_json::json!({
            "bus_id": bus_id,
            "bus_stop_id": bus_stop_id,
            "user_id": user_id,
            "timing": "10:30:00",
            "message": "Waiting at the stop"
        }))
        .send()
        .await
        .expect("Failed to create booking");

    let status = resp.status();
    let body: serde_json::Value = resp.json().await.expect("Failed to parse booking response");
    assert_eq!(status, 201, "booking rejected: {}", body);
    body["notification"].clone()
}

/// Advance a booking one step through the conductor endpoint.
pub async fn advance_booking(
    app: &TestApp,
    notification_id: i64,
    bus_id: i32,
) -> serde_json::Value {
    let resp = app
        .client
        .put(app.url("/notify/markseen"))
        .json(&serde_json::json!({
            "notification_id": notification_id,
            "bus_id": bus_id,
        }))
        .send()
        .await
        .expect("Failed to advance booking");

    let status = resp.status();
    let body: serde_json::Value = resp.json().await.expect("Failed to parse advance response");
    assert_eq!(status, 200, "advance rejected: {}", body);
    body
}
