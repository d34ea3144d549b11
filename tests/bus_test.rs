mod common;

use serde_json::Value;

#[tokio::test]
async fn timings_filter_past_arrivals_and_sort_ascending() {
    let app = common::spawn_app().await;
    let bus_a = common::seed_bus(&app.db, "Morning Express").await;
    let bus_b = common::seed_bus(&app.db, "Evening Express").await;
    let stop_id = common::seed_stop(&app.db, "Central", 11.0168, 76.9558, None).await;
    let other_stop = common::seed_stop(&app.db, "Suburb", 11.1, 77.0, None).await;

    common::seed_timing(&app.db, bus_a, stop_id, "08:00:00").await;
    common::seed_timing(&app.db, bus_b, stop_id, "18:45:00").await;
    common::seed_timing(&app.db, bus_a, stop_id, "12:30:00").await;
    // Same time at another stop must not leak in.
    common::seed_timing(&app.db, bus_b, other_stop, "12:30:00").await;

    let resp = app
        .client
        .get(app.url("/buses/bus_timings"))
        .query(&[
            ("stop_id", stop_id.to_string()),
            ("current_time", "10:00:00".to_string()),
        ])
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let rows: Value = resp.json().await.unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["arrival_time"], "12:30:00");
    assert_eq!(rows[0]["bus_name"], "Morning Express");
    assert_eq!(rows[1]["arrival_time"], "18:45:00");
    assert_eq!(rows[1]["bus_name"], "Evening Express");
    assert!(rows[0]["trip_code"].as_str().unwrap().starts_with("TRIP-"));
}

#[tokio::test]
async fn timings_require_a_stop_id() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .get(app.url("/buses/bus_timings"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "stop_id query parameter is required");
}

#[tokio::test]
async fn timings_reject_malformed_current_time() {
    let app = common::spawn_app().await;
    let stop_id = common::seed_stop(&app.db, "Mills", 11.0, 76.9, None).await;

    let resp = app
        .client
        .get(app.url("/buses/bus_timings"))
        .query(&[
            ("stop_id", stop_id.to_string()),
            ("current_time", "half past ten".to_string()),
        ])
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "current_time must be in HH:mm:ss format");
}

#[tokio::test]
async fn timings_carry_the_accessibility_flag() {
    let app = common::spawn_app().await;
    let bus_id = common::seed_accessible_bus(&app.db, "Low Floor 1").await;
    let stop_id = common::seed_stop(&app.db, "Hospital", 11.0, 76.9, None).await;
    common::seed_timing(&app.db, bus_id, stop_id, "09:15:00").await;

    let resp = app
        .client
        .get(app.url("/buses/bus_timings"))
        .query(&[
            ("stop_id", stop_id.to_string()),
            ("current_time", "06:00:00".to_string()),
        ])
        .send()
        .await
        .unwrap();

    let rows: Value = resp.json().await.unwrap();
    assert_eq!(rows[0]["wheelchair_accessible"], true);
}

#[tokio::test]
async fn nearby_stops_sort_by_distance_within_the_default_radius() {
    let app = common::spawn_app().await;
    // Offsets in latitude: 0.0045 deg ~ 0.5 km, 0.018 deg ~ 2 km, 0.09 deg ~ 10 km.
    let near = common::seed_stop(&app.db, "Five Corners", 11.0213, 76.9558, None).await;
    let mid = common::seed_stop(&app.db, "Old Market", 11.0348, 76.9558, None).await;
    common::seed_stop(&app.db, "Faraway Depot", 11.1068, 76.9558, None).await;

    let resp = app
        .client
        .get(app.url("/buses/bus_stops"))
        .query(&[("latitude", "11.0168"), ("longitude", "76.9558")])
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let rows: Value = resp.json().await.unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["id"], near);
    assert_eq!(rows[1]["id"], mid);

    let first = rows[0]["distance"].as_f64().unwrap();
    let second = rows[1]["distance"].as_f64().unwrap();
    assert!(first < second);
    assert!(first < 1.0, "nearest stop should be ~0.5 km away, got {}", first);
}

#[tokio::test]
async fn nearby_stops_honor_a_custom_radius() {
    let app = common::spawn_app().await;
    let near = common::seed_stop(&app.db, "Corner Shop", 11.0213, 76.9558, None).await;
    common::seed_stop(&app.db, "Two Km Out", 11.0348, 76.9558, None).await;
    common::seed_stop(&app.db, "Ten Km Out", 11.1068, 76.9558, None).await;

    let resp = app
        .client
        .get(app.url("/buses/bus_stops"))
        .query(&[
            ("latitude", "11.0168"),
            ("longitude", "76.9558"),
            ("radius", "600"),
        ])
        .send()
        .await
        .unwrap();

    let rows: Value = resp.json().await.unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], near);

    let resp = app
        .client
        .get(app.url("/buses/bus_stops"))
        .query(&[
            ("latitude", "11.0168"),
            ("longitude", "76.9558"),
            ("radius", "15000"),
        ])
        .send()
        .await
        .unwrap();

    let rows: Value = resp.json().await.unwrap();
    assert_eq!(rows.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn nearby_stops_require_coordinates() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .get(app.url("/buses/bus_stops"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Latitude and longitude are required");

    let resp = app
        .client
        .get(app.url("/buses/bus_stops"))
        .query(&[("latitude", "11.0168")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // serde parses "NaN" into a float; the handler must still refuse it.
    let resp = app
        .client
        .get(app.url("/buses/bus_stops"))
        .query(&[("latitude", "NaN"), ("longitude", "76.9558")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Invalid latitude, longitude, or radius");
}

#[tokio::test]
async fn nearby_stops_filter_by_city() {
    let app = common::spawn_app().await;
    let local = common::seed_stop(&app.db, "Town Hall", 11.0213, 76.9558, Some("Coimbatore")).await;
    common::seed_stop(&app.db, "Other Town Hall", 11.0220, 76.9558, Some("Chennai")).await;

    let resp = app
        .client
        .get(app.url("/buses/bus_stops"))
        .query(&[
            ("latitude", "11.0168"),
            ("longitude", "76.9558"),
            ("city", "Coimbatore"),
        ])
        .send()
        .await
        .unwrap();

    let rows: Value = resp.json().await.unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], local);
}
