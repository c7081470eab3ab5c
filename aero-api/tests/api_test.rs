use std::sync::Arc;

use aero_api::middleware::auth::Claims;
use aero_api::{
    app,
    state::{AppState, AuthConfig},
};
use aero_core::identity::Principal;
use aero_reservation::{MemoryStore, ReservationEngine};
use aero_store::app_config::DemoUser;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tower::ServiceExt;

const SECRET: &str = "test-secret";

fn test_app() -> (Router, Arc<ReservationEngine>) {
    let engine = Arc::new(ReservationEngine::new(Arc::new(MemoryStore::new())));
    let state = AppState {
        engine: engine.clone(),
        auth: AuthConfig {
            secret: SECRET.to_string(),
            expiration: 3600,
            users: vec![DemoUser {
                username: "admin".to_string(),
                password: "admin".to_string(),
                role: "admin".to_string(),
                email: Some("admin@example.com".to_string()),
            }],
        },
    };
    (app(state), engine)
}

fn token(sub: &str, role: &str) -> String {
    let claims = Claims {
        sub: sub.to_string(),
        email: None,
        role: role.to_string(),
        exp: (Utc::now() + Duration::hours(1)).timestamp() as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

async fn request(
    app: &Router,
    method: &str,
    uri: &str,
    bearer: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(bearer) = bearer {
        builder = builder.header("Authorization", format!("Bearer {bearer}"));
    }
    let body = match body {
        Some(v) => {
            builder = builder.header("content-type", "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

/// Create aircraft + flight + passenger through the API; returns
/// (flight_id, passenger_id, seat ids in row-major order).
async fn seed_flight(app: &Router, admin: &str) -> (i64, i64, Vec<i64>) {
    let (status, aircraft) = request(
        app,
        "POST",
        "/v1/aircraft",
        Some(admin),
        Some(json!({"model": "E190", "seat_rows": 2, "seat_columns": 2})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let aircraft_id = aircraft["id"].as_i64().unwrap();
    assert_eq!(aircraft["capacity"], 4);

    let (status, flight) = request(
        app,
        "POST",
        "/v1/flights",
        Some(admin),
        Some(json!({
            "aircraft_id": aircraft_id,
            "origin": "Buenos Aires",
            "destination": "Cordoba",
            "departure_at": "2026-12-01T10:00:00Z",
            "arrival_at": "2026-12-01T12:00:00Z",
            "base_price_cents": 10000
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let flight_id = flight["id"].as_i64().unwrap();

    let (status, passenger) = request(
        app,
        "POST",
        "/v1/passengers",
        Some(admin),
        Some(json!({
            "given_name": "Ana",
            "family_name": "Suarez",
            "document_type": "dni",
            "document_number": "30111222",
            "email": "ana@example.com",
            "phone": "+54 11 5555 0001",
            "date_of_birth": "1990-06-15"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let passenger_id = passenger["id"].as_i64().unwrap();

    let (status, seat_map) = request(
        app,
        "GET",
        &format!("/v1/aircraft/{aircraft_id}/seats"),
        Some(admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let seat_ids: Vec<i64> = seat_map["rows"]
        .as_array()
        .unwrap()
        .iter()
        .flat_map(|row| row["seats"].as_array().unwrap())
        .map(|entry| entry["seat"]["id"].as_i64().unwrap())
        .collect();
    assert_eq!(seat_ids.len(), 4);

    (flight_id, passenger_id, seat_ids)
}

#[tokio::test]
async fn requests_without_a_token_are_rejected() {
    let (app, _) = test_app();
    let (status, body) = request(&app, "GET", "/v1/flights", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "authentication_error");
    assert_eq!(body["status_code"], 401);
    assert!(body["message"].as_str().unwrap().contains("bearer token"));

    let (status, body) = request(&app, "GET", "/v1/flights", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "authentication_error");
}

#[tokio::test]
async fn extractor_failures_use_the_error_envelope() {
    let (app, _) = test_app();
    let admin = token("ops", "admin");

    // Body that does not deserialize into the expected shape.
    let (status, body) = request(
        &app,
        "POST",
        "/v1/aircraft",
        Some(&admin),
        Some(json!({"model": "E190"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
    assert_eq!(body["status_code"], 400);

    // Non-numeric path parameter.
    let (status, body) = request(&app, "GET", "/v1/flights/not-a-number", Some(&admin), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
    assert_eq!(body["status_code"], 400);
}

#[tokio::test]
async fn token_endpoint_exchanges_demo_credentials() {
    let (app, _) = test_app();

    let (status, body) = request(
        &app,
        "POST",
        "/v1/auth/token",
        None,
        Some(json!({"username": "admin", "password": "admin"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let minted = body["token"].as_str().unwrap().to_string();
    assert_eq!(body["token_type"], "Bearer");

    let (status, _) = request(&app, "GET", "/v1/flights", Some(&minted), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = request(
        &app,
        "POST",
        "/v1/auth/token",
        None,
        Some(json!({"username": "admin", "password": "wrong"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "authentication_error");
}

#[tokio::test]
async fn booking_flow_over_http() {
    let (app, _) = test_app();
    let admin = token("ops", "admin");
    let (flight_id, passenger_id, seat_ids) = seed_flight(&app, &admin).await;

    let (status, reservation) = request(
        &app,
        "POST",
        "/v1/reservations",
        Some(&admin),
        Some(json!({
            "flight_id": flight_id,
            "passenger_id": passenger_id,
            "seat_id": seat_ids[0],
            "payment_method": "card"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reservation["status"], "confirmed");
    assert_eq!(reservation["price_cents"], 10000);
    let reservation_id = reservation["id"].as_i64().unwrap();
    let code = reservation["code"].as_str().unwrap().to_string();
    assert_eq!(code.len(), 6);

    // Availability drops to 3.
    let (status, availability) = request(
        &app,
        "GET",
        &format!("/v1/flights/{flight_id}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(availability["available_seats"], 3);

    // Same seat, second passenger: rejected with the conflict envelope.
    let (status, other) = request(
        &app,
        "POST",
        "/v1/passengers",
        Some(&admin),
        Some(json!({
            "given_name": "Bruno",
            "family_name": "Gil",
            "document_type": "passport",
            "document_number": "AB123456",
            "email": "bruno@example.com",
            "phone": "+54 11 5555 0002",
            "date_of_birth": "1985-01-20"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = request(
        &app,
        "POST",
        "/v1/reservations",
        Some(&admin),
        Some(json!({
            "flight_id": flight_id,
            "passenger_id": other["id"],
            "seat_id": seat_ids[0],
            "payment_method": "cash"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "seat_already_reserved");
    assert_eq!(body["status_code"], 409);

    // Code lookup is case-insensitive.
    let (status, by_code) = request(
        &app,
        "GET",
        &format!("/v1/reservations?code={}", code.to_lowercase()),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_code["id"], reservation_id);

    // Cancel releases the seat.
    let (status, outcome) = request(
        &app,
        "PATCH",
        &format!("/v1/reservations/{reservation_id}"),
        Some(&admin),
        Some(json!({"status": "cancelled"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["changed"], true);

    let (status, availability) = request(
        &app,
        "GET",
        &format!("/v1/flights/{flight_id}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(availability["available_seats"], 4);
}

#[tokio::test]
async fn invalid_transition_reports_the_allowed_set() {
    let (app, _) = test_app();
    let admin = token("ops", "admin");
    let (flight_id, passenger_id, seat_ids) = seed_flight(&app, &admin).await;

    let (_, reservation) = request(
        &app,
        "POST",
        "/v1/reservations",
        Some(&admin),
        Some(json!({
            "flight_id": flight_id,
            "passenger_id": passenger_id,
            "seat_id": seat_ids[1],
            "payment_method": "card"
        })),
    )
    .await;
    let reservation_id = reservation["id"].as_i64().unwrap();

    let (status, body) = request(
        &app,
        "PATCH",
        &format!("/v1/reservations/{reservation_id}"),
        Some(&admin),
        Some(json!({"status": "pending"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_transition");
    assert_eq!(body["details"]["from"], "confirmed");
    let allowed: Vec<&str> = body["details"]["allowed"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert_eq!(allowed, vec!["paid", "cancelled"]);
}

#[tokio::test]
async fn non_admins_cannot_create_inventory() {
    let (app, _) = test_app();
    let agent = token("agent", "agent");

    let (status, body) = request(
        &app,
        "POST",
        "/v1/aircraft",
        Some(&agent),
        Some(json!({"model": "E190", "seat_rows": 2, "seat_columns": 2})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "permission_denied");
}

#[tokio::test]
async fn invalid_date_filter_is_a_bad_request() {
    let (app, _) = test_app();
    let admin = token("ops", "admin");

    let (status, body) = request(
        &app,
        "GET",
        "/v1/flights?date_from=01-12-2026",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid date format. Use YYYY-MM-DD");
}

#[tokio::test]
async fn tickets_follow_the_reservation_lifecycle() {
    let (app, engine) = test_app();
    let admin = token("ops", "admin");
    let (flight_id, passenger_id, seat_ids) = seed_flight(&app, &admin).await;

    let (_, reservation) = request(
        &app,
        "POST",
        "/v1/reservations",
        Some(&admin),
        Some(json!({
            "flight_id": flight_id,
            "passenger_id": passenger_id,
            "seat_id": seat_ids[0],
            "payment_method": "card"
        })),
    )
    .await;
    let reservation_id = reservation["id"].as_i64().unwrap();

    // A ticket was issued together with the confirmed reservation.
    let (status, body) = request(
        &app,
        "POST",
        "/v1/tickets/issue",
        Some(&admin),
        Some(json!({"reservation_id": reservation_id})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "ticket_already_issued");

    // Barcode lookup through the query endpoint.
    let principal = Principal::admin("ops");
    let ticket = engine
        .ticket_for_reservation(reservation_id, &principal)
        .await
        .unwrap()
        .unwrap();
    let (status, found) = request(
        &app,
        "GET",
        &format!("/v1/tickets?barcode={}", ticket.barcode),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found["reservation_id"], reservation_id);

    // Cancelling removes the ticket; the barcode stops resolving.
    let (status, _) = request(
        &app,
        "PATCH",
        &format!("/v1/reservations/{reservation_id}"),
        Some(&admin),
        Some(json!({"status": "cancelled"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = request(
        &app,
        "GET",
        &format!("/v1/tickets?barcode={}", ticket.barcode),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn summary_report_is_admin_only() {
    let (app, _) = test_app();
    let admin = token("ops", "admin");
    let agent = token("agent", "agent");
    let (flight_id, passenger_id, seat_ids) = seed_flight(&app, &admin).await;

    let (status, _) = request(&app, "GET", "/v1/reports/summary", Some(&agent), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, _reservation) = request(
        &app,
        "POST",
        "/v1/reservations",
        Some(&admin),
        Some(json!({
            "flight_id": flight_id,
            "passenger_id": passenger_id,
            "seat_id": seat_ids[0],
            "payment_method": "card"
        })),
    )
    .await;

    let (status, summary) = request(&app, "GET", "/v1/reports/summary", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["total_flights"], 1);
    assert_eq!(summary["confirmed_reservations"], 1);
    assert_eq!(summary["total_revenue_cents"], 10000);
    assert_eq!(summary["average_occupancy_pct"], 25.0);
}
