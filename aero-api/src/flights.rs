use axum::{extract::State, routing::get, Extension, Router};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::extract::{Json, Path, Query};

use aero_core::identity::Principal;
use aero_domain::flight::{Flight, FlightFilter, FlightStatus, NewFlight};
use aero_reservation::{FlightAvailability, FlightSeatMap};

use crate::error::ApiError;
use crate::middleware::auth::require_admin;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct FlightQuery {
    origin: Option<String>,
    destination: Option<String>,
    date_from: Option<String>,
    date_to: Option<String>,
    status: Option<String>,
    min_seats: Option<i64>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/flights", get(search_flights).post(create_flight))
        .route("/v1/flights/{id}", get(get_flight))
        .route("/v1/flights/{id}/seats", get(flight_seats))
}

fn parse_date(value: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| ApiError::BadRequest("Invalid date format. Use YYYY-MM-DD".to_string()))
}

async fn create_flight(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<NewFlight>,
) -> Result<Json<Flight>, ApiError> {
    require_admin(&principal)?;
    Ok(Json(state.engine.create_flight(req).await?))
}

async fn search_flights(
    State(state): State<AppState>,
    Query(query): Query<FlightQuery>,
) -> Result<Json<Vec<FlightAvailability>>, ApiError> {
    let status = match query.status.as_deref() {
        Some(raw) => Some(FlightStatus::parse(raw).ok_or_else(|| {
            ApiError::BadRequest(format!("unknown flight status: {raw}"))
        })?),
        None => None,
    };
    let filter = FlightFilter {
        origin: query.origin,
        destination: query.destination,
        date_from: query.date_from.as_deref().map(parse_date).transpose()?,
        date_to: query.date_to.as_deref().map(parse_date).transpose()?,
        status,
    };
    Ok(Json(
        state.engine.search_flights(filter, query.min_seats).await?,
    ))
}

async fn get_flight(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<FlightAvailability>, ApiError> {
    Ok(Json(state.engine.flight_availability(id).await?))
}

async fn flight_seats(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<FlightSeatMap>, ApiError> {
    Ok(Json(state.engine.flight_seat_map(id).await?))
}
