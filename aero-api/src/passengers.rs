use axum::{extract::State, routing::get, Extension, Router};
use serde::Deserialize;

use crate::extract::{Json, Path, Query};

use aero_core::identity::Principal;
use aero_domain::passenger::{NewPassenger, Passenger};
use aero_domain::reservation::Reservation;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct PassengerQuery {
    document: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/v1/passengers",
            get(find_passenger).post(register_passenger),
        )
        .route("/v1/passengers/{id}", get(get_passenger))
        .route(
            "/v1/passengers/{id}/reservations",
            get(passenger_reservations),
        )
}

async fn register_passenger(
    State(state): State<AppState>,
    Json(req): Json<NewPassenger>,
) -> Result<Json<Passenger>, ApiError> {
    Ok(Json(state.engine.register_passenger(req).await?))
}

/// Lookup by document number, `GET /v1/passengers?document=`.
async fn find_passenger(
    State(state): State<AppState>,
    Query(query): Query<PassengerQuery>,
) -> Result<Json<Passenger>, ApiError> {
    let document = query
        .document
        .ok_or_else(|| ApiError::BadRequest("document query parameter is required".to_string()))?;
    Ok(Json(state.engine.passenger_by_document(&document).await?))
}

async fn get_passenger(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Passenger>, ApiError> {
    Ok(Json(state.engine.passenger(id).await?))
}

async fn passenger_reservations(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Reservation>>, ApiError> {
    Ok(Json(
        state.engine.passenger_reservations(id, &principal).await?,
    ))
}
