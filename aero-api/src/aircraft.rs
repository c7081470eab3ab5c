use axum::{
    extract::State,
    routing::{get, post},
    Extension, Router,
};
use serde::Serialize;

use crate::extract::{Json, Path};

use aero_core::identity::Principal;
use aero_domain::aircraft::{Aircraft, NewAircraft};
use aero_inventory::seats::SeatMapRow;

use crate::error::ApiError;
use crate::middleware::auth::require_admin;
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct SeatMapResponse {
    aircraft: Aircraft,
    rows: Vec<SeatMapRow>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/aircraft", post(create_aircraft).get(list_aircraft))
        .route("/v1/aircraft/{id}", get(get_aircraft))
        .route("/v1/aircraft/{id}/seats", get(aircraft_seats))
}

async fn create_aircraft(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<NewAircraft>,
) -> Result<Json<Aircraft>, ApiError> {
    require_admin(&principal)?;
    let aircraft = state.engine.create_aircraft(req).await?;
    Ok(Json(aircraft))
}

async fn list_aircraft(State(state): State<AppState>) -> Result<Json<Vec<Aircraft>>, ApiError> {
    Ok(Json(state.engine.list_aircraft().await?))
}

async fn get_aircraft(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Aircraft>, ApiError> {
    Ok(Json(state.engine.aircraft(id).await?))
}

async fn aircraft_seats(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<SeatMapResponse>, ApiError> {
    let aircraft = state.engine.aircraft(id).await?;
    let rows = state.engine.aircraft_seat_map(id).await?;
    Ok(Json(SeatMapResponse { aircraft, rows }))
}
