use axum::{extract::State, routing::get, Extension, Router};
use serde::Deserialize;

use crate::extract::{Json, Query};

use aero_core::identity::Principal;
use aero_domain::repository::SystemSummary;
use aero_reservation::{FlightManifest, PassengerActivity};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct ManifestQuery {
    flight_id: i64,
}

#[derive(Debug, Deserialize)]
struct ActivityQuery {
    passenger_id: i64,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/reports/flight-manifest", get(flight_manifest))
        .route("/v1/reports/passenger-activity", get(passenger_activity))
        .route("/v1/reports/summary", get(summary))
}

async fn flight_manifest(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<ManifestQuery>,
) -> Result<Json<FlightManifest>, ApiError> {
    Ok(Json(
        state
            .engine
            .flight_manifest(query.flight_id, &principal)
            .await?,
    ))
}

async fn passenger_activity(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<ActivityQuery>,
) -> Result<Json<PassengerActivity>, ApiError> {
    Ok(Json(
        state
            .engine
            .passenger_activity(query.passenger_id, &principal)
            .await?,
    ))
}

async fn summary(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<SystemSummary>, ApiError> {
    Ok(Json(state.engine.summary(&principal).await?))
}
