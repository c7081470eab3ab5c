use axum::{extract::State, routing::get, Extension, Router};
use serde::Deserialize;

use crate::extract::{Json, Path, Query};

use aero_core::identity::Principal;
use aero_domain::reservation::{PaymentMethod, Reservation, ReservationStatus};
use aero_reservation::{CreateReservation, TransitionOutcome};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct CreateReservationRequest {
    flight_id: i64,
    passenger_id: i64,
    seat_id: i64,
    payment_method: PaymentMethod,
}

#[derive(Debug, Deserialize)]
struct TransitionRequest {
    status: ReservationStatus,
}

#[derive(Debug, Deserialize)]
struct ReservationQuery {
    code: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/v1/reservations",
            get(reservation_by_code).post(create_reservation),
        )
        .route(
            "/v1/reservations/{id}",
            get(get_reservation).patch(transition_reservation),
        )
}

async fn create_reservation(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<CreateReservationRequest>,
) -> Result<Json<Reservation>, ApiError> {
    let reservation = state
        .engine
        .create_reservation(
            CreateReservation {
                flight_id: req.flight_id,
                passenger_id: req.passenger_id,
                seat_id: req.seat_id,
                payment_method: req.payment_method,
            },
            &principal,
        )
        .await?;
    Ok(Json(reservation))
}

/// Code lookup, `GET /v1/reservations?code=`. Case-insensitive exact match.
async fn reservation_by_code(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<ReservationQuery>,
) -> Result<Json<Reservation>, ApiError> {
    let code = query
        .code
        .ok_or_else(|| ApiError::BadRequest("code query parameter is required".to_string()))?;
    Ok(Json(
        state.engine.reservation_by_code(&code, &principal).await?,
    ))
}

async fn get_reservation(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
) -> Result<Json<Reservation>, ApiError> {
    Ok(Json(state.engine.reservation_view(id, &principal).await?))
}

async fn transition_reservation(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
    Json(req): Json<TransitionRequest>,
) -> Result<Json<TransitionOutcome>, ApiError> {
    Ok(Json(
        state.engine.transition(id, req.status, &principal).await?,
    ))
}
