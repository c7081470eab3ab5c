use axum::{
    extract::State,
    routing::{get, post},
    Extension, Router,
};
use serde::Deserialize;

use crate::extract::{Json, Query};

use aero_core::identity::Principal;
use aero_domain::reservation::Ticket;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct IssueTicketRequest {
    reservation_id: i64,
}

#[derive(Debug, Deserialize)]
struct TicketQuery {
    barcode: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/tickets/issue", post(issue_ticket))
        .route("/v1/tickets", get(ticket_by_barcode))
}

async fn issue_ticket(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<IssueTicketRequest>,
) -> Result<Json<Ticket>, ApiError> {
    Ok(Json(
        state
            .engine
            .issue_ticket(req.reservation_id, &principal)
            .await?,
    ))
}

/// Barcode lookup, `GET /v1/tickets?barcode=`.
async fn ticket_by_barcode(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<TicketQuery>,
) -> Result<Json<Ticket>, ApiError> {
    let barcode = query
        .barcode
        .ok_or_else(|| ApiError::BadRequest("barcode query parameter is required".to_string()))?;
    Ok(Json(
        state.engine.ticket_by_barcode(&barcode, &principal).await?,
    ))
}
