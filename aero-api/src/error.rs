use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use aero_core::CoreError;
use aero_domain::reservation::ReservationStatus;

/// API-boundary error. Business failures arrive as `CoreError` and are mapped
/// onto the response envelope; the two extra variants exist for failures that
/// never reach the engine.
#[derive(Debug)]
pub enum ApiError {
    AuthenticationError(String),
    BadRequest(String),
    Core(CoreError),
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError::Core(err)
    }
}

fn allowed_json(allowed: &[ReservationStatus]) -> Value {
    Value::Array(
        allowed
            .iter()
            .map(|s| Value::String(s.as_str().to_string()))
            .collect(),
    )
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match self {
            ApiError::AuthenticationError(msg) => {
                (StatusCode::UNAUTHORIZED, "authentication_error", msg, None)
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::Core(err) => match &err {
                CoreError::Validation(_) => {
                    (StatusCode::BAD_REQUEST, "validation_error", err.to_string(), None)
                }
                CoreError::ConstraintViolation(_) => (
                    StatusCode::BAD_REQUEST,
                    "constraint_violation",
                    err.to_string(),
                    None,
                ),
                CoreError::SeatUnavailable(_) => {
                    (StatusCode::CONFLICT, "seat_unavailable", err.to_string(), None)
                }
                CoreError::SeatAlreadyReserved => (
                    StatusCode::CONFLICT,
                    "seat_already_reserved",
                    err.to_string(),
                    None,
                ),
                CoreError::DuplicateBooking => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "duplicate_booking",
                    err.to_string(),
                    None,
                ),
                CoreError::InvalidTransition { from, to, allowed } => (
                    StatusCode::BAD_REQUEST,
                    "invalid_transition",
                    err.to_string(),
                    Some(json!({
                        "from": from.as_str(),
                        "to": to.as_str(),
                        "allowed": allowed_json(allowed),
                    })),
                ),
                CoreError::AlreadyIssued => (
                    StatusCode::CONFLICT,
                    "ticket_already_issued",
                    err.to_string(),
                    None,
                ),
                CoreError::NotFound(_) => {
                    (StatusCode::NOT_FOUND, "not_found", err.to_string(), None)
                }
                CoreError::PermissionDenied(_) => {
                    (StatusCode::FORBIDDEN, "permission_denied", err.to_string(), None)
                }
                CoreError::Internal(msg) => {
                    tracing::error!("Internal Server Error: {}", msg);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "internal_error",
                        "Internal Server Error".to_string(),
                        None,
                    )
                }
            },
        };

        let mut body = json!({
            "error": code,
            "message": message,
            "status_code": status.as_u16(),
        });
        if let Some(details) = details {
            body["details"] = details;
        }

        (status, Json(body)).into_response()
    }
}
