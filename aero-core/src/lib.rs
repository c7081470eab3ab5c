pub mod codes;
pub mod identity;

use aero_domain::repository::StoreError;
use aero_domain::reservation::ReservationStatus;

/// Closed taxonomy of business-rule failures. Every operation of the engine
/// returns one of these explicitly; only genuinely unexpected faults travel
/// through `Internal`.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("constraint violated: {0}")]
    ConstraintViolation(String),

    #[error("seat is not available: {0}")]
    SeatUnavailable(String),

    #[error("an active reservation already exists for this seat on this flight")]
    SeatAlreadyReserved,

    #[error("the passenger already holds an active reservation on this flight")]
    DuplicateBooking,

    #[error("cannot transition a {from} reservation to {to}")]
    InvalidTransition {
        from: ReservationStatus,
        to: ReservationStatus,
        allowed: &'static [ReservationStatus],
    },

    #[error("a ticket has already been issued for this reservation")]
    AlreadyIssued,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => CoreError::NotFound(what),
            StoreError::ActiveSeatConflict => CoreError::SeatAlreadyReserved,
            StoreError::ActivePassengerConflict => CoreError::DuplicateBooking,
            StoreError::DuplicateDocument => {
                CoreError::Validation("a passenger with this document already exists".to_string())
            }
            StoreError::TicketExists => CoreError::AlreadyIssued,
            StoreError::TransitionConflict => {
                CoreError::ConstraintViolation("reservation status changed since it was read".to_string())
            }
            StoreError::DuplicateCode | StoreError::DuplicateBarcode => {
                // Generators collision-check before commit; hitting either
                // constraint means two writers raced on the same draw.
                CoreError::Internal(err.to_string())
            }
            StoreError::Backend(msg) => CoreError::Internal(msg),
        }
    }
}
