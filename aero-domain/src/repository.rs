use async_trait::async_trait;
use serde::Serialize;

use crate::aircraft::{Aircraft, NewAircraft, NewSeat, Seat, SeatState};
use crate::flight::{Flight, FlightFilter, NewFlight};
use crate::passenger::{NewPassenger, Passenger};
use crate::reservation::{NewReservation, NewTicket, Reservation, ReservationStatus, Ticket};

/// Failures surfaced by a store implementation. Conflict variants correspond
/// to the uniqueness constraints the storage layer enforces at commit time.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("an active reservation already exists for this flight and seat")]
    ActiveSeatConflict,

    #[error("an active reservation already exists for this flight and passenger")]
    ActivePassengerConflict,

    #[error("reservation code already in use")]
    DuplicateCode,

    #[error("ticket barcode already in use")]
    DuplicateBarcode,

    #[error("a passenger with this document already exists")]
    DuplicateDocument,

    #[error("a ticket already exists for this reservation")]
    TicketExists,

    #[error("reservation status changed since it was read")]
    TransitionConflict,

    #[error("storage backend failure: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn backend(err: impl std::fmt::Display) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// Side effects the store must apply atomically together with a reservation
/// status change. The engine decides the effects; the store applies them in
/// one transaction so capacity-view readers never observe a half-applied
/// transition.
#[derive(Debug, Clone, Default)]
pub struct TransitionEffects {
    /// Seat to move and the state to assign it.
    pub seat_update: Option<(i64, SeatState)>,
    pub delete_ticket: bool,
    pub issue_ticket: Option<NewTicket>,
}

/// System-wide counters for the summary report.
#[derive(Debug, Clone, Serialize)]
pub struct SystemSummary {
    pub total_flights: i64,
    pub scheduled_flights: i64,
    pub total_reservations: i64,
    pub confirmed_reservations: i64,
    pub paid_reservations: i64,
    pub cancelled_reservations: i64,
    pub total_passengers: i64,
    pub total_revenue_cents: i64,
    pub average_occupancy_pct: f64,
}

/// Data access boundary for the reservation engine. Implementations must
/// enforce the uniqueness constraints in storage, not only trust callers:
/// (aircraft, seat number), (document type, document number), reservation
/// code, ticket barcode, and at most one active reservation per
/// (flight, seat) and per (flight, passenger).
#[async_trait]
pub trait ReservationStore: Send + Sync {
    // Aircraft and seats
    async fn insert_aircraft(
        &self,
        aircraft: NewAircraft,
        seats: Vec<NewSeat>,
    ) -> Result<Aircraft, StoreError>;
    async fn aircraft(&self, id: i64) -> Result<Option<Aircraft>, StoreError>;
    async fn list_aircraft(&self) -> Result<Vec<Aircraft>, StoreError>;
    async fn seats_for_aircraft(&self, aircraft_id: i64) -> Result<Vec<Seat>, StoreError>;
    /// Used only by the regeneration guard when an aircraft owns no seats.
    async fn insert_seats(
        &self,
        aircraft_id: i64,
        seats: Vec<NewSeat>,
    ) -> Result<usize, StoreError>;
    async fn seat(&self, id: i64) -> Result<Option<Seat>, StoreError>;
    async fn set_seat_state(&self, seat_id: i64, state: SeatState) -> Result<(), StoreError>;

    // Flights
    async fn insert_flight(&self, flight: NewFlight) -> Result<Flight, StoreError>;
    async fn flight(&self, id: i64) -> Result<Option<Flight>, StoreError>;
    async fn list_flights(&self, filter: FlightFilter) -> Result<Vec<Flight>, StoreError>;
    /// Count of confirmed/paid reservations on the flight. Always a fresh
    /// scan, never a cached counter.
    async fn active_reservation_count(&self, flight_id: i64) -> Result<i64, StoreError>;
    /// Seat ids held by an active reservation on the flight.
    async fn reserved_seat_ids(&self, flight_id: i64) -> Result<Vec<i64>, StoreError>;

    // Passengers
    async fn insert_passenger(&self, passenger: NewPassenger) -> Result<Passenger, StoreError>;
    async fn passenger(&self, id: i64) -> Result<Option<Passenger>, StoreError>;
    async fn passenger_by_document(
        &self,
        document_number: &str,
    ) -> Result<Option<Passenger>, StoreError>;

    // Reservations
    async fn reservation(&self, id: i64) -> Result<Option<Reservation>, StoreError>;
    /// Case-insensitive exact match on the reservation code.
    async fn reservation_by_code(&self, code: &str) -> Result<Option<Reservation>, StoreError>;
    async fn reservation_code_exists(&self, code: &str) -> Result<bool, StoreError>;
    async fn has_active_for_seat(
        &self,
        flight_id: i64,
        seat_id: i64,
    ) -> Result<bool, StoreError>;
    async fn has_active_for_passenger(
        &self,
        flight_id: i64,
        passenger_id: i64,
    ) -> Result<bool, StoreError>;
    /// Atomically: insert the reservation, move its seat to the given state,
    /// and (when a barcode is supplied) issue a ticket against the new row.
    /// Returns the conflict variants when an active-uniqueness constraint
    /// rejects the commit.
    async fn insert_reservation(
        &self,
        reservation: NewReservation,
        seat_state: SeatState,
        ticket_barcode: Option<String>,
    ) -> Result<Reservation, StoreError>;
    /// Atomically apply a status change and its side effects. The status
    /// write is a compare-and-set against `from_status`; a reservation whose
    /// status moved since the caller read it fails with `TransitionConflict`
    /// and none of the effects are applied.
    async fn apply_transition(
        &self,
        reservation_id: i64,
        from_status: ReservationStatus,
        new_status: ReservationStatus,
        effects: TransitionEffects,
    ) -> Result<Reservation, StoreError>;
    async fn reservations_for_passenger(
        &self,
        passenger_id: i64,
    ) -> Result<Vec<Reservation>, StoreError>;
    /// Reservations on a flight, optionally restricted to active ones.
    async fn reservations_for_flight(
        &self,
        flight_id: i64,
        only_active: bool,
    ) -> Result<Vec<Reservation>, StoreError>;

    // Tickets
    async fn insert_ticket(&self, ticket: NewTicket) -> Result<Ticket, StoreError>;
    async fn ticket_for_reservation(
        &self,
        reservation_id: i64,
    ) -> Result<Option<Ticket>, StoreError>;
    async fn ticket_by_barcode(&self, barcode: &str) -> Result<Option<Ticket>, StoreError>;
    async fn barcode_exists(&self, barcode: &str) -> Result<bool, StoreError>;

    // Reports
    async fn summary(&self) -> Result<SystemSummary, StoreError>;
}
