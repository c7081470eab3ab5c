use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Datelike, Utc};
use serde::Serialize;
use tracing::info;

use aero_core::codes;
use aero_core::identity::Principal;
use aero_core::{CoreError, CoreResult};
use aero_domain::aircraft::{Aircraft, NewAircraft, SeatState};
use aero_domain::flight::{Flight, FlightFilter, NewFlight};
use aero_domain::passenger::{NewPassenger, Passenger};
use aero_domain::repository::{ReservationStore, StoreError, SystemSummary, TransitionEffects};
use aero_domain::reservation::{
    NewReservation, NewTicket, PaymentMethod, Reservation, ReservationStatus,
};
use aero_inventory::seats::{group_by_row, seat_blueprints, SeatMapRow};
use aero_inventory::{available_seats, occupancy_percentage};

/// A flight together with its derived availability figures.
#[derive(Debug, Clone, Serialize)]
pub struct FlightAvailability {
    pub flight: Flight,
    pub available_seats: i64,
    pub occupancy_pct: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FlightSeatMap {
    pub flight: Flight,
    pub rows: Vec<SeatMapRow>,
    pub total_seats: usize,
    pub available_seats: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ManifestEntry {
    pub reservation: Reservation,
    pub passenger: Passenger,
    pub seat_number: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ManifestStats {
    pub occupied_seats: i64,
    pub available_seats: i64,
    pub occupancy_pct: f64,
    pub total_revenue_cents: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FlightManifest {
    pub flight: Flight,
    pub entries: Vec<ManifestEntry>,
    pub stats: ManifestStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct PassengerActivity {
    pub passenger: Passenger,
    pub reservations: Vec<Reservation>,
    pub confirmed: usize,
    pub paid: usize,
    pub pending: usize,
    pub total_value_cents: i64,
}

/// Candidate supplied by a caller (web form handler or API endpoint).
#[derive(Debug, Clone)]
pub struct CreateReservation {
    pub flight_id: i64,
    pub passenger_id: i64,
    pub seat_id: i64,
    pub payment_method: PaymentMethod,
}

/// Result of a status transition. `changed` is false for the idempotent
/// re-cancel path, which is reported as a no-op rather than an error.
#[derive(Debug, Clone, Serialize)]
pub struct TransitionOutcome {
    pub reservation: Reservation,
    pub changed: bool,
    pub message: String,
}

/// The reservation/seat consistency engine. Validates candidates against the
/// seat inventory and existing reservations, drives the status transition
/// table, and keeps seat state and ticket issuance synchronized with
/// reservation state. All writes go through coarse store operations that the
/// backend applies atomically.
pub struct ReservationEngine {
    store: Arc<dyn ReservationStore>,
}

impl ReservationEngine {
    pub fn new(store: Arc<dyn ReservationStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn ReservationStore> {
        &self.store
    }

    // ------------------------------------------------------------------
    // Aircraft and seat inventory
    // ------------------------------------------------------------------

    /// Create an aircraft together with its full seat set. Capacity is
    /// derived from the grid; the seat set is generated exactly once.
    pub async fn create_aircraft(&self, new: NewAircraft) -> CoreResult<Aircraft> {
        if new.seat_rows < 1 || new.seat_columns < 1 {
            return Err(CoreError::Validation(
                "an aircraft needs at least one row and one column".to_string(),
            ));
        }
        if new.model.trim().is_empty() {
            return Err(CoreError::Validation("aircraft model is required".to_string()));
        }
        let seats = seat_blueprints(new.seat_rows, new.seat_columns);
        let aircraft = self.store.insert_aircraft(new, seats).await?;
        info!(aircraft_id = aircraft.id, capacity = aircraft.capacity, "aircraft created");
        Ok(aircraft)
    }

    pub async fn aircraft(&self, id: i64) -> CoreResult<Aircraft> {
        self.store
            .aircraft(id)
            .await?
            .ok_or(CoreError::NotFound("aircraft"))
    }

    pub async fn list_aircraft(&self) -> CoreResult<Vec<Aircraft>> {
        Ok(self.store.list_aircraft().await?)
    }

    /// Regenerate the seat set only if the aircraft owns no seats. Returns
    /// the number of seats generated; 0 means the guard made it a no-op.
    pub async fn ensure_seats(&self, aircraft_id: i64) -> CoreResult<usize> {
        let aircraft = self.aircraft(aircraft_id).await?;
        let existing = self.store.seats_for_aircraft(aircraft_id).await?;
        if !existing.is_empty() {
            return Ok(0);
        }
        let seats = seat_blueprints(aircraft.seat_rows, aircraft.seat_columns);
        let generated = self.store.insert_seats(aircraft_id, seats).await?;
        Ok(generated)
    }

    /// Seat layout of an aircraft grouped by row, with no flight context.
    pub async fn aircraft_seat_map(&self, aircraft_id: i64) -> CoreResult<Vec<SeatMapRow>> {
        self.aircraft(aircraft_id).await?;
        let seats = self.store.seats_for_aircraft(aircraft_id).await?;
        Ok(group_by_row(seats, &HashSet::new()))
    }

    /// Unconditional seat state assignment; any state is reachable from any
    /// state. Fails only when the seat does not exist.
    pub async fn set_seat_state(&self, seat_id: i64, state: SeatState) -> CoreResult<()> {
        self.store.set_seat_state(seat_id, state).await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Flights
    // ------------------------------------------------------------------

    pub async fn create_flight(&self, new: NewFlight) -> CoreResult<Flight> {
        if new.departure_at >= new.arrival_at {
            return Err(CoreError::Validation(
                "departure must be strictly before arrival".to_string(),
            ));
        }
        if new.base_price_cents < 0 {
            return Err(CoreError::Validation(
                "base price must not be negative".to_string(),
            ));
        }
        self.aircraft(new.aircraft_id).await?;
        Ok(self.store.insert_flight(new).await?)
    }

    pub async fn flight(&self, id: i64) -> CoreResult<Flight> {
        self.store
            .flight(id)
            .await?
            .ok_or(CoreError::NotFound("flight"))
    }

    /// Flights matching the filter, each with availability figures, keeping
    /// only those with at least `min_seats` sellable seats when given.
    pub async fn search_flights(
        &self,
        filter: FlightFilter,
        min_seats: Option<i64>,
    ) -> CoreResult<Vec<FlightAvailability>> {
        let flights = self.store.list_flights(filter).await?;
        let mut results = Vec::with_capacity(flights.len());
        for flight in flights {
            let availability = self.availability(&flight).await?;
            if let Some(min) = min_seats {
                if availability.available_seats < min {
                    continue;
                }
            }
            results.push(availability);
        }
        Ok(results)
    }

    pub async fn flight_availability(&self, flight_id: i64) -> CoreResult<FlightAvailability> {
        let flight = self.flight(flight_id).await?;
        self.availability(&flight).await
    }

    async fn availability(&self, flight: &Flight) -> CoreResult<FlightAvailability> {
        let aircraft = self.aircraft(flight.aircraft_id).await?;
        let active = self.store.active_reservation_count(flight.id).await?;
        Ok(FlightAvailability {
            flight: flight.clone(),
            available_seats: available_seats(aircraft.capacity, active),
            occupancy_pct: occupancy_percentage(aircraft.capacity, active),
        })
    }

    /// Per-flight seat map: aircraft seats grouped by row, each flagged
    /// reserved when an active reservation on this flight holds it.
    pub async fn flight_seat_map(&self, flight_id: i64) -> CoreResult<FlightSeatMap> {
        let flight = self.flight(flight_id).await?;
        let aircraft = self.aircraft(flight.aircraft_id).await?;
        let seats = self.store.seats_for_aircraft(flight.aircraft_id).await?;
        let reserved: HashSet<i64> = self
            .store
            .reserved_seat_ids(flight_id)
            .await?
            .into_iter()
            .collect();
        let total_seats = seats.len();
        let available = available_seats(aircraft.capacity, reserved.len() as i64);
        Ok(FlightSeatMap {
            flight,
            rows: group_by_row(seats, &reserved),
            total_seats,
            available_seats: available,
        })
    }

    // ------------------------------------------------------------------
    // Passengers
    // ------------------------------------------------------------------

    pub async fn register_passenger(&self, new: NewPassenger) -> CoreResult<Passenger> {
        let today = Utc::now().date_naive();
        if new.date_of_birth > today {
            return Err(CoreError::Validation(
                "date of birth cannot be in the future".to_string(),
            ));
        }
        if new.date_of_birth.year() <= 1900 {
            return Err(CoreError::Validation(
                "date of birth must be after the year 1900".to_string(),
            ));
        }
        if new.email.trim().is_empty() {
            return Err(CoreError::Validation("email is required".to_string()));
        }
        Ok(self.store.insert_passenger(new).await?)
    }

    pub async fn passenger(&self, id: i64) -> CoreResult<Passenger> {
        self.store
            .passenger(id)
            .await?
            .ok_or(CoreError::NotFound("passenger"))
    }

    pub async fn passenger_by_document(&self, document_number: &str) -> CoreResult<Passenger> {
        self.store
            .passenger_by_document(document_number)
            .await?
            .ok_or(CoreError::NotFound("passenger"))
    }

    // ------------------------------------------------------------------
    // Reservation state machine
    // ------------------------------------------------------------------

    /// Validate and commit a reservation candidate. The four validations run
    /// before any mutation; the store re-enforces the two active-uniqueness
    /// rules at commit time, so a concurrent writer that slips past the
    /// read-phase checks still loses with the same error.
    pub async fn create_reservation(
        &self,
        request: CreateReservation,
        principal: &Principal,
    ) -> CoreResult<Reservation> {
        let flight = self.flight(request.flight_id).await?;
        self.passenger(request.passenger_id).await?;
        let seat = self
            .store
            .seat(request.seat_id)
            .await?
            .ok_or(CoreError::NotFound("seat"))?;

        if seat.aircraft_id != flight.aircraft_id {
            return Err(CoreError::ConstraintViolation(format!(
                "seat {} does not belong to the aircraft operating this flight",
                seat.number
            )));
        }
        // The per-flight rule outranks the shared seat flag: a seat held by
        // an active reservation on this flight reports the conflict, not the
        // generic flag state.
        if self
            .store
            .has_active_for_seat(flight.id, seat.id)
            .await?
        {
            return Err(CoreError::SeatAlreadyReserved);
        }
        if seat.state != SeatState::Available {
            return Err(CoreError::SeatUnavailable(format!(
                "seat {} is {}",
                seat.number,
                seat.state.as_str()
            )));
        }
        if self
            .store
            .has_active_for_passenger(flight.id, request.passenger_id)
            .await?
        {
            return Err(CoreError::DuplicateBooking);
        }

        let code = self.unique_reservation_code().await?;
        // Created confirmed on every path, so the ticket is part of the same
        // commit as the reservation and the seat hold.
        let barcode = self.unique_barcode().await?;
        let draft = NewReservation {
            flight_id: flight.id,
            passenger_id: request.passenger_id,
            seat_id: seat.id,
            status: ReservationStatus::Confirmed,
            price_cents: flight.base_price_cents,
            payment_method: request.payment_method,
            code,
            owner: Some(principal.subject.clone()),
        };
        let reservation = self
            .store
            .insert_reservation(draft, SeatState::Held, Some(barcode))
            .await?;
        info!(
            reservation_id = reservation.id,
            code = %reservation.code,
            flight_id = flight.id,
            seat_id = seat.id,
            "reservation created"
        );
        Ok(reservation)
    }

    pub async fn reservation_view(
        &self,
        id: i64,
        principal: &Principal,
    ) -> CoreResult<Reservation> {
        let reservation = self
            .store
            .reservation(id)
            .await?
            .ok_or(CoreError::NotFound("reservation"))?;
        self.authorize(&reservation, principal)?;
        Ok(reservation)
    }

    pub async fn reservation_by_code(
        &self,
        code: &str,
        principal: &Principal,
    ) -> CoreResult<Reservation> {
        let reservation = self
            .store
            .reservation_by_code(code)
            .await?
            .ok_or(CoreError::NotFound("reservation"))?;
        self.authorize(&reservation, principal)?;
        Ok(reservation)
    }

    /// Drive the transition table. Cancellation releases the seat and drops
    /// the ticket; `pending -> confirmed` issues a ticket when none exists;
    /// every other legal transition touches status only.
    pub async fn transition(
        &self,
        id: i64,
        new_status: ReservationStatus,
        principal: &Principal,
    ) -> CoreResult<TransitionOutcome> {
        let reservation = self
            .store
            .reservation(id)
            .await?
            .ok_or(CoreError::NotFound("reservation"))?;
        self.authorize(&reservation, principal)?;

        if new_status == ReservationStatus::Cancelled
            && reservation.status == ReservationStatus::Cancelled
        {
            return Ok(TransitionOutcome {
                reservation,
                changed: false,
                message: "reservation is already cancelled".to_string(),
            });
        }
        if !reservation.status.can_transition_to(new_status) {
            return Err(CoreError::InvalidTransition {
                from: reservation.status,
                to: new_status,
                allowed: reservation.status.allowed_next(),
            });
        }

        let mut effects = TransitionEffects::default();
        match new_status {
            ReservationStatus::Cancelled => {
                effects.seat_update = Some((reservation.seat_id, SeatState::Available));
                effects.delete_ticket = true;
            }
            ReservationStatus::Confirmed => {
                if self
                    .store
                    .ticket_for_reservation(reservation.id)
                    .await?
                    .is_none()
                {
                    effects.issue_ticket = Some(NewTicket {
                        reservation_id: reservation.id,
                        barcode: self.unique_barcode().await?,
                    });
                }
            }
            _ => {}
        }

        let from = reservation.status;
        let updated = match self
            .store
            .apply_transition(reservation.id, from, new_status, effects)
            .await
        {
            Ok(updated) => updated,
            // Another writer moved the status between our read and the
            // commit; re-read and report against the fresh state.
            Err(StoreError::TransitionConflict) => {
                let fresh = self
                    .store
                    .reservation(reservation.id)
                    .await?
                    .ok_or(CoreError::NotFound("reservation"))?;
                if new_status == ReservationStatus::Cancelled
                    && fresh.status == ReservationStatus::Cancelled
                {
                    return Ok(TransitionOutcome {
                        reservation: fresh,
                        changed: false,
                        message: "reservation is already cancelled".to_string(),
                    });
                }
                return Err(CoreError::InvalidTransition {
                    from: fresh.status,
                    to: new_status,
                    allowed: fresh.status.allowed_next(),
                });
            }
            Err(err) => return Err(err.into()),
        };
        info!(
            reservation_id = updated.id,
            from = from.as_str(),
            to = new_status.as_str(),
            "reservation transitioned"
        );
        Ok(TransitionOutcome {
            reservation: updated,
            changed: true,
            message: format!(
                "reservation status changed from {} to {}",
                from.as_str(),
                new_status.as_str()
            ),
        })
    }

    /// Cancel is just a transition to `cancelled`; idempotent at this level.
    pub async fn cancel(&self, id: i64, principal: &Principal) -> CoreResult<TransitionOutcome> {
        self.transition(id, ReservationStatus::Cancelled, principal)
            .await
    }

    // ------------------------------------------------------------------
    // Reporting views
    // ------------------------------------------------------------------

    pub async fn passenger_reservations(
        &self,
        passenger_id: i64,
        principal: &Principal,
    ) -> CoreResult<Vec<Reservation>> {
        self.passenger(passenger_id).await?;
        let mut reservations = self.store.reservations_for_passenger(passenger_id).await?;
        if !principal.admin {
            reservations.retain(|r| principal.may_access(r.owner.as_deref()));
        }
        Ok(reservations)
    }

    /// Confirmed-or-paid reservations on a flight with passenger and seat
    /// detail plus occupancy and revenue statistics. Administrators only.
    pub async fn flight_manifest(
        &self,
        flight_id: i64,
        principal: &Principal,
    ) -> CoreResult<FlightManifest> {
        if !principal.admin {
            return Err(CoreError::PermissionDenied(
                "flight manifests are restricted to administrators".to_string(),
            ));
        }
        let availability = self.flight_availability(flight_id).await?;
        let reservations = self
            .store
            .reservations_for_flight(flight_id, true)
            .await?;
        let mut entries = Vec::with_capacity(reservations.len());
        let mut revenue = 0i64;
        for reservation in reservations {
            let passenger = self.passenger(reservation.passenger_id).await?;
            let seat = self
                .store
                .seat(reservation.seat_id)
                .await?
                .ok_or(CoreError::NotFound("seat"))?;
            revenue += reservation.price_cents;
            entries.push(ManifestEntry {
                reservation,
                passenger,
                seat_number: seat.number,
            });
        }
        let occupied = entries.len() as i64;
        Ok(FlightManifest {
            flight: availability.flight,
            stats: ManifestStats {
                occupied_seats: occupied,
                available_seats: availability.available_seats,
                occupancy_pct: availability.occupancy_pct,
                total_revenue_cents: revenue,
            },
            entries,
        })
    }

    /// A passenger's non-cancelled reservations with per-status counts.
    pub async fn passenger_activity(
        &self,
        passenger_id: i64,
        principal: &Principal,
    ) -> CoreResult<PassengerActivity> {
        let passenger = self.passenger(passenger_id).await?;
        let mut reservations = self.store.reservations_for_passenger(passenger_id).await?;

        if !principal.admin {
            let same_email = principal
                .email
                .as_deref()
                .is_some_and(|email| email.eq_ignore_ascii_case(&passenger.email));
            let owns_some = reservations
                .iter()
                .any(|r| principal.may_access(r.owner.as_deref()));
            if !same_email && !owns_some {
                return Err(CoreError::PermissionDenied(
                    "not allowed to view this passenger's reservations".to_string(),
                ));
            }
            reservations.retain(|r| principal.may_access(r.owner.as_deref()));
        }
        reservations.retain(|r| r.status != ReservationStatus::Cancelled);

        let confirmed = reservations
            .iter()
            .filter(|r| r.status == ReservationStatus::Confirmed)
            .count();
        let paid = reservations
            .iter()
            .filter(|r| r.status == ReservationStatus::Paid)
            .count();
        let pending = reservations
            .iter()
            .filter(|r| r.status == ReservationStatus::Pending)
            .count();
        let total_value_cents = reservations.iter().map(|r| r.price_cents).sum();
        Ok(PassengerActivity {
            passenger,
            reservations,
            confirmed,
            paid,
            pending,
            total_value_cents,
        })
    }

    pub async fn summary(&self, principal: &Principal) -> CoreResult<SystemSummary> {
        if !principal.admin {
            return Err(CoreError::PermissionDenied(
                "system summary is restricted to administrators".to_string(),
            ));
        }
        Ok(self.store.summary().await?)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn authorize(&self, reservation: &Reservation, principal: &Principal) -> CoreResult<()> {
        if principal.may_access(reservation.owner.as_deref()) {
            Ok(())
        } else {
            Err(CoreError::PermissionDenied(
                "not allowed to access this reservation".to_string(),
            ))
        }
    }

    async fn unique_reservation_code(&self) -> CoreResult<String> {
        loop {
            let draft = codes::reservation_code();
            if !self.store.reservation_code_exists(&draft).await? {
                return Ok(draft);
            }
        }
    }

    pub(crate) async fn unique_barcode(&self) -> CoreResult<String> {
        loop {
            let draft = codes::ticket_barcode();
            if !self.store.barcode_exists(&draft).await? {
                return Ok(draft);
            }
        }
    }
}
