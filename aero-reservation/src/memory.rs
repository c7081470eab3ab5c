//! In-memory `ReservationStore`. Backs the engine and API tests; every
//! method takes the single mutex for its whole body, so the multi-step
//! writes (`insert_reservation`, `apply_transition`) are atomic relative to
//! all readers, matching what the SQL store achieves with transactions.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use aero_domain::aircraft::{Aircraft, NewAircraft, NewSeat, Seat, SeatState};
use aero_domain::flight::{Flight, FlightFilter, FlightStatus, NewFlight};
use aero_domain::passenger::{NewPassenger, Passenger};
use aero_domain::repository::{
    ReservationStore, StoreError, SystemSummary, TransitionEffects,
};
use aero_domain::reservation::{
    NewReservation, NewTicket, Reservation, ReservationStatus, Ticket, TicketStatus,
};

#[derive(Default)]
struct MemState {
    aircraft: BTreeMap<i64, Aircraft>,
    seats: BTreeMap<i64, Seat>,
    flights: BTreeMap<i64, Flight>,
    passengers: BTreeMap<i64, Passenger>,
    reservations: BTreeMap<i64, Reservation>,
    tickets: BTreeMap<i64, Ticket>,
    next_id: i64,
}

impl MemState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn active_reservations(&self, flight_id: i64) -> impl Iterator<Item = &Reservation> {
        self.reservations
            .values()
            .filter(move |r| r.flight_id == flight_id && r.status.is_active())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemState> {
        self.inner.lock().expect("memory store lock poisoned")
    }
}

fn sorted_seats(mut seats: Vec<Seat>) -> Vec<Seat> {
    seats.sort_by(|a, b| (a.row, &a.column).cmp(&(b.row, &b.column)));
    seats
}

fn insert_seat_rows(
    state: &mut MemState,
    aircraft_id: i64,
    seats: Vec<NewSeat>,
) -> Result<usize, StoreError> {
    let count = seats.len();
    for blueprint in seats {
        let taken = state
            .seats
            .values()
            .any(|s| s.aircraft_id == aircraft_id && s.number == blueprint.number);
        if taken {
            return Err(StoreError::Backend(format!(
                "seat {} already exists for aircraft {}",
                blueprint.number, aircraft_id
            )));
        }
        let id = state.next_id();
        state.seats.insert(
            id,
            Seat {
                id,
                aircraft_id,
                number: blueprint.number,
                row: blueprint.row,
                column: blueprint.column,
                class: blueprint.class,
                state: blueprint.state,
            },
        );
    }
    Ok(count)
}

#[async_trait]
impl ReservationStore for MemoryStore {
    async fn insert_aircraft(
        &self,
        aircraft: NewAircraft,
        seats: Vec<NewSeat>,
    ) -> Result<Aircraft, StoreError> {
        let mut state = self.state();
        let id = state.next_id();
        let row = Aircraft {
            id,
            capacity: aircraft.capacity(),
            model: aircraft.model,
            seat_rows: aircraft.seat_rows,
            seat_columns: aircraft.seat_columns,
            created_at: Utc::now(),
        };
        state.aircraft.insert(id, row.clone());
        insert_seat_rows(&mut state, id, seats)?;
        Ok(row)
    }

    async fn aircraft(&self, id: i64) -> Result<Option<Aircraft>, StoreError> {
        Ok(self.state().aircraft.get(&id).cloned())
    }

    async fn list_aircraft(&self) -> Result<Vec<Aircraft>, StoreError> {
        Ok(self.state().aircraft.values().cloned().collect())
    }

    async fn seats_for_aircraft(&self, aircraft_id: i64) -> Result<Vec<Seat>, StoreError> {
        let seats = self
            .state()
            .seats
            .values()
            .filter(|s| s.aircraft_id == aircraft_id)
            .cloned()
            .collect();
        Ok(sorted_seats(seats))
    }

    async fn insert_seats(
        &self,
        aircraft_id: i64,
        seats: Vec<NewSeat>,
    ) -> Result<usize, StoreError> {
        let mut state = self.state();
        if !state.aircraft.contains_key(&aircraft_id) {
            return Err(StoreError::NotFound("aircraft"));
        }
        insert_seat_rows(&mut state, aircraft_id, seats)
    }

    async fn seat(&self, id: i64) -> Result<Option<Seat>, StoreError> {
        Ok(self.state().seats.get(&id).cloned())
    }

    async fn set_seat_state(&self, seat_id: i64, state: SeatState) -> Result<(), StoreError> {
        let mut guard = self.state();
        let seat = guard
            .seats
            .get_mut(&seat_id)
            .ok_or(StoreError::NotFound("seat"))?;
        seat.state = state;
        Ok(())
    }

    async fn insert_flight(&self, flight: NewFlight) -> Result<Flight, StoreError> {
        let mut state = self.state();
        if !state.aircraft.contains_key(&flight.aircraft_id) {
            return Err(StoreError::NotFound("aircraft"));
        }
        let id = state.next_id();
        let row = Flight {
            id,
            aircraft_id: flight.aircraft_id,
            origin: flight.origin,
            destination: flight.destination,
            departure_at: flight.departure_at,
            arrival_at: flight.arrival_at,
            status: FlightStatus::Scheduled,
            base_price_cents: flight.base_price_cents,
            created_at: Utc::now(),
        };
        state.flights.insert(id, row.clone());
        Ok(row)
    }

    async fn flight(&self, id: i64) -> Result<Option<Flight>, StoreError> {
        Ok(self.state().flights.get(&id).cloned())
    }

    async fn list_flights(&self, filter: FlightFilter) -> Result<Vec<Flight>, StoreError> {
        let mut flights: Vec<Flight> = self
            .state()
            .flights
            .values()
            .filter(|f| {
                if let Some(origin) = &filter.origin {
                    if !f.origin.to_lowercase().contains(&origin.to_lowercase()) {
                        return false;
                    }
                }
                if let Some(destination) = &filter.destination {
                    if !f
                        .destination
                        .to_lowercase()
                        .contains(&destination.to_lowercase())
                    {
                        return false;
                    }
                }
                let departure_day = f.departure_at.date_naive();
                if let Some(from) = filter.date_from {
                    if departure_day < from {
                        return false;
                    }
                }
                if let Some(to) = filter.date_to {
                    if departure_day > to {
                        return false;
                    }
                }
                if let Some(status) = filter.status {
                    if f.status != status {
                        return false;
                    }
                }
                true
            })
            .cloned()
            .collect();
        flights.sort_by_key(|f| f.departure_at);
        Ok(flights)
    }

    async fn active_reservation_count(&self, flight_id: i64) -> Result<i64, StoreError> {
        Ok(self.state().active_reservations(flight_id).count() as i64)
    }

    async fn reserved_seat_ids(&self, flight_id: i64) -> Result<Vec<i64>, StoreError> {
        Ok(self
            .state()
            .active_reservations(flight_id)
            .map(|r| r.seat_id)
            .collect())
    }

    async fn insert_passenger(&self, passenger: NewPassenger) -> Result<Passenger, StoreError> {
        let mut state = self.state();
        let duplicate = state.passengers.values().any(|p| {
            p.document_type == passenger.document_type
                && p.document_number == passenger.document_number
        });
        if duplicate {
            return Err(StoreError::DuplicateDocument);
        }
        let id = state.next_id();
        let row = Passenger {
            id,
            given_name: passenger.given_name,
            family_name: passenger.family_name,
            document_type: passenger.document_type,
            document_number: passenger.document_number,
            email: passenger.email,
            phone: passenger.phone,
            date_of_birth: passenger.date_of_birth,
            registered_at: Utc::now(),
        };
        state.passengers.insert(id, row.clone());
        Ok(row)
    }

    async fn passenger(&self, id: i64) -> Result<Option<Passenger>, StoreError> {
        Ok(self.state().passengers.get(&id).cloned())
    }

    async fn passenger_by_document(
        &self,
        document_number: &str,
    ) -> Result<Option<Passenger>, StoreError> {
        Ok(self
            .state()
            .passengers
            .values()
            .find(|p| p.document_number == document_number)
            .cloned())
    }

    async fn reservation(&self, id: i64) -> Result<Option<Reservation>, StoreError> {
        Ok(self.state().reservations.get(&id).cloned())
    }

    async fn reservation_by_code(&self, code: &str) -> Result<Option<Reservation>, StoreError> {
        Ok(self
            .state()
            .reservations
            .values()
            .find(|r| r.code.eq_ignore_ascii_case(code))
            .cloned())
    }

    async fn reservation_code_exists(&self, code: &str) -> Result<bool, StoreError> {
        Ok(self
            .state()
            .reservations
            .values()
            .any(|r| r.code.eq_ignore_ascii_case(code)))
    }

    async fn has_active_for_seat(
        &self,
        flight_id: i64,
        seat_id: i64,
    ) -> Result<bool, StoreError> {
        Ok(self
            .state()
            .active_reservations(flight_id)
            .any(|r| r.seat_id == seat_id))
    }

    async fn has_active_for_passenger(
        &self,
        flight_id: i64,
        passenger_id: i64,
    ) -> Result<bool, StoreError> {
        Ok(self
            .state()
            .active_reservations(flight_id)
            .any(|r| r.passenger_id == passenger_id))
    }

    async fn insert_reservation(
        &self,
        reservation: NewReservation,
        seat_state: SeatState,
        ticket_barcode: Option<String>,
    ) -> Result<Reservation, StoreError> {
        let mut state = self.state();

        // Commit-time enforcement of the active-uniqueness constraints; the
        // whole method runs under one lock, so two racing writers serialize
        // here and the loser sees the conflict.
        if reservation.status.is_active() {
            let seat_taken = state
                .active_reservations(reservation.flight_id)
                .any(|r| r.seat_id == reservation.seat_id);
            if seat_taken {
                return Err(StoreError::ActiveSeatConflict);
            }
            let passenger_booked = state
                .active_reservations(reservation.flight_id)
                .any(|r| r.passenger_id == reservation.passenger_id);
            if passenger_booked {
                return Err(StoreError::ActivePassengerConflict);
            }
        }
        if state
            .reservations
            .values()
            .any(|r| r.code.eq_ignore_ascii_case(&reservation.code))
        {
            return Err(StoreError::DuplicateCode);
        }
        if !state.seats.contains_key(&reservation.seat_id) {
            return Err(StoreError::NotFound("seat"));
        }

        let id = state.next_id();
        let row = Reservation {
            id,
            flight_id: reservation.flight_id,
            passenger_id: reservation.passenger_id,
            seat_id: reservation.seat_id,
            status: reservation.status,
            price_cents: reservation.price_cents,
            payment_method: reservation.payment_method,
            code: reservation.code,
            owner: reservation.owner,
            created_at: Utc::now(),
        };
        state.reservations.insert(id, row.clone());

        if let Some(seat) = state.seats.get_mut(&reservation.seat_id) {
            seat.state = seat_state;
        }
        if let Some(barcode) = ticket_barcode {
            if state.tickets.values().any(|t| t.barcode == barcode) {
                return Err(StoreError::DuplicateBarcode);
            }
            let ticket_id = state.next_id();
            state.tickets.insert(
                ticket_id,
                Ticket {
                    id: ticket_id,
                    reservation_id: id,
                    barcode,
                    status: TicketStatus::Issued,
                    issued_at: Utc::now(),
                },
            );
        }
        Ok(row)
    }

    async fn apply_transition(
        &self,
        reservation_id: i64,
        from_status: ReservationStatus,
        new_status: ReservationStatus,
        effects: TransitionEffects,
    ) -> Result<Reservation, StoreError> {
        let mut state = self.state();
        let reservation = state
            .reservations
            .get_mut(&reservation_id)
            .ok_or(StoreError::NotFound("reservation"))?;
        // Compare-and-set under the lock; a writer holding a stale snapshot
        // must not overwrite a status that moved underneath it.
        if reservation.status != from_status {
            return Err(StoreError::TransitionConflict);
        }
        reservation.status = new_status;
        let updated = reservation.clone();

        if let Some((seat_id, seat_state)) = effects.seat_update {
            let seat = state
                .seats
                .get_mut(&seat_id)
                .ok_or(StoreError::NotFound("seat"))?;
            seat.state = seat_state;
        }
        if effects.delete_ticket {
            state
                .tickets
                .retain(|_, t| t.reservation_id != reservation_id);
        }
        if let Some(ticket) = effects.issue_ticket {
            if state
                .tickets
                .values()
                .any(|t| t.reservation_id == reservation_id)
            {
                return Err(StoreError::TicketExists);
            }
            if state.tickets.values().any(|t| t.barcode == ticket.barcode) {
                return Err(StoreError::DuplicateBarcode);
            }
            let ticket_id = state.next_id();
            state.tickets.insert(
                ticket_id,
                Ticket {
                    id: ticket_id,
                    reservation_id,
                    barcode: ticket.barcode,
                    status: TicketStatus::Issued,
                    issued_at: Utc::now(),
                },
            );
        }
        Ok(updated)
    }

    async fn reservations_for_passenger(
        &self,
        passenger_id: i64,
    ) -> Result<Vec<Reservation>, StoreError> {
        let mut reservations: Vec<Reservation> = self
            .state()
            .reservations
            .values()
            .filter(|r| r.passenger_id == passenger_id)
            .cloned()
            .collect();
        reservations.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(reservations)
    }

    async fn reservations_for_flight(
        &self,
        flight_id: i64,
        only_active: bool,
    ) -> Result<Vec<Reservation>, StoreError> {
        let mut reservations: Vec<Reservation> = self
            .state()
            .reservations
            .values()
            .filter(|r| r.flight_id == flight_id && (!only_active || r.status.is_active()))
            .cloned()
            .collect();
        reservations.sort_by_key(|r| r.id);
        Ok(reservations)
    }

    async fn insert_ticket(&self, ticket: NewTicket) -> Result<Ticket, StoreError> {
        let mut state = self.state();
        if !state.reservations.contains_key(&ticket.reservation_id) {
            return Err(StoreError::NotFound("reservation"));
        }
        if state
            .tickets
            .values()
            .any(|t| t.reservation_id == ticket.reservation_id)
        {
            return Err(StoreError::TicketExists);
        }
        if state.tickets.values().any(|t| t.barcode == ticket.barcode) {
            return Err(StoreError::DuplicateBarcode);
        }
        let id = state.next_id();
        let row = Ticket {
            id,
            reservation_id: ticket.reservation_id,
            barcode: ticket.barcode,
            status: TicketStatus::Issued,
            issued_at: Utc::now(),
        };
        state.tickets.insert(id, row.clone());
        Ok(row)
    }

    async fn ticket_for_reservation(
        &self,
        reservation_id: i64,
    ) -> Result<Option<Ticket>, StoreError> {
        Ok(self
            .state()
            .tickets
            .values()
            .find(|t| t.reservation_id == reservation_id)
            .cloned())
    }

    async fn ticket_by_barcode(&self, barcode: &str) -> Result<Option<Ticket>, StoreError> {
        Ok(self
            .state()
            .tickets
            .values()
            .find(|t| t.barcode == barcode)
            .cloned())
    }

    async fn barcode_exists(&self, barcode: &str) -> Result<bool, StoreError> {
        Ok(self.state().tickets.values().any(|t| t.barcode == barcode))
    }

    async fn summary(&self) -> Result<SystemSummary, StoreError> {
        let state = self.state();
        let total_reservations = state.reservations.len() as i64;
        let count_status = |status: ReservationStatus| {
            state
                .reservations
                .values()
                .filter(|r| r.status == status)
                .count() as i64
        };
        let total_revenue_cents = state
            .reservations
            .values()
            .filter(|r| r.status.is_active())
            .map(|r| r.price_cents)
            .sum();

        let mut occupancies = Vec::new();
        for flight in state.flights.values() {
            let active = state.active_reservations(flight.id).count() as i64;
            if active == 0 {
                continue;
            }
            if let Some(aircraft) = state.aircraft.get(&flight.aircraft_id) {
                occupancies.push(aero_inventory::occupancy_percentage(
                    aircraft.capacity,
                    active,
                ));
            }
        }
        let average_occupancy_pct = if occupancies.is_empty() {
            0.0
        } else {
            occupancies.iter().sum::<f64>() / occupancies.len() as f64
        };

        Ok(SystemSummary {
            total_flights: state.flights.len() as i64,
            scheduled_flights: state
                .flights
                .values()
                .filter(|f| f.status == FlightStatus::Scheduled)
                .count() as i64,
            total_reservations,
            confirmed_reservations: count_status(ReservationStatus::Confirmed),
            paid_reservations: count_status(ReservationStatus::Paid),
            cancelled_reservations: count_status(ReservationStatus::Cancelled),
            total_passengers: state.passengers.len() as i64,
            total_revenue_cents,
            average_occupancy_pct,
        })
    }
}
