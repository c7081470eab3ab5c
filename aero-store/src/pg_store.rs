//! Postgres-backed `ReservationStore`. Status, class and state enums are
//! stored as text; the active-uniqueness rules live in partial unique indexes
//! so concurrent writers are rejected at commit time even when both passed
//! the engine's read-phase checks.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use aero_domain::aircraft::{Aircraft, NewAircraft, NewSeat, Seat, SeatClass, SeatState};
use aero_domain::flight::{Flight, FlightFilter, FlightStatus, NewFlight};
use aero_domain::passenger::{DocumentType, NewPassenger, Passenger};
use aero_domain::repository::{ReservationStore, StoreError, SystemSummary, TransitionEffects};
use aero_domain::reservation::{
    NewReservation, NewTicket, PaymentMethod, Reservation, ReservationStatus, Ticket, TicketStatus,
};
use aero_inventory::occupancy_percentage;

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// ======================================================================
// Row types
// ======================================================================

#[derive(sqlx::FromRow)]
struct AircraftRow {
    id: i64,
    model: String,
    seat_rows: i32,
    seat_columns: i32,
    capacity: i32,
    created_at: DateTime<Utc>,
}

impl From<AircraftRow> for Aircraft {
    fn from(row: AircraftRow) -> Self {
        Aircraft {
            id: row.id,
            model: row.model,
            seat_rows: row.seat_rows,
            seat_columns: row.seat_columns,
            capacity: row.capacity,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SeatRow {
    id: i64,
    aircraft_id: i64,
    number: String,
    seat_row: i32,
    seat_col: String,
    class: String,
    state: String,
}

impl SeatRow {
    fn into_domain(self) -> Result<Seat, StoreError> {
        Ok(Seat {
            id: self.id,
            aircraft_id: self.aircraft_id,
            number: self.number,
            row: self.seat_row,
            column: self.seat_col,
            class: parse_enum(&self.class, SeatClass::parse, "seat class")?,
            state: parse_enum(&self.state, SeatState::parse, "seat state")?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct FlightRow {
    id: i64,
    aircraft_id: i64,
    origin: String,
    destination: String,
    departure_at: DateTime<Utc>,
    arrival_at: DateTime<Utc>,
    status: String,
    base_price_cents: i64,
    created_at: DateTime<Utc>,
}

impl FlightRow {
    fn into_domain(self) -> Result<Flight, StoreError> {
        Ok(Flight {
            id: self.id,
            aircraft_id: self.aircraft_id,
            origin: self.origin,
            destination: self.destination,
            departure_at: self.departure_at,
            arrival_at: self.arrival_at,
            status: parse_enum(&self.status, FlightStatus::parse, "flight status")?,
            base_price_cents: self.base_price_cents,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PassengerRow {
    id: i64,
    given_name: String,
    family_name: String,
    document_type: String,
    document_number: String,
    email: String,
    phone: String,
    date_of_birth: NaiveDate,
    registered_at: DateTime<Utc>,
}

impl PassengerRow {
    fn into_domain(self) -> Result<Passenger, StoreError> {
        Ok(Passenger {
            id: self.id,
            given_name: self.given_name,
            family_name: self.family_name,
            document_type: parse_enum(&self.document_type, DocumentType::parse, "document type")?,
            document_number: self.document_number,
            email: self.email,
            phone: self.phone,
            date_of_birth: self.date_of_birth,
            registered_at: self.registered_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ReservationRow {
    id: i64,
    flight_id: i64,
    passenger_id: i64,
    seat_id: i64,
    status: String,
    price_cents: i64,
    payment_method: String,
    code: String,
    owner: Option<String>,
    created_at: DateTime<Utc>,
}

impl ReservationRow {
    fn into_domain(self) -> Result<Reservation, StoreError> {
        Ok(Reservation {
            id: self.id,
            flight_id: self.flight_id,
            passenger_id: self.passenger_id,
            seat_id: self.seat_id,
            status: parse_enum(&self.status, ReservationStatus::parse, "reservation status")?,
            price_cents: self.price_cents,
            payment_method: parse_enum(
                &self.payment_method,
                PaymentMethod::parse,
                "payment method",
            )?,
            code: self.code,
            owner: self.owner,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct TicketRow {
    id: i64,
    reservation_id: i64,
    barcode: String,
    status: String,
    issued_at: DateTime<Utc>,
}

impl TicketRow {
    fn into_domain(self) -> Result<Ticket, StoreError> {
        Ok(Ticket {
            id: self.id,
            reservation_id: self.reservation_id,
            barcode: self.barcode,
            status: parse_enum(&self.status, TicketStatus::parse, "ticket status")?,
            issued_at: self.issued_at,
        })
    }
}

fn parse_enum<T>(
    value: &str,
    parse: fn(&str) -> Option<T>,
    what: &str,
) -> Result<T, StoreError> {
    parse(value).ok_or_else(|| StoreError::Backend(format!("unrecognized {what}: {value}")))
}

/// Translate a constraint violation into the store's conflict vocabulary.
fn map_db_err(err: sqlx::Error) -> StoreError {
    let constraint = match &err {
        sqlx::Error::Database(db) => db.constraint().map(str::to_owned),
        _ => None,
    };
    match constraint.as_deref() {
        Some("uq_active_seat") => StoreError::ActiveSeatConflict,
        Some("uq_active_passenger") => StoreError::ActivePassengerConflict,
        Some("uq_reservations_code") => StoreError::DuplicateCode,
        Some("uq_tickets_barcode") => StoreError::DuplicateBarcode,
        Some("uq_tickets_reservation") => StoreError::TicketExists,
        Some("uq_passengers_document") => StoreError::DuplicateDocument,
        _ => StoreError::backend(err),
    }
}

const SEAT_COLUMNS: &str = "id, aircraft_id, number, seat_row, seat_col, class, state";
const FLIGHT_COLUMNS: &str =
    "id, aircraft_id, origin, destination, departure_at, arrival_at, status, base_price_cents, created_at";
const RESERVATION_COLUMNS: &str =
    "id, flight_id, passenger_id, seat_id, status, price_cents, payment_method, code, owner, created_at";
const TICKET_COLUMNS: &str = "id, reservation_id, barcode, status, issued_at";

async fn insert_seat_in_tx(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    aircraft_id: i64,
    seat: &NewSeat,
) -> Result<(), StoreError> {
    sqlx::query(
        "INSERT INTO seats (aircraft_id, number, seat_row, seat_col, class, state) \
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(aircraft_id)
    .bind(&seat.number)
    .bind(seat.row)
    .bind(&seat.column)
    .bind(seat.class.as_str())
    .bind(seat.state.as_str())
    .execute(&mut **tx)
    .await
    .map_err(map_db_err)?;
    Ok(())
}

// ======================================================================
// Store implementation
// ======================================================================

#[async_trait]
impl ReservationStore for PgStore {
    async fn insert_aircraft(
        &self,
        aircraft: NewAircraft,
        seats: Vec<NewSeat>,
    ) -> Result<Aircraft, StoreError> {
        let mut tx = self.pool.begin().await.map_err(StoreError::backend)?;

        let row: AircraftRow = sqlx::query_as(
            "INSERT INTO aircraft (model, seat_rows, seat_columns, capacity) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, model, seat_rows, seat_columns, capacity, created_at",
        )
        .bind(&aircraft.model)
        .bind(aircraft.seat_rows)
        .bind(aircraft.seat_columns)
        .bind(aircraft.capacity())
        .fetch_one(&mut *tx)
        .await
        .map_err(map_db_err)?;

        for seat in &seats {
            insert_seat_in_tx(&mut tx, row.id, seat).await?;
        }

        tx.commit().await.map_err(StoreError::backend)?;
        Ok(row.into())
    }

    async fn aircraft(&self, id: i64) -> Result<Option<Aircraft>, StoreError> {
        let row: Option<AircraftRow> = sqlx::query_as(
            "SELECT id, model, seat_rows, seat_columns, capacity, created_at \
             FROM aircraft WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        Ok(row.map(Aircraft::from))
    }

    async fn list_aircraft(&self) -> Result<Vec<Aircraft>, StoreError> {
        let rows: Vec<AircraftRow> = sqlx::query_as(
            "SELECT id, model, seat_rows, seat_columns, capacity, created_at \
             FROM aircraft ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        Ok(rows.into_iter().map(Aircraft::from).collect())
    }

    async fn seats_for_aircraft(&self, aircraft_id: i64) -> Result<Vec<Seat>, StoreError> {
        let rows: Vec<SeatRow> = sqlx::query_as(&format!(
            "SELECT {SEAT_COLUMNS} FROM seats WHERE aircraft_id = $1 ORDER BY seat_row, seat_col",
        ))
        .bind(aircraft_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        rows.into_iter().map(SeatRow::into_domain).collect()
    }

    async fn insert_seats(
        &self,
        aircraft_id: i64,
        seats: Vec<NewSeat>,
    ) -> Result<usize, StoreError> {
        let mut tx = self.pool.begin().await.map_err(StoreError::backend)?;
        for seat in &seats {
            insert_seat_in_tx(&mut tx, aircraft_id, seat).await?;
        }
        tx.commit().await.map_err(StoreError::backend)?;
        Ok(seats.len())
    }

    async fn seat(&self, id: i64) -> Result<Option<Seat>, StoreError> {
        let row: Option<SeatRow> =
            sqlx::query_as(&format!("SELECT {SEAT_COLUMNS} FROM seats WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(StoreError::backend)?;
        row.map(SeatRow::into_domain).transpose()
    }

    async fn set_seat_state(&self, seat_id: i64, state: SeatState) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE seats SET state = $1 WHERE id = $2")
            .bind(state.as_str())
            .bind(seat_id)
            .execute(&self.pool)
            .await
            .map_err(StoreError::backend)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("seat"));
        }
        Ok(())
    }

    async fn insert_flight(&self, flight: NewFlight) -> Result<Flight, StoreError> {
        let row: FlightRow = sqlx::query_as(&format!(
            "INSERT INTO flights (aircraft_id, origin, destination, departure_at, arrival_at, base_price_cents) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {FLIGHT_COLUMNS}",
        ))
        .bind(flight.aircraft_id)
        .bind(&flight.origin)
        .bind(&flight.destination)
        .bind(flight.departure_at)
        .bind(flight.arrival_at)
        .bind(flight.base_price_cents)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_err)?;
        row.into_domain()
    }

    async fn flight(&self, id: i64) -> Result<Option<Flight>, StoreError> {
        let row: Option<FlightRow> =
            sqlx::query_as(&format!("SELECT {FLIGHT_COLUMNS} FROM flights WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(StoreError::backend)?;
        row.map(FlightRow::into_domain).transpose()
    }

    async fn list_flights(&self, filter: FlightFilter) -> Result<Vec<Flight>, StoreError> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {FLIGHT_COLUMNS} FROM flights WHERE TRUE"));
        if let Some(origin) = &filter.origin {
            qb.push(" AND origin ILIKE ");
            qb.push_bind(format!("%{origin}%"));
        }
        if let Some(destination) = &filter.destination {
            qb.push(" AND destination ILIKE ");
            qb.push_bind(format!("%{destination}%"));
        }
        if let Some(from) = filter.date_from {
            qb.push(" AND departure_at::date >= ");
            qb.push_bind(from);
        }
        if let Some(to) = filter.date_to {
            qb.push(" AND departure_at::date <= ");
            qb.push_bind(to);
        }
        if let Some(status) = filter.status {
            qb.push(" AND status = ");
            qb.push_bind(status.as_str());
        }
        qb.push(" ORDER BY departure_at");

        let rows: Vec<FlightRow> = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::backend)?;
        rows.into_iter().map(FlightRow::into_domain).collect()
    }

    async fn active_reservation_count(&self, flight_id: i64) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM reservations \
             WHERE flight_id = $1 AND status IN ('confirmed', 'paid')",
        )
        .bind(flight_id)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        Ok(count)
    }

    async fn reserved_seat_ids(&self, flight_id: i64) -> Result<Vec<i64>, StoreError> {
        sqlx::query_scalar(
            "SELECT seat_id FROM reservations \
             WHERE flight_id = $1 AND status IN ('confirmed', 'paid')",
        )
        .bind(flight_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::backend)
    }

    async fn insert_passenger(&self, passenger: NewPassenger) -> Result<Passenger, StoreError> {
        let row: PassengerRow = sqlx::query_as(
            "INSERT INTO passengers \
             (given_name, family_name, document_type, document_number, email, phone, date_of_birth) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id, given_name, family_name, document_type, document_number, email, phone, date_of_birth, registered_at",
        )
        .bind(&passenger.given_name)
        .bind(&passenger.family_name)
        .bind(passenger.document_type.as_str())
        .bind(&passenger.document_number)
        .bind(&passenger.email)
        .bind(&passenger.phone)
        .bind(passenger.date_of_birth)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_err)?;
        row.into_domain()
    }

    async fn passenger(&self, id: i64) -> Result<Option<Passenger>, StoreError> {
        let row: Option<PassengerRow> = sqlx::query_as(
            "SELECT id, given_name, family_name, document_type, document_number, email, phone, date_of_birth, registered_at \
             FROM passengers WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        row.map(PassengerRow::into_domain).transpose()
    }

    async fn passenger_by_document(
        &self,
        document_number: &str,
    ) -> Result<Option<Passenger>, StoreError> {
        let row: Option<PassengerRow> = sqlx::query_as(
            "SELECT id, given_name, family_name, document_type, document_number, email, phone, date_of_birth, registered_at \
             FROM passengers WHERE document_number = $1 \
             ORDER BY id LIMIT 1",
        )
        .bind(document_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        row.map(PassengerRow::into_domain).transpose()
    }

    async fn reservation(&self, id: i64) -> Result<Option<Reservation>, StoreError> {
        let row: Option<ReservationRow> = sqlx::query_as(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        row.map(ReservationRow::into_domain).transpose()
    }

    async fn reservation_by_code(&self, code: &str) -> Result<Option<Reservation>, StoreError> {
        let row: Option<ReservationRow> = sqlx::query_as(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE UPPER(code) = UPPER($1)",
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        row.map(ReservationRow::into_domain).transpose()
    }

    async fn reservation_code_exists(&self, code: &str) -> Result<bool, StoreError> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM reservations WHERE UPPER(code) = UPPER($1))",
        )
        .bind(code)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::backend)
    }

    async fn has_active_for_seat(
        &self,
        flight_id: i64,
        seat_id: i64,
    ) -> Result<bool, StoreError> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM reservations \
             WHERE flight_id = $1 AND seat_id = $2 AND status IN ('confirmed', 'paid'))",
        )
        .bind(flight_id)
        .bind(seat_id)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::backend)
    }

    async fn has_active_for_passenger(
        &self,
        flight_id: i64,
        passenger_id: i64,
    ) -> Result<bool, StoreError> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM reservations \
             WHERE flight_id = $1 AND passenger_id = $2 AND status IN ('confirmed', 'paid'))",
        )
        .bind(flight_id)
        .bind(passenger_id)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::backend)
    }

    async fn insert_reservation(
        &self,
        reservation: NewReservation,
        seat_state: SeatState,
        ticket_barcode: Option<String>,
    ) -> Result<Reservation, StoreError> {
        let mut tx = self.pool.begin().await.map_err(StoreError::backend)?;

        let row: ReservationRow = sqlx::query_as(&format!(
            "INSERT INTO reservations \
             (flight_id, passenger_id, seat_id, status, price_cents, payment_method, code, owner) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {RESERVATION_COLUMNS}",
        ))
        .bind(reservation.flight_id)
        .bind(reservation.passenger_id)
        .bind(reservation.seat_id)
        .bind(reservation.status.as_str())
        .bind(reservation.price_cents)
        .bind(reservation.payment_method.as_str())
        .bind(&reservation.code)
        .bind(&reservation.owner)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_db_err)?;

        sqlx::query("UPDATE seats SET state = $1 WHERE id = $2")
            .bind(seat_state.as_str())
            .bind(reservation.seat_id)
            .execute(&mut *tx)
            .await
            .map_err(StoreError::backend)?;

        if let Some(barcode) = ticket_barcode {
            sqlx::query("INSERT INTO tickets (reservation_id, barcode) VALUES ($1, $2)")
                .bind(row.id)
                .bind(&barcode)
                .execute(&mut *tx)
                .await
                .map_err(map_db_err)?;
        }

        tx.commit().await.map_err(StoreError::backend)?;
        row.into_domain()
    }

    async fn apply_transition(
        &self,
        reservation_id: i64,
        from_status: ReservationStatus,
        new_status: ReservationStatus,
        effects: TransitionEffects,
    ) -> Result<Reservation, StoreError> {
        let mut tx = self.pool.begin().await.map_err(StoreError::backend)?;

        // Compare-and-set on the status column; no row updated means either
        // the id is unknown or another writer moved the status first.
        let row: Option<ReservationRow> = sqlx::query_as(&format!(
            "UPDATE reservations SET status = $1 WHERE id = $2 AND status = $3 \
             RETURNING {RESERVATION_COLUMNS}",
        ))
        .bind(new_status.as_str())
        .bind(reservation_id)
        .bind(from_status.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_db_err)?;
        let row = match row {
            Some(row) => row,
            None => {
                let exists: bool =
                    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM reservations WHERE id = $1)")
                        .bind(reservation_id)
                        .fetch_one(&mut *tx)
                        .await
                        .map_err(StoreError::backend)?;
                return Err(if exists {
                    StoreError::TransitionConflict
                } else {
                    StoreError::NotFound("reservation")
                });
            }
        };

        if let Some((seat_id, state)) = effects.seat_update {
            sqlx::query("UPDATE seats SET state = $1 WHERE id = $2")
                .bind(state.as_str())
                .bind(seat_id)
                .execute(&mut *tx)
                .await
                .map_err(StoreError::backend)?;
        }
        if effects.delete_ticket {
            sqlx::query("DELETE FROM tickets WHERE reservation_id = $1")
                .bind(reservation_id)
                .execute(&mut *tx)
                .await
                .map_err(StoreError::backend)?;
        }
        if let Some(ticket) = effects.issue_ticket {
            sqlx::query("INSERT INTO tickets (reservation_id, barcode) VALUES ($1, $2)")
                .bind(ticket.reservation_id)
                .bind(&ticket.barcode)
                .execute(&mut *tx)
                .await
                .map_err(map_db_err)?;
        }

        tx.commit().await.map_err(StoreError::backend)?;
        row.into_domain()
    }

    async fn reservations_for_passenger(
        &self,
        passenger_id: i64,
    ) -> Result<Vec<Reservation>, StoreError> {
        let rows: Vec<ReservationRow> = sqlx::query_as(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations \
             WHERE passenger_id = $1 ORDER BY created_at DESC",
        ))
        .bind(passenger_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        rows.into_iter().map(ReservationRow::into_domain).collect()
    }

    async fn reservations_for_flight(
        &self,
        flight_id: i64,
        only_active: bool,
    ) -> Result<Vec<Reservation>, StoreError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE flight_id = ",
        ));
        qb.push_bind(flight_id);
        if only_active {
            qb.push(" AND status IN ('confirmed', 'paid')");
        }
        qb.push(" ORDER BY id");

        let rows: Vec<ReservationRow> = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::backend)?;
        rows.into_iter().map(ReservationRow::into_domain).collect()
    }

    async fn insert_ticket(&self, ticket: NewTicket) -> Result<Ticket, StoreError> {
        let row: TicketRow = sqlx::query_as(&format!(
            "INSERT INTO tickets (reservation_id, barcode) VALUES ($1, $2) \
             RETURNING {TICKET_COLUMNS}",
        ))
        .bind(ticket.reservation_id)
        .bind(&ticket.barcode)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_err)?;
        row.into_domain()
    }

    async fn ticket_for_reservation(
        &self,
        reservation_id: i64,
    ) -> Result<Option<Ticket>, StoreError> {
        let row: Option<TicketRow> = sqlx::query_as(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets WHERE reservation_id = $1",
        ))
        .bind(reservation_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        row.map(TicketRow::into_domain).transpose()
    }

    async fn ticket_by_barcode(&self, barcode: &str) -> Result<Option<Ticket>, StoreError> {
        let row: Option<TicketRow> = sqlx::query_as(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets WHERE barcode = $1",
        ))
        .bind(barcode)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        row.map(TicketRow::into_domain).transpose()
    }

    async fn barcode_exists(&self, barcode: &str) -> Result<bool, StoreError> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM tickets WHERE barcode = $1)")
            .bind(barcode)
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::backend)
    }

    async fn summary(&self) -> Result<SystemSummary, StoreError> {
        #[derive(sqlx::FromRow)]
        struct Counts {
            total_flights: i64,
            scheduled_flights: i64,
            total_passengers: i64,
            total_reservations: i64,
            confirmed_reservations: i64,
            paid_reservations: i64,
            cancelled_reservations: i64,
            total_revenue_cents: i64,
        }

        let counts: Counts = sqlx::query_as(
            "SELECT \
               (SELECT COUNT(*) FROM flights) AS total_flights, \
               (SELECT COUNT(*) FROM flights WHERE status = 'scheduled') AS scheduled_flights, \
               (SELECT COUNT(*) FROM passengers) AS total_passengers, \
               (SELECT COUNT(*) FROM reservations) AS total_reservations, \
               (SELECT COUNT(*) FROM reservations WHERE status = 'confirmed') AS confirmed_reservations, \
               (SELECT COUNT(*) FROM reservations WHERE status = 'paid') AS paid_reservations, \
               (SELECT COUNT(*) FROM reservations WHERE status = 'cancelled') AS cancelled_reservations, \
               (SELECT COALESCE(SUM(price_cents), 0) FROM reservations \
                  WHERE status IN ('confirmed', 'paid')) AS total_revenue_cents",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        // Occupancy averages only over flights with at least one active
        // reservation, matching the engine's reporting rules.
        #[derive(sqlx::FromRow)]
        struct OccupancyRow {
            capacity: i32,
            active: i64,
        }
        let occupancy_rows: Vec<OccupancyRow> = sqlx::query_as(
            "SELECT a.capacity AS capacity, COUNT(r.id) AS active \
             FROM flights f \
             JOIN aircraft a ON a.id = f.aircraft_id \
             JOIN reservations r ON r.flight_id = f.id \
               AND r.status IN ('confirmed', 'paid') \
             GROUP BY f.id, a.capacity",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        let average_occupancy_pct = if occupancy_rows.is_empty() {
            0.0
        } else {
            let total: f64 = occupancy_rows
                .iter()
                .map(|row| occupancy_percentage(row.capacity, row.active))
                .sum();
            total / occupancy_rows.len() as f64
        };

        Ok(SystemSummary {
            total_flights: counts.total_flights,
            scheduled_flights: counts.scheduled_flights,
            total_reservations: counts.total_reservations,
            confirmed_reservations: counts.confirmed_reservations,
            paid_reservations: counts.paid_reservations,
            cancelled_reservations: counts.cancelled_reservations,
            total_passengers: counts.total_passengers,
            total_revenue_cents: counts.total_revenue_cents,
            average_occupancy_pct,
        })
    }
}
