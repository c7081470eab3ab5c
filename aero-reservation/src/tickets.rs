//! Ticket issuance. One ticket per reservation, issuable only while the
//! reservation is confirmed or paid, and deleted whenever the reservation is
//! cancelled (the cancellation path lives in the engine's transition logic).

use tracing::info;

use aero_core::identity::Principal;
use aero_core::{CoreError, CoreResult};
use aero_domain::reservation::{NewTicket, Ticket};

use crate::engine::ReservationEngine;

impl ReservationEngine {
    /// Issue a ticket for a confirmed or paid reservation the principal may
    /// access. Fails with `AlreadyIssued` when one exists.
    pub async fn issue_ticket(
        &self,
        reservation_id: i64,
        principal: &Principal,
    ) -> CoreResult<Ticket> {
        let reservation = self.reservation_view(reservation_id, principal).await?;

        if !reservation.status.is_active() {
            return Err(CoreError::Validation(format!(
                "tickets can only be issued for confirmed or paid reservations, not {}",
                reservation.status.as_str()
            )));
        }
        if self
            .store()
            .ticket_for_reservation(reservation.id)
            .await?
            .is_some()
        {
            return Err(CoreError::AlreadyIssued);
        }

        let barcode = self.unique_barcode().await?;
        let ticket = self
            .store()
            .insert_ticket(NewTicket {
                reservation_id: reservation.id,
                barcode,
            })
            .await?;
        info!(
            ticket_id = ticket.id,
            reservation_id = reservation.id,
            "ticket issued"
        );
        Ok(ticket)
    }

    pub async fn ticket_for_reservation(
        &self,
        reservation_id: i64,
        principal: &Principal,
    ) -> CoreResult<Option<Ticket>> {
        self.reservation_view(reservation_id, principal).await?;
        Ok(self.store().ticket_for_reservation(reservation_id).await?)
    }

    /// Barcode lookup; visibility follows the owning reservation.
    pub async fn ticket_by_barcode(
        &self,
        barcode: &str,
        principal: &Principal,
    ) -> CoreResult<Ticket> {
        let ticket = self
            .store()
            .ticket_by_barcode(barcode)
            .await?
            .ok_or(CoreError::NotFound("ticket"))?;
        self.reservation_view(ticket.reservation_id, principal)
            .await?;
        Ok(ticket)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, NaiveDate, Utc};

    use aero_core::identity::Principal;
    use aero_core::CoreError;
    use aero_domain::aircraft::{NewAircraft, SeatState};
    use aero_domain::flight::NewFlight;
    use aero_domain::passenger::{DocumentType, NewPassenger};
    use aero_domain::reservation::{NewReservation, PaymentMethod, ReservationStatus};

    use crate::engine::{CreateReservation, ReservationEngine};
    use crate::memory::MemoryStore;

    struct Fixture {
        engine: ReservationEngine,
        flight_id: i64,
        passenger_id: i64,
        seat_id: i64,
    }

    async fn fixture() -> Fixture {
        let engine = ReservationEngine::new(Arc::new(MemoryStore::new()));
        let aircraft = engine
            .create_aircraft(NewAircraft {
                model: "A220".to_string(),
                seat_rows: 1,
                seat_columns: 2,
            })
            .await
            .unwrap();
        let departure = Utc::now() + Duration::days(3);
        let flight = engine
            .create_flight(NewFlight {
                aircraft_id: aircraft.id,
                origin: "Mendoza".to_string(),
                destination: "Salta".to_string(),
                departure_at: departure,
                arrival_at: departure + Duration::hours(1),
                base_price_cents: 8_000,
            })
            .await
            .unwrap();
        let passenger = engine
            .register_passenger(NewPassenger {
                given_name: "Lina".to_string(),
                family_name: "Paz".to_string(),
                document_type: DocumentType::Dni,
                document_number: "T-100".to_string(),
                email: "lina@example.com".to_string(),
                phone: "+54 261 555 0000".to_string(),
                date_of_birth: NaiveDate::from_ymd_opt(1992, 4, 2).unwrap(),
            })
            .await
            .unwrap();
        let seat_id = engine
            .store()
            .seats_for_aircraft(aircraft.id)
            .await
            .unwrap()
            .into_iter()
            .next()
            .unwrap()
            .id;
        Fixture {
            engine,
            flight_id: flight.id,
            passenger_id: passenger.id,
            seat_id,
        }
    }

    fn draft(fx: &Fixture, status: ReservationStatus, code: &str) -> NewReservation {
        NewReservation {
            flight_id: fx.flight_id,
            passenger_id: fx.passenger_id,
            seat_id: fx.seat_id,
            status,
            price_cents: 8_000,
            payment_method: PaymentMethod::Card,
            code: code.to_string(),
            owner: Some("ops".to_string()),
        }
    }

    #[tokio::test]
    async fn issuance_is_refused_once_the_reservation_is_cancelled() {
        let fx = fixture().await;
        let principal = Principal::admin("ops");

        let reservation = fx
            .engine
            .create_reservation(
                CreateReservation {
                    flight_id: fx.flight_id,
                    passenger_id: fx.passenger_id,
                    seat_id: fx.seat_id,
                    payment_method: PaymentMethod::Card,
                },
                &principal,
            )
            .await
            .unwrap();
        fx.engine.cancel(reservation.id, &principal).await.unwrap();

        let err = fx
            .engine
            .issue_ticket(reservation.id, &principal)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert!(fx
            .engine
            .ticket_for_reservation(reservation.id, &principal)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn issues_a_ticket_for_an_active_reservation_without_one() {
        let fx = fixture().await;
        let principal = Principal::admin("ops");

        // A confirmed reservation stored without a ticket, as data loaded
        // outside the create path can be.
        let reservation = fx
            .engine
            .store()
            .insert_reservation(
                draft(&fx, ReservationStatus::Confirmed, "LOAD01"),
                SeatState::Held,
                None,
            )
            .await
            .unwrap();

        let ticket = fx
            .engine
            .issue_ticket(reservation.id, &principal)
            .await
            .unwrap();
        assert_eq!(ticket.reservation_id, reservation.id);
        assert_eq!(ticket.barcode.len(), 12);
        assert!(ticket.barcode.chars().all(|c| c.is_ascii_digit()));

        let err = fx
            .engine
            .issue_ticket(reservation.id, &principal)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::AlreadyIssued));
    }

    #[tokio::test]
    async fn confirming_a_pending_reservation_issues_the_missing_ticket() {
        let fx = fixture().await;
        let principal = Principal::admin("ops");

        let reservation = fx
            .engine
            .store()
            .insert_reservation(
                draft(&fx, ReservationStatus::Pending, "LOAD02"),
                SeatState::Held,
                None,
            )
            .await
            .unwrap();
        assert!(fx
            .engine
            .ticket_for_reservation(reservation.id, &principal)
            .await
            .unwrap()
            .is_none());

        let outcome = fx
            .engine
            .transition(reservation.id, ReservationStatus::Confirmed, &principal)
            .await
            .unwrap();
        assert!(outcome.changed);

        let ticket = fx
            .engine
            .ticket_for_reservation(reservation.id, &principal)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(ticket.barcode.len(), 12);
    }
}
