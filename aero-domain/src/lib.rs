pub mod aircraft;
pub mod flight;
pub mod passenger;
pub mod repository;
pub mod reservation;

pub use aircraft::{Aircraft, NewAircraft, NewSeat, Seat, SeatClass, SeatState};
pub use flight::{Flight, FlightFilter, FlightStatus, NewFlight};
pub use passenger::{DocumentType, NewPassenger, Passenger};
pub use repository::{
    ReservationStore, StoreError, SystemSummary, TransitionEffects,
};
pub use reservation::{
    NewReservation, NewTicket, PaymentMethod, Reservation, ReservationStatus, Ticket,
    TicketStatus,
};
