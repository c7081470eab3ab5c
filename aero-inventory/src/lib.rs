pub mod capacity;
pub mod seats;

pub use capacity::{available_seats, occupancy_percentage};
pub use seats::{column_label, group_by_row, seat_blueprints, SeatMapEntry, SeatMapRow};
