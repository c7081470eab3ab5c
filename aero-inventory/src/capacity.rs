//! Flight capacity view. Pure derivations over the aircraft capacity and the
//! current count of active reservations; callers re-query the count on every
//! call so the view is always consistent with the reservation set.

/// Seats still sellable on a flight.
pub fn available_seats(capacity: i32, active_reservations: i64) -> i64 {
    capacity as i64 - active_reservations
}

/// Occupancy as a percentage of capacity. Zero-capacity aircraft report 0
/// rather than dividing by zero.
pub fn occupancy_percentage(capacity: i32, active_reservations: i64) -> f64 {
    if capacity == 0 {
        return 0.0;
    }
    (active_reservations as f64 / capacity as f64) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn available_plus_active_equals_capacity() {
        for active in 0..=4 {
            assert_eq!(available_seats(4, active) + active, 4);
        }
    }

    #[test]
    fn occupancy_is_a_ratio_of_capacity() {
        assert_eq!(occupancy_percentage(4, 1), 25.0);
        assert_eq!(occupancy_percentage(4, 4), 100.0);
        assert_eq!(occupancy_percentage(4, 0), 0.0);
    }

    #[test]
    fn zero_capacity_reports_zero_occupancy() {
        assert_eq!(occupancy_percentage(0, 0), 0.0);
    }
}
