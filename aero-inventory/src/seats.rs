use std::collections::HashSet;

use aero_domain::aircraft::{NewSeat, Seat, SeatClass, SeatState};
use serde::Serialize;

const LETTERS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Letter token for a zero-based column index: A, B, C... and a synthetic
/// label once the alphabet runs out.
pub fn column_label(index: usize) -> String {
    if index < LETTERS.len() {
        (LETTERS[index] as char).to_string()
    } else {
        format!("A{}", index)
    }
}

/// Row-major seat blueprints for a rows x columns cabin grid, labeled
/// `{row}{columnLetter}`, all economy and available.
pub fn seat_blueprints(rows: i32, columns: i32) -> Vec<NewSeat> {
    let mut seats = Vec::with_capacity((rows * columns).max(0) as usize);
    for row in 1..=rows {
        for col in 0..columns {
            let column = column_label(col as usize);
            seats.push(NewSeat {
                number: format!("{}{}", row, column),
                row,
                column,
                class: SeatClass::Economy,
                state: SeatState::Available,
            });
        }
    }
    seats
}

/// One entry of a per-flight seat map.
#[derive(Debug, Clone, Serialize)]
pub struct SeatMapEntry {
    pub seat: Seat,
    pub reserved: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeatMapRow {
    pub row: i32,
    pub seats: Vec<SeatMapEntry>,
}

/// Group an aircraft's seats by row, flagging the ones held by an active
/// reservation on the flight being mapped. Input seats are expected in
/// (row, column) order; rows come out in ascending order.
pub fn group_by_row(seats: Vec<Seat>, reserved_seat_ids: &HashSet<i64>) -> Vec<SeatMapRow> {
    let mut rows: Vec<SeatMapRow> = Vec::new();
    for seat in seats {
        let reserved = reserved_seat_ids.contains(&seat.id);
        match rows.last_mut() {
            Some(last) if last.row == seat.row => last.seats.push(SeatMapEntry { seat, reserved }),
            _ => rows.push(SeatMapRow {
                row: seat.row,
                seats: vec![SeatMapEntry { seat, reserved }],
            }),
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blueprint_grid_is_rows_times_columns() {
        let seats = seat_blueprints(2, 2);
        let numbers: Vec<&str> = seats.iter().map(|s| s.number.as_str()).collect();
        assert_eq!(numbers, vec!["1A", "1B", "2A", "2B"]);
        assert!(seats
            .iter()
            .all(|s| s.class == SeatClass::Economy && s.state == SeatState::Available));
    }

    #[test]
    fn labels_are_unique_per_grid() {
        let seats = seat_blueprints(30, 6);
        assert_eq!(seats.len(), 180);
        let unique: HashSet<&str> = seats.iter().map(|s| s.number.as_str()).collect();
        assert_eq!(unique.len(), 180);
    }

    #[test]
    fn columns_past_the_alphabet_get_synthetic_labels() {
        assert_eq!(column_label(0), "A");
        assert_eq!(column_label(25), "Z");
        assert_eq!(column_label(26), "A26");
        assert_eq!(column_label(30), "A30");
    }

    #[test]
    fn zero_rows_yields_no_seats() {
        assert!(seat_blueprints(0, 4).is_empty());
    }

    #[test]
    fn grouping_preserves_row_order_and_flags() {
        let blueprints = seat_blueprints(2, 2);
        let seats: Vec<Seat> = blueprints
            .into_iter()
            .enumerate()
            .map(|(i, b)| Seat {
                id: i as i64 + 1,
                aircraft_id: 1,
                number: b.number,
                row: b.row,
                column: b.column,
                class: b.class,
                state: b.state,
            })
            .collect();
        let reserved: HashSet<i64> = [2].into_iter().collect();
        let rows = group_by_row(seats, &reserved);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].row, 1);
        assert!(!rows[0].seats[0].reserved);
        assert!(rows[0].seats[1].reserved);
        assert_eq!(rows[1].seats.len(), 2);
    }
}
