use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cabin class of a seat
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SeatClass {
    Economy,
    Business,
    First,
}

impl SeatClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeatClass::Economy => "economy",
            SeatClass::Business => "business",
            SeatClass::First => "first",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "economy" => Some(SeatClass::Economy),
            "business" => Some(SeatClass::Business),
            "first" => Some(SeatClass::First),
            _ => None,
        }
    }
}

impl std::fmt::Display for SeatClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Occupancy flag on a seat. This is a per-aircraft property shared by all
/// flights of that aircraft; per-flight availability is decided by active
/// reservations, not by this flag alone.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SeatState {
    Available,
    Held,
    Occupied,
    OutOfService,
}

impl SeatState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeatState::Available => "available",
            SeatState::Held => "held",
            SeatState::Occupied => "occupied",
            SeatState::OutOfService => "out_of_service",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "available" => Some(SeatState::Available),
            "held" => Some(SeatState::Held),
            "occupied" => Some(SeatState::Occupied),
            "out_of_service" => Some(SeatState::OutOfService),
            _ => None,
        }
    }
}

impl std::fmt::Display for SeatState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Aircraft {
    pub id: i64,
    pub model: String,
    pub seat_rows: i32,
    pub seat_columns: i32,
    pub capacity: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAircraft {
    pub model: String,
    pub seat_rows: i32,
    pub seat_columns: i32,
}

impl NewAircraft {
    /// Capacity is always derived from the grid; a caller-supplied figure
    /// that disagrees is overwritten.
    pub fn capacity(&self) -> i32 {
        self.seat_rows * self.seat_columns
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seat {
    pub id: i64,
    pub aircraft_id: i64,
    pub number: String,
    pub row: i32,
    pub column: String,
    pub class: SeatClass,
    pub state: SeatState,
}

/// Seat blueprint produced by the inventory generator, persisted by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSeat {
    pub number: String,
    pub row: i32,
    pub column: String,
    pub class: SeatClass,
    pub state: SeatState,
}
