use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FlightStatus {
    Scheduled,
    InFlight,
    Completed,
    Cancelled,
    Delayed,
}

impl FlightStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlightStatus::Scheduled => "scheduled",
            FlightStatus::InFlight => "in_flight",
            FlightStatus::Completed => "completed",
            FlightStatus::Cancelled => "cancelled",
            FlightStatus::Delayed => "delayed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "scheduled" => Some(FlightStatus::Scheduled),
            "in_flight" => Some(FlightStatus::InFlight),
            "completed" => Some(FlightStatus::Completed),
            "cancelled" => Some(FlightStatus::Cancelled),
            "delayed" => Some(FlightStatus::Delayed),
            _ => None,
        }
    }
}

impl std::fmt::Display for FlightStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flight {
    pub id: i64,
    pub aircraft_id: i64,
    pub origin: String,
    pub destination: String,
    pub departure_at: DateTime<Utc>,
    pub arrival_at: DateTime<Utc>,
    pub status: FlightStatus,
    pub base_price_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl Flight {
    /// Derived, never stored.
    pub fn duration(&self) -> Duration {
        self.arrival_at - self.departure_at
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFlight {
    pub aircraft_id: i64,
    pub origin: String,
    pub destination: String,
    pub departure_at: DateTime<Utc>,
    pub arrival_at: DateTime<Utc>,
    pub base_price_cents: i64,
}

/// Store-level flight search filter. Origin and destination match as
/// case-insensitive substrings; the date range applies to the departure day.
#[derive(Debug, Clone, Default)]
pub struct FlightFilter {
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub status: Option<FlightStatus>,
}
