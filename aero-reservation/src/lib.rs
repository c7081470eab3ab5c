pub mod engine;
pub mod memory;
pub mod tickets;

pub use engine::{
    CreateReservation, FlightAvailability, FlightManifest, FlightSeatMap, ManifestEntry,
    ManifestStats, PassengerActivity, ReservationEngine, TransitionOutcome,
};
pub use memory::MemoryStore;
