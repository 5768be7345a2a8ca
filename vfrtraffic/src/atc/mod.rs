//! Airport traffic control.
//!
//! Each active airport has an [`AirportController`] made of two positions
//! that implement [`Controller`]:
//!
//! - [`Tower`]: runway sequencing, take-off and landing clearances, go-arounds
//! - [`GroundController`]: taxi clearances, gate allocation and taxi routes
//!
//! # Architecture
//!
//! ```text
//! TrafficPicture ──► AirportController::update()
//!                      ├─► GroundController ──┐
//!                      └─► Tower ─────────────┤ Transmission { event }
//!                                             ▼
//!                                     addressed aircraft
//! ```
//!
//! Controllers never hold references to aircraft. They see aircraft through
//! the per-tick [`TrafficPicture`] and address them by callsign.

mod airport;
mod clearance;
mod config;
mod controller;
mod ground;
pub mod tower;

pub use airport::AirportController;
pub use clearance::{
    phonetic, spoken_digits, ClearanceEvent, PilotCall, PilotMessage, Station, Transmission,
};
pub use config::AtcConfig;
pub use controller::{AircraftSnapshot, Controller, ResponseTimer, TrafficPicture};
pub use ground::GroundController;
pub use tower::Tower;

use thiserror::Error;

/// A lookup a controller could not satisfy.
///
/// None of these are fatal; callers fall back to a degraded behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupFailure {
    /// The airport has no gates at all.
    #[error("No gates at this airport")]
    NoGates,

    /// Every gate is taken.
    #[error("All gates are occupied")]
    AllGatesOccupied,

    /// The ground network has no threshold node for the runway.
    #[error("No threshold node for runway {0}")]
    NoThreshold(String),

    /// No active runway is known for the airport.
    #[error("No active runway for airport {0}")]
    UnknownRunway(String),

    /// The callsign is not known to the controller.
    #[error("Unknown aircraft: {0}")]
    UnknownAircraft(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_failure_messages() {
        assert_eq!(LookupFailure::NoGates.to_string(), "No gates at this airport");
        assert_eq!(
            LookupFailure::UnknownAircraft("N123AB".to_string()).to_string(),
            "Unknown aircraft: N123AB"
        );
        assert_eq!(
            LookupFailure::NoThreshold("25".to_string()).to_string(),
            "No threshold node for runway 25"
        );
    }
}
