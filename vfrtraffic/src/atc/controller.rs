//! The controller abstraction shared by tower and ground.

use serde::Serialize;

use crate::aircraft::PatternLeg;
use crate::geo::GeoPoint;

use super::clearance::{Station, Transmission};

/// Where one aircraft is this tick, as seen by controllers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AircraftSnapshot {
    pub callsign: String,
    pub airport: String,
    pub position: GeoPoint,
    pub heading_deg: f64,
    pub ias_kt: f64,
    /// Current pattern leg, `Unknown` when not in the pattern.
    pub leg: PatternLeg,
    /// Short description of the aircraft's state, for display.
    pub phase: String,
    pub visible: bool,
}

/// Every aircraft at an airport this tick.
#[derive(Debug, Clone, Default)]
pub struct TrafficPicture {
    aircraft: Vec<AircraftSnapshot>,
}

impl TrafficPicture {
    pub fn new(aircraft: Vec<AircraftSnapshot>) -> Self {
        Self { aircraft }
    }

    /// Snapshot for a callsign.
    pub fn get(&self, callsign: &str) -> Option<&AircraftSnapshot> {
        self.aircraft.iter().find(|a| a.callsign == callsign)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AircraftSnapshot> {
        self.aircraft.iter()
    }

    pub fn len(&self) -> usize {
        self.aircraft.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aircraft.is_empty()
    }
}

/// A controller position at an airport.
pub trait Controller {
    /// Which position this is.
    fn station(&self) -> Station;

    /// Advance by `dt` seconds and return anything said on frequency.
    fn update(&mut self, dt: f64, picture: &TrafficPicture) -> Vec<Transmission>;

    /// Observe a transmission made by a sibling controller.
    fn on_clearance_event(&mut self, transmission: &Transmission);
}

/// Paces controller answers so they are not instantaneous.
///
/// Armed when a report arrives; fires once the delay has elapsed.
#[derive(Debug, Clone)]
pub struct ResponseTimer {
    delay_s: f64,
    elapsed_s: f64,
    armed: bool,
}

impl ResponseTimer {
    pub fn new(delay_s: f64) -> Self {
        Self {
            delay_s,
            elapsed_s: 0.0,
            armed: false,
        }
    }

    /// Start timing unless already running.
    pub fn arm(&mut self) {
        if !self.armed {
            self.armed = true;
            self.elapsed_s = 0.0;
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Advance the timer; returns `true` once when the delay elapses.
    pub fn tick(&mut self, dt: f64) -> bool {
        if !self.armed {
            return false;
        }
        self.elapsed_s += dt;
        if self.elapsed_s >= self.delay_s {
            self.armed = false;
            self.elapsed_s = 0.0;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_fires_once_after_delay() {
        let mut timer = ResponseTimer::new(1.8);
        assert!(!timer.tick(5.0));

        timer.arm();
        assert!(!timer.tick(1.0));
        assert!(timer.tick(1.0));
        assert!(!timer.tick(1.0));
        assert!(!timer.is_armed());
    }

    #[test]
    fn test_rearming_running_timer_keeps_elapsed_time() {
        let mut timer = ResponseTimer::new(1.0);
        timer.arm();
        assert!(!timer.tick(0.6));
        timer.arm();
        assert!(timer.tick(0.6));
    }

    #[test]
    fn test_picture_lookup() {
        let snap = AircraftSnapshot {
            callsign: "N1".to_string(),
            airport: "KXYZ".to_string(),
            position: GeoPoint::default(),
            heading_deg: 0.0,
            ias_kt: 0.0,
            leg: PatternLeg::Unknown,
            phase: "parked".to_string(),
            visible: true,
        };
        let picture = TrafficPicture::new(vec![snap]);
        assert_eq!(picture.len(), 1);
        assert!(picture.get("N1").is_some());
        assert!(picture.get("N2").is_none());
    }
}
