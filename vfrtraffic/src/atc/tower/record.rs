//! The tower's record of one aircraft.

use std::collections::VecDeque;

use serde::Serialize;

use crate::aircraft::{LandingKind, OperationKind, PatternLeg};
use crate::geo::{GeoPoint, LocalPoint};

/// Stable id of a tower record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RecordId(pub(crate) u32);

/// Runway clearance currently held by an aircraft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum RunwayClearance {
    #[default]
    None,
    LineUp,
    Takeoff,
    Land,
}

/// A report awaiting the tower's answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PilotReport {
    HoldShort,
    LineUp,
    VfrArrival,
    Downwind,
    Final,
    RunwayVacated,
}

/// One traffic participant known to the tower.
#[derive(Debug, Clone, Serialize)]
pub struct TrackedAircraft {
    pub callsign: String,
    pub position: GeoPoint,
    /// Position in the active runway frame.
    pub local: LocalPoint,
    pub operation: OperationKind,
    pub leg: PatternLeg,
    pub landing: LandingKind,
    /// Estimated seconds to the threshold; ordering only.
    pub eta_s: f64,
    /// Distance from the threshold (metres).
    pub distance_out_m: f64,
    pub clearance: RunwayClearance,
    pub go_around_instructed: bool,
    pub next_on_runway: bool,
    /// Set by the host for an aircraft flown by a person. The tower never
    /// sets it and sequences such records like any other; AI traffic is
    /// always `false`.
    pub user_controlled: bool,

    pending: VecDeque<PilotReport>,
    final_acknowledged: bool,
    vacated_acknowledged: bool,
    /// Set once the aircraft has been seen on the runway surface.
    pub(crate) seen_on_runway: bool,
}

impl TrackedAircraft {
    pub fn new(callsign: impl Into<String>, operation: OperationKind) -> Self {
        Self {
            callsign: callsign.into(),
            position: GeoPoint::default(),
            local: LocalPoint::default(),
            operation,
            leg: PatternLeg::Unknown,
            landing: LandingKind::Unknown,
            eta_s: 0.0,
            distance_out_m: 0.0,
            clearance: RunwayClearance::None,
            go_around_instructed: false,
            next_on_runway: false,
            user_controlled: false,
            pending: VecDeque::new(),
            final_acknowledged: false,
            vacated_acknowledged: false,
            seen_on_runway: false,
        }
    }

    /// Queue a report for an answer. Duplicate pending reports are ignored.
    pub(crate) fn push_report(&mut self, report: PilotReport) -> bool {
        if self.pending.contains(&report) {
            return false;
        }
        match report {
            PilotReport::Final => self.final_acknowledged = false,
            PilotReport::RunwayVacated => self.vacated_acknowledged = false,
            _ => {}
        }
        self.pending.push_back(report);
        true
    }

    /// Take the oldest unanswered report.
    pub(crate) fn pop_report(&mut self) -> Option<PilotReport> {
        self.pending.pop_front()
    }

    pub(crate) fn drop_report(&mut self, report: PilotReport) {
        self.pending.retain(|r| *r != report);
    }

    pub(crate) fn acknowledge_final(&mut self) {
        self.drop_report(PilotReport::Final);
        self.final_acknowledged = true;
    }

    pub(crate) fn acknowledge_vacated(&mut self) {
        self.drop_report(PilotReport::RunwayVacated);
        self.vacated_acknowledged = true;
    }

    pub fn has_pending_reports(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn hold_short_reported(&self) -> bool {
        self.pending.contains(&PilotReport::HoldShort)
    }

    pub fn line_up_reported(&self) -> bool {
        self.pending.contains(&PilotReport::LineUp)
    }

    pub fn cleared_to_land(&self) -> bool {
        self.clearance == RunwayClearance::Land
    }

    pub fn cleared_to_takeoff(&self) -> bool {
        self.clearance == RunwayClearance::Takeoff
    }

    pub fn final_reported(&self) -> bool {
        self.pending.contains(&PilotReport::Final) || self.final_acknowledged
    }

    pub fn final_acknowledged(&self) -> bool {
        self.final_acknowledged
    }

    pub fn runway_vacated_reported(&self) -> bool {
        self.pending.contains(&PilotReport::RunwayVacated) || self.vacated_acknowledged
    }

    pub fn runway_vacated_acknowledged(&self) -> bool {
        self.vacated_acknowledged
    }

    pub fn instructed_to_go_around(&self) -> bool {
        self.go_around_instructed
    }

    pub fn is_user(&self) -> bool {
        self.user_controlled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reports_are_fifo_and_deduplicated() {
        let mut rec = TrackedAircraft::new("N1", OperationKind::Circuit);
        assert!(rec.push_report(PilotReport::Downwind));
        assert!(rec.push_report(PilotReport::Final));
        assert!(!rec.push_report(PilotReport::Downwind));

        assert!(rec.final_reported());
        assert!(!rec.final_acknowledged());
        assert_eq!(rec.pop_report(), Some(PilotReport::Downwind));
        assert_eq!(rec.pop_report(), Some(PilotReport::Final));
        assert_eq!(rec.pop_report(), None);
    }

    #[test]
    fn test_new_record_is_ai_controlled() {
        let mut rec = TrackedAircraft::new("N1", OperationKind::Inbound);
        assert!(!rec.is_user());
        assert!(!rec.instructed_to_go_around());

        rec.user_controlled = true;
        assert!(rec.is_user());
    }

    #[test]
    fn test_acknowledgement_flags() {
        let mut rec = TrackedAircraft::new("N1", OperationKind::Circuit);
        rec.push_report(PilotReport::Final);
        rec.acknowledge_final();
        assert!(rec.final_reported());
        assert!(rec.final_acknowledged());
        assert!(!rec.has_pending_reports());

        rec.push_report(PilotReport::RunwayVacated);
        assert!(rec.runway_vacated_reported());
        rec.acknowledge_vacated();
        assert!(rec.runway_vacated_acknowledged());
    }

    #[test]
    fn test_clearance_views() {
        let mut rec = TrackedAircraft::new("N1", OperationKind::Circuit);
        assert!(!rec.cleared_to_land());
        rec.clearance = RunwayClearance::Land;
        assert!(rec.cleared_to_land());
        assert!(!rec.cleared_to_takeoff());
        rec.clearance = RunwayClearance::Takeoff;
        assert!(rec.cleared_to_takeoff());
    }
}
