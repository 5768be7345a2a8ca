//! The controllers of one airport, composed.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::aircraft::{LandingKind, OperationKind, PatternLeg};
use crate::ground::{GroundNetwork, NodeId, Path};
use crate::runway::ActiveRunway;

use super::clearance::{PilotCall, PilotMessage, Station, Transmission};
use super::config::AtcConfig;
use super::controller::{Controller, TrafficPicture};
use super::ground::GroundController;
use super::tower::Tower;
use super::LookupFailure;

/// Tower and ground for one airport.
///
/// Each position runs on its own; transmissions that carry an event are
/// offered to the other position so hand-offs are seen on both sides.
pub struct AirportController {
    ident: String,
    tower: Tower,
    ground: GroundController,
}

impl AirportController {
    /// Create the controllers for an airport.
    pub fn new(
        ident: impl Into<String>,
        runway: ActiveRunway,
        network: Option<Arc<GroundNetwork>>,
        config: AtcConfig,
    ) -> Self {
        let ident = ident.into();
        let ground = GroundController::new(&ident, runway.ident(), network, config.clone());
        let tower = Tower::new(&ident, runway, config);
        Self {
            ident,
            tower,
            ground,
        }
    }

    pub fn ident(&self) -> &str {
        &self.ident
    }

    pub fn tower(&self) -> &Tower {
        &self.tower
    }

    pub fn ground(&self) -> &GroundController {
        &self.ground
    }

    pub fn runway(&self) -> &ActiveRunway {
        self.tower.runway()
    }

    /// Route one pilot call to the position that handles it.
    pub fn handle_pilot_call(&mut self, message: &PilotMessage) {
        let callsign = message.callsign.as_str();
        let result = match &message.call {
            PilotCall::RequestTaxi => {
                self.request_departure(callsign);
                Ok(())
            }
            PilotCall::ReadyAtHoldShort => {
                self.ready_at_hold_short(callsign);
                Ok(())
            }
            PilotCall::AtHoldShort { operation, landing } => {
                self.contact_at_hold_short(callsign, *operation, *landing);
                Ok(())
            }
            PilotCall::RequestTakeoff => self.request_takeoff(callsign),
            PilotCall::VfrArrival => {
                self.vfr_arrival_contact(callsign, LandingKind::FullStop);
                Ok(())
            }
            PilotCall::ReportDownwind => self.report_downwind(callsign),
            PilotCall::ReportFinal => self.report_final(callsign),
            PilotCall::GoingAround => self.report_going_around(callsign),
            PilotCall::RunwayVacated => self.report_runway_vacated(callsign),
            PilotCall::LeavingFrequency(Station::Tower) => {
                self.deregister_ai_plane(callsign);
                Ok(())
            }
            PilotCall::LeavingFrequency(Station::Ground) | PilotCall::RemoveSelf => {
                self.ground.leaving_frequency(callsign);
                Ok(())
            }
            PilotCall::Readback => Ok(()),
        };
        if let Err(e) = result {
            warn!(airport = %self.ident, callsign, error = %e, "Pilot call not handled");
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Tower operations
    // ─────────────────────────────────────────────────────────────────────

    pub fn register_ai_plane(
        &mut self,
        callsign: &str,
        operation: OperationKind,
        leg: PatternLeg,
        landing: LandingKind,
    ) {
        self.tower.register_ai_plane(callsign, operation, leg, landing);
    }

    pub fn deregister_ai_plane(&mut self, callsign: &str) -> bool {
        self.tower.deregister_ai_plane(callsign)
    }

    pub fn contact_at_hold_short(
        &mut self,
        callsign: &str,
        operation: OperationKind,
        landing: LandingKind,
    ) {
        self.ground.leaving_frequency(callsign);
        self.tower.contact_at_hold_short(callsign, operation, landing);
    }

    pub fn vfr_arrival_contact(&mut self, callsign: &str, landing: LandingKind) {
        self.tower.vfr_arrival_contact(callsign, landing);
    }

    pub fn request_takeoff(&mut self, callsign: &str) -> Result<(), LookupFailure> {
        self.tower.request_takeoff(callsign)
    }

    pub fn report_downwind(&mut self, callsign: &str) -> Result<(), LookupFailure> {
        self.tower.report_downwind(callsign)
    }

    pub fn report_final(&mut self, callsign: &str) -> Result<(), LookupFailure> {
        self.tower.report_final(callsign)
    }

    pub fn report_going_around(&mut self, callsign: &str) -> Result<(), LookupFailure> {
        self.tower.report_going_around(callsign)
    }

    pub fn report_runway_vacated(&mut self, callsign: &str) -> Result<(), LookupFailure> {
        self.tower.report_runway_vacated(callsign)
    }

    pub fn get_crosswind_constraint(&self, requester: &str) -> Option<f64> {
        self.tower.crosswind_constraint(requester)
    }

    pub fn get_downwind_constraint(&self, requester: &str) -> Option<f64> {
        self.tower.downwind_constraint(requester)
    }

    pub fn get_base_constraint(&self, requester: &str) -> Option<f64> {
        self.tower.base_constraint(requester)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Ground operations
    // ─────────────────────────────────────────────────────────────────────

    pub fn request_departure(&mut self, callsign: &str) {
        self.ground.request_departure(callsign);
    }

    pub fn ready_at_hold_short(&mut self, callsign: &str) {
        self.ground.ready_at_hold_short(callsign);
    }

    pub fn reserve_gate(&self) -> Result<NodeId, LookupFailure> {
        self.ground.reserve_gate()
    }

    pub fn occupy_gate(&self, gate: NodeId) -> bool {
        self.ground.occupy_gate(gate)
    }

    pub fn release_gate(&self, gate: NodeId) -> bool {
        self.ground.release_gate(gate)
    }

    pub fn get_path(&self, from: NodeId, runway_id: &str) -> Path {
        self.ground.get_path(from, runway_id)
    }

    pub fn get_path_to_hold_short(&self, from: NodeId, runway_id: &str) -> Path {
        self.ground.get_path_to_hold_short(from, runway_id)
    }

    pub fn get_path_between(&self, from: NodeId, to: NodeId) -> Path {
        self.ground.get_path_between(from, to)
    }

    pub fn get_exits(&self, runway_id: &str) -> Vec<NodeId> {
        self.ground.get_exits(runway_id)
    }

    pub fn network(&self) -> Option<&GroundNetwork> {
        self.ground.network()
    }
}

impl Controller for AirportController {
    fn station(&self) -> Station {
        Station::Tower
    }

    fn update(&mut self, dt: f64, picture: &TrafficPicture) -> Vec<Transmission> {
        let from_ground = self.ground.update(dt, picture);
        let from_tower = self.tower.update(dt, picture);

        for t in from_ground.iter().filter(|t| t.event.is_some()) {
            self.tower.on_clearance_event(t);
        }
        for t in from_tower.iter().filter(|t| t.event.is_some()) {
            self.ground.on_clearance_event(t);
        }

        let mut out = from_ground;
        out.extend(from_tower);
        if !out.is_empty() {
            debug!(airport = %self.ident, count = out.len(), "Controller transmissions");
        }
        out
    }

    fn on_clearance_event(&mut self, transmission: &Transmission) {
        match transmission.station {
            Station::Tower => self.ground.on_clearance_event(transmission),
            Station::Ground => self.tower.on_clearance_event(transmission),
        }
    }
}
