//! Ground controller: taxi clearances, gates and taxi routes.
//!
//! Works with or without a taxi network. Without one (degraded mode) every
//! route query returns an empty [`Path`] and gate requests fail with
//! [`LookupFailure::NoGates`]; aircraft then use synthetic waypoints.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::ground::{GroundNetwork, NodeId, Path};

use super::clearance::{spoken_digits, ClearanceEvent, Station, Transmission};
use super::config::AtcConfig;
use super::controller::{Controller, ResponseTimer, TrafficPicture};
use super::LookupFailure;

/// Gate occupancy. Kept apart from the immutable network.
struct GateRegistry {
    occupied: HashSet<NodeId>,
    rng: StdRng,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum GroundRequest {
    Taxi(String),
    HoldShort(String),
}

/// The ground position at one airport.
pub struct GroundController {
    airport: String,
    runway_ident: String,
    network: Option<Arc<GroundNetwork>>,
    config: AtcConfig,
    gates: Mutex<GateRegistry>,
    timer: ResponseTimer,
    requests: VecDeque<GroundRequest>,
    inbound: Vec<String>,
}

impl GroundController {
    /// Create a ground controller. `network` is `None` in degraded mode.
    pub fn new(
        airport: impl Into<String>,
        runway_ident: impl Into<String>,
        network: Option<Arc<GroundNetwork>>,
        config: AtcConfig,
    ) -> Self {
        let timer = ResponseTimer::new(config.response_delay_s);
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            airport: airport.into(),
            runway_ident: runway_ident.into(),
            network,
            config,
            gates: Mutex::new(GateRegistry {
                occupied: HashSet::new(),
                rng,
            }),
            timer,
            requests: VecDeque::new(),
            inbound: Vec::new(),
        }
    }

    /// The taxi network, if one is loaded.
    pub fn network(&self) -> Option<&GroundNetwork> {
        self.network.as_deref()
    }

    /// Whether the controller runs without a taxi network.
    pub fn is_degraded(&self) -> bool {
        self.network.is_none()
    }

    pub fn runway_ident(&self) -> &str {
        &self.runway_ident
    }

    // ─────────────────────────────────────────────────────────────────────
    // Gates
    // ─────────────────────────────────────────────────────────────────────

    /// Reserve a random free gate.
    pub fn reserve_gate(&self) -> Result<NodeId, LookupFailure> {
        let network = self.network().ok_or(LookupFailure::NoGates)?;
        let all = network.gates();
        if all.is_empty() {
            return Err(LookupFailure::NoGates);
        }

        let mut registry = self.gates.lock();
        let free: Vec<NodeId> = all
            .iter()
            .copied()
            .filter(|g| !registry.occupied.contains(g))
            .collect();
        if free.is_empty() {
            return Err(LookupFailure::AllGatesOccupied);
        }
        let gate = free[registry.rng.random_range(0..free.len())];
        registry.occupied.insert(gate);
        debug!(airport = %self.airport, gate = gate.index(), "Gate reserved");
        Ok(gate)
    }

    /// Mark a specific gate as occupied. Returns `false` if it already was.
    pub fn occupy_gate(&self, gate: NodeId) -> bool {
        self.gates.lock().occupied.insert(gate)
    }

    /// Free a gate. Returns `false` if it was not occupied.
    pub fn release_gate(&self, gate: NodeId) -> bool {
        self.gates.lock().occupied.remove(&gate)
    }

    pub fn is_gate_occupied(&self, gate: NodeId) -> bool {
        self.gates.lock().occupied.contains(&gate)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Requests
    // ─────────────────────────────────────────────────────────────────────

    /// A parked aircraft asks to taxi for departure.
    pub fn request_departure(&mut self, callsign: &str) {
        self.queue_request(GroundRequest::Taxi(callsign.to_string()));
    }

    /// A departing aircraft has reached the hold short.
    pub fn ready_at_hold_short(&mut self, callsign: &str) {
        self.queue_request(GroundRequest::HoldShort(callsign.to_string()));
    }

    /// An aircraft left the ground frequency.
    pub fn leaving_frequency(&mut self, callsign: &str) {
        self.inbound.retain(|c| c != callsign);
        self.requests.retain(|r| match r {
            GroundRequest::Taxi(c) | GroundRequest::HoldShort(c) => c != callsign,
        });
    }

    /// Aircraft handed over by the tower after landing.
    pub fn inbound_callsigns(&self) -> &[String] {
        &self.inbound
    }

    fn queue_request(&mut self, request: GroundRequest) {
        if !self.requests.contains(&request) {
            self.requests.push_back(request);
        }
        self.timer.arm();
    }

    fn respond(&mut self, out: &mut Vec<Transmission>) {
        let Some(request) = self.requests.pop_front() else {
            return;
        };
        let runway = spoken_digits(&self.runway_ident);
        let transmission = match request {
            GroundRequest::Taxi(callsign) => Transmission::instruct(
                Station::Ground,
                &callsign,
                format!("{} taxi to runway {}, hold short", callsign, runway),
                ClearanceEvent::TaxiCleared,
            ),
            GroundRequest::HoldShort(callsign) => Transmission::instruct(
                Station::Ground,
                &callsign,
                format!(
                    "{} contact tower on {:.2}",
                    callsign, self.config.tower_frequency_mhz
                ),
                ClearanceEvent::ContactTower,
            ),
        };
        out.push(transmission);
        if !self.requests.is_empty() {
            self.timer.arm();
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Routes
    // ─────────────────────────────────────────────────────────────────────

    /// Route from a node to a runway threshold.
    pub fn get_path(&self, from: NodeId, runway_id: &str) -> Path {
        match self.network() {
            Some(network) => network.path_to_runway_threshold(from, runway_id),
            None => Path::empty(),
        }
    }

    /// Route from a node to the hold short of a runway.
    pub fn get_path_to_hold_short(&self, from: NodeId, runway_id: &str) -> Path {
        match self.network() {
            Some(network) => network.path_to_hold_short(from, runway_id),
            None => Path::empty(),
        }
    }

    /// Route between two nodes.
    pub fn get_path_between(&self, from: NodeId, to: NodeId) -> Path {
        match self.network() {
            Some(network) => network.shortest_path(from, to),
            None => Path::empty(),
        }
    }

    /// Exit nodes of a runway.
    pub fn get_exits(&self, runway_id: &str) -> Vec<NodeId> {
        self.network()
            .map(|n| n.exits(runway_id).to_vec())
            .unwrap_or_default()
    }

    /// Threshold node of a runway.
    pub fn threshold_node(&self, runway_id: &str) -> Result<NodeId, LookupFailure> {
        self.network()
            .and_then(|n| n.threshold_node(runway_id))
            .ok_or_else(|| LookupFailure::NoThreshold(runway_id.to_string()))
    }
}

impl Controller for GroundController {
    fn station(&self) -> Station {
        Station::Ground
    }

    fn update(&mut self, dt: f64, _picture: &TrafficPicture) -> Vec<Transmission> {
        let mut out = Vec::new();
        if self.timer.tick(dt) {
            self.respond(&mut out);
        }
        out
    }

    fn on_clearance_event(&mut self, transmission: &Transmission) {
        match transmission.event {
            Some(ClearanceEvent::ContactGround) => {
                if !self.inbound.contains(&transmission.callsign) {
                    info!(
                        airport = %self.airport,
                        callsign = %transmission.callsign,
                        "Inbound handed over to ground"
                    );
                    self.inbound.push(transmission.callsign.clone());
                }
            }
            Some(ClearanceEvent::ClearOfAirspace) => {
                self.leaving_frequency(&transmission.callsign);
            }
            Some(ClearanceEvent::Takeoff { .. }) if self.is_degraded() => {
                warn!(
                    airport = %self.airport,
                    callsign = %transmission.callsign,
                    "Take-off cleared without a taxi network"
                );
            }
            _ => {}
        }
    }
}
