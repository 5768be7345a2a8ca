//! Ground movement: taxiing out, lining up and taxiing in.
//!
//! Routes are lists of waypoints built from taxi network paths, or a single
//! synthetic waypoint beside the runway when the airport has no network.
//! Waypoints are chased one at a time with the taxi turn law; a waypoint
//! counts as reached inside the turn radius, or when it has been overflown
//! and lies behind within two radii.

use serde::Serialize;
use tracing::{debug, warn};

use crate::atc::{PilotCall, PilotMessage, Station};
use crate::geo::{heading_difference, GeoPoint, LocalPoint};
use crate::ground::{GroundNetwork, NodeId, Path};
use crate::runway::ActiveRunway;

use super::kinematics::{advance, taxi_turn_toward};
use super::types::PatternLeg;
use super::{
    AiAircraft, FlightContext, FlightPhase, Mission, ParkedState, RESPONSE_DELAY_S,
    TAXI_SPEED_KT, TAXI_TURN_RADIUS_M,
};

/// Distance beyond the runway edge that counts as clear of it (metres).
const RUNWAY_CLEARANCE_M: f64 = 10.0;

/// Heading error accepted when lined up (degrees).
const LINE_UP_TOLERANCE_DEG: f64 = 1.0;

/// Synthetic line-up point past the threshold in degraded mode (metres).
const LINE_UP_DISTANCE_M: f64 = 10.0;

/// Which way the aircraft is taxiing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TaxiLeg {
    /// Gate to hold short.
    Outbound,
    /// Hold short onto the runway centreline.
    LiningUp,
    /// Runway exit to gate.
    Inbound,
}

/// A point to taxi to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TaxiWaypoint {
    pub position: GeoPoint,
    /// Network node, `None` for synthetic waypoints.
    pub node: Option<NodeId>,
    /// Parking heading when the waypoint is a gate.
    pub gate_heading_deg: Option<f64>,
}

impl TaxiWaypoint {
    /// A waypoint not tied to the taxi network.
    pub fn synthetic(position: GeoPoint) -> Self {
        Self {
            position,
            node: None,
            gate_heading_deg: None,
        }
    }

    /// The waypoint for a network node.
    pub fn from_node(network: &GroundNetwork, id: NodeId) -> Self {
        let node = network.node(id);
        Self {
            position: node.position,
            node: Some(id),
            gate_heading_deg: node.gate.as_ref().map(|g| g.heading_deg),
        }
    }
}

/// Waypoints along a network path.
pub fn route_from_path(path: &Path, network: &GroundNetwork) -> Vec<TaxiWaypoint> {
    path.nodes()
        .map(|id| TaxiWaypoint::from_node(network, id))
        .collect()
}

/// Synthetic hold short beside the threshold, used without a network.
pub(super) fn hold_short_point(runway: &ActiveRunway) -> LocalPoint {
    LocalPoint::new(-(runway.width_m() / 2.0 + RUNWAY_CLEARANCE_M), 0.0, 0.0)
}

/// Progress along a taxi route.
#[derive(Debug, Clone, PartialEq)]
pub struct TaxiState {
    pub leg: TaxiLeg,
    route: Vec<TaxiWaypoint>,
    next: usize,
    holding_short: bool,
    lining_up: bool,
    ready_reported: bool,
    vacated_reported: bool,
}

impl TaxiState {
    pub fn new(leg: TaxiLeg, route: Vec<TaxiWaypoint>) -> Self {
        Self {
            leg,
            route,
            next: 0,
            holding_short: false,
            lining_up: false,
            ready_reported: false,
            vacated_reported: false,
        }
    }

    /// Already waiting at the hold short, ground call made.
    pub fn holding_short(hold_short: TaxiWaypoint) -> Self {
        Self {
            holding_short: true,
            ready_reported: true,
            next: 0,
            ..Self::new(TaxiLeg::Outbound, vec![hold_short])
        }
    }

    pub fn route(&self) -> &[TaxiWaypoint] {
        &self.route
    }

    /// Waypoint being taxied to.
    pub fn target(&self) -> Option<&TaxiWaypoint> {
        self.route.get(self.next)
    }

    pub fn is_holding_short(&self) -> bool {
        self.holding_short
    }

    /// Network node at the end of the route.
    pub fn last_node(&self) -> Option<NodeId> {
        self.route.last().and_then(|w| w.node)
    }

    /// Get a human-readable description.
    pub fn description(&self) -> &'static str {
        match self.leg {
            TaxiLeg::Outbound if self.holding_short => "holding short",
            TaxiLeg::Outbound => "taxiing to the runway",
            TaxiLeg::LiningUp => "lining up",
            TaxiLeg::Inbound => "taxiing to parking",
        }
    }
}

impl AiAircraft {
    pub(super) fn update_taxi(
        &mut self,
        mut state: TaxiState,
        dt: f64,
        ctx: &FlightContext<'_>,
        out: &mut Vec<PilotMessage>,
    ) -> FlightPhase {
        let runway = ctx.runway();

        if state.leg == TaxiLeg::Outbound
            && state.holding_short
            && self.takeoff_cleared
            && self.response_counter_s >= RESPONSE_DELAY_S
        {
            self.takeoff_cleared = false;
            let route = self.line_up_route(state.last_node(), ctx);
            self.say(
                out,
                PilotCall::Readback,
                format!("Cleared for take-off {}", self.callsign),
            );
            state = TaxiState::new(TaxiLeg::LiningUp, route);
        }

        if state.leg == TaxiLeg::Inbound && !state.vacated_reported {
            let local = runway.to_local(&self.pose.position);
            if local.x.abs() > runway.width_m() / 2.0 + RUNWAY_CLEARANCE_M {
                state.vacated_reported = true;
                self.say(
                    out,
                    PilotCall::RunwayVacated,
                    format!("Clear of the runway {}", self.callsign),
                );
            }
        }

        if state.holding_short {
            self.pose.ground_speed_kt = 0.0;
            self.snap_to_ground();
            return FlightPhase::Taxiing(state);
        }
        self.taxi_step(state, dt, ctx, out)
    }

    fn taxi_step(
        &mut self,
        mut state: TaxiState,
        dt: f64,
        ctx: &FlightContext<'_>,
        out: &mut Vec<PilotMessage>,
    ) -> FlightPhase {
        loop {
            let Some(target) = state.route.get(state.next).copied() else {
                return self.finish_route(state, dt, ctx, out);
            };
            let distance = ctx.geodesy.distance_m(&self.pose.position, &target.position);
            let bearing = ctx.geodesy.bearing_deg(&self.pose.position, &target.position);
            let reached = distance <= TAXI_TURN_RADIUS_M
                || (distance <= 2.0 * TAXI_TURN_RADIUS_M
                    && heading_difference(self.pose.heading_deg, bearing).abs() > 90.0);

            if let (true, Some(heading)) = (reached, target.gate_heading_deg) {
                return self.park_at(target.position, heading, target.node, out);
            }
            if !reached && !state.lining_up {
                self.pose.heading_deg = taxi_turn_toward(
                    self.pose.heading_deg,
                    bearing,
                    TAXI_SPEED_KT,
                    TAXI_TURN_RADIUS_M,
                    dt,
                );
                self.roll(TAXI_SPEED_KT, dt, ctx);
                return FlightPhase::Taxiing(state);
            }
            if state.next + 1 >= state.route.len() {
                return self.finish_route(state, dt, ctx, out);
            }
            state.next += 1;
        }
    }

    /// Last waypoint reached, or the route was empty.
    fn finish_route(
        &mut self,
        mut state: TaxiState,
        dt: f64,
        ctx: &FlightContext<'_>,
        out: &mut Vec<PilotMessage>,
    ) -> FlightPhase {
        let runway = ctx.runway();
        match state.leg {
            TaxiLeg::LiningUp => {
                state.lining_up = true;
                self.pose.heading_deg = taxi_turn_toward(
                    self.pose.heading_deg,
                    runway.heading_deg(),
                    TAXI_SPEED_KT,
                    TAXI_TURN_RADIUS_M,
                    dt,
                );
                self.roll(TAXI_SPEED_KT, dt, ctx);
                if heading_difference(self.pose.heading_deg, runway.heading_deg()).abs()
                    <= LINE_UP_TOLERANCE_DEG
                {
                    self.pose.heading_deg = runway.heading_deg();
                    self.pose.track_deg = runway.heading_deg();
                    self.target_track_deg = None;
                    self.in_air = false;
                    return FlightPhase::InPattern {
                        leg: PatternLeg::TakeoffRoll,
                    };
                }
                FlightPhase::Taxiing(state)
            }
            TaxiLeg::Outbound => {
                state.holding_short = true;
                self.pose.ground_speed_kt = 0.0;
                if !state.ready_reported {
                    state.ready_reported = true;
                    let text = format!(
                        "{} ready at hold short runway {}",
                        self.callsign,
                        self.runway_words(runway)
                    );
                    self.say(out, PilotCall::ReadyAtHoldShort, text);
                }
                FlightPhase::Taxiing(state)
            }
            TaxiLeg::Inbound => {
                let (position, heading) = (self.pose.position, self.pose.heading_deg);
                self.park_at(position, heading, None, out)
            }
        }
    }

    /// Stop at a parking position and leave the ground frequency.
    fn park_at(
        &mut self,
        position: GeoPoint,
        heading_deg: f64,
        gate: Option<NodeId>,
        out: &mut Vec<PilotMessage>,
    ) -> FlightPhase {
        self.pose.position = position;
        self.pose.heading_deg = heading_deg;
        self.pose.track_deg = heading_deg;
        self.pose.ground_speed_kt = 0.0;
        self.pose.ias_kt = 0.0;
        self.snap_to_ground();
        if gate.is_some() {
            self.gate = gate;
        }
        if self.tuned == Some(Station::Ground) {
            self.say(
                out,
                PilotCall::LeavingFrequency(Station::Ground),
                format!("{} parked, good day", self.callsign),
            );
            self.tuned = None;
        }
        FlightPhase::Parked(ParkedState::Idle)
    }

    /// Move along the current heading on the ground.
    fn roll(&mut self, speed_kt: f64, dt: f64, ctx: &FlightContext<'_>) {
        self.pose.track_deg = self.pose.heading_deg;
        self.pose.ground_speed_kt = speed_kt;
        self.pose.ias_kt = speed_kt;
        self.pose.slope_deg = 0.0;
        advance(&mut self.pose, ctx.geodesy, dt);
        self.snap_to_ground();
    }

    /// Route from the gate to the hold short, without the gate itself.
    pub(super) fn outbound_route(&self, ctx: &FlightContext<'_>) -> Vec<TaxiWaypoint> {
        let runway = ctx.runway();
        let route = match (self.gate, ctx.controller.network()) {
            (Some(gate), Some(network)) => {
                let path = ctx.controller.get_path_to_hold_short(gate, runway.ident());
                route_from_path(&path, network).into_iter().skip(1).collect()
            }
            _ => Vec::new(),
        };
        if route.is_empty() {
            let hold = runway.from_local(&hold_short_point(runway));
            vec![TaxiWaypoint::synthetic(
                hold.with_elevation(runway.elevation_m()),
            )]
        } else {
            route
        }
    }

    /// Route from the hold short onto the runway.
    fn line_up_route(&self, hold_short: Option<NodeId>, ctx: &FlightContext<'_>) -> Vec<TaxiWaypoint> {
        let runway = ctx.runway();
        let route = match (hold_short, ctx.controller.network()) {
            (Some(node), Some(network)) => {
                let path = ctx.controller.get_path(node, runway.ident());
                route_from_path(&path, network).into_iter().skip(1).collect()
            }
            _ => Vec::new(),
        };
        if route.is_empty() {
            let point = runway.from_local(&LocalPoint::new(0.0, LINE_UP_DISTANCE_M, 0.0));
            vec![TaxiWaypoint::synthetic(
                point.with_elevation(runway.elevation_m()),
            )]
        } else {
            route
        }
    }

    /// Leave the runway after a full-stop landing.
    ///
    /// Picks the nearest exit ahead, reserves a gate and taxis to it. With
    /// no exit or no free gate the aircraft parks out of sight.
    pub(super) fn exit_runway(
        &mut self,
        ctx: &FlightContext<'_>,
        out: &mut Vec<PilotMessage>,
    ) -> FlightPhase {
        if let Mission::LocalCircuits { circuits, .. } = &mut self.mission {
            *circuits = 0;
        }
        let runway = ctx.runway();
        let exits = ctx.controller.get_exits(runway.ident());
        let (Some(network), Some(&first)) = (ctx.controller.network(), exits.first()) else {
            return self.park_out_of_sight(out);
        };

        let here = runway.to_local(&self.pose.position);
        let exit = exits
            .iter()
            .copied()
            .filter_map(|id| {
                let ahead = runway.to_local(&network.node(id).position).y - here.y;
                (ahead > 0.0).then_some((id, ahead))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
            .unwrap_or(first);

        let gate = match ctx.controller.reserve_gate() {
            Ok(gate) => gate,
            Err(e) => {
                warn!(callsign = %self.callsign, error = %e, "No parking, leaving the runway out of sight");
                return self.park_out_of_sight(out);
            }
        };
        self.gate = Some(gate);

        let path = ctx.controller.get_path_between(exit, gate);
        let mut route = route_from_path(&path, network);
        if route.is_empty() {
            route = vec![
                TaxiWaypoint::from_node(network, exit),
                TaxiWaypoint::from_node(network, gate),
            ];
        }
        debug!(callsign = %self.callsign, waypoints = route.len(), "Taxiing to parking");
        FlightPhase::Taxiing(TaxiState::new(TaxiLeg::Inbound, route))
    }

    fn park_out_of_sight(&mut self, out: &mut Vec<PilotMessage>) -> FlightPhase {
        self.visible = false;
        self.pose.ground_speed_kt = 0.0;
        self.pose.ias_kt = 0.0;
        self.say(
            out,
            PilotCall::RunwayVacated,
            format!("Clear of the runway {}", self.callsign),
        );
        FlightPhase::Parked(ParkedState::Idle)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::geo::{Geodesy, SphericalEarth};

    fn taxiing(world: &World, leg: TaxiLeg, route: Vec<TaxiWaypoint>, start: LocalPoint, heading: f64) -> AiAircraft {
        let mut a = AiAircraft::at_hold_short(
            "N1",
            "KXYZ",
            Mission::LocalCircuits {
                circuits: 1,
                touch_and_go: false,
            },
            world.runway(),
        );
        a.pending = None;
        a.pose.position = world
            .runway()
            .from_local(&start)
            .with_elevation(FIELD_ELEVATION_M + super::super::WHEEL_OFFSET_M);
        a.pose.heading_deg = heading;
        a.phase = FlightPhase::Taxiing(TaxiState::new(leg, route));
        a
    }

    #[test]
    fn test_parks_when_gate_within_turn_radius() {
        let world = World::new();
        let gate_at = world.runway().from_local(&LocalPoint::new(-100.0, 200.0, 0.0));
        let gate = TaxiWaypoint {
            position: gate_at.with_elevation(FIELD_ELEVATION_M),
            node: None,
            gate_heading_deg: Some(123.0),
        };
        let mut a = taxiing(&world, TaxiLeg::Inbound, vec![gate], LocalPoint::new(-100.0, 205.0, 0.0), 0.0);

        a.update(1.0, &world.context());
        assert!(a.is_parked());
        assert_eq!(a.pose().heading_deg, 123.0);
        let d = SphericalEarth.distance_m(&a.position(), &gate_at);
        assert!(d < 0.01);
    }

    #[test]
    fn test_taxis_to_degraded_hold_short_and_reports_ready() {
        let world = World::new();
        let hold = world.runway().from_local(&hold_short_point(world.runway()));
        let route = vec![TaxiWaypoint::synthetic(hold)];
        let mut a = taxiing(&world, TaxiLeg::Outbound, route, LocalPoint::new(-120.0, 0.0, 0.0), world.runway().heading_deg() + 90.0);

        let (holding, said) = run_until(&mut a, &world, 120, |a| {
            matches!(a.phase(), FlightPhase::Taxiing(s) if s.is_holding_short())
        });
        assert!(holding);
        assert!(said.iter().any(|m| m.call == PilotCall::ReadyAtHoldShort));
        assert!(SphericalEarth.distance_m(&a.position(), &hold) < 2.0 * TAXI_TURN_RADIUS_M);

        // Stays put while holding
        let before = a.position();
        a.update(1.0, &world.context());
        assert!(SphericalEarth.distance_m(&before, &a.position()) < 1e-6);
    }

    #[test]
    fn test_takeoff_clearance_lines_up_and_rolls() {
        let world = World::new();
        let mut a = AiAircraft::at_hold_short("N1", "KXYZ", Mission::Departure, world.runway());
        a.pending = None;
        a.handle_transmission(&crate::atc::Transmission::instruct(
            crate::atc::Station::Tower,
            "N1",
            "N1 cleared for take-off",
            crate::atc::ClearanceEvent::Takeoff { immediate: false },
        ));

        let (rolling, said) = run_until(&mut a, &world, 200, |a| a.leg() == PatternLeg::TakeoffRoll);
        assert!(rolling);
        assert!(said.iter().any(|m| m.text.starts_with("Cleared for take-off")));
        let diff = heading_difference(a.pose().heading_deg, world.runway().heading_deg());
        assert!(diff.abs() <= LINE_UP_TOLERANCE_DEG);
    }

    #[test]
    fn test_degraded_exit_parks_out_of_sight() {
        let world = World::new();
        let mut a = taxiing(&world, TaxiLeg::Inbound, Vec::new(), LocalPoint::new(0.0, 500.0, 0.0), 250.0);
        let mut out = Vec::new();
        let phase = a.exit_runway(&world.context(), &mut out);
        assert_eq!(phase, FlightPhase::Parked(ParkedState::Idle));
        assert!(!a.is_visible());
        assert_eq!(out[0].call, PilotCall::RunwayVacated);
        assert!(!a.mission().wants_departure());
    }

    #[test]
    fn test_route_from_network_path() {
        let network = GroundNetwork::parse(
            "N 1 -122.0000 37.0000 10 J - \"a\"\nN 2 -122.0010 37.0000 10 J - \"b\"\nA 1 2 T N \"A\"\n[End]\n",
            &SphericalEarth,
        )
        .expect("network");
        let a = network.node_by_file_id(1).expect("a");
        let b = network.node_by_file_id(2).expect("b");
        let route = route_from_path(&network.shortest_path(a, b), &network);
        assert_eq!(route.len(), 2);
        assert_eq!(route[0].node, Some(a));
        assert_eq!(route[1].node, Some(b));
        assert!(route.iter().all(|w| w.gate_heading_deg.is_none()));
    }
}
