//! Autonomous light aircraft flying the local traffic pattern.
//!
//! # Design
//!
//! Each [`AiAircraft`] is a state machine stepped once per tick. The phase
//! is taken out of the aircraft, handled, and the handler returns the next
//! phase:
//!
//! ```text
//! Parked ──TaxiCleared──► Taxiing(Outbound) ──hold short──► Taxiing(LiningUp)
//!   ▲                                                              │
//!   │                                                              ▼
//! Taxiing(Inbound) ◄── runway exit ◄── InPattern(TakeoffRoll ... LandingRoll)
//!                                                   ▲
//! Arriving(Enroute ► Contacted ► StraightIn | DownwindEntry) ───────┘
//! ```
//!
//! Controllers reach an aircraft only through [`Transmission`]s handed to
//! [`AiAircraft::handle_transmission`]. The aircraft answers with
//! [`PilotMessage`]s returned from [`AiAircraft::update`], after a short
//! pilot response delay.

mod arrival;
mod callsign;
mod descent;
mod kinematics;
mod pattern;
mod taxi;
mod types;

pub use arrival::{compass_point, ArrivalStage, TOWER_CONTACT_RANGE_M};
pub use callsign::{short_form, AircraftType, Callsign, CallsignGenerator};
pub use descent::{
    descent_distance_m, start_of_descent, StartOfDescent, GLIDE_ANGLE_DEG, PATTERN_ALTITUDE_FT,
};
pub use kinematics::{
    advance, taxi_turn_step, taxi_turn_toward, turn_toward, wind_correction, Pose, WindCorrection,
    STANDARD_TURN_RATE_DEG_S,
};
pub use taxi::{TaxiLeg, TaxiState, TaxiWaypoint};
pub use types::{LandingKind, OperationKind, PatternLeg};

use serde::Serialize;
use tracing::debug;

use crate::atc::{
    spoken_digits, AircraftSnapshot, AirportController, ClearanceEvent, PilotCall, PilotMessage,
    Station, Transmission,
};
use crate::environment::{ElevationSource, Wind, WindSource};
use crate::geo::{normalize_heading, GeoPoint, Geodesy, LocalPoint, FT_TO_M};
use crate::ground::NodeId;
use crate::runway::ActiveRunway;

use arrival::ArrivalEntry;

/// Taxi speed (knots).
pub const TAXI_SPEED_KT: f64 = 7.5;

/// Taxi turn radius; also the distance at which a waypoint counts as reached.
pub const TAXI_TURN_RADIUS_M: f64 = 8.0;

/// Height of the reference point above the wheels (metres).
pub const WHEEL_OFFSET_M: f64 = 1.45;

/// Seconds a pilot waits before acting on a frequency change.
pub const RESPONSE_DELAY_S: f64 = 8.0;

/// What the aircraft is at the airport to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Mission {
    /// Fly circuits. `circuits` counts those left, the current one included.
    LocalCircuits { circuits: u32, touch_and_go: bool },
    /// Take off and leave the airspace.
    Departure,
    /// Arrive, land and park.
    Arrival,
}

impl Mission {
    /// Operation reported to the tower.
    pub fn operation(&self) -> OperationKind {
        match self {
            Mission::LocalCircuits { .. } => OperationKind::Circuit,
            Mission::Departure => OperationKind::Outbound,
            Mission::Arrival => OperationKind::Inbound,
        }
    }

    /// How the current circuit ends.
    pub fn landing(&self) -> LandingKind {
        match self {
            Mission::LocalCircuits {
                circuits,
                touch_and_go,
            } if *circuits > 1 => {
                if *touch_and_go {
                    LandingKind::TouchAndGo
                } else {
                    LandingKind::StopAndGo
                }
            }
            Mission::LocalCircuits { .. } | Mission::Arrival => LandingKind::FullStop,
            Mission::Departure => LandingKind::Unknown,
        }
    }

    /// Whether a parked aircraft with this mission wants to leave.
    pub fn wants_departure(&self) -> bool {
        match self {
            Mission::LocalCircuits { circuits, .. } => *circuits > 0,
            Mission::Departure => true,
            Mission::Arrival => false,
        }
    }
}

impl std::fmt::Display for Mission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mission::LocalCircuits { circuits, .. } => write!(f, "{} circuit(s)", circuits),
            Mission::Departure => write!(f, "departure"),
            Mission::Arrival => write!(f, "arrival"),
        }
    }
}

/// Progress of a parked aircraft towards taxiing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParkedState {
    #[default]
    Idle,
    TaxiRequested,
    TaxiCleared,
}

/// Top-level state of an aircraft.
#[derive(Debug, Clone, PartialEq)]
pub enum FlightPhase {
    Parked(ParkedState),
    Taxiing(TaxiState),
    Arriving(ArrivalStage),
    InPattern { leg: PatternLeg },
}

impl Default for FlightPhase {
    fn default() -> Self {
        FlightPhase::Parked(ParkedState::Idle)
    }
}

impl FlightPhase {
    /// Get a human-readable description.
    pub fn description(&self) -> String {
        match self {
            FlightPhase::Parked(_) => "parked".to_string(),
            FlightPhase::Taxiing(state) => state.description().to_string(),
            FlightPhase::Arriving(stage) => stage.description().to_string(),
            FlightPhase::InPattern { leg } => leg.description().to_string(),
        }
    }
}

/// A frequency change or readback waiting on the pilot response delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrequencyAction {
    ContactTower,
    ContactGround,
    TaxiToParking,
    RemoveSelf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct GoAround {
    announced: bool,
}

/// What an aircraft reads from the world during one update.
pub struct FlightContext<'a> {
    pub controller: &'a AirportController,
    pub geodesy: &'a dyn Geodesy,
    pub elevation: &'a dyn ElevationSource,
    pub wind: &'a dyn WindSource,
}

impl FlightContext<'_> {
    pub fn runway(&self) -> &ActiveRunway {
        self.controller.runway()
    }
}

/// One AI aircraft.
#[derive(Debug, Clone)]
pub struct AiAircraft {
    callsign: String,
    aircraft_type: AircraftType,
    airport: String,
    mission: Mission,
    pose: Pose,
    phase: FlightPhase,
    in_air: bool,
    visible: bool,
    tuned: Option<Station>,
    gate: Option<NodeId>,

    pending: Option<FrequencyAction>,
    response_counter_s: f64,
    takeoff_cleared: bool,
    cleared_to_land: bool,
    arrival_clearance: Option<ArrivalEntry>,
    go_around: Option<GoAround>,
    target_track_deg: Option<f64>,
    descending: bool,
    saved_slope_deg: f64,
    leg_reported: bool,
    ground_elevation_m: f64,
}

impl AiAircraft {
    fn new(
        callsign: impl Into<String>,
        airport: impl Into<String>,
        mission: Mission,
        pose: Pose,
        phase: FlightPhase,
    ) -> Self {
        Self {
            callsign: callsign.into(),
            aircraft_type: AircraftType::default(),
            airport: airport.into(),
            mission,
            ground_elevation_m: pose.position.elev_m,
            pose,
            phase,
            in_air: false,
            visible: true,
            tuned: None,
            gate: None,
            pending: None,
            response_counter_s: 0.0,
            takeoff_cleared: false,
            cleared_to_land: false,
            arrival_clearance: None,
            go_around: None,
            target_track_deg: None,
            descending: false,
            saved_slope_deg: 0.0,
            leg_reported: false,
        }
    }

    /// Parked at a reserved gate.
    pub fn at_gate(
        callsign: impl Into<String>,
        airport: impl Into<String>,
        mission: Mission,
        gate: NodeId,
        position: GeoPoint,
        heading_deg: f64,
    ) -> Self {
        let pose = Pose {
            position: position.with_elevation(position.elev_m + WHEEL_OFFSET_M),
            heading_deg,
            track_deg: heading_deg,
            ..Pose::default()
        };
        let mut aircraft = Self::new(callsign, airport, mission, pose, FlightPhase::default());
        aircraft.ground_elevation_m = position.elev_m;
        aircraft.gate = Some(gate);
        aircraft
    }

    /// Waiting at the hold short, about to call the tower.
    pub fn at_hold_short(
        callsign: impl Into<String>,
        airport: impl Into<String>,
        mission: Mission,
        runway: &ActiveRunway,
    ) -> Self {
        let local = taxi::hold_short_point(runway);
        let field = runway.elevation_m();
        let pose = Pose {
            position: runway.from_local(&local).with_elevation(field + WHEEL_OFFSET_M),
            heading_deg: runway.heading_deg(),
            track_deg: runway.heading_deg(),
            ..Pose::default()
        };
        let waypoint = TaxiWaypoint::synthetic(runway.from_local(&local).with_elevation(field));
        let phase = FlightPhase::Taxiing(TaxiState::holding_short(waypoint));
        let mut aircraft = Self::new(callsign, airport, mission, pose, phase);
        aircraft.ground_elevation_m = field;
        aircraft.tuned = Some(Station::Ground);
        aircraft.pending = Some(FrequencyAction::ContactTower);
        aircraft
    }

    /// Level on the downwind leg at pattern altitude.
    pub fn on_downwind(
        callsign: impl Into<String>,
        airport: impl Into<String>,
        mission: Mission,
        runway: &ActiveRunway,
    ) -> Self {
        let pd = runway.pattern_direction().sign();
        let field = runway.elevation_m();
        let local = LocalPoint::new(1000.0 * pd, 800.0, 0.0);
        let downwind = normalize_heading(runway.heading_deg() + 180.0);
        let pose = Pose {
            position: runway
                .from_local(&local)
                .with_elevation(field + PATTERN_ALTITUDE_FT * FT_TO_M),
            heading_deg: downwind,
            track_deg: downwind,
            ias_kt: 90.0,
            ground_speed_kt: 90.0,
            ..Pose::default()
        };
        let phase = FlightPhase::InPattern {
            leg: PatternLeg::Downwind,
        };
        let mut aircraft = Self::new(callsign, airport, mission, pose, phase);
        aircraft.ground_elevation_m = field;
        aircraft.in_air = true;
        aircraft.tuned = Some(Station::Tower);
        aircraft.target_track_deg = Some(downwind);
        aircraft
    }

    /// At the threshold, starting the take-off roll.
    pub fn on_runway(
        callsign: impl Into<String>,
        airport: impl Into<String>,
        mission: Mission,
        runway: &ActiveRunway,
    ) -> Self {
        let field = runway.elevation_m();
        let pose = Pose {
            position: runway.threshold().with_elevation(field + WHEEL_OFFSET_M),
            heading_deg: runway.heading_deg(),
            track_deg: runway.heading_deg(),
            ..Pose::default()
        };
        let phase = FlightPhase::InPattern {
            leg: PatternLeg::TakeoffRoll,
        };
        let mut aircraft = Self::new(callsign, airport, mission, pose, phase);
        aircraft.ground_elevation_m = field;
        aircraft.tuned = Some(Station::Tower);
        aircraft
    }

    /// Inbound from outside the airspace; calls the tower when in range.
    pub fn enroute(
        callsign: impl Into<String>,
        airport: impl Into<String>,
        position: GeoPoint,
        heading_deg: f64,
    ) -> Self {
        let pose = Pose {
            position,
            heading_deg,
            track_deg: heading_deg,
            ias_kt: arrival::CRUISE_IAS_KT,
            ground_speed_kt: arrival::CRUISE_IAS_KT,
            ..Pose::default()
        };
        let phase = FlightPhase::Arriving(ArrivalStage::Enroute);
        let mut aircraft = Self::new(callsign, airport, Mission::Arrival, pose, phase);
        aircraft.in_air = true;
        aircraft
    }

    /// Set the aircraft type.
    pub fn with_aircraft_type(mut self, aircraft_type: AircraftType) -> Self {
        self.aircraft_type = aircraft_type;
        self
    }

    // ─────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────

    pub fn callsign(&self) -> &str {
        &self.callsign
    }

    pub fn aircraft_type(&self) -> AircraftType {
        self.aircraft_type
    }

    pub fn airport(&self) -> &str {
        &self.airport
    }

    pub fn mission(&self) -> Mission {
        self.mission
    }

    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    pub fn position(&self) -> GeoPoint {
        self.pose.position
    }

    pub fn phase(&self) -> &FlightPhase {
        &self.phase
    }

    /// Pattern leg, `Unknown` outside the pattern.
    pub fn leg(&self) -> PatternLeg {
        match self.phase {
            FlightPhase::InPattern { leg } => leg,
            _ => PatternLeg::Unknown,
        }
    }

    pub fn is_parked(&self) -> bool {
        matches!(self.phase, FlightPhase::Parked(_))
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_airborne(&self) -> bool {
        self.in_air
    }

    /// Gate held by the aircraft, if any.
    pub fn gate(&self) -> Option<NodeId> {
        self.gate
    }

    /// Frequency the pilot is listening on.
    pub fn tuned(&self) -> Option<Station> {
        self.tuned
    }

    pub fn cleared_to_land(&self) -> bool {
        self.cleared_to_land
    }

    /// What controllers see of this aircraft.
    pub fn snapshot(&self) -> AircraftSnapshot {
        AircraftSnapshot {
            callsign: self.callsign.clone(),
            airport: self.airport.clone(),
            position: self.pose.position,
            heading_deg: self.pose.heading_deg,
            ias_kt: self.pose.ias_kt,
            leg: self.leg(),
            phase: self.phase.description(),
            visible: self.visible,
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Radio
    // ─────────────────────────────────────────────────────────────────────

    /// Act on a controller transmission. Others' transmissions are ignored.
    pub fn handle_transmission(&mut self, transmission: &Transmission) {
        if transmission.callsign != self.callsign {
            return;
        }
        let Some(event) = transmission.event else {
            return;
        };
        self.response_counter_s = 0.0;
        debug!(callsign = %self.callsign, event = event.description(), "Instruction received");

        match event {
            ClearanceEvent::TaxiCleared => {
                if let FlightPhase::Parked(state) = &mut self.phase {
                    if *state == ParkedState::TaxiRequested {
                        *state = ParkedState::TaxiCleared;
                    }
                }
            }
            ClearanceEvent::ContactTower => self.pending = Some(FrequencyAction::ContactTower),
            ClearanceEvent::ContactGround => self.pending = Some(FrequencyAction::ContactGround),
            ClearanceEvent::TaxiToParking => self.pending = Some(FrequencyAction::TaxiToParking),
            ClearanceEvent::ClearOfAirspace => self.pending = Some(FrequencyAction::RemoveSelf),
            ClearanceEvent::Takeoff { .. } => self.takeoff_cleared = true,
            ClearanceEvent::ClearedToLand => self.cleared_to_land = true,
            ClearanceEvent::GoAround => {
                self.go_around = Some(GoAround::default());
                self.cleared_to_land = false;
            }
            ClearanceEvent::StraightIn => self.arrival_clearance = Some(ArrivalEntry::StraightIn),
            ClearanceEvent::DownwindEntry => self.arrival_clearance = Some(ArrivalEntry::Downwind),
            ClearanceEvent::LineUp | ClearanceEvent::HoldPosition => {}
        }
    }

    fn say(&self, out: &mut Vec<PilotMessage>, call: PilotCall, text: impl Into<String>) {
        let text = text.into();
        debug!(callsign = %self.callsign, text = %text, "Pilot transmission");
        out.push(PilotMessage::new(&self.callsign, call, text));
    }

    fn runway_words(&self, runway: &ActiveRunway) -> String {
        spoken_digits(runway.ident())
    }

    /// Carry out a frequency change once the response delay has passed.
    fn process_pending(&mut self, ctx: &FlightContext<'_>, out: &mut Vec<PilotMessage>) {
        let Some(action) = self.pending else {
            return;
        };
        if self.response_counter_s < RESPONSE_DELAY_S {
            return;
        }
        self.pending = None;
        self.response_counter_s = 0.0;
        let config = ctx.controller.tower().config();

        match action {
            FrequencyAction::ContactTower => {
                self.say(
                    out,
                    PilotCall::Readback,
                    format!("Tower {:.2} {}", config.tower_frequency_mhz, self.callsign),
                );
                self.tuned = Some(Station::Tower);
                let intent = match self.mission {
                    Mission::LocalCircuits { circuits, .. } if circuits > 1 => format!(
                        "traffic pattern {} circuits {}",
                        spoken_digits(&circuits.to_string()),
                        self.mission.landing()
                    ),
                    Mission::LocalCircuits { .. } => "traffic pattern one circuit full stop".to_string(),
                    Mission::Departure | Mission::Arrival => "departure".to_string(),
                };
                let text = format!(
                    "{} at hold short for runway {} {}",
                    self.callsign,
                    self.runway_words(ctx.runway()),
                    intent
                );
                self.say(
                    out,
                    PilotCall::AtHoldShort {
                        operation: self.mission.operation(),
                        landing: self.mission.landing(),
                    },
                    text,
                );
            }
            FrequencyAction::ContactGround => {
                self.say(
                    out,
                    PilotCall::Readback,
                    format!("Ground {:.2} Good Day", config.ground_frequency_mhz),
                );
                self.say(out, PilotCall::LeavingFrequency(Station::Tower), "");
                self.tuned = Some(Station::Ground);
            }
            FrequencyAction::TaxiToParking => {
                self.say(out, PilotCall::Readback, "GA Parking, Thank you and Good Day");
                self.say(out, PilotCall::LeavingFrequency(Station::Tower), "");
                self.tuned = None;
                self.pending = Some(FrequencyAction::RemoveSelf);
            }
            FrequencyAction::RemoveSelf => {
                self.say(out, PilotCall::RemoveSelf, "");
                self.tuned = None;
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Update
    // ─────────────────────────────────────────────────────────────────────

    /// Advance the aircraft by `dt` seconds.
    ///
    /// Returns the pilot transmissions made during the tick.
    pub fn update(&mut self, dt: f64, ctx: &FlightContext<'_>) -> Vec<PilotMessage> {
        let mut out = Vec::new();
        if dt <= 0.0 {
            return out;
        }
        self.response_counter_s += dt;
        if let Some(elevation) = ctx.elevation.elevation_m(&self.pose.position) {
            self.ground_elevation_m = elevation;
        }
        self.process_pending(ctx, &mut out);

        let phase = std::mem::take(&mut self.phase);
        self.phase = match phase {
            FlightPhase::Parked(state) => self.update_parked(state, ctx, &mut out),
            FlightPhase::Taxiing(state) => self.update_taxi(state, dt, ctx, &mut out),
            FlightPhase::Arriving(stage) => self.update_arrival(stage, dt, ctx, &mut out),
            FlightPhase::InPattern { leg } => self.fly_pattern(leg, dt, ctx, &mut out),
        };
        out
    }

    fn update_parked(
        &mut self,
        state: ParkedState,
        ctx: &FlightContext<'_>,
        out: &mut Vec<PilotMessage>,
    ) -> FlightPhase {
        self.pose.ground_speed_kt = 0.0;
        self.pose.ias_kt = 0.0;
        self.in_air = false;
        self.snap_to_ground();
        if !self.visible || !self.mission.wants_departure() {
            return FlightPhase::Parked(state);
        }

        match state {
            ParkedState::Idle => {
                let intent = match self.mission {
                    Mission::Departure => "departure",
                    _ => "traffic pattern",
                };
                let text = format!(
                    "{} Ground {} on apron parking request taxi for {}",
                    self.airport, self.callsign, intent
                );
                self.tuned = Some(Station::Ground);
                self.say(out, PilotCall::RequestTaxi, text);
                FlightPhase::Parked(ParkedState::TaxiRequested)
            }
            ParkedState::TaxiRequested => FlightPhase::Parked(state),
            ParkedState::TaxiCleared => {
                let runway = ctx.runway();
                let route = self.outbound_route(ctx);
                self.say(
                    out,
                    PilotCall::Readback,
                    format!(
                        "Taxi to runway {} hold short {}",
                        self.runway_words(runway),
                        self.callsign
                    ),
                );
                if let Some(gate) = self.gate.take() {
                    ctx.controller.release_gate(gate);
                }
                FlightPhase::Taxiing(TaxiState::new(TaxiLeg::Outbound, route))
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Motion helpers
    // ─────────────────────────────────────────────────────────────────────

    /// Steer towards a track at the standard rate.
    fn set_track(&mut self, track_deg: f64) {
        self.target_track_deg = Some(normalize_heading(track_deg));
    }

    /// Put the wheels on the ground.
    fn snap_to_ground(&mut self) {
        self.pose.position = self
            .pose
            .position
            .with_elevation(self.ground_elevation_m + WHEEL_OFFSET_M);
        self.pose.slope_deg = 0.0;
        self.pose.pitch_deg = 0.0;
        self.pose.vertical_speed_fpm = 0.0;
    }

    /// Stop climbing or descending at `ias_kt`.
    fn level_off(&mut self, ias_kt: f64) {
        self.pose.slope_deg = 0.0;
        self.pose.pitch_deg = 0.0;
        self.pose.ias_kt = ias_kt;
    }

    /// Height above the field in feet.
    fn height_above_field_ft(&self, runway: &ActiveRunway) -> f64 {
        (self.pose.position.elev_m - runway.elevation_m()) / FT_TO_M
    }

    /// Turn towards the target track, solve the wind triangle and move.
    fn move_along(&mut self, dt: f64, wind: &Wind, ctx: &FlightContext<'_>) {
        if let Some(target) = self.target_track_deg {
            self.pose.track_deg =
                turn_toward(self.pose.track_deg, target, STANDARD_TURN_RATE_DEG_S, dt);
        }
        if self.in_air {
            let correction = wind_correction(self.pose.track_deg, self.pose.ias_kt, wind);
            self.pose.ground_speed_kt = correction.ground_speed_kt;
            self.pose.heading_deg = normalize_heading(self.pose.track_deg + correction.crab_deg);
        } else {
            self.pose.heading_deg = self.pose.track_deg;
        }
        advance(&mut self.pose, ctx.geodesy, dt);
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::atc::AtcConfig;
    use crate::environment::{FlatTerrain, RunwayRecord, SteadyWind};
    use crate::geo::SphericalEarth;

    pub const FIELD_ELEVATION_M: f64 = 10.0;

    pub struct World {
        pub controller: AirportController,
        pub terrain: FlatTerrain,
        pub wind: SteadyWind,
    }

    impl World {
        pub fn new() -> Self {
            let record = RunwayRecord {
                ident: "25".to_string(),
                center: GeoPoint::new(37.0, -122.0, FIELD_ELEVATION_M),
                heading_deg: 250.0,
                length_m: 1200.0,
                width_m: 30.0,
            };
            let runway = ActiveRunway::from_record(&record, &SphericalEarth);
            Self {
                controller: AirportController::new("KXYZ", runway, None, AtcConfig::default()),
                terrain: FlatTerrain::new(FIELD_ELEVATION_M),
                wind: SteadyWind::new(0.0, 0.0),
            }
        }

        pub fn context(&self) -> FlightContext<'_> {
            FlightContext {
                controller: &self.controller,
                geodesy: &SphericalEarth,
                elevation: &self.terrain,
                wind: &self.wind,
            }
        }

        pub fn runway(&self) -> &ActiveRunway {
            self.controller.runway()
        }
    }

    /// Run updates until `done` holds or `max_ticks` pass; returns every message.
    pub fn run_until(
        aircraft: &mut AiAircraft,
        world: &World,
        max_ticks: usize,
        mut done: impl FnMut(&AiAircraft) -> bool,
    ) -> (bool, Vec<PilotMessage>) {
        let mut said = Vec::new();
        for _ in 0..max_ticks {
            said.extend(aircraft.update(1.0, &world.context()));
            if done(aircraft) {
                return (true, said);
            }
        }
        (false, said)
    }
}
