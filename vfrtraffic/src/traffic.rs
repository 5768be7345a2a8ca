//! Traffic manager: owns the airports and the aircraft flying at them.
//!
//! # Design
//!
//! The manager is the only owner of aircraft and controllers. Each tick
//! runs in a fixed order:
//!
//! ```text
//! 1. controllers   picture of their aircraft ──► Transmissions
//! 2. delivery      Transmission ──► addressed aircraft
//! 3. aircraft      update(dt) ──► PilotMessages
//! 4. routing       PilotMessage ──► airport controller (or removal list)
//! 5. removal       at most one scheduled aircraft leaves per tick
//! ```
//!
//! Everything said on frequency is returned as [`RadioMessage`]s and logged
//! at info level.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::path::Path;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::aircraft::{
    AiAircraft, AircraftType, Callsign, CallsignGenerator, FlightContext, Mission, PatternLeg,
};
use crate::atc::{
    AircraftSnapshot, AirportController, Controller, LookupFailure, PilotCall, PilotMessage,
    Station, TrafficPicture, Transmission,
};
use crate::config::TrafficConfig;
use crate::context::SimContext;
use crate::geo::FT_TO_M;
use crate::ground::GroundNetwork;
use crate::runway::ActiveRunway;

/// Glide angle used to place arriving traffic (degrees).
const ARRIVAL_SPAWN_ANGLE_DEG: f64 = 6.0;

/// Highest spawn height of arriving traffic above the field (feet).
const ARRIVAL_SPAWN_CEILING_FT: f64 = 3000.0;

/// Arrivals are generated out to this distance (metres).
const ARRIVAL_GENERATION_LIMIT_M: f64 = 15_000.0;

/// Stable id of a managed aircraft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct AircraftId(u32);

impl AircraftId {
    pub fn value(&self) -> u32 {
        self.0
    }
}

/// Errors from airport activation and spawning.
#[derive(Debug, Error)]
pub enum TrafficError {
    /// A controller lookup failed.
    #[error(transparent)]
    Lookup(#[from] LookupFailure),

    /// The airport has not been activated.
    #[error("Airport {0} is not active")]
    AirportNotActive(String),

    /// No unique callsign could be generated.
    #[error("Callsigns exhausted")]
    CallsignsExhausted,
}

/// Spacing of generated arrivals for one density level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrivalSpacing {
    /// Distance of the first arrival before spacing is added (metres).
    pub first_m: f64,
    /// Minimum spacing between arrivals (metres).
    pub min_m: f64,
    /// Maximum spacing between arrivals (metres).
    pub max_m: f64,
}

impl ArrivalSpacing {
    /// Spacing for a density level; levels outside 1..=3 are clamped.
    pub fn for_density(density: u8) -> Self {
        match density.clamp(1, 3) {
            3 => Self {
                first_m: 5000.0,
                min_m: 2000.0,
                max_m: 6000.0,
            },
            2 => Self {
                first_m: 8000.0,
                min_m: 4000.0,
                max_m: 10_000.0,
            },
            _ => Self {
                first_m: 9000.0,
                min_m: 6000.0,
                max_m: 15_000.0,
            },
        }
    }
}

/// One line of radio traffic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadioMessage {
    /// Simulation time of the transmission (seconds).
    pub time_s: f64,
    pub airport: String,
    /// Controller position or pilot callsign.
    pub speaker: String,
    pub text: String,
}

impl std::fmt::Display for RadioMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:>7.1}] {}: {}", self.time_s, self.speaker, self.text)
    }
}

/// Owns airports and aircraft and steps them together.
pub struct TrafficManager {
    ctx: SimContext,
    airports: BTreeMap<String, AirportController>,
    aircraft: BTreeMap<AircraftId, AiAircraft>,
    by_callsign: HashMap<String, AircraftId>,
    next_id: u32,
    callsigns: CallsignGenerator,
    rng: StdRng,
    removals: VecDeque<String>,
    elapsed_s: f64,
}

impl TrafficManager {
    /// Create a manager seeded from the context's configuration.
    pub fn new(ctx: SimContext) -> Self {
        let seed = ctx.config.simulation.seed;
        Self {
            ctx,
            airports: BTreeMap::new(),
            aircraft: BTreeMap::new(),
            by_callsign: HashMap::new(),
            next_id: 0,
            callsigns: CallsignGenerator::new(seed),
            rng: StdRng::seed_from_u64(seed.wrapping_add(1)),
            removals: VecDeque::new(),
            elapsed_s: 0.0,
        }
    }

    pub fn context(&self) -> &SimContext {
        &self.ctx
    }

    /// Simulated seconds since creation.
    pub fn elapsed_s(&self) -> f64 {
        self.elapsed_s
    }

    pub fn aircraft_count(&self) -> usize {
        self.aircraft.len()
    }

    /// Controller of an active airport.
    pub fn airport(&self, ident: &str) -> Option<&AirportController> {
        self.airports.get(&ident.to_uppercase())
    }

    /// Idents of active airports.
    pub fn airports(&self) -> impl Iterator<Item = &str> {
        self.airports.keys().map(String::as_str)
    }

    /// Aircraft by callsign.
    pub fn aircraft(&self, callsign: &str) -> Option<&AiAircraft> {
        self.by_callsign
            .get(callsign)
            .and_then(|id| self.aircraft.get(id))
    }

    /// Every aircraft in id order.
    pub fn all_aircraft(&self) -> impl Iterator<Item = &AiAircraft> {
        self.aircraft.values()
    }

    /// Snapshots of every aircraft, in spawn order.
    pub fn snapshots(&self) -> Vec<AircraftSnapshot> {
        self.aircraft.values().map(AiAircraft::snapshot).collect()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Airports
    // ─────────────────────────────────────────────────────────────────────

    /// Start controlling an airport.
    ///
    /// The active runway must be known. A ground network that fails to
    /// load is logged and the airport runs without taxiways.
    pub fn activate_airport(
        &mut self,
        ident: &str,
        network_path: Option<&Path>,
    ) -> Result<(), TrafficError> {
        let ident = ident.to_uppercase();
        if self.airports.contains_key(&ident) {
            debug!(airport = %ident, "Airport already active");
            return Ok(());
        }

        let record = self
            .ctx
            .runways
            .active_runway(&ident)
            .ok_or_else(|| LookupFailure::UnknownRunway(ident.clone()))?;
        let runway = ActiveRunway::from_record(&record, self.ctx.geodesy.as_ref());

        let network = network_path.and_then(|path| {
            match GroundNetwork::load(path, self.ctx.geodesy.as_ref()) {
                Ok(network) => Some(Arc::new(network)),
                Err(e) => {
                    warn!(airport = %ident, error = %e, "Ground network unavailable, running without taxiways");
                    None
                }
            }
        });

        info!(
            airport = %ident,
            runway = %runway.ident(),
            pattern = %runway.pattern_direction(),
            taxiways = network.is_some(),
            "Airport activated"
        );
        let controller = AirportController::new(&ident, runway, network, self.ctx.config.atc_config());
        self.airports.insert(ident, controller);
        Ok(())
    }

    /// Stop controlling an airport and remove its aircraft.
    ///
    /// Returns `false` if the airport was not active.
    pub fn deactivate_airport(&mut self, ident: &str) -> bool {
        let ident = ident.to_uppercase();
        if self.airports.remove(&ident).is_none() {
            return false;
        }
        let gone: Vec<AircraftId> = self
            .aircraft
            .iter()
            .filter(|(_, a)| a.airport() == ident)
            .map(|(id, _)| *id)
            .collect();
        for id in gone {
            if let Some(aircraft) = self.aircraft.remove(&id) {
                self.by_callsign.remove(aircraft.callsign());
                self.removals.retain(|c| c != aircraft.callsign());
            }
        }
        info!(airport = %ident, "Airport deactivated");
        true
    }

    fn controller(&self, ident: &str) -> Result<&AirportController, TrafficError> {
        self.airports
            .get(ident)
            .ok_or_else(|| TrafficError::AirportNotActive(ident.to_string()))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Spawning
    // ─────────────────────────────────────────────────────────────────────

    fn next_callsign(&mut self) -> Result<Callsign, TrafficError> {
        self.callsigns
            .generate_any()
            .ok_or(TrafficError::CallsignsExhausted)
    }

    fn insert(&mut self, aircraft: AiAircraft) -> String {
        self.next_id += 1;
        let id = AircraftId(self.next_id);
        let callsign = aircraft.callsign().to_string();
        info!(
            airport = %aircraft.airport(),
            callsign = %callsign,
            mission = %aircraft.mission(),
            phase = %aircraft.phase().description(),
            "Aircraft spawned"
        );
        self.by_callsign.insert(callsign.clone(), id);
        self.aircraft.insert(id, aircraft);
        callsign
    }

    fn local_mission(circuits: u32, touch_and_go: bool) -> Mission {
        Mission::LocalCircuits {
            circuits: circuits.max(1),
            touch_and_go,
        }
    }

    /// Park an aircraft at a free gate, or at the hold short without one.
    fn spawn_on_ground(&mut self, airport: &str, mission: Mission) -> Result<String, TrafficError> {
        let ident = airport.to_uppercase();
        self.controller(&ident)?;
        let callsign = self.next_callsign()?;
        let controller = self.controller(&ident)?;

        let aircraft = match controller.reserve_gate() {
            Ok(gate) => {
                let (position, heading) = match controller.network() {
                    Some(network) => {
                        let node = network.node(gate);
                        let heading = node.gate.as_ref().map_or(0.0, |g| g.heading_deg);
                        (node.position, heading)
                    }
                    None => (controller.runway().threshold(), controller.runway().heading_deg()),
                };
                let position = match self.ctx.elevation.elevation_m(&position) {
                    Some(elevation) => position.with_elevation(elevation),
                    None => position,
                };
                AiAircraft::at_gate(&callsign.spoken, &ident, mission, gate, position, heading)
            }
            Err(e) => {
                debug!(airport = %ident, error = %e, "No gate, starting at hold short");
                AiAircraft::at_hold_short(&callsign.spoken, &ident, mission, controller.runway())
            }
        };
        Ok(self.insert(aircraft.with_aircraft_type(callsign.aircraft_type)))
    }

    /// A local aircraft parked at a gate that will fly circuits.
    pub fn spawn_parked(
        &mut self,
        airport: &str,
        circuits: u32,
        touch_and_go: bool,
    ) -> Result<String, TrafficError> {
        self.spawn_on_ground(airport, Self::local_mission(circuits, touch_and_go))
    }

    /// A parked aircraft that will take off and leave the area.
    pub fn spawn_departure(&mut self, airport: &str) -> Result<String, TrafficError> {
        self.spawn_on_ground(airport, Mission::Departure)
    }

    /// A local aircraft already in the circuit, registered with the tower.
    ///
    /// `TakeoffRoll` and `Climbout` start on the runway; any other leg
    /// starts level on the downwind.
    pub fn spawn_in_pattern(
        &mut self,
        airport: &str,
        leg: PatternLeg,
        circuits: u32,
        touch_and_go: bool,
    ) -> Result<String, TrafficError> {
        let ident = airport.to_uppercase();
        self.controller(&ident)?;
        let callsign = self.next_callsign()?;
        let mission = Self::local_mission(circuits, touch_and_go);
        let controller = self.controller(&ident)?;
        let runway = controller.runway();

        let aircraft = match leg {
            PatternLeg::TakeoffRoll | PatternLeg::Climbout => {
                AiAircraft::on_runway(&callsign.spoken, &ident, mission, runway)
            }
            _ => AiAircraft::on_downwind(&callsign.spoken, &ident, mission, runway),
        }
        .with_aircraft_type(callsign.aircraft_type);

        let leg = aircraft.leg();
        if let Some(controller) = self.airports.get_mut(&ident) {
            controller.register_ai_plane(
                aircraft.callsign(),
                mission.operation(),
                leg,
                mission.landing(),
            );
        }
        Ok(self.insert(aircraft))
    }

    /// An inbound VFR arrival `distance_m` out on `bearing_deg` from the field.
    ///
    /// The aircraft starts on a 6° slope above the field, no higher than
    /// 3000 ft, heading for the runway threshold.
    pub fn spawn_arrival(
        &mut self,
        airport: &str,
        bearing_deg: f64,
        distance_m: f64,
    ) -> Result<String, TrafficError> {
        let ident = airport.to_uppercase();
        self.controller(&ident)?;
        let callsign = self.next_callsign()?;
        let controller = self.controller(&ident)?;
        let runway = controller.runway();
        let geodesy = self.ctx.geodesy.as_ref();

        let threshold = runway.threshold();
        let height_m = (distance_m * ARRIVAL_SPAWN_ANGLE_DEG.to_radians().tan())
            .min(ARRIVAL_SPAWN_CEILING_FT * FT_TO_M);
        let position = geodesy
            .direct(&threshold, bearing_deg, distance_m)
            .with_elevation(runway.elevation_m() + height_m);
        let heading = geodesy.bearing_deg(&position, &threshold);

        let aircraft = AiAircraft::enroute(&callsign.spoken, &ident, position, heading)
            .with_aircraft_type(callsign.aircraft_type);
        Ok(self.insert(aircraft))
    }

    /// Spawn arrivals spaced for a density level, at least `min_distance_m`
    /// out. Stops after `max_count` or past the generation limit.
    pub fn generate_arrivals(
        &mut self,
        airport: &str,
        density: u8,
        min_distance_m: f64,
        max_count: u32,
    ) -> Result<Vec<String>, TrafficError> {
        let spacing = ArrivalSpacing::for_density(density);
        let mut distance = spacing.first_m.max(min_distance_m);
        let mut spawned = Vec::new();
        while distance < ARRIVAL_GENERATION_LIMIT_M && (spawned.len() as u32) < max_count {
            distance += self.rng.random_range(spacing.min_m..=spacing.max_m);
            let bearing = f64::from(self.rng.random_range(0..36u32) * 10);
            spawned.push(self.spawn_arrival(airport, bearing, distance)?);
        }
        Ok(spawned)
    }

    /// Populate an airport with the configured traffic mix.
    ///
    /// The first in-pattern aircraft starts on the downwind and the second
    /// on the runway; more would stack on the same spots, so the rest start
    /// parked. Returns the number of aircraft created.
    pub fn generate_traffic(
        &mut self,
        airport: &str,
        traffic: &TrafficConfig,
    ) -> Result<usize, TrafficError> {
        let before = self.aircraft.len();
        let circuits = traffic.circuits;
        let tng = traffic.touch_and_go;

        for i in 0..traffic.in_pattern {
            match i {
                0 => self.spawn_in_pattern(airport, PatternLeg::Downwind, circuits, tng)?,
                1 => self.spawn_in_pattern(airport, PatternLeg::TakeoffRoll, circuits, tng)?,
                _ => self.spawn_parked(airport, circuits, tng)?,
            };
        }
        for _ in 0..traffic.parked {
            self.spawn_parked(airport, circuits, tng)?;
        }
        for _ in 0..traffic.departures {
            self.spawn_departure(airport)?;
        }
        self.generate_arrivals(airport, traffic.density, 0.0, traffic.arrivals)?;

        let created = self.aircraft.len() - before;
        info!(airport, created, "Traffic generated");
        Ok(created)
    }

    /// Queue an aircraft for removal. One aircraft is removed per tick.
    pub fn schedule_removal(&mut self, callsign: &str) {
        if !self.removals.iter().any(|c| c == callsign) {
            self.removals.push_back(callsign.to_string());
        }
    }

    /// Remove an aircraft now, releasing its gate and controller state.
    fn remove_aircraft(&mut self, callsign: &str) -> bool {
        let Some(id) = self.by_callsign.remove(callsign) else {
            return false;
        };
        let Some(aircraft) = self.aircraft.remove(&id) else {
            return false;
        };
        if let Some(controller) = self.airports.get_mut(aircraft.airport()) {
            if let (true, Some(gate)) = (aircraft.is_parked(), aircraft.gate()) {
                controller.release_gate(gate);
            }
            controller.deregister_ai_plane(callsign);
            controller.handle_pilot_call(&PilotMessage::new(callsign, PilotCall::RemoveSelf, ""));
        }
        info!(airport = %aircraft.airport(), callsign, "Aircraft removed");
        true
    }

    // ─────────────────────────────────────────────────────────────────────
    // Tick
    // ─────────────────────────────────────────────────────────────────────

    /// Advance everything by `dt` seconds and return the radio traffic.
    pub fn tick(&mut self, dt: f64) -> Vec<RadioMessage> {
        let mut radio = Vec::new();
        if dt <= 0.0 {
            return radio;
        }
        self.elapsed_s += dt;
        let now = self.elapsed_s;

        // Controllers, then delivery of what they said
        for (ident, controller) in self.airports.iter_mut() {
            let picture = TrafficPicture::new(
                self.aircraft
                    .values()
                    .filter(|a| a.airport() == ident.as_str())
                    .map(AiAircraft::snapshot)
                    .collect(),
            );
            for transmission in controller.update(dt, &picture) {
                if let Some(aircraft) = self
                    .by_callsign
                    .get(&transmission.callsign)
                    .and_then(|id| self.aircraft.get_mut(id))
                {
                    aircraft.handle_transmission(&transmission);
                }
                radio.push(controller_message(now, ident, &transmission));
            }
        }

        // Aircraft
        let mut calls = Vec::new();
        for aircraft in self.aircraft.values_mut() {
            let Some(controller) = self.airports.get(aircraft.airport()) else {
                continue;
            };
            let ctx = FlightContext {
                controller,
                geodesy: self.ctx.geodesy.as_ref(),
                elevation: self.ctx.elevation.as_ref(),
                wind: self.ctx.wind.as_ref(),
            };
            let airport = aircraft.airport().to_string();
            calls.extend(
                aircraft
                    .update(dt, &ctx)
                    .into_iter()
                    .map(|m| (airport.clone(), m)),
            );
        }

        // Pilot calls
        for (airport, message) in calls {
            if !message.text.is_empty() {
                radio.push(RadioMessage {
                    time_s: now,
                    airport: airport.clone(),
                    speaker: message.callsign.clone(),
                    text: message.text.clone(),
                });
            }
            match message.call {
                PilotCall::RemoveSelf => self.schedule_removal(&message.callsign),
                _ => {
                    if let Some(controller) = self.airports.get_mut(&airport) {
                        controller.handle_pilot_call(&message);
                    }
                }
            }
        }

        if let Some(callsign) = self.removals.pop_front() {
            self.remove_aircraft(&callsign);
        }

        for message in &radio {
            info!(airport = %message.airport, speaker = %message.speaker, "{}", message.text);
        }
        radio
    }
}

fn controller_message(time_s: f64, airport: &str, transmission: &Transmission) -> RadioMessage {
    let position = match transmission.station {
        Station::Tower => "Tower",
        Station::Ground => "Ground",
    };
    RadioMessage {
        time_s,
        airport: airport.to_string(),
        speaker: format!("{} {}", airport, position),
        text: transmission.text.clone(),
    }
}

/// Aircraft type mix of the manager's generated traffic.
pub fn type_counts<'a>(aircraft: impl Iterator<Item = &'a AiAircraft>) -> (usize, usize) {
    aircraft.fold((0, 0), |(cessna, piper), a| match a.aircraft_type() {
        AircraftType::Cessna => (cessna + 1, piper),
        AircraftType::Piper => (cessna, piper + 1),
    })
}
