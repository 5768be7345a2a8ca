//! Tower controller: runway sequencing for one active runway.
//!
//! # Design
//!
//! The tower keeps one [`TrackedAircraft`] per participant in an arena keyed
//! by [`RecordId`], and six queues of ids ([`Queues`]). Work is spread over a
//! rotation of sub-ticks so each tick does a bounded amount:
//!
//! ```text
//! count:  1    2      4     5       6        7        8
//!         ETA  merge  hold  runway  circuit  approach departure
//! ```
//!
//! Three things run on every tick regardless of the rotation:
//!
//! - records are synced from the traffic picture, which also catches
//!   aircraft touching down so the runway reads occupied at once
//! - the go-around sweep over approach and circuit traffic
//! - the response timer, which answers one pending pilot report
//!
//! Constraints published to circuit traffic come from the circuit leader
//! and are never reported back to the aircraft that set them.

mod eta;
mod queue;
mod record;
mod sequence;

pub use eta::{compute_eta, APPROACH_SPEED_KT, CIRCUIT_SPEED_KT, FINAL_SPEED_KT};
pub use queue::{QueueKind, Queues};
pub use record::{PilotReport, RecordId, RunwayClearance, TrackedAircraft};
pub use sequence::{MergedTrafficList, SeparationRules};

use std::collections::{BTreeMap, HashMap, VecDeque};

use tracing::{debug, info, warn};

use crate::aircraft::{LandingKind, OperationKind, PatternLeg};
use crate::geo::MILE_M;
use crate::runway::ActiveRunway;

use super::clearance::{spoken_digits, ClearanceEvent, Station, Transmission};
use super::config::AtcConfig;
use super::controller::{Controller, ResponseTimer, TrafficPicture};
use super::LookupFailure;

/// ETA window in which approach traffic counts ahead of a downwind report.
const DOWNWIND_LOOKAHEAD_S: f64 = 45.0;

/// Below this ETA the tower stays silent on a final report.
const SILENT_FINAL_ETA_S: f64 = 20.0;

/// Positions set by the circuit leader.
#[derive(Debug, Clone, Copy, Default)]
struct PatternConstraints {
    crosswind: f64,
    downwind: f64,
    base: f64,
    source: Option<RecordId>,
}

/// The tower position at one airport.
pub struct Tower {
    airport: String,
    runway: ActiveRunway,
    config: AtcConfig,

    records: BTreeMap<RecordId, TrackedAircraft>,
    by_callsign: HashMap<String, RecordId>,
    next_id: u32,
    queues: Queues,
    merged: MergedTrafficList,
    constraints: PatternConstraints,

    timer: ResponseTimer,
    responses: VecDeque<RecordId>,

    update_count: u32,
    since_departure_s: f64,
    departed: bool,
    last_conflict: bool,
}

impl Tower {
    /// Create a tower for the given runway.
    pub fn new(airport: impl Into<String>, runway: ActiveRunway, config: AtcConfig) -> Self {
        let timer = ResponseTimer::new(config.response_delay_s);
        Self {
            airport: airport.into(),
            runway,
            config,
            records: BTreeMap::new(),
            by_callsign: HashMap::new(),
            next_id: 0,
            queues: Queues::new(),
            merged: MergedTrafficList::new(),
            constraints: PatternConstraints::default(),
            timer,
            responses: VecDeque::new(),
            update_count: 0,
            since_departure_s: 0.0,
            departed: false,
            last_conflict: false,
        }
    }

    pub fn airport(&self) -> &str {
        &self.airport
    }

    pub fn runway(&self) -> &ActiveRunway {
        &self.runway
    }

    pub fn config(&self) -> &AtcConfig {
        &self.config
    }

    /// Whether anything is in the runway queue.
    pub fn runway_occupied(&self) -> bool {
        !self.queues.is_empty(QueueKind::Runway)
    }

    /// Whether the last merge found an arrival separation conflict.
    pub fn last_conflict(&self) -> bool {
        self.last_conflict
    }

    /// Record for a callsign.
    pub fn record(&self, callsign: &str) -> Option<&TrackedAircraft> {
        self.by_callsign.get(callsign).and_then(|id| self.records.get(id))
    }

    /// Queue a callsign is in.
    pub fn queue_of(&self, callsign: &str) -> Option<QueueKind> {
        self.by_callsign.get(callsign).and_then(|id| self.queues.queue_of(*id))
    }

    /// Callsigns in a queue, in order.
    pub fn queue_callsigns(&self, kind: QueueKind) -> Vec<&str> {
        self.callsigns(self.queues.members(kind).iter().copied())
    }

    /// Callsigns in runway-use order.
    pub fn merged_callsigns(&self) -> Vec<&str> {
        self.callsigns(self.merged.iter())
    }

    /// Number of aircraft known to the tower.
    pub fn tracked_count(&self) -> usize {
        self.records.len()
    }

    fn callsigns(&self, ids: impl Iterator<Item = RecordId>) -> Vec<&str> {
        ids.filter_map(|id| self.records.get(&id))
            .map(|r| r.callsign.as_str())
            .collect()
    }

    fn id_of(&self, callsign: &str) -> Result<RecordId, LookupFailure> {
        self.by_callsign
            .get(callsign)
            .copied()
            .ok_or_else(|| LookupFailure::UnknownAircraft(callsign.to_string()))
    }

    /// Create a record, replacing any earlier record for the callsign.
    fn add_record(&mut self, callsign: &str, operation: OperationKind) -> RecordId {
        if let Some(old) = self.by_callsign.get(callsign).copied() {
            self.remove_record(old);
        }
        self.next_id += 1;
        let id = RecordId(self.next_id);
        self.records.insert(id, TrackedAircraft::new(callsign, operation));
        self.by_callsign.insert(callsign.to_string(), id);
        id
    }

    fn remove_record(&mut self, id: RecordId) -> Option<TrackedAircraft> {
        self.queues.remove(id);
        self.responses.retain(|r| *r != id);
        if self.constraints.source == Some(id) {
            self.constraints = PatternConstraints::default();
        }
        let record = self.records.remove(&id)?;
        self.by_callsign.remove(&record.callsign);
        Some(record)
    }

    fn queue_report(&mut self, id: RecordId, report: PilotReport) {
        let Some(record) = self.records.get_mut(&id) else {
            return;
        };
        if record.push_report(report) && !self.responses.contains(&id) {
            self.responses.push_back(id);
        }
        self.timer.arm();
    }

    // ─────────────────────────────────────────────────────────────────────
    // Exposed operations
    // ─────────────────────────────────────────────────────────────────────

    /// Register an AI aircraft already flying at the airport.
    pub fn register_ai_plane(
        &mut self,
        callsign: &str,
        operation: OperationKind,
        leg: PatternLeg,
        landing: LandingKind,
    ) {
        let id = self.add_record(callsign, operation);
        if let Some(record) = self.records.get_mut(&id) {
            record.leg = leg;
            record.landing = landing;
        }
        let queue = match operation {
            OperationKind::Inbound | OperationKind::StraightIn => QueueKind::Approach,
            OperationKind::Outbound => QueueKind::Departure,
            OperationKind::Circuit | OperationKind::Unknown => QueueKind::Circuit,
        };
        self.queues.push_back(id, queue);
        info!(
            airport = %self.airport,
            callsign,
            operation = %operation,
            leg = %leg,
            "Registered with tower"
        );
    }

    /// Forget an aircraft. Returns `false` if it was not known.
    pub fn deregister_ai_plane(&mut self, callsign: &str) -> bool {
        match self.by_callsign.get(callsign).copied() {
            Some(id) => {
                self.remove_record(id);
                debug!(airport = %self.airport, callsign, "Deregistered from tower");
                true
            }
            None => false,
        }
    }

    /// First call from an aircraft waiting at the hold short.
    pub fn contact_at_hold_short(
        &mut self,
        callsign: &str,
        operation: OperationKind,
        landing: LandingKind,
    ) {
        let id = self.add_record(callsign, operation);
        if let Some(record) = self.records.get_mut(&id) {
            record.landing = landing;
        }
        self.queues.push_back(id, QueueKind::Hold);
        self.queue_report(id, PilotReport::HoldShort);
        info!(airport = %self.airport, callsign, "Holding short");
    }

    /// First call from arriving VFR traffic.
    pub fn vfr_arrival_contact(&mut self, callsign: &str, landing: LandingKind) {
        let id = self.add_record(callsign, OperationKind::StraightIn);
        if let Some(record) = self.records.get_mut(&id) {
            record.landing = landing;
        }
        self.queues.push_back(id, QueueKind::Approach);
        self.queue_report(id, PilotReport::VfrArrival);
        info!(airport = %self.airport, callsign, "VFR arrival contact");
    }

    /// Ready for departure while lined up or holding.
    pub fn request_takeoff(&mut self, callsign: &str) -> Result<(), LookupFailure> {
        let id = self.id_of(callsign)?;
        let cleared = self
            .records
            .get(&id)
            .map(|r| r.cleared_to_takeoff())
            .unwrap_or(false);
        if !cleared {
            self.departed = false;
            self.queue_report(id, PilotReport::LineUp);
        }
        Ok(())
    }

    /// Downwind report; approach traffic joins the circuit queue.
    pub fn report_downwind(&mut self, callsign: &str) -> Result<(), LookupFailure> {
        let id = self.id_of(callsign)?;
        if let Some(record) = self.records.get_mut(&id) {
            record.leg = PatternLeg::Downwind;
            if record.operation == OperationKind::StraightIn {
                record.operation = OperationKind::Circuit;
            }
        }
        if self.queues.queue_of(id) != Some(QueueKind::Circuit) {
            self.queues.push_back(id, QueueKind::Circuit);
        }
        self.refresh_eta(id);
        self.queue_report(id, PilotReport::Downwind);
        Ok(())
    }

    /// Final report; acknowledged at once if already cleared to land.
    pub fn report_final(&mut self, callsign: &str) -> Result<(), LookupFailure> {
        let id = self.id_of(callsign)?;
        let cleared = self
            .records
            .get(&id)
            .map(|r| r.cleared_to_land())
            .unwrap_or(false);
        if cleared {
            if let Some(record) = self.records.get_mut(&id) {
                record.acknowledge_final();
            }
        } else {
            self.queue_report(id, PilotReport::Final);
        }
        Ok(())
    }

    /// The aircraft is going around and rejoins the circuit.
    pub fn report_going_around(&mut self, callsign: &str) -> Result<(), LookupFailure> {
        let id = self.id_of(callsign)?;
        if let Some(record) = self.records.get_mut(&id) {
            record.leg = PatternLeg::Climbout;
            record.clearance = RunwayClearance::None;
            if record.operation != OperationKind::Outbound {
                record.operation = OperationKind::Circuit;
            }
        }
        if self.queues.queue_of(id) != Some(QueueKind::Circuit) {
            self.queues.push_back(id, QueueKind::Circuit);
        }
        self.refresh_eta(id);
        Ok(())
    }

    /// The aircraft has left the runway after landing.
    pub fn report_runway_vacated(&mut self, callsign: &str) -> Result<(), LookupFailure> {
        let id = self.id_of(callsign)?;
        self.queue_report(id, PilotReport::RunwayVacated);
        Ok(())
    }

    /// Crosswind turn position set by the circuit leader.
    pub fn crosswind_constraint(&self, requester: &str) -> Option<f64> {
        let c = self.visible_constraints(requester)?;
        (c.crosswind != 0.0).then_some(c.crosswind)
    }

    /// Downwind leg offset set by the circuit leader.
    pub fn downwind_constraint(&self, requester: &str) -> Option<f64> {
        let c = self.visible_constraints(requester)?;
        (c.downwind.abs() > 1000.0).then_some(c.downwind)
    }

    /// Base turn position set by the circuit leader.
    pub fn base_constraint(&self, requester: &str) -> Option<f64> {
        let c = self.visible_constraints(requester)?;
        (c.base < -1000.0).then_some(c.base)
    }

    fn visible_constraints(&self, requester: &str) -> Option<PatternConstraints> {
        let source = self.constraints.source?;
        if self.by_callsign.get(requester) == Some(&source) {
            return None;
        }
        Some(self.constraints)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Per-tick work
    // ─────────────────────────────────────────────────────────────────────

    fn sync(&mut self, picture: &TrafficPicture) {
        let mut touched_down = Vec::new();
        for (id, record) in self.records.iter_mut() {
            let Some(snap) = picture.get(&record.callsign) else {
                continue;
            };
            record.position = snap.position;
            record.local = self.runway.to_local(&snap.position);
            record.distance_out_m = record.local.x.hypot(record.local.y);
            if snap.leg != PatternLeg::Unknown {
                record.leg = snap.leg;
            }
            if matches!(record.leg, PatternLeg::Crosswind | PatternLeg::Turn2) {
                record.go_around_instructed = false;
            }
            if self.runway.contains(&record.local) {
                record.seen_on_runway = true;
            }
            if snap.leg == PatternLeg::LandingRoll {
                touched_down.push(*id);
            }
        }
        for id in touched_down {
            self.move_to_runway(id);
        }
    }

    fn move_to_runway(&mut self, id: RecordId) {
        if matches!(
            self.queues.queue_of(id),
            Some(QueueKind::Circuit) | Some(QueueKind::Approach)
        ) {
            self.queues.push_front(id, QueueKind::Runway);
            if let Some(record) = self.records.get_mut(&id) {
                record.clearance = RunwayClearance::None;
                debug!(callsign = %record.callsign, "Landed, runway occupied");
            }
        }
    }

    fn occupied_by_other(&self, id: RecordId) -> bool {
        let runway = self.queues.members(QueueKind::Runway);
        !runway.is_empty() && !(runway.len() == 1 && runway[0] == id)
    }

    fn base_for_eta(&self) -> Option<f64> {
        let c = self.constraints;
        (c.source.is_some() && c.base < -1000.0).then_some(c.base)
    }

    fn refresh_eta(&mut self, id: RecordId) {
        let base = self.base_for_eta();
        if let Some(record) = self.records.get_mut(&id) {
            record.eta_s = compute_eta(record.operation, record.leg, &record.local, base);
        }
    }

    fn refresh_all_etas(&mut self) {
        let base = self.base_for_eta();
        for kind in [QueueKind::Approach, QueueKind::Circuit] {
            for id in self.queues.members(kind) {
                if let Some(record) = self.records.get_mut(id) {
                    record.eta_s = compute_eta(record.operation, record.leg, &record.local, base);
                }
            }
        }
    }

    fn merge(&mut self) -> bool {
        let rules = SeparationRules {
            separation_s: self.config.separation_s,
            departure_separation_s: self.config.departure_separation_s,
            since_departure_s: self.departed.then_some(self.since_departure_s),
        };
        self.last_conflict = self.merged.rebuild(&self.queues, &mut self.records, rules);
        self.last_conflict
    }

    fn go_around_sweep(&mut self, out: &mut Vec<Transmission>) {
        let mut candidates: Vec<RecordId> = self.queues.members(QueueKind::Approach).to_vec();
        candidates.extend(
            self.queues
                .members(QueueKind::Circuit)
                .iter()
                .filter(|id| {
                    self.records
                        .get(*id)
                        .map(|r| r.leg == PatternLeg::Final)
                        .unwrap_or(false)
                }),
        );

        for id in candidates {
            self.refresh_eta(id);
            let Some(record) = self.records.get(&id) else {
                continue;
            };
            if record.go_around_instructed
                || record.eta_s >= self.config.go_around_eta_s
                || !self.occupied_by_other(id)
            {
                continue;
            }
            self.instruct_go_around(id, out);
        }
    }

    fn instruct_go_around(&mut self, id: RecordId, out: &mut Vec<Transmission>) {
        let Some(record) = self.records.get_mut(&id) else {
            return;
        };
        record.go_around_instructed = true;
        record.clearance = RunwayClearance::None;
        record.next_on_runway = false;
        record.operation = OperationKind::Circuit;
        record.leg = PatternLeg::Climbout;
        let callsign = record.callsign.clone();
        self.queues.push_back(id, QueueKind::Circuit);
        warn!(airport = %self.airport, callsign = %callsign, "Runway occupied, instructing go-around");
        out.push(Transmission::instruct(
            Station::Tower,
            &callsign,
            format!("{} GO AROUND TRAFFIC ON RUNWAY I REPEAT GO AROUND", callsign),
            ClearanceEvent::GoAround,
        ));
    }

    fn may_clear_to_land(&self, id: RecordId) -> bool {
        let Some(record) = self.records.get(&id) else {
            return false;
        };
        if !record.next_on_runway || record.go_around_instructed || self.runway_occupied() {
            return false;
        }
        !self
            .queues
            .members(QueueKind::Approach)
            .iter()
            .filter(|other| **other != id)
            .filter_map(|other| self.records.get(other))
            .any(|other| other.eta_s < record.eta_s)
    }

    fn clear_to_land(&mut self, id: RecordId, out: &mut Vec<Transmission>) {
        if let Some(record) = self.records.get_mut(&id) {
            record.clearance = RunwayClearance::Land;
            out.push(Transmission::instruct(
                Station::Tower,
                &record.callsign,
                format!("{} cleared to land", record.callsign),
                ClearanceEvent::ClearedToLand,
            ));
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Queue checks
    // ─────────────────────────────────────────────────────────────────────

    fn check_hold(&mut self, out: &mut Vec<Transmission>) {
        let Some((id, _)) = self.queues.next_at_cursor(QueueKind::Hold) else {
            return;
        };
        let Some(record) = self.records.get(&id) else {
            return;
        };
        if record.hold_short_reported() || !record.next_on_runway {
            return;
        }
        let recent_departure =
            self.departed && self.since_departure_s <= self.config.departure_separation_s;
        if !self.runway_occupied() && !recent_departure {
            self.clear_holding_plane(id, out);
        }
    }

    /// Clear a holding aircraft for take-off.
    ///
    /// Assumes the aircraft is next on the runway.
    fn clear_holding_plane(&mut self, id: RecordId, out: &mut Vec<Transmission>) {
        let traffic = self
            .merged
            .iter()
            .find(|m| *m != id)
            .and_then(|m| self.records.get(&m));
        let immediate = traffic
            .map(|t| t.eta_s < self.config.immediate_takeoff_eta_s)
            .unwrap_or(false)
            && (self.since_departure_s > self.config.departure_separation_s || !self.departed);
        let traffic_info = traffic.map(traffic_position);

        let Some(record) = self.records.get_mut(&id) else {
            return;
        };
        let text = match (immediate, traffic_info) {
            (true, Some(info)) => format!(
                "{} cleared immediate take-off... traffic is {}",
                record.callsign, info
            ),
            (true, None) => format!("{} cleared immediate take-off", record.callsign),
            (false, _) => format!("{} cleared for take-off", record.callsign),
        };
        record.clearance = RunwayClearance::Takeoff;
        record.leg = PatternLeg::TakeoffRoll;
        record.drop_report(PilotReport::HoldShort);
        out.push(Transmission::instruct(
            Station::Tower,
            &record.callsign,
            text,
            ClearanceEvent::Takeoff { immediate },
        ));
        self.departed = false;
        self.since_departure_s = 0.0;
        self.queues.push_back(id, QueueKind::Runway);
    }

    fn check_runway(&mut self) {
        let Some(id) = self.queues.head(QueueKind::Runway) else {
            return;
        };
        let Some(record) = self.records.get_mut(&id) else {
            return;
        };
        if !record.seen_on_runway || self.runway.contains(&record.local) {
            return;
        }
        record.seen_on_runway = false;
        let next = match record.operation {
            OperationKind::Inbound | OperationKind::StraightIn => QueueKind::Vacated,
            OperationKind::Outbound => QueueKind::Departure,
            OperationKind::Circuit | OperationKind::Unknown => {
                record.operation = OperationKind::Circuit;
                QueueKind::Circuit
            }
        };
        if next != QueueKind::Vacated {
            self.departed = true;
            self.since_departure_s = 0.0;
        }
        debug!(callsign = %record.callsign, queue = %next, "Left the runway");
        self.queues.push_back(id, next);
    }

    fn check_circuit(&mut self, out: &mut Vec<Transmission>) {
        let Some((id, is_head)) = self.queues.next_at_cursor(QueueKind::Circuit) else {
            self.constraints = PatternConstraints::default();
            return;
        };
        let Some(record) = self.records.get(&id) else {
            return;
        };
        let (leg, local) = (record.leg, record.local);

        if is_head {
            let mut c = PatternConstraints {
                source: Some(id),
                ..PatternConstraints::default()
            };
            match leg {
                PatternLeg::Final | PatternLeg::Turn4 | PatternLeg::Base => c.base = local.y,
                PatternLeg::Turn3 | PatternLeg::Downwind => {
                    c.base = local.y.min(c.base);
                    c.downwind = local.x;
                }
                PatternLeg::Turn2 | PatternLeg::Crosswind => c.crosswind = local.y,
                PatternLeg::Turn1 | PatternLeg::Climbout => c.crosswind = local.y.max(c.crosswind),
                _ => {}
            }
            self.constraints = c;
        }

        match leg {
            PatternLeg::Final => {
                if record.go_around_instructed {
                    return;
                }
                self.refresh_all_etas();
                self.merge();
                if let Some(record) = self.records.get_mut(&id) {
                    if record.landing == LandingKind::FullStop {
                        record.operation = OperationKind::Inbound;
                    }
                }
                let cleared = self
                    .records
                    .get(&id)
                    .map(|r| r.cleared_to_land())
                    .unwrap_or(true);
                if !cleared && self.may_clear_to_land(id) {
                    self.clear_to_land(id, out);
                }
            }
            PatternLeg::LandingRoll => self.move_to_runway(id),
            _ => {}
        }
    }

    fn check_approach(&mut self, out: &mut Vec<Transmission>) {
        let Some((id, _)) = self.queues.next_at_cursor(QueueKind::Approach) else {
            return;
        };
        self.refresh_all_etas();
        let Some(record) = self.records.get(&id) else {
            return;
        };
        if record.leg == PatternLeg::LandingRoll {
            self.move_to_runway(id);
            return;
        }
        if record.eta_s < self.config.landing_clearance_eta_s
            && !record.cleared_to_land()
            && !record.go_around_instructed
        {
            self.merge();
            if self.may_clear_to_land(id) {
                self.clear_to_land(id, out);
            }
        }
    }

    fn check_departure(&mut self, out: &mut Vec<Transmission>) {
        let Some((id, _)) = self.queues.next_at_cursor(QueueKind::Departure) else {
            return;
        };
        let Some(record) = self.records.get(&id) else {
            return;
        };
        if record.distance_out_m > self.config.airspace_radius_m {
            out.push(Transmission::instruct(
                Station::Tower,
                &record.callsign,
                format!("{} You are now clear of my airspace, good day", record.callsign),
                ClearanceEvent::ClearOfAirspace,
            ));
            info!(airport = %self.airport, callsign = %record.callsign, "Left controlled airspace");
            self.remove_record(id);
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Responses
    // ─────────────────────────────────────────────────────────────────────

    fn respond(&mut self, out: &mut Vec<Transmission>) {
        let Some(id) = self.responses.pop_front() else {
            return;
        };
        let Some(report) = self.records.get_mut(&id).and_then(|r| r.pop_report()) else {
            return;
        };
        match report {
            PilotReport::HoldShort => self.respond_hold_short(id, out),
            PilotReport::LineUp => self.respond_line_up(id, out),
            PilotReport::VfrArrival => self.respond_vfr_arrival(id, out),
            PilotReport::Downwind => self.respond_downwind(id, out),
            PilotReport::Final => self.respond_final(id, out),
            PilotReport::RunwayVacated => self.respond_runway_vacated(id, out),
        }
        if self
            .records
            .get(&id)
            .map(|r| r.has_pending_reports())
            .unwrap_or(false)
        {
            self.responses.push_back(id);
        }
        if !self.responses.is_empty() {
            self.timer.arm();
        }
    }

    fn respond_hold_short(&mut self, id: RecordId, out: &mut Vec<Transmission>) {
        let next = self.records.get(&id).map(|r| r.next_on_runway).unwrap_or(false);
        if next && !self.runway_occupied() {
            self.clear_holding_plane(id, out);
        } else if let Some(record) = self.records.get(&id) {
            out.push(Transmission::instruct(
                Station::Tower,
                &record.callsign,
                format!("{} hold position", record.callsign),
                ClearanceEvent::HoldPosition,
            ));
        }
    }

    fn respond_line_up(&mut self, id: RecordId, out: &mut Vec<Transmission>) {
        if !self.runway_occupied() {
            if let Some(record) = self.records.get_mut(&id) {
                record.clearance = RunwayClearance::Takeoff;
                record.leg = PatternLeg::TakeoffRoll;
                out.push(Transmission::instruct(
                    Station::Tower,
                    &record.callsign,
                    format!("{} cleared for take-off", record.callsign),
                    ClearanceEvent::Takeoff { immediate: false },
                ));
            }
            self.departed = false;
            self.since_departure_s = 0.0;
            self.queues.push_back(id, QueueKind::Runway);
        } else if let Some(record) = self.records.get(&id) {
            out.push(Transmission::instruct(
                Station::Tower,
                &record.callsign,
                format!("{} hold position", record.callsign),
                ClearanceEvent::HoldPosition,
            ));
        }
    }

    fn respond_vfr_arrival(&mut self, id: RecordId, out: &mut Vec<Transmission>) {
        let runway = spoken_digits(self.runway.ident());
        let side = self.runway.pattern_direction();
        let airport = self.airport.clone();
        let Some(record) = self.records.get_mut(&id) else {
            return;
        };
        let (text, event) = if record.local.y < -1000.0 {
            record.operation = OperationKind::StraightIn;
            (
                format!(
                    "{} {} Tower, Report three mile straight-in runway {}",
                    record.callsign, airport, runway
                ),
                ClearanceEvent::StraightIn,
            )
        } else {
            record.operation = OperationKind::Circuit;
            (
                format!(
                    "{} {} Tower, Report {} downwind runway {}",
                    record.callsign, airport, side, runway
                ),
                ClearanceEvent::DownwindEntry,
            )
        };
        out.push(Transmission::instruct(Station::Tower, &record.callsign, text, event));
    }

    fn respond_downwind(&mut self, id: RecordId, out: &mut Vec<Transmission>) {
        self.refresh_all_etas();
        let Some(record) = self.records.get(&id) else {
            return;
        };

        let circuit = self.queues.members(QueueKind::Circuit);
        let ahead_in_circuit = circuit.iter().take_while(|m| **m != id).count();
        let circuit_leader = ahead_in_circuit
            .checked_sub(1)
            .and_then(|i| circuit.get(i))
            .and_then(|m| self.records.get(m));

        let approach_ahead: Vec<&TrackedAircraft> = self
            .queues
            .members(QueueKind::Approach)
            .iter()
            .filter(|m| **m != id)
            .filter_map(|m| self.records.get(m))
            .filter(|r| r.eta_s < record.eta_s + DOWNWIND_LOOKAHEAD_S)
            .collect();

        let number = ahead_in_circuit + 1 + approach_ahead.len();
        let mut text = format!(
            "{} Number {}",
            record.callsign,
            spoken_digits(&number.to_string())
        );

        let clear = ahead_in_circuit == 0
            && !self.runway_occupied()
            && record.next_on_runway
            && approach_ahead.is_empty();
        if clear {
            text.push_str(" Cleared to land");
        } else if number > 1 {
            let follow = match (circuit_leader, approach_ahead.last().copied()) {
                (Some(c), Some(a)) => Some(if a.eta_s < c.eta_s { a } else { c }),
                (Some(c), None) => Some(c),
                (None, Some(a)) => Some(a),
                (None, None) => None,
            };
            if let Some(ahead) = follow {
                text.push_str(&format!(" Follow the {}", traffic_position(ahead)));
            }
        }

        let callsign = record.callsign.clone();
        if clear {
            if let Some(record) = self.records.get_mut(&id) {
                record.clearance = RunwayClearance::Land;
            }
            out.push(Transmission::instruct(
                Station::Tower,
                callsign,
                text,
                ClearanceEvent::ClearedToLand,
            ));
        } else {
            out.push(Transmission::inform(Station::Tower, callsign, text));
        }
    }

    fn respond_final(&mut self, id: RecordId, out: &mut Vec<Transmission>) {
        let runway = spoken_digits(self.runway.ident());
        let side = self.runway.pattern_direction();
        let occupied = self.runway_occupied();
        let Some(record) = self.records.get_mut(&id) else {
            return;
        };
        if record.final_acknowledged() {
            return;
        }
        if record.next_on_runway && !occupied && !record.go_around_instructed {
            let text = if record.landing == LandingKind::FullStop {
                format!("{} cleared to land", record.callsign)
            } else {
                format!("{} cleared to land, runway {}", record.callsign, runway)
            };
            record.clearance = RunwayClearance::Land;
            out.push(Transmission::instruct(
                Station::Tower,
                &record.callsign,
                text,
                ClearanceEvent::ClearedToLand,
            ));
        } else if record.eta_s >= SILENT_FINAL_ETA_S {
            // closer in, a go-around follows within seconds if the runway stays blocked
            record.operation = OperationKind::Circuit;
            record.clearance = RunwayClearance::None;
            out.push(Transmission::inform(
                Station::Tower,
                &record.callsign,
                format!(
                    "{} continue approach and report {} downwind runway {}",
                    record.callsign, side, runway
                ),
            ));
        }
        record.acknowledge_final();
    }

    fn respond_runway_vacated(&mut self, id: RecordId, out: &mut Vec<Transmission>) {
        let separate = self.config.separate_ground;
        let ground = self.config.ground_frequency_mhz;
        let Some(record) = self.records.get_mut(&id) else {
            return;
        };
        if record.runway_vacated_acknowledged() {
            return;
        }
        let transmission = if separate {
            Transmission::instruct(
                Station::Tower,
                &record.callsign,
                format!("{} Contact ground on {:.2} Good Day", record.callsign, ground),
                ClearanceEvent::ContactGround,
            )
        } else {
            Transmission::instruct(
                Station::Tower,
                &record.callsign,
                format!("{} cleared for taxi to general aviation parking", record.callsign),
                ClearanceEvent::TaxiToParking,
            )
        };
        record.acknowledge_vacated();
        out.push(transmission);
        self.queues.push_back(id, QueueKind::Vacated);
    }
}

/// Where traffic is, for traffic information.
fn traffic_position(traffic: &TrackedAircraft) -> String {
    let place = match traffic.operation {
        OperationKind::Circuit => match traffic.leg {
            PatternLeg::Final => " on final",
            PatternLeg::Turn4 => " turning final",
            PatternLeg::Base => " on base",
            PatternLeg::Turn3 => " turning base",
            PatternLeg::Downwind => " in circuit",
            _ => "",
        }
        .to_string(),
        _ => {
            let miles = (traffic.distance_out_m / MILE_M).floor();
            if miles < 2.0 {
                " on short final".to_string()
            } else {
                format!(" on {} mile final", spoken_digits(&format!("{}", miles as u32)))
            }
        }
    };
    format!("{}{}", traffic.callsign, place)
}

impl Controller for Tower {
    fn station(&self) -> Station {
        Station::Tower
    }

    fn update(&mut self, dt: f64, picture: &TrafficPicture) -> Vec<Transmission> {
        let mut out = Vec::new();
        self.since_departure_s += dt;
        self.sync(picture);
        self.go_around_sweep(&mut out);

        match self.update_count {
            1 => self.refresh_all_etas(),
            2 => {
                self.merge();
            }
            4 => self.check_hold(&mut out),
            5 => {
                if self.runway_occupied() {
                    self.check_runway();
                }
            }
            6 => self.check_circuit(&mut out),
            7 => self.check_approach(&mut out),
            8 => self.check_departure(&mut out),
            _ => {}
        }
        self.update_count = (self.update_count + 1) % self.config.rotation_length.max(9);

        if self.timer.tick(dt) {
            self.respond(&mut out);
        }
        out
    }

    fn on_clearance_event(&mut self, transmission: &Transmission) {
        debug!(
            airport = %self.airport,
            callsign = %transmission.callsign,
            text = %transmission.text,
            "Tower heard ground transmission"
        );
    }
}
