//! VFR arrivals joining the pattern from outside the airspace.
//!
//! An arrival flies towards the airport until it is inside tower contact
//! range, calls the tower and waits for an entry clearance. It then either
//! flies to a gate six kilometres out on the extended centreline and joins
//! final, or flies to a point off the far end of the runway and joins the
//! downwind leg.

use serde::Serialize;
use tracing::info;

use crate::atc::{spoken_digits, PilotCall, PilotMessage, Station};
use crate::environment::Wind;
use crate::geo::{heading_difference, LocalPoint, FT_TO_M, MILE_M};

use super::descent::{GLIDE_ANGLE_DEG, PATTERN_ALTITUDE_FT};
use super::types::PatternLeg;
use super::{AiAircraft, FlightContext, FlightPhase};

/// Distance at which an arrival first calls the tower (metres).
pub const TOWER_CONTACT_RANGE_M: f64 = 8.0 * MILE_M;

/// Airspeed flown until joining the pattern.
pub(super) const CRUISE_IAS_KT: f64 = 90.0;

/// Pilot delay before acting on an entry clearance (seconds).
const CLEARANCE_DELAY_S: f64 = 5.5;

/// Straight-in gate on the extended centreline (metres before threshold).
const STRAIGHT_IN_GATE_Y_M: f64 = -6000.0;

/// Where a straight-in arrival reports final (metres before threshold).
const FINAL_REPORT_Y_M: f64 = -4800.0;

/// Distance at which an entry gate counts as reached (metres).
const GATE_CAPTURE_M: f64 = 100.0;

/// Lateral error at which the straight-in is established (metres).
const CENTRELINE_CAPTURE_M: f64 = 10.0;

/// Downwind entry gate, relative to the pattern side.
const ENTRY_GATE_X_M: f64 = 3000.0;
const ENTRY_GATE_Y_M: f64 = 800.0;

/// Downwind leg offset and the window for turning onto it (metres).
const DOWNWIND_X_M: f64 = 1000.0;
const DOWNWIND_CAPTURE_M: f64 = 550.0;

/// Heading error accepted when rolling out on downwind (degrees).
const DOWNWIND_ROLLOUT_DEG: f64 = 2.0;

/// Steepest climb while levelling at pattern altitude (degrees).
const MAX_CLIMB_DEG: f64 = 3.0;

/// Entry clearance given by the tower.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ArrivalEntry {
    StraightIn,
    Downwind,
}

/// Progress of an arrival before it joins the pattern.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum ArrivalStage {
    /// Outside contact range.
    Enroute,
    /// Called the tower, waiting for an entry clearance.
    Contacted,
    /// Flying to the straight-in gate, then down the centreline.
    StraightIn { established: bool },
    /// Flying to the entry gate, then across to the downwind leg.
    DownwindEntry { entering: bool, turning: bool },
}

impl ArrivalStage {
    /// Get a human-readable description.
    pub fn description(&self) -> &'static str {
        match self {
            ArrivalStage::Enroute => "inbound",
            ArrivalStage::Contacted => "awaiting entry clearance",
            ArrivalStage::StraightIn { .. } => "straight-in approach",
            ArrivalStage::DownwindEntry { .. } => "joining downwind",
        }
    }
}

/// Eight-point compass name for a bearing.
pub fn compass_point(bearing_deg: f64) -> &'static str {
    const NAMES: [&str; 8] = [
        "north",
        "north-east",
        "east",
        "south-east",
        "south",
        "south-west",
        "west",
        "north-west",
    ];
    let b = bearing_deg.rem_euclid(360.0);
    let index = ((b + 22.5) / 45.0) as usize % 8;
    NAMES[index]
}

impl AiAircraft {
    pub(super) fn update_arrival(
        &mut self,
        stage: ArrivalStage,
        dt: f64,
        ctx: &FlightContext<'_>,
        out: &mut Vec<PilotMessage>,
    ) -> FlightPhase {
        let runway = ctx.runway();
        let hdg = runway.heading_deg();
        let pd = runway.pattern_direction().sign();
        let local = runway.to_local(&self.pose.position);
        let pattern_elev_m = runway.elevation_m() + PATTERN_ALTITUDE_FT * FT_TO_M;
        let wind = ctx.wind.wind_at(&self.pose.position);
        let threshold = runway.threshold();
        self.in_air = true;
        self.pose.ias_kt = CRUISE_IAS_KT;

        let next = match stage {
            ArrivalStage::Enroute => {
                self.set_track(ctx.geodesy.bearing_deg(&self.pose.position, &threshold));
                self.pose.slope_deg = 0.0;
                let distance = ctx.geodesy.distance_m(&self.pose.position, &threshold);
                if distance < TOWER_CONTACT_RANGE_M {
                    let miles = ((distance / MILE_M) as u32).max(1);
                    let from = compass_point(ctx.geodesy.bearing_deg(&threshold, &self.pose.position));
                    let text = format!(
                        "{} Tower {} {} {} {} of the airport for full stop with the ATIS",
                        self.airport,
                        self.callsign,
                        spoken_digits(&miles.to_string()),
                        if miles > 1 { "miles" } else { "mile" },
                        from
                    );
                    self.tuned = Some(Station::Tower);
                    self.say(out, PilotCall::VfrArrival, text);
                    ArrivalStage::Contacted
                } else {
                    ArrivalStage::Enroute
                }
            }
            ArrivalStage::Contacted => {
                self.set_track(ctx.geodesy.bearing_deg(&self.pose.position, &threshold));
                self.pose.slope_deg = 0.0;
                match self.arrival_clearance {
                    Some(entry) if self.response_counter_s > CLEARANCE_DELAY_S => {
                        self.arrival_clearance = None;
                        let rwy = self.runway_words(runway);
                        match entry {
                            ArrivalEntry::StraightIn => {
                                self.say(
                                    out,
                                    PilotCall::Readback,
                                    format!("Straight-in {} {}", rwy, self.callsign),
                                );
                                ArrivalStage::StraightIn { established: false }
                            }
                            ArrivalEntry::Downwind => {
                                self.say(
                                    out,
                                    PilotCall::Readback,
                                    format!(
                                        "Report {} downwind {} {}",
                                        runway.pattern_direction(),
                                        rwy,
                                        self.callsign
                                    ),
                                );
                                ArrivalStage::DownwindEntry {
                                    entering: false,
                                    turning: false,
                                }
                            }
                        }
                    }
                    _ => ArrivalStage::Contacted,
                }
            }
            ArrivalStage::StraightIn { mut established } => {
                let gate = runway.from_local(&LocalPoint::new(0.0, STRAIGHT_IN_GATE_Y_M, 0.0));
                let distance = ctx.geodesy.distance_m(&self.pose.position, &gate);
                if !established
                    && (local.x.abs() < CENTRELINE_CAPTURE_M || distance < GATE_CAPTURE_M)
                {
                    established = true;
                }
                if established {
                    self.set_track(hdg);
                    self.descend_towards(pattern_elev_m, local.y.abs());
                } else {
                    self.set_track(ctx.geodesy.bearing_deg(&self.pose.position, &gate));
                    self.descend_towards(pattern_elev_m, distance);
                }
                if established && local.y > FINAL_REPORT_Y_M {
                    let text = format!(
                        "{} three mile final runway {}",
                        self.callsign,
                        self.runway_words(runway)
                    );
                    self.say(out, PilotCall::ReportFinal, text);
                    return self.join_pattern(PatternLeg::Final, hdg, dt, &wind, ctx);
                }
                ArrivalStage::StraightIn { established }
            }
            ArrivalStage::DownwindEntry {
                mut entering,
                mut turning,
            } => {
                let gate =
                    runway.from_local(&LocalPoint::new(ENTRY_GATE_X_M * pd, ENTRY_GATE_Y_M, 0.0));
                let downwind_track = hdg + 180.0;
                if !entering {
                    let distance = ctx.geodesy.distance_m(&self.pose.position, &gate);
                    self.set_track(ctx.geodesy.bearing_deg(&self.pose.position, &gate));
                    self.descend_towards(pattern_elev_m, distance);
                    if distance < GATE_CAPTURE_M {
                        entering = true;
                        self.set_track(hdg - 90.0 * pd);
                    }
                } else {
                    self.descend_towards(pattern_elev_m, (local.x - DOWNWIND_X_M * pd).abs());
                    if turning
                        && heading_difference(self.pose.track_deg, downwind_track).abs()
                            < DOWNWIND_ROLLOUT_DEG
                    {
                        return self.join_pattern(PatternLeg::Downwind, downwind_track, dt, &wind, ctx);
                    }
                    if (local.x - DOWNWIND_X_M * pd).abs() < DOWNWIND_CAPTURE_M {
                        turning = true;
                        self.set_track(downwind_track);
                    }
                }
                ArrivalStage::DownwindEntry { entering, turning }
            }
        };

        self.move_along(dt, &wind, ctx);
        FlightPhase::Arriving(next)
    }

    /// Hand over to the pattern state machine.
    fn join_pattern(
        &mut self,
        leg: PatternLeg,
        track_deg: f64,
        dt: f64,
        wind: &Wind,
        ctx: &FlightContext<'_>,
    ) -> FlightPhase {
        info!(callsign = %self.callsign, leg = %leg, "Joining the pattern");
        self.set_track(track_deg);
        self.descending = false;
        // a straight-in has just reported final
        self.leg_reported = leg == PatternLeg::Final;
        if leg == PatternLeg::Downwind {
            self.pose.ias_kt = CRUISE_IAS_KT;
            self.pose.slope_deg = 0.0;
        }
        self.move_along(dt, wind, ctx);
        FlightPhase::InPattern { leg }
    }

    /// Glide towards a target elevation over `distance_m`.
    fn descend_towards(&mut self, target_elev_m: f64, distance_m: f64) {
        let dz = target_elev_m - self.pose.position.elev_m;
        let slope = dz.atan2(distance_m.max(1.0)).to_degrees();
        self.pose.slope_deg = slope.clamp(-GLIDE_ANGLE_DEG, MAX_CLIMB_DEG);
        self.pose.pitch_deg = 0.0;
    }
}
