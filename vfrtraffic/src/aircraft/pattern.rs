//! Flying the rectangular traffic pattern.
//!
//! Each leg steers towards a target track and hands over to the next leg
//! on a heading or position trigger. Leg geometry follows the tower's
//! constraints when another aircraft leads the circuit:
//!
//! ```text
//! Climbout  -> Turn1     above 700 ft, past the crosswind constraint (or 1500 m)
//! Crosswind -> Turn2     900 m abeam, past the downwind constraint
//! Downwind  -> Turn3     turn radius short of -1000 m, past the base constraint
//! Base      -> Turn4     turn radius plus 50 m from the centreline
//! Final     -> LandingRoll  wheels on the ground
//! ```
//!
//! The final descent starts at the point found by [`start_of_descent`] and
//! follows a glide slope recomputed every tick towards a point 30 m past
//! the threshold, until 50 m short of it. From there the aircraft holds
//! the last slope and flares in height bands: 60 kt below 5 m, 55 kt
//! below 1 m.

use tracing::{debug, info};

use crate::atc::{PilotCall, PilotMessage};
use crate::geo::{heading_difference, LocalPoint, KT_TO_MPS};

use super::descent::{start_of_descent, GLIDE_ANGLE_DEG, PATTERN_ALTITUDE_FT};
use super::types::PatternLeg;
use super::{AiAircraft, FlightContext, FlightPhase, Mission, WHEEL_OFFSET_M};

/// Take-off and landing roll acceleration (knots per second).
const ROLL_ACCELERATION_KT_S: f64 = 5.0;

/// Ground speed cap during the take-off roll.
const MAX_ROLL_SPEED_KT: f64 = 80.0;

/// Indicated airspeed at rotation.
const ROTATION_IAS_KT: f64 = 70.0;

/// Height at which the crosswind turn may begin (feet).
const CROSSWIND_TURN_HEIGHT_FT: f64 = 700.0;

/// Crosswind turn point without a leading aircraft (metres past threshold).
const DEFAULT_CROSSWIND_Y_M: f64 = 1500.0;

/// Lateral distance at which the downwind turn may begin (metres).
const DOWNWIND_OFFSET_M: f64 = 900.0;

/// Base turn point without a leading aircraft (metres before threshold).
const DEFAULT_BASE_Y_M: f64 = -1000.0;

/// Default downwind offset used for descent planning (metres).
const DEFAULT_DOWNWIND_X_M: f64 = 1000.0;

/// Cruise altitude for departures leaving the pattern (feet above field).
const DEPARTURE_ALTITUDE_FT: f64 = 3000.0;

/// Pattern altitude band in which the aircraft holds level (feet).
const PATTERN_BAND_LOW_FT: f64 = 995.0;
const PATTERN_BAND_HIGH_FT: f64 = 1015.0;

/// Aim point past the threshold for the glide slope (metres).
const AIM_POINT_Y_M: f64 = 30.0;

/// The glide slope is tracked until this far before the threshold (metres).
const GLIDE_SLOPE_END_Y_M: f64 = -50.0;

/// Height above the field below which the flare bands apply (metres).
const FLARE_HEIGHT_M: f64 = 10.0;

/// Steepest glide slope flown on final (degrees).
const MAX_GLIDE_SLOPE_DEG: f64 = 10.0;

/// Speed at which the landing roll ends (knots).
const ROLL_OUT_SPEED_KT: f64 = 15.0;

/// Go-around delays (seconds after the instruction).
const GO_AROUND_ON_FINAL_S: f64 = 2.0;
const GO_AROUND_REPORT_S: f64 = 5.5;

impl AiAircraft {
    pub(super) fn fly_pattern(
        &mut self,
        leg: PatternLeg,
        dt: f64,
        ctx: &FlightContext<'_>,
        out: &mut Vec<PilotMessage>,
    ) -> FlightPhase {
        let runway = ctx.runway();
        let hdg = runway.heading_deg();
        let pd = runway.pattern_direction().sign();
        let local = runway.to_local(&self.pose.position);
        let agl_ft = self.height_above_field_ft(runway);
        let wind = ctx.wind.wind_at(&self.pose.position);
        let turn_radius_m = self.pose.ias_kt * KT_TO_MPS * 60.0 / (2.0 * std::f64::consts::PI);
        let mut next = leg;

        match leg {
            PatternLeg::TakeoffRoll => {
                self.target_track_deg = None;
                self.pose.track_deg = hdg;
                self.in_air = false;
                if self.pose.ground_speed_kt < MAX_ROLL_SPEED_KT {
                    self.pose.ground_speed_kt += ROLL_ACCELERATION_KT_S * dt;
                }
                self.snap_to_ground();
                self.pose.ias_kt = self.pose.ground_speed_kt
                    + heading_difference(wind.from_deg, self.pose.heading_deg)
                        .to_radians()
                        .cos()
                        * wind.speed_kt;
                if self.pose.ias_kt >= ROTATION_IAS_KT {
                    next = PatternLeg::Climbout;
                    self.pose.pitch_deg = 10.0;
                    self.pose.ias_kt = ROTATION_IAS_KT;
                    self.pose.slope_deg = 6.0;
                    self.in_air = true;
                    self.set_track(hdg);
                    info!(callsign = %self.callsign, "Airborne");
                }
            }
            PatternLeg::Climbout => {
                if self.mission == Mission::Departure {
                    if agl_ft > DEPARTURE_ALTITUDE_FT {
                        self.level_off(90.0);
                    }
                } else {
                    if agl_ft > CROSSWIND_TURN_HEIGHT_FT {
                        let turn_at = ctx
                            .controller
                            .get_crosswind_constraint(&self.callsign)
                            .unwrap_or(DEFAULT_CROSSWIND_Y_M);
                        if local.y > turn_at {
                            next = PatternLeg::Turn1;
                            self.set_track(hdg + 90.0 * pd);
                        }
                    }
                    if agl_ft > PATTERN_ALTITUDE_FT {
                        self.level_off(80.0);
                    }
                }
                self.announce_go_around(out);
            }
            PatternLeg::Turn1 => {
                self.set_track(hdg + 90.0 * pd);
                if agl_ft > PATTERN_ALTITUDE_FT {
                    self.level_off(80.0);
                }
                if heading_difference(hdg, self.pose.track_deg).abs() > 89.0 {
                    next = PatternLeg::Crosswind;
                }
                self.announce_go_around(out);
            }
            PatternLeg::Crosswind => {
                self.go_around = None;
                if agl_ft > PATTERN_ALTITUDE_FT {
                    self.level_off(80.0);
                }
                let past_constraint = match ctx.controller.get_downwind_constraint(&self.callsign) {
                    Some(dx) => local.x.abs() > dx.abs(),
                    None => true,
                };
                if local.x.abs() > DOWNWIND_OFFSET_M && past_constraint {
                    next = PatternLeg::Turn2;
                    self.set_track(hdg - 180.0 * pd);
                }
            }
            PatternLeg::Turn2 => {
                self.set_track(hdg - 180.0 * pd);
                if agl_ft > PATTERN_ALTITUDE_FT {
                    self.level_off(80.0);
                }
                if heading_difference(hdg, self.pose.track_deg).abs() > 179.0 {
                    next = PatternLeg::Downwind;
                    self.leg_reported = false;
                }
            }
            PatternLeg::Downwind => {
                next = self.fly_downwind(local, agl_ft, turn_radius_m, ctx, out);
            }
            PatternLeg::Turn3 => {
                self.set_track(hdg - 90.0 * pd);
                self.continue_descent(-4.0, 70.0);
                if heading_difference(hdg, self.pose.track_deg).abs() < 91.0 {
                    next = PatternLeg::Base;
                }
            }
            PatternLeg::Base => {
                let base_y = ctx
                    .controller
                    .get_base_constraint(&self.callsign)
                    .unwrap_or(DEFAULT_BASE_Y_M);
                self.check_descent(PatternLeg::Base, base_y, 10_000.0 * pd, &local);
                self.continue_descent(-4.0, 70.0);
                if local.x.abs() < turn_radius_m + 50.0 {
                    next = PatternLeg::Turn4;
                    self.set_track(hdg);
                }
            }
            PatternLeg::Turn4 => {
                self.set_track(hdg);
                self.continue_descent(-4.0, 70.0);
                if heading_difference(hdg, self.pose.track_deg).abs() < 0.6 {
                    next = PatternLeg::Final;
                    self.pose.ground_speed_kt = 65.0;
                    self.leg_reported = false;
                }
            }
            PatternLeg::Final => {
                next = self.fly_final(local, ctx, out);
            }
            PatternLeg::LandingRoll => {
                self.target_track_deg = None;
                self.pose.track_deg = hdg;
                self.in_air = false;
                self.descending = false;
                self.snap_to_ground();
                self.pose.ground_speed_kt = (self.pose.ground_speed_kt - ROLL_ACCELERATION_KT_S * dt).max(0.0);
                self.pose.ias_kt = self.pose.ground_speed_kt;
                if self.pose.ground_speed_kt <= ROLL_OUT_SPEED_KT {
                    let remaining = match self.mission {
                        Mission::LocalCircuits { circuits, .. } => circuits,
                        Mission::Departure | Mission::Arrival => 0,
                    };
                    if remaining <= 1 {
                        return self.exit_runway(ctx, out);
                    }
                    if let Mission::LocalCircuits { circuits, .. } = &mut self.mission {
                        *circuits = remaining - 1;
                    }
                    self.cleared_to_land = false;
                    self.leg_reported = false;
                    debug!(callsign = %self.callsign, remaining = remaining - 1, "Going again");
                    next = PatternLeg::TakeoffRoll;
                }
            }
            PatternLeg::Unknown => {}
        }

        if next == PatternLeg::LandingRoll || next == PatternLeg::TakeoffRoll {
            // wheels down: no wind triangle
            self.in_air = false;
        }
        self.move_along(dt, &wind, ctx);
        if !self.in_air {
            self.snap_to_ground();
        }
        FlightPhase::InPattern { leg: next }
    }

    fn fly_downwind(
        &mut self,
        local: LocalPoint,
        agl_ft: f64,
        turn_radius_m: f64,
        ctx: &FlightContext<'_>,
        out: &mut Vec<PilotMessage>,
    ) -> PatternLeg {
        let runway = ctx.runway();
        let hdg = runway.heading_deg();
        let pd = runway.pattern_direction().sign();
        self.set_track(hdg - 180.0 * pd);

        if !self.descending {
            if (PATTERN_BAND_LOW_FT..PATTERN_BAND_HIGH_FT).contains(&agl_ft) {
                self.level_off(90.0);
            } else if agl_ft >= PATTERN_BAND_HIGH_FT {
                self.pose.slope_deg = -1.0;
            }
        }

        if !self.leg_reported && local.y < 0.0 {
            self.leg_reported = true;
            let text = format!(
                "{} Traffic {} {} downwind {}",
                self.airport,
                self.callsign,
                runway.pattern_direction(),
                self.runway_words(runway)
            );
            self.say(out, PilotCall::ReportDownwind, text);
        }

        let base_constraint = ctx.controller.get_base_constraint(&self.callsign);
        if local.y < -100.0 {
            let downwind_x = ctx
                .controller
                .get_downwind_constraint(&self.callsign)
                .unwrap_or(DEFAULT_DOWNWIND_X_M * pd);
            self.check_descent(
                PatternLeg::Downwind,
                base_constraint.unwrap_or(DEFAULT_BASE_Y_M),
                downwind_x,
                &local,
            );
        }
        self.continue_descent(-3.0, 85.0);

        let behind_leader = base_constraint.map_or(true, |b| local.y.abs() > b.abs());
        if local.y < DEFAULT_BASE_Y_M + turn_radius_m && behind_leader {
            self.pose.ias_kt = 80.0;
            self.set_track(hdg - 90.0 * pd);
            return PatternLeg::Turn3;
        }
        PatternLeg::Downwind
    }

    fn fly_final(
        &mut self,
        local: LocalPoint,
        ctx: &FlightContext<'_>,
        out: &mut Vec<PilotMessage>,
    ) -> PatternLeg {
        let runway = ctx.runway();
        let hdg = runway.heading_deg();
        let pd = runway.pattern_direction().sign();

        if self.go_around.is_some() && self.response_counter_s > GO_AROUND_ON_FINAL_S {
            info!(callsign = %self.callsign, "Going around");
            self.descending = false;
            self.cleared_to_land = false;
            self.pose.pitch_deg = 8.0;
            self.pose.ias_kt = 70.0;
            self.pose.slope_deg = 5.0;
            self.set_track(hdg);
            return PatternLeg::Climbout;
        }

        if !self.leg_reported && !self.cleared_to_land {
            self.leg_reported = true;
            let text = format!(
                "{} Traffic {} {} final {}",
                self.airport,
                self.callsign,
                runway.pattern_direction(),
                self.runway_words(runway)
            );
            self.say(out, PilotCall::ReportFinal, text);
        }

        self.check_descent(PatternLeg::Final, -10_000.0, DEFAULT_DOWNWIND_X_M * pd, &local);
        if self.descending {
            let field = runway.elevation_m();
            if local.y < GLIDE_SLOPE_END_Y_M {
                let above_m = self.pose.position.elev_m - field;
                let glide = (above_m / (local.y - AIM_POINT_Y_M))
                    .atan()
                    .to_degrees()
                    .max(-MAX_GLIDE_SLOPE_DEG);
                self.saved_slope_deg = glide;
                self.pose.slope_deg = glide;
                self.pose.pitch_deg = -4.0;
                self.pose.ias_kt = 70.0;
            } else {
                let (slope, pitch, ias) = self.flare(field);
                self.pose.slope_deg = slope;
                self.pose.pitch_deg = pitch;
                self.pose.ias_kt = ias;
            }
        }
        self.set_track(hdg - 0.2 * local.x);

        if self.ground_elevation_m + WHEEL_OFFSET_M > self.pose.position.elev_m {
            info!(callsign = %self.callsign, "Touchdown");
            self.descending = false;
            self.in_air = false;
            return PatternLeg::LandingRoll;
        }
        PatternLeg::Final
    }

    /// Slope, pitch and airspeed over the threshold, by wheel height.
    fn flare(&self, field_elevation_m: f64) -> (f64, f64, f64) {
        let elev = self.pose.position.elev_m;
        if elev >= field_elevation_m + FLARE_HEIGHT_M + WHEEL_OFFSET_M {
            return (self.saved_slope_deg, -3.0, 65.0);
        }
        let height_m = elev - self.ground_elevation_m - WHEEL_OFFSET_M;
        if height_m < 1.0 {
            (-2.0, 1.0, 55.0)
        } else if height_m < 5.0 {
            (-4.0, -2.0, 60.0)
        } else {
            (self.saved_slope_deg, -3.0, 65.0)
        }
    }

    /// Start the final descent once past the start-of-descent point.
    fn check_descent(&mut self, leg: PatternLeg, base_y: f64, downwind_x: f64, local: &LocalPoint) {
        if self.descending {
            return;
        }
        let sod = start_of_descent(base_y, downwind_x, 1.0_f64.copysign(downwind_x));
        if sod.leg != leg {
            return;
        }
        let passed = match leg {
            PatternLeg::Downwind => local.y < sod.point.y,
            PatternLeg::Base => local.x.abs() < sod.point.x.abs(),
            PatternLeg::Final => local.y > sod.point.y,
            _ => false,
        };
        if passed {
            debug!(callsign = %self.callsign, leg = %leg, "Start of descent");
            self.descending = true;
        }
    }

    /// Apply the nominal descent on downwind and base.
    fn continue_descent(&mut self, pitch_deg: f64, ias_kt: f64) {
        if self.descending {
            self.pose.slope_deg = -GLIDE_ANGLE_DEG;
            self.pose.pitch_deg = pitch_deg;
            self.pose.ias_kt = ias_kt;
        }
    }

    /// Tell the tower about a go-around once the climb is established.
    fn announce_go_around(&mut self, out: &mut Vec<PilotMessage>) {
        let due = matches!(self.go_around, Some(g) if !g.announced)
            && self.response_counter_s > GO_AROUND_REPORT_S;
        if due {
            if let Some(g) = self.go_around.as_mut() {
                g.announced = true;
            }
            self.say(
                out,
                PilotCall::GoingAround,
                format!("{} going around", self.callsign),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::aircraft::{LandingKind, OperationKind};
    use crate::atc::{
        AircraftSnapshot, ClearanceEvent, Controller, Station, TrafficPicture, Transmission,
    };
    use crate::geo::FT_TO_M;

    fn circuits(n: u32) -> Mission {
        Mission::LocalCircuits {
            circuits: n,
            touch_and_go: true,
        }
    }

    #[test]
    fn test_takeoff_roll_rotates_at_seventy_knots() {
        let world = World::new();
        let mut a = AiAircraft::on_runway("N1", "KXYZ", circuits(1), world.runway());

        let mut ticks = 0;
        while a.leg() == PatternLeg::TakeoffRoll && ticks < 30 {
            a.update(1.0, &world.context());
            ticks += 1;
            if a.leg() == PatternLeg::TakeoffRoll {
                assert!(!a.is_airborne());
            }
        }
        assert_eq!(a.leg(), PatternLeg::Climbout);
        assert_eq!(ticks, 14);
        assert!(a.is_airborne());
        assert_eq!(a.pose().ias_kt, 70.0);
    }

    #[test]
    fn test_circuit_legs_in_order() {
        let world = World::new();
        let mut a = AiAircraft::on_runway("N1", "KXYZ", circuits(1), world.runway());

        let mut legs = vec![a.leg()];
        for _ in 0..1200 {
            a.update(1.0, &world.context());
            if legs.last() != Some(&a.leg()) {
                legs.push(a.leg());
            }
            if a.leg() == PatternLeg::Final {
                break;
            }
        }
        assert_eq!(
            legs,
            vec![
                PatternLeg::TakeoffRoll,
                PatternLeg::Climbout,
                PatternLeg::Turn1,
                PatternLeg::Crosswind,
                PatternLeg::Turn2,
                PatternLeg::Downwind,
                PatternLeg::Turn3,
                PatternLeg::Base,
                PatternLeg::Turn4,
                PatternLeg::Final,
            ]
        );
    }

    #[test]
    fn test_downwind_report_and_level_flight() {
        let world = World::new();
        let mut a = AiAircraft::on_downwind("N1", "KXYZ", circuits(1), world.runway());

        let (reported, said) = run_until(&mut a, &world, 120, |a| a.leg_reported);
        assert!(reported);
        let report = said
            .iter()
            .find(|m| m.call == PilotCall::ReportDownwind)
            .expect("downwind report");
        assert_eq!(report.text, "KXYZ Traffic N1 left downwind two-five");

        let height_ft = (a.position().elev_m - FIELD_ELEVATION_M) / FT_TO_M;
        assert!((height_ft - PATTERN_ALTITUDE_FT).abs() < 20.0, "{}", height_ft);
    }

    #[test]
    fn test_full_stop_lands_and_leaves_runway() {
        let world = World::new();
        let mut a = AiAircraft::on_downwind("N1", "KXYZ", circuits(1), world.runway());
        a.handle_transmission(&Transmission::instruct(
            Station::Tower,
            "N1",
            "N1 cleared to land",
            ClearanceEvent::ClearedToLand,
        ));

        let (landed, _) = run_until(&mut a, &world, 900, |a| a.leg() == PatternLeg::LandingRoll);
        assert!(landed, "stuck in {:?}", a.phase());
        let local = world.runway().to_local(&a.position());
        assert!(world.runway().contains(&local), "touched down at {:?}", local);

        // No taxi network: the aircraft leaves the runway out of sight
        let (parked, said) = run_until(&mut a, &world, 60, |a| a.is_parked());
        assert!(parked);
        assert!(!a.is_visible());
        assert!(said.iter().any(|m| m.call == PilotCall::RunwayVacated));
    }

    #[test]
    fn test_final_glide_then_flare_to_touchdown_speed() {
        let world = World::new();
        let mut a = AiAircraft::on_downwind("N1", "KXYZ", circuits(1), world.runway());
        a.handle_transmission(&Transmission::instruct(
            Station::Tower,
            "N1",
            "N1 cleared to land",
            ClearanceEvent::ClearedToLand,
        ));

        let mut on_glide_slope = 0;
        let mut flare_speeds = Vec::new();
        let (landed, _) = run_until(&mut a, &world, 900, |a| {
            if a.leg() == PatternLeg::Final && a.descending {
                let local = world.runway().to_local(&a.position());
                if local.y < -200.0 {
                    on_glide_slope += 1;
                    assert_eq!(a.pose().ias_kt, 70.0);
                    assert_eq!(a.pose().pitch_deg, -4.0);
                    assert!(a.pose().slope_deg >= -MAX_GLIDE_SLOPE_DEG);
                } else if local.y > -50.0 {
                    flare_speeds.push(a.pose().ias_kt);
                }
            }
            a.leg() == PatternLeg::LandingRoll
        });
        assert!(landed, "stuck in {:?}", a.phase());
        assert!(on_glide_slope > 0);
        assert!(!flare_speeds.is_empty());
        assert!(flare_speeds.iter().all(|&ias| ias <= 65.0), "{:?}", flare_speeds);
        assert!(a.pose().ias_kt <= 55.0, "touched down at {} kt", a.pose().ias_kt);
    }

    #[test]
    fn test_follower_turns_base_behind_leader() {
        let mut world = World::new();
        world.controller.register_ai_plane(
            "L",
            OperationKind::Circuit,
            PatternLeg::Base,
            LandingKind::FullStop,
        );
        world.controller.register_ai_plane(
            "N1",
            OperationKind::Circuit,
            PatternLeg::Downwind,
            LandingKind::FullStop,
        );

        let mut a = AiAircraft::on_downwind("N1", "KXYZ", circuits(1), world.runway());
        let pd = world.runway().pattern_direction().sign();
        let leader = AircraftSnapshot {
            callsign: "L".to_string(),
            airport: "KXYZ".to_string(),
            position: world.runway().from_local(&LocalPoint::new(800.0 * pd, -1500.0, 300.0)),
            heading_deg: world.runway().heading_deg(),
            ias_kt: 70.0,
            leg: PatternLeg::Base,
            phase: PatternLeg::Base.to_string(),
            visible: true,
        };
        let picture = TrafficPicture::new(vec![leader, a.snapshot()]);
        for _ in 0..8 {
            world.controller.update(1.0, &picture);
        }
        let base = world
            .controller
            .get_base_constraint("N1")
            .expect("base constraint");
        assert!((base + 1500.0).abs() < 1.0, "{}", base);

        let mut last_downwind_y = 0.0;
        let (turned, _) = run_until(&mut a, &world, 600, |a| {
            if a.leg() == PatternLeg::Downwind {
                last_downwind_y = world.runway().to_local(&a.position()).y;
            }
            a.leg() == PatternLeg::Turn3
        });
        assert!(turned);
        assert!(
            last_downwind_y < base,
            "turned base at y={}, before the leader's base at {}",
            last_downwind_y,
            base
        );
    }

    #[test]
    fn test_touch_and_go_flies_another_circuit() {
        let world = World::new();
        let mut a = AiAircraft::on_downwind("N1", "KXYZ", circuits(2), world.runway());

        let (again, _) = run_until(&mut a, &world, 1200, |a| {
            a.leg() == PatternLeg::TakeoffRoll
        });
        assert!(again);
        assert_eq!(a.mission(), circuits(1));
        assert!(a.is_visible());
    }

    #[test]
    fn test_go_around_on_final() {
        let world = World::new();
        let mut a = AiAircraft::on_downwind("N1", "KXYZ", circuits(1), world.runway());
        let (on_final, _) = run_until(&mut a, &world, 600, |a| a.leg() == PatternLeg::Final);
        assert!(on_final);

        a.handle_transmission(&Transmission::instruct(
            Station::Tower,
            "N1",
            "N1 GO AROUND",
            ClearanceEvent::GoAround,
        ));
        a.update(1.0, &world.context());
        a.update(1.0, &world.context());
        assert_eq!(a.leg(), PatternLeg::Final);
        a.update(1.0, &world.context());
        assert_eq!(a.leg(), PatternLeg::Climbout);
        assert!(!a.cleared_to_land());

        let (announced, said) = run_until(&mut a, &world, 10, |a| {
            matches!(a.go_around, Some(g) if g.announced)
        });
        assert!(announced);
        assert!(said.iter().any(|m| m.call == PilotCall::GoingAround));
    }

    #[test]
    fn test_departure_climbs_straight_out() {
        let world = World::new();
        let mut a = AiAircraft::on_runway("N1", "KXYZ", Mission::Departure, world.runway());
        for _ in 0..400 {
            a.update(1.0, &world.context());
        }
        assert_eq!(a.leg(), PatternLeg::Climbout);
        let height_ft = (a.position().elev_m - FIELD_ELEVATION_M) / FT_TO_M;
        assert!(height_ft > DEPARTURE_ALTITUDE_FT);
        assert!(height_ft < DEPARTURE_ALTITUDE_FT + 100.0);
        let local = world.runway().to_local(&a.position());
        assert!(local.x.abs() < 50.0);
    }

    #[test]
    fn test_pattern_turns_respect_rate_limit() {
        let world = World::new();
        let mut a = AiAircraft::on_downwind("N1", "KXYZ", circuits(1), world.runway());
        let mut track = a.pose().track_deg;
        for _ in 0..300 {
            a.update(1.0, &world.context());
            let turned = heading_difference(track, a.pose().track_deg).abs();
            assert!(turned <= super::super::STANDARD_TURN_RATE_DEG_S + 1e-9);
            track = a.pose().track_deg;
        }
    }
}
