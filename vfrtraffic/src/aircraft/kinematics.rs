//! Kinematic motion helpers.
//!
//! The aircraft model is a point mass moved along its track each tick.
//! Airborne, the heading is offset from the track by a crab angle that
//! cancels the crosswind:
//!
//! ```text
//! wind_angle = diff(wind_from + 180, track)
//! sin(crab)  = wind_speed * sin|wind_angle| / IAS
//! GS         = cos(wind_angle) * wind_speed + cos(crab) * IAS
//! heading    = track + crab
//! ```

use serde::Serialize;

use crate::environment::Wind;
use crate::geo::{heading_difference, normalize_heading, GeoPoint, Geodesy, KT_TO_MPS, M_TO_FT};

/// Maximum pattern turn rate (deg/s); a full circle takes one minute.
pub const STANDARD_TURN_RATE_DEG_S: f64 = 6.0;

/// Position and motion state of an aircraft.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Pose {
    pub position: GeoPoint,
    /// Direction the nose points.
    pub heading_deg: f64,
    /// Direction of travel over the ground.
    pub track_deg: f64,
    pub ias_kt: f64,
    pub ground_speed_kt: f64,
    pub pitch_deg: f64,
    /// Flight path angle; negative descends.
    pub slope_deg: f64,
    pub vertical_speed_fpm: f64,
}

/// Result of solving the wind triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindCorrection {
    /// Heading offset from track into wind.
    pub crab_deg: f64,
    pub ground_speed_kt: f64,
}

/// Solve the wind triangle for a desired track.
///
/// When the crosswind component exceeds the airspeed the crab saturates
/// at ±90°. Not realistic, but keeps the aircraft moving.
pub fn wind_correction(track_deg: f64, ias_kt: f64, wind: &Wind) -> WindCorrection {
    let wind_angle = heading_difference(wind.from_deg + 180.0, track_deg);
    let side = if wind_angle >= 0.0 { 1.0 } else { -1.0 };
    let rad = wind_angle.to_radians();

    let crab_deg = if ias_kt <= 0.0 || wind.speed_kt == 0.0 {
        0.0
    } else {
        let sin_crab = wind.speed_kt / ias_kt * rad.abs().sin();
        if sin_crab >= 1.0 {
            side * 90.0
        } else {
            sin_crab.asin().to_degrees() * side
        }
    };

    let ground_speed_kt = rad.cos() * wind.speed_kt + crab_deg.to_radians().cos() * ias_kt;
    WindCorrection {
        crab_deg,
        ground_speed_kt,
    }
}

/// Turn `current` toward `target` by at most `max_rate_deg_s * dt`.
pub fn turn_toward(current: f64, target: f64, max_rate_deg_s: f64, dt: f64) -> f64 {
    let diff = heading_difference(current, target);
    let step = max_rate_deg_s * dt;
    if diff.abs() <= step {
        normalize_heading(target)
    } else {
        normalize_heading(current + step * diff.signum())
    }
}

/// Heading change (deg) in one taxi step at `speed_kt` on a turn of `radius_m`.
#[inline]
pub fn taxi_turn_step(speed_kt: f64, radius_m: f64, dt: f64) -> f64 {
    (speed_kt * KT_TO_MPS * dt) / (radius_m * std::f64::consts::PI) * 180.0
}

/// Turn a taxiing heading toward `desired` using the taxi turn law.
pub fn taxi_turn_toward(current: f64, desired: f64, speed_kt: f64, radius_m: f64, dt: f64) -> f64 {
    turn_toward(current, desired, 1.0, taxi_turn_step(speed_kt, radius_m, dt))
}

/// Move a pose along its track for `dt` seconds at its ground speed.
///
/// Elevation changes by the slope; vertical speed is derived from it.
pub fn advance(pose: &mut Pose, geodesy: &dyn Geodesy, dt: f64) {
    if dt <= 0.0 {
        return;
    }
    let distance_m = pose.ground_speed_kt * KT_TO_MPS * dt;
    let climb_m = distance_m * pose.slope_deg.to_radians().tan();
    let next = geodesy.direct(&pose.position, pose.track_deg, distance_m);

    pose.position = next.with_elevation(pose.position.elev_m + climb_m);
    pose.vertical_speed_fpm = climb_m * M_TO_FT / dt * 60.0;
}
