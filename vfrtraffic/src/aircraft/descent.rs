//! Start-of-descent placement.
//!
//! The glide path is traced backwards from the threshold along final,
//! then base, then downwind until the distance needed to lose pattern
//! altitude at the nominal glide angle is used up.
//!
//! ```text
//! stod = pattern_alt / tan(glide)
//! stod < base                 -> on final
//! stod < base + downwind      -> on base
//! otherwise                   -> on downwind
//! ```

use crate::geo::{LocalPoint, FT_TO_M};

use super::types::PatternLeg;

/// Nominal glide angle (degrees).
pub const GLIDE_ANGLE_DEG: f64 = 5.5;

/// Pattern altitude above the field (feet).
pub const PATTERN_ALTITUDE_FT: f64 = 1000.0;

/// Where the final descent begins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StartOfDescent {
    /// Leg containing the descent point.
    pub leg: PatternLeg,
    /// Trigger point in runway-local coordinates.
    pub point: LocalPoint,
}

/// Straight-line distance from touchdown at which descent must begin (metres).
pub fn descent_distance_m() -> f64 {
    PATTERN_ALTITUDE_FT * FT_TO_M / GLIDE_ANGLE_DEG.to_radians().tan()
}

/// Place the start of descent for a pattern bounded by the given legs.
///
/// # Arguments
///
/// * `base_bound` - local y of the base leg (negative, before the threshold)
/// * `downwind_bound` - local x of the downwind leg
/// * `pattern_direction` - +1 for right-hand, -1 for left-hand circuits
pub fn start_of_descent(base_bound: f64, downwind_bound: f64, pattern_direction: f64) -> StartOfDescent {
    let stod = descent_distance_m();
    let blp = base_bound.abs();
    let dlp = downwind_bound.abs();

    if stod < blp {
        StartOfDescent {
            leg: PatternLeg::Final,
            point: LocalPoint::new(0.0, -stod, 0.0),
        }
    } else if stod < blp + dlp {
        StartOfDescent {
            leg: PatternLeg::Base,
            point: LocalPoint::new(pattern_direction * (stod - blp), -blp, 0.0),
        }
    } else {
        StartOfDescent {
            leg: PatternLeg::Downwind,
            point: LocalPoint::new(pattern_direction * dlp, stod - dlp - 2.0 * blp, 0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descent_distance() {
        // 1000 ft at 5.5 degrees is a little over 3 km
        let d = descent_distance_m();
        assert!((d - 3165.6).abs() < 1.0, "got {}", d);
    }

    #[test]
    fn test_long_final_puts_descent_on_final() {
        let sod = start_of_descent(-10_000.0, 1000.0, -1.0);
        assert_eq!(sod.leg, PatternLeg::Final);
        assert_eq!(sod.point.x, 0.0);
        assert!((sod.point.y + descent_distance_m()).abs() < 1e-9);
    }

    #[test]
    fn test_long_base_puts_descent_on_base() {
        let sod = start_of_descent(-1000.0, 10_000.0, 1.0);
        assert_eq!(sod.leg, PatternLeg::Base);
        assert!((sod.point.x - (descent_distance_m() - 1000.0)).abs() < 1e-9);
        assert_eq!(sod.point.y, -1000.0);

        let left = start_of_descent(-1000.0, 10_000.0, -1.0);
        assert!(left.point.x < 0.0);
    }

    #[test]
    fn test_nominal_pattern_puts_descent_on_downwind() {
        let sod = start_of_descent(-1000.0, 1000.0, -1.0);
        assert_eq!(sod.leg, PatternLeg::Downwind);
        assert_eq!(sod.point.x, -1000.0);
        assert!((sod.point.y - (descent_distance_m() - 3000.0)).abs() < 1e-9);
    }

    #[test]
    fn test_leg_selection_thresholds() {
        let stod = descent_distance_m();
        assert_eq!(start_of_descent(-(stod + 1.0), 0.0, 1.0).leg, PatternLeg::Final);
        assert_eq!(start_of_descent(-(stod - 1.0), 10.0, 1.0).leg, PatternLeg::Base);
        assert_eq!(start_of_descent(-(stod - 11.0), 10.0, 1.0).leg, PatternLeg::Downwind);
    }
}
