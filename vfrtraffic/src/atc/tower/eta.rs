//! Time-to-threshold estimates.
//!
//! The estimates only order traffic; they are not flight predictions.
//!
//! ```text
//!            crosswind
//!        +---------------+
//!        |               |   downwind
//!        |   runway ^    |
//!        |          |    |
//!        +----------o----+
//!           final     base
//! ```

use crate::aircraft::{OperationKind, PatternLeg};
use crate::geo::{LocalPoint, KT_TO_MPS};

/// Approach speed used for straight-in and inbound traffic (kt).
pub const APPROACH_SPEED_KT: f64 = 100.0;

/// Circuit speed (kt).
pub const CIRCUIT_SPEED_KT: f64 = 80.0;

/// Final approach speed (kt).
pub const FINAL_SPEED_KT: f64 = 70.0;

/// ETA used for circuit legs with no geometric estimate.
pub const DEFAULT_CIRCUIT_ETA_S: f64 = 240.0;

/// ETA of traffic that is not arriving.
pub const NOT_ARRIVING_ETA_S: f64 = 99_999.0;

const NOMINAL_BASE_M: f64 = -1000.0;
const NOMINAL_CROSSWIND_M: f64 = 2000.0;
const NOMINAL_LEG_M: f64 = 1000.0;

/// Estimate seconds to the threshold.
///
/// `base_constraint` is the base leg position set by the circuit leader;
/// the nominal base applies when it is absent.
pub fn compute_eta(
    operation: OperationKind,
    leg: PatternLeg,
    local: &LocalPoint,
    base_constraint: Option<f64>,
) -> f64 {
    let app = APPROACH_SPEED_KT * KT_TO_MPS;
    let circ = CIRCUIT_SPEED_KT * KT_TO_MPS;
    let fin = FINAL_SPEED_KT * KT_TO_MPS;
    let (x, y) = (local.x, local.y);

    match operation {
        OperationKind::StraightIn | OperationKind::Inbound => {
            let d = x.hypot(y);
            if d < NOMINAL_LEG_M {
                d / fin
            } else {
                NOMINAL_LEG_M / fin + (d - NOMINAL_LEG_M) / app
            }
        }
        OperationKind::Circuit | OperationKind::Unknown => {
            let base = base_constraint.unwrap_or(NOMINAL_BASE_M);
            match leg {
                PatternLeg::LandingRoll => 0.0,
                PatternLeg::Final | PatternLeg::Turn4 => y.abs() / fin,
                PatternLeg::Base | PatternLeg::Turn3 => y.abs() / fin + x.abs() / circ,
                PatternLeg::Downwind | PatternLeg::Turn2 => {
                    base.abs() / fin + x.abs() / circ + (base - y).abs() / circ
                }
                PatternLeg::Crosswind | PatternLeg::Turn1 => {
                    let along = if y > NOMINAL_CROSSWIND_M {
                        (base - y).abs()
                    } else {
                        (base - NOMINAL_CROSSWIND_M).abs()
                    };
                    base.abs() / fin
                        + x.abs().max(NOMINAL_LEG_M) / circ
                        + along / circ
                        + (NOMINAL_LEG_M - x.abs()).max(0.0) / circ
                }
                _ => DEFAULT_CIRCUIT_ETA_S,
            }
        }
        OperationKind::Outbound => NOT_ARRIVING_ETA_S,
    }
}
