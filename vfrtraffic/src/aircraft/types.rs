//! Operation, leg and landing classifications shared by aircraft and tower.

use serde::Serialize;

/// What an aircraft intends to do at the airport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum OperationKind {
    /// Flying the local traffic pattern.
    Circuit,
    /// Arriving to land and park.
    Inbound,
    /// Departing the pattern after take-off.
    Outbound,
    /// Arriving on a straight-in final.
    StraightIn,
    #[default]
    Unknown,
}

impl OperationKind {
    /// Get a human-readable description.
    pub fn description(&self) -> &'static str {
        match self {
            OperationKind::Circuit => "traffic pattern",
            OperationKind::Inbound => "inbound for landing",
            OperationKind::Outbound => "outbound departure",
            OperationKind::StraightIn => "straight-in approach",
            OperationKind::Unknown => "unknown operation",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationKind::Circuit => write!(f, "circuit"),
            OperationKind::Inbound => write!(f, "inbound"),
            OperationKind::Outbound => write!(f, "outbound"),
            OperationKind::StraightIn => write!(f, "straight-in"),
            OperationKind::Unknown => write!(f, "unknown"),
        }
    }
}

/// Segment of the rectangular traffic pattern.
///
/// ```text
///        Turn2 ---- Crosswind ---- Turn1
///          |                         |
///       Downwind                  Climbout
///          |                         |
///        Turn3                    TakeoffRoll
///          |                         |
///        Base ------- Turn4 ----- Final / LandingRoll
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum PatternLeg {
    TakeoffRoll,
    Climbout,
    Turn1,
    Crosswind,
    Turn2,
    Downwind,
    Turn3,
    Base,
    Turn4,
    Final,
    LandingRoll,
    #[default]
    Unknown,
}

impl PatternLeg {
    /// Get a human-readable description.
    pub fn description(&self) -> &'static str {
        match self {
            PatternLeg::TakeoffRoll => "rolling for take-off",
            PatternLeg::Climbout => "climbing out",
            PatternLeg::Turn1 => "turning crosswind",
            PatternLeg::Crosswind => "crosswind",
            PatternLeg::Turn2 => "turning downwind",
            PatternLeg::Downwind => "downwind",
            PatternLeg::Turn3 => "turning base",
            PatternLeg::Base => "base",
            PatternLeg::Turn4 => "turning final",
            PatternLeg::Final => "final",
            PatternLeg::LandingRoll => "landing roll",
            PatternLeg::Unknown => "unknown",
        }
    }

    /// Whether the aircraft is on the ground in this leg.
    pub fn is_ground_leg(&self) -> bool {
        matches!(self, PatternLeg::TakeoffRoll | PatternLeg::LandingRoll)
    }
}

impl std::fmt::Display for PatternLeg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PatternLeg::TakeoffRoll => "takeoff-roll",
            PatternLeg::Climbout => "climbout",
            PatternLeg::Turn1 => "turn1",
            PatternLeg::Crosswind => "crosswind",
            PatternLeg::Turn2 => "turn2",
            PatternLeg::Downwind => "downwind",
            PatternLeg::Turn3 => "turn3",
            PatternLeg::Base => "base",
            PatternLeg::Turn4 => "turn4",
            PatternLeg::Final => "final",
            PatternLeg::LandingRoll => "landing-roll",
            PatternLeg::Unknown => "unknown",
        };
        write!(f, "{}", name)
    }
}

/// How a circuit ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum LandingKind {
    FullStop,
    StopAndGo,
    TouchAndGo,
    #[default]
    Unknown,
}

impl std::fmt::Display for LandingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LandingKind::FullStop => write!(f, "full stop"),
            LandingKind::StopAndGo => write!(f, "stop and go"),
            LandingKind::TouchAndGo => write!(f, "touch and go"),
            LandingKind::Unknown => write!(f, "unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_description() {
        assert_eq!(PatternLeg::Turn4.to_string(), "turn4");
        assert_eq!(PatternLeg::Turn4.description(), "turning final");
        assert_eq!(OperationKind::StraightIn.to_string(), "straight-in");
        assert_eq!(LandingKind::TouchAndGo.to_string(), "touch and go");
    }

    #[test]
    fn test_ground_legs() {
        assert!(PatternLeg::TakeoffRoll.is_ground_leg());
        assert!(PatternLeg::LandingRoll.is_ground_leg());
        assert!(!PatternLeg::Final.is_ground_leg());
    }

    #[test]
    fn test_defaults_are_unknown() {
        assert_eq!(PatternLeg::default(), PatternLeg::Unknown);
        assert_eq!(OperationKind::default(), OperationKind::Unknown);
        assert_eq!(LandingKind::default(), LandingKind::Unknown);
    }
}
