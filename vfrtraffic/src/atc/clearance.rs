//! Radio traffic between controllers and aircraft.
//!
//! Every message carries plain text for display plus, where the receiver
//! must act on it, a machine-readable event.

use serde::Serialize;

use crate::aircraft::{LandingKind, OperationKind};

/// Which controller position is talking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Station {
    Tower,
    Ground,
}

impl std::fmt::Display for Station {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Station::Tower => write!(f, "tower"),
            Station::Ground => write!(f, "ground"),
        }
    }
}

/// Instruction from a controller to one aircraft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ClearanceEvent {
    /// Taxi from parking to the hold short.
    TaxiCleared,
    /// Change to the tower frequency.
    ContactTower,
    /// Line up and wait on the runway.
    LineUp,
    /// Take off; `immediate` when arriving traffic is close.
    Takeoff { immediate: bool },
    /// Change to the ground frequency after landing.
    ContactGround,
    /// Taxi to parking on the tower frequency.
    TaxiToParking,
    ClearedToLand,
    GoAround,
    /// Join on a straight-in final.
    StraightIn,
    /// Join the downwind leg.
    DownwindEntry,
    /// Remain at the hold short.
    HoldPosition,
    /// The aircraft has left the controlled airspace.
    ClearOfAirspace,
}

impl ClearanceEvent {
    /// Get a human-readable description.
    pub fn description(&self) -> &'static str {
        match self {
            ClearanceEvent::TaxiCleared => "taxi clearance",
            ClearanceEvent::ContactTower => "contact tower",
            ClearanceEvent::LineUp => "line up and wait",
            ClearanceEvent::Takeoff { immediate: true } => "immediate take-off clearance",
            ClearanceEvent::Takeoff { immediate: false } => "take-off clearance",
            ClearanceEvent::ContactGround => "contact ground",
            ClearanceEvent::TaxiToParking => "taxi to parking",
            ClearanceEvent::ClearedToLand => "landing clearance",
            ClearanceEvent::GoAround => "go around",
            ClearanceEvent::StraightIn => "straight-in approach",
            ClearanceEvent::DownwindEntry => "downwind entry",
            ClearanceEvent::HoldPosition => "hold position",
            ClearanceEvent::ClearOfAirspace => "clear of airspace",
        }
    }
}

/// A controller transmission addressed to one aircraft.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transmission {
    pub station: Station,
    /// Addressee.
    pub callsign: String,
    pub text: String,
    pub event: Option<ClearanceEvent>,
}

impl Transmission {
    /// A transmission that carries an instruction.
    pub fn instruct(
        station: Station,
        callsign: impl Into<String>,
        text: impl Into<String>,
        event: ClearanceEvent,
    ) -> Self {
        Self {
            station,
            callsign: callsign.into(),
            text: text.into(),
            event: Some(event),
        }
    }

    /// A transmission with no required action.
    pub fn inform(station: Station, callsign: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            station,
            callsign: callsign.into(),
            text: text.into(),
            event: None,
        }
    }
}

/// Report or request from an aircraft to a controller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PilotCall {
    /// Ground: parked and ready to taxi.
    RequestTaxi,
    /// Ground: reached the hold short.
    ReadyAtHoldShort,
    /// Tower: first contact at the hold short.
    AtHoldShort {
        operation: OperationKind,
        landing: LandingKind,
    },
    /// Tower: ready for departure while lined up or holding.
    RequestTakeoff,
    /// Tower: first contact by arriving VFR traffic.
    VfrArrival,
    ReportDownwind,
    ReportFinal,
    GoingAround,
    RunwayVacated,
    /// Left a controller's frequency.
    LeavingFrequency(Station),
    /// Readback or acknowledgement; text only.
    Readback,
    /// Done at this airport; the aircraft may be removed.
    RemoveSelf,
}

/// A pilot transmission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PilotMessage {
    pub callsign: String,
    pub call: PilotCall,
    pub text: String,
}

impl PilotMessage {
    pub fn new(callsign: impl Into<String>, call: PilotCall, text: impl Into<String>) -> Self {
        Self {
            callsign: callsign.into(),
            call,
            text: text.into(),
        }
    }
}

/// Spoken digits for runway idents and frequencies ("25" → "two-five").
pub fn spoken_digits(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '0' => "zero".to_string(),
            '1' => "one".to_string(),
            '2' => "two".to_string(),
            '3' => "three".to_string(),
            '4' => "four".to_string(),
            '5' => "five".to_string(),
            '6' => "six".to_string(),
            '7' => "seven".to_string(),
            '8' => "eight".to_string(),
            '9' => "niner".to_string(),
            'L' => "left".to_string(),
            'R' => "right".to_string(),
            'C' => "center".to_string(),
            '.' => "decimal".to_string(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// NATO phonetic word for a letter.
pub fn phonetic(c: char) -> &'static str {
    match c.to_ascii_uppercase() {
        'A' => "Alpha",
        'B' => "Bravo",
        'C' => "Charlie",
        'D' => "Delta",
        'E' => "Echo",
        'F' => "Foxtrot",
        'G' => "Golf",
        'H' => "Hotel",
        'I' => "India",
        'J' => "Juliet",
        'K' => "Kilo",
        'L' => "Lima",
        'M' => "Mike",
        'N' => "November",
        'O' => "Oscar",
        'P' => "Papa",
        'Q' => "Quebec",
        'R' => "Romeo",
        'S' => "Sierra",
        'T' => "Tango",
        'U' => "Uniform",
        'V' => "Victor",
        'W' => "Whiskey",
        'X' => "X-ray",
        'Y' => "Yankee",
        _ => "Zulu",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spoken_digits() {
        assert_eq!(spoken_digits("25"), "two-five");
        assert_eq!(spoken_digits("07L"), "zero-seven-left");
        assert_eq!(spoken_digits("118.5"), "one-one-eight-decimal-five");
        assert_eq!(spoken_digits("9"), "niner");
    }

    #[test]
    fn test_phonetic() {
        assert_eq!(phonetic('a'), "Alpha");
        assert_eq!(phonetic('X'), "X-ray");
        assert_eq!(phonetic('Z'), "Zulu");
    }

    #[test]
    fn test_transmission_constructors() {
        let t = Transmission::instruct(Station::Tower, "N123AB", "cleared to land", ClearanceEvent::ClearedToLand);
        assert_eq!(t.event, Some(ClearanceEvent::ClearedToLand));
        let t = Transmission::inform(Station::Ground, "N123AB", "roger");
        assert!(t.event.is_none());
        assert_eq!(ClearanceEvent::Takeoff { immediate: true }.description(), "immediate take-off clearance");
    }
}
