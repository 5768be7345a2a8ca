//! Active runway geometry.
//!
//! Derived once from a [`RunwayRecord`] when an airport is activated or
//! its runway changes. The threshold is the origin of the local frame.
//!
//! ```text
//!            takeoff end (0, L-50)
//!                 |
//!   threshold ----+---- centre moved back by L/2 - 25 along the reciprocal
//!                (0, 0)
//! ```

use serde::Serialize;

use crate::environment::RunwayRecord;
use crate::geo::{normalize_heading, GeoPoint, Geodesy, LocalPoint, RunwayProjection};

/// Distance from each physical runway end to the usable threshold (metres).
const THRESHOLD_INSET_M: f64 = 25.0;

/// Longitudinal slack when deciding whether an aircraft is on the runway.
const OCCUPANCY_SLACK_M: f64 = 5.0;

/// Side of the runway on which the traffic pattern is flown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum PatternDirection {
    /// Left-hand circuit (the default).
    #[default]
    Left,
    /// Right-hand circuit.
    Right,
}

impl PatternDirection {
    /// Derive the pattern side from a runway ident.
    ///
    /// Only a three-character ident ending in `R` flies right-hand circuits.
    pub fn from_ident(ident: &str) -> Self {
        if ident.len() == 3 && ident.ends_with('R') {
            PatternDirection::Right
        } else {
            PatternDirection::Left
        }
    }

    /// Sign of the local x-axis the pattern lies on (+1 right, -1 left).
    #[inline]
    pub fn sign(&self) -> f64 {
        match self {
            PatternDirection::Left => -1.0,
            PatternDirection::Right => 1.0,
        }
    }
}

impl std::fmt::Display for PatternDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PatternDirection::Left => write!(f, "left"),
            PatternDirection::Right => write!(f, "right"),
        }
    }
}

/// The runway currently in use at an airport.
#[derive(Debug, Clone)]
pub struct ActiveRunway {
    ident: String,
    threshold: GeoPoint,
    takeoff_end: GeoPoint,
    heading_deg: f64,
    length_m: f64,
    width_m: f64,
    pattern_direction: PatternDirection,
    projection: RunwayProjection,
}

impl ActiveRunway {
    /// Build the active runway state from a database record.
    pub fn from_record(record: &RunwayRecord, geodesy: &dyn Geodesy) -> Self {
        let inset = record.length_m / 2.0 - THRESHOLD_INSET_M;
        let reciprocal = normalize_heading(record.heading_deg + 180.0);

        let threshold = geodesy
            .direct(&record.center, reciprocal, inset)
            .with_elevation(record.center.elev_m);
        let takeoff_end = geodesy
            .direct(&record.center, record.heading_deg, inset)
            .with_elevation(record.center.elev_m);

        Self {
            ident: record.ident.clone(),
            threshold,
            takeoff_end,
            heading_deg: record.heading_deg,
            length_m: record.length_m,
            width_m: record.width_m,
            pattern_direction: PatternDirection::from_ident(&record.ident),
            projection: RunwayProjection::new(threshold, record.heading_deg),
        }
    }

    /// Runway designator.
    pub fn ident(&self) -> &str {
        &self.ident
    }

    /// Runway number parsed from the leading digits of the ident (`07L` → 7).
    pub fn number(&self) -> Option<u32> {
        runway_number(&self.ident)
    }

    /// Threshold position; also the local frame origin.
    pub fn threshold(&self) -> GeoPoint {
        self.threshold
    }

    /// Far end of the usable runway.
    pub fn takeoff_end(&self) -> GeoPoint {
        self.takeoff_end
    }

    /// Runway heading in degrees.
    pub fn heading_deg(&self) -> f64 {
        self.heading_deg
    }

    /// Runway length in metres.
    pub fn length_m(&self) -> f64 {
        self.length_m
    }

    /// Runway width in metres.
    pub fn width_m(&self) -> f64 {
        self.width_m
    }

    /// Field elevation in metres.
    pub fn elevation_m(&self) -> f64 {
        self.threshold.elev_m
    }

    /// Circuit side.
    pub fn pattern_direction(&self) -> PatternDirection {
        self.pattern_direction
    }

    /// Local projection centred on the threshold.
    pub fn projection(&self) -> &RunwayProjection {
        &self.projection
    }

    /// Project a geodetic position into the runway frame.
    #[inline]
    pub fn to_local(&self, point: &GeoPoint) -> LocalPoint {
        self.projection.to_local(point)
    }

    /// Convert a runway-frame position to geodetic.
    #[inline]
    pub fn from_local(&self, local: &LocalPoint) -> GeoPoint {
        self.projection.from_local(local)
    }

    /// Whether a local position lies on the runway surface.
    pub fn contains(&self, local: &LocalPoint) -> bool {
        let end = self.to_local(&self.takeoff_end);
        let xc = end.x / 2.0;
        let yc = end.y / 2.0;
        (local.y - yc).abs() < self.length_m / 2.0 + OCCUPANCY_SLACK_M
            && (local.x - xc).abs() < self.width_m / 2.0
    }
}

/// Parse the runway number from the leading digits of an ident.
pub fn runway_number(ident: &str) -> Option<u32> {
    let digits: String = ident
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}
