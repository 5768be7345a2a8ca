//! Collaborators supplied by the host simulation.
//!
//! The traffic model never owns terrain, weather or airport databases.
//! It reads them through these traits, which the host implements. The
//! static implementations here back the CLI and the tests.

use std::collections::HashMap;

use serde::Serialize;

use crate::geo::GeoPoint;

/// Ground elevation lookup.
pub trait ElevationSource: Send + Sync {
    /// Ground elevation in metres at `point`, or `None` if unavailable.
    ///
    /// Callers keep their last known value when this returns `None`.
    fn elevation_m(&self, point: &GeoPoint) -> Option<f64>;
}

/// Active runway lookup.
pub trait RunwayProvider: Send + Sync {
    /// The runway in use at `airport`, or `None` if the airport is unknown.
    fn active_runway(&self, airport: &str) -> Option<RunwayRecord>;
}

/// Surface wind lookup.
pub trait WindSource: Send + Sync {
    /// Wind at `point`.
    fn wind_at(&self, point: &GeoPoint) -> Wind;
}

/// Static description of a runway as published in an airport database.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunwayRecord {
    /// Runway designator, e.g. "25" or "07L".
    pub ident: String,
    /// Geometric centre of the runway; `elev_m` is the field elevation.
    pub center: GeoPoint,
    /// True heading of the runway in degrees.
    pub heading_deg: f64,
    /// Runway length in metres.
    pub length_m: f64,
    /// Runway width in metres.
    pub width_m: f64,
}

/// Wind vector.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Wind {
    /// Direction the wind is blowing from, degrees true.
    pub from_deg: f64,
    /// Wind speed in knots.
    pub speed_kt: f64,
}

impl Wind {
    /// Calm conditions.
    pub fn calm() -> Self {
        Self::default()
    }
}

/// Flat terrain at a fixed elevation.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatTerrain {
    elevation_m: f64,
}

impl FlatTerrain {
    /// Terrain at `elevation_m` everywhere.
    pub fn new(elevation_m: f64) -> Self {
        Self { elevation_m }
    }
}

impl ElevationSource for FlatTerrain {
    fn elevation_m(&self, _point: &GeoPoint) -> Option<f64> {
        Some(self.elevation_m)
    }
}

/// Fixed set of active runways keyed by airport ident.
#[derive(Debug, Clone, Default)]
pub struct StaticRunways {
    runways: HashMap<String, RunwayRecord>,
}

impl StaticRunways {
    /// Create an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the active runway for an airport.
    pub fn with_runway(mut self, airport: impl Into<String>, runway: RunwayRecord) -> Self {
        self.runways.insert(airport.into().to_uppercase(), runway);
        self
    }
}

impl RunwayProvider for StaticRunways {
    fn active_runway(&self, airport: &str) -> Option<RunwayRecord> {
        self.runways.get(&airport.to_uppercase()).cloned()
    }
}

/// Uniform, constant wind.
#[derive(Debug, Clone, Copy, Default)]
pub struct SteadyWind {
    wind: Wind,
}

impl SteadyWind {
    /// Wind from `from_deg` at `speed_kt` everywhere.
    pub fn new(from_deg: f64, speed_kt: f64) -> Self {
        Self {
            wind: Wind { from_deg, speed_kt },
        }
    }
}

impl WindSource for SteadyWind {
    fn wind_at(&self, _point: &GeoPoint) -> Wind {
        self.wind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> RunwayRecord {
        RunwayRecord {
            ident: "25".to_string(),
            center: GeoPoint::new(50.0, 8.0, 110.0),
            heading_deg: 250.0,
            length_m: 900.0,
            width_m: 20.0,
        }
    }

    #[test]
    fn test_static_runways_lookup_is_case_insensitive() {
        let provider = StaticRunways::new().with_runway("eddx", record());
        assert_eq!(provider.active_runway("EDDX"), Some(record()));
        assert_eq!(provider.active_runway("eddx"), Some(record()));
        assert!(provider.active_runway("KXYZ").is_none());
    }

    #[test]
    fn test_flat_terrain_and_steady_wind() {
        let p = GeoPoint::new(1.0, 2.0, 3.0);
        assert_eq!(FlatTerrain::new(42.0).elevation_m(&p), Some(42.0));
        let wind = SteadyWind::new(270.0, 12.0).wind_at(&p);
        assert_eq!(wind.from_deg, 270.0);
        assert_eq!(wind.speed_kt, 12.0);
        assert_eq!(Wind::calm().speed_kt, 0.0);
    }
}
