//! Geographic primitives and runway-local projection.
//!
//! Everything the traffic model does happens in one of two frames:
//!
//! ```text
//! Geodetic:   latitude/longitude in degrees, elevation in metres
//! Local:      metres relative to the active runway threshold
//!             +y along the runway heading, +x to the right of it
//! ```
//!
//! The [`RunwayProjection`] converts between them. The [`Geodesy`]
//! trait supplies great-circle distance, bearing and direct positions
//! for code that works in the geodetic frame.

mod geodesy;
mod projection;

pub use geodesy::{Geodesy, SphericalEarth};
pub use projection::RunwayProjection;

use serde::Serialize;

/// Equatorial radius used by the local projection (metres).
pub const EQUATORIAL_RADIUS_M: f64 = 6_378_138.12;

/// Knots to metres per second.
pub const KT_TO_MPS: f64 = 0.514444;

/// Feet to metres.
pub const FT_TO_M: f64 = 0.3048;

/// Metres to feet.
pub const M_TO_FT: f64 = 1.0 / FT_TO_M;

/// A "mile" as used by tower phraseology (metres).
pub const MILE_M: f64 = 1600.0;

/// Nautical mile (metres).
pub const NM_TO_M: f64 = 1852.0;

/// A geodetic position.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct GeoPoint {
    /// Latitude in degrees.
    pub lat_deg: f64,
    /// Longitude in degrees.
    pub lon_deg: f64,
    /// Elevation above mean sea level in metres.
    pub elev_m: f64,
}

impl GeoPoint {
    /// Create a new geodetic position.
    pub fn new(lat_deg: f64, lon_deg: f64, elev_m: f64) -> Self {
        Self {
            lat_deg,
            lon_deg,
            elev_m,
        }
    }

    /// Return a copy with a different elevation.
    pub fn with_elevation(self, elev_m: f64) -> Self {
        Self { elev_m, ..self }
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:.5}, {:.5} @ {:.0}m",
            self.lat_deg, self.lon_deg, self.elev_m
        )
    }
}

/// A position in the runway-local frame (metres).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct LocalPoint {
    /// Distance right of the runway centreline.
    pub x: f64,
    /// Distance along the runway heading from the threshold.
    pub y: f64,
    /// Elevation, carried through the projection unchanged.
    pub z: f64,
}

impl LocalPoint {
    /// Create a new local position.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Horizontal distance to another local point.
    pub fn horizontal_distance(&self, other: &LocalPoint) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Normalize a heading to the range [0, 360).
#[inline]
pub fn normalize_heading(heading: f64) -> f64 {
    let h = heading % 360.0;
    if h < 0.0 {
        h + 360.0
    } else {
        h
    }
}

/// Signed difference `to - from` in the range (-180, 180].
///
/// Positive means `to` lies clockwise of `from`.
#[inline]
pub fn heading_difference(from: f64, to: f64) -> f64 {
    let mut diff = normalize_heading(to) - normalize_heading(from);
    if diff > 180.0 {
        diff -= 360.0;
    } else if diff <= -180.0 {
        diff += 360.0;
    }
    diff
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_heading() {
        assert!((normalize_heading(0.0) - 0.0).abs() < 1e-9);
        assert!((normalize_heading(360.0) - 0.0).abs() < 1e-9);
        assert!((normalize_heading(-90.0) - 270.0).abs() < 1e-9);
        assert!((normalize_heading(450.0) - 90.0).abs() < 1e-9);
        assert!((normalize_heading(-450.0) - 270.0).abs() < 1e-9);
    }

    #[test]
    fn test_heading_difference_sign_and_wrap() {
        assert!((heading_difference(80.0, 90.0) - 10.0).abs() < 1e-9);
        assert!((heading_difference(90.0, 80.0) + 10.0).abs() < 1e-9);
        assert!((heading_difference(350.0, 10.0) - 20.0).abs() < 1e-9);
        assert!((heading_difference(10.0, 350.0) + 20.0).abs() < 1e-9);
        assert!((heading_difference(0.0, 180.0) - 180.0).abs() < 1e-9);
        assert!((heading_difference(180.0, 0.0) - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_local_horizontal_distance_ignores_elevation() {
        let a = LocalPoint::new(0.0, 0.0, 100.0);
        let b = LocalPoint::new(3.0, 4.0, -50.0);
        assert!((a.horizontal_distance(&b) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_geo_point_display() {
        let p = GeoPoint::new(51.5, -0.12, 25.0);
        assert_eq!(p.to_string(), "51.50000, -0.12000 @ 25m");
    }
}
