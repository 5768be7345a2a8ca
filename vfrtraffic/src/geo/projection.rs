//! Runway-aligned local projection.
//!
//! A flat approximation valid within a few tens of kilometres of the
//! origin, which is all the traffic pattern ever needs.
//!
//! # Transform
//!
//! ```text
//! y0 = sin(dlat) * R
//! x0 = sin(dlon) * R * cos(lat0)
//! x  = x0*cos(hdg) - y0*sin(hdg)
//! y  = x0*sin(hdg) + y0*cos(hdg)
//! ```

use super::{GeoPoint, LocalPoint, EQUATORIAL_RADIUS_M};

/// Projection between geodetic positions and a runway-local plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunwayProjection {
    origin: GeoPoint,
    heading_deg: f64,
    sin_hdg: f64,
    cos_hdg: f64,
    cos_lat0: f64,
}

impl Default for RunwayProjection {
    fn default() -> Self {
        Self::new(GeoPoint::default(), 0.0)
    }
}

impl RunwayProjection {
    /// Create a projection centred on `origin` with +y along `heading_deg`.
    pub fn new(origin: GeoPoint, heading_deg: f64) -> Self {
        let mut projection = Self {
            origin,
            heading_deg: 0.0,
            sin_hdg: 0.0,
            cos_hdg: 1.0,
            cos_lat0: 1.0,
        };
        projection.init(origin, heading_deg);
        projection
    }

    /// Re-centre the projection, e.g. after a runway change.
    pub fn init(&mut self, origin: GeoPoint, heading_deg: f64) {
        let theta = heading_deg.to_radians();
        self.origin = origin;
        self.heading_deg = heading_deg;
        self.sin_hdg = theta.sin();
        self.cos_hdg = theta.cos();
        self.cos_lat0 = origin.lat_deg.to_radians().cos();
    }

    /// The projection origin.
    pub fn origin(&self) -> GeoPoint {
        self.origin
    }

    /// Heading of the local +y axis.
    pub fn heading_deg(&self) -> f64 {
        self.heading_deg
    }

    /// Convert a geodetic position to local metres.
    #[inline]
    pub fn to_local(&self, point: &GeoPoint) -> LocalPoint {
        let dlat = (point.lat_deg - self.origin.lat_deg).to_radians();
        let dlon = (point.lon_deg - self.origin.lon_deg).to_radians();

        let y0 = dlat.sin() * EQUATORIAL_RADIUS_M;
        let x0 = dlon.sin() * EQUATORIAL_RADIUS_M * self.cos_lat0;

        LocalPoint {
            x: x0 * self.cos_hdg - y0 * self.sin_hdg,
            y: x0 * self.sin_hdg + y0 * self.cos_hdg,
            z: point.elev_m,
        }
    }

    /// Convert local metres back to a geodetic position.
    #[inline]
    pub fn from_local(&self, local: &LocalPoint) -> GeoPoint {
        // Inverse rotation by -heading
        let x0 = local.x * self.cos_hdg + local.y * self.sin_hdg;
        let y0 = -local.x * self.sin_hdg + local.y * self.cos_hdg;

        let dlat = (y0 / EQUATORIAL_RADIUS_M).clamp(-1.0, 1.0).asin();
        let dlon = (x0 / (EQUATORIAL_RADIUS_M * self.cos_lat0))
            .clamp(-1.0, 1.0)
            .asin();

        GeoPoint {
            lat_deg: self.origin.lat_deg + dlat.to_degrees(),
            lon_deg: self.origin.lon_deg + dlon.to_degrees(),
            elev_m: local.z,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn projection(heading: f64) -> RunwayProjection {
        RunwayProjection::new(GeoPoint::new(51.0, -1.0, 100.0), heading)
    }

    #[test]
    fn test_origin_maps_to_zero() {
        let p = projection(37.0);
        let local = p.to_local(&GeoPoint::new(51.0, -1.0, 100.0));
        assert!(local.x.abs() < 1e-9);
        assert!(local.y.abs() < 1e-9);
        assert!((local.z - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_north_runway_axes() {
        let p = projection(0.0);
        let north = p.to_local(&GeoPoint::new(51.01, -1.0, 0.0));
        assert!(north.y > 1000.0);
        assert!(north.x.abs() < 1e-6);

        let east = p.to_local(&GeoPoint::new(51.0, -0.99, 0.0));
        assert!(east.x > 500.0);
        assert!(east.y.abs() < 1e-6);
    }

    #[test]
    fn test_east_runway_puts_north_on_the_left() {
        let p = projection(90.0);
        let north = p.to_local(&GeoPoint::new(51.01, -1.0, 0.0));
        assert!(north.x < -1000.0);
        assert!(north.y.abs() < 1e-6);

        let east = p.to_local(&GeoPoint::new(51.0, -0.99, 0.0));
        assert!(east.y > 500.0);
    }

    #[test]
    fn test_reinit_changes_origin() {
        let mut p = projection(0.0);
        let other = GeoPoint::new(52.0, 0.0, 0.0);
        p.init(other, 180.0);
        assert_eq!(p.origin(), other);
        let local = p.to_local(&GeoPoint::new(52.01, 0.0, 0.0));
        assert!(local.y < -1000.0);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_roundtrip_within_tolerance(
                lat in -70.0..70.0_f64,
                lon in -179.0..179.0_f64,
                heading in 0.0..360.0_f64,
                x in -20_000.0..20_000.0_f64,
                y in -20_000.0..20_000.0_f64,
            ) {
                let p = RunwayProjection::new(GeoPoint::new(lat, lon, 0.0), heading);
                let geo = p.from_local(&LocalPoint::new(x, y, 12.0));
                let back = p.to_local(&geo);
                let again = p.from_local(&back);

                prop_assert!((geo.lat_deg - again.lat_deg).abs() < 1e-6);
                prop_assert!((geo.lon_deg - again.lon_deg).abs() < 1e-6);
                prop_assert!((back.x - x).abs() < 0.01);
                prop_assert!((back.y - y).abs() < 0.01);
                prop_assert!((back.z - 12.0).abs() < 1e-9);
            }
        }
    }
}
