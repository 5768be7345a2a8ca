//! Great-circle geodesy collaborator.

use super::{normalize_heading, GeoPoint};

/// Mean Earth radius for great-circle computations (metres).
const MEAN_EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Geodesic calculations consumed by the traffic model.
///
/// Implementations must be cheap to call; the pathfinder and every
/// aircraft query them on each tick.
pub trait Geodesy: Send + Sync {
    /// Horizontal distance between two positions in metres.
    fn distance_m(&self, from: &GeoPoint, to: &GeoPoint) -> f64;

    /// Initial bearing from `from` to `to` in degrees [0, 360).
    fn bearing_deg(&self, from: &GeoPoint, to: &GeoPoint) -> f64;

    /// Position reached by travelling `distance_m` along `bearing_deg`.
    ///
    /// The elevation of `from` is carried over.
    fn direct(&self, from: &GeoPoint, bearing_deg: f64, distance_m: f64) -> GeoPoint;
}

/// Spherical-earth geodesy (haversine distance, spherical direct problem).
#[derive(Debug, Clone, Copy, Default)]
pub struct SphericalEarth;

impl Geodesy for SphericalEarth {
    fn distance_m(&self, from: &GeoPoint, to: &GeoPoint) -> f64 {
        let lat1 = from.lat_deg.to_radians();
        let lat2 = to.lat_deg.to_radians();
        let dlat = lat2 - lat1;
        let dlon = (to.lon_deg - from.lon_deg).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * MEAN_EARTH_RADIUS_M * a.sqrt().min(1.0).asin()
    }

    fn bearing_deg(&self, from: &GeoPoint, to: &GeoPoint) -> f64 {
        let lat1 = from.lat_deg.to_radians();
        let lat2 = to.lat_deg.to_radians();
        let dlon = (to.lon_deg - from.lon_deg).to_radians();

        let y = dlon.sin() * lat2.cos();
        let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
        normalize_heading(y.atan2(x).to_degrees())
    }

    fn direct(&self, from: &GeoPoint, bearing_deg: f64, distance_m: f64) -> GeoPoint {
        let lat1 = from.lat_deg.to_radians();
        let lon1 = from.lon_deg.to_radians();
        let brg = bearing_deg.to_radians();
        let delta = distance_m / MEAN_EARTH_RADIUS_M;

        let lat2 = (lat1.sin() * delta.cos() + lat1.cos() * delta.sin() * brg.cos())
            .clamp(-1.0, 1.0)
            .asin();
        let lon2 = lon1
            + (brg.sin() * delta.sin() * lat1.cos()).atan2(delta.cos() - lat1.sin() * lat2.sin());

        let mut lon_deg = lon2.to_degrees();
        if lon_deg > 180.0 {
            lon_deg -= 360.0;
        } else if lon_deg < -180.0 {
            lon_deg += 360.0;
        }

        GeoPoint::new(lat2.to_degrees(), lon_deg, from.elev_m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_degree_of_latitude() {
        let d = SphericalEarth.distance_m(&GeoPoint::new(0.0, 0.0, 0.0), &GeoPoint::new(1.0, 0.0, 0.0));
        assert!((d - 111_195.0).abs() < 10.0, "got {}", d);
    }

    #[test]
    fn test_cardinal_bearings() {
        let origin = GeoPoint::new(10.0, 10.0, 0.0);
        let earth = SphericalEarth;
        assert!(earth.bearing_deg(&origin, &GeoPoint::new(11.0, 10.0, 0.0)).abs() < 1e-6);
        assert!((earth.bearing_deg(&origin, &GeoPoint::new(10.0, 11.0, 0.0)) - 90.0).abs() < 0.2);
        assert!((earth.bearing_deg(&origin, &GeoPoint::new(9.0, 10.0, 0.0)) - 180.0).abs() < 1e-6);
        assert!((earth.bearing_deg(&origin, &GeoPoint::new(10.0, 9.0, 0.0)) - 270.0).abs() < 0.2);
    }

    #[test]
    fn test_direct_inverts_distance_and_bearing() {
        let earth = SphericalEarth;
        let origin = GeoPoint::new(47.5, 8.5, 420.0);
        let dest = earth.direct(&origin, 123.0, 5_000.0);

        assert!((earth.distance_m(&origin, &dest) - 5_000.0).abs() < 0.01);
        assert!((earth.bearing_deg(&origin, &dest) - 123.0).abs() < 0.01);
        assert!((dest.elev_m - 420.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_distance() {
        let p = GeoPoint::new(-33.9, 151.2, 0.0);
        assert!(SphericalEarth.distance_m(&p, &p).abs() < 1e-9);
    }
}
