//! Shared simulation context.
//!
//! Everything an aircraft or controller needs from the outside world is
//! reached through [`SimContext`]: geodesy, terrain, runways, wind and the
//! loaded configuration. The context is passed explicitly; there are no
//! process-wide singletons.

use std::sync::Arc;

use crate::config::Config;
use crate::environment::{
    ElevationSource, FlatTerrain, RunwayProvider, StaticRunways, SteadyWind, WindSource,
};
use crate::geo::{Geodesy, SphericalEarth};

/// Handles to the host collaborators plus configuration.
#[derive(Clone)]
pub struct SimContext {
    pub geodesy: Arc<dyn Geodesy>,
    pub elevation: Arc<dyn ElevationSource>,
    pub runways: Arc<dyn RunwayProvider>,
    pub wind: Arc<dyn WindSource>,
    pub config: Config,
}

impl SimContext {
    /// Create a context from explicit collaborators.
    pub fn new(
        geodesy: Arc<dyn Geodesy>,
        elevation: Arc<dyn ElevationSource>,
        runways: Arc<dyn RunwayProvider>,
        wind: Arc<dyn WindSource>,
        config: Config,
    ) -> Self {
        Self {
            geodesy,
            elevation,
            runways,
            wind,
            config,
        }
    }

    /// Build a self-contained context from a configuration file.
    ///
    /// Terrain is flat at the field elevation, the configured runway is the
    /// only known runway and the wind is steady.
    pub fn from_config(config: &Config) -> Self {
        let runways =
            StaticRunways::new().with_runway(config.airport.ident.clone(), config.runway_record());
        Self::new(
            Arc::new(SphericalEarth),
            Arc::new(FlatTerrain::new(config.airport.elevation_m())),
            Arc::new(runways),
            Arc::new(SteadyWind::new(config.wind.from_deg, config.wind.speed_kt)),
            config.clone(),
        )
    }
}

impl std::fmt::Debug for SimContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimContext")
            .field("airport", &self.config.airport.ident)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoPoint;

    #[test]
    fn test_from_config_knows_configured_runway() {
        let config = Config::default();
        let ctx = SimContext::from_config(&config);

        let record = ctx.runways.active_runway("khaf").expect("runway");
        assert_eq!(record.ident, "30");
        assert!(ctx.runways.active_runway("KSFO").is_none());
    }

    #[test]
    fn test_from_config_environment() {
        let config = Config::default();
        let ctx = SimContext::from_config(&config);
        let p = GeoPoint::new(37.5, -122.5, 0.0);

        let elev = ctx.elevation.elevation_m(&p).unwrap();
        assert!((elev - config.airport.elevation_m()).abs() < 1e-9);
        assert_eq!(ctx.wind.wind_at(&p).speed_kt, 8.0);
    }
}
