//! Settings structs for each section of `config.ini`.

use std::path::PathBuf;

use crate::atc::AtcConfig;
use crate::environment::RunwayRecord;
use crate::geo::{GeoPoint, FT_TO_M};

// =============================================================================
// Defaults
// =============================================================================

/// Default simulation step (seconds).
pub const DEFAULT_TIME_STEP_S: f64 = 0.5;

/// Default simulated duration (seconds).
pub const DEFAULT_DURATION_S: f64 = 1800.0;

/// Default interval between status lines (seconds).
pub const DEFAULT_STATUS_INTERVAL_S: f64 = 60.0;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Valid log levels for `[logging] level`.
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

// =============================================================================
// Sections
// =============================================================================

/// `[simulation]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationSettings {
    /// Seconds advanced per tick.
    pub time_step_s: f64,
    /// Total simulated time for `run`.
    pub duration_s: f64,
    /// Seed for callsigns, traffic generation and gate allocation.
    pub seed: u64,
    /// Seconds between status reports.
    pub status_interval_s: f64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            time_step_s: DEFAULT_TIME_STEP_S,
            duration_s: DEFAULT_DURATION_S,
            seed: 0,
            status_interval_s: DEFAULT_STATUS_INTERVAL_S,
        }
    }
}

/// `[airport]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct AirportSettings {
    pub ident: String,
    pub name: String,
    /// Latitude of the runway centre.
    pub latitude: f64,
    /// Longitude of the runway centre.
    pub longitude: f64,
    pub elevation_ft: f64,
    /// Ground network file; the airport runs in degraded mode without one.
    pub ground_network: Option<PathBuf>,
    /// Whether a separate ground controller handles taxiing traffic.
    pub separate_ground: bool,
}

impl Default for AirportSettings {
    fn default() -> Self {
        Self {
            ident: "KHAF".to_string(),
            name: "Half Moon Bay".to_string(),
            latitude: 37.5134,
            longitude: -122.5011,
            elevation_ft: 66.0,
            ground_network: None,
            separate_ground: true,
        }
    }
}

impl AirportSettings {
    /// Field elevation in metres.
    pub fn elevation_m(&self) -> f64 {
        self.elevation_ft * FT_TO_M
    }
}

/// `[runway]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct RunwaySettings {
    pub ident: String,
    pub heading_deg: f64,
    pub length_m: f64,
    pub width_m: f64,
}

impl Default for RunwaySettings {
    fn default() -> Self {
        Self {
            ident: "30".to_string(),
            heading_deg: 300.0,
            length_m: 1524.0,
            width_m: 46.0,
        }
    }
}

/// `[wind]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct WindSettings {
    pub from_deg: f64,
    pub speed_kt: f64,
}

impl Default for WindSettings {
    fn default() -> Self {
        Self {
            from_deg: 300.0,
            speed_kt: 8.0,
        }
    }
}

/// `[traffic]` section: the initial traffic mix.
#[derive(Debug, Clone, PartialEq)]
pub struct TrafficConfig {
    /// Aircraft parked at gates, requesting taxi for circuits.
    pub parked: u32,
    /// Aircraft already established in the circuit.
    pub in_pattern: u32,
    /// Inbound VFR arrivals.
    pub arrivals: u32,
    /// Parked aircraft that will depart the area.
    pub departures: u32,
    /// Circuits flown by local traffic before a full stop.
    pub circuits: u32,
    /// Local traffic flies touch-and-goes rather than stop-and-goes.
    pub touch_and_go: bool,
    /// Arrival spacing level, 1 (sparse) to 3 (dense).
    pub density: u8,
}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            parked: 2,
            in_pattern: 1,
            arrivals: 2,
            departures: 1,
            circuits: 3,
            touch_and_go: true,
            density: 2,
        }
    }
}

impl TrafficConfig {
    /// Total aircraft requested.
    pub fn total(&self) -> u32 {
        self.parked + self.in_pattern + self.arrivals + self.departures
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

// =============================================================================
// Config
// =============================================================================

/// Complete contents of `config.ini`.
///
/// Every field has a default, so a missing file or a file with only a few
/// keys still yields a usable configuration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Config {
    pub simulation: SimulationSettings,
    pub airport: AirportSettings,
    pub runway: RunwaySettings,
    pub wind: WindSettings,
    pub traffic: TrafficConfig,
    pub atc: AtcConfig,
    pub logging: LoggingSettings,
}

impl Config {
    /// The configured runway as an airport database record.
    pub fn runway_record(&self) -> RunwayRecord {
        RunwayRecord {
            ident: self.runway.ident.clone(),
            center: GeoPoint::new(
                self.airport.latitude,
                self.airport.longitude,
                self.airport.elevation_m(),
            ),
            heading_deg: self.runway.heading_deg,
            length_m: self.runway.length_m,
            width_m: self.runway.width_m,
        }
    }

    /// Controller settings with the simulation seed and ground split applied.
    pub fn atc_config(&self) -> AtcConfig {
        self.atc
            .clone()
            .with_seed(self.simulation.seed)
            .with_separate_ground(self.airport.separate_ground)
    }

    /// Set the simulation seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.simulation.seed = seed;
        self
    }

    /// Set the simulated duration.
    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.simulation.duration_s = seconds;
        self
    }

    /// Set the tick length.
    pub fn with_time_step(mut self, seconds: f64) -> Self {
        self.simulation.time_step_s = seconds;
        self
    }

    /// Set the ground network file.
    pub fn with_ground_network(mut self, path: impl Into<PathBuf>) -> Self {
        self.airport.ground_network = Some(path.into());
        self
    }
}
