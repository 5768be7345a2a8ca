//! VFRTraffic - Airport traffic control and VFR traffic pattern simulation
//!
//! This library simulates light aircraft flying the traffic pattern at an
//! airport together with the controllers that sequence them: a ground
//! taxi pathfinder, a runway scheduler (tower) and a per-aircraft
//! traffic-pattern state machine.
//!
//! # High-Level API
//!
//! The [`traffic`] module ties everything together:
//!
//! ```
//! use vfrtraffic::config::Config;
//! use vfrtraffic::context::SimContext;
//! use vfrtraffic::traffic::TrafficManager;
//!
//! let config = Config::default();
//! let mut manager = TrafficManager::new(SimContext::from_config(&config));
//! manager.activate_airport(&config.airport.ident, None).unwrap();
//! manager.generate_traffic(&config.airport.ident, &config.traffic).unwrap();
//!
//! for _ in 0..10 {
//!     for message in manager.tick(config.simulation.time_step_s) {
//!         println!("{}", message);
//!     }
//! }
//! ```

pub mod aircraft;
pub mod atc;
pub mod config;
pub mod context;
pub mod environment;
pub mod geo;
pub mod ground;
pub mod runway;
pub mod traffic;

/// Version of the VFRTraffic library and CLI.
///
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
