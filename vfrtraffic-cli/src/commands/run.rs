//! Run command - fast-forward a traffic simulation.
//!
//! Radio traffic is logged through `tracing`; stdout carries periodic
//! status lines, or one JSON object per status interval with `--json`.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Args;
use tracing::info;
use vfrtraffic::atc::AircraftSnapshot;
use vfrtraffic::config::Config;
use vfrtraffic::context::SimContext;
use vfrtraffic::geo::M_TO_FT;
use vfrtraffic::traffic::TrafficManager;

use crate::error::CliError;

/// Arguments for `vfrtraffic run`.
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Config file (default: ~/.vfrtraffic/config.ini)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Simulated seconds to run
    #[arg(long)]
    pub duration: Option<f64>,

    /// Seconds per tick
    #[arg(long)]
    pub step: Option<f64>,

    /// Random seed for callsigns and traffic
    #[arg(long)]
    pub seed: Option<u64>,

    /// Print status as JSON lines
    #[arg(long)]
    pub json: bool,

    /// Ground network file (overrides [airport] ground_network)
    #[arg(long)]
    pub network: Option<PathBuf>,
}

/// Run the simulation.
pub fn run(args: RunArgs) -> Result<(), CliError> {
    let config = resolve_config(&args)?;
    let ident = config.airport.ident.clone();
    let step = config.simulation.time_step_s;
    let duration = config.simulation.duration_s;
    let interval = config.simulation.status_interval_s;

    let mut manager = TrafficManager::new(SimContext::from_config(&config));
    manager.activate_airport(&ident, config.airport.ground_network.as_deref())?;
    let created = manager.generate_traffic(&ident, &config.traffic)?;

    if !args.json {
        println!("Airport:  {} ({})", ident, config.airport.name);
        println!(
            "Runway:   {} ({:.0}°, {:.0} m)",
            config.runway.ident, config.runway.heading_deg, config.runway.length_m
        );
        println!(
            "Wind:     {:03.0}° at {:.0} kt",
            config.wind.from_deg, config.wind.speed_kt
        );
        println!("Traffic:  {} aircraft", created);
        println!("Duration: {:.0} s in {} s steps", duration, step);
        println!();
        println!("Press Ctrl+C to stop early");
        println!();
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();
    ctrlc::set_handler(move || {
        shutdown_clone.store(true, Ordering::SeqCst);
    })
    .map_err(|e| CliError::SignalHandler(e.to_string()))?;

    let field_elevation_m = config.airport.elevation_m();
    let mut transmissions = 0usize;
    let mut next_status = interval;
    while manager.elapsed_s() < duration && !shutdown.load(Ordering::SeqCst) {
        transmissions += manager.tick(step).len();
        if manager.elapsed_s() + 1e-9 >= next_status {
            next_status += interval;
            report(&manager, args.json, field_elevation_m)?;
        }
    }

    if shutdown.load(Ordering::SeqCst) {
        info!(elapsed_s = manager.elapsed_s(), "Stopped by signal");
    }
    if !args.json {
        println!();
        println!(
            "Simulated {:.0} s: {} transmissions, {} aircraft remaining",
            manager.elapsed_s(),
            transmissions,
            manager.aircraft_count()
        );
    }
    Ok(())
}

/// Load the config and apply command-line overrides.
fn resolve_config(args: &RunArgs) -> Result<Config, CliError> {
    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    if let Some(duration) = args.duration {
        if duration <= 0.0 {
            return Err(CliError::InvalidArgument(
                "--duration must be positive".to_string(),
            ));
        }
        config = config.with_duration(duration);
    }
    if let Some(step) = args.step {
        if step <= 0.0 {
            return Err(CliError::InvalidArgument("--step must be positive".to_string()));
        }
        config = config.with_time_step(step);
    }
    if let Some(network) = &args.network {
        config = config.with_ground_network(network);
    }
    Ok(config)
}

fn report(manager: &TrafficManager, json: bool, field_elevation_m: f64) -> Result<(), CliError> {
    let snapshots = manager.snapshots();
    if json {
        let value = serde_json::json!({
            "time_s": manager.elapsed_s(),
            "aircraft": snapshots,
        });
        println!("{}", serde_json::to_string(&value)?);
    } else {
        for line in status_lines(manager.elapsed_s(), &snapshots, field_elevation_m) {
            println!("{}", line);
        }
    }
    Ok(())
}

/// Human-readable status: a header plus one line per visible aircraft.
fn status_lines(time_s: f64, snapshots: &[AircraftSnapshot], field_elevation_m: f64) -> Vec<String> {
    let visible: Vec<&AircraftSnapshot> = snapshots.iter().filter(|s| s.visible).collect();
    let mut lines = vec![format!(
        "[{:>7.1}s] {} aircraft ({} visible)",
        time_s,
        snapshots.len(),
        visible.len()
    )];
    lines.extend(visible.iter().map(|s| {
        let height_ft = (s.position.elev_m - field_elevation_m) * M_TO_FT;
        format!(
            "  {:<28} {:<26} {:>5.0} ft AGL {:>4.0} kt {:>4.0}°",
            s.callsign, s.phase, height_ft, s.ias_kt, s.heading_deg
        )
    }));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use vfrtraffic::aircraft::PatternLeg;
    use vfrtraffic::geo::GeoPoint;

    fn args(config: PathBuf) -> RunArgs {
        RunArgs {
            config: Some(config),
            duration: None,
            step: None,
            seed: None,
            json: false,
            network: None,
        }
    }

    fn snapshot(callsign: &str, visible: bool, elev_m: f64) -> AircraftSnapshot {
        AircraftSnapshot {
            callsign: callsign.to_string(),
            airport: "KHAF".to_string(),
            position: GeoPoint::new(37.5, -122.5, elev_m),
            heading_deg: 120.0,
            ias_kt: 90.0,
            leg: PatternLeg::Downwind,
            phase: "downwind".to_string(),
            visible,
        }
    }

    #[test]
    fn test_resolve_config_applies_overrides() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut run_args = args(dir.path().join("missing.ini"));
        run_args.seed = Some(11);
        run_args.step = Some(0.2);
        run_args.duration = Some(120.0);
        run_args.network = Some(PathBuf::from("/tmp/net.txt"));

        let config = resolve_config(&run_args).unwrap();
        assert_eq!(config.simulation.seed, 11);
        assert_eq!(config.simulation.time_step_s, 0.2);
        assert_eq!(config.simulation.duration_s, 120.0);
        assert_eq!(
            config.airport.ground_network,
            Some(PathBuf::from("/tmp/net.txt"))
        );
    }

    #[test]
    fn test_resolve_config_rejects_bad_step() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut run_args = args(dir.path().join("missing.ini"));
        run_args.step = Some(0.0);
        assert!(matches!(
            resolve_config(&run_args),
            Err(CliError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_status_lines_skip_invisible() {
        let snapshots = vec![
            snapshot("Cessna-One-Alpha-Bravo", true, 10.0 + 1000.0 / M_TO_FT),
            snapshot("Piper-Two-Charlie-Delta", false, 10.0),
        ];
        let lines = status_lines(60.0, &snapshots, 10.0);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("2 aircraft (1 visible)"));
        assert!(lines[1].contains("Cessna-One-Alpha-Bravo"));
        assert!(lines[1].contains(" 1000 ft AGL"));
    }
}
