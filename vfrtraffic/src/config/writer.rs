//! INI serialization logic for converting `Config` → INI string.

use super::settings::Config;

/// Convert a `Config` to a commented INI string for saving.
pub(super) fn to_config_string(config: &Config) -> String {
    let ground_network = config
        .airport
        .ground_network
        .as_ref()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default();

    format!(
        r#"[simulation]
; Seconds advanced per tick (default: 0.5)
time_step = {}
; Simulated seconds for the run command (default: 1800)
duration = {}
; Seed for callsigns, traffic generation and gate allocation
seed = {}
; Seconds between status reports (default: 60)
status_interval = {}

[airport]
; ICAO identifier used on frequency
ident = {}
name = {}
; Runway centre position
latitude = {}
longitude = {}
elevation_ft = {}
; Ground network file (N/A/G records). Leave empty to run without taxiways;
; aircraft then use synthetic hold-short points and park out of sight.
ground_network = {}
; Separate ground controller for taxiing traffic (default: true)
separate_ground = {}

[runway]
; Active runway designator; L/R suffix selects the pattern side
ident = {}
; True heading in degrees
heading = {}
length_m = {}
width_m = {}

[wind]
; Direction the wind blows from, degrees true
from = {}
speed_kt = {}

[traffic]
; Aircraft parked at gates that will fly circuits
parked = {}
; Aircraft already flying the circuit
in_pattern = {}
; Inbound VFR arrivals
arrivals = {}
; Aircraft that depart the area after take-off
departures = {}
; Circuits flown before the final full stop
circuits = {}
; true: touch-and-go between circuits, false: stop-and-go
touch_and_go = {}
; Arrival spacing: 1 (sparse) to 3 (dense)
density = {}

[atc]
; Controller answer delay in seconds (default: 1.8)
response_delay = {}
; Minimum arrival separation at the threshold in seconds (default: 90)
separation_s = {}
; Extra separation behind a departure in seconds (default: 60)
departure_separation_s = {}
; Traffic this close to the threshold must go around if the runway is occupied
go_around_eta_s = {}
; Scheduler sub-ticks per full rotation (minimum: 9)
rotation_length = {}

[logging]
; trace, debug, info, warn or error. RUST_LOG overrides this.
level = {}
"#,
        config.simulation.time_step_s,
        config.simulation.duration_s,
        config.simulation.seed,
        config.simulation.status_interval_s,
        config.airport.ident,
        config.airport.name,
        config.airport.latitude,
        config.airport.longitude,
        config.airport.elevation_ft,
        ground_network,
        config.airport.separate_ground,
        config.runway.ident,
        config.runway.heading_deg,
        config.runway.length_m,
        config.runway.width_m,
        config.wind.from_deg,
        config.wind.speed_kt,
        config.traffic.parked,
        config.traffic.in_pattern,
        config.traffic.arrivals,
        config.traffic.departures,
        config.traffic.circuits,
        config.traffic.touch_and_go,
        config.traffic.density,
        config.atc.response_delay_s,
        config.atc.separation_s,
        config.atc.departure_separation_s,
        config.atc.go_around_eta_s,
        config.atc.rotation_length,
        config.logging.level,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_has_every_section() {
        let text = to_config_string(&Config::default());
        for section in [
            "[simulation]",
            "[airport]",
            "[runway]",
            "[wind]",
            "[traffic]",
            "[atc]",
            "[logging]",
        ] {
            assert!(text.contains(section), "missing {section}");
        }
        assert!(text.contains("ident = KHAF"));
        assert!(text.contains("ground_network = \n"));
    }

    #[test]
    fn test_output_parses_back_to_same_config() {
        let mut config = Config::default().with_seed(17).with_ground_network("/tmp/apt.txt");
        config.traffic.density = 1;
        config.wind.speed_kt = 12.5;

        let ini = ini::Ini::load_from_str(&to_config_string(&config)).unwrap();
        let parsed = super::super::parser::parse_ini(&ini).unwrap();
        assert_eq!(parsed, config);
    }
}
