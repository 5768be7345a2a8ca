//! INI parsing logic for converting `Ini` → `Config`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use std::path::PathBuf;
use std::str::FromStr;

use ini::{Ini, Properties};

use super::settings::{Config, LOG_LEVELS};
use super::ConfigError;

/// Parse an `Ini` object into a `Config`.
///
/// Starts from `Config::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<Config, ConfigError> {
    let mut config = Config::default();

    // [simulation] section
    if let Some(section) = ini.section(Some("simulation")) {
        let s = Section::new("simulation", section);
        if let Some(v) = s.positive("time_step")? {
            config.simulation.time_step_s = v;
        }
        if let Some(v) = s.positive("duration")? {
            config.simulation.duration_s = v;
        }
        if let Some(v) = s.parse("seed")? {
            config.simulation.seed = v;
        }
        if let Some(v) = s.positive("status_interval")? {
            config.simulation.status_interval_s = v;
        }
    }

    // [airport] section
    if let Some(section) = ini.section(Some("airport")) {
        let s = Section::new("airport", section);
        if let Some(v) = s.text("ident") {
            config.airport.ident = v.to_uppercase();
        }
        if let Some(v) = s.text("name") {
            config.airport.name = v.to_string();
        }
        if let Some(v) = s.parse::<f64>("latitude")? {
            s.check("latitude", v, (-90.0..=90.0).contains(&v))?;
            config.airport.latitude = v;
        }
        if let Some(v) = s.parse::<f64>("longitude")? {
            s.check("longitude", v, (-180.0..=180.0).contains(&v))?;
            config.airport.longitude = v;
        }
        if let Some(v) = s.parse("elevation_ft")? {
            config.airport.elevation_ft = v;
        }
        if let Some(v) = s.text("ground_network") {
            config.airport.ground_network = Some(expand_tilde(v));
        }
        if let Some(v) = s.boolean("separate_ground")? {
            config.airport.separate_ground = v;
        }
    }

    // [runway] section
    if let Some(section) = ini.section(Some("runway")) {
        let s = Section::new("runway", section);
        if let Some(v) = s.text("ident") {
            config.runway.ident = v.to_uppercase();
        }
        if let Some(v) = s.parse::<f64>("heading")? {
            s.check("heading", v, (0.0..=360.0).contains(&v))?;
            config.runway.heading_deg = v;
        }
        if let Some(v) = s.positive("length_m")? {
            config.runway.length_m = v;
        }
        if let Some(v) = s.positive("width_m")? {
            config.runway.width_m = v;
        }
    }

    // [wind] section
    if let Some(section) = ini.section(Some("wind")) {
        let s = Section::new("wind", section);
        if let Some(v) = s.parse::<f64>("from")? {
            s.check("from", v, (0.0..=360.0).contains(&v))?;
            config.wind.from_deg = v;
        }
        if let Some(v) = s.parse::<f64>("speed_kt")? {
            s.check("speed_kt", v, v >= 0.0)?;
            config.wind.speed_kt = v;
        }
    }

    // [traffic] section
    if let Some(section) = ini.section(Some("traffic")) {
        let s = Section::new("traffic", section);
        if let Some(v) = s.parse("parked")? {
            config.traffic.parked = v;
        }
        if let Some(v) = s.parse("in_pattern")? {
            config.traffic.in_pattern = v;
        }
        if let Some(v) = s.parse("arrivals")? {
            config.traffic.arrivals = v;
        }
        if let Some(v) = s.parse("departures")? {
            config.traffic.departures = v;
        }
        if let Some(v) = s.parse::<u32>("circuits")? {
            s.check("circuits", v, v >= 1)?;
            config.traffic.circuits = v;
        }
        if let Some(v) = s.boolean("touch_and_go")? {
            config.traffic.touch_and_go = v;
        }
        if let Some(v) = s.parse::<u8>("density")? {
            s.check("density", v, (1..=3).contains(&v))?;
            config.traffic.density = v;
        }
    }

    // [atc] section
    if let Some(section) = ini.section(Some("atc")) {
        let s = Section::new("atc", section);
        if let Some(v) = s.parse::<f64>("response_delay")? {
            s.check("response_delay", v, v >= 0.0)?;
            config.atc = config.atc.with_response_delay(v);
        }
        if let Some(v) = s.positive("separation_s")? {
            config.atc = config.atc.with_separation(v);
        }
        if let Some(v) = s.parse::<f64>("departure_separation_s")? {
            s.check("departure_separation_s", v, v >= 0.0)?;
            config.atc = config.atc.with_departure_separation(v);
        }
        if let Some(v) = s.positive("go_around_eta_s")? {
            config.atc = config.atc.with_go_around_eta(v);
        }
        if let Some(v) = s.parse("rotation_length")? {
            config.atc = config.atc.with_rotation_length(v);
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        let s = Section::new("logging", section);
        if let Some(v) = s.text("level") {
            let v = v.to_lowercase();
            s.check("level", &v, LOG_LEVELS.contains(&v.as_str()))?;
            config.logging.level = v;
        }
    }

    Ok(config)
}

/// One INI section with its name, for error reporting.
struct Section<'a> {
    name: &'static str,
    props: &'a Properties,
}

impl<'a> Section<'a> {
    fn new(name: &'static str, props: &'a Properties) -> Self {
        Self { name, props }
    }

    /// Trimmed value; empty values count as unset.
    fn text(&self, key: &str) -> Option<&'a str> {
        self.props
            .get(key)
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    fn invalid(&self, key: &str, value: impl ToString) -> ConfigError {
        ConfigError::InvalidValue {
            section: self.name.to_string(),
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    fn parse<T: FromStr>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        match self.text(key) {
            None => Ok(None),
            Some(v) => v.parse().map(Some).map_err(|_| self.invalid(key, v)),
        }
    }

    fn positive(&self, key: &str) -> Result<Option<f64>, ConfigError> {
        let value = self.parse::<f64>(key)?;
        if let Some(v) = value {
            self.check(key, v, v > 0.0)?;
        }
        Ok(value)
    }

    fn boolean(&self, key: &str) -> Result<Option<bool>, ConfigError> {
        match self.text(key) {
            None => Ok(None),
            Some(v) => match v.to_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Ok(Some(true)),
                "false" | "no" | "off" | "0" => Ok(Some(false)),
                _ => Err(self.invalid(key, v)),
            },
        }
    }

    fn check(&self, key: &str, value: impl ToString, ok: bool) -> Result<(), ConfigError> {
        if ok {
            Ok(())
        } else {
            Err(self.invalid(key, value))
        }
    }
}

/// Expand a leading `~` to the home directory.
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Config, ConfigError> {
        let ini = Ini::load_from_str(text).expect("valid ini");
        parse_ini(&ini)
    }

    #[test]
    fn test_empty_ini_gives_defaults() {
        assert_eq!(parse("").unwrap(), Config::default());
    }

    #[test]
    fn test_overlays_values() {
        let config = parse(
            "[simulation]\ntime_step = 0.25\nseed = 42\n\
             [airport]\nident = kpao\nseparate_ground = no\n\
             [runway]\nident = 31\nheading = 310\n\
             [traffic]\ncircuits = 2\ntouch_and_go = false\ndensity = 3\n\
             [atc]\nresponse_delay = 2.5\nrotation_length = 20\n\
             [logging]\nlevel = DEBUG\n",
        )
        .unwrap();

        assert_eq!(config.simulation.time_step_s, 0.25);
        assert_eq!(config.simulation.seed, 42);
        assert_eq!(config.airport.ident, "KPAO");
        assert!(!config.airport.separate_ground);
        assert_eq!(config.runway.ident, "31");
        assert_eq!(config.runway.heading_deg, 310.0);
        assert_eq!(config.traffic.circuits, 2);
        assert!(!config.traffic.touch_and_go);
        assert_eq!(config.traffic.density, 3);
        assert_eq!(config.atc.response_delay_s, 2.5);
        assert_eq!(config.atc.rotation_length, 20);
        assert_eq!(config.logging.level, "debug");
        // untouched keys keep defaults
        assert_eq!(config.runway.length_m, 1524.0);
    }

    #[test]
    fn test_empty_value_is_unset() {
        let config = parse("[airport]\nground_network =\n").unwrap();
        assert!(config.airport.ground_network.is_none());
    }

    #[test]
    fn test_malformed_number() {
        let err = parse("[simulation]\ntime_step = fast\n").unwrap_err();
        match err {
            ConfigError::InvalidValue {
                section,
                key,
                value,
            } => {
                assert_eq!(section, "simulation");
                assert_eq!(key, "time_step");
                assert_eq!(value, "fast");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_out_of_range_values() {
        assert!(parse("[traffic]\ndensity = 4\n").is_err());
        assert!(parse("[simulation]\ntime_step = 0\n").is_err());
        assert!(parse("[airport]\nlatitude = 91\n").is_err());
        assert!(parse("[logging]\nlevel = loud\n").is_err());
        assert!(parse("[airport]\nseparate_ground = maybe\n").is_err());
    }
}
