//! Configuration for airport controllers.

/// Configuration for tower and ground controllers.
#[derive(Debug, Clone, PartialEq)]
pub struct AtcConfig {
    /// Delay between a pilot report and the controller's answer (seconds).
    pub response_delay_s: f64,

    /// Minimum arrival separation at the threshold (seconds).
    pub separation_s: f64,

    /// Extra separation required behind a departure (seconds).
    pub departure_separation_s: f64,

    /// ETA below which traffic facing an occupied runway must go around.
    pub go_around_eta_s: f64,

    /// ETA below which approach traffic may be cleared to land.
    pub landing_clearance_eta_s: f64,

    /// Arrival ETA below which a departure is cleared for immediate take-off.
    pub immediate_takeoff_eta_s: f64,

    /// Sub-ticks in one full scheduler rotation.
    pub rotation_length: u32,

    /// Departures beyond this distance are handed off (metres).
    pub airspace_radius_m: f64,

    /// Whether a separate ground controller handles taxiing traffic.
    ///
    /// When false the tower sends landed traffic straight to parking.
    pub separate_ground: bool,

    /// Tower frequency (MHz).
    pub tower_frequency_mhz: f64,

    /// Ground frequency (MHz).
    pub ground_frequency_mhz: f64,

    /// Seed for gate allocation.
    pub seed: u64,
}

impl Default for AtcConfig {
    fn default() -> Self {
        Self {
            response_delay_s: 1.8,
            separation_s: 90.0,
            departure_separation_s: 60.0,
            go_around_eta_s: 12.0,
            landing_clearance_eta_s: 90.0,
            immediate_takeoff_eta_s: 150.0,
            rotation_length: 15,
            airspace_radius_m: 10_000.0,
            separate_ground: true,
            tower_frequency_mhz: 118.5,
            ground_frequency_mhz: 121.7,
            seed: 0,
        }
    }
}

impl AtcConfig {
    /// Set the controller response delay.
    pub fn with_response_delay(mut self, seconds: f64) -> Self {
        self.response_delay_s = seconds;
        self
    }

    /// Set the arrival separation.
    pub fn with_separation(mut self, seconds: f64) -> Self {
        self.separation_s = seconds;
        self
    }

    /// Set the departure separation allowance.
    pub fn with_departure_separation(mut self, seconds: f64) -> Self {
        self.departure_separation_s = seconds;
        self
    }

    /// Set the mandatory go-around ETA.
    pub fn with_go_around_eta(mut self, seconds: f64) -> Self {
        self.go_around_eta_s = seconds;
        self
    }

    /// Set the scheduler rotation length (at least 9 sub-ticks).
    pub fn with_rotation_length(mut self, length: u32) -> Self {
        self.rotation_length = length.max(9);
        self
    }

    /// Enable or disable the separate ground controller.
    pub fn with_separate_ground(mut self, separate: bool) -> Self {
        self.separate_ground = separate;
        self
    }

    /// Set the seed used for gate allocation.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AtcConfig::default();
        assert_eq!(config.response_delay_s, 1.8);
        assert_eq!(config.separation_s, 90.0);
        assert_eq!(config.departure_separation_s, 60.0);
        assert_eq!(config.go_around_eta_s, 12.0);
        assert_eq!(config.rotation_length, 15);
        assert!(config.separate_ground);
    }

    #[test]
    fn test_builder_pattern() {
        let config = AtcConfig::default()
            .with_response_delay(0.5)
            .with_separation(120.0)
            .with_departure_separation(30.0)
            .with_go_around_eta(10.0)
            .with_rotation_length(3)
            .with_separate_ground(false)
            .with_seed(7);

        assert_eq!(config.response_delay_s, 0.5);
        assert_eq!(config.separation_s, 120.0);
        assert_eq!(config.departure_separation_s, 30.0);
        assert_eq!(config.go_around_eta_s, 10.0);
        assert_eq!(config.rotation_length, 9);
        assert!(!config.separate_ground);
        assert_eq!(config.seed, 7);
    }
}
