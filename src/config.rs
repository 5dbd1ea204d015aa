//! TOML-based simulator configuration with environment overrides.

use std::fmt;
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;

use serde::Deserialize;

use crate::sim::context::SimOptions;
use crate::sim::drift::DriftSeed;
use crate::sim::scenario::ScenarioKey;

/// Top-level simulator configuration parsed from TOML.
///
/// Every field has a default, so an empty file (or no file) is a valid
/// configuration. Environment overrides are applied with
/// [`SimulatorConfig::apply_env`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulatorConfig {
    /// Listener settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Start-up simulation state.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Initial ambient readings of the light actuator.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    /// Optional real device.
    #[serde(default)]
    pub device: DeviceConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// IP address to bind.
    pub bind: String,
    /// TCP port (must be > 0).
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Random seed; absent means OS entropy.
    pub seed: Option<u64>,
    /// Scenario active at start-up.
    pub scenario: String,
    /// Force readings to the export side at start-up.
    pub negative_override: bool,
    /// Ids of the simulated lights.
    pub light_ids: Vec<i64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: None,
            scenario: ScenarioKey::SunnyExport.as_str().to_string(),
            negative_override: false,
            light_ids: vec![0],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TelemetryConfig {
    /// Device temperature (°C), within [30, 50].
    pub temperature_c: f64,
    /// Supply voltage (V), within [227, 235].
    pub voltage_v: f64,
    /// Energy counter (Wh), non-negative.
    pub energy_total_wh: f64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        let seed = DriftSeed::default();
        Self {
            temperature_c: seed.temperature_c,
            voltage_v: seed.voltage_v,
            energy_total_wh: seed.energy_total_wh,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeviceConfig {
    /// Base URL of a real device; light requests are proxied there.
    pub forward_url: Option<String>,
}

/// Configuration error with field path and constraint description.
#[derive(Debug)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"simulation.light_ids"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

impl SimulatorConfig {
    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "config".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Applies `SHELLY_DEVICE_URL`, `PORT` and `SIM_SEED` from `lookup`.
    ///
    /// An empty `SHELLY_DEVICE_URL` clears the forward URL.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if `PORT` or `SIM_SEED` is not a number.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("SHELLY_DEVICE_URL") {
            let url = url.trim();
            self.device.forward_url = (!url.is_empty()).then(|| url.to_string());
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port.trim().parse().map_err(|_| ConfigError {
                field: "PORT".into(),
                message: format!("must be a port number, got \"{port}\""),
            })?;
        }
        if let Some(seed) = lookup("SIM_SEED") {
            let seed = seed.trim().parse().map_err(|_| ConfigError {
                field: "SIM_SEED".into(),
                message: format!("must be an unsigned integer, got \"{seed}\""),
            })?;
            self.simulation.seed = Some(seed);
        }
        Ok(())
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let srv = &self.server;
        if srv.port == 0 {
            errors.push(ConfigError {
                field: "server.port".into(),
                message: "must be > 0".into(),
            });
        }
        if srv.bind.parse::<IpAddr>().is_err() {
            errors.push(ConfigError {
                field: "server.bind".into(),
                message: format!("must be an IP address, got \"{}\"", srv.bind),
            });
        }

        let s = &self.simulation;
        if s.scenario.parse::<ScenarioKey>().is_err() {
            let known: Vec<&str> = ScenarioKey::ALL.iter().map(|k| k.as_str()).collect();
            errors.push(ConfigError {
                field: "simulation.scenario".into(),
                message: format!(
                    "unknown scenario \"{}\", available: {}",
                    s.scenario,
                    known.join(", ")
                ),
            });
        }
        if s.light_ids.is_empty() {
            errors.push(ConfigError {
                field: "simulation.light_ids".into(),
                message: "must contain at least one id".into(),
            });
        }
        let mut seen = s.light_ids.clone();
        seen.sort_unstable();
        seen.dedup();
        if seen.len() != s.light_ids.len() {
            errors.push(ConfigError {
                field: "simulation.light_ids".into(),
                message: "must not contain duplicates".into(),
            });
        }

        let t = &self.telemetry;
        if !(30.0..=50.0).contains(&t.temperature_c) {
            errors.push(ConfigError {
                field: "telemetry.temperature_c".into(),
                message: "must be in [30.0, 50.0]".into(),
            });
        }
        if !(227.0..=235.0).contains(&t.voltage_v) {
            errors.push(ConfigError {
                field: "telemetry.voltage_v".into(),
                message: "must be in [227.0, 235.0]".into(),
            });
        }
        if t.energy_total_wh.is_nan() || t.energy_total_wh < 0.0 {
            errors.push(ConfigError {
                field: "telemetry.energy_total_wh".into(),
                message: "must be >= 0".into(),
            });
        }

        if let Some(url) = &self.device.forward_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                errors.push(ConfigError {
                    field: "device.forward_url".into(),
                    message: format!("must start with http:// or https://, got \"{url}\""),
                });
            }
        }

        errors
    }

    /// Socket address to listen on.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if `server.bind` is not an IP address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip = self.server.bind.parse::<IpAddr>().map_err(|e| ConfigError {
            field: "server.bind".into(),
            message: e.to_string(),
        })?;
        Ok(SocketAddr::new(ip, self.server.port))
    }

    /// Start-up state for the simulation context.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the scenario key is unknown.
    pub fn sim_options(&self) -> Result<SimOptions, ConfigError> {
        let scenario = self
            .simulation
            .scenario
            .parse::<ScenarioKey>()
            .map_err(|e| ConfigError {
                field: "simulation.scenario".into(),
                message: e.to_string(),
            })?;
        Ok(SimOptions {
            light_ids: self.simulation.light_ids.clone(),
            scenario,
            negative_override: self.simulation.negative_override,
            drift: DriftSeed {
                temperature_c: self.telemetry.temperature_c,
                voltage_v: self.telemetry.voltage_v,
                energy_total_wh: self.telemetry.energy_total_wh,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_valid() {
        let cfg = SimulatorConfig::default();
        let errors = cfg.validate();
        assert!(errors.is_empty(), "defaults should be valid: {errors:?}");
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.simulation.light_ids, vec![0]);
        assert_eq!(cfg.sim_options().unwrap(), SimOptions::default());
    }

    #[test]
    fn empty_toml_is_default() {
        let cfg = SimulatorConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.server.bind, "0.0.0.0");
        assert_eq!(cfg.simulation.scenario, "sunny_export");
        assert_eq!(cfg.telemetry.energy_total_wh, 2423.0);
        assert!(cfg.device.forward_url.is_none());
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[server]
bind = "127.0.0.1"
port = 9090

[simulation]
seed = 7
scenario = "swinging_grid"
negative_override = true
light_ids = [0, 1, 2]

[telemetry]
temperature_c = 40.0
voltage_v = 231.0
energy_total_wh = 0.0

[device]
forward_url = "http://192.168.1.50"
"#;
        let cfg = SimulatorConfig::from_toml_str(toml).unwrap();
        assert!(cfg.validate().is_empty());
        assert_eq!(cfg.simulation.seed, Some(7));
        assert_eq!(cfg.socket_addr().unwrap().to_string(), "127.0.0.1:9090");
        let options = cfg.sim_options().unwrap();
        assert_eq!(options.scenario, ScenarioKey::SwingingGrid);
        assert!(options.negative_override);
        assert_eq!(options.light_ids, vec![0, 1, 2]);
        assert_eq!(options.drift.temperature_c, 40.0);
    }

    #[test]
    fn unknown_field_rejected() {
        let err = SimulatorConfig::from_toml_str("[simulation]\nsteps = 3\n").unwrap_err();
        assert_eq!(err.field, "toml");
        assert!(err.message.contains("steps"));
    }

    #[test]
    fn validation_collects_every_error() {
        let mut cfg = SimulatorConfig::default();
        cfg.server.port = 0;
        cfg.simulation.scenario = "foggy".into();
        cfg.simulation.light_ids = vec![1, 1];
        cfg.telemetry.voltage_v = 240.0;
        cfg.device.forward_url = Some("192.168.1.50".into());
        let fields: Vec<String> = cfg.validate().into_iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "server.port",
                "simulation.scenario",
                "simulation.light_ids",
                "telemetry.voltage_v",
                "device.forward_url",
            ]
        );
    }

    #[test]
    fn empty_light_ids_rejected() {
        let mut cfg = SimulatorConfig::default();
        cfg.simulation.light_ids.clear();
        let errors = cfg.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("at least one"));
    }

    #[test]
    fn env_overrides_apply() {
        let mut cfg = SimulatorConfig::default();
        cfg.apply_env(env(&[
            ("SHELLY_DEVICE_URL", "http://10.0.0.9"),
            ("PORT", "8181"),
            ("SIM_SEED", "42"),
        ]))
        .unwrap();
        assert_eq!(cfg.device.forward_url.as_deref(), Some("http://10.0.0.9"));
        assert_eq!(cfg.server.port, 8181);
        assert_eq!(cfg.simulation.seed, Some(42));
    }

    #[test]
    fn empty_device_url_clears_forwarding() {
        let mut cfg = SimulatorConfig::default();
        cfg.device.forward_url = Some("http://10.0.0.9".into());
        cfg.apply_env(env(&[("SHELLY_DEVICE_URL", "")])).unwrap();
        assert!(cfg.device.forward_url.is_none());
    }

    #[test]
    fn bad_port_env_is_error() {
        let mut cfg = SimulatorConfig::default();
        let err = cfg.apply_env(env(&[("PORT", "eighty")])).unwrap_err();
        assert_eq!(err.field, "PORT");
    }
}
