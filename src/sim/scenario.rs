//! Named grid-power regimes for the meter simulator.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Selects one of the built-in scenarios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKey {
    /// Steady export of about 3 kW.
    SunnyExport,
    /// Export swinging between 1 and 4 kW.
    MixedClouds,
    /// Like `MixedClouds` but crossing into consumption.
    SwingingGrid,
}

impl ScenarioKey {
    pub const ALL: [ScenarioKey; 3] = [
        ScenarioKey::SunnyExport,
        ScenarioKey::MixedClouds,
        ScenarioKey::SwingingGrid,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::SunnyExport => "sunny_export",
            Self::MixedClouds => "mixed_clouds",
            Self::SwingingGrid => "swinging_grid",
        }
    }

    /// Statistical profile of this scenario.
    pub fn config(self) -> &'static ScenarioConfig {
        match self {
            Self::SunnyExport => &SUNNY_EXPORT,
            Self::MixedClouds => &MIXED_CLOUDS,
            Self::SwingingGrid => &SWINGING_GRID,
        }
    }

    /// Walk value the process starts with for this scenario.
    pub fn initial_watts(self) -> f64 {
        match self {
            Self::SunnyExport => -3000.0,
            Self::MixedClouds => -2500.0,
            Self::SwingingGrid => -750.0,
        }
    }
}

impl fmt::Display for ScenarioKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScenarioKey {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| SimError::invalid("unknown scenario"))
    }
}

/// Immutable walk parameters for one scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioConfig {
    pub label: &'static str,
    pub description: &'static str,
    /// Lower walk bound (W).
    pub min_watts: f64,
    /// Upper walk bound (W).
    pub max_watts: f64,
    /// Per-step noise amplitude (W).
    pub volatility: f64,
    /// Probability of an extra surge on a step.
    pub surge_chance: f64,
    /// Amplitude of that surge (W).
    pub surge_magnitude: f64,
}

impl ScenarioConfig {
    pub fn midpoint(&self) -> f64 {
        (self.min_watts + self.max_watts) / 2.0
    }
}

const SUNNY_EXPORT: ScenarioConfig = ScenarioConfig {
    label: "Sunny day exporting",
    description: "Constante teruglevering van ~3kW op een volledig zonnige dag.",
    min_watts: -3200.0,
    max_watts: -2800.0,
    volatility: 12.0,
    surge_chance: 0.02,
    surge_magnitude: 40.0,
};

const MIXED_CLOUDS: ScenarioConfig = ScenarioConfig {
    label: "Sun / clouds",
    description: "Variaties tussen -1kW en -4kW door afwisselende zon en bewolking.",
    min_watts: -4000.0,
    max_watts: -1000.0,
    volatility: 110.0,
    surge_chance: 0.28,
    surge_magnitude: 850.0,
};

const SWINGING_GRID: ScenarioConfig = ScenarioConfig {
    label: "Swinging grid",
    description: "Zelfde patroon als zon/bewolkt maar tussen -2kW en +0.5kW.",
    min_watts: -2000.0,
    max_watts: 500.0,
    volatility: 150.0,
    surge_chance: 0.32,
    surge_magnitude: 650.0,
};
