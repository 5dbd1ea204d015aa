//! Scenario-driven grid-power random walk and the meter reading payload.
//!
//! Each reading advances the active scenario's walk by one step:
//!
//! ```text
//! proposed = current + U(-volatility, volatility) + [surge] U(-surge, surge)
//! next     = clamp(0.65 * current + 0.35 * proposed, min, max)
//! ```
//!
//! The aggregate load of the actuated lights is added on top of the walk
//! value before rounding.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::devices::types::LoadSink;
use crate::sim::random::RandomSource;
use crate::sim::round_half_up;
use crate::sim::scenario::ScenarioKey;

/// Weight of the previous walk value in each step.
const INERTIA: f64 = 0.65;

/// Whether the household is drawing from or feeding into the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Consuming,
    Exporting,
}

impl Direction {
    fn of(watts: i64) -> Self {
        if watts < 0 {
            Self::Exporting
        } else {
            Self::Consuming
        }
    }
}

/// One meter reading as served to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeterReading {
    pub scenario: ScenarioKey,
    pub label: &'static str,
    pub description: &'static str,
    /// RFC 3339 UTC with millisecond precision.
    pub timestamp: String,
    pub reading: ReadingValue,
    pub limits: Limits,
    pub options: ReadingOptions,
    pub components: Components,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadingValue {
    pub watts: i64,
    pub kilowatts: f64,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Limits {
    pub min_watts: f64,
    pub max_watts: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingOptions {
    pub negative_override: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Components {
    /// Walk value after the sign override, rounded.
    pub scenario_watts: i64,
    /// Aggregate light load, rounded.
    pub external_load_watts: i64,
}

/// Response to a scenario switch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioChange {
    pub message: &'static str,
    pub state: ScenarioState,
    pub next_reading: MeterReading,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioState {
    pub scenario: ScenarioKey,
    pub negative_override: bool,
}

/// Whole watts to kilowatts; at most three decimals by construction.
pub fn to_kilowatts(watts: i64) -> f64 {
    watts as f64 / 1000.0
}

/// Grid meter simulator.
///
/// Every scenario keeps its own walk value; only the active one advances.
#[derive(Debug, Clone)]
pub struct MeterEngine {
    active: ScenarioKey,
    walk: [f64; 3],
    negative_override: bool,
    external_load_watts: f64,
    last_reading: Option<MeterReading>,
}

fn slot(key: ScenarioKey) -> usize {
    match key {
        ScenarioKey::SunnyExport => 0,
        ScenarioKey::MixedClouds => 1,
        ScenarioKey::SwingingGrid => 2,
    }
}

impl MeterEngine {
    pub fn new(active: ScenarioKey, negative_override: bool) -> Self {
        Self {
            active,
            walk: ScenarioKey::ALL.map(ScenarioKey::initial_watts),
            negative_override,
            external_load_watts: 0.0,
            last_reading: None,
        }
    }

    pub fn active(&self) -> ScenarioKey {
        self.active
    }

    pub fn negative_override(&self) -> bool {
        self.negative_override
    }

    pub fn external_load_watts(&self) -> f64 {
        self.external_load_watts
    }

    /// Current walk value of `key`, before any sign override.
    pub fn walk_watts(&self, key: ScenarioKey) -> f64 {
        self.walk[slot(key)]
    }

    /// Most recent reading, if one has been produced.
    pub fn last_reading(&self) -> Option<&MeterReading> {
        self.last_reading.as_ref()
    }

    /// Advances the active scenario's walk by one step and returns the new
    /// value. The stored value is always inside the scenario bounds.
    pub fn step(&mut self, rng: &mut dyn RandomSource) -> f64 {
        let cfg = self.active.config();
        let current = self.walk[slot(self.active)];

        let base_delta = rng.uniform(-cfg.volatility, cfg.volatility);
        let surge_delta = if rng.chance(cfg.surge_chance) {
            rng.uniform(-cfg.surge_magnitude, cfg.surge_magnitude)
        } else {
            0.0
        };
        let proposed = current + base_delta + surge_delta;
        let next = (INERTIA * current + (1.0 - INERTIA) * proposed)
            .clamp(cfg.min_watts, cfg.max_watts);

        self.walk[slot(self.active)] = next;
        next
    }

    /// Steps the walk and builds a fresh reading, caching it as the latest.
    pub fn reading(&mut self, rng: &mut dyn RandomSource, now: DateTime<Utc>) -> MeterReading {
        let cfg = self.active.config();
        let walk = self.step(rng);
        let scenario_watts = if self.negative_override {
            -walk.abs()
        } else {
            walk
        };
        let watts = round_half_up(scenario_watts + self.external_load_watts) as i64;

        let reading = MeterReading {
            scenario: self.active,
            label: cfg.label,
            description: cfg.description,
            timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            reading: ReadingValue {
                watts,
                kilowatts: to_kilowatts(watts),
                direction: Direction::of(watts),
            },
            limits: Limits {
                min_watts: cfg.min_watts,
                max_watts: cfg.max_watts,
            },
            options: ReadingOptions {
                negative_override: self.negative_override,
            },
            components: Components {
                scenario_watts: round_half_up(scenario_watts) as i64,
                external_load_watts: round_half_up(self.external_load_watts) as i64,
            },
        };
        debug!(
            scenario = %self.active,
            watts,
            external_load_watts = self.external_load_watts,
            "meter reading"
        );
        self.last_reading = Some(reading.clone());
        reading
    }

    /// Returns the cached reading, or produces one if none exists yet.
    pub fn latest(&mut self, rng: &mut dyn RandomSource, now: DateTime<Utc>) -> MeterReading {
        match &self.last_reading {
            Some(reading) => reading.clone(),
            None => self.reading(rng, now),
        }
    }

    /// Activates `key`, resetting its walk to the middle of its bounds, and
    /// optionally replaces the sign override. The returned change carries a
    /// reading taken right after the switch.
    pub fn switch(
        &mut self,
        key: ScenarioKey,
        negative: Option<bool>,
        rng: &mut dyn RandomSource,
        now: DateTime<Utc>,
    ) -> ScenarioChange {
        self.active = key;
        self.walk[slot(key)] = key.config().midpoint();
        if let Some(negative) = negative {
            self.negative_override = negative;
        }
        info!(
            scenario = %key,
            negative_override = self.negative_override,
            "meter scenario switched"
        );

        ScenarioChange {
            message: "scenario updated",
            state: ScenarioState {
                scenario: self.active,
                negative_override: self.negative_override,
            },
            next_reading: self.reading(rng, now),
        }
    }
}

impl LoadSink for MeterEngine {
    fn publish_load(&mut self, watts: f64) {
        self.external_load_watts = watts;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::random::{ScriptedRandom, SimRng};

    fn epoch() -> DateTime<Utc> {
        DateTime::from_timestamp(0, 0).unwrap()
    }

    #[test]
    fn neutral_draws_keep_walk_still() {
        let mut meter = MeterEngine::new(ScenarioKey::SunnyExport, false);
        let mut rng = ScriptedRandom::constant(0.5);
        let reading = meter.reading(&mut rng, epoch());
        assert_eq!(reading.reading.watts, -3000);
        assert_eq!(reading.reading.kilowatts, -3.0);
        assert_eq!(reading.reading.direction, Direction::Exporting);
        assert_eq!(reading.timestamp, "1970-01-01T00:00:00.000Z");
    }

    #[test]
    fn inertia_damps_the_step() {
        let mut meter = MeterEngine::new(ScenarioKey::MixedClouds, false);
        // base draw at the top of the range, no surge
        let mut rng = ScriptedRandom::new(vec![1.0 - f64::EPSILON, 0.99]);
        let next = meter.step(&mut rng);
        let expected = -2500.0 + 0.35 * 110.0;
        assert!((next - expected).abs() < 1e-6, "{next} vs {expected}");
    }

    #[test]
    fn surge_adds_to_the_proposal() {
        let mut meter = MeterEngine::new(ScenarioKey::SwingingGrid, false);
        // neutral base, surge fires, surge at its minimum
        let mut rng = ScriptedRandom::new(vec![0.5, 0.0, 0.0]);
        let next = meter.step(&mut rng);
        let expected = -750.0 + 0.35 * -650.0;
        assert!((next - expected).abs() < 1e-9);
    }

    #[test]
    fn walk_is_clamped_to_bounds() {
        let mut meter = MeterEngine::new(ScenarioKey::SunnyExport, false);
        let mut rng = ScriptedRandom::constant(0.0);
        for _ in 0..500 {
            let v = meter.step(&mut rng);
            assert!(v >= -3200.0 && v <= -2800.0);
        }
        assert_eq!(meter.walk_watts(ScenarioKey::SunnyExport), -3200.0);
    }

    #[test]
    fn readings_stay_within_bounds_plus_load() {
        let mut meter = MeterEngine::new(ScenarioKey::SwingingGrid, false);
        meter.publish_load(1641.0);
        let mut rng = SimRng::new(Some(3));
        for _ in 0..2000 {
            let r = meter.reading(&mut rng, epoch());
            let w = r.reading.watts as f64;
            assert!(w >= -2000.0 + 1641.0 - 1.0 && w <= 500.0 + 1641.0 + 1.0);
            assert_eq!(r.components.external_load_watts, 1641);
        }
    }

    #[test]
    fn negative_override_forces_export_sign() {
        let mut meter = MeterEngine::new(ScenarioKey::SwingingGrid, true);
        let mut rng = SimRng::new(Some(11));
        for _ in 0..500 {
            let r = meter.reading(&mut rng, epoch());
            assert!(r.components.scenario_watts <= 0);
        }
    }

    #[test]
    fn switch_resets_to_midpoint_and_reads_immediately() {
        let mut meter = MeterEngine::new(ScenarioKey::SunnyExport, false);
        let mut rng = ScriptedRandom::constant(0.5);
        let change = meter.switch(ScenarioKey::SwingingGrid, Some(true), &mut rng, epoch());
        assert_eq!(change.message, "scenario updated");
        assert_eq!(change.state.scenario, ScenarioKey::SwingingGrid);
        assert!(change.state.negative_override);
        assert_eq!(change.next_reading.reading.watts, -750);
        assert_eq!(meter.last_reading(), Some(&change.next_reading));
    }

    #[test]
    fn switch_without_flag_keeps_override() {
        let mut meter = MeterEngine::new(ScenarioKey::SunnyExport, true);
        let mut rng = ScriptedRandom::constant(0.5);
        let change = meter.switch(ScenarioKey::MixedClouds, None, &mut rng, epoch());
        assert!(change.state.negative_override);
    }

    #[test]
    fn switch_resets_even_when_reselecting() {
        let mut meter = MeterEngine::new(ScenarioKey::MixedClouds, false);
        let mut rng = ScriptedRandom::constant(0.0);
        for _ in 0..50 {
            meter.step(&mut rng);
        }
        assert_eq!(meter.walk_watts(ScenarioKey::MixedClouds), -4000.0);
        let mut neutral = ScriptedRandom::constant(0.5);
        meter.switch(ScenarioKey::MixedClouds, None, &mut neutral, epoch());
        assert!((meter.walk_watts(ScenarioKey::MixedClouds) + 2500.0).abs() < 1e-9);
    }

    #[test]
    fn latest_does_not_step_once_cached() {
        let mut meter = MeterEngine::new(ScenarioKey::MixedClouds, false);
        let mut rng = SimRng::new(Some(8));
        let first = meter.latest(&mut rng, epoch());
        let again = meter.latest(&mut rng, epoch());
        assert_eq!(first, again);
    }

    #[test]
    fn kilowatts_round_to_three_decimals() {
        assert_eq!(to_kilowatts(-2987), -2.987);
        assert_eq!(to_kilowatts(1641), 1.641);
        assert_eq!(to_kilowatts(0), 0.0);
    }

    #[test]
    fn light_load_flips_direction() {
        let mut meter = MeterEngine::new(ScenarioKey::SwingingGrid, false);
        meter.publish_load(1641.0);
        let r = meter.reading(&mut ScriptedRandom::constant(0.5), epoch());
        assert_eq!(r.reading.watts, 891);
        assert_eq!(r.reading.direction, Direction::Consuming);
    }

    #[test]
    fn payload_shape() {
        let mut meter = MeterEngine::new(ScenarioKey::SunnyExport, false);
        let r = meter.reading(&mut ScriptedRandom::constant(0.5), epoch());
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["scenario"], "sunny_export");
        assert_eq!(json["label"], "Sunny day exporting");
        assert_eq!(json["reading"]["direction"], "exporting");
        assert_eq!(json["limits"]["minWatts"], -3200.0);
        assert_eq!(json["options"]["negativeOverride"], false);
        assert_eq!(json["components"]["scenarioWatts"], -3000);
        assert_eq!(json["components"]["externalLoadWatts"], 0);
    }
}
