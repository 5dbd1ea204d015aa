//! Slowly evolving ambient readings of the light actuator.
//!
//! Nothing ticks in the background. Each status read integrates the time
//! elapsed since the previous read in a single step.

use chrono::{DateTime, Utc};

use crate::sim::random::RandomSource;

const TEMP_MIN_C: f64 = 30.0;
const TEMP_MAX_C: f64 = 50.0;
/// Watts of load per degree of target temperature above the floor.
const WATTS_PER_DEGREE: f64 = 180.0;
/// Fraction of the gap to the target temperature closed per sample.
const RELAXATION: f64 = 0.15;
const TEMP_JITTER_C: f64 = 0.2;

const VOLTAGE_MIN_V: f64 = 227.0;
const VOLTAGE_MAX_V: f64 = 235.0;
const VOLTAGE_STEP_V: f64 = 0.35;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Initial values for [`TelemetryDrift`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriftSeed {
    pub temperature_c: f64,
    pub voltage_v: f64,
    pub energy_total_wh: f64,
}

impl Default for DriftSeed {
    fn default() -> Self {
        Self {
            temperature_c: 34.0,
            voltage_v: 230.0,
            energy_total_wh: 2423.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryDrift {
    pub temperature_c: f64,
    pub voltage_v: f64,
    pub energy_total_wh: f64,
    pub last_sample: DateTime<Utc>,
}

impl TelemetryDrift {
    pub fn new(seed: DriftSeed, now: DateTime<Utc>) -> Self {
        Self {
            temperature_c: seed.temperature_c,
            voltage_v: seed.voltage_v,
            energy_total_wh: seed.energy_total_wh,
            last_sample: now,
        }
    }

    /// Temperature the device settles at under a constant `load_watts`.
    pub fn target_temperature(load_watts: f64) -> f64 {
        (TEMP_MIN_C + load_watts / WATTS_PER_DEGREE).clamp(TEMP_MIN_C, TEMP_MAX_C)
    }

    /// Advances all readings to `now` under `load_watts`.
    ///
    /// Energy is only integrated for positive elapsed time, so a clock that
    /// steps backwards never removes energy. Temperature and voltage move on
    /// every call.
    pub fn sample(&mut self, load_watts: f64, now: DateTime<Utc>, rng: &mut dyn RandomSource) {
        let elapsed_hours =
            (now - self.last_sample).num_milliseconds() as f64 / MILLIS_PER_HOUR;
        if elapsed_hours > 0.0 {
            self.energy_total_wh += load_watts * elapsed_hours;
            self.last_sample = now;
        }

        let target = Self::target_temperature(load_watts);
        self.temperature_c = (self.temperature_c
            + (target - self.temperature_c) * RELAXATION
            + rng.uniform(-TEMP_JITTER_C, TEMP_JITTER_C))
        .clamp(TEMP_MIN_C, TEMP_MAX_C);

        self.voltage_v = (self.voltage_v + rng.uniform(-VOLTAGE_STEP_V, VOLTAGE_STEP_V))
            .clamp(VOLTAGE_MIN_V, VOLTAGE_MAX_V);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::random::{ScriptedRandom, SimRng};
    use chrono::Duration;

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_764_794_280, 0).unwrap()
    }

    #[test]
    fn integrates_energy_over_elapsed_hours() {
        let mut drift = TelemetryDrift::new(DriftSeed::default(), t0());
        let mut rng = ScriptedRandom::constant(0.5);
        drift.sample(1641.0, t0() + Duration::hours(2), &mut rng);
        assert!((drift.energy_total_wh - (2423.0 + 3282.0)).abs() < 1e-9);
        assert_eq!(drift.last_sample, t0() + Duration::hours(2));
    }

    #[test]
    fn back_to_back_reads_add_almost_nothing() {
        let mut drift = TelemetryDrift::new(DriftSeed::default(), t0());
        let mut rng = ScriptedRandom::constant(0.5);
        drift.sample(1641.0, t0(), &mut rng);
        assert_eq!(drift.energy_total_wh, 2423.0);
        drift.sample(1641.0, t0() + Duration::milliseconds(5), &mut rng);
        assert!(drift.energy_total_wh - 2423.0 < 0.01);
    }

    #[test]
    fn temperature_relaxes_toward_target() {
        let mut drift = TelemetryDrift::new(DriftSeed::default(), t0());
        let mut rng = ScriptedRandom::constant(0.5);
        // 30 + 1641/180 = 39.11
        drift.sample(1641.0, t0(), &mut rng);
        let expected = 34.0 + (30.0 + 1641.0 / 180.0 - 34.0) * 0.15;
        assert!((drift.temperature_c - expected).abs() < 1e-9);
        for _ in 0..200 {
            drift.sample(1641.0, t0(), &mut rng);
        }
        assert!((drift.temperature_c - TelemetryDrift::target_temperature(1641.0)).abs() < 1e-6);
    }

    #[test]
    fn target_temperature_is_clamped() {
        assert_eq!(TelemetryDrift::target_temperature(0.0), 30.0);
        assert_eq!(TelemetryDrift::target_temperature(10_000.0), 50.0);
    }

    #[test]
    fn idle_device_cools_to_floor() {
        let mut drift = TelemetryDrift::new(
            DriftSeed {
                temperature_c: 48.0,
                ..DriftSeed::default()
            },
            t0(),
        );
        let mut rng = ScriptedRandom::constant(0.5);
        for _ in 0..300 {
            drift.sample(0.0, t0(), &mut rng);
        }
        assert!((drift.temperature_c - 30.0).abs() < 1e-6);
    }

    #[test]
    fn voltage_and_temperature_stay_clamped() {
        let mut drift = TelemetryDrift::new(DriftSeed::default(), t0());
        let mut rng = SimRng::new(Some(21));
        for i in 0..5000 {
            drift.sample(1727.0, t0() + Duration::seconds(i), &mut rng);
            assert!((227.0..=235.0).contains(&drift.voltage_v));
            assert!((30.0..=50.0).contains(&drift.temperature_c));
        }
    }

    #[test]
    fn clock_going_backwards_keeps_energy() {
        let mut drift = TelemetryDrift::new(DriftSeed::default(), t0());
        let mut rng = ScriptedRandom::constant(0.5);
        drift.sample(1000.0, t0() - Duration::hours(1), &mut rng);
        assert_eq!(drift.energy_total_wh, 2423.0);
        assert_eq!(drift.last_sample, t0());
    }
}
