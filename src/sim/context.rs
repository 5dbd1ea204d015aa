//! The simulation context: sole owner of all mutable simulation state.
//!
//! One `SimContext` lives for the lifetime of the process and is handed by
//! reference to each request. Randomness and time come from the injected
//! [`RandomSource`] and [`Clock`], so a context built with scripted sources
//! replays exactly.

use serde::Serialize;

use crate::devices::light::{Light, LightStore, LightUpdate};
use crate::error::Result;
use crate::sim::clock::Clock;
use crate::sim::drift::{DriftSeed, TelemetryDrift};
use crate::sim::meter::{MeterEngine, MeterReading, ScenarioChange};
use crate::sim::random::RandomSource;
use crate::sim::scenario::ScenarioKey;
use crate::sim::{round_half_up, round_to};

/// Measurement jitter added to a lit light's reported active power (W).
const APOWER_JITTER_W: f64 = 12.0;

/// Start-up state of a [`SimContext`].
#[derive(Debug, Clone, PartialEq)]
pub struct SimOptions {
    pub light_ids: Vec<i64>,
    pub scenario: ScenarioKey,
    pub negative_override: bool,
    pub drift: DriftSeed,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            light_ids: vec![0],
            scenario: ScenarioKey::SunnyExport,
            negative_override: false,
            drift: DriftSeed::default(),
        }
    }
}

/// Device-status payload for one light.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LightStatus {
    pub id: i64,
    pub source: &'static str,
    pub output: bool,
    pub brightness: u8,
    pub temperature: Temperature,
    pub aenergy: ActiveEnergy,
    pub apower: f64,
    pub current: f64,
    pub voltage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Temperature {
    #[serde(rename = "tC")]
    pub t_c: f64,
    #[serde(rename = "tF")]
    pub t_f: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveEnergy {
    /// Accumulated energy (Wh).
    pub total: f64,
    pub by_minute: [f64; 3],
    pub minute_ts: i64,
}

pub struct SimContext {
    lights: LightStore,
    meter: MeterEngine,
    drift: TelemetryDrift,
    rng: Box<dyn RandomSource>,
    clock: Box<dyn Clock>,
}

impl SimContext {
    pub fn new(options: SimOptions, rng: Box<dyn RandomSource>, clock: Box<dyn Clock>) -> Self {
        let lights = LightStore::new(&options.light_ids);
        let mut meter = MeterEngine::new(options.scenario, options.negative_override);
        lights.publish(&mut meter);
        let drift = TelemetryDrift::new(options.drift, clock.now());
        Self {
            lights,
            meter,
            drift,
            rng,
            clock,
        }
    }

    pub fn lights(&self) -> &LightStore {
        &self.lights
    }

    pub fn meter(&self) -> &MeterEngine {
        &self.meter
    }

    pub fn drift(&self) -> &TelemetryDrift {
        &self.drift
    }

    /// Steps the meter walk and returns the new reading.
    pub fn meter_reading(&mut self) -> MeterReading {
        let now = self.clock.now();
        self.meter.reading(self.rng.as_mut(), now)
    }

    /// Returns the cached reading without stepping; the first call produces one.
    pub fn latest_reading(&mut self) -> MeterReading {
        let now = self.clock.now();
        self.meter.latest(self.rng.as_mut(), now)
    }

    pub fn change_scenario(&mut self, key: ScenarioKey, negative: Option<bool>) -> ScenarioChange {
        let now = self.clock.now();
        self.meter.switch(key, negative, self.rng.as_mut(), now)
    }

    /// Applies a partial update to a light; the meter sees the new aggregate
    /// load before this returns.
    pub fn set_light(&mut self, id: i64, update: LightUpdate) -> Result<Light> {
        self.lights.set(id, update, self.rng.as_mut(), &mut self.meter)
    }

    /// Samples the drift model under the light's draw and reports status.
    pub fn light_status(&mut self, id: i64) -> Result<LightStatus> {
        let light = self.lights.get(id)?.clone();
        let now = self.clock.now();
        self.drift.sample(light.power_watts, now, self.rng.as_mut());

        let voltage = round_to(self.drift.voltage_v, 1);
        let apower = if light.on {
            let jitter = self.rng.uniform(-APOWER_JITTER_W, APOWER_JITTER_W);
            round_half_up(light.power_watts + jitter).max(0.0)
        } else {
            0.0
        };
        let current = if voltage == 0.0 {
            0.0
        } else {
            round_to(apower / voltage, 3)
        };
        let t_c = round_to(self.drift.temperature_c, 1);

        Ok(LightStatus {
            id,
            source: "HTTP_in",
            output: light.on,
            brightness: light.brightness,
            temperature: Temperature {
                t_c,
                t_f: round_to(t_c * 9.0 / 5.0 + 32.0, 1),
            },
            aenergy: ActiveEnergy {
                total: round_to(self.drift.energy_total_wh, 3),
                by_minute: [0.0; 3],
                minute_ts: now.timestamp(),
            },
            apower,
            current,
            voltage,
        })
    }
}
