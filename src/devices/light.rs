use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::devices::power_curve::estimate_power;
use crate::devices::types::{Device, LoadSink, aggregate_watts};
use crate::error::{Result, SimError};
use crate::sim::random::RandomSource;

/// A dimmable light and the draw derived from its brightness.
///
/// `power_watts` is non-zero only while the light is on with a brightness
/// above zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Light {
    #[serde(skip)]
    pub id: i64,
    pub on: bool,
    /// Brightness level in `[0, 100]`.
    pub brightness: u8,
    pub power_watts: f64,
}

/// Partial update; `None` fields are left as they are.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LightUpdate {
    pub on: Option<bool>,
    pub brightness: Option<u8>,
}

impl Light {
    /// A light that is off at brightness zero.
    pub fn new(id: i64) -> Self {
        Self {
            id,
            on: false,
            brightness: 0,
            power_watts: 0.0,
        }
    }

    /// Applies `update` and returns whether the state changed.
    ///
    /// A brightness change drags `on` along with it: above zero switches the
    /// light on, exactly zero switches it off. Any change re-estimates the
    /// draw; an update that changes nothing keeps the previous estimate.
    pub fn apply(&mut self, update: LightUpdate, rng: &mut dyn RandomSource) -> bool {
        let on_changed = update.on.is_some_and(|on| on != self.on);
        let brightness_changed = update.brightness.is_some_and(|b| b != self.brightness);

        if let Some(on) = update.on {
            self.on = on;
        }
        if let Some(brightness) = update.brightness {
            self.brightness = brightness;
        }

        if !(on_changed || brightness_changed) {
            return false;
        }

        if brightness_changed {
            if self.brightness > 0 && !self.on {
                self.on = true;
            } else if self.brightness == 0 && self.on {
                self.on = false;
            }
        }

        self.power_watts = if self.on {
            estimate_power(i64::from(self.brightness), rng)
        } else {
            0.0
        };
        true
    }
}

impl Device for Light {
    fn power_watts(&self) -> f64 {
        self.power_watts
    }

    fn device_type(&self) -> &'static str {
        "DimmableLight"
    }
}

/// Owns every simulated light. Lights are created up front and never removed.
#[derive(Debug, Clone)]
pub struct LightStore {
    lights: BTreeMap<i64, Light>,
}

impl LightStore {
    pub fn new(ids: &[i64]) -> Self {
        Self {
            lights: ids.iter().map(|&id| (id, Light::new(id))).collect(),
        }
    }

    pub fn get(&self, id: i64) -> Result<&Light> {
        self.lights
            .get(&id)
            .ok_or_else(|| SimError::not_found("light not found"))
    }

    pub fn ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.lights.keys().copied()
    }

    /// Sum of the draw of all lights (W).
    pub fn total_watts(&self) -> f64 {
        aggregate_watts(self.lights.values())
    }

    /// Pushes the current aggregate draw into `sink`.
    pub fn publish(&self, sink: &mut dyn LoadSink) {
        sink.publish_load(self.total_watts());
    }

    /// Applies a partial update to light `id`, then republishes the
    /// aggregate load. Returns the updated light.
    pub fn set(
        &mut self,
        id: i64,
        update: LightUpdate,
        rng: &mut dyn RandomSource,
        sink: &mut dyn LoadSink,
    ) -> Result<Light> {
        let light = self
            .lights
            .get_mut(&id)
            .ok_or_else(|| SimError::not_found("light not found"))?;
        let changed = light.apply(update, rng);
        let updated = light.clone();
        debug!(
            device = updated.device_type(),
            id,
            changed,
            on = updated.on,
            brightness = updated.brightness,
            power_watts = updated.power_watts,
            "light updated"
        );
        self.publish(sink);
        Ok(updated)
    }
}
