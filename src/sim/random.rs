//! Injectable randomness for every stochastic draw in the simulation.

use rand::{Rng, SeedableRng, rngs::StdRng};

/// Source of uniform samples.
///
/// Implementors only provide [`RandomSource::next_unit`]; the derived draws
/// are shared so every source produces identical shapes for the same stream.
pub trait RandomSource: Send {
    /// Returns a sample in `[0, 1)`.
    fn next_unit(&mut self) -> f64;

    /// Uniform draw in `[min, max)`. Returns `min` when the range is empty
    /// or inverted.
    fn uniform(&mut self, min: f64, max: f64) -> f64 {
        if max <= min {
            return min;
        }
        min + self.next_unit() * (max - min)
    }

    /// Returns `true` with the given probability.
    fn chance(&mut self, probability: f64) -> bool {
        self.next_unit() < probability
    }
}

/// Production source backed by `StdRng`.
///
/// # Examples
///
/// ```
/// use meter_light_sim::sim::random::{RandomSource, SimRng};
///
/// let mut a = SimRng::new(Some(7));
/// let mut b = SimRng::new(Some(7));
/// assert_eq!(a.uniform(-1.0, 1.0), b.uniform(-1.0, 1.0));
/// ```
#[derive(Debug, Clone)]
pub struct SimRng {
    rng: StdRng,
}

impl SimRng {
    /// Seeds from `seed` when given, otherwise from OS entropy.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self { rng }
    }
}

impl RandomSource for SimRng {
    fn next_unit(&mut self) -> f64 {
        self.rng.random::<f64>()
    }
}

/// Replays a fixed list of unit samples, cycling when exhausted.
#[derive(Debug, Clone)]
pub struct ScriptedRandom {
    values: Vec<f64>,
    cursor: usize,
}

impl ScriptedRandom {
    /// Values are clamped into `[0, 1)`. An empty script behaves like
    /// `constant(0.5)`.
    pub fn new(values: Vec<f64>) -> Self {
        let values = if values.is_empty() {
            vec![0.5]
        } else {
            values
                .into_iter()
                .map(|v| v.clamp(0.0, 1.0 - f64::EPSILON))
                .collect()
        };
        Self { values, cursor: 0 }
    }

    /// Always returns `value`. `constant(0.5)` makes every uniform draw land
    /// on its midpoint and suppresses any chance below one half.
    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }
}

impl RandomSource for ScriptedRandom {
    fn next_unit(&mut self) -> f64 {
        let value = self.values[self.cursor % self.values.len()];
        self.cursor = self.cursor.wrapping_add(1);
        value
    }
}
