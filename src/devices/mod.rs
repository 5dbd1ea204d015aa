//! Simulated devices.

/// Dimmable light state and the light store.
pub mod light;
/// Brightness to power-draw interpolation.
pub mod power_curve;
pub mod types;

pub use light::{Light, LightStore, LightUpdate};
pub use types::{Device, LoadSink};
