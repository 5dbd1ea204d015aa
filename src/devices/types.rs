//! Common traits for simulated loads and the consumers of their draw.

/// A device whose instantaneous electrical draw can be sampled.
///
/// Positive values are consumption, matching the meter's sign convention
/// (negative = exporting to the grid).
pub trait Device {
    /// Current draw in watts.
    fn power_watts(&self) -> f64;

    /// Returns a human-readable type name for the device.
    fn device_type(&self) -> &'static str;
}

/// Receives the aggregate draw of all actuated devices.
///
/// Device stores call this after every mutation; the receiver never reads
/// back into the store.
pub trait LoadSink {
    fn publish_load(&mut self, watts: f64);
}

/// Sums the draw of a set of devices.
pub fn aggregate_watts<'a, D>(devices: impl IntoIterator<Item = &'a D>) -> f64
where
    D: Device + 'a,
{
    devices.into_iter().map(Device::power_watts).sum()
}
