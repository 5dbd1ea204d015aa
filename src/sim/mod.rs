/// Injectable wall clock.
pub mod clock;
pub mod context;
/// Lazy ambient telemetry model.
pub mod drift;
pub mod meter;
/// Injectable random source.
pub mod random;
pub mod scenario;

/// Rounds to the nearest integer, with halves going towards positive
/// infinity (`-2.5` becomes `-2`).
pub fn round_half_up(x: f64) -> f64 {
    (x + 0.5).floor()
}

/// Rounds to `decimals` places.
pub fn round_to(x: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (x * scale).round() / scale
}
