//! Brightness to power-draw model for the dimmable load.
//!
//! The table below was sampled from real hardware. It is deliberately not
//! evenly spaced and is not monotonic: between level 56 and 57 the measured
//! draw drops by roughly 370 W. Keep it verbatim.

use crate::sim::random::RandomSource;
use crate::sim::round_half_up;

/// One measured brightness level and the draw range observed at it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterpolationPoint {
    /// Brightness level in `[0, 100]`.
    pub level: u8,
    /// Lowest observed draw (W).
    pub min: f64,
    /// Highest observed draw (W).
    pub max: f64,
}

const fn point(level: u8, min: f64, max: f64) -> InterpolationPoint {
    InterpolationPoint { level, min, max }
}

/// Measured draw table, ordered by level.
pub const BRIGHTNESS_POWER_POINTS: &[InterpolationPoint] = &[
    point(0, 0.0, 0.0),
    point(6, 515.0, 565.0),
    point(27, 551.0, 603.0),
    point(28, 584.0, 625.0),
    point(29, 614.0, 666.0),
    point(30, 653.0, 696.0),
    point(31, 727.0, 737.0),
    point(32, 748.0, 769.0),
    point(33, 775.0, 822.0),
    point(34, 812.0, 868.0),
    point(35, 855.0, 911.0),
    point(36, 899.0, 957.0),
    point(37, 950.0, 1003.0),
    point(38, 991.0, 1023.0),
    point(39, 1065.0, 1077.0),
    point(40, 1071.0, 1131.0),
    point(41, 1080.0, 1152.0),
    point(42, 1143.0, 1164.0),
    point(43, 1184.0, 1215.0),
    point(44, 1212.0, 1252.0),
    point(45, 1251.0, 1290.0),
    point(46, 1275.0, 1312.0),
    point(47, 1308.0, 1341.0),
    point(48, 1330.0, 1381.0),
    point(49, 1358.0, 1413.0),
    point(50, 1393.0, 1438.0),
    point(51, 1411.0, 1459.0),
    point(52, 1433.0, 1473.0),
    point(53, 1469.0, 1495.0),
    point(54, 1481.0, 1512.0),
    point(55, 1509.0, 1534.0),
    point(56, 1529.0, 1555.0),
    point(57, 1155.0, 1215.0),
    point(58, 1180.0, 1251.0),
    point(59, 1228.0, 1280.0),
    point(60, 1270.0, 1321.0),
    point(61, 1296.0, 1340.0),
    point(62, 1320.0, 1372.0),
    point(63, 1348.0, 1405.0),
    point(64, 1386.0, 1432.0),
    point(65, 1410.0, 1450.0),
    point(66, 1430.0, 1477.0),
    point(67, 1465.0, 1503.0),
    point(68, 1508.0, 1532.0),
    point(69, 1511.0, 1546.0),
    point(70, 1543.0, 1566.0),
    point(71, 1546.0, 1588.0),
    point(72, 1584.0, 1605.0),
    point(73, 1591.0, 1609.0),
    point(74, 1596.0, 1614.0),
    point(75, 1631.0, 1650.0),
    point(80, 1644.0, 1658.0),
    point(85, 1687.0, 1695.0),
    point(90, 1705.0, 1711.0),
    point(95, 1712.0, 1716.0),
    point(100, 1719.0, 1727.0),
];

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Returns the interpolated `(min, max)` draw range at `brightness`.
///
/// Levels outside `[0, 100]` are clamped first. An exact table hit returns
/// that point's range; otherwise both bounds are interpolated linearly
/// between the tightest bracketing points.
pub fn draw_range(brightness: i64) -> (f64, f64) {
    let target = brightness.clamp(0, 100);
    let (Some(first), Some(last)) = (
        BRIGHTNESS_POWER_POINTS.first(),
        BRIGHTNESS_POWER_POINTS.last(),
    ) else {
        return (0.0, 0.0);
    };

    let mut lower = first;
    let mut upper = last;
    for p in BRIGHTNESS_POWER_POINTS {
        let level = i64::from(p.level);
        if level == target {
            return (p.min, p.max);
        }
        if level < target {
            lower = p;
        } else {
            upper = p;
            break;
        }
    }

    let span = f64::from(upper.level) - f64::from(lower.level);
    let ratio = if span == 0.0 {
        0.0
    } else {
        (target as f64 - f64::from(lower.level)) / span
    };
    (
        lerp(lower.min, upper.min, ratio),
        lerp(lower.max, upper.max, ratio),
    )
}

/// Estimates the instantaneous draw (W) at `brightness`.
///
/// The result is a uniform draw inside the interpolated range, rounded to
/// a whole watt, so repeated calls jitter the way the real load does.
/// Zero or negative brightness always yields exactly 0.
pub fn estimate_power(brightness: i64, rng: &mut dyn RandomSource) -> f64 {
    if brightness <= 0 {
        return 0.0;
    }
    let (min, max) = draw_range(brightness);
    round_half_up(rng.uniform(min, max))
}
