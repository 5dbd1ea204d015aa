//! Stateful mock of a dimmable light and the P1 power meter it feeds.

/// HTTP surface and request dispatch.
pub mod api;
pub mod cli;
pub mod config;
pub mod devices;
pub mod error;
/// Meter scenarios, telemetry drift, and the simulation context.
pub mod sim;
