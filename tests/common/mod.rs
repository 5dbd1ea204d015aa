//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use meter_light_sim::api::forward::DeviceForwarder;
use meter_light_sim::api::{AppState, router};
use meter_light_sim::sim::clock::ManualClock;
use meter_light_sim::sim::context::{SimContext, SimOptions};
use meter_light_sim::sim::random::{ScriptedRandom, SimRng};

/// 2025-12-03T20:38:00Z
pub const T0_MILLIS: i64 = 1_764_794_280_000;

/// Context whose every random draw is the midpoint of its range.
pub fn midpoint_context(clock: &ManualClock) -> SimContext {
    SimContext::new(
        SimOptions::default(),
        Box::new(ScriptedRandom::constant(0.5)),
        Box::new(clock.clone()),
    )
}

/// Context driven by a seeded generator.
pub fn seeded_context(seed: u64, clock: &ManualClock) -> SimContext {
    SimContext::new(
        SimOptions::default(),
        Box::new(SimRng::new(Some(seed))),
        Box::new(clock.clone()),
    )
}

pub fn app(sim: SimContext) -> Router {
    router(Arc::new(AppState::new(sim, None)))
}

pub fn forwarding_app(sim: SimContext, base_url: &str) -> Router {
    let forwarder = DeviceForwarder::new(base_url).expect("client should build");
    router(Arc::new(AppState::new(sim, Some(forwarder))))
}

/// Sends `GET uri` and returns status plus decoded JSON body.
pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request should build");
    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("router is infallible");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    let json = serde_json::from_slice(&body).expect("body should be JSON");
    (status, json)
}
