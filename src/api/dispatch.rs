//! Framework-independent request boundary.
//!
//! Maps a method, a path and decoded query parameters onto a [`SimContext`]
//! operation. The axum layer only adapts HTTP to and from this function.

use axum::http::Method;
use serde::Serialize;

use crate::api::params::{
    QueryParams, optional_brightness, optional_on, parse_flag, require_id,
};
use crate::devices::light::{Light, LightUpdate};
use crate::error::{Result, SimError};
use crate::sim::context::{LightStatus, SimContext};
use crate::sim::meter::{MeterReading, ScenarioChange};
use crate::sim::scenario::ScenarioKey;

/// Every path the simulator answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    MeterReading,
    MeterLatest,
    ChangeScenario,
    LightSet,
    LightStatus,
}

impl Route {
    pub fn resolve(path: &str) -> Option<Self> {
        match path {
            "/meter/reading" => Some(Self::MeterReading),
            "/meter/latest" => Some(Self::MeterLatest),
            "/meter/change-scenario" => Some(Self::ChangeScenario),
            "/light/set" | "/rpc/Light.Set" => Some(Self::LightSet),
            "/light/status" | "/rpc/Light.GetStatus" => Some(Self::LightStatus),
            _ => None,
        }
    }

    /// The device RPC path for light routes; meter routes have none.
    pub fn rpc_path(self) -> Option<&'static str> {
        match self {
            Self::LightSet => Some("/rpc/Light.Set"),
            Self::LightStatus => Some("/rpc/Light.GetStatus"),
            Self::MeterReading | Self::MeterLatest | Self::ChangeScenario => None,
        }
    }
}

/// A successful response body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Reply {
    Reading(MeterReading),
    ScenarioChanged(ScenarioChange),
    Light(Light),
    Status(LightStatus),
}

/// Serves one request against `ctx`.
///
/// Only `GET` is routed; any other method, like any unknown path, is
/// `NotFound`.
pub fn dispatch(
    ctx: &mut SimContext,
    method: &Method,
    path: &str,
    params: &QueryParams,
) -> Result<Reply> {
    let route = Route::resolve(path)
        .filter(|_| *method == Method::GET)
        .ok_or_else(|| SimError::not_found("not found"))?;

    match route {
        Route::MeterReading => Ok(Reply::Reading(ctx.meter_reading())),
        Route::MeterLatest => Ok(Reply::Reading(ctx.latest_reading())),
        Route::ChangeScenario => {
            let key: ScenarioKey = params.get("scenario").unwrap_or_default().parse()?;
            let negative = params
                .has("negative")
                .then(|| parse_flag(params.get("negative")));
            Ok(Reply::ScenarioChanged(ctx.change_scenario(key, negative)))
        }
        Route::LightSet => {
            let id = require_id(params)?;
            // Existence is checked before the optional parameters so an
            // unknown id wins over a malformed brightness.
            ctx.lights().get(id)?;
            let update = LightUpdate {
                on: optional_on(params)?,
                brightness: optional_brightness(params)?,
            };
            ctx.set_light(id, update).map(Reply::Light)
        }
        Route::LightStatus => {
            let id = require_id(params)?;
            ctx.light_status(id).map(Reply::Status)
        }
    }
}
