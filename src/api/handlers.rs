//! The single axum handler behind every path.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::{Method, Uri};
use axum::response::{IntoResponse, Response};

use super::AppState;
use super::dispatch::{Route, dispatch};
use super::params::QueryParams;
use crate::error::SimError;

/// Serves one request, forwarding light routes when a device is configured.
pub async fn handle_request(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
) -> Response {
    if let (Some(forwarder), Some(route), true) = (
        &state.forwarder,
        Route::resolve(uri.path()),
        method == Method::GET,
    ) {
        if let Some(result) = forwarder.forward(route, uri.query()).await {
            return match result {
                Ok(upstream) => upstream.into_response(),
                Err(err) => err.into_response(),
            };
        }
    }

    let params = match Query::<Vec<(String, String)>>::try_from_uri(&uri) {
        Ok(Query(pairs)) => QueryParams::new(pairs),
        Err(rejection) => return SimError::invalid(rejection.body_text()).into_response(),
    };

    let mut sim = state.sim.lock().await;
    match dispatch(&mut sim, &method, uri.path(), &params) {
        Ok(reply) => Json(reply).into_response(),
        Err(err) => err.into_response(),
    }
}
