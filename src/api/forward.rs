//! Proxying of light requests to a real device.

use std::time::Duration;

use axum::body::Bytes;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::{debug, warn};

use crate::api::dispatch::Route;
use crate::error::{Result, SimError};

const FORWARD_TIMEOUT: Duration = Duration::from_secs(5);

/// Forwards light RPC calls to the device at `base_url`.
#[derive(Debug, Clone)]
pub struct DeviceForwarder {
    client: reqwest::Client,
    base_url: String,
}

/// The upstream answer, relayed as-is.
#[derive(Debug)]
pub struct ForwardedResponse {
    pub status: StatusCode,
    pub content_type: Option<HeaderValue>,
    pub body: Bytes,
}

impl DeviceForwarder {
    pub fn new(base_url: &str) -> std::result::Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(FORWARD_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Upstream URL for `rpc_path` with the raw query appended.
    pub fn target_url(&self, rpc_path: &str, query: Option<&str>) -> String {
        match query.filter(|q| !q.is_empty()) {
            Some(query) => format!("{}{rpc_path}?{query}", self.base_url),
            None => format!("{}{rpc_path}", self.base_url),
        }
    }

    /// Sends the request upstream. Routes without an RPC path are not
    /// forwardable and yield `None`.
    pub async fn forward(
        &self,
        route: Route,
        query: Option<&str>,
    ) -> Option<Result<ForwardedResponse>> {
        let rpc_path = route.rpc_path()?;
        let url = self.target_url(rpc_path, query);
        debug!(%url, "forwarding to device");
        Some(self.fetch(&url).await)
    }

    async fn fetch(&self, url: &str) -> Result<ForwardedResponse> {
        let response = self.client.get(url).send().await.map_err(|e| {
            warn!(url, error = %e, "device request failed");
            SimError::Upstream(e.to_string())
        })?;

        let status = StatusCode::from_u16(response.status().as_u16())
            .unwrap_or(StatusCode::BAD_GATEWAY);
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| HeaderValue::from_bytes(v.as_bytes()).ok());
        let body = response.bytes().await.map_err(|e| {
            warn!(url, error = %e, "device response body unreadable");
            SimError::Upstream(e.to_string())
        })?;

        Ok(ForwardedResponse {
            status,
            content_type,
            body,
        })
    }
}

impl IntoResponse for ForwardedResponse {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.body).into_response();
        if let Some(content_type) = self.content_type {
            response.headers_mut().insert(CONTENT_TYPE, content_type);
        }
        response
    }
}
