//! Request-scoped error taxonomy.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::api::types::ErrorResponse;

pub type Result<T> = std::result::Result<T, SimError>;

/// Every failure is terminal for the request that raised it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimError {
    /// Missing, malformed or out-of-range parameter.
    #[error("{0}")]
    InvalidArgument(String),
    /// Unknown light id or unknown path.
    #[error("{0}")]
    NotFound(String),
    /// The configured real device could not be reached.
    #[error("upstream device error: {0}")]
    Upstream(String),
}

impl SimError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// HTTP status the error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for SimError {
    fn into_response(self) -> Response {
        let status = self.status();
        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
