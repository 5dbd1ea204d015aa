//! Wire types shared by the API layer.

use serde::Serialize;

/// Error response body for every non-2xx answer produced locally.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_body_shape() {
        let body = serde_json::to_value(ErrorResponse {
            error: "light not found".to_string(),
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({ "error": "light not found" }));
    }
}
