//! Response bodies shared by all handlers.

use serde::Serialize;
use utoipa::ToSchema;

/// Error body returned for every failed request.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Human-readable error message.
    pub error: String,

    /// Error code for client handling (e.g., "VALIDATION_ERROR", "SERVICE_EXISTS").
    pub code: String,

    /// Additional error details (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Plain acknowledgement for writes that do not echo a resource.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_body_omits_empty_details() {
        let json = serde_json::to_value(ErrorBody::new("boom", "INTERNAL_ERROR")).unwrap();
        assert_eq!(json["error"], "boom");
        assert!(json.get("details").is_none());

        let json = serde_json::to_value(
            ErrorBody::new("bad", "VALIDATION_ERROR").with_details(serde_json::json!({"f": 1})),
        )
        .unwrap();
        assert_eq!(json["details"]["f"], 1);
    }
}
