//! Read-only reference data.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A row of `services.service_categories`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Category {
    pub id: i32,
    pub name: String,
}

/// A row of `components.type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct ParameterType {
    pub id: i32,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub type_name: String,
}

/// Parameter types seeded into a fresh catalog.
pub const DEFAULT_PARAMETER_TYPES: [&str; 6] =
    ["string", "integer", "number", "boolean", "array", "object"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_type_serializes_as_type() {
        let json = serde_json::to_value(ParameterType {
            id: 1,
            type_name: "string".into(),
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"id": 1, "type": "string"}));
    }
}
