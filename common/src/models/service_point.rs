//! Service points (endpoints) and their parameters.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// A row of `services.service_points`, without the owning service id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct ServicePoint {
    pub id: i32,
    pub uri: String,
    pub description: Option<String>,
}

/// A parameter as shown to clients, with its type resolved to a name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Parameter {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub required: bool,
    #[serde(rename = "type")]
    pub type_name: Option<String>,
}

/// Endpoint together with its parameters.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ServicePointWithParameters {
    #[serde(flatten)]
    pub point: ServicePoint,
    pub parameters: Vec<Parameter>,
}

/// Parameter submitted with a new endpoint.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct NewParameter {
    #[validate(length(min = 1, message = "Parameter name is required"))]
    pub name: String,
    /// Name of an entry in the parameter type list.
    #[serde(rename = "type")]
    #[validate(length(min = 1, message = "Parameter type is required"))]
    pub type_name: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub description: Option<String>,
}

/// Body of `POST /api/services/{serviceName}/endpoints`.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateEndpointRequest {
    #[validate(length(min = 1, message = "URI is required"))]
    pub uri: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub parameters: Vec<NewParameter>,
}

impl CreateEndpointRequest {
    /// Distinct type names referenced by the parameters.
    pub fn type_names(&self) -> BTreeSet<&str> {
        self.parameters.iter().map(|p| p.type_name.as_str()).collect()
    }
}

/// Parameter in an update: carries an `id` when it already exists.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ParameterUpsert {
    #[serde(default)]
    pub id: Option<i32>,
    #[validate(length(min = 1, message = "Parameter name is required"))]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(rename = "type")]
    #[validate(length(min = 1, message = "Parameter type is required"))]
    pub type_name: String,
}

/// Body of `PUT /api/service-points/{id}/parameters`.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateServicePointRequest {
    #[validate(length(min = 1, message = "URI is required"))]
    pub uri: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub parameters: Vec<ParameterUpsert>,
}

impl UpdateServicePointRequest {
    /// Distinct type names referenced by the parameters.
    pub fn type_names(&self) -> BTreeSet<&str> {
        self.parameters.iter().map(|p| p.type_name.as_str()).collect()
    }
}
