//! Authorization metadata attached to services.
//!
//! These records are descriptive only; nothing in the catalog issues or
//! checks credentials.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::errors::{AppError, AppResult};

/// Where a static token is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AuthPlacement {
    Header,
    Query,
}

impl AuthPlacement {
    /// Value stored in `default_auth.type_id`.
    pub fn type_id(self) -> i32 {
        match self {
            AuthPlacement::Header => 1,
            AuthPlacement::Query => 2,
        }
    }

    pub fn from_type_id(type_id: i32) -> Option<Self> {
        match type_id {
            1 => Some(AuthPlacement::Header),
            2 => Some(AuthPlacement::Query),
            _ => None,
        }
    }
}

/// Body of `POST /api/create-auth-service`.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateStaticAuthRequest {
    #[validate(length(min = 1, message = "Service name is required"))]
    pub service_name: String,
    #[validate(length(min = 1, message = "Token is required"))]
    pub token: String,
    #[validate(length(min = 1, message = "Parameter name is required"))]
    pub param_name: String,
    /// 1 = header, 2 = query.
    #[serde(rename = "auth_id")]
    #[validate(range(min = 1, max = 2, message = "auth_id must be 1 (header) or 2 (query)"))]
    pub auth_id: i32,
}

impl CreateStaticAuthRequest {
    pub fn placement(&self) -> Option<AuthPlacement> {
        AuthPlacement::from_type_id(self.auth_id)
    }
}

/// Body of `POST /api/create-oauth-service`.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOAuthRequest {
    #[validate(length(min = 1, message = "Service name is required"))]
    pub service_name: String,
    #[validate(length(min = 1, message = "Client id is required"))]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub client_url: Option<String>,
    #[serde(default)]
    pub authorization_content_type: Option<String>,
    #[serde(default)]
    pub authorization_url: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// A row of `services.default_auth`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StaticAuth {
    pub service_id: i32,
    pub token: String,
    pub placement: AuthPlacement,
    pub param_name: String,
}

impl StaticAuth {
    /// Fails with 400 when `auth_id` names no known placement.
    pub fn from_request(service_id: i32, req: &CreateStaticAuthRequest) -> AppResult<Self> {
        let placement = req.placement().ok_or_else(|| {
            AppError::BadRequest(format!("Unknown auth_id {}", req.auth_id))
        })?;
        Ok(Self {
            service_id,
            token: req.token.clone(),
            placement,
            param_name: req.param_name.clone(),
        })
    }
}

/// A row of `services.oauth_auth`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OAuthAuth {
    pub service_id: i32,
    pub client_id: String,
    pub client_secret: Option<String>,
    pub client_url: Option<String>,
    pub authorization_url: Option<String>,
    pub authorization_content_type: Option<String>,
    pub scope: Option<String>,
}

impl OAuthAuth {
    pub fn from_request(service_id: i32, req: &CreateOAuthRequest) -> Self {
        Self {
            service_id,
            client_id: req.client_id.clone(),
            client_secret: req.client_secret.clone(),
            client_url: req.client_url.clone(),
            authorization_url: req.authorization_url.clone(),
            authorization_content_type: req.authorization_content_type.clone(),
            scope: req.scope.clone(),
        }
    }
}
