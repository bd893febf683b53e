//! Service entity and its request/response shapes.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use super::service_point::ServicePointWithParameters;

/// `api_source` recorded for services entered through the API.
pub const MANUAL_API_SOURCE: &str = "manual";

/// Placeholder `token` recorded for services entered through the API.
pub const PLACEHOLDER_TOKEN: &str = "no";

/// A row of `services.service`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Service {
    pub id: i32,
    pub uri: Option<String>,
    /// Unique display name, also used as the key in URLs.
    pub name: String,
    pub description: Option<String>,
    /// File name of the logo inside the image directory.
    pub logo: Option<String>,
    pub category_id: Option<i32>,
    pub api_source: Option<String>,
    pub token: Option<String>,
}

/// Service joined with the name of its category.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct ServiceWithCategory {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub service: Service,
    pub category_name: Option<String>,
}

/// Catalog listing entry with the logo embedded as a data URI.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ServiceCard {
    #[serde(flatten)]
    pub entry: ServiceWithCategory,
    pub image: String,
}

/// Full service view: endpoints, their parameters and the logo.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDetail {
    pub service_name: String,
    pub service_description: Option<String>,
    pub service_points: Vec<ServicePointWithParameters>,
    pub service_logo: String,
}

/// Filters for the catalog listing.
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct ListServicesQuery {
    /// Case-insensitive substring of the service name.
    pub search: Option<String>,
    /// Exact category name.
    pub category: Option<String>,
}

impl ListServicesQuery {
    /// Search term, `None` when absent or blank.
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Category filter, `None` when absent or blank.
    pub fn category_name(&self) -> Option<&str> {
        self.category.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Applies the filters to an already loaded row.
    pub fn matches(&self, entry: &ServiceWithCategory) -> bool {
        let name_ok = self.search_term().map_or(true, |term| {
            entry
                .service
                .name
                .to_lowercase()
                .contains(&term.to_lowercase())
        });
        let category_ok = self
            .category_name()
            .map_or(true, |category| entry.category_name.as_deref() == Some(category));
        name_ok && category_ok
    }
}

/// Fields accepted when registering a service (multipart or JSON).
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct CreateServiceRequest {
    #[validate(
        length(min = 1, max = 255, message = "Name must be 1-255 characters"),
        custom(function = "not_blank")
    )]
    pub name: String,
    #[validate(
        length(min = 1, message = "URI is required"),
        custom(function = "not_blank")
    )]
    pub uri: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "categoryId", alias = "category_id")]
    pub category_id: Option<i32>,
}

/// Values written to `services.service` on creation.
#[derive(Debug, Clone)]
pub struct NewService {
    pub uri: String,
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<i32>,
    pub logo: String,
    pub api_source: String,
    pub token: String,
}

impl NewService {
    /// Builds a manually entered service with the given logo file name.
    pub fn manual(req: &CreateServiceRequest, logo: impl Into<String>) -> Self {
        Self {
            uri: req.uri.trim().to_string(),
            name: req.name.trim().to_string(),
            description: req.description.clone(),
            category_id: req.category_id,
            logo: logo.into(),
            api_source: MANUAL_API_SOURCE.to_string(),
            token: PLACEHOLDER_TOKEN.to_string(),
        }
    }
}

/// Rename/redescribe request for an existing service.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateServiceRequest {
    #[validate(
        length(min = 1, max = 255, message = "Name must be 1-255 characters"),
        custom(function = "not_blank")
    )]
    pub service_display_name: String,
    #[serde(default)]
    pub service_description: Option<String>,
}

/// Names and URIs are stored trimmed, so whitespace alone counts as empty.
fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank")
            .with_message(Cow::Borrowed("Must not be blank")));
    }
    Ok(())
}
