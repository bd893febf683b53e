//! Catalog persistence.
//!
//! Handlers never touch a pool directly: they go through [`CatalogStore`],
//! which the application state holds as a trait object. Every method that
//! writes more than one row is atomic; a failure leaves the catalog as it was.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use common::errors::AppResult;
use common::models::{
    Category, CreateEndpointRequest, CreateOAuthRequest, CreateStaticAuthRequest,
    ListServicesQuery, NewService, ParameterType, Service, ServicePoint,
    ServicePointWithParameters, ServiceWithCategory, UpdateServicePointRequest,
};

pub use memory::InMemoryCatalogStore;
pub use postgres::PgCatalogStore;

/// Data access for the service catalog.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Lists services joined with their category name.
    async fn list_services(&self, query: &ListServicesQuery) -> AppResult<Vec<ServiceWithCategory>>;

    /// Looks up a service by its unique name.
    async fn find_service(&self, name: &str) -> AppResult<Option<Service>>;

    /// Whether a service with this name exists.
    async fn service_exists(&self, name: &str) -> AppResult<bool>;

    /// Inserts a service. Fails with `ServiceExists` when the name is taken.
    async fn insert_service(&self, service: &NewService) -> AppResult<Service>;

    /// Renames/redescribes the service currently called `name`.
    async fn update_service(
        &self,
        name: &str,
        new_name: &str,
        description: Option<&str>,
    ) -> AppResult<Option<Service>>;

    /// Deletes a service, returning the removed row.
    async fn delete_service(&self, name: &str) -> AppResult<Option<Service>>;

    /// Endpoints of a service without their parameters.
    async fn list_service_points(&self, service_id: i32) -> AppResult<Vec<ServicePoint>>;

    /// Endpoints of a service, each with its parameters.
    async fn list_points_with_parameters(
        &self,
        service_id: i32,
    ) -> AppResult<Vec<ServicePointWithParameters>>;

    /// Adds an endpoint and its parameters to the named service.
    ///
    /// Returns the service id. Unknown service → `ServiceNotFound`; unknown
    /// parameter type → `ParameterTypeNotFound`.
    async fn create_endpoint(&self, service_name: &str, req: &CreateEndpointRequest) -> AppResult<i32>;

    /// Updates an endpoint and upserts its parameters.
    async fn update_service_point(&self, point_id: i32, req: &UpdateServicePointRequest) -> AppResult<()>;

    /// Deletes one parameter of an endpoint. Returns whether a row was removed.
    async fn delete_parameter(&self, point_id: i32, param_id: i32) -> AppResult<bool>;

    /// Deletes an endpoint, returning the id of the service it belonged to.
    async fn delete_service_point(&self, point_id: i32) -> AppResult<Option<i32>>;

    async fn list_parameter_types(&self) -> AppResult<Vec<ParameterType>>;

    async fn list_categories(&self) -> AppResult<Vec<Category>>;

    /// Attaches static token metadata to the named service.
    async fn insert_static_auth(&self, req: &CreateStaticAuthRequest) -> AppResult<()>;

    /// Attaches OAuth client metadata to the named service.
    async fn insert_oauth(&self, req: &CreateOAuthRequest) -> AppResult<()>;

    /// Cheap round trip used by the health endpoint.
    async fn ping(&self) -> AppResult<()>;
}
