//! Catalog data models shared by the store, service and HTTP layers.

pub mod auth;
pub mod reference;
pub mod service;
pub mod service_point;

pub use auth::{AuthPlacement, CreateOAuthRequest, CreateStaticAuthRequest, OAuthAuth, StaticAuth};
pub use reference::{Category, ParameterType};
pub use service::{
    CreateServiceRequest, ListServicesQuery, NewService, Service, ServiceCard, ServiceDetail,
    ServiceWithCategory, UpdateServiceRequest,
};
pub use service_point::{
    CreateEndpointRequest, NewParameter, Parameter, ParameterUpsert, ServicePoint,
    ServicePointWithParameters, UpdateServicePointRequest,
};
