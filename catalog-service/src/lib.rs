//! Catalog of third-party API services.
//!
//! Services, their endpoints ("service points"), typed parameters and auth
//! metadata, exposed over a JSON API next to the compiled UI bundle.

pub mod form;
pub mod handlers;
pub mod images;
pub mod routes;
pub mod service;
pub mod state;
pub mod store;

use axum::{extract::DefaultBodyLimit, middleware, routing::get, Json, Router};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use common::middleware::request_id::request_id_middleware;

pub use state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Service catalog API",
        version = "0.1.0",
        description = "Registry of third-party API services, endpoints, parameters and auth metadata"
    ),
    paths(
        handlers::list_services,
        handlers::get_service,
        handlers::create_service,
        handlers::update_service,
        handlers::delete_service,
        handlers::create_endpoint,
        handlers::update_service_point,
        handlers::delete_parameter,
        handlers::delete_service_point,
        handlers::list_parameter_types,
        handlers::list_categories,
        handlers::create_static_auth,
        handlers::create_oauth,
        handlers::health_check,
    ),
    components(schemas(
        common::models::Service,
        common::models::ServiceWithCategory,
        common::models::ServiceCard,
        common::models::ServiceDetail,
        common::models::ServicePoint,
        common::models::Parameter,
        common::models::ServicePointWithParameters,
        common::models::CreateServiceRequest,
        common::models::UpdateServiceRequest,
        common::models::CreateEndpointRequest,
        common::models::NewParameter,
        common::models::UpdateServicePointRequest,
        common::models::ParameterUpsert,
        common::models::Category,
        common::models::ParameterType,
        common::models::CreateStaticAuthRequest,
        common::models::CreateOAuthRequest,
        common::response::ErrorBody,
        common::response::MessageResponse,
        handlers::HealthResponse,
    )),
    tags(
        (name = "services", description = "Service registry"),
        (name = "endpoints", description = "Service points and their parameters"),
        (name = "auth", description = "Stored authorization metadata"),
        (name = "reference", description = "Categories and parameter types"),
        (name = "health", description = "Health check")
    )
)]
pub struct ApiDoc;

/// Builds the full application: API routes, OpenAPI document and the UI bundle.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let static_dir = state.config.static_dir.clone();
    let ui = ServeDir::new(&static_dir).fallback(ServeFile::new(static_dir.join("index.html")));

    Router::new()
        .merge(routes::router())
        .route("/api-docs/openapi.json", get(openapi_json))
        .fallback_service(ui)
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
