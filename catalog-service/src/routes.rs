//! Catalog routes.

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::handlers;
use crate::state::AppState;

/// Creates the `/api` routes of the catalog.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/service", get(handlers::list_services))
        .route("/api/services", post(handlers::create_service))
        .route("/api/services/{service_name}", get(handlers::get_service))
        .route(
            "/api/services/{service_name}/endpoints",
            post(handlers::create_endpoint),
        )
        .route(
            "/api/service-points/{point_id}",
            delete(handlers::delete_service_point),
        )
        .route(
            "/api/service-points/{point_id}/parameters",
            put(handlers::update_service_point),
        )
        .route(
            "/api/service-points/{point_id}/parameters/{param_id}",
            delete(handlers::delete_parameter),
        )
        .route("/api/parameter-types", get(handlers::list_parameter_types))
        .route("/api/categories", get(handlers::list_categories))
        .route("/api/create-auth-service", post(handlers::create_static_auth))
        .route("/api/create-oauth-service", post(handlers::create_oauth))
        .route(
            "/api/service-update/{service_name}",
            put(handlers::update_service),
        )
        .route(
            "/api/service-delete/{service_name}",
            delete(handlers::delete_service),
        )
        .route("/api/health", get(handlers::health_check))
}
