//! HTTP handlers.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use common::errors::AppError;
use common::extract::{ApiPath, ValidatedJson};
use common::models::{
    Category, CreateEndpointRequest, CreateOAuthRequest, CreateServiceRequest,
    CreateStaticAuthRequest, ListServicesQuery, ParameterType, Service, ServiceCard,
    ServiceDetail, ServicePoint, ServicePointWithParameters, UpdateServicePointRequest,
    UpdateServiceRequest,
};
use common::response::{ErrorBody, MessageResponse};

use crate::form::ServiceForm;
use crate::service::CatalogService;
use crate::state::AppState;

/// List services with category names and embedded logos
#[utoipa::path(
    get,
    path = "/api/service",
    tag = "services",
    params(ListServicesQuery),
    responses(
        (status = 200, description = "Service cards", body = Vec<ServiceCard>),
        (status = 500, description = "Database or image failure", body = ErrorBody)
    )
)]
pub async fn list_services(
    State(state): State<AppState>,
    Query(query): Query<ListServicesQuery>,
) -> Result<Json<Vec<ServiceCard>>, AppError> {
    let cards = CatalogService::from_state(&state).list(&query).await?;
    Ok(Json(cards))
}

/// Service detail with endpoints and parameters
#[utoipa::path(
    get,
    path = "/api/services/{service_name}",
    tag = "services",
    params(("service_name" = String, Path, description = "Unique service name")),
    responses(
        (status = 200, description = "Service detail", body = ServiceDetail),
        (status = 404, description = "Service not found", body = ErrorBody)
    )
)]
pub async fn get_service(
    State(state): State<AppState>,
    ApiPath(service_name): ApiPath<String>,
) -> Result<Json<ServiceDetail>, AppError> {
    let detail = CatalogService::from_state(&state).detail(&service_name).await?;
    Ok(Json(detail))
}

/// Register a service (multipart form with optional `image`, or JSON)
#[utoipa::path(
    post,
    path = "/api/services",
    tag = "services",
    request_body(content = CreateServiceRequest, description = "Multipart form or JSON body"),
    responses(
        (status = 201, description = "Service created", body = MessageResponse),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 409, description = "Name already taken", body = ErrorBody)
    )
)]
pub async fn create_service(
    State(state): State<AppState>,
    form: ServiceForm,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    let service = CatalogService::from_state(&state).create(form).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new(format!(
            "Service {} added successfully.",
            service.name
        ))),
    ))
}

/// Rename a service or change its description
#[utoipa::path(
    put,
    path = "/api/service-update/{service_name}",
    tag = "services",
    params(("service_name" = String, Path, description = "Current service name")),
    request_body = UpdateServiceRequest,
    responses(
        (status = 200, description = "Updated row", body = Service),
        (status = 404, description = "Service not found", body = ErrorBody),
        (status = 409, description = "New name already taken", body = ErrorBody)
    )
)]
pub async fn update_service(
    State(state): State<AppState>,
    ApiPath(service_name): ApiPath<String>,
    ValidatedJson(req): ValidatedJson<UpdateServiceRequest>,
) -> Result<Json<Service>, AppError> {
    let service = CatalogService::from_state(&state)
        .update(&service_name, &req)
        .await?;
    Ok(Json(service))
}

/// Delete a service with its endpoints
#[utoipa::path(
    delete,
    path = "/api/service-delete/{service_name}",
    tag = "services",
    params(("service_name" = String, Path, description = "Service name")),
    responses(
        (status = 200, description = "Deleted row", body = Service),
        (status = 404, description = "Service not found", body = ErrorBody)
    )
)]
pub async fn delete_service(
    State(state): State<AppState>,
    ApiPath(service_name): ApiPath<String>,
) -> Result<Json<Service>, AppError> {
    let service = CatalogService::from_state(&state).delete(&service_name).await?;
    Ok(Json(service))
}

/// Add an endpoint with its parameters
#[utoipa::path(
    post,
    path = "/api/services/{service_name}/endpoints",
    tag = "endpoints",
    params(("service_name" = String, Path, description = "Owning service")),
    request_body = CreateEndpointRequest,
    responses(
        (status = 201, description = "All endpoints of the service", body = Vec<ServicePointWithParameters>),
        (status = 404, description = "Service not found", body = ErrorBody),
        (status = 500, description = "Unknown parameter type", body = ErrorBody)
    )
)]
pub async fn create_endpoint(
    State(state): State<AppState>,
    ApiPath(service_name): ApiPath<String>,
    ValidatedJson(req): ValidatedJson<CreateEndpointRequest>,
) -> Result<(StatusCode, Json<Vec<ServicePointWithParameters>>), AppError> {
    let points = CatalogService::from_state(&state)
        .add_endpoint(&service_name, &req)
        .await?;
    Ok((StatusCode::CREATED, Json(points)))
}

/// Update an endpoint and upsert its parameters
#[utoipa::path(
    put,
    path = "/api/service-points/{point_id}/parameters",
    tag = "endpoints",
    params(("point_id" = i32, Path, description = "Service point id")),
    request_body = UpdateServicePointRequest,
    responses(
        (status = 200, description = "Updated", body = MessageResponse),
        (status = 404, description = "Point or parameter not found", body = ErrorBody),
        (status = 500, description = "Unknown parameter type", body = ErrorBody)
    )
)]
pub async fn update_service_point(
    State(state): State<AppState>,
    ApiPath(point_id): ApiPath<i32>,
    ValidatedJson(req): ValidatedJson<UpdateServicePointRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    CatalogService::from_state(&state)
        .update_point(point_id, &req)
        .await?;
    Ok(Json(MessageResponse::new(
        "Parameters and service point updated successfully",
    )))
}

/// Delete one parameter of an endpoint
#[utoipa::path(
    delete,
    path = "/api/service-points/{point_id}/parameters/{param_id}",
    tag = "endpoints",
    params(
        ("point_id" = i32, Path, description = "Service point id"),
        ("param_id" = i32, Path, description = "Parameter id")
    ),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 404, description = "Parameter not found", body = ErrorBody)
    )
)]
pub async fn delete_parameter(
    State(state): State<AppState>,
    ApiPath((point_id, param_id)): ApiPath<(i32, i32)>,
) -> Result<Json<MessageResponse>, AppError> {
    CatalogService::from_state(&state)
        .delete_parameter(point_id, param_id)
        .await?;
    Ok(Json(MessageResponse::new("Parameter deleted successfully")))
}

/// Delete an endpoint; returns the endpoints left on its service
#[utoipa::path(
    delete,
    path = "/api/service-points/{point_id}",
    tag = "endpoints",
    params(("point_id" = i32, Path, description = "Service point id")),
    responses(
        (status = 200, description = "Remaining endpoints", body = Vec<ServicePoint>),
        (status = 404, description = "Point not found", body = ErrorBody)
    )
)]
pub async fn delete_service_point(
    State(state): State<AppState>,
    ApiPath(point_id): ApiPath<i32>,
) -> Result<Json<Vec<ServicePoint>>, AppError> {
    let remaining = CatalogService::from_state(&state).delete_point(point_id).await?;
    Ok(Json(remaining))
}

#[utoipa::path(
    get,
    path = "/api/parameter-types",
    tag = "reference",
    responses((status = 200, description = "Parameter types", body = Vec<ParameterType>))
)]
pub async fn list_parameter_types(
    State(state): State<AppState>,
) -> Result<Json<Vec<ParameterType>>, AppError> {
    Ok(Json(CatalogService::from_state(&state).parameter_types().await?))
}

#[utoipa::path(
    get,
    path = "/api/categories",
    tag = "reference",
    responses((status = 200, description = "Categories", body = Vec<Category>))
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<Category>>, AppError> {
    Ok(Json(CatalogService::from_state(&state).categories().await?))
}

/// Attach a static token (header or query parameter) to a service
#[utoipa::path(
    post,
    path = "/api/create-auth-service",
    tag = "auth",
    request_body = CreateStaticAuthRequest,
    responses(
        (status = 201, description = "Stored", body = MessageResponse),
        (status = 404, description = "Service not found", body = ErrorBody)
    )
)]
pub async fn create_static_auth(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateStaticAuthRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    CatalogService::from_state(&state).add_static_auth(&req).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new(format!(
            "Token auth for service {} added successfully.",
            req.service_name
        ))),
    ))
}

/// Attach OAuth client settings to a service
#[utoipa::path(
    post,
    path = "/api/create-oauth-service",
    tag = "auth",
    request_body = CreateOAuthRequest,
    responses(
        (status = 201, description = "Stored", body = MessageResponse),
        (status = 404, description = "Service not found", body = ErrorBody)
    )
)]
pub async fn create_oauth(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateOAuthRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    CatalogService::from_state(&state).add_oauth(&req).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new(format!(
            "OAuth for service {} added successfully.",
            req.service_name
        ))),
    ))
}

/// Liveness plus a database round trip
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses(
        (status = 200, description = "Service and database are up", body = HealthResponse),
        (status = 503, description = "Database unreachable", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (status, database) = match state.store.ping().await {
        Ok(()) => (StatusCode::OK, "up"),
        Err(e) => {
            tracing::warn!(error = %e, "Health check: database unreachable");
            (StatusCode::SERVICE_UNAVAILABLE, "down")
        }
    };

    (
        status,
        Json(HealthResponse {
            status: if status.is_success() { "healthy" } else { "degraded" }.to_string(),
            service: state.config.service_name.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now(),
            database: database.to_string(),
        }),
    )
}

/// Health check response
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// `healthy` or `degraded`
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    /// `up` or `down`
    pub database: String,
}
