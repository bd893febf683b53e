//! Catalog operations.
//!
//! Each method is one request-level use case: it combines store calls, logo
//! files and error mapping. Handlers stay thin and only translate to HTTP.

use std::sync::Arc;

use common::errors::{AppError, AppResult};
use common::models::{
    Category, CreateEndpointRequest, CreateOAuthRequest, CreateStaticAuthRequest,
    ListServicesQuery, NewService, ParameterType, Service, ServiceCard, ServiceDetail,
    ServicePoint, ServicePointWithParameters, UpdateServicePointRequest, UpdateServiceRequest,
};

use crate::form::ServiceForm;
use crate::images::ImageStore;
use crate::state::AppState;
use crate::store::CatalogStore;

pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
    images: Arc<ImageStore>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn CatalogStore>, images: Arc<ImageStore>) -> Self {
        Self { store, images }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(state.store.clone(), state.images.clone())
    }

    fn logo_name<'a>(&'a self, logo: Option<&'a str>) -> &'a str {
        logo.filter(|l| !l.is_empty())
            .unwrap_or_else(|| self.images.default_logo())
    }

    async fn require_service(&self, name: &str) -> AppResult<Service> {
        self.store
            .find_service(name)
            .await?
            .ok_or_else(|| AppError::ServiceNotFound(name.to_string()))
    }

    /// All services with their category and embedded logo.
    pub async fn list(&self, query: &ListServicesQuery) -> AppResult<Vec<ServiceCard>> {
        let entries = self.store.list_services(query).await?;
        let mut cards = Vec::with_capacity(entries.len());
        for entry in entries {
            let image = self
                .images
                .data_uri(self.logo_name(entry.service.logo.as_deref()))
                .await?;
            cards.push(ServiceCard { entry, image });
        }
        Ok(cards)
    }

    pub async fn detail(&self, name: &str) -> AppResult<ServiceDetail> {
        let service = self.require_service(name).await?;
        let service_points = self.store.list_points_with_parameters(service.id).await?;
        let service_logo = self
            .images
            .data_uri(self.logo_name(service.logo.as_deref()))
            .await?;

        Ok(ServiceDetail {
            service_name: service.name,
            service_description: service.description,
            service_points,
            service_logo,
        })
    }

    /// Registers a service and stores its logo. Returns the stored row.
    pub async fn create(&self, form: ServiceForm) -> AppResult<Service> {
        let ServiceForm { request, upload } = form;
        let name = request.name.trim();

        if self.store.service_exists(name).await? {
            return Err(AppError::ServiceExists(name.to_string()));
        }

        let logo = match &upload {
            Some(upload) => self.images.save(&upload.file_name, &upload.bytes).await?,
            None => self.images.default_logo().to_string(),
        };

        match self.store.insert_service(&NewService::manual(&request, logo.clone())).await {
            Ok(service) => {
                tracing::info!(id = service.id, name = %service.name, logo = %logo, "Service created");
                Ok(service)
            }
            Err(e) => {
                if upload.is_some() {
                    if let Err(cleanup) = self.images.remove(&logo).await {
                        tracing::warn!(file = %logo, error = %cleanup, "Failed to remove orphaned logo");
                    }
                }
                Err(e)
            }
        }
    }

    pub async fn update(&self, name: &str, req: &UpdateServiceRequest) -> AppResult<Service> {
        let service = self
            .store
            .update_service(
                name,
                req.service_display_name.trim(),
                req.service_description.as_deref(),
            )
            .await?
            .ok_or_else(|| AppError::ServiceNotFound(name.to_string()))?;

        tracing::info!(from = %name, to = %service.name, "Service updated");
        Ok(service)
    }

    /// Deletes a service with its endpoints and uploaded logo.
    pub async fn delete(&self, name: &str) -> AppResult<Service> {
        let service = self
            .store
            .delete_service(name)
            .await?
            .ok_or_else(|| AppError::ServiceNotFound(name.to_string()))?;

        if let Some(logo) = service.logo.as_deref().filter(|l| !l.is_empty()) {
            if let Err(e) = self.images.remove(logo).await {
                tracing::warn!(file = %logo, error = %e, "Failed to remove service logo");
            }
        }

        tracing::info!(id = service.id, name = %service.name, "Service deleted");
        Ok(service)
    }

    /// Adds an endpoint and returns every endpoint of the service.
    pub async fn add_endpoint(
        &self,
        service_name: &str,
        req: &CreateEndpointRequest,
    ) -> AppResult<Vec<ServicePointWithParameters>> {
        let service_id = self.store.create_endpoint(service_name, req).await?;
        self.store.list_points_with_parameters(service_id).await
    }

    pub async fn update_point(&self, point_id: i32, req: &UpdateServicePointRequest) -> AppResult<()> {
        self.store.update_service_point(point_id, req).await
    }

    pub async fn delete_parameter(&self, point_id: i32, param_id: i32) -> AppResult<()> {
        if !self.store.delete_parameter(point_id, param_id).await? {
            return Err(AppError::ParameterNotFound { point_id, param_id });
        }
        tracing::info!(point_id, param_id, "Parameter deleted");
        Ok(())
    }

    /// Deletes an endpoint and returns the endpoints left on its service.
    pub async fn delete_point(&self, point_id: i32) -> AppResult<Vec<ServicePoint>> {
        let service_id = self
            .store
            .delete_service_point(point_id)
            .await?
            .ok_or(AppError::ServicePointNotFound(point_id))?;

        tracing::info!(point_id, service_id, "Service point deleted");
        self.store.list_service_points(service_id).await
    }

    pub async fn parameter_types(&self) -> AppResult<Vec<ParameterType>> {
        self.store.list_parameter_types().await
    }

    pub async fn categories(&self) -> AppResult<Vec<Category>> {
        self.store.list_categories().await
    }

    pub async fn add_static_auth(&self, req: &CreateStaticAuthRequest) -> AppResult<()> {
        self.store.insert_static_auth(req).await
    }

    pub async fn add_oauth(&self, req: &CreateOAuthRequest) -> AppResult<()> {
        self.store.insert_oauth(req).await
    }
}
