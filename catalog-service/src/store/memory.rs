//! In-process catalog store.
//!
//! Used for local runs without PostgreSQL and by the test suite. Writes work on
//! a copy of the tables and swap it in only when the whole operation succeeds,
//! which gives the same all-or-nothing behaviour as a database transaction.

use async_trait::async_trait;
use tokio::sync::RwLock;

use common::errors::{AppError, AppResult};
use common::models::reference::DEFAULT_PARAMETER_TYPES;
use common::models::{
    Category, CreateEndpointRequest, CreateOAuthRequest, CreateStaticAuthRequest,
    ListServicesQuery, NewService, OAuthAuth, Parameter, ParameterType, Service, ServicePoint,
    ServicePointWithParameters, ServiceWithCategory, StaticAuth, UpdateServicePointRequest,
};

use super::CatalogStore;

pub const DEFAULT_CATEGORIES: [&str; 4] = ["Weather", "Maps", "Finance", "Communication"];

#[derive(Debug, Clone)]
struct ParameterRecord {
    id: i32,
    point_id: i32,
    name: String,
    description: Option<String>,
    required: bool,
    type_id: i32,
}

#[derive(Debug, Clone)]
struct PointRecord {
    service_id: i32,
    point: ServicePoint,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    services: Vec<Service>,
    categories: Vec<Category>,
    types: Vec<ParameterType>,
    points: Vec<PointRecord>,
    parameters: Vec<ParameterRecord>,
    static_auth: Vec<StaticAuth>,
    oauth: Vec<OAuthAuth>,
    next_id: i32,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn service_id(&self, name: &str) -> AppResult<i32> {
        self.services
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.id)
            .ok_or_else(|| AppError::ServiceNotFound(name.to_string()))
    }

    fn type_id(&self, type_name: &str) -> AppResult<i32> {
        self.types
            .iter()
            .find(|t| t.type_name == type_name)
            .map(|t| t.id)
            .ok_or_else(|| AppError::ParameterTypeNotFound(type_name.to_string()))
    }

    fn type_name(&self, type_id: i32) -> Option<String> {
        self.types
            .iter()
            .find(|t| t.id == type_id)
            .map(|t| t.type_name.clone())
    }

    fn category_name(&self, category_id: Option<i32>) -> Option<String> {
        let id = category_id?;
        self.categories
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.name.clone())
    }

    fn remove_points_of(&mut self, service_id: i32) {
        let removed: Vec<i32> = self
            .points
            .iter()
            .filter(|p| p.service_id == service_id)
            .map(|p| p.point.id)
            .collect();
        self.points.retain(|p| p.service_id != service_id);
        self.parameters.retain(|p| !removed.contains(&p.point_id));
    }
}

/// Catalog held in memory behind a single lock.
#[derive(Debug, Default)]
pub struct InMemoryCatalogStore {
    tables: RwLock<Tables>,
}

impl InMemoryCatalogStore {
    /// Store pre-filled with the default categories and parameter types.
    pub fn seeded() -> Self {
        let mut tables = Tables::default();
        for name in DEFAULT_CATEGORIES {
            let id = tables.next_id();
            tables.categories.push(Category {
                id,
                name: name.to_string(),
            });
        }
        for type_name in DEFAULT_PARAMETER_TYPES {
            let id = tables.next_id();
            tables.types.push(ParameterType {
                id,
                type_name: type_name.to_string(),
            });
        }
        Self {
            tables: RwLock::new(tables),
        }
    }

    /// Runs `op` against a copy of the tables and commits it on success.
    async fn write<T>(&self, op: impl FnOnce(&mut Tables) -> AppResult<T>) -> AppResult<T> {
        let mut guard = self.tables.write().await;
        let mut draft = guard.clone();
        let out = op(&mut draft)?;
        *guard = draft;
        Ok(out)
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn list_services(&self, query: &ListServicesQuery) -> AppResult<Vec<ServiceWithCategory>> {
        let tables = self.tables.read().await;
        Ok(tables
            .services
            .iter()
            .map(|s| ServiceWithCategory {
                category_name: tables.category_name(s.category_id),
                service: s.clone(),
            })
            .filter(|entry| query.matches(entry))
            .collect())
    }

    async fn find_service(&self, name: &str) -> AppResult<Option<Service>> {
        let tables = self.tables.read().await;
        Ok(tables.services.iter().find(|s| s.name == name).cloned())
    }

    async fn service_exists(&self, name: &str) -> AppResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables.services.iter().any(|s| s.name == name))
    }

    async fn insert_service(&self, service: &NewService) -> AppResult<Service> {
        self.write(|t| {
            if t.services.iter().any(|s| s.name == service.name) {
                return Err(AppError::ServiceExists(service.name.clone()));
            }
            let row = Service {
                id: t.next_id(),
                uri: Some(service.uri.clone()),
                name: service.name.clone(),
                description: service.description.clone(),
                logo: Some(service.logo.clone()),
                category_id: service.category_id,
                api_source: Some(service.api_source.clone()),
                token: Some(service.token.clone()),
            };
            t.services.push(row.clone());
            Ok(row)
        })
        .await
    }

    async fn update_service(
        &self,
        name: &str,
        new_name: &str,
        description: Option<&str>,
    ) -> AppResult<Option<Service>> {
        self.write(|t| {
            if new_name != name && t.services.iter().any(|s| s.name == new_name) {
                return Err(AppError::ServiceExists(new_name.to_string()));
            }
            Ok(t.services.iter_mut().find(|s| s.name == name).map(|s| {
                s.name = new_name.to_string();
                s.description = description.map(String::from);
                s.clone()
            }))
        })
        .await
    }

    async fn delete_service(&self, name: &str) -> AppResult<Option<Service>> {
        self.write(|t| {
            let Some(pos) = t.services.iter().position(|s| s.name == name) else {
                return Ok(None);
            };
            let removed = t.services.remove(pos);
            t.remove_points_of(removed.id);
            t.static_auth.retain(|a| a.service_id != removed.id);
            t.oauth.retain(|a| a.service_id != removed.id);
            Ok(Some(removed))
        })
        .await
    }

    async fn list_service_points(&self, service_id: i32) -> AppResult<Vec<ServicePoint>> {
        let tables = self.tables.read().await;
        Ok(tables
            .points
            .iter()
            .filter(|p| p.service_id == service_id)
            .map(|p| p.point.clone())
            .collect())
    }

    async fn list_points_with_parameters(
        &self,
        service_id: i32,
    ) -> AppResult<Vec<ServicePointWithParameters>> {
        let tables = self.tables.read().await;
        Ok(tables
            .points
            .iter()
            .filter(|p| p.service_id == service_id)
            .map(|p| ServicePointWithParameters {
                point: p.point.clone(),
                parameters: tables
                    .parameters
                    .iter()
                    .filter(|param| param.point_id == p.point.id)
                    .map(|param| Parameter {
                        id: param.id,
                        name: param.name.clone(),
                        description: param.description.clone(),
                        required: param.required,
                        type_name: tables.type_name(param.type_id),
                    })
                    .collect(),
            })
            .collect())
    }

    async fn create_endpoint(&self, service_name: &str, req: &CreateEndpointRequest) -> AppResult<i32> {
        self.write(|t| {
            let service_id = t.service_id(service_name)?;
            let point_id = t.next_id();
            t.points.push(PointRecord {
                service_id,
                point: ServicePoint {
                    id: point_id,
                    uri: req.uri.clone(),
                    description: req.description.clone(),
                },
            });
            for param in &req.parameters {
                let type_id = t.type_id(&param.type_name)?;
                let id = t.next_id();
                t.parameters.push(ParameterRecord {
                    id,
                    point_id,
                    name: param.name.clone(),
                    description: param.description.clone(),
                    required: param.required,
                    type_id,
                });
            }
            Ok(service_id)
        })
        .await
    }

    async fn update_service_point(&self, point_id: i32, req: &UpdateServicePointRequest) -> AppResult<()> {
        self.write(|t| {
            for type_name in req.type_names() {
                t.type_id(type_name)?;
            }

            let record = t
                .points
                .iter_mut()
                .find(|p| p.point.id == point_id)
                .ok_or(AppError::ServicePointNotFound(point_id))?;
            record.point.uri = req.uri.clone();
            record.point.description = req.description.clone();

            for param in &req.parameters {
                let type_id = t.type_id(&param.type_name)?;
                match param.id {
                    Some(param_id) => {
                        let existing = t
                            .parameters
                            .iter_mut()
                            .find(|p| p.id == param_id && p.point_id == point_id)
                            .ok_or(AppError::ParameterNotFound { point_id, param_id })?;
                        existing.name = param.name.clone();
                        existing.description = param.description.clone();
                        existing.required = param.required;
                        existing.type_id = type_id;
                    }
                    None => {
                        let id = t.next_id();
                        t.parameters.push(ParameterRecord {
                            id,
                            point_id,
                            name: param.name.clone(),
                            description: param.description.clone(),
                            required: param.required,
                            type_id,
                        });
                    }
                }
            }
            Ok(())
        })
        .await
    }

    async fn delete_parameter(&self, point_id: i32, param_id: i32) -> AppResult<bool> {
        self.write(|t| {
            let before = t.parameters.len();
            t.parameters
                .retain(|p| !(p.id == param_id && p.point_id == point_id));
            Ok(t.parameters.len() < before)
        })
        .await
    }

    async fn delete_service_point(&self, point_id: i32) -> AppResult<Option<i32>> {
        self.write(|t| {
            let Some(pos) = t.points.iter().position(|p| p.point.id == point_id) else {
                return Ok(None);
            };
            let removed = t.points.remove(pos);
            t.parameters.retain(|p| p.point_id != point_id);
            Ok(Some(removed.service_id))
        })
        .await
    }

    async fn list_parameter_types(&self) -> AppResult<Vec<ParameterType>> {
        Ok(self.tables.read().await.types.clone())
    }

    async fn list_categories(&self) -> AppResult<Vec<Category>> {
        Ok(self.tables.read().await.categories.clone())
    }

    async fn insert_static_auth(&self, req: &CreateStaticAuthRequest) -> AppResult<()> {
        self.write(|t| {
            let service_id = t.service_id(&req.service_name)?;
            t.static_auth.push(StaticAuth::from_request(service_id, req)?);
            Ok(())
        })
        .await
    }

    async fn insert_oauth(&self, req: &CreateOAuthRequest) -> AppResult<()> {
        self.write(|t| {
            let service_id = t.service_id(&req.service_name)?;
            t.oauth.push(OAuthAuth::from_request(service_id, req));
            Ok(())
        })
        .await
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::models::{AuthPlacement, CreateServiceRequest, NewParameter, ParameterUpsert};

    fn new_service(name: &str) -> NewService {
        NewService::manual(
            &CreateServiceRequest {
                name: name.into(),
                uri: "https://api.test".into(),
                description: Some("desc".into()),
                category_id: Some(1),
            },
            "default.jpg",
        )
    }

    fn param(name: &str, type_name: &str) -> NewParameter {
        NewParameter {
            name: name.into(),
            type_name: type_name.into(),
            required: true,
            description: None,
        }
    }

    fn upsert(id: Option<i32>, name: &str, type_name: &str) -> ParameterUpsert {
        ParameterUpsert {
            id,
            name: name.into(),
            description: None,
            required: false,
            type_name: type_name.into(),
        }
    }

    async fn store_with_endpoint() -> (InMemoryCatalogStore, i32, i32) {
        let store = InMemoryCatalogStore::seeded();
        let service = store.insert_service(&new_service("weather")).await.unwrap();
        store
            .create_endpoint(
                "weather",
                &CreateEndpointRequest {
                    uri: "/v1/forecast".into(),
                    description: None,
                    parameters: vec![param("city", "string"), param("days", "integer")],
                },
            )
            .await
            .unwrap();
        let point_id = store.list_service_points(service.id).await.unwrap()[0].id;
        (store, service.id, point_id)
    }

    #[tokio::test]
    async fn test_seeded_reference_data() {
        let store = InMemoryCatalogStore::seeded();
        assert_eq!(store.list_categories().await.unwrap().len(), DEFAULT_CATEGORIES.len());
        let types = store.list_parameter_types().await.unwrap();
        assert!(types.iter().any(|t| t.type_name == "string"));
    }

    #[tokio::test]
    async fn test_duplicate_service_is_rejected() {
        let store = InMemoryCatalogStore::seeded();
        store.insert_service(&new_service("weather")).await.unwrap();
        let err = store.insert_service(&new_service("weather")).await.unwrap_err();
        assert!(matches!(err, AppError::ServiceExists(_)));
    }

    #[tokio::test]
    async fn test_list_joins_category_name() {
        let store = InMemoryCatalogStore::seeded();
        store.insert_service(&new_service("weather")).await.unwrap();
        let rows = store.list_services(&ListServicesQuery::default()).await.unwrap();
        assert_eq!(rows[0].category_name.as_deref(), Some("Weather"));
    }

    #[tokio::test]
    async fn test_endpoint_parameters_carry_type_names() {
        let (store, service_id, _) = store_with_endpoint().await;
        let points = store.list_points_with_parameters(service_id).await.unwrap();
        assert_eq!(points.len(), 1);
        let types: Vec<_> = points[0]
            .parameters
            .iter()
            .map(|p| p.type_name.as_deref().unwrap())
            .collect();
        assert_eq!(types, vec!["string", "integer"]);
    }

    #[tokio::test]
    async fn test_unknown_type_leaves_no_endpoint() {
        let store = InMemoryCatalogStore::seeded();
        let service = store.insert_service(&new_service("weather")).await.unwrap();
        let err = store
            .create_endpoint(
                "weather",
                &CreateEndpointRequest {
                    uri: "/v1/x".into(),
                    description: None,
                    parameters: vec![param("a", "string"), param("b", "decimal")],
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ParameterTypeNotFound(ref t) if t == "decimal"));
        assert!(store.list_service_points(service.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_upserts_parameters() {
        let (store, service_id, point_id) = store_with_endpoint().await;
        let existing = store.list_points_with_parameters(service_id).await.unwrap()[0].parameters[0].id;

        store
            .update_service_point(
                point_id,
                &UpdateServicePointRequest {
                    uri: "/v2/forecast".into(),
                    description: Some("updated".into()),
                    parameters: vec![upsert(Some(existing), "town", "string"), upsert(None, "lang", "string")],
                },
            )
            .await
            .unwrap();

        let point = &store.list_points_with_parameters(service_id).await.unwrap()[0];
        assert_eq!(point.point.uri, "/v2/forecast");
        assert_eq!(point.parameters.len(), 3);
        assert_eq!(point.parameters[0].name, "town");
    }

    #[tokio::test]
    async fn test_update_with_unknown_type_changes_nothing() {
        let (store, service_id, point_id) = store_with_endpoint().await;
        let err = store
            .update_service_point(
                point_id,
                &UpdateServicePointRequest {
                    uri: "/changed".into(),
                    description: None,
                    parameters: vec![upsert(None, "x", "nope")],
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ParameterTypeNotFound(_)));
        let point = &store.list_points_with_parameters(service_id).await.unwrap()[0];
        assert_eq!(point.point.uri, "/v1/forecast");
        assert_eq!(point.parameters.len(), 2);
    }

    #[tokio::test]
    async fn test_update_foreign_parameter_is_not_found() {
        let (store, _, point_id) = store_with_endpoint().await;
        let err = store
            .update_service_point(
                point_id,
                &UpdateServicePointRequest {
                    uri: "/v1/forecast".into(),
                    description: None,
                    parameters: vec![upsert(Some(9999), "x", "string")],
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ParameterNotFound { param_id: 9999, .. }));
    }

    #[tokio::test]
    async fn test_delete_point_cascades_parameters() {
        let (store, service_id, point_id) = store_with_endpoint().await;
        assert_eq!(store.delete_service_point(point_id).await.unwrap(), Some(service_id));
        assert!(store.list_points_with_parameters(service_id).await.unwrap().is_empty());
        assert_eq!(store.delete_service_point(point_id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_parameter_is_scoped_to_point() {
        let (store, service_id, point_id) = store_with_endpoint().await;
        let param_id = store.list_points_with_parameters(service_id).await.unwrap()[0].parameters[0].id;
        assert!(!store.delete_parameter(point_id + 1000, param_id).await.unwrap());
        assert!(store.delete_parameter(point_id, param_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_rename_to_taken_name_conflicts() {
        let store = InMemoryCatalogStore::seeded();
        store.insert_service(&new_service("weather")).await.unwrap();
        store.insert_service(&new_service("maps")).await.unwrap();
        let err = store.update_service("maps", "weather", None).await.unwrap_err();
        assert!(matches!(err, AppError::ServiceExists(_)));
        assert!(store.update_service("missing", "other", None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_auth_requires_existing_service() {
        let store = InMemoryCatalogStore::seeded();
        let req = CreateOAuthRequest {
            service_name: "ghost".into(),
            client_id: "id".into(),
            client_secret: None,
            client_url: None,
            authorization_content_type: None,
            authorization_url: None,
            scope: None,
        };
        let err = store.insert_oauth(&req).await.unwrap_err();
        assert!(matches!(err, AppError::ServiceNotFound(_)));
    }

    #[tokio::test]
    async fn test_static_auth_stores_placement() {
        let store = InMemoryCatalogStore::seeded();
        store.insert_service(&new_service("weather")).await.unwrap();
        let mut req = CreateStaticAuthRequest {
            service_name: "weather".into(),
            token: "secret".into(),
            param_name: "api_key".into(),
            auth_id: 2,
        };
        store.insert_static_auth(&req).await.unwrap();

        req.auth_id = 9;
        let err = store.insert_static_auth(&req).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let tables = store.tables.read().await;
        assert_eq!(tables.static_auth.len(), 1);
        assert_eq!(tables.static_auth[0].placement, AuthPlacement::Query);
    }
}
