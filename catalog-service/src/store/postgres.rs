//! PostgreSQL catalog store.
//!
//! Tables live in the `services` and `components` schemas. With schema
//! bootstrapping enabled the store creates them on startup; otherwise they are
//! expected to exist already.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, Transaction};

use common::config::AppConfig;
use common::errors::{AppError, AppResult};
use common::models::reference::DEFAULT_PARAMETER_TYPES;
use common::models::{
    Category, CreateEndpointRequest, CreateOAuthRequest, CreateStaticAuthRequest,
    ListServicesQuery, NewService, OAuthAuth, Parameter, ParameterType, Service, ServicePoint,
    ServicePointWithParameters, ServiceWithCategory, StaticAuth, UpdateServicePointRequest,
};

use super::CatalogStore;

const SERVICE_COLUMNS: &str =
    "id, uri, name, description, logo, category_id, api_source, token";

const SCHEMA_DDL: [&str; 9] = [
    "CREATE SCHEMA IF NOT EXISTS services",
    "CREATE SCHEMA IF NOT EXISTS components",
    "CREATE TABLE IF NOT EXISTS services.service_categories (
        id   SERIAL PRIMARY KEY,
        name VARCHAR(255) NOT NULL UNIQUE
    )",
    "CREATE TABLE IF NOT EXISTS services.service (
        id          SERIAL PRIMARY KEY,
        uri         TEXT,
        token       TEXT,
        name        VARCHAR(255) NOT NULL UNIQUE,
        category_id INTEGER REFERENCES services.service_categories (id) ON DELETE SET NULL,
        logo        VARCHAR(512),
        description TEXT,
        api_source  VARCHAR(64)
    )",
    "CREATE TABLE IF NOT EXISTS components.type (
        id   SERIAL PRIMARY KEY,
        type VARCHAR(64) NOT NULL UNIQUE
    )",
    "CREATE TABLE IF NOT EXISTS services.service_points (
        id          SERIAL PRIMARY KEY,
        service_id  INTEGER NOT NULL REFERENCES services.service (id) ON DELETE CASCADE,
        uri         TEXT NOT NULL,
        description TEXT
    )",
    "CREATE TABLE IF NOT EXISTS services.service_parameters (
        id               SERIAL PRIMARY KEY,
        service_point_id INTEGER NOT NULL REFERENCES services.service_points (id) ON DELETE CASCADE,
        \"name\"         VARCHAR(255) NOT NULL,
        description      TEXT,
        required         BOOLEAN NOT NULL DEFAULT FALSE,
        type_id          INTEGER NOT NULL REFERENCES components.type (id)
    )",
    "CREATE TABLE IF NOT EXISTS services.default_auth (
        id         SERIAL PRIMARY KEY,
        \"token\"  TEXT NOT NULL,
        service_id INTEGER NOT NULL REFERENCES services.service (id) ON DELETE CASCADE,
        type_id    INTEGER NOT NULL,
        param_name VARCHAR(255) NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS services.oauth_auth (
        id                         SERIAL PRIMARY KEY,
        service_id                 INTEGER NOT NULL REFERENCES services.service (id) ON DELETE CASCADE,
        client_id                  TEXT NOT NULL,
        client_secret              TEXT,
        client_url                 TEXT,
        authorization_url          TEXT,
        authorization_content_type TEXT,
        scope                      TEXT
    )",
];

/// Parameter row before it is grouped under its endpoint.
#[derive(sqlx::FromRow)]
struct ParameterRow {
    service_point_id: i32,
    #[sqlx(flatten)]
    parameter: Parameter,
}

/// Catalog store backed by a shared PostgreSQL pool.
#[derive(Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    /// Opens a pool sized and timed from the configuration.
    pub async fn connect(config: &AppConfig) -> AppResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect(&config.database_url())
            .await
            .map_err(|e| AppError::DatabaseConnection(e.to_string()))?;

        tracing::info!(max_connections = config.max_connections, "PostgreSQL pool ready");
        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates schemas and tables if missing and seeds the default parameter types.
    pub async fn ensure_schema(&self) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        for statement in SCHEMA_DDL {
            sqlx::query(statement).execute(&mut *tx).await?;
        }
        for type_name in DEFAULT_PARAMETER_TYPES {
            sqlx::query("INSERT INTO components.type (type) VALUES ($1) ON CONFLICT (type) DO NOTHING")
                .bind(type_name)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        tracing::info!("Catalog schema ensured");
        Ok(())
    }

    async fn service_id_in(tx: &mut Transaction<'_, Postgres>, name: &str) -> AppResult<i32> {
        sqlx::query_scalar::<_, i32>("SELECT id FROM services.service WHERE name = $1")
            .bind(name)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| AppError::ServiceNotFound(name.to_string()))
    }

    /// Resolves type names to ids, failing on the first unknown name.
    async fn resolve_types<'a, I>(
        tx: &mut Transaction<'_, Postgres>,
        names: I,
    ) -> AppResult<HashMap<String, i32>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut ids = HashMap::new();
        for name in names {
            let id = sqlx::query_scalar::<_, i32>("SELECT id FROM components.type WHERE type = $1")
                .bind(name)
                .fetch_optional(&mut **tx)
                .await?
                .ok_or_else(|| AppError::ParameterTypeNotFound(name.to_string()))?;
            ids.insert(name.to_string(), id);
        }
        Ok(ids)
    }
}

fn lookup_type_id(ids: &HashMap<String, i32>, name: &str) -> AppResult<i32> {
    ids.get(name)
        .copied()
        .ok_or_else(|| AppError::ParameterTypeNotFound(name.to_string()))
}

/// Builds an `ILIKE ... ESCAPE '\'` pattern matching `term` literally anywhere.
fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Maps a unique-key violation on the service name to a conflict.
fn conflict_on_duplicate(name: &str) -> impl FnOnce(sqlx::Error) -> AppError + '_ {
    move |e| {
        let duplicate = e
            .as_database_error()
            .is_some_and(|db| db.is_unique_violation());
        if duplicate {
            AppError::ServiceExists(name.to_string())
        } else {
            AppError::Database(e)
        }
    }
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn list_services(&self, query: &ListServicesQuery) -> AppResult<Vec<ServiceWithCategory>> {
        let rows = sqlx::query_as::<_, ServiceWithCategory>(
            "SELECT s.id, s.uri, s.name, s.description, s.logo, s.category_id, s.api_source, s.token,
                    c.name AS category_name
             FROM services.service s
             LEFT JOIN services.service_categories c ON s.category_id = c.id
             WHERE ($1::text IS NULL OR s.name ILIKE $1 ESCAPE '\\')
               AND ($2::text IS NULL OR c.name = $2)
             ORDER BY s.id",
        )
        .bind(query.search_term().map(contains_pattern))
        .bind(query.category_name())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_service(&self, name: &str) -> AppResult<Option<Service>> {
        let sql = format!("SELECT {SERVICE_COLUMNS} FROM services.service WHERE name = $1");
        let row = sqlx::query_as::<_, Service>(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn service_exists(&self, name: &str) -> AppResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM services.service WHERE name = $1)",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn insert_service(&self, service: &NewService) -> AppResult<Service> {
        let sql = format!(
            "INSERT INTO services.service (uri, token, name, category_id, logo, description, api_source)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {SERVICE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, Service>(&sql)
            .bind(&service.uri)
            .bind(&service.token)
            .bind(&service.name)
            .bind(service.category_id)
            .bind(&service.logo)
            .bind(&service.description)
            .bind(&service.api_source)
            .fetch_one(&self.pool)
            .await
            .map_err(conflict_on_duplicate(&service.name))?;

        tracing::info!(id = row.id, name = %row.name, "Service inserted");
        Ok(row)
    }

    async fn update_service(
        &self,
        name: &str,
        new_name: &str,
        description: Option<&str>,
    ) -> AppResult<Option<Service>> {
        let sql = format!(
            "UPDATE services.service SET name = $1, description = $2 WHERE name = $3
             RETURNING {SERVICE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, Service>(&sql)
            .bind(new_name)
            .bind(description)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(conflict_on_duplicate(new_name))?;
        Ok(row)
    }

    async fn delete_service(&self, name: &str) -> AppResult<Option<Service>> {
        let sql = format!("DELETE FROM services.service WHERE name = $1 RETURNING {SERVICE_COLUMNS}");
        let row = sqlx::query_as::<_, Service>(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_service_points(&self, service_id: i32) -> AppResult<Vec<ServicePoint>> {
        let rows = sqlx::query_as::<_, ServicePoint>(
            "SELECT id, uri, description FROM services.service_points WHERE service_id = $1 ORDER BY id",
        )
        .bind(service_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_points_with_parameters(
        &self,
        service_id: i32,
    ) -> AppResult<Vec<ServicePointWithParameters>> {
        let points = self.list_service_points(service_id).await?;
        if points.is_empty() {
            return Ok(vec![]);
        }

        let point_ids: Vec<i32> = points.iter().map(|p| p.id).collect();
        let rows = sqlx::query_as::<_, ParameterRow>(
            "SELECT sp.service_point_id, sp.id, sp.name, sp.description,
                    COALESCE(sp.required, FALSE) AS required, ct.type AS type_name
             FROM services.service_parameters sp
             LEFT JOIN components.type ct ON sp.type_id = ct.id
             WHERE sp.service_point_id = ANY($1)
             ORDER BY sp.id",
        )
        .bind(&point_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_point: HashMap<i32, Vec<Parameter>> = HashMap::new();
        for row in rows {
            by_point.entry(row.service_point_id).or_default().push(row.parameter);
        }

        Ok(points
            .into_iter()
            .map(|point| ServicePointWithParameters {
                parameters: by_point.remove(&point.id).unwrap_or_default(),
                point,
            })
            .collect())
    }

    async fn create_endpoint(&self, service_name: &str, req: &CreateEndpointRequest) -> AppResult<i32> {
        let mut tx = self.pool.begin().await?;

        let service_id = Self::service_id_in(&mut tx, service_name).await?;
        let type_ids = Self::resolve_types(&mut tx, req.type_names()).await?;

        let point_id = sqlx::query_scalar::<_, i32>(
            "INSERT INTO services.service_points (service_id, uri, description) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(service_id)
        .bind(&req.uri)
        .bind(&req.description)
        .fetch_one(&mut *tx)
        .await?;

        for param in &req.parameters {
            sqlx::query(
                "INSERT INTO services.service_parameters (service_point_id, \"name\", description, required, type_id)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(point_id)
            .bind(&param.name)
            .bind(&param.description)
            .bind(param.required)
            .bind(lookup_type_id(&type_ids, &param.type_name)?)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        tracing::info!(
            service = %service_name,
            point_id,
            parameters = req.parameters.len(),
            "Endpoint created"
        );
        Ok(service_id)
    }

    async fn update_service_point(&self, point_id: i32, req: &UpdateServicePointRequest) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let type_ids = Self::resolve_types(&mut tx, req.type_names()).await?;

        let updated = sqlx::query(
            "UPDATE services.service_points SET uri = $1, description = $2 WHERE id = $3",
        )
        .bind(&req.uri)
        .bind(&req.description)
        .bind(point_id)
        .execute(&mut *tx)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(AppError::ServicePointNotFound(point_id));
        }

        for param in &req.parameters {
            let type_id = lookup_type_id(&type_ids, &param.type_name)?;
            match param.id {
                Some(param_id) => {
                    let result = sqlx::query(
                        "UPDATE services.service_parameters
                         SET \"name\" = $1, description = $2, required = $3, type_id = $4
                         WHERE id = $5 AND service_point_id = $6",
                    )
                    .bind(&param.name)
                    .bind(&param.description)
                    .bind(param.required)
                    .bind(type_id)
                    .bind(param_id)
                    .bind(point_id)
                    .execute(&mut *tx)
                    .await?;
                    if result.rows_affected() == 0 {
                        return Err(AppError::ParameterNotFound { point_id, param_id });
                    }
                }
                None => {
                    sqlx::query(
                        "INSERT INTO services.service_parameters (service_point_id, \"name\", description, required, type_id)
                         VALUES ($1, $2, $3, $4, $5)",
                    )
                    .bind(point_id)
                    .bind(&param.name)
                    .bind(&param.description)
                    .bind(param.required)
                    .bind(type_id)
                    .execute(&mut *tx)
                    .await?;
                }
            }
        }

        tx.commit().await?;
        tracing::info!(point_id, parameters = req.parameters.len(), "Service point updated");
        Ok(())
    }

    async fn delete_parameter(&self, point_id: i32, param_id: i32) -> AppResult<bool> {
        let result = sqlx::query(
            "DELETE FROM services.service_parameters WHERE service_point_id = $1 AND id = $2",
        )
        .bind(point_id)
        .bind(param_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_service_point(&self, point_id: i32) -> AppResult<Option<i32>> {
        let service_id = sqlx::query_scalar::<_, i32>(
            "DELETE FROM services.service_points WHERE id = $1 RETURNING service_id",
        )
        .bind(point_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(service_id)
    }

    async fn list_parameter_types(&self) -> AppResult<Vec<ParameterType>> {
        let rows = sqlx::query_as::<_, ParameterType>("SELECT id, type FROM components.type ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn list_categories(&self) -> AppResult<Vec<Category>> {
        let rows = sqlx::query_as::<_, Category>(
            "SELECT id, name FROM services.service_categories ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn insert_static_auth(&self, req: &CreateStaticAuthRequest) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        let service_id = Self::service_id_in(&mut tx, &req.service_name).await?;
        let row = StaticAuth::from_request(service_id, req)?;

        sqlx::query(
            "INSERT INTO services.default_auth (\"token\", service_id, type_id, param_name)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(&row.token)
        .bind(row.service_id)
        .bind(row.placement.type_id())
        .bind(&row.param_name)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(service = %req.service_name, placement = ?row.placement, "Static auth stored");
        Ok(())
    }

    async fn insert_oauth(&self, req: &CreateOAuthRequest) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        let service_id = Self::service_id_in(&mut tx, &req.service_name).await?;
        let row = OAuthAuth::from_request(service_id, req);

        sqlx::query(
            "INSERT INTO services.oauth_auth
                (service_id, client_id, client_secret, client_url, authorization_url, authorization_content_type, scope)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(row.service_id)
        .bind(&row.client_id)
        .bind(&row.client_secret)
        .bind(&row.client_url)
        .bind(&row.authorization_url)
        .bind(&row.authorization_content_type)
        .bind(&row.scope)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(service = %req.service_name, "OAuth auth stored");
        Ok(())
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
