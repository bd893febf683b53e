//! Application configuration.
//!
//! Values come from the process environment. A `.env` file in the working
//! directory is loaded first and never overrides variables that are already set.

use std::path::PathBuf;
use std::str::FromStr;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Which catalog store backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    /// PostgreSQL through a shared connection pool.
    Postgres,
    /// Process-local store, lost on restart.
    Memory,
}

impl StoreKind {
    fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "memory" | "in-memory" | "mem" => StoreKind::Memory,
            _ => StoreKind::Postgres,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Settings shared by the catalog binary and its components.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Service name reported in logs and the health endpoint.
    pub service_name: String,
    pub host: String,
    pub port: u16,
    /// Explicit connection URL; takes precedence over the `PG_*` pieces.
    pub database_url: Option<String>,
    pub pg_user: String,
    pub pg_password: String,
    pub pg_host: String,
    pub pg_port: u16,
    pub pg_database: String,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
    pub store: StoreKind,
    /// Create schemas, tables and reference rows on startup.
    pub bootstrap_schema: bool,
    /// Directory holding service logos.
    pub images_dir: PathBuf,
    /// Logo used when a service is created without an upload.
    pub default_logo: String,
    /// Directory of the compiled UI bundle.
    pub static_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            service_name: "catalog-service".to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            database_url: None,
            pg_user: "postgres".to_string(),
            pg_password: String::new(),
            pg_host: "localhost".to_string(),
            pg_port: 5432,
            pg_database: "postgres".to_string(),
            max_connections: 10,
            connect_timeout_secs: 5,
            store: StoreKind::Postgres,
            bootstrap_schema: false,
            images_dir: PathBuf::from("./images"),
            default_logo: "default.jpg".to_string(),
            static_dir: PathBuf::from("./build"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            log_format: LogFormat::Text,
        }
    }
}

impl AppConfig {
    /// Loads configuration from `.env` and the environment for the named service.
    pub fn load_with_service(service_name: &str) -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(service_name, |key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(service_name: &str, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            service_name: service_name.to_string(),
            host: lookup("SERVER_HOST").unwrap_or(defaults.host),
            port: parsed(&lookup, "SERVER_PORT").unwrap_or(defaults.port),
            database_url: lookup("DATABASE_URL").filter(|v| !v.trim().is_empty()),
            pg_user: lookup("PG_USER").unwrap_or(defaults.pg_user),
            pg_password: lookup("PG_PASSWORD").unwrap_or(defaults.pg_password),
            pg_host: lookup("PG_HOST").unwrap_or(defaults.pg_host),
            pg_port: parsed(&lookup, "PG_PORT").unwrap_or(defaults.pg_port),
            pg_database: lookup("PG_DATABASE").unwrap_or(defaults.pg_database),
            max_connections: parsed(&lookup, "DB_MAX_CONNECTIONS")
                .unwrap_or(defaults.max_connections),
            connect_timeout_secs: parsed(&lookup, "DB_CONNECT_TIMEOUT_SECS")
                .unwrap_or(defaults.connect_timeout_secs),
            store: lookup("CATALOG_STORE")
                .map(|v| StoreKind::parse(&v))
                .unwrap_or(defaults.store),
            bootstrap_schema: lookup("BOOTSTRAP_SCHEMA")
                .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.bootstrap_schema),
            images_dir: lookup("IMAGES_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.images_dir),
            default_logo: lookup("DEFAULT_LOGO").unwrap_or(defaults.default_logo),
            static_dir: lookup("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_dir),
            max_upload_bytes: parsed(&lookup, "MAX_UPLOAD_BYTES")
                .unwrap_or(defaults.max_upload_bytes),
            log_format: match lookup("LOG_FORMAT").as_deref().map(str::trim) {
                Some("json") => LogFormat::Json,
                _ => LogFormat::Text,
            },
        }
    }

    /// Returns the PostgreSQL connection URL.
    pub fn database_url(&self) -> String {
        if let Some(url) = &self.database_url {
            return url.clone();
        }
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.pg_user, self.pg_password, self.pg_host, self.pg_port, self.pg_database
        )
    }

    /// Socket address string the server binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Looks up `key` and parses it, ignoring values that do not parse.
fn parsed<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key).and_then(|v| v.trim().parse().ok())
}
