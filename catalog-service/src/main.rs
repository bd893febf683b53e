//! Service catalog server.
//!
//! Serves the catalog API and the compiled UI bundle, backed by PostgreSQL or
//! by an in-process store (`CATALOG_STORE=memory`).

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use catalog_service::store::{CatalogStore, InMemoryCatalogStore, PgCatalogStore};
use catalog_service::{create_router, AppState};
use common::config::{AppConfig, LogFormat, StoreKind};

const SERVICE_NAME: &str = "catalog-service";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load_with_service(SERVICE_NAME);
    init_tracing(config.log_format);

    let store = open_store(&config).await?;
    let state = AppState::new(config.clone(), store);
    state
        .images
        .ensure_dir()
        .await
        .with_context(|| format!("creating images directory {}", config.images_dir.display()))?;

    let app = create_router(state);

    let addr = config.bind_address();
    info!(
        service = SERVICE_NAME,
        address = %addr,
        store = ?config.store,
        images = %config.images_dir.display(),
        "Starting service"
    );

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server stopped");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn open_store(config: &AppConfig) -> anyhow::Result<Arc<dyn CatalogStore>> {
    match config.store {
        StoreKind::Memory => {
            info!("Using in-memory catalog store");
            Ok(Arc::new(InMemoryCatalogStore::seeded()))
        }
        StoreKind::Postgres => {
            let store = PgCatalogStore::connect(config)
                .await
                .context("connecting to PostgreSQL (check DATABASE_URL / PG_* settings)")?;
            if config.bootstrap_schema {
                store.ensure_schema().await.context("bootstrapping schema")?;
            }
            Ok(Arc::new(store))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
