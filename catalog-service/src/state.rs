//! Application state for the catalog service.

use std::sync::Arc;

use common::config::AppConfig;

use crate::images::ImageStore;
use crate::store::CatalogStore;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn CatalogStore>,
    pub images: Arc<ImageStore>,
}

impl AppState {
    /// Builds the state around an already opened store.
    pub fn new(config: AppConfig, store: Arc<dyn CatalogStore>) -> Self {
        let images = Arc::new(ImageStore::new(
            config.images_dir.clone(),
            config.default_logo.clone(),
        ));
        Self {
            config,
            store,
            images,
        }
    }
}
