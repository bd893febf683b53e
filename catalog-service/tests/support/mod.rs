//! Test helpers for driving the full router against the in-memory store.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use catalog_service::store::InMemoryCatalogStore;
use catalog_service::{create_router, AppState};
use common::config::{AppConfig, StoreKind};

pub const BOUNDARY: &str = "catalog-test-boundary";

/// Router plus the temporary directories it reads from.
pub struct TestApp {
    pub router: Router,
    pub images: TempDir,
    pub static_dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let images = tempfile::tempdir().expect("images dir");
        let static_dir = tempfile::tempdir().expect("static dir");
        std::fs::write(images.path().join("default.jpg"), b"default-logo").unwrap();
        std::fs::write(static_dir.path().join("index.html"), "<html>catalog</html>").unwrap();

        let config = AppConfig {
            store: StoreKind::Memory,
            images_dir: images.path().to_path_buf(),
            static_dir: static_dir.path().to_path_buf(),
            ..AppConfig::default()
        };
        let state = AppState::new(config, Arc::new(InMemoryCatalogStore::seeded()));

        Self {
            router: create_router(state),
            images,
            static_dir,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, body)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::delete(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(json_request("POST", uri, body)).await
    }

    pub async fn put_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(json_request("PUT", uri, body)).await
    }

    /// Creates a service through the JSON form of `POST /api/services`.
    pub async fn create_service(&self, name: &str) -> (StatusCode, Value) {
        self.post_json(
            "/api/services",
            serde_json::json!({
                "name": name,
                "uri": format!("https://api.{name}.test"),
                "description": format!("{name} API"),
                "categoryId": 1
            }),
        )
        .await
    }

    /// Adds an endpoint whose parameters are `(name, type)` pairs.
    pub async fn create_endpoint(
        &self,
        service: &str,
        uri: &str,
        params: &[(&str, &str)],
    ) -> (StatusCode, Value) {
        let parameters: Vec<Value> = params
            .iter()
            .map(|(name, type_name)| {
                serde_json::json!({"name": name, "type": type_name, "required": true})
            })
            .collect();
        self.post_json(
            &format!("/api/services/{service}/endpoints"),
            serde_json::json!({"uri": uri, "description": "test endpoint", "parameters": parameters}),
        )
        .await
    }

    pub fn image_files(&self) -> Vec<String> {
        std::fs::read_dir(self.images.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Multipart body with text fields and an optional `image` file part.
pub fn multipart_request(fields: &[(&str, &str)], image: Option<(&str, &[u8])>) -> Request<Body> {
    let mut body: Vec<u8> = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, bytes)) = image {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/services")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}
