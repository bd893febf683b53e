//! Service points and their parameters.

mod support;

use axum::http::StatusCode;
use serde_json::{json, Value};

use support::TestApp;

async fn points_of(app: &TestApp, service: &str) -> Vec<Value> {
    let (_, detail) = app.get(&format!("/api/services/{service}")).await;
    detail["servicePoints"].as_array().unwrap().clone()
}

fn id_of(value: &Value) -> i64 {
    value["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_create_endpoint_stores_every_parameter() {
    let app = TestApp::new().await;
    app.create_service("weather").await;

    let (status, body) = app
        .create_endpoint(
            "weather",
            "/v1/forecast",
            &[("city", "string"), ("days", "integer"), ("metric", "boolean")],
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let points = body.as_array().unwrap();
    assert_eq!(points.len(), 1);
    assert_eq!(points[0]["parameters"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_create_endpoint_returns_all_points_of_service() {
    let app = TestApp::new().await;
    app.create_service("weather").await;
    app.create_endpoint("weather", "/v1/current", &[]).await;

    let (_, body) = app
        .create_endpoint("weather", "/v1/forecast", &[("city", "string")])
        .await;
    let uris: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["uri"].as_str().unwrap())
        .collect();
    assert_eq!(uris, vec!["/v1/current", "/v1/forecast"]);
}

#[tokio::test]
async fn test_create_endpoint_for_unknown_service() {
    let app = TestApp::new().await;
    let (status, _) = app.create_endpoint("ghost", "/x", &[]).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_endpoint_with_unknown_type_persists_nothing() {
    let app = TestApp::new().await;
    app.create_service("weather").await;

    let (status, body) = app
        .create_endpoint("weather", "/v1/forecast", &[("city", "string"), ("when", "datetime")])
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Type 'datetime' not found");
    assert_eq!(body["code"], "PARAMETER_TYPE_NOT_FOUND");

    assert!(points_of(&app, "weather").await.is_empty());
}

#[tokio::test]
async fn test_create_endpoint_rejects_invalid_body() {
    let app = TestApp::new().await;
    app.create_service("weather").await;

    let (status, _) = app
        .post_json(
            "/api/services/weather/endpoints",
            json!({"uri": "", "parameters": []}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post_json(
            "/api/services/weather/endpoints",
            json!({"uri": "/x", "parameters": [{"name": "a"}]}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_point_upserts_parameters() {
    let app = TestApp::new().await;
    app.create_service("weather").await;
    app.create_endpoint("weather", "/v1/forecast", &[("city", "string"), ("days", "integer")])
        .await;

    let point = points_of(&app, "weather").await.remove(0);
    let point_id = id_of(&point);
    let city_id = id_of(&point["parameters"][0]);

    // Update in place: count unchanged.
    let (status, body) = app
        .put_json(
            &format!("/api/service-points/{point_id}/parameters"),
            json!({
                "uri": "/v2/forecast",
                "description": "second version",
                "parameters": [
                    {"id": city_id, "name": "town", "type": "string", "required": false}
                ]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].as_str().unwrap().contains("updated"));

    let point = points_of(&app, "weather").await.remove(0);
    assert_eq!(point["uri"], "/v2/forecast");
    assert_eq!(point["description"], "second version");
    let params = point["parameters"].as_array().unwrap();
    assert_eq!(params.len(), 2);
    assert_eq!(params[0]["name"], "town");
    assert_eq!(params[0]["required"], false);

    // No id: inserted, count + 1.
    let (status, _) = app
        .put_json(
            &format!("/api/service-points/{point_id}/parameters"),
            json!({
                "uri": "/v2/forecast",
                "parameters": [{"name": "lang", "type": "string", "required": true}]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let point = points_of(&app, "weather").await.remove(0);
    assert_eq!(point["parameters"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_update_point_with_unknown_type_inserts_nothing() {
    let app = TestApp::new().await;
    app.create_service("weather").await;
    app.create_endpoint("weather", "/v1/forecast", &[("city", "string")])
        .await;
    let point_id = id_of(&points_of(&app, "weather").await[0]);

    let (status, body) = app
        .put_json(
            &format!("/api/service-points/{point_id}/parameters"),
            json!({
                "uri": "/changed",
                "parameters": [
                    {"name": "a", "type": "string", "required": true},
                    {"name": "b", "type": "decimal", "required": true}
                ]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Type 'decimal' not found");

    let point = points_of(&app, "weather").await.remove(0);
    assert_eq!(point["uri"], "/v1/forecast");
    assert_eq!(point["parameters"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_update_missing_point_or_parameter() {
    let app = TestApp::new().await;
    app.create_service("weather").await;
    app.create_endpoint("weather", "/v1/forecast", &[("city", "string")])
        .await;
    let point_id = id_of(&points_of(&app, "weather").await[0]);

    let (status, body) = app
        .put_json(
            "/api/service-points/999999/parameters",
            json!({"uri": "/x", "parameters": []}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "SERVICE_POINT_NOT_FOUND");

    let (status, body) = app
        .put_json(
            &format!("/api/service-points/{point_id}/parameters"),
            json!({
                "uri": "/x",
                "parameters": [{"id": 999999, "name": "a", "type": "string", "required": true}]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "PARAMETER_NOT_FOUND");

    // The failed request rolled back the point update as well.
    let point = points_of(&app, "weather").await.remove(0);
    assert_eq!(point["uri"], "/v1/forecast");
}

#[tokio::test]
async fn test_delete_parameter_removes_only_that_row() {
    let app = TestApp::new().await;
    app.create_service("weather").await;
    app.create_endpoint("weather", "/v1/forecast", &[("city", "string"), ("days", "integer")])
        .await;
    let point = points_of(&app, "weather").await.remove(0);
    let point_id = id_of(&point);
    let city_id = id_of(&point["parameters"][0]);

    let (status, body) = app
        .delete(&format!("/api/service-points/{point_id}/parameters/{city_id}"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Parameter deleted successfully");

    let params = points_of(&app, "weather").await[0]["parameters"]
        .as_array()
        .unwrap()
        .clone();
    assert_eq!(params.len(), 1);
    assert_eq!(params[0]["name"], "days");

    let (status, _) = app
        .delete(&format!("/api/service-points/{point_id}/parameters/{city_id}"))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_point_returns_remaining_points_of_service() {
    let app = TestApp::new().await;
    app.create_service("weather").await;
    app.create_service("maps").await;
    app.create_endpoint("weather", "/v1/current", &[("city", "string")])
        .await;
    app.create_endpoint("weather", "/v1/forecast", &[]).await;
    app.create_endpoint("maps", "/tiles", &[]).await;

    let current_id = id_of(&points_of(&app, "weather").await[0]);
    let (status, remaining) = app
        .delete(&format!("/api/service-points/{current_id}"))
        .await;
    assert_eq!(status, StatusCode::OK);
    let remaining = remaining.as_array().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0]["uri"], "/v1/forecast");
    assert!(remaining[0].get("parameters").is_none());

    assert_eq!(points_of(&app, "weather").await.len(), 1);
    assert_eq!(points_of(&app, "maps").await.len(), 1);

    let (status, _) = app
        .delete(&format!("/api/service-points/{current_id}"))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_non_numeric_point_id_is_rejected() {
    let app = TestApp::new().await;
    let (status, body) = app.delete("/api/service-points/abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");

    let (status, body) = app.delete("/api/service-points/1/parameters/x").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
}
