#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode},
};
use command_api::{
    build_router, infrastructure::in_memory_command_store::InMemoryCommandStore, state::AppState,
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryCommandStore>,
}

pub fn spawn_app() -> TestApp {
    spawn_app_with(false)
}

pub fn spawn_app_with(development: bool) -> TestApp {
    let store = Arc::new(InMemoryCommandStore::new());
    let state = AppState::new(store.clone()).with_development(development);

    TestApp {
        router: build_router(state),
        store,
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

pub async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("router should serve request");

    let status = response.status();
    let headers = response.headers().clone();
    let body = response
        .into_body()
        .collect()
        .await
        .expect("body should collect")
        .to_bytes();

    let body = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).expect("body should be valid json")
    };

    TestResponse {
        status,
        headers,
        body,
    }
}

pub fn get(uri: impl AsRef<str>) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri.as_ref())
        .body(Body::empty())
        .expect("valid get request")
}

pub fn delete(uri: impl AsRef<str>) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri.as_ref())
        .body(Body::empty())
        .expect("valid delete request")
}

pub fn post_json(uri: impl AsRef<str>, payload: &Value) -> Request<Body> {
    json_request("POST", uri, payload)
}

pub fn put_json(uri: impl AsRef<str>, payload: &Value) -> Request<Body> {
    json_request("PUT", uri, payload)
}

fn json_request(method: &str, uri: impl AsRef<str>, payload: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri.as_ref())
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .expect("valid json request")
}

pub fn sample_command() -> Value {
    json!({
        "howTo": "Do Something",
        "platform": "Some Platform",
        "commandLine": "0"
    })
}

/// Creates a command through the API and returns its assigned id.
pub async fn create(app: &Router, payload: &Value) -> i64 {
    let response = send(app, post_json("/api/commands", payload)).await;
    assert_eq!(response.status, StatusCode::CREATED);
    response
        .body
        .get("id")
        .and_then(Value::as_i64)
        .expect("created command must include id")
}

pub async fn count(app: &Router) -> usize {
    let response = send(app, get("/api/commands")).await;
    assert_eq!(response.status, StatusCode::OK);
    response
        .body
        .as_array()
        .expect("list must return an array")
        .len()
}
