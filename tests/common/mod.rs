//! Shared test utilities

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;
use tutor_backend::{db, ApiServerBuilder, DbPool, StudyMaterials, Tutor};

/// Set up an in-memory test database
#[must_use]
pub fn setup_test_db() -> DbPool {
    db::init_memory().expect("failed to init test db")
}

/// Bundled study materials
#[must_use]
pub fn bundled_materials() -> StudyMaterials {
    StudyMaterials::from_json(include_str!("../../data/study_materials.json"))
        .expect("bundled materials parse")
}

/// Router over a fresh database with the given tutor
#[must_use]
pub fn router_with_tutor(tutor: Tutor) -> Router {
    ApiServerBuilder::new(setup_test_db(), 0)
        .tutor(tutor)
        .materials(bundled_materials())
        .build()
        .router()
}

/// Router over a fresh database with an offline tutor
#[must_use]
pub fn test_router() -> Router {
    router_with_tutor(Tutor::offline())
}

/// Send a request and decode the JSON response (Null for empty bodies)
pub async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("valid request");

    let response = router.clone().oneshot(request).await.expect("request served");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

pub async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    send(router, Method::GET, uri, None).await
}

pub async fn post(router: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(router, Method::POST, uri, Some(body)).await
}

/// Register a student and return its id
pub async fn register(router: &Router, username: &str) -> i64 {
    let (status, body) = post(
        router,
        "/register",
        serde_json::json!({ "username": username, "password": "secret" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
    body["id"].as_i64().expect("user id")
}

/// ID of the thread created with the account
pub async fn general_thread(router: &Router, user_id: i64) -> i64 {
    let (status, body) = get(router, &format!("/threads/{user_id}")).await;
    assert_eq!(status, StatusCode::OK);
    body[0]["id"].as_i64().expect("thread id")
}
