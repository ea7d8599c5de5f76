#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header::CONTENT_TYPE, Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use lending_crud::{apply_schema, build_router, builtin_model, resolve, AppState};
use serde_json::{json, Value};
use sqlx::PgPool;
use tower::ServiceExt;

/// Create the lending tables on the per-test database and build the full router.
pub async fn build_test_app(pool: PgPool) -> Router {
    let config = builtin_model().unwrap();
    apply_schema(&pool, &config).await.unwrap();
    let model = resolve(&config).unwrap();
    build_router(AppState::new(pool, model), 1024 * 1024)
}

async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> Response {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(v) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, Method::GET, uri, None).await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response {
    send(app, Method::POST, uri, Some(body)).await
}

pub async fn put_json(app: Router, uri: &str, body: Value) -> Response {
    send(app, Method::PUT, uri, Some(body)).await
}

pub async fn delete(app: Router, uri: &str) -> Response {
    send(app, Method::DELETE, uri, None).await
}

pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn client_body(nom: &str) -> Value {
    json!({"nom": nom, "prenom": "Marie", "date_creation_compte": "2021-03-04"})
}

/// POST a client and return its id.
pub async fn create_client(app: Router, nom: &str) -> i64 {
    let response = post_json(app, "/clients/", client_body(nom)).await;
    assert_eq!(response.status(), 201);
    body_json(response).await["id"].as_i64().unwrap()
}

pub fn meta_body(client_id: i64) -> Value {
    json!({
        "client_id": client_id,
        "age": 41,
        "taille": 172.0,
        "poids": 68.5,
        "sexe": "F",
        "sport_licence": true,
        "niveau_etude": "master",
        "region": "Bretagne",
        "smoker": false,
        "nationalite_francaise": true
    })
}
