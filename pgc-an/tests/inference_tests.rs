//! Signal source tests against in-process stub services

mod helpers;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use helpers::spawn_stub;
use pgc_an::signals::{
    ImageClassifierClient, InferenceError, NameInference, NameServiceClient, PictureInference,
    PictureOutcome, StaticToken,
};
use pgc_common::Gender;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const IMAGE_BYTES: &[u8] = b"\xff\xd8\xff\xe0fake-jpeg";

// ============================================================================
// Stub services
// ============================================================================

async fn name_service(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
    let name = params.get("name").cloned().unwrap_or_default();
    match name.as_str() {
        "Jane" => (
            StatusCode::OK,
            Json(json!({"name": "Jane", "gender": "female", "probability": 0.71, "count": 900})),
        ),
        "Alex" => (
            StatusCode::OK,
            Json(json!({"name": "Alex", "gender": "female", "probability": 0.65, "count": 900})),
        ),
        "Boom" => (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({}))),
        _ => (
            StatusCode::OK,
            Json(json!({"name": name, "gender": null, "probability": 0.0, "count": 0})),
        ),
    }
}

#[derive(Clone, Default)]
struct ClassifierHits {
    authenticated: Arc<AtomicUsize>,
    public: Arc<AtomicUsize>,
}

fn payload_ok(body: &Value) -> bool {
    body.get("inputs").and_then(Value::as_str) == Some(STANDARD.encode(IMAGE_BYTES).as_str())
}

async fn public_male(State(hits): State<ClassifierHits>, Json(body): Json<Value>) -> impl IntoResponse {
    hits.public.fetch_add(1, Ordering::SeqCst);
    if !payload_ok(&body) {
        return (StatusCode::BAD_REQUEST, Json(json!({"error": "bad inputs"})));
    }
    (StatusCode::OK, Json(json!([{"label": "Man", "score": 0.9}, {"label": "Woman", "score": 0.1}])))
}

async fn authenticated(
    State(hits): State<ClassifierHits>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    hits.authenticated.fetch_add(1, Ordering::SeqCst);
    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        == Some("Bearer good-token");
    if !authorized {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "invalid token"})));
    }
    if !payload_ok(&body) {
        return (StatusCode::BAD_REQUEST, Json(json!({"error": "bad inputs"})));
    }
    (StatusCode::OK, Json(json!([{"label": "female", "score": 0.97}, {"label": "male", "score": 0.03}])))
}

async fn unclear() -> impl IntoResponse {
    Json(json!([{"label": "Person", "score": 0.99}]))
}

async fn warming_up() -> impl IntoResponse {
    (StatusCode::SERVICE_UNAVAILABLE, Json(json!({"error": "Model is currently loading"})))
}

async fn broken() -> impl IntoResponse {
    (StatusCode::INTERNAL_SERVER_ERROR, "boom")
}

async fn image() -> impl IntoResponse {
    ([("content-type", "image/jpeg")], IMAGE_BYTES)
}

async fn spawn_services() -> (String, ClassifierHits) {
    let hits = ClassifierHits::default();
    let router = Router::new()
        .route("/names", get(name_service))
        .route("/img.jpg", get(image))
        .route("/public", post(public_male))
        .route("/auth", post(authenticated))
        .route("/unclear", post(unclear))
        .route("/warming", post(warming_up))
        .route("/broken", post(broken))
        .with_state(hits.clone());

    (spawn_stub(router).await, hits)
}

fn classifier(base: &str, public: &str, auth: &str, token: Option<&str>) -> ImageClassifierClient {
    ImageClassifierClient::new(
        format!("{}{}", base, public),
        format!("{}{}", base, auth),
        Arc::new(StaticToken(token.map(str::to_string))),
        0.6,
    )
}

// ============================================================================
// Name inference
// ============================================================================

#[tokio::test]
async fn test_name_probability_threshold() {
    let (base, _) = spawn_services().await;
    let names = NameServiceClient::new(format!("{}/names", base), 0.7);

    assert_eq!(names.infer_from_name("Jane Doe").await, Some(Gender::Female));
    assert_eq!(names.infer_from_name("Alex Smith").await, None);
    assert_eq!(names.infer_from_name("Zed").await, None);
    assert_eq!(names.infer_from_name("   ").await, None);
}

#[tokio::test]
async fn test_name_service_failure_is_unknown() {
    let (base, _) = spawn_services().await;
    let names = NameServiceClient::new(format!("{}/names", base), 0.7);

    assert!(matches!(
        names.try_infer("Boom Person").await,
        Err(InferenceError::Status(500))
    ));
    assert_eq!(names.infer_from_name("Boom Person").await, None);
}

#[tokio::test]
async fn test_name_service_unreachable() {
    let names = NameServiceClient::new("http://127.0.0.1:9/names", 0.7);
    assert_eq!(names.infer_from_name("Jane").await, None);
}

// ============================================================================
// Picture inference
// ============================================================================

#[tokio::test]
async fn test_public_classifier_label() {
    let (base, hits) = spawn_services().await;
    let client = classifier(&base, "/public", "/auth", None);

    let gender = client.infer_from_picture(&format!("{}/img.jpg", base)).await;

    assert_eq!(gender, Some(Gender::Male));
    assert_eq!(hits.public.load(Ordering::SeqCst), 1);
    assert_eq!(hits.authenticated.load(Ordering::SeqCst), 0, "no token, no authenticated call");
}

#[tokio::test]
async fn test_authenticated_endpoint_preferred() {
    let (base, hits) = spawn_services().await;
    let client = classifier(&base, "/public", "/auth", Some("good-token"));

    let gender = client.infer_from_picture(&format!("{}/img.jpg", base)).await;

    assert_eq!(gender, Some(Gender::Female));
    assert_eq!(hits.authenticated.load(Ordering::SeqCst), 1);
    assert_eq!(hits.public.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_rejected_token_falls_through_to_public() {
    let (base, hits) = spawn_services().await;
    let client = classifier(&base, "/public", "/auth", Some("stale-token"));

    let gender = client.infer_from_picture(&format!("{}/img.jpg", base)).await;

    assert_eq!(gender, Some(Gender::Male));
    assert_eq!(hits.authenticated.load(Ordering::SeqCst), 1);
    assert_eq!(hits.public.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_warming_up_distinct_from_failure() {
    let (base, _) = spawn_services().await;
    let image_url = format!("{}/img.jpg", base);

    let warming = classifier(&base, "/warming", "/auth", None).analyze(&image_url).await;
    assert!(matches!(warming, PictureOutcome::Failed(InferenceError::WarmingUp)));

    let broken = classifier(&base, "/broken", "/auth", None).analyze(&image_url).await;
    assert!(matches!(broken, PictureOutcome::Failed(InferenceError::Status(500))));

    assert_eq!(warming.gender(), None);
    assert_eq!(broken.gender(), None);
}

#[tokio::test]
async fn test_unrecognised_label_is_inconclusive() {
    let (base, _) = spawn_services().await;
    let client = classifier(&base, "/unclear", "/auth", None);

    let outcome = client.analyze(&format!("{}/img.jpg", base)).await;
    assert!(matches!(outcome, PictureOutcome::Inconclusive));
}

#[tokio::test]
async fn test_missing_image_fails() {
    let (base, hits) = spawn_services().await;
    let client = classifier(&base, "/public", "/auth", None);

    let outcome = client.analyze(&format!("{}/missing.jpg", base)).await;
    assert!(matches!(outcome, PictureOutcome::Failed(InferenceError::Status(404))));
    assert_eq!(hits.public.load(Ordering::SeqCst), 0);
}
