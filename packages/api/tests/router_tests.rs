//! Drives the shared router end to end against the fixture models under
//! `tests/fixtures/models`.

use diagnosis_api::axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use diagnosis_api::model::FEATURE_NAMES;
use diagnosis_api::{State, construct_router};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

const FIXTURE_MODELS: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/models");
const FIXTURE_CLASSES: [&str; 3] = ["Allergy", "Common Cold", "Influenza"];

fn router() -> Router {
    construct_router(Arc::new(State::from_model_dir(FIXTURE_MODELS)))
}

fn patient(overrides: &[(&str, Value)]) -> Value {
    let mut body = serde_json::Map::new();
    for name in FEATURE_NAMES {
        body.insert(name.to_string(), json!(0));
    }
    for (name, value) in overrides {
        body.insert(name.to_string(), value.clone());
    }
    Value::Object(body)
}

fn reference_patient() -> Value {
    patient(&[
        ("age", json!(45)),
        ("gender", json!(1)),
        ("smoker", json!(0)),
        ("heart_rate", json!(80)),
        ("blood_pressure", json!(120)),
        ("cholesterol_level", json!(200)),
    ])
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value, bool) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let has_error_id = response.headers().contains_key("x-error-id");
    let bytes = diagnosis_api::axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body, has_error_id)
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let (status, body, _) = send(router, request).await;
    (status, body)
}

async fn predict_raw(router: &Router, body: impl Into<Body>) -> (StatusCode, Value, bool) {
    let request = Request::builder()
        .method("POST")
        .uri("/api/predict")
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap();
    send(router, request).await
}

async fn predict(router: &Router, body: &Value) -> (StatusCode, Value) {
    let (status, body, _) = predict_raw(router, body.to_string()).await;
    (status, body)
}

#[tokio::test]
async fn features_lists_the_schema_in_order() {
    let router = router();
    let (status, first) = get(&router, "/api/features").await;
    assert_eq!(status, StatusCode::OK);

    let names: Vec<&str> = first["features"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert_eq!(names, FEATURE_NAMES.to_vec());
    assert_eq!(first["count"], json!(FEATURE_NAMES.len()));
    assert_eq!(first["total_features"], json!(FEATURE_NAMES.len()));

    let (_, second) = get(&router, "/api/features").await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn health_reports_loaded_models_and_stays_loaded() {
    let router = router();
    for _ in 0..3 {
        let (status, body) = get(&router, "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["models_available"], json!(true));
        assert_eq!(body["status"], json!("healthy"));
    }
}

#[tokio::test]
async fn reference_patient_is_classified() {
    let router = router();
    let (status, body) = predict(&router, &reference_patient()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["model_used"], json!("xgboost"));

    let prediction = body["prediction"].as_str().unwrap();
    assert!(!prediction.is_empty());
    assert!(FIXTURE_CLASSES.contains(&prediction));

    let confidence = body["confidence"].as_f64().unwrap();
    assert!((0.0..=100.0).contains(&confidence));
}

#[tokio::test]
async fn probabilities_sum_to_100_and_match_confidence() {
    let router = router();
    let payloads = [
        reference_patient(),
        patient(&[("fever", json!(1)), ("age", json!(30))]),
        patient(&[("sneezing", json!(true)), ("itchiness", json!(true))]),
        patient(&[("runny_nose", json!(1)), ("cough", json!(1)), ("age", json!(81))]),
    ];

    for payload in &payloads {
        let (status, body) = predict(&router, payload).await;
        assert_eq!(status, StatusCode::OK);

        let all = body["all_probabilities"].as_object().unwrap();
        assert_eq!(all.len(), FIXTURE_CLASSES.len());
        let total: f64 = all.values().map(|p| p.as_f64().unwrap()).sum();
        assert!((total - 100.0).abs() <= 0.01, "sum was {total}");
        assert!(all.values().all(|p| p.as_f64().unwrap() >= 0.0));

        let top = all[body["prediction"].as_str().unwrap()].as_f64().unwrap();
        let rounded = (top * 100.0).round() / 100.0;
        assert_eq!(body["confidence"].as_f64().unwrap(), rounded);
    }
}

#[tokio::test]
async fn each_missing_feature_is_named() {
    let router = router();
    for name in FEATURE_NAMES {
        let mut payload = reference_patient();
        payload.as_object_mut().unwrap().remove(name);

        let (status, body) = predict(&router, &payload).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "feature {name}");
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["code"], json!("MISSING_FEATURE"));
        assert_eq!(body["error"], json!(format!("Missing feature: {name}")));
    }
}

#[tokio::test]
async fn extra_fields_are_ignored() {
    let router = router();
    let (_, plain) = predict(&router, &reference_patient()).await;

    let mut extended = reference_patient();
    extended["model"] = json!("random_forest");
    extended["blood_type"] = json!("AB");
    let (status, with_extra) = predict(&router, &extended).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(plain, with_extra);
}

#[tokio::test]
async fn fever_changes_the_prediction() {
    let router = router();
    let (_, body) = predict(&router, &patient(&[("fever", json!(1))])).await;
    assert_eq!(body["prediction"], json!("Influenza"));

    let (_, body) = predict(&router, &patient(&[("sneezing", json!(1)), ("itchiness", json!(1))])).await;
    assert_eq!(body["prediction"], json!("Allergy"));
}

#[tokio::test]
async fn non_numeric_value_is_rejected() {
    let router = router();
    let payload = patient(&[("heart_rate", json!("fast"))]);
    let (status, body) = predict(&router, &payload).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!("INVALID_FEATURE"));
    assert!(body["error"].as_str().unwrap().contains("heart_rate"));
}

#[tokio::test]
async fn malformed_body_is_a_client_error() {
    let router = router();
    for raw in ["{not json", "", "[1, 2, 3]"] {
        let (status, body, has_error_id) = predict_raw(&router, raw.to_string()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {raw:?}");
        assert_eq!(body["success"], json!(false));
        assert!(!has_error_id);
    }
}

#[tokio::test]
async fn missing_artifacts_make_predictions_fail_with_500() {
    let empty = tempfile::tempdir().unwrap();
    let router = construct_router(Arc::new(State::from_model_dir(empty.path())));

    let (status, body, has_error_id) =
        predict_raw(&router, reference_patient().to_string()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_ne!(body["success"], json!(true));
    assert_eq!(body["code"], json!("MODELS_UNAVAILABLE"));
    assert!(body["error"].as_str().unwrap().contains("Models not available"));
    assert!(has_error_id);

    let (status, health) = get(&router, "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["models_available"], json!(false));
    assert_eq!(health["status"], json!("models_not_loaded"));
}

#[tokio::test]
async fn unavailable_models_win_over_bad_input() {
    let empty = tempfile::tempdir().unwrap();
    let router = construct_router(Arc::new(State::from_model_dir(empty.path())));

    let (status, _, _) = predict_raw(&router, "{not json".to_string()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn preload_reports_availability() {
    let state = State::from_model_dir(FIXTURE_MODELS);
    assert!(state.preload().await);

    let empty = tempfile::tempdir().unwrap();
    let state = State::from_model_dir(empty.path());
    assert!(!state.preload().await);
}

#[tokio::test]
async fn unknown_api_route_is_structured_404() {
    let router = router();
    let (status, body) = get(&router, "/api/does-not-exist").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], json!("Not Found"));
    assert_eq!(body["message"], json!("The requested resource was not found"));
}

#[tokio::test]
async fn openapi_document_lists_routes() {
    let router = router();
    let (status, body) = get(&router, "/api/openapi.json").await;

    assert_eq!(status, StatusCode::OK);
    for path in ["/api/predict", "/api/health", "/api/features"] {
        assert!(body["paths"].get(path).is_some(), "missing {path}");
    }
}
