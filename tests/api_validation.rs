//! Router tests for requests rejected before any storage access.
//!
//! These run against a pool that can never connect, so they also prove that
//! validation happens ahead of the geofence scan and the conditional writes.

mod common;

use axum::http::StatusCode;
use common::{body_json, build_offline_app, get, post_json, put};
use serde_json::json;

async fn assert_invalid_input(response: axum::response::Response, fragment: &str) {
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "invalid_input");
    let message = body["error"]["message"].as_str().unwrap();
    assert!(
        message.contains(fragment),
        "expected {fragment:?} in {message:?}"
    );
}

#[tokio::test]
async fn resolve_rejects_non_numeric_latitude() {
    let response = get(
        build_offline_app(),
        "/api/v1/sites/resolve?lat=abc&lon=-75.005",
        None,
    )
    .await;
    assert_invalid_input(response, "lat").await;
}

#[tokio::test]
async fn resolve_rejects_nan_longitude() {
    let response = get(
        build_offline_app(),
        "/api/v1/sites/resolve?lat=40.005&lon=NaN",
        None,
    )
    .await;
    assert_invalid_input(response, "lon").await;
}

#[tokio::test]
async fn clock_in_requires_device_token() {
    let response = post_json(
        build_offline_app(),
        "/api/v1/clock/in",
        None,
        json!({ "phone_number": "555-0100", "lat": 40.005, "lon": -75.005 }),
    )
    .await;
    assert_invalid_input(response, "X-Device-Token").await;
}

#[tokio::test]
async fn clock_in_rejects_malformed_coordinates() {
    let response = post_json(
        build_offline_app(),
        "/api/v1/clock/in",
        Some("dev-1"),
        json!({ "phone_number": "555-0100", "lat": "forty", "lon": -75.005 }),
    )
    .await;
    assert_invalid_input(response, "lat").await;
}

#[tokio::test]
async fn clock_out_rejects_blank_phone() {
    let response = post_json(
        build_offline_app(),
        "/api/v1/clock/out",
        Some("dev-1"),
        json!({ "phone_number": "   " }),
    )
    .await;
    assert_invalid_input(response, "phone_number").await;
}

#[tokio::test]
async fn clock_out_requires_device_token() {
    let response = post_json(
        build_offline_app(),
        "/api/v1/clock/out",
        None,
        json!({ "phone_number": "555-0100" }),
    )
    .await;
    assert_invalid_input(response, "X-Device-Token").await;
}

#[tokio::test]
async fn clock_in_rejects_blank_claimed_phone() {
    let response = post_json(
        build_offline_app(),
        "/api/v1/clock/in",
        Some("dev-1"),
        json!({ "phone_number": " ", "lat": 40.005, "lon": -75.005 }),
    )
    .await;
    assert_invalid_input(response, "phone_number").await;
}

#[tokio::test]
async fn identify_requires_device_token() {
    let response = post_json(
        build_offline_app(),
        "/api/v1/identify?sub=Acme",
        None,
        json!({ "phone_number": "555-0100" }),
    )
    .await;
    assert_invalid_input(response, "X-Device-Token").await;
}

#[tokio::test]
async fn register_rejects_blank_name() {
    let response = post_json(
        build_offline_app(),
        "/api/v1/workers",
        Some("dev-1"),
        json!({ "subcontractor": "Acme", "employee_name": "", "phone_number": "555-0100" }),
    )
    .await;
    assert_invalid_input(response, "employee_name").await;
}

#[tokio::test]
async fn link_device_requires_device_token() {
    let response = put(build_offline_app(), "/api/v1/workers/555-0100/device", None).await;
    assert_invalid_input(response, "X-Device-Token").await;
}

#[tokio::test]
async fn me_requires_device_token() {
    let response = get(build_offline_app(), "/api/v1/me", None).await;
    assert_invalid_input(response, "X-Device-Token").await;
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let response = get(build_offline_app(), "/this-route-does-not-exist", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unreachable_database_is_reported_as_unavailable() {
    let response = get(build_offline_app(), "/health", None).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "storage_unavailable");
}
