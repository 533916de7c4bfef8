//! HTTP endpoints driven in-process.

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use std::time::Duration;
use svalbard_core::Operation;
use svalbard_server::{app, router};
use svalbard_testkit::TestCustody;
use tower::ServiceExt;

const OWNER: &str = "owner_id_type=email&owner_id=owner%40example.com";

async fn call(app: &Router, method: Method, path: &str, body: String) -> (StatusCode, String) {
    let request = Request::builder()
        .method(method)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn post(app: &Router, path: &str, body: String) -> (StatusCode, String) {
    call(app, Method::POST, path, body).await
}

#[tokio::test]
async fn full_share_lifecycle_over_http() {
    let custody = TestCustody::new();
    let app = router(custody.coordinator.clone());

    let (status, body) = post(
        &app,
        "/get_storage_token",
        format!("request_id=r1&{OWNER}&secret_name=s1"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        "Req. r1: storage token for share of [s1] sent to [email:owner@example.com]"
    );

    let token = custody.last_token().await.unwrap();
    let (status, body) = post(
        &app,
        "/store_share",
        format!(
            "token={}&{OWNER}&secret_name=s1&share_value=c2hhcmU%3D",
            token.expose()
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        "Stored a share of secret [s1] for owner [email:owner@example.com]"
    );

    post(
        &app,
        "/get_retrieval_token",
        format!("request_id=r2&{OWNER}&secret_name=s1"),
    )
    .await;
    let token = custody.last_token().await.unwrap();
    let (status, body) = post(
        &app,
        "/retrieve_share",
        format!("token={}&{OWNER}&secret_name=s1", token.expose()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "c2hhcmU=");

    post(
        &app,
        "/get_deletion_token",
        format!("request_id=r3&{OWNER}&secret_name=s1"),
    )
    .await;
    let token = custody.last_token().await.unwrap();
    let (status, body) = post(
        &app,
        "/delete_share",
        format!("token={}&{OWNER}&secret_name=s1", token.expose()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        "Deleted a share of secret [s1] of owner [email:owner@example.com]"
    );
}

#[tokio::test]
async fn rejections_map_to_statuses() {
    let custody = TestCustody::new();
    let app = router(custody.coordinator.clone());

    let (status, body) = post(&app, "/get_storage_token", format!("{OWNER}&secret_name=s1")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "missing request_id");

    let (status, body) = post(
        &app,
        "/get_retrieval_token",
        format!("request_id=r1&{OWNER}&secret_name=s1"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "Req. r1: share not found.");

    let (status, body) = post(
        &app,
        "/store_share",
        format!("token=forged&{OWNER}&secret_name=s1&share_value=v"),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, "could not store the share: token not found");

    let token = custody.obtain_token(Operation::Store, "s1").await;
    custody
        .share_failures
        .fail_with(svalbard_core::ShareStoreError::backend("EIO at /srv/shares"));
    let (status, body) = post(
        &app,
        "/store_share",
        format!("token={}&{OWNER}&secret_name=s1&share_value=v", token.expose()),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "unknown error");
}

#[tokio::test]
async fn only_post_is_accepted() {
    let custody = TestCustody::new();
    let app = router(custody.coordinator.clone());

    for path in ["/get_storage_token", "/retrieve_share", "/delete_share"] {
        let (status, body) = call(&app, Method::GET, path, String::new()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{path}");
        assert_eq!(body, "expected POST request");
    }
    let (status, _) = call(&app, Method::PUT, "/store_share", String::new()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_bodies_are_bad_requests() {
    let custody = TestCustody::new();
    let app = router(custody.coordinator.clone());

    let request = Request::builder()
        .method(Method::POST)
        .uri("/get_storage_token")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"request_id":"r1"}"#))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(custody.channel.attempts(), 0);
}

#[tokio::test]
async fn health_probe_through_middleware() {
    let custody = TestCustody::new();
    let app = app(custody.coordinator.clone(), Duration::from_secs(5));

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"ok");
}
