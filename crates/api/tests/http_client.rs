//! HttpApiClient 통합 테스트: httpmock 서버 대상

use std::time::Duration;

use depwatch_api::client::{START_CHECK_PATH, SUBMIT_RESULT_PATH, UPLOAD_FILE_PATH};
use depwatch_api::{ApiClient, ApiError, HttpApiClient};
use depwatch_core::config::ServerConfig;
use httpmock::prelude::*;

fn client_for(server: &MockServer) -> HttpApiClient {
    let config = ServerConfig {
        base_url: server.base_url(),
        request_timeout_secs: 5,
        tls_allow_insecure: false,
    };
    HttpApiClient::new(&config, "secret-token").expect("client should build")
}

#[tokio::test]
async fn start_signal_posts_task_info_with_bearer_token() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(START_CHECK_PATH)
                .header("authorization", "Bearer secret-token")
                .json_body(serde_json::json!({"task_info": "task-42"}));
            then.status(200);
        })
        .await;

    client_for(&server)
        .submit_start_signal("task-42")
        .await
        .expect("start signal should succeed");
    mock.assert_async().await;
}

#[tokio::test]
async fn submit_result_wraps_payload() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(SUBMIT_RESULT_PATH)
                .json_body(serde_json::json!({
                    "task_info": "task-1",
                    "result": {"modules": []}
                }));
            then.status(204);
        })
        .await;

    client_for(&server)
        .submit_result("task-1", &serde_json::json!({"modules": []}))
        .await
        .expect("submit should succeed");
    mock.assert_async().await;
}

#[tokio::test]
async fn upload_sends_raw_bytes_with_path_query() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(UPLOAD_FILE_PATH)
                .query_param("task_info", "task-9")
                .query_param("path", "bin/app.jar")
                .body("PK\u{3}\u{4}");
            then.status(200);
        })
        .await;

    client_for(&server)
        .upload_file("task-9", "bin/app.jar", b"PK\x03\x04".to_vec())
        .await
        .expect("upload should succeed");
    mock.assert_async().await;
}

#[tokio::test]
async fn structured_error_body_becomes_application_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(START_CHECK_PATH);
            then.status(403).json_body(serde_json::json!({
                "error": {"code": 10403, "message": "forbidden", "details": "quota exceeded"}
            }));
        })
        .await;

    let err = client_for(&server)
        .submit_start_signal("task-1")
        .await
        .expect_err("403 must fail");
    assert_eq!(err.to_string(), "[10403]quota exceeded");
    assert!(matches!(err, ApiError::Application { status: 403, .. }));
}

#[tokio::test]
async fn unparseable_error_body_is_distinct() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(START_CHECK_PATH);
            then.status(500).body("internal server error");
        })
        .await;

    let err = client_for(&server)
        .submit_start_signal("task-1")
        .await
        .expect_err("500 must fail");
    assert_eq!(err, ApiError::ParseErrorBody { status: 500 });
}

#[tokio::test]
async fn slow_server_yields_timeout() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(START_CHECK_PATH);
            then.status(200).delay(Duration::from_secs(3));
        })
        .await;

    let config = ServerConfig {
        base_url: server.base_url(),
        request_timeout_secs: 1,
        tls_allow_insecure: false,
    };
    let client = HttpApiClient::new(&config, "t").unwrap();
    let err = client.submit_start_signal("task-1").await.expect_err("should time out");
    assert_eq!(err, ApiError::Timeout);
}

#[tokio::test]
async fn unreachable_server_is_request_error() {
    let config = ServerConfig {
        base_url: "http://127.0.0.1:9".to_owned(),
        request_timeout_secs: 5,
        tls_allow_insecure: false,
    };
    let client = HttpApiClient::new(&config, "t").unwrap();
    let err = client.submit_start_signal("task-1").await.expect_err("should fail");
    assert!(matches!(err, ApiError::Request(_)), "got {err:?}");
}
