//! Tests for the Icinga2 API client against a mock server

use assert_matches::assert_matches;
use icinga_bridge::ServiceIdentity;
use icinga_bridge::client::icinga::IcingaClient;
use icinga_bridge::client::{ApiError, MonitoringApi, Service};
use icinga_bridge::result::{CheckResult, ExitStatus};
use reqwest::Url;
use serde_json::json;
use wiremock::matchers::{basic_auth, body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::*;

#[tokio::test]
async fn test_get_existing_service() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(service_path("web1", "cpu")))
        .and(basic_auth(USERNAME, PASSWORD))
        .and(header("accept", "application/json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(service_response("web1", "cpu", "hostalive")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let service = client
        .get_service(&ServiceIdentity::new("web1", "cpu"))
        .await
        .unwrap();

    assert_eq!(
        service,
        Some(Service {
            name: "cpu".to_string(),
            host_name: "web1".to_string(),
            check_command: "hostalive".to_string(),
        })
    );
}

#[tokio::test]
async fn test_get_missing_service() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(service_path("web1", "cpu")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": 404,
            "status": "No objects found."
        })))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let service = client
        .get_service(&ServiceIdentity::new("web1", "cpu"))
        .await
        .unwrap();

    assert_eq!(service, None);
}

#[tokio::test]
async fn test_get_service_server_error_is_not_missing() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(service_path("web1", "cpu")))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let result = client.get_service(&ServiceIdentity::new("web1", "cpu")).await;

    assert_matches!(
        result,
        Err(ApiError::UnexpectedStatus { status: 503, ref body }) if body == "unavailable"
    );
}

#[tokio::test]
async fn test_get_service_malformed_body() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(service_path("web1", "cpu")))
        .respond_with(ResponseTemplate::new(200).set_body_string("{invalid json"))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let result = client.get_service(&ServiceIdentity::new("web1", "cpu")).await;

    assert_matches!(result, Err(ApiError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_create_service() {
    let mock_server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(service_path("web1", "cpu")))
        .and(basic_auth(USERNAME, PASSWORD))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({
            "attrs": {
                "host_name": "web1",
                "check_command": "hostalive"
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{"code": 200.0, "status": "Object was created"}]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    client
        .create_service(&Service {
            name: "cpu".to_string(),
            host_name: "web1".to_string(),
            check_command: "hostalive".to_string(),
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn test_process_check_result() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/actions/process-check-result"))
        .and(basic_auth(USERNAME, PASSWORD))
        .and(header("content-type", "application/json"))
        .and(body_json(check_result_body(
            "web1",
            "cpu",
            "usage:42 ",
            &["usage=42;;;"],
        )))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    client
        .process_check_result(
            &ServiceIdentity::new("web1", "cpu"),
            &CheckResult {
                exit_status: ExitStatus::Ok,
                plugin_output: "usage:42 ".to_string(),
                performance_data: vec!["usage=42;;;".to_string()],
                check_source: "web1".to_string(),
            },
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_debug_client_sends_same_payload() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/actions/process-check-result"))
        .and(header("content-type", "application/json"))
        .and(body_json(check_result_body("web1", "cpu", "usage:1 ", &["usage=1;;;"])))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let url = Url::parse(&mock_server.uri()).unwrap();
    let client = IcingaClient::builder(url, USERNAME, PASSWORD)
        .debug(true)
        .build()
        .unwrap();
    client
        .process_check_result(
            &ServiceIdentity::new("web1", "cpu"),
            &CheckResult {
                exit_status: ExitStatus::Ok,
                plugin_output: "usage:1 ".to_string(),
                performance_data: vec!["usage=1;;;".to_string()],
                check_source: "web1".to_string(),
            },
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_unreachable_api() {
    // nothing listens on this port
    let client = icinga_bridge::client::icinga::IcingaClient::builder(
        reqwest::Url::parse("http://127.0.0.1:9").unwrap(),
        USERNAME,
        PASSWORD,
    )
    .timeout(std::time::Duration::from_secs(2))
    .build()
    .unwrap();

    let result = client.get_service(&ServiceIdentity::new("web1", "cpu")).await;

    assert_matches!(result, Err(ApiError::Request(_)));
}
