//! Tests for the HTTP module

use super::*;
use crate::error::{Error, NetworkError};
use crate::types::{BackoffType, Method};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> ReqwestClient {
    let config = ReqwestClientConfig::builder()
        .base_url(server.uri())
        .backoff(
            BackoffType::Constant,
            Duration::from_millis(10),
            Duration::from_secs(1),
        )
        .no_rate_limit()
        .build();
    ReqwestClient::with_config(config).unwrap()
}

#[test]
fn test_client_config_default() {
    let config = ReqwestClientConfig::default();
    assert_eq!(config.timeout, Duration::from_secs(30));
    assert_eq!(config.max_retries, 3);
    assert!(config.base_url.is_none());
    assert!(config.rate_limit.is_some());
    assert!(config.user_agent.starts_with("tethys-pager/"));
}

#[test]
fn test_client_config_builder() {
    let config = ReqwestClientConfig::builder()
        .base_url("https://api.example.com")
        .timeout(Duration::from_secs(60))
        .max_retries(5)
        .backoff(
            BackoffType::Linear,
            Duration::from_millis(200),
            Duration::from_secs(30),
        )
        .header("X-Custom", "value")
        .user_agent("test-agent/1.0")
        .build();

    assert_eq!(config.base_url, Some("https://api.example.com".to_string()));
    assert_eq!(config.timeout, Duration::from_secs(60));
    assert_eq!(config.max_retries, 5);
    assert_eq!(config.backoff_type, BackoffType::Linear);
    assert_eq!(config.initial_backoff, Duration::from_millis(200));
    assert_eq!(config.max_backoff, Duration::from_secs(30));
    assert_eq!(
        config.default_headers.get("X-Custom"),
        Some(&"value".to_string())
    );
    assert_eq!(config.user_agent, "test-agent/1.0");
}

#[test]
fn test_request_builders() {
    let request = HttpRequest::get("/items")
        .query("cursor", "abc")
        .header("Accept", "application/json");

    assert_eq!(request.method, Method::GET);
    assert_eq!(request.url, "/items");
    assert_eq!(request.query_param("cursor"), Some("abc"));
    assert_eq!(request.query_param("missing"), None);
    assert_eq!(
        request.config.headers.get("Accept"),
        Some(&"application/json".to_string())
    );

    let config = RequestConfig::new()
        .json(serde_json::json!({"key": "value"}))
        .timeout(Duration::from_secs(10))
        .retries(2);
    let request = HttpRequest::new(Method::POST, "/search").with_config(config);
    assert!(request.config.body.is_some());
    assert_eq!(request.config.timeout, Some(Duration::from_secs(10)));
    assert_eq!(request.config.max_retries, Some(2));
}

#[test]
fn test_response_helpers() {
    let response = HttpResponse::ok("a,b").with_header("Content-Type", "text/plain");
    assert!(response.is_success());
    assert_eq!(response.text(), "a,b");
    assert_eq!(response.header("content-type"), Some("text/plain"));
    assert_eq!(response.header("CONTENT-TYPE"), Some("text/plain"));

    assert!(!HttpResponse::new(404, "").is_success());
    assert!(!HttpResponse::new(301, "").is_success());
}

#[tokio::test]
async fn test_send_reads_status_headers_and_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/items"))
        .and(query_param("cursor", "2"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Total", "9")
                .set_body_string("a,b,c,d"),
        )
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let response = client
        .send(HttpRequest::get("/api/items").query("cursor", "2"))
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.header("x-total"), Some("9"));
    assert_eq!(response.text(), "a,b,c,d");
}

#[tokio::test]
async fn test_send_through_shared_trait_object() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/secure"))
        .and(header("X-API-Key", "secret123"))
        .and(header("X-Request-Id", "req-456"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&mock_server)
        .await;

    let config = ReqwestClientConfig::builder()
        .base_url(mock_server.uri())
        .header("X-API-Key", "secret123")
        .no_rate_limit()
        .build();
    let client: Arc<dyn HttpClient> = Arc::new(ReqwestClient::with_config(config).unwrap());

    let response = client
        .send(HttpRequest::get("/api/secure").header("X-Request-Id", "req-456"))
        .await
        .unwrap();
    assert_eq!(response.text(), "ok");
}

#[tokio::test]
async fn test_404_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not found"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = client
        .send(HttpRequest::get("/api/missing"))
        .await
        .unwrap_err();

    assert_eq!(err, Error::http_status(404, "Not found"));
}

#[tokio::test]
async fn test_retry_on_500() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_string("recovered"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let response = client.send(HttpRequest::get("/api/flaky")).await.unwrap();

    assert_eq!(response.text(), "recovered");
}

#[tokio::test]
async fn test_retry_on_cdn_origin_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/origin"))
        .respond_with(ResponseTemplate::new(522))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/origin"))
        .respond_with(ResponseTemplate::new(200).set_body_string("reachable"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let response = client.send(HttpRequest::get("/api/origin")).await.unwrap();

    assert_eq!(response.text(), "reachable");
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_rate_limit_retry_after() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/limited"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "1")
                .set_body_string("Rate limited"),
        )
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/limited"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let response = client.send(HttpRequest::get("/api/limited")).await.unwrap();

    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn test_rate_limited_after_retries_exhausted() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/limited"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let request = HttpRequest::get("/api/limited").with_config(RequestConfig::new().retries(0));
    let err = client.send(request).await.unwrap_err();

    assert_eq!(
        err,
        Error::RateLimited {
            retry_after_seconds: 7
        }
    );
}

#[tokio::test]
async fn test_server_error_after_retries_exhausted() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/always-fail"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Server error"))
        .expect(3)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let request = HttpRequest::get("/api/always-fail").with_config(RequestConfig::new().retries(2));
    let err = client.send(request).await.unwrap_err();

    assert_eq!(err, Error::http_status(500, "Server error"));
}

#[tokio::test]
async fn test_connection_refused_is_classified() {
    let config = ReqwestClientConfig::builder()
        .max_retries(0)
        .no_rate_limit()
        .build();
    let client = ReqwestClient::with_config(config).unwrap();

    // Port 9 (discard) is closed on test machines
    let err = client
        .send(HttpRequest::get("http://127.0.0.1:9/items"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Network {
            kind: NetworkError::ServerNotFound,
            ..
        }
    ));
}

#[tokio::test]
async fn test_full_url_ignores_base() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/test"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let config = ReqwestClientConfig::builder()
        .base_url("http://unused.invalid")
        .no_rate_limit()
        .build();
    let client = ReqwestClient::with_config(config).unwrap();

    let response = client
        .send(HttpRequest::get(format!("{}/api/test", mock_server.uri())))
        .await
        .unwrap();
    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn test_requests_pass_through_rate_limiter() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/data"))
        .respond_with(ResponseTemplate::new(200))
        .expect(3)
        .mount(&mock_server)
        .await;

    let config = ReqwestClientConfig::builder()
        .base_url(mock_server.uri())
        .rate_limit(RateLimiterConfig::new(100, 10))
        .build();
    let client = ReqwestClient::with_config(config).unwrap();
    assert!(client.has_rate_limiter());

    for _ in 0..3 {
        let response = client.send(HttpRequest::get("/api/data")).await.unwrap();
        assert_eq!(response.status, 200);
    }
}

#[test]
fn test_calculate_backoff_constant() {
    let config = ReqwestClientConfig::builder()
        .backoff(
            BackoffType::Constant,
            Duration::from_millis(100),
            Duration::from_secs(10),
        )
        .no_rate_limit()
        .build();
    let client = ReqwestClient::with_config(config).unwrap();

    assert_eq!(client.calculate_backoff(0), Duration::from_millis(100));
    assert_eq!(client.calculate_backoff(5), Duration::from_millis(100));
}

#[test]
fn test_calculate_backoff_linear() {
    let config = ReqwestClientConfig::builder()
        .backoff(
            BackoffType::Linear,
            Duration::from_millis(100),
            Duration::from_secs(10),
        )
        .no_rate_limit()
        .build();
    let client = ReqwestClient::with_config(config).unwrap();

    assert_eq!(client.calculate_backoff(0), Duration::from_millis(100));
    assert_eq!(client.calculate_backoff(1), Duration::from_millis(200));
    assert_eq!(client.calculate_backoff(2), Duration::from_millis(300));
}

#[test]
fn test_calculate_backoff_exponential_capped() {
    let config = ReqwestClientConfig::builder()
        .backoff(
            BackoffType::Exponential,
            Duration::from_millis(100),
            Duration::from_millis(500),
        )
        .no_rate_limit()
        .build();
    let client = ReqwestClient::with_config(config).unwrap();

    assert_eq!(client.calculate_backoff(0), Duration::from_millis(100));
    assert_eq!(client.calculate_backoff(1), Duration::from_millis(200));
    assert_eq!(client.calculate_backoff(2), Duration::from_millis(400));
    assert_eq!(client.calculate_backoff(3), Duration::from_millis(500));
    assert_eq!(client.calculate_backoff(40), Duration::from_millis(500));
}

#[test]
fn test_client_debug() {
    let client = ReqwestClient::new().unwrap();
    let debug_str = format!("{client:?}");
    assert!(debug_str.contains("ReqwestClient"));
    assert!(debug_str.contains("has_rate_limiter: true"));
}
