//! Client behaviour against a mock API

use serde_json::json;
use stampede_config::Role;
use stampede_http::{ApiClient, ApiRequest, Credentials, HttpClient, HttpConfig, HttpMethod};
use std::time::Duration;
use wiremock::matchers::{body_json, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer, credentials: Credentials) -> ApiClient {
    ApiClient::new(server.uri(), credentials, &HttpConfig::default()).unwrap()
}

#[tokio::test]
async fn test_get_attaches_bearer_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/products"))
        .and(query_param("pageNumber", "1"))
        .and(header("authorization", "Bearer user-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Credentials::new().with_token(Role::User, "user-token"));
    let outcome = client
        .get("/products?pageNumber=1&pageSize=10", Some(Role::User), "list products")
        .await;

    assert_eq!(outcome.status, 200);
    assert_eq!(outcome.method, HttpMethod::Get);
    assert_eq!(outcome.parsed_body(), Some(json!({"items": []})));
    assert!(outcome.error.is_none());
}

#[tokio::test]
async fn test_post_serializes_json_body() {
    let server = MockServer::start().await;
    let payload = json!({"name": "Widget", "price": 9.5});

    Mock::given(method("POST"))
        .and(path("/products"))
        .and(header("content-type", "application/json"))
        .and(body_json(payload.clone()))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 7, "name": "Widget", "price": 9.5})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Credentials::new().with_token(Role::Admin, "admin-token"));
    let outcome = client
        .post("/products", payload, Some(Role::Admin), "create product")
        .await;

    assert_eq!(outcome.status, 201);
    assert_eq!(outcome.parsed_body().unwrap()["id"], 7);
}

#[tokio::test]
async fn test_missing_token_sends_unauthenticated_request() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/products/3"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/products/3"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "unauthorized"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Credentials::new());
    let outcome = client
        .delete("/products/3", Some(Role::SuperUser), "delete product")
        .await;

    assert_eq!(outcome.status, 401);
    assert!(outcome.is_failure());
}

#[tokio::test]
async fn test_error_status_is_returned_not_raised() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/products/1"))
        .respond_with(ResponseTemplate::new(500).set_body_string("x".repeat(1_000)))
        .mount(&server)
        .await;

    let client = client_for(&server, Credentials::new());
    let outcome = client
        .put("/products/1", json!({"price": 1}), None, "update product")
        .await;

    assert_eq!(outcome.status, 500);
    assert_eq!(outcome.body.len(), 1_000);
    assert_eq!(outcome.body_preview(200).len(), 200);
}

#[tokio::test]
async fn test_transport_failure_yields_status_zero() {
    let config = HttpConfig {
        timeout: Duration::from_millis(500),
        connect_timeout: Duration::from_millis(200),
        ..HttpConfig::default()
    };
    // port 9 (discard) on localhost is expected to refuse connections
    let client = ApiClient::new("http://127.0.0.1:9", Credentials::new(), &config).unwrap();

    let outcome = client.get("/products", None, "list products").await;

    assert_eq!(outcome.status, 0);
    assert!(outcome.error.is_some());
    assert!(outcome.is_failure());
}

#[tokio::test]
async fn test_batch_preserves_request_order() {
    let server = MockServer::start().await;

    for id in 1..=3 {
        Mock::given(method("GET"))
            .and(path(format!("/products/{}", id)))
            .respond_with(
                ResponseTemplate::new(if id == 2 { 404 } else { 200 })
                    .set_body_json(json!({"id": id}))
                    .set_delay(Duration::from_millis(30 * (4 - id))),
            )
            .mount(&server)
            .await;
    }

    let client = client_for(&server, Credentials::new());
    let outcomes = client
        .batch(
            (1..=3)
                .map(|id| ApiRequest::get(format!("/products/{}", id)))
                .collect(),
        )
        .await;

    let statuses: Vec<u16> = outcomes.iter().map(|o| o.status).collect();
    assert_eq!(statuses, vec![200, 404, 200]);
    assert!(outcomes[0].url.ends_with("/products/1"));
    assert!(outcomes[2].url.ends_with("/products/3"));
}
