//! Integration tests for the request pipeline.
//!
//! These tests run the client against a `wiremock` server to verify the full
//! request/response flow.

use std::time::{Duration, Instant};

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use stream_chat::request::params;
use stream_chat::{QueryParams, StreamClient};
use wiremock::matchers::{body_json, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const KEY: &str = "test-key";
const SECRET: &str = "test-secret";

#[derive(Debug, Deserialize, PartialEq)]
struct Channel {
    id: String,
    member_count: u32,
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    text: &'a str,
}

fn client_for(server: &MockServer) -> StreamClient {
    StreamClient::builder(KEY, SECRET)
        .base_url(server.uri())
        .build()
        .expect("client should build")
}

fn decode_claims(token: &str) -> Map<String, Value> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.required_spec_claims.clear();
    validation.validate_exp = false;
    decode::<Map<String, Value>>(
        token,
        &DecodingKey::from_secret(SECRET.as_bytes()),
        &validation,
    )
    .expect("token should verify")
    .claims
}

#[tokio::test]
async fn test_get_decodes_success_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/channels/messaging/general"))
        .and(query_param("api_key", KEY))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": "general", "member_count": 3})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let channel: Channel = client
        .get("channels/messaging/general", &QueryParams::new())
        .await
        .unwrap();

    assert_eq!(
        channel,
        Channel {
            id: "general".to_string(),
            member_count: 3
        }
    );
}

#[tokio::test]
async fn test_sends_auth_headers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/app"))
        .and(header("content-type", "application/json"))
        .and(header("stream-auth-type", "jwt"))
        .and(header_exists("x-stream-client"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let _: Value = client.get("app", &QueryParams::new()).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let token = requests[0].headers["authorization"].to_str().unwrap();
    let claims = decode_claims(token);
    assert_eq!(claims.get("server"), Some(&Value::Bool(true)));
    assert!(!claims.contains_key("exp"));
}

#[tokio::test]
async fn test_query_carries_params_and_single_api_key() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/channels"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let query = params([("type", "messaging"), ("type", "team"), ("limit", "5")]);
    let _: Vec<Value> = client.get("channels", &query).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let pairs: Vec<(String, String)> = requests[0]
        .url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let api_keys: Vec<_> = pairs.iter().filter(|(k, _)| k == "api_key").collect();
    assert_eq!(api_keys, vec![&("api_key".to_string(), KEY.to_string())]);

    let types: Vec<_> = pairs
        .iter()
        .filter(|(k, _)| k == "type")
        .map(|(_, v)| v.as_str())
        .collect();
    assert_eq!(types, vec!["messaging", "team"]);
    assert!(pairs.contains(&("limit".to_string(), "5".to_string())));
}

#[tokio::test]
async fn test_post_sends_json_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/channels/messaging/general/message"))
        .and(body_json(json!({"text": "one does not simply"})))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"id": "general", "member_count": 1})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let channel: Channel = client
        .post(
            "channels/messaging/general/message",
            &QueryParams::new(),
            &SendMessage {
                text: "one does not simply",
            },
        )
        .await
        .unwrap();
    assert_eq!(channel.member_count, 1);
}

#[tokio::test]
async fn test_absent_body_sends_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/app"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let _: Value = client.get("app", &QueryParams::new()).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].body.is_empty());
}

#[tokio::test]
async fn test_not_found_reports_request_context() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/channels/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result: stream_chat::Result<Channel> =
        client.get("channels/missing", &QueryParams::new()).await;

    let err = result.unwrap_err();
    assert!(err.is_status());
    assert!(err.is_not_found());

    let message = err.to_string();
    assert!(message.contains("GET"));
    assert!(message.contains(&format!(
        "{}/channels/missing?api_key={}",
        server.uri(),
        KEY
    )));
    assert!(message.contains("404"));
    assert!(message.contains("not found"));
}

#[tokio::test]
async fn test_status_399_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/users/gandalf"))
        .respond_with(ResponseTemplate::new(399).set_body_string("odd"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .delete("users/gandalf", &QueryParams::new())
        .await
        .unwrap_err();
    assert_eq!(err.status().map(|s| s.as_u16()), Some(399));
    assert!(err.to_string().contains("DELETE"));
}

#[tokio::test]
async fn test_server_error_without_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .request_empty(Method::POST, "users", &QueryParams::new(), Some(&json!({})))
        .await
        .unwrap_err();

    match err {
        stream_chat::Error::Status {
            method,
            status,
            body,
            ..
        } => {
            assert_eq!(method, Method::POST);
            assert_eq!(status.as_u16(), 500);
            assert!(body.is_empty());
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_success_without_destination() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/users/frodo"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client
        .delete("users/frodo", &QueryParams::new())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_undecodable_body_is_a_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/channels/general"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 42})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .get::<Channel>("channels/general", &QueryParams::new())
        .await
        .unwrap_err();

    assert!(err.is_decode());
    assert!(!err.is_status());
    assert!(!err.is_transport());
}

#[tokio::test]
async fn test_timeout_is_classified() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let client = StreamClient::builder(KEY, SECRET)
        .base_url(server.uri())
        .timeout(Duration::from_millis(300))
        .build()
        .unwrap();

    let started = Instant::now();
    let err = client
        .get::<Value>("slow", &QueryParams::new())
        .await
        .unwrap_err();
    let elapsed = started.elapsed();

    assert!(err.is_timeout(), "expected timeout, got {err:?}");
    assert!(
        elapsed >= Duration::from_millis(250),
        "returned too early: {elapsed:?}"
    );
    assert!(
        elapsed < Duration::from_secs(4),
        "returned too late: {elapsed:?}"
    );
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    // Nothing listens on the discard port.
    let client = StreamClient::builder(KEY, SECRET)
        .base_url("http://127.0.0.1:9")
        .timeout(Duration::from_secs(2))
        .build()
        .unwrap();

    let err = client
        .get::<Value>("app", &QueryParams::new())
        .await
        .unwrap_err();
    assert!(err.is_transport());
    assert!(err.status().is_none());
}

#[tokio::test]
async fn test_encode_error_before_network() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut unserializable = std::collections::HashMap::new();
    unserializable.insert((1, 2), "tuple keys are not JSON");

    let client = client_for(&server);
    let err = client
        .request_empty(
            Method::POST,
            "users",
            &QueryParams::new(),
            Some(&unserializable),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, stream_chat::Error::Encode(_)));
}

#[tokio::test]
async fn test_custom_http_client_is_used() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/app"))
        .and(header("x-proxy-route", "edge"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert("x-proxy-route", "edge".parse().unwrap());
    let http = reqwest::Client::builder()
        .default_headers(headers)
        .build()
        .unwrap();

    let client = StreamClient::builder(KEY, SECRET)
        .http_client(http)
        .base_url(server.uri())
        .build()
        .unwrap();
    let _: Value = client.get("app", &QueryParams::new()).await.unwrap();
}

#[tokio::test]
async fn test_clones_share_configuration_across_tasks() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/app"))
        .and(query_param("api_key", KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(8)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let client = client.clone();
            tokio::spawn(async move { client.get::<Value>("app", &QueryParams::new()).await })
        })
        .collect();

    for handle in handles {
        let body = handle.await.unwrap().unwrap();
        assert_eq!(body, json!({"ok": true}));
    }
}

#[tokio::test]
async fn test_truncated_error_body_is_reported_empty() {
    // Declares 100 body bytes, sends 3, then closes the connection.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 4096];
        let _ = socket.read(&mut buf).await;
        socket
            .write_all(b"HTTP/1.1 500 Internal Server Error\r\nContent-Length: 100\r\n\r\nabc")
            .await
            .unwrap();
        socket.shutdown().await.ok();
    });

    let client = StreamClient::builder(KEY, SECRET)
        .base_url(format!("http://{}", addr))
        .build()
        .unwrap();

    let err = client
        .get::<Value>("x", &QueryParams::new())
        .await
        .unwrap_err();

    match err {
        stream_chat::Error::Status {
            method,
            status,
            body,
            ..
        } => {
            assert_eq!(method, Method::GET);
            assert_eq!(status.as_u16(), 500);
            assert_eq!(body, "");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}
