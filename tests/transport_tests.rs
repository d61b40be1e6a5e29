// Transport tests against a mock Lara server

use lara::core::auth::sign;
use lara::core::client::content_md5;
use lara::{ApiRequest, Attachment, ClientConfig, Credentials, HttpClient, LaraError};
use serde_json::{json, Value};
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn client(server: &MockServer, credentials: Credentials) -> HttpClient {
    let config = ClientConfig::default().with_server_url(server.uri());
    HttpClient::new(credentials, &config).unwrap()
}

fn header_str<'a>(request: &'a Request, name: &str) -> Option<&'a str> {
    request.headers.get(name).and_then(|v| v.to_str().ok())
}

/// Recompute the signature from what the server actually received
fn assert_signed(request: &Request, key_id: &str, secret: &str) {
    let date = header_str(request, "date").expect("date header");
    let md5 = header_str(request, "content-md5").unwrap_or("");
    let content_type = header_str(request, "content-type").unwrap_or("");
    let signature = sign(
        secret,
        request.method.as_str(),
        request.url.path(),
        md5,
        content_type,
        date,
    );
    assert_eq!(
        header_str(request, "authorization"),
        Some(format!("Lara {}:{}", key_id, signature).as_str())
    );
}

#[tokio::test]
async fn test_get_unwraps_content_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/languages"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"content": ["en-US", "it-IT"]})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, Credentials::new("key-id", "secret"));
    let languages: Vec<String> = assert_ok!(client.get("/languages").await);
    assert_eq!(languages, vec!["en-US", "it-IT"]);

    let requests = server.received_requests().await.unwrap();
    let request = &requests[0];
    assert_signed(request, "key-id", "secret");
    assert_eq!(header_str(request, "x-http-method-override"), Some("GET"));
    assert_eq!(header_str(request, "x-lara-sdk-name"), Some("lara-rust"));
    assert!(header_str(request, "content-md5").is_none());
    assert!(header_str(request, "content-type").is_none());
}

#[tokio::test]
async fn test_json_body_is_hashed_and_signed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/memories"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"content": {"ok": true}})))
        .mount(&server)
        .await;

    let client = client(&server, Credentials::new("key-id", "secret"));
    let response: Value = client.post("/memories", &json!({"name": "demo"})).await.unwrap();
    assert_eq!(response, json!({"ok": true}));

    let requests = server.received_requests().await.unwrap();
    let request = &requests[0];
    assert_eq!(
        header_str(request, "content-md5"),
        Some(content_md5(&request.body).as_str())
    );
    assert_signed(request, "key-id", "secret");
}

#[tokio::test]
async fn test_multipart_body_is_hashed_and_signed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/memories/m1/import"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"content": {"id": "imp_1"}})))
        .mount(&server)
        .await;

    let client = client(&server, Credentials::new("key-id", "secret"));
    let request = ApiRequest::post("memories/m1/import")
        .json(&json!({}))
        .unwrap()
        .attachment(Attachment::new("tmx", "memory.tmx", b"<tmx/>".to_vec()));
    let _: Value = client.send(request).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let request = &requests[0];
    let content_type = header_str(request, "content-type").unwrap();
    assert!(content_type.starts_with("multipart/form-data; boundary="));
    assert_eq!(
        header_str(request, "content-md5"),
        Some(content_md5(&request.body).as_str())
    );
    assert_signed(request, "key-id", "secret");
}

#[tokio::test]
async fn test_anonymous_requests_are_unsigned() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/languages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"content": []})))
        .mount(&server)
        .await;

    let client = client(&server, Credentials::new("key-id", ""));
    let _: Vec<String> = client.get("/languages").await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert!(header_str(&requests[0], "authorization").is_none());
}

#[tokio::test]
async fn test_query_parameters_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/documents/upload-url"))
        .and(query_param("filename", "report final.docx"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"content": {"url": "x"}})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, Credentials::new("key-id", "secret"));
    let request = ApiRequest::get("/documents/upload-url").query("filename", "report final.docx");
    let content: Value = client.send(request).await.unwrap();
    assert_eq!(content["url"], "x");

    let requests = server.received_requests().await.unwrap();
    assert_signed(&requests[0], "key-id", "secret");
}

#[tokio::test]
async fn test_error_envelope_becomes_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/memories/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(
            json!({"status": 404, "error": {"type": "NotFound", "message": "nope"}}),
        ))
        .mount(&server)
        .await;

    let client = client(&server, Credentials::new("key-id", "secret"));
    let err = assert_err!(client.get::<Value>("/memories/missing").await);
    match err {
        LaraError::Api {
            status,
            error_type,
            message,
        } => {
            assert_eq!(status, 404);
            assert_eq!(error_type, "NotFound");
            assert_eq!(message, "nope");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_non_json_error_becomes_generic_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/languages"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let client = client(&server, Credentials::new("key-id", "secret"));
    match client.get::<Value>("/languages").await {
        Err(LaraError::GenericApi { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "upstream exploded");
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn test_shape_mismatch_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/languages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"content": {"a": 1}})))
        .mount(&server)
        .await;

    let client = client(&server, Credentials::new("key-id", "secret"));
    let result = client.get::<Vec<String>>("/languages").await;
    assert!(matches!(result, Err(LaraError::Decode { .. })));
}

#[tokio::test]
async fn test_raw_get_returns_body_and_surfaces_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/glossaries/g1/export"))
        .respond_with(ResponseTemplate::new(200).set_body_string("en-US,it-IT\nhello,ciao\n"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/glossaries/g2/export"))
        .respond_with(ResponseTemplate::new(403).set_body_json(
            json!({"status": 403, "error": {"type": "Forbidden", "message": "denied"}}),
        ))
        .mount(&server)
        .await;

    let client = client(&server, Credentials::new("key-id", "secret"));
    let body = client
        .send_raw(ApiRequest::get("/glossaries/g1/export"))
        .await
        .unwrap();
    assert_eq!(&body[..], b"en-US,it-IT\nhello,ciao\n");

    let err = client
        .send_raw(ApiRequest::get("/glossaries/g2/export"))
        .await
        .unwrap_err();
    assert!(matches!(err, LaraError::Api { status: 403, .. }));
}

#[tokio::test]
async fn test_slow_response_is_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/languages"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"content": []}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let config = ClientConfig::default()
        .with_server_url(server.uri())
        .with_timeout(Duration::from_millis(50));
    let client = HttpClient::new(Credentials::anonymous(), &config).unwrap();

    let err = client.get::<Vec<String>>("/languages").await.unwrap_err();
    assert!(err.is_timeout(), "expected timeout, got {:?}", err);
}

#[tokio::test]
async fn test_unreachable_server_is_connection_error() {
    let config = ClientConfig::default().with_server_url("http://127.0.0.1:1");
    let client = HttpClient::new(Credentials::anonymous(), &config).unwrap();

    let err = client.get::<Vec<String>>("/languages").await.unwrap_err();
    assert!(matches!(err, LaraError::Connection { .. }), "got {:?}", err);
}

#[tokio::test]
async fn test_timeout_in_url_does_not_make_connection_error_a_timeout() {
    let config = ClientConfig::default().with_server_url("http://127.0.0.1:1");
    let client = HttpClient::new(Credentials::anonymous(), &config).unwrap();

    let request =
        ApiRequest::get("/documents/upload-url").query("filename", "timeout-report.docx");
    let err = client.send::<Value>(request).await.unwrap_err();
    assert!(matches!(err, LaraError::Connection { .. }), "got {:?}", err);
    assert!(!err.is_timeout());
}
