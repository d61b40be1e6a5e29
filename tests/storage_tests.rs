// Object store transfers against local servers

use lara::core::storage::ObjectStore;
use lara::LaraError;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Serve one response that promises 100 bytes but closes after 10
async fn truncating_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 4096];
        let _ = socket.read(&mut buf).await;
        socket
            .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\n0123456789")
            .await
            .unwrap();
        socket.shutdown().await.unwrap();
    });

    format!("http://{}/bucket/out.docx", addr)
}

#[tokio::test]
async fn test_interrupted_download_keeps_previous_file() {
    let url = truncating_server().await;
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("out.docx");
    std::fs::write(&dest, b"previous translation").unwrap();

    let store = ObjectStore::new(reqwest::Client::new());
    let err = store.download_to(&url, &dest).await.unwrap_err();

    assert!(
        matches!(err, LaraError::Connection { .. } | LaraError::Timeout { .. }),
        "got {:?}",
        err
    );
    assert_eq!(std::fs::read(&dest).unwrap(), b"previous translation");
    assert!(!dir.path().join("out.docx.part").exists());
}

#[tokio::test]
async fn test_completed_download_replaces_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bucket/out.docx"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"fresh translation".to_vec()))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("out.docx");
    std::fs::write(&dest, b"previous translation").unwrap();

    let store = ObjectStore::new(reqwest::Client::new());
    let written = store
        .download_to(&format!("{}/bucket/out.docx", server.uri()), &dest)
        .await
        .unwrap();

    assert_eq!(written, 17);
    assert_eq!(std::fs::read(&dest).unwrap(), b"fresh translation");
    assert!(!dir.path().join("out.docx.part").exists());
}

#[tokio::test]
async fn test_rejected_download_creates_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bucket/expired"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("out.docx");

    let store = ObjectStore::new(reqwest::Client::new());
    let err = store
        .download_to(&format!("{}/bucket/expired", server.uri()), &dest)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        LaraError::ObjectStore {
            operation: "download",
            status: 403
        }
    ));
    assert!(!dest.exists());
    assert!(!dir.path().join("out.docx.part").exists());
}
