//! HttpTransport against a minimal local HTTP responder

use std::time::Duration;

use sample_uploader::transport::{HttpTransport, Transport, TransportError};
use sample_uploader::{RunConfig, UploadTarget};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use super::common::sample_tree;

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Read one HTTP/1.1 request (headers plus Content-Length or chunked body)
async fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        let Some(header_end) = find(&buf, b"\r\n\r\n") else {
            continue;
        };
        let head = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
        let body_len = buf.len() - header_end - 4;
        let content_length = head
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok());
        match content_length {
            Some(len) if body_len >= len => break,
            None if find(&buf, b"\r\n0\r\n\r\n").is_some() => break,
            _ => {}
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Serve one request with `status`, returning the raw request text
async fn respond_once(status: u16) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let host = format!("http://{}", listener.local_addr().unwrap());
    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let request = read_request(&mut stream).await;
        let response = format!(
            "HTTP/1.1 {status} Status\r\ncontent-length: 2\r\nconnection: close\r\n\r\nok"
        );
        stream.write_all(response.as_bytes()).await.unwrap();
        stream.shutdown().await.ok();
        request
    });
    (host, handle)
}

fn transport_for(host: &str, timeout: Duration) -> HttpTransport {
    let config = RunConfig::new(host, "secret-token", ".").with_timeout(timeout);
    HttpTransport::from_config(&config).unwrap()
}

#[tokio::test]
async fn posts_multipart_with_token() {
    let dir = sample_tree(&["sample.bin"]);
    let (host, server) = respond_once(201).await;
    let transport = transport_for(&host, Duration::from_secs(5));

    let target = UploadTarget::new(dir.path().join("sample.bin"), "sample.bin");
    let response = transport.upload(&target).await.unwrap();
    assert_eq!(response.status, 201);

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /api/uploads/ HTTP/1.1"));
    assert!(request
        .to_lowercase()
        .contains("authorization: token secret-token"));
    assert!(request.contains("multipart/form-data"));
    assert!(request.contains("name=\"file\""));
    assert!(request.contains("filename=\"sample.bin\""));
    assert!(request.contains("sample-uploader/"));
}

#[tokio::test]
async fn non_success_status_is_returned_not_raised() {
    let dir = sample_tree(&["a.bin"]);
    let (host, server) = respond_once(503).await;
    let transport = transport_for(&host, Duration::from_secs(5));

    let target = UploadTarget::new(dir.path().join("a.bin"), "a.bin");
    let response = transport.upload(&target).await.unwrap();
    assert_eq!(response.status, 503);
    server.await.unwrap();
}

#[tokio::test]
async fn silent_server_times_out() {
    let dir = sample_tree(&["a.bin"]);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let host = format!("http://{}", listener.local_addr().unwrap());
    let server = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let _ = read_request(&mut stream).await;
        tokio::time::sleep(Duration::from_secs(5)).await;
    });

    let transport = transport_for(&host, Duration::from_millis(200));
    let target = UploadTarget::new(dir.path().join("a.bin"), "a.bin");
    let err = transport.upload(&target).await.unwrap_err();
    assert_eq!(err, TransportError::Timeout);
    server.abort();
}

#[tokio::test]
async fn refused_connection_is_a_connection_error() {
    let dir = sample_tree(&["a.bin"]);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let host = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let transport = transport_for(&host, Duration::from_secs(5));
    let target = UploadTarget::new(dir.path().join("a.bin"), "a.bin");
    let err = transport.upload(&target).await.unwrap_err();
    assert!(matches!(err, TransportError::Connection(_)), "got {err:?}");
}
