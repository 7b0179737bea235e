//! Integration tests for HTTP delivery against a local mock service.

use agent_readings::Reading;
use agent_request::{RequestConfig, RequestError, RequestTransport};
use chrono::Utc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

fn sample_reading() -> Reading {
    Reading {
        serial_number: "FW-DEVICE-12345".to_string(),
        temperature: 22.5,
        humidity: 55.0,
        soil_temperature: 18.0,
        soil_moisture: 45.0,
        livestock_temperature: 38.2,
        timestamp: Utc::now(),
    }
}

/// Read one HTTP request: headers plus content-length body bytes.
async fn read_request(socket: &mut TcpStream) -> Vec<u8> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);

        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let headers = String::from_utf8_lossy(&buf[..pos]).to_ascii_lowercase();
            let body_len = headers
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= pos + 4 + body_len {
                break;
            }
        }
    }
    buf
}

/// Spawn a mock collection service returning a fixed response.
async fn spawn_http_mock(
    status_line: &'static str,
    body: &'static str,
) -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&requests);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            let _ = read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = socket.write_all(response.as_bytes()).await;
        }
    });

    (format!("http://{addr}"), requests)
}

#[tokio::test]
async fn created_response_returns_ack_payload() {
    let (base_url, requests) = spawn_http_mock("201 Created", r#"{"id":"abc123"}"#).await;
    let transport = RequestTransport::new(RequestConfig {
        base_url,
        timeout_secs: 5,
    })
    .unwrap();

    let ack = transport.post_reading(&sample_reading()).await.unwrap();

    assert_eq!(ack["id"], "abc123");
    assert_eq!(requests.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn non_created_status_is_rejected_with_body() {
    let (base_url, _) = spawn_http_mock("500 Internal Server Error", "internal error").await;
    let transport = RequestTransport::new(RequestConfig {
        base_url,
        timeout_secs: 5,
    })
    .unwrap();

    let err = transport.post_reading(&sample_reading()).await.unwrap_err();

    match err {
        RequestError::Rejected { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "internal error");
        }
        other => panic!("expected Rejected, got {other:?}"),
    }
}

#[tokio::test]
async fn ok_status_is_still_rejected() {
    // Success is strictly 201; a 200 must not be treated as accepted.
    let (base_url, _) = spawn_http_mock("200 OK", "{}").await;
    let transport = RequestTransport::new(RequestConfig {
        base_url,
        timeout_secs: 5,
    })
    .unwrap();

    let err = transport.post_reading(&sample_reading()).await.unwrap_err();
    assert!(matches!(err, RequestError::Rejected { status: 200, .. }));
}

#[tokio::test]
async fn connection_refused_is_transport_error() {
    // Grab a port that nothing is listening on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let transport = RequestTransport::new(RequestConfig {
        base_url: format!("http://{addr}"),
        timeout_secs: 2,
    })
    .unwrap();

    let err = transport.post_reading(&sample_reading()).await.unwrap_err();
    assert!(matches!(err, RequestError::Http(_)));
}
