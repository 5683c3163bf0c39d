use std::net::SocketAddr;
use std::time::Duration;

use axum::body::to_bytes;
use axum::extract::Request;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;

use audio_stream_proxy::{Relay, RelayError};

const TEST_SIZE: usize = 256 * 1024;

fn test_body() -> Vec<u8> {
    (0..TEST_SIZE).map(|i| (i % 256) as u8).collect()
}

async fn serve_audio(req: Request) -> impl IntoResponse {
    let body = test_body();
    let total = body.len() as u64;

    if let Some(range_val) = req.headers().get("Range") {
        let range_str = range_val.to_str().unwrap_or("");
        if let Some(rest) = range_str.strip_prefix("bytes=") {
            let parts: Vec<&str> = rest.splitn(2, '-').collect();
            if parts.len() == 2 {
                let start: u64 = parts[0].parse().unwrap_or(0);
                let end: u64 = if parts[1].is_empty() {
                    total - 1
                } else {
                    parts[1].parse().unwrap_or(total - 1)
                };
                let end = end.min(total - 1);
                let slice = &body[start as usize..=end as usize];
                let content_range = format!("bytes {}-{}/{}", start, end, total);
                return (
                    StatusCode::PARTIAL_CONTENT,
                    [
                        (header::CONTENT_TYPE, "audio/mp4".to_string()),
                        (header::CONTENT_RANGE, content_range),
                        (header::CONTENT_LENGTH, slice.len().to_string()),
                    ],
                    slice.to_vec(),
                )
                    .into_response();
            }
        }
    }

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "audio/mp4".to_string()),
            (header::CONTENT_LENGTH, total.to_string()),
        ],
        body,
    )
        .into_response()
}

async fn missing() -> impl IntoResponse {
    StatusCode::NOT_FOUND
}

async fn start_origin() -> (SocketAddr, tokio::task::JoinHandle<()>) {
    let app = Router::new()
        .route("/audio.m4a", get(serve_audio))
        .route("/gone.m4a", get(missing));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, handle)
}

fn relay() -> Relay {
    Relay::new(Duration::from_secs(10), 1800).unwrap()
}

#[tokio::test]
async fn full_fetch_streams_the_whole_body() {
    let (addr, _handle) = start_origin().await;
    let url = format!("http://{}/audio.m4a", addr);

    let response = relay().stream(&url, None).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "audio/mp4"
    );
    assert_eq!(
        response.headers().get(header::ACCEPT_RANGES).unwrap(),
        "bytes"
    );
    assert_eq!(
        response.headers().get(header::CACHE_CONTROL).unwrap(),
        "public, max-age=1800"
    );

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(bytes.len(), TEST_SIZE);
    assert_eq!(&bytes[..], &test_body()[..]);
}

#[tokio::test]
async fn caller_range_is_forwarded_verbatim() {
    let (addr, _handle) = start_origin().await;
    let url = format!("http://{}/audio.m4a", addr);

    let response = relay()
        .stream(&url, Some("bytes=1024-2047"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        response
            .headers()
            .get(header::CONTENT_RANGE)
            .unwrap()
            .to_str()
            .unwrap(),
        format!("bytes 1024-2047/{}", TEST_SIZE)
    );

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(bytes.len(), 1024);
    assert_eq!(&bytes[..], &test_body()[1024..2048]);
}

#[tokio::test]
async fn upstream_404_fails_before_any_byte() {
    let (addr, _handle) = start_origin().await;
    let url = format!("http://{}/gone.m4a", addr);

    let err = relay().stream(&url, None).await.unwrap_err();
    match err {
        RelayError::UpstreamStatus(code) => assert_eq!(code, 404),
        other => panic!("expected UpstreamStatus, got {:?}", other),
    }
}

#[tokio::test]
async fn unreachable_origin_is_a_connect_error() {
    let err = relay()
        .stream("http://127.0.0.1:1/audio.m4a", None)
        .await
        .unwrap_err();
    assert!(matches!(err, RelayError::Connect(_)));
}
