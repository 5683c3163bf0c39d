// Streaming relay - fetches the resolved media URL and forwards the body
// downstream chunk by chunk, so memory stays bounded regardless of media
// length. The caller's Range header is passed through verbatim; upstream
// 200/206 are the only accepted statuses.

use std::fmt;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;
use futures_util::TryStreamExt;

const AUDIO_CONTENT_TYPE: &str = "audio/mp4";

#[derive(Debug, Clone)]
pub enum RelayError {
    /// Upstream answered with something other than 200/206
    UpstreamStatus(u16),
    /// Could not reach the media origin at all
    Connect(String),
    /// Building the client or the response failed
    Internal(String),
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UpstreamStatus(code) => write!(f, "upstream returned status {}", code),
            Self::Connect(detail) => write!(f, "upstream connection failed: {}", detail),
            Self::Internal(detail) => write!(f, "relay error: {}", detail),
        }
    }
}

impl std::error::Error for RelayError {}

#[derive(Clone)]
pub struct Relay {
    client: reqwest::Client,
    cache_max_age_secs: u64,
}

impl Relay {
    /// `upstream_timeout` covers the whole transfer and is sized for
    /// media downloads, not API calls.
    pub fn new(upstream_timeout: Duration, cache_max_age_secs: u64) -> Result<Self, RelayError> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(10))
            .connect_timeout(Duration::from_secs(10))
            .timeout(upstream_timeout)
            .build()
            .map_err(|e| RelayError::Internal(e.to_string()))?;
        Ok(Self {
            client,
            cache_max_age_secs,
        })
    }

    /// Stream `media_url` to the caller. `caller_range` is the incoming
    /// Range header, forwarded unchanged so seek and resume keep working.
    pub async fn stream(
        &self,
        media_url: &str,
        caller_range: Option<&str>,
    ) -> Result<Response, RelayError> {
        let mut request = self.client.get(media_url);
        if let Some(range) = caller_range {
            request = request.header(header::RANGE, range);
        }

        let upstream = request
            .send()
            .await
            .map_err(|e| RelayError::Connect(e.to_string()))?;

        let status = upstream.status().as_u16();
        if status != 200 && status != 206 {
            return Err(RelayError::UpstreamStatus(status));
        }

        let content_length = upstream
            .headers()
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());
        let content_range = upstream
            .headers()
            .get(header::CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());

        // Forward each chunk as it arrives; dropping the response body
        // aborts the upstream read when the caller disconnects.
        let body = Body::from_stream(
            upstream
                .bytes_stream()
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e)),
        );

        let status =
            StatusCode::from_u16(status).map_err(|e| RelayError::Internal(e.to_string()))?;
        let mut builder = Response::builder()
            .status(status)
            .header(header::CONTENT_TYPE, AUDIO_CONTENT_TYPE)
            .header(header::ACCEPT_RANGES, "bytes")
            .header(
                header::CACHE_CONTROL,
                format!("public, max-age={}", self.cache_max_age_secs),
            );

        if let Some(len) = content_length {
            if let Ok(value) = HeaderValue::from_str(&len) {
                builder = builder.header(header::CONTENT_LENGTH, value);
            }
        }
        if let Some(range) = content_range {
            if let Ok(value) = HeaderValue::from_str(&range) {
                builder = builder.header(header::CONTENT_RANGE, value);
            }
        }

        builder
            .body(body)
            .map_err(|e| RelayError::Internal(e.to_string()))
    }
}
