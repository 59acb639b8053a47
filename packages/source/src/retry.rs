//! HTTP retry helpers for transient errors.
//!
//! Dataset fetchers should use [`send_json`] instead of calling
//! `reqwest::RequestBuilder::send()` directly, so every request gets
//! automatic retry with exponential backoff for transient failures
//! (timeouts, connection resets, server errors, rate limiting).
//!
//! # Usage
//!
//! ```ignore
//! use crate::retry;
//!
//! let body = retry::send_json(|| client.get(&url).query(&params)).await?;
//! ```

use std::time::Duration;

use crate::SourceError;

/// Maximum number of retry attempts for transient HTTP errors.
///
/// With exponential backoff (2s, 4s, 8s) the total wait before giving up is
/// 14 seconds. The public data portal is usually either up or down for
/// minutes at a time, so longer backoff only delays the "no data" message.
const MAX_RETRIES: u32 = 3;

/// Maximum number of full re-fetch attempts when the response body cannot
/// be decoded (truncated JSON, garbled response, etc.).
const MAX_BODY_RETRIES: u32 = 2;

/// Maximum length of the response body preview included in error logs.
const BODY_PREVIEW_LEN: usize = 500;

/// Sends an HTTP request and parses the response body as JSON.
///
/// The `build_request` closure is called on each attempt to construct a
/// fresh [`reqwest::RequestBuilder`] (builders are consumed by `.send()`).
///
/// # Retry behaviour
///
/// 1. **Connection-level** ([`send_inner`]): retries up to [`MAX_RETRIES`]
///    times on connection errors, timeouts, HTTP 429, and HTTP 5xx.
/// 2. **Body-decode**: if the body cannot be parsed as JSON, the entire
///    request is re-fetched up to [`MAX_BODY_RETRIES`] times.
///
/// HTTP 4xx (except 429) is permanent and fails immediately.
///
/// # Errors
///
/// Returns [`SourceError::Unavailable`] for non-success statuses,
/// [`SourceError::Http`] for transport failures, and [`SourceError::Json`]
/// if the body is still not valid JSON after all body-decode retries.
#[allow(clippy::future_not_send)]
pub async fn send_json<F>(build_request: F) -> Result<serde_json::Value, SourceError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let mut body_attempt = 0;
    loop {
        let response = send_inner(&build_request, MAX_RETRIES).await?;
        let url = redacted_url(response.url());
        let status = response.status();

        let text = match response.text().await {
            Ok(text) => text,
            Err(e) if body_attempt < MAX_BODY_RETRIES => {
                body_attempt += 1;
                log::warn!(
                    "Response body read failed (body retry {body_attempt}/{MAX_BODY_RETRIES}) \
                     from {url}: {e}"
                );
                tokio::time::sleep(backoff(body_attempt)).await;
                continue;
            }
            Err(e) => return Err(SourceError::Http(e)),
        };

        match serde_json::from_str(&text) {
            Ok(value) => return Ok(value),
            Err(e) if body_attempt < MAX_BODY_RETRIES => {
                body_attempt += 1;
                log::warn!(
                    "JSON parse failed (body retry {body_attempt}/{MAX_BODY_RETRIES})\n  \
                     url: {url}\n  \
                     status: {status}\n  \
                     received: {} bytes\n  \
                     parse error: {e}\n  \
                     body preview: {}",
                    text.len(),
                    preview(&text),
                );
                tokio::time::sleep(backoff(body_attempt)).await;
            }
            Err(e) => {
                log::error!(
                    "JSON parse failed after {MAX_BODY_RETRIES} retries, giving up.\n  \
                     url: {url}\n  \
                     body preview: {}",
                    preview(&text),
                );
                return Err(SourceError::Json(e));
            }
        }
    }
}

/// Core retry loop. Returns the first 2xx/3xx response.
#[allow(clippy::future_not_send)]
async fn send_inner<F>(build_request: &F, max_retries: u32) -> Result<reqwest::Response, SourceError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let mut attempt = 0;
    loop {
        if attempt > 0 {
            let delay = backoff(attempt);
            log::warn!("  retry {attempt}/{max_retries} in {delay:?}...");
            tokio::time::sleep(delay).await;
        }

        match build_request().send().await {
            Err(e) if is_transient(&e) && attempt < max_retries => {
                log::warn!("  transient error: {e}");
            }
            Err(e) => return Err(SourceError::Http(e)),
            Ok(response) => {
                let status = response.status();
                let retryable =
                    status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error();

                if retryable && attempt < max_retries {
                    log::warn!("  HTTP {status} from {}", redacted_url(response.url()));
                } else if status.is_client_error() || status.is_server_error() {
                    return Err(SourceError::Unavailable {
                        status: status.as_u16(),
                        url: redacted_url(response.url()),
                    });
                } else {
                    return Ok(response);
                }
            }
        }

        attempt += 1;
    }
}

/// 2s, 4s, 8s, ...
fn backoff(attempt: u32) -> Duration {
    Duration::from_secs(1u64 << attempt.min(6))
}

/// Drops the query string so API keys never reach logs or error messages.
fn redacted_url(url: &reqwest::Url) -> String {
    let mut url = url.clone();
    url.set_query(None);
    url.to_string()
}

fn preview(text: &str) -> &str {
    if text.len() <= BODY_PREVIEW_LEN {
        return text;
    }
    let mut end = BODY_PREVIEW_LEN;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Returns `true` if the error is likely transient and worth retrying.
fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_body() || e.is_decode() || e.is_request()
}
