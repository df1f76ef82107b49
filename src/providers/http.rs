//! Shared HTTP plumbing for source adapters
//!
//! One pooled `reqwest` client, gzip enabled, with the same retry shape
//! for every source: HTTP 429 backs off with jitter and retries a bounded
//! number of times before the source is reported rate-limited. Any other
//! failure is returned immediately.

use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_ENCODING, USER_AGENT};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

use crate::models::errors::{AppError, AppResult};
use crate::utils::constants::{
    MAX_CRAWL_BYTES, RATE_LIMIT_BASE_BACKOFF_MS, RATE_LIMIT_MAX_RETRIES, RETRY_JITTER_PERCENT,
    USER_AGENT as USER_AGENT_CONST,
};

/// HTTP client shared by all adapters
#[derive(Clone)]
pub struct SourceClient {
    client: reqwest::Client,
}

impl SourceClient {
    pub fn new(timeout: Duration) -> AppResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_CONST));
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .gzip(true)
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// GET a JSON document
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        source: &str,
        url: &str,
        headers: &[(&'static str, String)],
    ) -> AppResult<T> {
        let response = self.get_with_retry(source, url, headers, "application/json").await?;
        let body = response.json::<T>().await?;
        Ok(body)
    }

    /// GET a text document, truncated to the crawl limit
    pub async fn get_text(&self, source: &str, url: &str) -> AppResult<String> {
        let response = self.get_with_retry(source, url, &[], "text/html").await?;
        let bytes = response.bytes().await?;
        let end = bytes.len().min(MAX_CRAWL_BYTES);
        Ok(String::from_utf8_lossy(&bytes[..end]).into_owned())
    }

    async fn get_with_retry(
        &self,
        source: &str,
        url: &str,
        headers: &[(&'static str, String)],
        accept: &'static str,
    ) -> AppResult<reqwest::Response> {
        for attempt in 0..=RATE_LIMIT_MAX_RETRIES {
            if attempt > 0 {
                let delay = backoff_delay(attempt);
                debug!(
                    "⏳ {} retry {}/{} after {}ms",
                    source, attempt, RATE_LIMIT_MAX_RETRIES, delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let mut request = self.client.get(url).header(ACCEPT, accept);
            for (name, value) in headers {
                request = request.header(*name, value.as_str());
            }

            let response = request.send().await?;
            match response.status() {
                StatusCode::TOO_MANY_REQUESTS => {
                    warn!(
                        "⏳ {} rate limited (HTTP 429), attempt {}/{}",
                        source,
                        attempt + 1,
                        RATE_LIMIT_MAX_RETRIES + 1
                    );
                    continue;
                }
                StatusCode::NOT_FOUND => {
                    return Err(AppError::not_found(format!("{}: no record at {}", source, url)));
                }
                status if !status.is_success() => {
                    return Err(AppError::external(format!("{} HTTP error: {}", source, status)));
                }
                _ => return Ok(response),
            }
        }

        Err(AppError::rate_limited(source))
    }
}

/// Exponential backoff with random jitter (±RETRY_JITTER_PERCENT)
fn backoff_delay(attempt: u32) -> Duration {
    let base = RATE_LIMIT_BASE_BACKOFF_MS * 2_u64.pow(attempt.saturating_sub(1));
    let jitter_range = (base * RETRY_JITTER_PERCENT / 100) as i64;
    let jitter = rand::thread_rng().gen_range(-jitter_range..=jitter_range);
    Duration::from_millis((base as i64 + jitter).max(50) as u64)
}

/// Parse a numeric field some sources send as a JSON string
pub fn parse_num(value: &Option<String>) -> Option<f64> {
    value
        .as_deref()
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Parse a "0"/"1" flag field
pub fn parse_flag(value: &Option<String>) -> Option<bool> {
    match value.as_deref().map(str::trim) {
        Some("1") => Some(true),
        Some("0") => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_grows_with_attempts() {
        let first = backoff_delay(1).as_millis();
        let second = backoff_delay(2).as_millis();
        assert!((200..=300).contains(&first), "first = {}", first);
        assert!((400..=600).contains(&second), "second = {}", second);
    }

    #[test]
    fn test_string_field_parsing() {
        assert_eq!(parse_num(&Some("0.25".into())), Some(0.25));
        assert_eq!(parse_num(&Some("".into())), None);
        assert_eq!(parse_num(&Some("NaN".into())), None);
        assert_eq!(parse_num(&None), None);

        assert_eq!(parse_flag(&Some("1".into())), Some(true));
        assert_eq!(parse_flag(&Some("0".into())), Some(false));
        assert_eq!(parse_flag(&Some("yes".into())), None);
    }
}
