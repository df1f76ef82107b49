//! API Middleware (Auth, Rate Limiting, Logging)

use axum::{
    extract::{ConnectInfo, Request},
    http::{HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use dashmap::DashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use super::types::{ApiError, ApiResponse};
use crate::models::config::env_flag;
use crate::utils::constants::{API_KEY_PREFIXES, API_RATE_LIMIT_REQUESTS, API_RATE_LIMIT_WINDOW_SECS};

const API_KEY_HEADER: &str = "x-api-key";

/// Fixed-window rate limit settings
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub requests_per_window: u32,
    pub window_duration: Duration,
    /// Key anonymous clients on `X-Forwarded-For` / `X-Real-IP`.
    /// Only safe behind a proxy that overwrites those headers.
    pub trust_proxy_headers: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_window: API_RATE_LIMIT_REQUESTS,
            window_duration: Duration::from_secs(API_RATE_LIMIT_WINDOW_SECS),
            trust_proxy_headers: env_flag("LARP_TRUST_PROXY"),
        }
    }
}

/// Verdict for one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_secs: u64,
}

/// In-memory fixed-window limiter keyed by API key or client address
pub struct RateLimiter {
    /// key -> (requests in window, window start)
    requests: DashMap<String, (u32, Instant)>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            requests: DashMap::new(),
            config,
        }
    }

    pub fn check(&self, key: &str) -> RateLimitDecision {
        let now = Instant::now();
        let limit = self.config.requests_per_window;

        let mut entry = self.requests.entry(key.to_string()).or_insert((0, now));
        if now.duration_since(entry.1) >= self.config.window_duration {
            *entry = (0, now);
        }

        let reset_secs = self
            .config
            .window_duration
            .saturating_sub(now.duration_since(entry.1))
            .as_secs();

        if entry.0 >= limit {
            return RateLimitDecision { allowed: false, limit, remaining: 0, reset_secs };
        }

        entry.0 += 1;
        RateLimitDecision {
            allowed: true,
            limit,
            remaining: limit - entry.0,
            reset_secs,
        }
    }

    pub fn trusts_proxy_headers(&self) -> bool {
        self.config.trust_proxy_headers
    }

    /// Forget keys idle for two windows
    pub fn cleanup(&self) -> usize {
        let now = Instant::now();
        let before = self.requests.len();
        self.requests
            .retain(|_, (_, started)| now.duration_since(*started) < self.config.window_duration * 2);
        before.saturating_sub(self.requests.len())
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

lazy_static::lazy_static! {
    pub static ref RATE_LIMITER: Arc<RateLimiter> = Arc::new(RateLimiter::default());
}

fn is_health_path(path: &str) -> bool {
    path == "/health" || path == "/v1/health"
}

fn api_key(headers: &HeaderMap) -> Option<&str> {
    headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok())
}

/// Client address as reported by a trusted proxy
fn forwarded_client(headers: &HeaderMap) -> Option<String> {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
    header("x-forwarded-for")
        .and_then(|chain| chain.split(',').next())
        .or_else(|| header("x-real-ip"))
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
}

/// Rate limit bucket for a request: the API key if any, otherwise the
/// client IP. Forwarding headers are ignored unless the proxy is trusted.
pub fn rate_limit_key(request: &Request, trust_proxy_headers: bool) -> String {
    let headers = request.headers();
    if let Some(key) = api_key(headers) {
        return format!("key:{}", key);
    }

    let forwarded = trust_proxy_headers.then(|| forwarded_client(headers)).flatten();
    let peer = || {
        request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
    };
    match forwarded.or_else(peer) {
        Some(ip) => format!("ip:{}", ip),
        None => "anonymous".to_string(),
    }
}

/// Accept keys with a known prefix, plus the shared `demo` key
pub fn validate_api_key(key: &str) -> bool {
    key == "demo" || API_KEY_PREFIXES.iter().any(|prefix| key.starts_with(prefix))
}

/// API key authentication. Anonymous requests pass (and are rate limited
/// by address); a malformed key is rejected.
pub async fn auth_middleware(headers: HeaderMap, request: Request, next: Next) -> Response {
    if is_health_path(request.uri().path()) {
        return next.run(request).await;
    }

    match api_key(&headers) {
        Some(key) if !validate_api_key(key) => {
            warn!("Invalid API key attempted");
            (
                StatusCode::UNAUTHORIZED,
                Json(ApiResponse::error(ApiError::unauthorized(), 0.0)),
            )
                .into_response()
        }
        _ => next.run(request).await,
    }
}

/// Fixed-window rate limiting with `X-RateLimit-*` headers
pub async fn rate_limit_middleware(request: Request, next: Next) -> Response {
    if is_health_path(request.uri().path()) {
        return next.run(request).await;
    }

    let rate_key = rate_limit_key(&request, RATE_LIMITER.trusts_proxy_headers());
    let decision = RATE_LIMITER.check(&rate_key);

    let mut response = if decision.allowed {
        next.run(request).await
    } else {
        warn!(key = %rate_key, "Rate limit exceeded");
        (
            StatusCode::TOO_MANY_REQUESTS,
            Json(ApiResponse::error(ApiError::rate_limited(decision.reset_secs), 0.0)),
        )
            .into_response()
    };

    let headers = response.headers_mut();
    headers.insert("X-RateLimit-Limit", HeaderValue::from(decision.limit));
    headers.insert("X-RateLimit-Remaining", HeaderValue::from(decision.remaining));
    headers.insert("X-RateLimit-Reset", HeaderValue::from(decision.reset_secs));
    if !decision.allowed {
        headers.insert("Retry-After", HeaderValue::from(decision.reset_secs));
    }

    response
}

/// Request logging middleware
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;

    info!(
        method = %method,
        uri = %uri,
        status = %response.status().as_u16(),
        latency_ms = %start.elapsed().as_millis(),
        "Request completed"
    );

    response
}
