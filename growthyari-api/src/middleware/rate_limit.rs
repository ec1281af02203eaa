/// Rate limiting for login endpoints
///
/// Token bucket per client IP, held in a bounded in-process cache:
/// - Tokens refill at a constant rate
/// - Each request consumes 1 token
/// - Request blocked with 429 and `Retry-After` when the bucket is empty
///
/// # Limits
///
/// 10 requests/minute per IP, burst of 10.
///
/// # Client IP
///
/// The peer address from `ConnectInfo`. `X-Forwarded-For` is only read when
/// the peer is one of the configured trusted proxies; the client is then the
/// rightmost entry that is not itself a trusted proxy.

use crate::app::AppState;
use crate::error::ApiError;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use moka::sync::Cache;
use std::{
    net::{IpAddr, SocketAddr},
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

/// Upper bound on tracked clients; least recently used buckets are evicted
const MAX_TRACKED_CLIENTS: u64 = 10_000;

/// A bucket idle this long is full again, so it can be dropped
const BUCKET_IDLE: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, Copy)]
pub struct RateLimit {
    pub requests_per_minute: u32,

    /// Tokens per second
    pub refill_rate: f64,

    /// Burst capacity
    pub bucket_capacity: u32,
}

impl RateLimit {
    pub fn per_minute(requests: u32) -> Self {
        RateLimit {
            requests_per_minute: requests,
            refill_rate: requests as f64 / 60.0,
            bucket_capacity: requests,
        }
    }

    /// Limit applied to login-type endpoints
    pub fn login() -> Self {
        Self::per_minute(10)
    }
}

#[derive(Debug, Clone)]
struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn new(capacity: u32, now: Instant) -> Self {
        TokenBucket {
            tokens: capacity as f64,
            last_refill: now,
        }
    }

    fn refill(&mut self, rate: f64, capacity: u32, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * rate).min(capacity as f64);
        self.last_refill = now;
    }

    fn try_consume(&mut self, count: f64) -> bool {
        if self.tokens >= count {
            self.tokens -= count;
            true
        } else {
            false
        }
    }

    fn seconds_until_available(&self, count: f64, rate: f64) -> u64 {
        let deficit = count - self.tokens;
        if deficit <= 0.0 {
            0
        } else {
            (deficit / rate).ceil() as u64
        }
    }
}

/// In-memory rate limiter keyed by client
pub struct RateLimiter {
    limit: RateLimit,
    trusted_proxies: Vec<IpAddr>,
    buckets: Cache<String, Arc<Mutex<TokenBucket>>>,
}

impl RateLimiter {
    pub fn new(limit: RateLimit, trusted_proxies: Vec<IpAddr>) -> Self {
        Self {
            limit,
            trusted_proxies,
            buckets: Cache::builder()
                .max_capacity(MAX_TRACKED_CLIENTS)
                .time_to_idle(BUCKET_IDLE)
                .build(),
        }
    }

    pub fn limit(&self) -> RateLimit {
        self.limit
    }

    /// Bucket key for a request
    pub fn client_key(&self, headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
        client_key(headers, peer, &self.trusted_proxies)
    }

    /// Consumes a token for `key`
    ///
    /// Returns `Err(retry_after_seconds)` when the bucket is empty.
    pub fn check(&self, key: &str, now: Instant) -> Result<(), u64> {
        let limit = self.limit;
        let bucket = self.buckets.get_with(key.to_string(), || {
            Arc::new(Mutex::new(TokenBucket::new(limit.bucket_capacity, now)))
        });
        let mut bucket = bucket.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        bucket.refill(limit.refill_rate, limit.bucket_capacity, now);
        if bucket.try_consume(1.0) {
            Ok(())
        } else {
            Err(bucket.seconds_until_available(1.0, limit.refill_rate).max(1))
        }
    }
}

/// Client identifier used as the bucket key
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>, trusted_proxies: &[IpAddr]) -> String {
    let Some(peer) = peer.map(|addr| addr.ip()) else {
        return "unknown".to_string();
    };

    if !trusted_proxies.contains(&peer) {
        return peer.to_string();
    }

    let forwarded = headers
        .get_all("X-Forwarded-For")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .collect::<Vec<_>>();

    for entry in forwarded.into_iter().rev() {
        match entry.parse::<IpAddr>() {
            Ok(ip) if trusted_proxies.contains(&ip) => continue,
            Ok(ip) => return ip.to_string(),
            Err(_) => break,
        }
    }

    peer.to_string()
}

/// Middleware applying the login limit per client IP
///
/// # Errors
///
/// - 429 Too Many Requests: limit exceeded
pub async fn login_rate_limit_layer(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let key = state.login_limiter.client_key(request.headers(), peer);

    if let Err(retry_after) = state.login_limiter.check(&key, Instant::now()) {
        tracing::warn!(client = %key, retry_after, "Login rate limit exceeded");
        return Err(ApiError::RateLimitExceeded {
            retry_after,
            message: format!(
                "Too many attempts. Try again in {} seconds",
                retry_after
            ),
        });
    }

    Ok(next.run(request).await)
}
