//! Per-client request limiting.
//!
//! Each client IP gets a token bucket holding `max_requests` tokens that
//! refills over `window_secs`. A request without a token is answered with
//! 429 and a `Retry-After` hint.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};
use tracing::debug;

use rdflix_core::config::RateLimitConfig;

use crate::metrics::RATE_LIMITED_TOTAL;

/// Buckets kept before idle, full ones are evicted.
const MAX_TRACKED_CLIENTS: usize = 10_000;

/// Token bucket for one client.
#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn full(capacity: f64) -> Self {
        Self {
            tokens: capacity,
            last_refill: Instant::now(),
        }
    }

    fn refill(&mut self, capacity: f64, refill_per_sec: f64) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * refill_per_sec).min(capacity);
        self.last_refill = now;
    }
}

/// Token buckets keyed by client IP.
pub struct ClientRateLimiter {
    capacity: f64,
    refill_per_sec: f64,
    buckets: Mutex<HashMap<IpAddr, TokenBucket>>,
}

impl ClientRateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        let capacity = config.max_requests.max(1) as f64;
        let window = config.window_secs.max(1) as f64;
        Self {
            capacity,
            refill_per_sec: capacity / window,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Take a token for `client`. `Err` carries the wait until the next one.
    pub async fn check(&self, client: IpAddr) -> Result<(), Duration> {
        let mut buckets = self.buckets.lock().await;
        if buckets.len() >= MAX_TRACKED_CLIENTS && !buckets.contains_key(&client) {
            self.evict_idle(&mut buckets);
        }

        let bucket = buckets
            .entry(client)
            .or_insert_with(|| TokenBucket::full(self.capacity));
        bucket.refill(self.capacity, self.refill_per_sec);

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            Ok(())
        } else {
            let wait = (1.0 - bucket.tokens) / self.refill_per_sec;
            Err(Duration::from_secs_f64(wait))
        }
    }

    /// Number of clients currently tracked.
    pub async fn tracked_clients(&self) -> usize {
        self.buckets.lock().await.len()
    }

    /// Drop buckets that have refilled completely; they behave like new ones.
    fn evict_idle(&self, buckets: &mut HashMap<IpAddr, TokenBucket>) {
        let (capacity, rate) = (self.capacity, self.refill_per_sec);
        buckets.retain(|_, bucket| {
            bucket.refill(capacity, rate);
            bucket.tokens < capacity
        });
    }
}

/// Client address from the connection, or a shared fallback when the
/// server runs without connect info (in-process tests).
fn client_ip(request: &Request<Body>) -> IpAddr {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

/// Rejects requests from clients that used up their budget.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<ClientRateLimiter>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let client = client_ip(&request);
    match limiter.check(client).await {
        Ok(()) => next.run(request).await,
        Err(wait) => {
            RATE_LIMITED_TOTAL.inc();
            debug!(client = %client, retry_after_secs = wait.as_secs_f64(), "Rate limited");
            let retry_after = wait.as_secs().max(1).to_string();
            (
                StatusCode::TOO_MANY_REQUESTS,
                [(header::RETRY_AFTER, retry_after)],
                Json(json!({ "error": "Too many requests, please try again later." })),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_requests: u32, window_secs: u64) -> ClientRateLimiter {
        ClientRateLimiter::new(&RateLimitConfig {
            enabled: true,
            max_requests,
            window_secs,
        })
    }

    fn ip(last: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, last))
    }

    #[tokio::test(start_paused = true)]
    async fn test_budget_is_per_client() {
        let limiter = limiter(3, 900);
        for _ in 0..3 {
            assert!(limiter.check(ip(1)).await.is_ok());
        }
        assert!(limiter.check(ip(1)).await.is_err());
        assert!(limiter.check(ip(2)).await.is_ok());
        assert_eq!(limiter.tracked_clients().await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokens_refill_over_window() {
        let limiter = limiter(2, 60);
        assert!(limiter.check(ip(1)).await.is_ok());
        assert!(limiter.check(ip(1)).await.is_ok());

        let wait = limiter.check(ip(1)).await.unwrap_err();
        assert!(wait <= Duration::from_secs(30));
        assert!(wait > Duration::from_secs(29));

        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(limiter.check(ip(1)).await.is_ok());
        assert!(limiter.check(ip(1)).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_clients_are_evicted() {
        let limiter = limiter(2, 10);
        {
            let mut buckets = limiter.buckets.lock().await;
            for i in 0..MAX_TRACKED_CLIENTS {
                let addr = IpAddr::V6(std::net::Ipv6Addr::from(i as u128));
                buckets.insert(addr, TokenBucket { tokens: 0.0, last_refill: Instant::now() });
            }
        }

        tokio::time::advance(Duration::from_secs(10)).await;
        assert!(limiter.check(ip(1)).await.is_ok());
        assert_eq!(limiter.tracked_clients().await, 1);
    }
}
