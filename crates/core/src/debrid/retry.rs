//! Bounded polling with an injectable sleep.

use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

/// How often and how fast to poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of probes, including the first one.
    pub max_attempts: u32,
    /// Fixed delay between two probes.
    pub interval: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }
}

/// Result of a single probe.
#[derive(Debug)]
pub enum Poll<T> {
    Ready(T),
    Pending,
}

/// Source of delays. Production code sleeps; tests record.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Sleeper that returns immediately and remembers every requested delay.
#[derive(Debug, Clone, Default)]
pub struct RecordingSleeper {
    calls: Arc<AtomicU32>,
    delays: Arc<RwLock<Vec<Duration>>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sleeps requested so far.
    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every requested delay, in order.
    pub async fn delays(&self) -> Vec<Duration> {
        self.delays.read().await.clone()
    }

    /// Sum of all requested delays.
    pub async fn total_delay(&self) -> Duration {
        self.delays.read().await.iter().sum()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.delays.write().await.push(duration);
    }
}

/// Probe until ready or the attempts run out.
///
/// Sleeps `policy.interval` between probes, never before the first or after
/// the last one. Returns `Ok(None)` when the bound is exhausted; probe errors
/// abort immediately.
pub async fn poll_until<T, E, F, Fut>(
    policy: RetryPolicy,
    sleeper: &dyn Sleeper,
    mut probe: F,
) -> Result<Option<T>, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Poll<T>, E>>,
{
    for attempt in 1..=policy.max_attempts {
        if let Poll::Ready(value) = probe(attempt).await? {
            return Ok(Some(value));
        }
        if attempt < policy.max_attempts {
            sleeper.sleep(policy.interval).await;
        }
    }
    Ok(None)
}
