//! Request-level entry point: caching, gathering and the pipeline.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::cache::{Cache, MemoryCache};
use crate::config::Config;
use crate::debrid::DebridResolver;
use crate::indexer::{gather, Indexer, TorrentRecord};
use crate::metrics;
use crate::pipeline::{RequestContext, StreamDescriptor, StreamPipeline};

/// Serves stream requests.
///
/// Every failure degrades to an empty list; callers never see an error.
pub struct StreamService {
    config: Arc<Config>,
    indexers: Vec<Arc<dyn Indexer>>,
    pipeline: StreamPipeline,
    pools: Arc<dyn Cache<Vec<TorrentRecord>>>,
    streams: Arc<dyn Cache<Vec<StreamDescriptor>>>,
    warned_unconfigured: AtomicBool,
}

impl StreamService {
    /// Create a service with in-memory caches.
    pub fn new(
        config: Arc<Config>,
        indexers: Vec<Arc<dyn Indexer>>,
        resolver: DebridResolver,
    ) -> Self {
        Self::with_caches(
            config,
            indexers,
            resolver,
            Arc::new(MemoryCache::new()),
            Arc::new(MemoryCache::new()),
        )
    }

    /// Create a service with explicit pool and stream caches.
    pub fn with_caches(
        config: Arc<Config>,
        indexers: Vec<Arc<dyn Indexer>>,
        resolver: DebridResolver,
        pools: Arc<dyn Cache<Vec<TorrentRecord>>>,
        streams: Arc<dyn Cache<Vec<StreamDescriptor>>>,
    ) -> Self {
        let pipeline = StreamPipeline::new(resolver, config.clone());
        Self {
            config,
            indexers,
            pipeline,
            pools,
            streams,
            warned_unconfigured: AtomicBool::new(false),
        }
    }

    /// Names of the configured indexers.
    pub fn indexer_names(&self) -> Vec<String> {
        self.indexers.iter().map(|i| i.name().to_string()).collect()
    }

    /// Playable streams for `ctx`, best first.
    pub async fn streams_for(&self, ctx: &RequestContext) -> Vec<StreamDescriptor> {
        if !self.config.debrid.is_configured() {
            if !self.warned_unconfigured.swap(true, Ordering::Relaxed) {
                warn!("Debrid API key is not configured; stream requests return nothing");
            }
            metrics::STREAM_REQUESTS
                .with_label_values(&["unconfigured"])
                .inc();
            return Vec::new();
        }

        let key = ctx.cache_key();
        if self.config.cache.enabled {
            if let Some(cached) = self.streams.get(&key).await {
                debug!(key = %key, streams = cached.len(), "Stream cache hit");
                metrics::STREAM_REQUESTS.with_label_values(&["cached"]).inc();
                return cached;
            }
        }

        let started = Instant::now();
        let limit = Duration::from_secs(self.config.pipeline.request_timeout_secs);
        let result = tokio::time::timeout(limit, self.run(ctx)).await;
        metrics::PIPELINE_DURATION
            .with_label_values(&[ctx.kind.as_str()])
            .observe(started.elapsed().as_secs_f64());

        let streams = match result {
            Ok(streams) => streams,
            Err(_) => {
                warn!(
                    title_id = %ctx.title_id,
                    timeout_secs = limit.as_secs(),
                    "Stream request timed out"
                );
                metrics::STREAM_REQUESTS.with_label_values(&["timeout"]).inc();
                return Vec::new();
            }
        };

        if streams.is_empty() {
            metrics::STREAM_REQUESTS.with_label_values(&["empty"]).inc();
            info!(title_id = %ctx.title_id, "No playable streams");
        } else {
            metrics::STREAM_REQUESTS.with_label_values(&["streams"]).inc();
            if self.config.cache.enabled {
                let ttl = Duration::from_secs(self.config.cache.stream_ttl_secs);
                self.streams.set(&key, streams.clone(), ttl).await;
            }
        }

        streams
    }

    async fn run(&self, ctx: &RequestContext) -> Vec<StreamDescriptor> {
        let pool = self.pool_for(ctx).await;
        if pool.is_empty() {
            return Vec::new();
        }
        self.pipeline.produce_streams(&pool, ctx).await
    }

    /// Raw torrent pool, from cache or the indexers.
    async fn pool_for(&self, ctx: &RequestContext) -> Vec<TorrentRecord> {
        let key = ctx.cache_key();
        if self.config.cache.enabled {
            if let Some(pool) = self.pools.get(&key).await {
                debug!(key = %key, records = pool.len(), "Pool cache hit");
                return pool;
            }
        }

        let pool = gather(&self.indexers, ctx).await;
        debug!(title_id = %ctx.title_id, records = pool.len(), "Gathered torrent pool");

        if self.config.cache.enabled && !pool.is_empty() {
            let ttl = Duration::from_secs(self.config.cache.pool_ttl_secs);
            self.pools.set(&key, pool.clone(), ttl).await;
        }
        pool
    }
}
