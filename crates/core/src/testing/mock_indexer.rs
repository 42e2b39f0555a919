//! Mock indexer for testing.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::indexer::{Indexer, IndexerError, TorrentRecord};
use crate::pipeline::RequestContext;

/// Mock implementation of the Indexer trait.
///
/// Returns the configured records for every request and records each
/// request context for assertions.
#[derive(Debug)]
pub struct MockIndexer {
    name: String,
    /// Configured records to return.
    records: Arc<RwLock<Vec<TorrentRecord>>>,
    /// Recorded requests.
    searches: Arc<RwLock<Vec<RequestContext>>>,
    /// If set, the next search will fail with this error.
    next_error: Arc<RwLock<Option<IndexerError>>>,
    /// Simulated response latency.
    delay: Arc<RwLock<Option<Duration>>>,
}

impl MockIndexer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            records: Arc::new(RwLock::new(Vec::new())),
            searches: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            delay: Arc::new(RwLock::new(None)),
        }
    }

    /// Add a record to every future result.
    pub async fn add_record(&self, record: TorrentRecord) {
        self.records.write().await.push(record);
    }

    /// Replace all configured records.
    pub async fn set_records(&self, records: Vec<TorrentRecord>) {
        *self.records.write().await = records;
    }

    /// Set an error to be returned by the next search.
    pub async fn set_next_error(&self, error: IndexerError) {
        *self.next_error.write().await = Some(error);
    }

    /// Delay every search by `delay`.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    /// Number of searches performed.
    pub async fn search_count(&self) -> usize {
        self.searches.read().await.len()
    }

    /// All recorded request contexts.
    pub async fn recorded_searches(&self) -> Vec<RequestContext> {
        self.searches.read().await.clone()
    }
}

#[async_trait]
impl Indexer for MockIndexer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, ctx: &RequestContext) -> Result<Vec<TorrentRecord>, IndexerError> {
        self.searches.write().await.push(ctx.clone());

        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }

        Ok(self.records.read().await.clone())
    }
}
