//! Torrent indexer adapters.
//!
//! This module provides an `Indexer` trait for fetching candidate torrents for
//! a title, the concrete Torrentio and Jackett adapters, and `gather`, which
//! queries every adapter concurrently and merges the results.

mod dedup;
mod jackett;
mod parse;
mod torrentio;
mod types;

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Proxy};
use tracing::{debug, warn};

use crate::config::IndexersConfig;
use crate::metrics;
use crate::pipeline::RequestContext;

pub use dedup::dedup_records;
pub use jackett::JackettIndexer;
pub use parse::{info_hash_from_magnet, is_valid_info_hash, parse_size};
pub use torrentio::TorrentioIndexer;
pub use types::*;

/// HTTP client for indexer traffic, routed through `proxy` when set.
///
/// An unusable proxy is logged and skipped; configuration validation
/// rejects those before startup.
pub(crate) fn http_client(timeout_secs: u32, user_agent: &str, proxy: Option<&str>) -> Client {
    let mut builder = Client::builder()
        .timeout(Duration::from_secs(timeout_secs as u64))
        .user_agent(user_agent);
    if let Some(url) = proxy {
        match Proxy::all(url) {
            Ok(proxy) => builder = builder.proxy(proxy),
            Err(e) => warn!(error = %e, "Ignoring invalid indexer proxy"),
        }
    }
    builder.build().expect("Failed to create HTTP client")
}

/// Build the indexers enabled in configuration.
pub fn build_indexers(config: &IndexersConfig) -> Vec<Arc<dyn Indexer>> {
    let proxy = config.proxy_url();
    if proxy.is_some() {
        debug!("Routing indexer traffic through proxy");
    }

    let mut indexers: Vec<Arc<dyn Indexer>> = Vec::new();
    if let Some(torrentio) = config.torrentio.as_ref().filter(|t| t.enabled) {
        indexers.push(Arc::new(TorrentioIndexer::new(
            torrentio.clone(),
            &config.user_agent,
            proxy,
        )));
    }
    if let Some(jackett) = &config.jackett {
        indexers.push(Arc::new(JackettIndexer::new(
            jackett.clone(),
            &config.user_agent,
            proxy,
        )));
    }
    indexers
}

/// Query all indexers concurrently and merge their records.
///
/// A failing indexer contributes nothing; the error is logged and never
/// propagated.
pub async fn gather(indexers: &[Arc<dyn Indexer>], ctx: &RequestContext) -> Vec<TorrentRecord> {
    let searches = indexers.iter().map(|indexer| async move {
        let result = indexer.search(ctx).await;
        (indexer.name().to_string(), result)
    });

    let results = futures::future::join_all(searches).await;

    let mut all: Vec<TorrentRecord> = Vec::new();
    for (name, result) in results {
        match result {
            Ok(mut records) => {
                metrics::INDEXER_RESULTS
                    .with_label_values(&[name.as_str(), "success"])
                    .inc_by(records.len() as u64);
                debug!(indexer = %name, results = records.len(), "Indexer returned records");
                all.append(&mut records);
            }
            Err(e) => {
                metrics::INDEXER_RESULTS
                    .with_label_values(&[name.as_str(), "error"])
                    .inc();
                warn!(indexer = %name, title_id = %ctx.title_id, error = %e, "Indexer search failed");
            }
        }
    }

    dedup_records(all)
}
