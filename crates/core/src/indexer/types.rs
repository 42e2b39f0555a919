//! Types for torrent indexer adapters.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pipeline::RequestContext;

use super::parse::{info_hash_from_magnet, is_valid_info_hash};

/// A candidate release as reported by an indexer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TorrentRecord {
    /// Release title as published.
    pub name: String,
    /// Size in bytes. `None` when the indexer's size was missing or unparseable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    pub seeds: u32,
    pub leeches: u32,
    /// Info hash (lowercase hex). Empty string if unknown.
    #[serde(default)]
    pub info_hash: String,
    /// Magnet URI, if the indexer provided one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magnet_link: Option<String>,
    /// Which indexer returned this record.
    pub source: String,
    /// When the torrent was published.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

impl TorrentRecord {
    /// Create a record with only the fields every indexer knows.
    pub fn new(name: impl Into<String>, info_hash: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size_bytes: None,
            seeds: 0,
            leeches: 0,
            info_hash: info_hash.into().to_lowercase(),
            magnet_link: None,
            source: source.into(),
            published_at: None,
        }
    }

    /// Canonical info hash: the explicit hash, else the one in the magnet.
    ///
    /// Returns `None` unless the result is a 40-hex-character hash.
    pub fn resolved_info_hash(&self) -> Option<String> {
        let explicit = self.info_hash.trim().to_lowercase();
        if is_valid_info_hash(&explicit) {
            return Some(explicit);
        }
        self.magnet_link
            .as_deref()
            .and_then(info_hash_from_magnet)
            .filter(|h| is_valid_info_hash(h))
    }

    /// Magnet URI to submit to the debrid backend.
    ///
    /// Uses the indexer's magnet when present, otherwise synthesizes one from
    /// the info hash and name.
    pub fn magnet_uri(&self) -> String {
        if let Some(magnet) = self.magnet_link.as_deref().filter(|m| m.starts_with("magnet:")) {
            return magnet.to_string();
        }
        format!(
            "magnet:?xt=urn:btih:{}&dn={}",
            self.info_hash,
            urlencoding::encode(&self.name)
        )
    }

    /// Size in GiB, if known.
    pub fn size_gb(&self) -> Option<f64> {
        self.size_bytes.map(|b| b as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

/// Errors that can occur while querying an indexer.
#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("Indexer connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Indexer API error: {0}")]
    ApiError(String),

    #[error("Failed to parse indexer response: {0}")]
    ParseError(String),

    #[error("Request timeout")]
    Timeout,
}

impl From<reqwest::Error> for IndexerError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            IndexerError::Timeout
        } else if e.is_connect() {
            IndexerError::ConnectionFailed(e.to_string())
        } else if e.is_decode() {
            IndexerError::ParseError(e.to_string())
        } else {
            IndexerError::ApiError(e.to_string())
        }
    }
}

/// A source of candidate torrents for a title.
#[async_trait]
pub trait Indexer: Send + Sync {
    /// Indexer name for logging and metrics.
    fn name(&self) -> &str;

    /// Candidate torrents for the requested title.
    async fn search(&self, ctx: &RequestContext) -> Result<Vec<TorrentRecord>, IndexerError>;
}
