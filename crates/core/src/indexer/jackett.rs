//! Jackett aggregate search adapter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::JackettConfig;
use crate::pipeline::{MediaKind, RequestContext};

use super::{http_client, Indexer, IndexerError, TorrentRecord};

/// Jackett indexer implementation, searching across all configured trackers.
pub struct JackettIndexer {
    client: Client,
    config: JackettConfig,
}

impl JackettIndexer {
    /// Create a new JackettIndexer with the given configuration.
    pub fn new(config: JackettConfig, user_agent: &str, proxy: Option<&str>) -> Self {
        let client = http_client(config.timeout_secs, user_agent, proxy);

        Self { client, config }
    }

    /// Build the Jackett API URL for a search.
    fn build_search_url(&self, ctx: &RequestContext) -> String {
        format!(
            "{}/api/v2.0/indexers/all/results?apikey={}&Query={}&Category[]={}",
            self.config.url.trim_end_matches('/'),
            urlencoding::encode(&self.config.api_key),
            urlencoding::encode(&ctx.title_id),
            category_id(ctx.kind)
        )
    }
}

/// Jackett category for the requested media kind.
fn category_id(kind: MediaKind) -> i32 {
    match kind {
        MediaKind::Movie => 2000,
        MediaKind::Series => 5000,
    }
}

#[async_trait]
impl Indexer for JackettIndexer {
    fn name(&self) -> &str {
        "jackett"
    }

    async fn search(&self, ctx: &RequestContext) -> Result<Vec<TorrentRecord>, IndexerError> {
        let url = self.build_search_url(ctx);
        debug!(title_id = %ctx.title_id, "Searching Jackett");

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(IndexerError::ApiError(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let jackett_response: JackettResponse = response
            .json()
            .await
            .map_err(|e| IndexerError::ParseError(format!("Failed to parse response: {}", e)))?;

        debug!(
            results = jackett_response.Results.len(),
            "Jackett search complete"
        );

        Ok(jackett_response
            .Results
            .into_iter()
            .map(|r| {
                let mut record = TorrentRecord::new(
                    r.Title,
                    r.InfoHash.unwrap_or_default(),
                    format!("jackett/{}", r.Tracker.unwrap_or_else(|| "unknown".to_string())),
                );
                record.magnet_link = r.MagnetUri;
                record.size_bytes = r.Size.filter(|s| *s > 0).map(|s| s as u64);
                record.seeds = r.Seeders.unwrap_or(0).max(0) as u32;
                record.leeches = r
                    .Peers
                    .unwrap_or(0)
                    .saturating_sub(r.Seeders.unwrap_or(0))
                    .max(0) as u32;
                record.published_at = r.PublishDate.and_then(|d| parse_jackett_date(&d));
                record
            })
            .collect())
    }
}

/// Parse Jackett's date format.
fn parse_jackett_date(date_str: &str) -> Option<DateTime<Utc>> {
    // Jackett returns dates in ISO 8601 format
    DateTime::parse_from_rfc3339(date_str)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|| {
            // Try parsing without timezone
            chrono::NaiveDateTime::parse_from_str(date_str, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|ndt| ndt.and_utc())
        })
}

// Jackett API response types
#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct JackettResponse {
    Results: Vec<JackettResult>,
}

#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct JackettResult {
    Title: String,
    Tracker: Option<String>,
    MagnetUri: Option<String>,
    InfoHash: Option<String>,
    Size: Option<i64>,
    Seeders: Option<i32>,
    Peers: Option<i32>,
    PublishDate: Option<String>,
}
