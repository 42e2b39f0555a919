//! Torrentio stream addon adapter.
//!
//! Torrentio answers the same stream route this service exposes, with one
//! entry per torrent. The release name, seeders, size and origin are packed
//! into the multi-line `title`:
//!
//! ```text
//! Show.S01E02.1080p.WEB-DL.x264-GRP
//! 👤 52 💾 1.4 GB ⚙️ ThePirateBay
//! ```

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::TorrentioConfig;
use crate::pipeline::RequestContext;

use super::parse::parse_size;
use super::{http_client, Indexer, IndexerError, TorrentRecord};

static SEEDS: Lazy<Regex> = Lazy::new(|| Regex::new(r"👤\s*(\d+)").unwrap());
static SIZE: Lazy<Regex> = Lazy::new(|| Regex::new(r"💾\s*([\d.,]+\s*[a-zA-Z]+)").unwrap());
static ORIGIN: Lazy<Regex> = Lazy::new(|| Regex::new(r"⚙\S*\s*(\S+)").unwrap());

/// Torrentio indexer implementation.
pub struct TorrentioIndexer {
    client: Client,
    config: TorrentioConfig,
}

impl TorrentioIndexer {
    pub fn new(config: TorrentioConfig, user_agent: &str, proxy: Option<&str>) -> Self {
        let client = http_client(config.timeout_secs, user_agent, proxy);

        Self { client, config }
    }

    fn stream_url(&self, ctx: &RequestContext) -> String {
        format!(
            "{}/stream/{}/{}.json",
            self.config.url.trim_end_matches('/'),
            ctx.kind.as_str(),
            ctx.stremio_id()
        )
    }
}

#[derive(Debug, Deserialize)]
struct TorrentioResponse {
    #[serde(default)]
    streams: Vec<TorrentioStream>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TorrentioStream {
    #[serde(default)]
    title: String,
    info_hash: Option<String>,
    #[serde(default)]
    behavior_hints: Option<TorrentioHints>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TorrentioHints {
    filename: Option<String>,
}

/// Map one Torrentio stream entry to a record. Entries without a hash are skipped.
fn to_record(stream: TorrentioStream) -> Option<TorrentRecord> {
    let info_hash = stream.info_hash?;
    let name = stream
        .title
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .or_else(|| stream.behavior_hints.and_then(|h| h.filename))?;

    let seeds = SEEDS
        .captures(&stream.title)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0);
    let size_bytes = SIZE
        .captures(&stream.title)
        .and_then(|c| c.get(1))
        .and_then(|m| parse_size(m.as_str()));
    let origin = ORIGIN
        .captures(&stream.title)
        .and_then(|c| c.get(1))
        .map(|m| format!("torrentio/{}", m.as_str()))
        .unwrap_or_else(|| "torrentio".to_string());

    let mut record = TorrentRecord::new(name, info_hash, origin);
    record.seeds = seeds;
    record.size_bytes = size_bytes;
    Some(record)
}

#[async_trait]
impl Indexer for TorrentioIndexer {
    fn name(&self) -> &str {
        "torrentio"
    }

    async fn search(&self, ctx: &RequestContext) -> Result<Vec<TorrentRecord>, IndexerError> {
        let url = self.stream_url(ctx);
        debug!(url = %url, "Querying Torrentio");

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

        let body: TorrentioResponse = response
            .json()
            .await
            .map_err(|e| IndexerError::ParseError(e.to_string()))?;

        let records: Vec<TorrentRecord> = body.streams.into_iter().filter_map(to_record).collect();
        debug!(results = records.len(), "Torrentio search complete");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Vec<TorrentRecord> {
        let body: TorrentioResponse = serde_json::from_str(json).unwrap();
        body.streams.into_iter().filter_map(to_record).collect()
    }

    #[test]
    fn test_parse_streams() {
        let json = r#"{"streams": [
            {
                "name": "Torrentio\n1080p",
                "title": "Show.S01E02.1080p.WEB-DL.x264-GRP\n👤 52 💾 1.4 GB ⚙️ ThePirateBay",
                "infoHash": "0123456789ABCDEF0123456789ABCDEF01234567",
                "fileIdx": 0,
                "behaviorHints": {"bingeGroup": "torrentio|1080p", "filename": "Show.S01E02.mkv"}
            },
            {
                "name": "Torrentio\n720p",
                "title": "Show.S01.720p.HDTV\nShow.S01E02.720p.HDTV.mkv\n👤 3 ⚙️ 1337x"
            }
        ]}"#;
        let records = parse(json);
        assert_eq!(records.len(), 1);

        let record = &records[0];
        assert_eq!(record.name, "Show.S01E02.1080p.WEB-DL.x264-GRP");
        assert_eq!(record.info_hash, "0123456789abcdef0123456789abcdef01234567");
        assert_eq!(record.seeds, 52);
        assert_eq!(record.size_bytes, Some((1.4 * 1024f64.powi(3)).round() as u64));
        assert_eq!(record.source, "torrentio/ThePirateBay");
    }

    #[test]
    fn test_missing_stats_default() {
        let json = r#"{"streams": [
            {"title": "Movie.2020.2160p", "infoHash": "0123456789abcdef0123456789abcdef01234567"}
        ]}"#;
        let records = parse(json);
        assert_eq!(records[0].seeds, 0);
        assert_eq!(records[0].size_bytes, None);
        assert_eq!(records[0].source, "torrentio");
    }

    #[test]
    fn test_empty_title_falls_back_to_filename() {
        let json = r#"{"streams": [
            {"title": "", "infoHash": "0123456789abcdef0123456789abcdef01234567",
             "behaviorHints": {"filename": "Movie.mkv"}}
        ]}"#;
        assert_eq!(parse(json)[0].name, "Movie.mkv");
    }

    #[test]
    fn test_empty_response() {
        assert!(parse("{}").is_empty());
    }

    #[test]
    fn test_stream_url() {
        let indexer = TorrentioIndexer::new(
            TorrentioConfig {
                url: "https://torrentio.example/".to_string(),
                ..Default::default()
            },
            "test-agent",
            None,
        );
        assert_eq!(
            indexer.stream_url(&RequestContext::episode("tt0903747", 2, 5)),
            "https://torrentio.example/stream/series/tt0903747:2:5.json"
        );
        assert_eq!(
            indexer.stream_url(&RequestContext::movie("tt0111161")),
            "https://torrentio.example/stream/movie/tt0111161.json"
        );
    }
}
