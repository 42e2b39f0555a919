//! Real-Debrid REST client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::config::DebridConfig;

use super::{AddedMagnet, DebridClient, DebridError, DebridStatus, DebridTorrent, FileEntry, UnrestrictedLink};

/// Real-Debrid client implementation.
pub struct RealDebridClient {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct RdTorrentInfo {
    id: String,
    status: DebridStatus,
    #[serde(default)]
    files: Vec<RdFile>,
    #[serde(default)]
    links: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RdFile {
    id: u64,
    path: String,
    #[serde(default)]
    bytes: u64,
    #[serde(default)]
    selected: u8,
}

#[derive(Debug, Deserialize)]
struct RdErrorBody {
    error: Option<String>,
}

impl From<RdTorrentInfo> for DebridTorrent {
    fn from(info: RdTorrentInfo) -> Self {
        DebridTorrent {
            id: info.id,
            status: info.status,
            files: info
                .files
                .into_iter()
                .map(|f| FileEntry {
                    id: f.id,
                    path: f.path,
                    size_bytes: f.bytes,
                    selected: f.selected == 1,
                    url: None,
                })
                .collect(),
            links: info.links,
        }
    }
}

impl RealDebridClient {
    /// Create a new Real-Debrid client.
    pub fn new(config: &DebridConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Send an authenticated request and map transport and HTTP failures.
    async fn send(&self, request: RequestBuilder) -> Result<Response, DebridError> {
        let response = request
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DebridError::Timeout
                } else if e.is_connect() {
                    DebridError::ConnectionFailed(e.to_string())
                } else {
                    DebridError::ApiError(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<RdErrorBody>(&body)
            .ok()
            .and_then(|b| b.error)
            .unwrap_or_else(|| body.chars().take(200).collect());

        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                DebridError::AuthenticationFailed(message)
            }
            StatusCode::NOT_FOUND => DebridError::NotFound(message),
            StatusCode::TOO_MANY_REQUESTS => DebridError::RateLimited,
            _ => DebridError::ApiError(format!("HTTP {}: {}", status, message)),
        })
    }

    async fn parse_json<T: for<'de> Deserialize<'de>>(response: Response) -> Result<T, DebridError> {
        response
            .json::<T>()
            .await
            .map_err(|e| DebridError::ApiError(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl DebridClient for RealDebridClient {
    fn name(&self) -> &str {
        "realdebrid"
    }

    async fn add_magnet(&self, magnet: &str) -> Result<AddedMagnet, DebridError> {
        let request = self
            .client
            .post(self.url("/torrents/addMagnet"))
            .form(&[("magnet", magnet)]);
        let response = self.send(request).await?;
        let added: AddedMagnet = Self::parse_json(response).await?;
        debug!(job_id = %added.id, "Magnet submitted");
        Ok(added)
    }

    async fn torrent_info(&self, id: &str) -> Result<DebridTorrent, DebridError> {
        let request = self.client.get(self.url(&format!("/torrents/info/{}", id)));
        let response = self.send(request).await?;
        let info: RdTorrentInfo = Self::parse_json(response).await?;
        Ok(info.into())
    }

    async fn select_files(&self, id: &str, file_ids: &[u64]) -> Result<(), DebridError> {
        let files = file_ids
            .iter()
            .map(|f| f.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let request = self
            .client
            .post(self.url(&format!("/torrents/selectFiles/{}", id)))
            .form(&[("files", files.as_str())]);
        self.send(request).await?;
        Ok(())
    }

    async fn unrestrict_link(&self, link: &str) -> Result<UnrestrictedLink, DebridError> {
        let request = self
            .client
            .post(self.url("/unrestrict/link"))
            .form(&[("link", link)]);
        let response = self.send(request).await?;
        Self::parse_json(response).await
    }

    async fn delete_torrent(&self, id: &str) -> Result<(), DebridError> {
        let request = self
            .client
            .delete(self.url(&format!("/torrents/delete/{}", id)));
        self.send(request).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_torrent_info_mapping() {
        let json = r#"{
            "id": "ABC123",
            "filename": "Show.S01.1080p",
            "hash": "0123456789abcdef0123456789abcdef01234567",
            "bytes": 3000,
            "status": "downloaded",
            "files": [
                {"id": 1, "path": "/Show.S01E01.mkv", "bytes": 1000, "selected": 1},
                {"id": 2, "path": "/Show.S01E02.mkv", "bytes": 2000, "selected": 0}
            ],
            "links": ["https://real-debrid.com/d/AAA"]
        }"#;
        let info: RdTorrentInfo = serde_json::from_str(json).unwrap();
        let torrent: DebridTorrent = info.into();

        assert_eq!(torrent.id, "ABC123");
        assert_eq!(torrent.status, DebridStatus::Downloaded);
        assert_eq!(torrent.files.len(), 2);
        assert!(torrent.files[0].selected);
        assert!(!torrent.files[1].selected);
        assert_eq!(torrent.files[1].size_bytes, 2000);
        assert_eq!(torrent.link_for_file(1), Some("https://real-debrid.com/d/AAA"));
    }

    #[test]
    fn test_torrent_info_without_files() {
        let json = r#"{"id": "X", "status": "magnet_conversion"}"#;
        let info: RdTorrentInfo = serde_json::from_str(json).unwrap();
        let torrent: DebridTorrent = info.into();
        assert!(torrent.files.is_empty());
        assert!(!torrent.files_ready());
    }

    #[test]
    fn test_added_magnet_without_id() {
        let added: AddedMagnet = serde_json::from_str(r#"{"uri": "x"}"#).unwrap();
        assert!(added.id.is_empty());
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let config = DebridConfig {
            base_url: "https://api.example.com/rest/1.0/".to_string(),
            ..Default::default()
        };
        let client = RealDebridClient::new(&config);
        assert_eq!(
            client.url("/torrents/info/X"),
            "https://api.example.com/rest/1.0/torrents/info/X"
        );
        assert_eq!(client.name(), "realdebrid");
    }

    #[tokio::test]
    async fn test_connection_refused_maps_to_error() {
        let config = DebridConfig {
            api_key: "token".to_string(),
            base_url: "http://127.0.0.1:1".to_string(),
            timeout_secs: 2,
            ..Default::default()
        };
        let client = RealDebridClient::new(&config);
        let result = client.torrent_info("X").await;
        assert!(matches!(
            result,
            Err(DebridError::ConnectionFailed(_)) | Err(DebridError::ApiError(_)) | Err(DebridError::Timeout)
        ));
    }
}
