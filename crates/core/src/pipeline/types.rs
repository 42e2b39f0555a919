use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::debrid::FileEntry;
use crate::indexer::TorrentRecord;
use crate::quality;
use crate::selector::basename;

/// Kind of media requested by the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Series,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Series => "series",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movie" => Ok(MediaKind::Movie),
            "series" => Ok(MediaKind::Series),
            other => Err(RequestError::UnknownType(other.to_string())),
        }
    }
}

/// Malformed stream request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("Unknown media type: {0}")]
    UnknownType(String),

    #[error("Invalid title id: {0}")]
    InvalidId(String),
}

/// What the player asked for. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestContext {
    pub kind: MediaKind,
    /// Opaque external identifier (e.g. `tt0903747`).
    pub title_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode: Option<u32>,
}

impl RequestContext {
    pub fn movie(title_id: impl Into<String>) -> Self {
        Self {
            kind: MediaKind::Movie,
            title_id: title_id.into(),
            season: None,
            episode: None,
        }
    }

    /// A series request without a specific episode.
    pub fn series(title_id: impl Into<String>) -> Self {
        Self {
            kind: MediaKind::Series,
            title_id: title_id.into(),
            season: None,
            episode: None,
        }
    }

    pub fn episode(title_id: impl Into<String>, season: u32, episode: u32) -> Self {
        Self {
            kind: MediaKind::Series,
            title_id: title_id.into(),
            season: Some(season),
            episode: Some(episode),
        }
    }

    /// Parse the player's route parameters.
    ///
    /// `id` is `tt123` or, for series episodes, `tt123:season:episode` with
    /// positive season and episode numbers.
    pub fn from_stremio(kind: &str, id: &str) -> Result<Self, RequestError> {
        let kind: MediaKind = kind.parse()?;
        let invalid = || RequestError::InvalidId(id.to_string());

        let parts: Vec<&str> = id.split(':').collect();
        let title_id = parts[0].trim();
        if title_id.is_empty() {
            return Err(invalid());
        }

        match (kind, parts.as_slice()) {
            (_, [_]) => Ok(Self {
                kind,
                title_id: title_id.to_string(),
                season: None,
                episode: None,
            }),
            (MediaKind::Series, [_, season, episode]) => {
                let season: u32 = season.parse().map_err(|_| invalid())?;
                let episode: u32 = episode.parse().map_err(|_| invalid())?;
                if season == 0 || episode == 0 {
                    return Err(invalid());
                }
                Ok(Self::episode(title_id, season, episode))
            }
            _ => Err(invalid()),
        }
    }

    /// Season and episode, when both are known.
    pub fn target(&self) -> Option<(u32, u32)> {
        match (self.season, self.episode) {
            (Some(s), Some(e)) => Some((s, e)),
            _ => None,
        }
    }

    /// Id in the player's notation (`tt123` or `tt123:1:2`).
    pub fn stremio_id(&self) -> String {
        match self.target() {
            Some((s, e)) => format!("{}:{}:{}", self.title_id, s, e),
            None => self.title_id.clone(),
        }
    }

    /// Cache key for results of this request.
    pub fn cache_key(&self) -> String {
        format!("{}:{}", self.kind, self.stremio_id())
    }
}

/// A resolved, playable stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamDescriptor {
    /// Short label (service + resolution).
    pub name: String,
    /// Human-readable summary: release, file, size, seeders.
    pub title: String,
    /// Direct playable link. Never empty.
    pub url: String,
    /// Player-side grouping hint for binge continuity.
    pub binge_group: String,
    pub quality_score: i32,
    pub size_bytes: u64,
    pub info_hash: String,
    /// Name of the selected file.
    pub file_name: String,
    /// Sibling files with their links (season packs only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_list: Option<Vec<FileEntry>>,
}

impl StreamDescriptor {
    /// Build a descriptor for `file` of `record`, resolved to `url`.
    pub fn from_resolution(
        record: &TorrentRecord,
        file: &FileEntry,
        url: String,
        file_list: Option<Vec<FileEntry>>,
    ) -> Self {
        let resolution = quality::resolution_label(&record.name).unwrap_or("SD");
        let source = quality::source_label(&record.name).unwrap_or("Unknown");
        let file_name = basename(&file.path).to_string();

        let mut title = record.name.clone();
        if file_name != record.name {
            title.push_str(&format!("\n📄 {}", file_name));
        }
        title.push_str(&format!(
            "\n💾 {} 👤 {} ⚙️ {}",
            format_size(file.size_bytes),
            record.seeds,
            record.source
        ));

        Self {
            name: format!("[RD] {}", resolution),
            title,
            url,
            binge_group: format!("rdflix|{}|{}", resolution, source),
            quality_score: quality::score(&record.name),
            size_bytes: file.size_bytes,
            info_hash: record.info_hash.clone(),
            file_name,
            file_list,
        }
    }
}

/// Format a byte count the way indexers do ("1.40 GB", "700.00 MB").
pub fn format_size(bytes: u64) -> String {
    const GB: f64 = 1024.0 * 1024.0 * 1024.0;
    const MB: f64 = 1024.0 * 1024.0;
    let bytes = bytes as f64;
    if bytes >= GB {
        format!("{:.2} GB", bytes / GB)
    } else {
        format!("{:.2} MB", bytes / MB)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_stremio_movie() {
        let ctx = RequestContext::from_stremio("movie", "tt0111161").unwrap();
        assert_eq!(ctx, RequestContext::movie("tt0111161"));
        assert_eq!(ctx.target(), None);
    }

    #[test]
    fn test_from_stremio_episode() {
        let ctx = RequestContext::from_stremio("series", "tt0903747:2:5").unwrap();
        assert_eq!(ctx.kind, MediaKind::Series);
        assert_eq!(ctx.title_id, "tt0903747");
        assert_eq!(ctx.target(), Some((2, 5)));
        assert_eq!(ctx.stremio_id(), "tt0903747:2:5");
    }

    #[test]
    fn test_from_stremio_series_without_episode() {
        let ctx = RequestContext::from_stremio("series", "tt0903747").unwrap();
        assert_eq!(ctx, RequestContext::series("tt0903747"));
    }

    #[test]
    fn test_from_stremio_rejects_malformed() {
        assert_eq!(
            RequestContext::from_stremio("channel", "tt1"),
            Err(RequestError::UnknownType("channel".to_string()))
        );
        for id in ["", ":1:2", "tt1:1", "tt1:a:2", "tt1:0:2", "tt1:1:0", "tt1:1:2:3"] {
            assert!(
                matches!(
                    RequestContext::from_stremio("series", id),
                    Err(RequestError::InvalidId(_))
                ),
                "{} should be rejected",
                id
            );
        }
        assert!(RequestContext::from_stremio("movie", "tt1:1:2").is_err());
    }

    #[test]
    fn test_cache_key_distinguishes_requests() {
        let a = RequestContext::episode("tt1", 1, 2).cache_key();
        let b = RequestContext::episode("tt1", 1, 3).cache_key();
        let c = RequestContext::movie("tt1").cache_key();
        assert_eq!(a, "series:tt1:1:2");
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(1_503_238_554), "1.40 GB");
        assert_eq!(format_size(700 * 1024 * 1024), "700.00 MB");
    }

    #[test]
    fn test_descriptor_from_resolution() {
        let mut record = TorrentRecord::new(
            "Show.S01.1080p.BluRay.x264",
            "0123456789abcdef0123456789abcdef01234567",
            "torrentio/TPB",
        );
        record.seeds = 42;
        let file = FileEntry {
            id: 3,
            path: "/Show.S01/Show.S01E03.mkv".to_string(),
            size_bytes: 2 * 1024 * 1024 * 1024,
            selected: true,
            url: None,
        };

        let descriptor =
            StreamDescriptor::from_resolution(&record, &file, "https://dl/x".to_string(), None);

        assert_eq!(descriptor.name, "[RD] 1080p");
        assert_eq!(descriptor.url, "https://dl/x");
        assert_eq!(descriptor.file_name, "Show.S01E03.mkv");
        assert_eq!(descriptor.binge_group, "rdflix|1080p|BluRay");
        assert_eq!(descriptor.quality_score, quality::score(&record.name));
        assert_eq!(descriptor.size_bytes, file.size_bytes);
        assert!(descriptor.title.contains("📄 Show.S01E03.mkv"));
        assert!(descriptor.title.contains("💾 2.00 GB 👤 42"));
    }
}
