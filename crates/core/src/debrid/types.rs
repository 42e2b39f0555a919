use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from debrid backend operations.
#[derive(Debug, Clone, Error)]
pub enum DebridError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Torrent not found: {0}")]
    NotFound(String),

    #[error("Rate limited by debrid backend")]
    RateLimited,

    #[error("Torrent failed on backend: {0}")]
    TorrentFailed(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Request timeout")]
    Timeout,
}

/// Job status as reported by the debrid backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DebridStatus {
    /// Resolving the magnet into torrent metadata.
    MagnetConversion,
    /// Metadata known, waiting for the client to pick files.
    WaitingFilesSelection,
    Queued,
    Downloading,
    /// Content available; links can be unrestricted.
    Downloaded,
    Compressing,
    Uploading,
    MagnetError,
    Error,
    Virus,
    Dead,
    Other(String),
}

impl DebridStatus {
    /// Terminal failure states. Polling further is pointless.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            DebridStatus::MagnetError | DebridStatus::Error | DebridStatus::Virus | DebridStatus::Dead
        )
    }

    pub fn as_str(&self) -> &str {
        match self {
            DebridStatus::MagnetConversion => "magnet_conversion",
            DebridStatus::WaitingFilesSelection => "waiting_files_selection",
            DebridStatus::Queued => "queued",
            DebridStatus::Downloading => "downloading",
            DebridStatus::Downloaded => "downloaded",
            DebridStatus::Compressing => "compressing",
            DebridStatus::Uploading => "uploading",
            DebridStatus::MagnetError => "magnet_error",
            DebridStatus::Error => "error",
            DebridStatus::Virus => "virus",
            DebridStatus::Dead => "dead",
            DebridStatus::Other(s) => s,
        }
    }
}

impl From<String> for DebridStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "magnet_conversion" => DebridStatus::MagnetConversion,
            "waiting_files_selection" => DebridStatus::WaitingFilesSelection,
            "queued" => DebridStatus::Queued,
            "downloading" => DebridStatus::Downloading,
            "downloaded" => DebridStatus::Downloaded,
            "compressing" => DebridStatus::Compressing,
            "uploading" => DebridStatus::Uploading,
            "magnet_error" => DebridStatus::MagnetError,
            "error" => DebridStatus::Error,
            "virus" => DebridStatus::Virus,
            "dead" => DebridStatus::Dead,
            _ => DebridStatus::Other(s),
        }
    }
}

impl From<DebridStatus> for String {
    fn from(status: DebridStatus) -> Self {
        status.as_str().to_string()
    }
}

impl std::fmt::Display for DebridStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One file inside a debrid job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Backend file identifier, used for file selection.
    pub id: u64,
    /// Path inside the torrent, may contain directories.
    pub path: String,
    /// Size in bytes.
    pub size_bytes: u64,
    /// Whether the file is part of the current selection.
    #[serde(default)]
    pub selected: bool,
    /// Direct link, once resolved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Snapshot of a debrid job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebridTorrent {
    pub id: String,
    pub status: DebridStatus,
    pub files: Vec<FileEntry>,
    /// Restricted links, one per selected file in ascending file id order.
    pub links: Vec<String>,
}

impl DebridTorrent {
    /// The backend has enumerated the torrent's files.
    pub fn files_ready(&self) -> bool {
        !self.files.is_empty() && self.status != DebridStatus::MagnetConversion
    }

    /// Restricted links are available for the selection.
    pub fn links_ready(&self) -> bool {
        self.status == DebridStatus::Downloaded && !self.links.is_empty()
    }

    /// Whether the backend still expects a file selection.
    pub fn needs_selection(&self) -> bool {
        self.status == DebridStatus::WaitingFilesSelection
    }

    /// Restricted link for `file_id`.
    ///
    /// Links are listed per selected file, ordered by file id.
    pub fn link_for_file(&self, file_id: u64) -> Option<&str> {
        let mut selected: Vec<u64> = self
            .files
            .iter()
            .filter(|f| f.selected)
            .map(|f| f.id)
            .collect();
        selected.sort_unstable();
        let index = selected.iter().position(|id| *id == file_id)?;
        self.links.get(index).map(String::as_str)
    }
}

/// Response to a magnet submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AddedMagnet {
    /// Backend job identifier. Empty if the backend did not return one.
    #[serde(default)]
    pub id: String,
}

/// A playable link obtained from a restricted one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnrestrictedLink {
    /// Direct download URL.
    pub download: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub filesize: u64,
}

/// Debrid backend abstraction.
///
/// Implementations must be thread-safe.
#[async_trait]
pub trait DebridClient: Send + Sync {
    /// Backend name (for logging).
    fn name(&self) -> &str;

    /// Submit a magnet URI for ingestion.
    async fn add_magnet(&self, magnet: &str) -> Result<AddedMagnet, DebridError>;

    /// Fetch job status, file list and links.
    async fn torrent_info(&self, id: &str) -> Result<DebridTorrent, DebridError>;

    /// Choose which files of the job to prepare.
    async fn select_files(&self, id: &str, file_ids: &[u64]) -> Result<(), DebridError>;

    /// Turn a restricted link into a playable one.
    async fn unrestrict_link(&self, link: &str) -> Result<UnrestrictedLink, DebridError>;

    /// Remove a job from the account.
    async fn delete_torrent(&self, id: &str) -> Result<(), DebridError>;
}
