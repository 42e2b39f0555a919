//! Mock debrid backend for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::debrid::{
    AddedMagnet, DebridClient, DebridError, DebridStatus, DebridTorrent, FileEntry,
    UnrestrictedLink,
};

/// Per-job progress.
#[derive(Debug, Clone, Default)]
struct MockJob {
    /// `torrent_info` calls made for this job.
    info_calls: u32,
    /// Polls made once the file list was visible and selected.
    link_polls: u32,
    /// File ids chosen by `select_files`, if any.
    selection: Option<Vec<u64>>,
}

#[derive(Debug)]
struct MockState {
    files: Vec<FileEntry>,
    files_ready_after: u32,
    links_ready_after: u32,
    preselected: bool,
    empty_job_id: bool,
    empty_downloads: bool,
    status_override: Option<DebridStatus>,
    rejected_hashes: HashSet<String>,
    jobs: HashMap<String, MockJob>,
    magnets: Vec<String>,
    selections: Vec<Vec<u64>>,
    deleted: Vec<String>,
    job_counter: u32,
}

/// Mock implementation of the DebridClient trait.
///
/// Every submitted magnet becomes a job that walks through the backend's
/// lifecycle:
/// - `files_ready_after` polls in magnet conversion, without files
/// - waiting for a file selection (unless `preselected`)
/// - `links_ready_after` polls downloading
/// - downloaded, one link per selected file
///
/// Links look like `https://mock.debrid/link/{file_id}` and unrestrict to
/// [`MockDebridClient::download_url`].
///
/// # Example
///
/// ```rust,ignore
/// let client = MockDebridClient::new();
/// client.set_files(vec![fixtures::file(1, "Movie.mkv", 4_000)]).await;
/// client.set_links_ready_after(2).await;
///
/// let resolver = DebridResolver::with_sleeper(Arc::new(client), config, sleeper);
/// ```
#[derive(Debug)]
pub struct MockDebridClient {
    state: Arc<RwLock<MockState>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<DebridError>>>,
}

impl Default for MockDebridClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDebridClient {
    /// Create a mock whose jobs hold a single 1080p movie file.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(MockState {
                files: vec![FileEntry {
                    id: 1,
                    path: "Movie.2020.1080p/Movie.2020.1080p.mkv".to_string(),
                    size_bytes: 4 * 1024 * 1024 * 1024,
                    selected: false,
                    url: None,
                }],
                files_ready_after: 0,
                links_ready_after: 0,
                preselected: false,
                empty_job_id: false,
                empty_downloads: false,
                status_override: None,
                rejected_hashes: HashSet::new(),
                jobs: HashMap::new(),
                magnets: Vec::new(),
                selections: Vec::new(),
                deleted: Vec::new(),
                job_counter: 0,
            })),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Direct link produced for a file id.
    pub fn download_url(file_id: u64) -> String {
        format!("https://mock.debrid/dl/{}/file.mkv", file_id)
    }

    fn restricted_link(file_id: u64) -> String {
        format!("https://mock.debrid/link/{}", file_id)
    }

    /// Files listed for every job.
    pub async fn set_files(&self, files: Vec<FileEntry>) {
        self.state.write().await.files = files;
    }

    /// Number of polls before a job's files are listed.
    pub async fn set_files_ready_after(&self, polls: u32) {
        self.state.write().await.files_ready_after = polls;
    }

    /// Number of polls after selection before links appear.
    pub async fn set_links_ready_after(&self, polls: u32) {
        self.state.write().await.links_ready_after = polls;
    }

    /// Jobs start with every file selected (cached on the backend).
    pub async fn set_preselected(&self, preselected: bool) {
        self.state.write().await.preselected = preselected;
    }

    /// `add_magnet` returns an empty job id.
    pub async fn set_empty_job_id(&self, empty: bool) {
        self.state.write().await.empty_job_id = empty;
    }

    /// `unrestrict_link` returns an empty download URL.
    pub async fn set_empty_downloads(&self, empty: bool) {
        self.state.write().await.empty_downloads = empty;
    }

    /// Force every job into `status`.
    pub async fn set_status_override(&self, status: Option<DebridStatus>) {
        self.state.write().await.status_override = status;
    }

    /// Reject magnets carrying `info_hash`.
    pub async fn reject_hash(&self, info_hash: &str) {
        self.state
            .write()
            .await
            .rejected_hashes
            .insert(info_hash.to_lowercase());
    }

    /// Set an error to be returned by the next operation.
    pub async fn set_next_error(&self, error: DebridError) {
        *self.next_error.write().await = Some(error);
    }

    async fn check_error(&self) -> Result<(), DebridError> {
        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }
        Ok(())
    }

    /// Every magnet submitted, in order.
    pub async fn magnets(&self) -> Vec<String> {
        self.state.read().await.magnets.clone()
    }

    /// Every `select_files` call, in order.
    pub async fn selected_files(&self) -> Vec<Vec<u64>> {
        self.state.read().await.selections.clone()
    }

    /// Jobs deleted so far.
    pub async fn deleted(&self) -> Vec<String> {
        self.state.read().await.deleted.clone()
    }

    /// Total `torrent_info` calls across all jobs.
    pub async fn info_calls(&self) -> u32 {
        self.state
            .read()
            .await
            .jobs
            .values()
            .map(|job| job.info_calls)
            .sum()
    }
}

#[async_trait]
impl DebridClient for MockDebridClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn add_magnet(&self, magnet: &str) -> Result<AddedMagnet, DebridError> {
        self.check_error().await?;
        let mut state = self.state.write().await;
        state.magnets.push(magnet.to_string());

        let lower = magnet.to_lowercase();
        if state.rejected_hashes.iter().any(|h| lower.contains(h.as_str())) {
            return Err(DebridError::ApiError("infringing_file".to_string()));
        }
        if state.empty_job_id {
            return Ok(AddedMagnet::default());
        }

        state.job_counter += 1;
        let id = format!("JOB{}", state.job_counter);
        state.jobs.insert(id.clone(), MockJob::default());
        Ok(AddedMagnet { id })
    }

    async fn torrent_info(&self, id: &str) -> Result<DebridTorrent, DebridError> {
        self.check_error().await?;
        let mut state = self.state.write().await;
        let files_ready_after = state.files_ready_after;
        let links_ready_after = state.links_ready_after;
        let preselected = state.preselected;
        let override_status = state.status_override.clone();
        let template = state.files.clone();
        if state.deleted.iter().any(|d| d == id) {
            return Err(DebridError::NotFound(id.to_string()));
        }

        let job = state
            .jobs
            .get_mut(id)
            .ok_or_else(|| DebridError::NotFound(id.to_string()))?;
        job.info_calls += 1;

        if let Some(status) = override_status {
            return Ok(DebridTorrent {
                id: id.to_string(),
                status,
                files: Vec::new(),
                links: Vec::new(),
            });
        }

        if job.info_calls <= files_ready_after {
            return Ok(DebridTorrent {
                id: id.to_string(),
                status: DebridStatus::MagnetConversion,
                files: Vec::new(),
                links: Vec::new(),
            });
        }

        let selection: Option<Vec<u64>> = match &job.selection {
            Some(ids) => Some(ids.clone()),
            None if preselected => Some(template.iter().map(|f| f.id).collect()),
            None => None,
        };

        let Some(selection) = selection else {
            return Ok(DebridTorrent {
                id: id.to_string(),
                status: DebridStatus::WaitingFilesSelection,
                files: template,
                links: Vec::new(),
            });
        };

        let files: Vec<FileEntry> = template
            .into_iter()
            .map(|f| FileEntry {
                selected: selection.contains(&f.id),
                ..f
            })
            .collect();

        job.link_polls += 1;
        if job.link_polls <= links_ready_after {
            return Ok(DebridTorrent {
                id: id.to_string(),
                status: DebridStatus::Downloading,
                files,
                links: Vec::new(),
            });
        }

        let mut selected: Vec<u64> = files.iter().filter(|f| f.selected).map(|f| f.id).collect();
        selected.sort_unstable();
        Ok(DebridTorrent {
            id: id.to_string(),
            status: DebridStatus::Downloaded,
            files,
            links: selected.into_iter().map(Self::restricted_link).collect(),
        })
    }

    async fn select_files(&self, id: &str, file_ids: &[u64]) -> Result<(), DebridError> {
        self.check_error().await?;
        let mut state = self.state.write().await;
        state.selections.push(file_ids.to_vec());
        let job = state
            .jobs
            .get_mut(id)
            .ok_or_else(|| DebridError::NotFound(id.to_string()))?;
        job.selection = Some(file_ids.to_vec());
        Ok(())
    }

    async fn unrestrict_link(&self, link: &str) -> Result<UnrestrictedLink, DebridError> {
        self.check_error().await?;
        let file_id: u64 = link
            .rsplit('/')
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| DebridError::ApiError(format!("unknown link {}", link)))?;

        let state = self.state.read().await;
        let file = state.files.iter().find(|f| f.id == file_id);
        Ok(UnrestrictedLink {
            download: if state.empty_downloads {
                String::new()
            } else {
                Self::download_url(file_id)
            },
            filename: file.map(|f| f.path.clone()).unwrap_or_default(),
            filesize: file.map(|f| f.size_bytes).unwrap_or_default(),
        })
    }

    async fn delete_torrent(&self, id: &str) -> Result<(), DebridError> {
        self.check_error().await?;
        let mut state = self.state.write().await;
        if !state.jobs.contains_key(id) {
            return Err(DebridError::NotFound(id.to_string()));
        }
        state.deleted.push(id.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_job_lifecycle() {
        let client = MockDebridClient::new();
        client.set_files_ready_after(1).await;
        client.set_links_ready_after(1).await;

        let job = client.add_magnet("magnet:?xt=urn:btih:abc").await.unwrap();

        let info = client.torrent_info(&job.id).await.unwrap();
        assert_eq!(info.status, DebridStatus::MagnetConversion);
        assert!(!info.files_ready());

        let info = client.torrent_info(&job.id).await.unwrap();
        assert!(info.needs_selection());

        client.select_files(&job.id, &[1]).await.unwrap();
        let info = client.torrent_info(&job.id).await.unwrap();
        assert_eq!(info.status, DebridStatus::Downloading);

        let info = client.torrent_info(&job.id).await.unwrap();
        assert!(info.links_ready());
        let link = info.link_for_file(1).unwrap();

        let unrestricted = client.unrestrict_link(link).await.unwrap();
        assert_eq!(unrestricted.download, MockDebridClient::download_url(1));
    }

    #[tokio::test]
    async fn test_next_error_is_consumed() {
        let client = MockDebridClient::new();
        client.set_next_error(DebridError::RateLimited).await;
        assert!(client.add_magnet("magnet:?").await.is_err());
        assert!(client.add_magnet("magnet:?").await.is_ok());
    }

    #[tokio::test]
    async fn test_rejected_hash() {
        let client = MockDebridClient::new();
        client.reject_hash("ABC").await;
        assert!(client.add_magnet("magnet:?xt=urn:btih:abc").await.is_err());
        assert!(client.add_magnet("magnet:?xt=urn:btih:def").await.is_ok());
        assert_eq!(client.magnets().await.len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_job() {
        let client = MockDebridClient::new();
        assert!(matches!(
            client.torrent_info("missing").await,
            Err(DebridError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_deleted_job_keeps_poll_count() {
        let client = MockDebridClient::new();
        let job = client.add_magnet("magnet:?xt=urn:btih:abc").await.unwrap();
        client.torrent_info(&job.id).await.unwrap();
        client.delete_torrent(&job.id).await.unwrap();

        assert_eq!(client.deleted().await, vec![job.id.clone()]);
        assert_eq!(client.info_calls().await, 1);
        assert!(client.torrent_info(&job.id).await.is_err());
    }
}
