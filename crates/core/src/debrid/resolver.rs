//! Resolution of one torrent candidate into a playable stream.
//!
//! Protocol against the debrid backend:
//! 1. submit the magnet and obtain a job id
//! 2. poll until the job's files are enumerated
//! 3. pick the file to play
//! 4. select it (only while the backend waits for a selection)
//! 5. poll until links exist, then unrestrict the file's link
//!
//! Every failure is local to the candidate: it is logged and the resolver
//! yields `None`.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::DebridConfig;
use crate::matcher::{is_complete_series_pack, is_season_pack, matches_episode};
use crate::metrics;
use crate::indexer::TorrentRecord;
use crate::pipeline::{RequestContext, StreamDescriptor};
use crate::selector::{natural_cmp, select_file_with_hint, video_files, ReleaseHint};

use super::retry::{poll_until, Poll, RetryPolicy, Sleeper, TokioSleeper};
use super::{DebridClient, DebridError, DebridTorrent, FileEntry};

/// Why a candidate could not be resolved.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Backend rejected the magnet: {0}")]
    SubmitRejected(DebridError),

    #[error("Backend returned no job id")]
    MissingJobId,

    #[error("Files not enumerated after {attempts} attempts")]
    FilesNotReady { attempts: u32 },

    #[error("No file matches the request")]
    NoMatchingFile,

    #[error("Links not ready after {attempts} attempts")]
    LinksNotReady { attempts: u32 },

    #[error("Backend returned no playable link")]
    NoPlayableLink,

    #[error("Backend error: {0}")]
    Backend(#[from] DebridError),
}

impl ResolveError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ResolveError::SubmitRejected(_) => "submit_rejected",
            ResolveError::MissingJobId => "missing_job_id",
            ResolveError::FilesNotReady { .. } => "files_not_ready",
            ResolveError::NoMatchingFile => "no_matching_file",
            ResolveError::LinksNotReady { .. } => "links_not_ready",
            ResolveError::NoPlayableLink => "no_playable_link",
            ResolveError::Backend(_) => "backend_error",
        }
    }
}

/// Drives one candidate through the debrid backend.
pub struct DebridResolver {
    client: Arc<dyn DebridClient>,
    config: DebridConfig,
    sleeper: Arc<dyn Sleeper>,
}

impl DebridResolver {
    pub fn new(client: Arc<dyn DebridClient>, config: DebridConfig) -> Self {
        Self::with_sleeper(client, config, Arc::new(TokioSleeper))
    }

    /// Use a custom sleeper (tests inject a recording one).
    pub fn with_sleeper(
        client: Arc<dyn DebridClient>,
        config: DebridConfig,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            client,
            config,
            sleeper,
        }
    }

    fn files_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.config.files_poll_attempts,
            Duration::from_millis(self.config.files_poll_interval_ms),
        )
    }

    fn links_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.config.links_poll_attempts,
            Duration::from_millis(self.config.links_poll_interval_ms),
        )
    }

    /// Resolve `torrent` for `ctx`. `None` means "not usable", never a fatal error.
    pub async fn resolve(
        &self,
        torrent: &TorrentRecord,
        ctx: &RequestContext,
    ) -> Option<StreamDescriptor> {
        // Deletes the job if this future is dropped mid-resolution.
        let mut pending = PendingJob {
            client: Arc::clone(&self.client),
            id: None,
            cleanup: self.config.cleanup_failed,
        };

        match self.try_resolve(torrent, ctx, &mut pending.id).await {
            Ok(descriptor) => {
                pending.id = None;
                metrics::RESOLVE_ATTEMPTS
                    .with_label_values(&["resolved"])
                    .inc();
                info!(
                    info_hash = %torrent.info_hash,
                    file = %descriptor.file_name,
                    "Resolved stream"
                );
                Some(descriptor)
            }
            Err(e) => {
                let job_id = pending.id.take();
                metrics::RESOLVE_ATTEMPTS
                    .with_label_values(&[e.kind()])
                    .inc();
                warn!(
                    info_hash = %torrent.info_hash,
                    job_id = job_id.as_deref().unwrap_or("-"),
                    error = %e,
                    "Failed to resolve candidate"
                );
                if let Some(id) = job_id {
                    self.cleanup(&id).await;
                }
                None
            }
        }
    }

    /// Fallible core of [`resolve`](Self::resolve).
    ///
    /// `job_id` is filled as soon as the backend assigns one, so the caller
    /// can clean up after a later failure.
    pub async fn try_resolve(
        &self,
        torrent: &TorrentRecord,
        ctx: &RequestContext,
        job_id: &mut Option<String>,
    ) -> Result<StreamDescriptor, ResolveError> {
        // 1. Submit
        let added = self
            .client
            .add_magnet(&torrent.magnet_uri())
            .await
            .map_err(ResolveError::SubmitRejected)?;
        let id = added.id.trim().to_string();
        if id.is_empty() {
            return Err(ResolveError::MissingJobId);
        }
        *job_id = Some(id.clone());
        debug!(info_hash = %torrent.info_hash, job_id = %id, "Magnet accepted");

        // 2. Wait for the file listing
        let policy = self.files_policy();
        let info = self
            .poll_job(&id, policy, "files", DebridTorrent::files_ready)
            .await?
            .ok_or(ResolveError::FilesNotReady {
                attempts: policy.max_attempts,
            })?;

        // 3. Pick the file
        let hint = release_hint(&torrent.name, ctx);
        let chosen = select_file_with_hint(&info.files, ctx.season, ctx.episode, hint)
            .cloned()
            .ok_or(ResolveError::NoMatchingFile)?;
        debug!(job_id = %id, file_id = chosen.id, path = %chosen.path, "Selected file");

        // 4. Select
        let with_siblings = self.config.include_file_list && hint == ReleaseHint::SeasonPack;
        if info.needs_selection() {
            let file_ids: Vec<u64> = if with_siblings {
                video_files(&info.files).iter().map(|f| f.id).collect()
            } else {
                vec![chosen.id]
            };
            self.client.select_files(&id, &file_ids).await?;
        }

        // 5. Wait for links and unrestrict
        let policy = self.links_policy();
        let chosen_id = chosen.id;
        let ready = self
            .poll_job(&id, policy, "links", move |t: &DebridTorrent| {
                t.links_ready() && t.link_for_file(chosen_id).is_some()
            })
            .await?
            .ok_or(ResolveError::LinksNotReady {
                attempts: policy.max_attempts,
            })?;

        let link = ready
            .link_for_file(chosen.id)
            .ok_or(ResolveError::NoPlayableLink)?;
        let unrestricted = self.client.unrestrict_link(link).await?;
        if unrestricted.download.trim().is_empty() {
            return Err(ResolveError::NoPlayableLink);
        }

        let file_list = if with_siblings {
            Some(self.sibling_links(&ready, &chosen, &unrestricted.download).await)
        } else {
            None
        };

        Ok(StreamDescriptor::from_resolution(
            torrent,
            &chosen,
            unrestricted.download,
            file_list,
        ))
    }

    /// Poll the job until `ready` holds, failing fast on terminal statuses.
    async fn poll_job<F>(
        &self,
        id: &str,
        policy: RetryPolicy,
        phase: &'static str,
        ready: F,
    ) -> Result<Option<DebridTorrent>, ResolveError>
    where
        F: Fn(&DebridTorrent) -> bool,
    {
        let client = &self.client;
        let ready = &ready;
        let result = poll_until::<DebridTorrent, DebridError, _, _>(
            policy,
            self.sleeper.as_ref(),
            |attempt| async move {
                metrics::DEBRID_POLLS.with_label_values(&[phase]).inc();
                let torrent = client.torrent_info(id).await?;
                debug!(job_id = %id, phase, attempt, status = %torrent.status, "Polled job");
                if torrent.status.is_failure() {
                    return Err(DebridError::TorrentFailed(torrent.status.to_string()));
                }
                if ready(&torrent) {
                    Ok(Poll::Ready(torrent))
                } else {
                    Ok(Poll::Pending)
                }
            },
        )
        .await?;
        Ok(result)
    }

    /// Unrestrict every selected video file of a pack, in natural order.
    ///
    /// Files whose link cannot be unrestricted are left out.
    async fn sibling_links(
        &self,
        torrent: &DebridTorrent,
        chosen: &FileEntry,
        chosen_url: &str,
    ) -> Vec<FileEntry> {
        let mut siblings: Vec<FileEntry> = Vec::new();
        for file in video_files(&torrent.files).into_iter().filter(|f| f.selected) {
            let url = if file.id == chosen.id {
                Some(chosen_url.to_string())
            } else {
                match torrent.link_for_file(file.id) {
                    Some(link) => match self.client.unrestrict_link(link).await {
                        Ok(u) if !u.download.is_empty() => Some(u.download),
                        Ok(_) => None,
                        Err(e) => {
                            debug!(file_id = file.id, error = %e, "Sibling unrestrict failed");
                            None
                        }
                    },
                    None => None,
                }
            };
            if let Some(url) = url {
                siblings.push(FileEntry {
                    url: Some(url),
                    ..file.clone()
                });
            }
        }
        siblings.sort_by(|a, b| natural_cmp(&a.path, &b.path));
        siblings
    }

    /// Best-effort removal of a failed job.
    async fn cleanup(&self, id: &str) {
        if !self.config.cleanup_failed {
            return;
        }
        match self.client.delete_torrent(id).await {
            Ok(()) => debug!(job_id = %id, "Deleted failed job"),
            Err(e) => warn!(job_id = %id, error = %e, "Failed to delete job"),
        }
    }
}

/// What the release name says about the files to expect.
/// A job created for a resolution that has not finished yet.
///
/// Dropping it while `id` is set deletes the job in the background. That
/// happens when the request timeout cancels the pipeline mid-poll.
struct PendingJob {
    client: Arc<dyn DebridClient>,
    id: Option<String>,
    cleanup: bool,
}

impl Drop for PendingJob {
    fn drop(&mut self) {
        let Some(id) = self.id.take() else {
            return;
        };
        if !self.cleanup {
            return;
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!(job_id = %id, "No runtime left to delete abandoned job");
            return;
        };
        let client = Arc::clone(&self.client);
        handle.spawn(async move {
            match client.delete_torrent(&id).await {
                Ok(()) => debug!(job_id = %id, "Deleted abandoned job"),
                Err(e) => warn!(job_id = %id, error = %e, "Failed to delete abandoned job"),
            }
        });
    }
}

fn release_hint(name: &str, ctx: &RequestContext) -> ReleaseHint {
    match ctx.target() {
        Some((season, episode)) if matches_episode(name, season, episode) => ReleaseHint::Episode,
        Some(_) if is_complete_series_pack(name) => ReleaseHint::Other,
        Some((season, _)) if is_season_pack(name, season) => ReleaseHint::SeasonPack,
        _ => ReleaseHint::Other,
    }
}
