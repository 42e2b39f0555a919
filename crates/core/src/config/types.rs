use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub debrid: DebridConfig,
    #[serde(default)]
    pub filters: FilterConfig,
    #[serde(default)]
    pub episodes: EpisodeConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub indexers: IndexersConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    7000
}

/// Debrid backend (Real-Debrid) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DebridConfig {
    /// API token. An empty key disables stream resolution.
    #[serde(default)]
    pub api_key: String,
    /// REST API base URL.
    #[serde(default = "default_debrid_url")]
    pub base_url: String,
    /// HTTP request timeout in seconds.
    #[serde(default = "default_debrid_timeout")]
    pub timeout_secs: u32,
    /// How many times to poll for the torrent's file listing.
    #[serde(default = "default_files_poll_attempts")]
    pub files_poll_attempts: u32,
    /// Delay between file listing polls (milliseconds).
    #[serde(default = "default_files_poll_interval")]
    pub files_poll_interval_ms: u64,
    /// How many times to poll for download links after file selection.
    #[serde(default = "default_links_poll_attempts")]
    pub links_poll_attempts: u32,
    /// Delay between link polls (milliseconds).
    #[serde(default = "default_links_poll_interval")]
    pub links_poll_interval_ms: u64,
    /// Select every video file of a season pack and return the per-file URL map.
    #[serde(default)]
    pub include_file_list: bool,
    /// Delete debrid jobs whose resolution failed.
    #[serde(default = "default_true")]
    pub cleanup_failed: bool,
}

impl DebridConfig {
    /// Whether an API key has been provided.
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

impl Default for DebridConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_debrid_url(),
            timeout_secs: default_debrid_timeout(),
            files_poll_attempts: default_files_poll_attempts(),
            files_poll_interval_ms: default_files_poll_interval(),
            links_poll_attempts: default_links_poll_attempts(),
            links_poll_interval_ms: default_links_poll_interval(),
            include_file_list: false,
            cleanup_failed: true,
        }
    }
}

fn default_debrid_url() -> String {
    "https://api.real-debrid.com/rest/1.0".to_string()
}

fn default_debrid_timeout() -> u32 {
    30
}

fn default_files_poll_attempts() -> u32 {
    5
}

fn default_files_poll_interval() -> u64 {
    1000
}

fn default_links_poll_attempts() -> u32 {
    10
}

fn default_links_poll_interval() -> u64 {
    2000
}

fn default_true() -> bool {
    true
}

/// Exclusion rules applied to the raw torrent pool.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FilterConfig {
    #[serde(default = "default_true")]
    pub exclude_x265: bool,
    #[serde(default = "default_true")]
    pub exclude_hevc: bool,
    #[serde(default = "default_true")]
    pub exclude_h265: bool,
    /// Minimum seeders a release needs to be considered.
    #[serde(default = "default_min_seeds")]
    pub min_seeds: u32,
    /// Lower size bound in GiB (inclusive).
    #[serde(default)]
    pub min_size_gb: f64,
    /// Upper size bound in GiB (inclusive).
    #[serde(default = "default_max_size_gb")]
    pub max_size_gb: f64,
}

impl FilterConfig {
    /// Lowercase codec tags that disqualify a release.
    pub fn blocked_codecs(&self) -> Vec<&'static str> {
        let mut blocked = Vec::new();
        if self.exclude_x265 {
            blocked.push("x265");
        }
        if self.exclude_hevc {
            blocked.push("hevc");
        }
        if self.exclude_h265 {
            blocked.push("h265");
        }
        blocked
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            exclude_x265: true,
            exclude_hevc: true,
            exclude_h265: true,
            min_seeds: default_min_seeds(),
            min_size_gb: 0.0,
            max_size_gb: default_max_size_gb(),
        }
    }
}

fn default_min_seeds() -> u32 {
    1
}

fn default_max_size_gb() -> f64 {
    20.0
}

/// Series handling: which fallback tiers are allowed.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EpisodeConfig {
    #[serde(default = "default_true")]
    pub allow_season_packs: bool,
    #[serde(default = "default_true")]
    pub allow_series_packs: bool,
    /// Season packs smaller than this (GiB) are ignored.
    #[serde(default)]
    pub min_season_pack_size_gb: f64,
}

impl Default for EpisodeConfig {
    fn default() -> Self {
        Self {
            allow_season_packs: true,
            allow_series_packs: true,
            min_season_pack_size_gb: 0.0,
        }
    }
}

/// Resolve loop limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// Stop after the first resolved stream.
    #[serde(default)]
    pub single_link_mode: bool,
    /// Maximum streams returned per request.
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// How many candidates of a tier are sent to the debrid backend at most.
    #[serde(default = "default_max_attempts")]
    pub max_attempts_per_tier: usize,
    /// Upper bound on a whole request (gather + resolve), in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl PipelineConfig {
    /// Effective result cap, accounting for single-link mode.
    pub fn result_cap(&self) -> usize {
        if self.single_link_mode {
            1
        } else {
            self.max_results
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            single_link_mode: false,
            max_results: default_max_results(),
            max_attempts_per_tier: default_max_attempts(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_max_results() -> usize {
    3
}

fn default_max_attempts() -> usize {
    6
}

fn default_request_timeout() -> u64 {
    120
}

/// Result cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// TTL for scraped torrent pools (seconds).
    #[serde(default = "default_pool_ttl")]
    pub pool_ttl_secs: u64,
    /// TTL for resolved stream lists (seconds).
    #[serde(default = "default_stream_ttl")]
    pub stream_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            pool_ttl_secs: default_pool_ttl(),
            stream_ttl_secs: default_stream_ttl(),
        }
    }
}

fn default_pool_ttl() -> u64 {
    3600
}

fn default_stream_ttl() -> u64 {
    600
}

/// Indexer adapters configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IndexersConfig {
    /// User-Agent header sent to indexers.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_torrentio")]
    pub torrentio: Option<TorrentioConfig>,
    #[serde(default)]
    pub jackett: Option<JackettConfig>,
    /// Proxy for all outbound indexer traffic (e.g., "http://10.0.0.2:3128").
    #[serde(default)]
    pub proxy: Option<String>,
}

impl Default for IndexersConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            torrentio: default_torrentio(),
            jackett: None,
            proxy: None,
        }
    }
}

impl IndexersConfig {
    /// The configured proxy, ignoring an empty value.
    pub fn proxy_url(&self) -> Option<&str> {
        self.proxy.as_deref().map(str::trim).filter(|p| !p.is_empty())
    }
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/119.0.0.0 Safari/537.36"
        .to_string()
}

fn default_torrentio() -> Option<TorrentioConfig> {
    Some(TorrentioConfig::default())
}

/// Torrentio stream addon configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TorrentioConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Addon base URL (e.g., "https://torrentio.strem.fun")
    #[serde(default = "default_torrentio_url")]
    pub url: String,
    /// Request timeout in seconds (default: 15)
    #[serde(default = "default_torrentio_timeout")]
    pub timeout_secs: u32,
}

impl Default for TorrentioConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: default_torrentio_url(),
            timeout_secs: default_torrentio_timeout(),
        }
    }
}

fn default_torrentio_url() -> String {
    "https://torrentio.strem.fun".to_string()
}

fn default_torrentio_timeout() -> u32 {
    15
}

/// Jackett search backend configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JackettConfig {
    /// Jackett server URL (e.g., "http://localhost:9117")
    pub url: String,
    /// Jackett API key
    pub api_key: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_jackett_timeout")]
    pub timeout_secs: u32,
}

fn default_jackett_timeout() -> u32 {
    30
}

/// Per-client request limiting for the HTTP surface.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Requests a single client may make per window (default: 100)
    #[serde(default = "default_rate_limit_requests")]
    pub max_requests: u32,
    /// Window length in seconds (default: 900)
    #[serde(default = "default_rate_limit_window")]
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: default_rate_limit_requests(),
            window_secs: default_rate_limit_window(),
        }
    }
}

fn default_rate_limit_requests() -> u32 {
    100
}

fn default_rate_limit_window() -> u64 {
    900
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub debrid: SanitizedDebridConfig,
    pub filters: FilterConfig,
    pub episodes: EpisodeConfig,
    pub pipeline: PipelineConfig,
    pub cache: CacheConfig,
    pub indexers: SanitizedIndexersConfig,
    pub rate_limit: RateLimitConfig,
}

/// Sanitized debrid config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedDebridConfig {
    pub base_url: String,
    pub api_key_configured: bool,
    pub timeout_secs: u32,
    pub files_poll_attempts: u32,
    pub links_poll_attempts: u32,
    pub include_file_list: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedIndexersConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub torrentio: Option<TorrentioConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jackett: Option<SanitizedJackettConfig>,
    /// Proxy URLs may embed credentials.
    pub proxy_configured: bool,
}

/// Sanitized Jackett config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedJackettConfig {
    pub url: String,
    pub api_key_configured: bool,
    pub timeout_secs: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            debrid: SanitizedDebridConfig {
                base_url: config.debrid.base_url.clone(),
                api_key_configured: config.debrid.is_configured(),
                timeout_secs: config.debrid.timeout_secs,
                files_poll_attempts: config.debrid.files_poll_attempts,
                links_poll_attempts: config.debrid.links_poll_attempts,
                include_file_list: config.debrid.include_file_list,
            },
            filters: config.filters.clone(),
            episodes: config.episodes.clone(),
            pipeline: config.pipeline.clone(),
            cache: config.cache.clone(),
            indexers: SanitizedIndexersConfig {
                torrentio: config.indexers.torrentio.clone(),
                jackett: config.indexers.jackett.as_ref().map(|j| SanitizedJackettConfig {
                    url: j.url.clone(),
                    api_key_configured: !j.api_key.is_empty(),
                    timeout_secs: j.timeout_secs,
                }),
                proxy_configured: config.indexers.proxy_url().is_some(),
            },
            rate_limit: config.rate_limit.clone(),
        }
    }
}
