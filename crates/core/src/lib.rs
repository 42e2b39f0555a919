//! Core library: turns a title request into playable debrid streams.
//!
//! The pipeline gathers torrent candidates from indexers, filters and ranks
//! them by release quality, tiers series candidates by specificity and
//! resolves them one by one through a debrid backend.

pub mod cache;
pub mod config;
pub mod debrid;
pub mod indexer;
pub mod matcher;
pub mod metrics;
pub mod pipeline;
pub mod quality;
pub mod ranker;
pub mod selector;
pub mod service;
pub mod testing;

pub use cache::{Cache, MemoryCache};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use debrid::{
    DebridClient, DebridError, DebridResolver, FileEntry, RealDebridClient, ResolveError,
};
pub use indexer::{build_indexers, gather, Indexer, IndexerError, TorrentRecord};
pub use pipeline::{MediaKind, RequestContext, RequestError, StreamDescriptor, StreamPipeline};
pub use ranker::{filter_and_rank, RankedPool};
pub use selector::select_file;
pub use service::StreamService;
