//! Testing utilities and mock implementations.
//!
//! Mocks for the indexer and debrid traits, so the whole stream pipeline can
//! run without network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use rdflix_core::testing::{fixtures, MockDebridClient, MockIndexer};
//!
//! let indexer = MockIndexer::new("mock");
//! indexer.add_record(fixtures::record("Movie.2020.1080p.BluRay", 'a', 50)).await;
//!
//! let debrid = MockDebridClient::new();
//! debrid.set_links_ready_after(2).await;
//! ```

mod mock_debrid;
mod mock_indexer;

pub use crate::debrid::RecordingSleeper;
pub use mock_debrid::MockDebridClient;
pub use mock_indexer::MockIndexer;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::debrid::FileEntry;
    use crate::indexer::TorrentRecord;

    /// A 40-character info hash made of one repeated hex digit.
    pub fn hash(digit: char) -> String {
        std::iter::repeat(digit).take(40).collect()
    }

    /// A record with a 2 GiB size, `seeds` seeders and a synthetic hash.
    pub fn record(name: &str, hash_digit: char, seeds: u32) -> TorrentRecord {
        TorrentRecord {
            size_bytes: Some(2 * 1024 * 1024 * 1024),
            seeds,
            ..TorrentRecord::new(name, hash(hash_digit), "mock")
        }
    }

    /// A record with an explicit size in GiB.
    pub fn sized_record(name: &str, hash_digit: char, seeds: u32, size_gb: f64) -> TorrentRecord {
        TorrentRecord {
            size_bytes: Some((size_gb * 1024.0 * 1024.0 * 1024.0) as u64),
            ..record(name, hash_digit, seeds)
        }
    }

    /// An unselected file without a link.
    pub fn file(id: u64, path: &str, size_bytes: u64) -> FileEntry {
        FileEntry {
            id,
            path: path.to_string(),
            size_bytes,
            selected: false,
            url: None,
        }
    }
}
