//! Filtering and ordering of the raw torrent pool.

use std::ops::Deref;

use crate::config::FilterConfig;
use crate::indexer::TorrentRecord;
use crate::quality;

/// Torrent records ordered by `(quality score, seeds)`, best first.
///
/// Built fresh per request; the ranking stages only ever read it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankedPool(Vec<TorrentRecord>);

impl RankedPool {
    pub fn into_inner(self) -> Vec<TorrentRecord> {
        self.0
    }
}

impl Deref for RankedPool {
    type Target = [TorrentRecord];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'a> IntoIterator for &'a RankedPool {
    type Item = &'a TorrentRecord;
    type IntoIter = std::slice::Iter<'a, TorrentRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Whether `record` survives the configured exclusion rules.
///
/// Records without a valid info hash or without a known size never pass.
pub fn passes_filters(record: &TorrentRecord, config: &FilterConfig) -> bool {
    if record.resolved_info_hash().is_none() {
        return false;
    }

    let name = record.name.to_lowercase();
    if config
        .blocked_codecs()
        .iter()
        .any(|codec| name.contains(codec))
    {
        return false;
    }

    if record.seeds < config.min_seeds {
        return false;
    }

    match record.size_gb() {
        Some(size) => size >= config.min_size_gb && size <= config.max_size_gb,
        None => false,
    }
}

/// Filter the pool and order it best first.
///
/// Ordering is a stable sort by quality score, then seeders, both
/// descending. The input is left untouched.
pub fn filter_and_rank(pool: &[TorrentRecord], config: &FilterConfig) -> RankedPool {
    let mut scored: Vec<(i32, TorrentRecord)> = pool
        .iter()
        .filter(|record| passes_filters(record, config))
        .map(|record| {
            let mut record = record.clone();
            if let Some(hash) = record.resolved_info_hash() {
                record.info_hash = hash;
            }
            (quality::score(&record.name), record)
        })
        .collect();

    scored.sort_by(|(score_a, a), (score_b, b)| {
        score_b.cmp(score_a).then_with(|| b.seeds.cmp(&a.seeds))
    });

    RankedPool(scored.into_iter().map(|(_, record)| record).collect())
}
