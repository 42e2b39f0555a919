//! Series candidate tiers, most specific first.

use crate::config::EpisodeConfig;
use crate::indexer::TorrentRecord;
use crate::matcher::{is_complete_series_pack, is_season_pack, matches_episode};
use crate::ranker::RankedPool;

/// Fallback tier a candidate belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// Releases of exactly the requested episode.
    Episode,
    /// Complete packs of the requested season.
    SeasonPack,
    /// Multi-season or whole-series packs.
    SeriesPack,
    /// No episode target: every ranked candidate.
    All,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Episode => "episode",
            Tier::SeasonPack => "season_pack",
            Tier::SeriesPack => "series_pack",
            Tier::All => "all",
        }
    }
}

/// A ranked pool split by specificity. Each list keeps the rank order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EpisodeTiers {
    pub episodes: Vec<TorrentRecord>,
    pub season_packs: Vec<TorrentRecord>,
    pub series_packs: Vec<TorrentRecord>,
}

impl EpisodeTiers {
    /// Tiers in the order they are tried, skipping disabled ones.
    pub fn into_ordered(self, config: &EpisodeConfig) -> Vec<(Tier, Vec<TorrentRecord>)> {
        let mut tiers = vec![(Tier::Episode, self.episodes)];
        if config.allow_season_packs {
            tiers.push((Tier::SeasonPack, self.season_packs));
        }
        if config.allow_series_packs {
            tiers.push((Tier::SeriesPack, self.series_packs));
        }
        tiers
    }
}

/// Split `pool` for a season/episode request.
///
/// Series packs are recognised before season packs, since a multi-season
/// name also mentions the requested season. Records matching no tier (other
/// episodes, other seasons) are dropped, as are season packs below
/// `min_season_pack_size_gb`.
pub fn partition(pool: &RankedPool, season: u32, episode: u32, config: &EpisodeConfig) -> EpisodeTiers {
    let mut tiers = EpisodeTiers::default();

    for record in pool {
        if matches_episode(&record.name, season, episode) {
            tiers.episodes.push(record.clone());
        } else if is_complete_series_pack(&record.name) {
            tiers.series_packs.push(record.clone());
        } else if is_season_pack(&record.name, season) {
            let big_enough = record
                .size_gb()
                .map(|gb| gb >= config.min_season_pack_size_gb)
                .unwrap_or(false);
            if big_enough {
                tiers.season_packs.push(record.clone());
            }
        }
    }

    tiers
}
