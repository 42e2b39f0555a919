//! The resolve loop.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::Config;
use crate::debrid::DebridResolver;
use crate::indexer::TorrentRecord;
use crate::ranker::filter_and_rank;

use super::tiers::{partition, Tier};
use super::types::{RequestContext, StreamDescriptor};

/// Turns a raw torrent pool into playable streams.
pub struct StreamPipeline {
    resolver: DebridResolver,
    config: Arc<Config>,
}

impl StreamPipeline {
    pub fn new(resolver: DebridResolver, config: Arc<Config>) -> Self {
        Self { resolver, config }
    }

    /// Filter, rank, tier and resolve `pool` for `ctx`.
    ///
    /// Candidates are resolved one at a time, best first. A tier is only
    /// entered if every earlier tier produced nothing. An info hash is tried
    /// at most once per call. The result is sorted by quality score, best
    /// first, and is empty when nothing resolved.
    pub async fn produce_streams(
        &self,
        pool: &[TorrentRecord],
        ctx: &RequestContext,
    ) -> Vec<StreamDescriptor> {
        let ranked = filter_and_rank(pool, &self.config.filters);
        debug!(
            title_id = %ctx.title_id,
            raw = pool.len(),
            ranked = ranked.len(),
            "Ranked torrent pool"
        );

        let tiers = match ctx.target() {
            Some((season, episode)) => {
                partition(&ranked, season, episode, &self.config.episodes)
                    .into_ordered(&self.config.episodes)
            }
            None => vec![(Tier::All, ranked.into_inner())],
        };

        let cap = self.config.pipeline.result_cap();
        let max_attempts = self.config.pipeline.max_attempts_per_tier;
        let mut tried: HashSet<String> = HashSet::new();
        let mut streams: Vec<StreamDescriptor> = Vec::new();

        for (tier, candidates) in tiers {
            let mut attempts = 0;
            for candidate in &candidates {
                if streams.len() >= cap || attempts >= max_attempts {
                    break;
                }
                if !tried.insert(candidate.info_hash.clone()) {
                    continue;
                }
                attempts += 1;
                debug!(
                    tier = tier.as_str(),
                    attempt = attempts,
                    info_hash = %candidate.info_hash,
                    name = %candidate.name,
                    "Resolving candidate"
                );
                if let Some(stream) = self.resolver.resolve(candidate, ctx).await {
                    streams.push(stream);
                }
            }

            if !streams.is_empty() {
                info!(
                    title_id = %ctx.title_id,
                    tier = tier.as_str(),
                    streams = streams.len(),
                    "Resolved streams"
                );
                break;
            }
            debug!(tier = tier.as_str(), attempts, "Tier produced no streams");
        }

        streams.sort_by(|a, b| b.quality_score.cmp(&a.quality_score));
        streams
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DebridConfig, PipelineConfig};
    use crate::debrid::RecordingSleeper;
    use crate::testing::{fixtures, MockDebridClient};

    fn pipeline(client: &Arc<MockDebridClient>, config: Config) -> StreamPipeline {
        let resolver = DebridResolver::with_sleeper(
            client.clone(),
            config.debrid.clone(),
            Arc::new(RecordingSleeper::new()),
        );
        StreamPipeline::new(resolver, Arc::new(config))
    }

    fn config() -> Config {
        Config {
            debrid: DebridConfig {
                api_key: "token".to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_movie_single_file_single_link() {
        let client = Arc::new(MockDebridClient::new());
        let pipeline = pipeline(
            &client,
            Config {
                pipeline: PipelineConfig {
                    single_link_mode: true,
                    ..Default::default()
                },
                ..config()
            },
        );

        let pool = vec![fixtures::record("Movie.2020.1080p.BluRay", 'a', 20)];
        let streams = pipeline
            .produce_streams(&pool, &RequestContext::movie("tt1"))
            .await;

        assert_eq!(streams.len(), 1);
        assert_eq!(streams[0].url, MockDebridClient::download_url(1));
    }

    #[tokio::test]
    async fn test_empty_pool_yields_nothing() {
        let client = Arc::new(MockDebridClient::new());
        let pipeline = pipeline(&client, config());

        let streams = pipeline.produce_streams(&[], &RequestContext::movie("tt1")).await;
        assert!(streams.is_empty());
        assert!(client.magnets().await.is_empty());
    }

    #[tokio::test]
    async fn test_stops_at_cap_and_sorts_by_quality() {
        let client = Arc::new(MockDebridClient::new());
        let pipeline = pipeline(
            &client,
            Config {
                pipeline: PipelineConfig {
                    max_results: 2,
                    ..Default::default()
                },
                ..config()
            },
        );

        let pool = vec![
            fixtures::record("Movie.720p.WEB", 'a', 50),
            fixtures::record("Movie.2160p.BluRay", 'b', 5),
            fixtures::record("Movie.1080p.WEB-DL", 'c', 10),
        ];
        let streams = pipeline
            .produce_streams(&pool, &RequestContext::movie("tt1"))
            .await;

        assert_eq!(streams.len(), 2);
        assert_eq!(client.magnets().await.len(), 2);
        assert!(streams[0].quality_score > streams[1].quality_score);
        assert_eq!(streams[0].info_hash, fixtures::hash('b'));
        assert_eq!(streams[1].info_hash, fixtures::hash('c'));
    }

    #[tokio::test]
    async fn test_failed_candidates_are_skipped() {
        let client = Arc::new(MockDebridClient::new());
        client.reject_hash(&fixtures::hash('b')).await;
        let pipeline = pipeline(
            &client,
            Config {
                pipeline: PipelineConfig {
                    single_link_mode: true,
                    ..Default::default()
                },
                ..config()
            },
        );

        let pool = vec![
            fixtures::record("Movie.2160p.BluRay", 'b', 5),
            fixtures::record("Movie.1080p.BluRay", 'c', 5),
        ];
        let streams = pipeline
            .produce_streams(&pool, &RequestContext::movie("tt1"))
            .await;

        assert_eq!(streams.len(), 1);
        assert_eq!(streams[0].info_hash, fixtures::hash('c'));
    }

    #[tokio::test]
    async fn test_attempt_limit_per_tier() {
        let client = Arc::new(MockDebridClient::new());
        client.set_files(vec![fixtures::file(1, "readme.txt", 10)]).await;
        let pipeline = pipeline(
            &client,
            Config {
                pipeline: PipelineConfig {
                    max_attempts_per_tier: 2,
                    ..Default::default()
                },
                ..config()
            },
        );

        let pool: Vec<TorrentRecord> = ['a', 'b', 'c', 'd']
            .into_iter()
            .map(|d| fixtures::record("Movie.1080p", d, 5))
            .collect();
        let streams = pipeline
            .produce_streams(&pool, &RequestContext::movie("tt1"))
            .await;

        assert!(streams.is_empty());
        assert_eq!(client.magnets().await.len(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_hash_resolved_once() {
        let client = Arc::new(MockDebridClient::new());
        client.set_files(vec![fixtures::file(1, "readme.txt", 10)]).await;
        let pipeline = pipeline(&client, config());

        let pool = vec![
            fixtures::record("Movie.1080p.BluRay", 'a', 5),
            fixtures::record("Movie.1080p.WEB", 'a', 5),
        ];
        pipeline
            .produce_streams(&pool, &RequestContext::movie("tt1"))
            .await;

        assert_eq!(client.magnets().await.len(), 1);
    }

    #[tokio::test]
    async fn test_episode_tier_before_season_pack() {
        let client = Arc::new(MockDebridClient::new());
        client
            .set_files(vec![
                fixtures::file(1, "Show.S01E01.mkv", 1000),
                fixtures::file(2, "Show.S01E02.mkv", 1000),
            ])
            .await;
        let pipeline = pipeline(&client, config());

        let pool = vec![
            fixtures::record("Show.S01.2160p.BluRay", 'a', 50),
            fixtures::record("Show.S01E02.720p.WEB", 'b', 5),
        ];
        let streams = pipeline
            .produce_streams(&pool, &RequestContext::episode("tt1", 1, 2))
            .await;

        // the episode tier resolved, so the better-scored pack is never tried
        assert_eq!(streams.len(), 1);
        assert_eq!(streams[0].info_hash, fixtures::hash('b'));
        assert_eq!(client.magnets().await.len(), 1);
    }

    #[tokio::test]
    async fn test_falls_back_to_season_pack() {
        let client = Arc::new(MockDebridClient::new());
        client
            .set_files(vec![
                fixtures::file(1, "Show.S01E01.mkv", 1000),
                fixtures::file(2, "Show.S01E02.mkv", 1000),
            ])
            .await;
        client.reject_hash(&fixtures::hash('b')).await;
        let pipeline = pipeline(&client, config());

        let pool = vec![
            fixtures::record("Show.S01E02.720p.WEB", 'b', 5),
            fixtures::record("Show.S01.1080p.BluRay", 'a', 50),
            fixtures::record("Show.S05E02.1080p", 'c', 50),
        ];
        let streams = pipeline
            .produce_streams(&pool, &RequestContext::episode("tt1", 1, 2))
            .await;

        assert_eq!(streams.len(), 1);
        assert_eq!(streams[0].info_hash, fixtures::hash('a'));
        assert_eq!(streams[0].file_name, "Show.S01E02.mkv");
        // the other season's episode is never submitted
        assert_eq!(client.magnets().await.len(), 2);
    }

    #[tokio::test]
    async fn test_disabled_pack_tiers() {
        let client = Arc::new(MockDebridClient::new());
        let mut config = config();
        config.episodes.allow_season_packs = false;
        config.episodes.allow_series_packs = false;
        let pipeline = pipeline(&client, config);

        let pool = vec![
            fixtures::record("Show.S01.1080p", 'a', 50),
            fixtures::record("Show.Complete.Series.1080p", 'b', 50),
        ];
        let streams = pipeline
            .produce_streams(&pool, &RequestContext::episode("tt1", 1, 2))
            .await;

        assert!(streams.is_empty());
        assert!(client.magnets().await.is_empty());
    }
}
