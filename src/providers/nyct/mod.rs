//! NYCT subway feed provider.
//!
//! Fetches the per-group GTFS-RT feeds, normalizes them against the static
//! stop table, and derives cached per-stop arrival boards. The two caches
//! (decoded feeds, built boards) expire independently: re-decoding the wire
//! feed is cheap enough to do every few seconds, while a built board stays
//! useful for as long as its window reaches.

pub mod board;
pub mod error;
pub mod groups;
pub mod realtime;
pub mod static_data;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::info;

use crate::cache::ExpiringCache;
use crate::config::Config;

use board::{Board, StopBoard};
use error::FeedError;
use realtime::TripUpdate;
use static_data::StaticTables;

/// Per-request fetch options.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Allow cache reads and writes. `false` always refetches and leaves
    /// the caches untouched.
    pub use_cache: bool,
    /// Per-request API key override.
    pub api_key: Option<String>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            api_key: None,
        }
    }
}

pub struct NyctProvider {
    client: reqwest::Client,
    tables: Arc<StaticTables>,
    timezone: chrono_tz::Tz,
    api_key: Option<String>,
    request_timeout: Duration,
    feed_cache: ExpiringCache<Arc<Vec<TripUpdate>>>,
    board_cache: ExpiringCache<Arc<Board>>,
}

impl NyctProvider {
    pub fn new(tables: Arc<StaticTables>, config: &Config) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("nyct-board-api/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            tables,
            timezone: config.feeds.parsed_timezone(),
            api_key: config.resolved_api_key(),
            request_timeout: Duration::from_secs(config.feeds.request_timeout_secs),
            feed_cache: ExpiringCache::new(Duration::from_secs(config.feeds.feed_ttl_secs)),
            board_cache: ExpiringCache::new(Duration::from_secs(config.feeds.board_ttl_secs)),
        })
    }

    pub fn tables(&self) -> &StaticTables {
        &self.tables
    }

    pub fn list_groups() -> Vec<&'static str> {
        groups::list_groups()
    }

    /// Fetch and normalize one group's feed, serving from the feed cache
    /// when permitted. An unknown group fails before any network call.
    pub async fn fetch_feed(
        &self,
        group_id: &str,
        opts: &FetchOptions,
    ) -> Result<Arc<Vec<TripUpdate>>, FeedError> {
        let group = groups::resolve_group(group_id)
            .ok_or_else(|| FeedError::UnknownGroup(group_id.to_string()))?;

        let cache_key = format!("feed:{}", group.id);
        if opts.use_cache {
            if let Some(hit) = self.feed_cache.get(&cache_key).await {
                return Ok(hit);
            }
        }

        let api_key = opts.api_key.as_deref().or(self.api_key.as_deref());
        let message =
            realtime::fetch_feed_message(&self.client, group.url, api_key, self.request_timeout)
                .await?;
        let records = Arc::new(realtime::normalize_trip_updates(&message, &self.tables));
        info!(
            group = group.id,
            trip_updates = records.len(),
            "Fetched real-time feed"
        );

        if opts.use_cache {
            self.feed_cache.insert(&cache_key, records.clone()).await;
        }
        Ok(records)
    }

    /// Arrival board row for one stop: rebuilt on board-cache miss, and
    /// relabeled against the current clock on every call regardless of
    /// where the board came from.
    pub async fn arrival_board(
        &self,
        group_id: &str,
        stop_id: &str,
        opts: &FetchOptions,
    ) -> Result<StopBoard, FeedError> {
        let group = groups::resolve_group(group_id)
            .ok_or_else(|| FeedError::UnknownGroup(group_id.to_string()))?;

        let cache_key = format!("board:{}", group.id);
        let cached = if opts.use_cache {
            self.board_cache.get(&cache_key).await
        } else {
            None
        };

        let board = match cached {
            Some(board) => board,
            None => {
                let feed = self.fetch_feed(group.id, opts).await?;
                let board = Arc::new(board::build_board(
                    &feed,
                    &self.tables,
                    Utc::now(),
                    self.timezone,
                ));
                if opts.use_cache {
                    self.board_cache.insert(&cache_key, board.clone()).await;
                }
                board
            }
        };

        Ok(board::board_for_stop(
            &board,
            stop_id,
            Utc::now(),
            self.timezone,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn empty_tables() -> Arc<StaticTables> {
        Arc::new(StaticTables {
            stops: HashMap::new(),
            routes: Vec::new(),
            loaded_at: chrono::Utc::now(),
        })
    }

    #[tokio::test]
    async fn unknown_group_is_rejected_before_any_fetch() {
        let provider = NyctProvider::new(empty_tables(), &Config::default()).unwrap();

        let err = provider
            .fetch_feed("unknown-group", &FetchOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, FeedError::UnknownGroup(_)));

        let err = provider
            .arrival_board("unknown-group", "R15N", &FetchOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, FeedError::UnknownGroup(_)));
    }

    #[test]
    fn fetch_options_default_to_caching() {
        let opts = FetchOptions::default();
        assert!(opts.use_cache);
        assert!(opts.api_key.is_none());
    }
}
