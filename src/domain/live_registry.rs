//! Process-wide current-livestream registry.
//!
//! [`LiveRegistry`] maps each monitored channel to the livestream last
//! observed by its poller, together with the observation time. The chat
//! subscriber consults it on every inbound event to decide whether the event
//! is attributable to a broadcast.
//!
//! # Concurrency
//!
//! Single `RwLock<HashMap>` with per-key last-writer-wins semantics.
//! Concurrent overwrites of the same key are expected and lossy overwrites
//! are acceptable: the next poll re-stamps the entry.

use std::collections::HashMap;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::RwLock;

/// The last livestream state observed for a channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LiveStatus {
    /// Livestream identifier; `0` when no broadcast was observed.
    pub livestream_id: i64,
    /// When the poller captured this state; `None` for a cleared entry.
    pub fetched_at: Option<DateTime<Utc>>,
    /// Whether the channel was live at `fetched_at`.
    pub is_live: bool,
}

/// Shared map of `channel_id → LiveStatus`.
#[derive(Debug, Default)]
pub struct LiveRegistry {
    channels: RwLock<HashMap<i64, LiveStatus>>,
}

impl LiveRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
        }
    }

    /// Seeds a channel with a cleared entry. Called when a monitor launches.
    pub async fn reset(&self, channel_id: i64) {
        let mut map = self.channels.write().await;
        map.insert(channel_id, LiveStatus::default());
    }

    /// Records that `channel_id` was observed live on `livestream_id`.
    pub async fn mark_live(&self, channel_id: i64, livestream_id: i64, fetched_at: DateTime<Utc>) {
        let mut map = self.channels.write().await;
        map.insert(
            channel_id,
            LiveStatus {
                livestream_id,
                fetched_at: Some(fetched_at),
                is_live: true,
            },
        );
    }

    /// Records that `channel_id` had no active broadcast.
    pub async fn mark_offline(&self, channel_id: i64) {
        let mut map = self.channels.write().await;
        map.insert(channel_id, LiveStatus::default());
    }

    /// Returns the stored status for a channel, if any.
    pub async fn status(&self, channel_id: i64) -> Option<LiveStatus> {
        let map = self.channels.read().await;
        map.get(&channel_id).copied()
    }

    /// Returns the livestream a chat event occurring at `now` should be
    /// attributed to, or `None`.
    ///
    /// An event is attributable iff the channel was last seen live and the
    /// observation is no older than `max_age` (poll interval plus freshness
    /// leeway).
    pub async fn attributable_at(
        &self,
        channel_id: i64,
        now: DateTime<Utc>,
        max_age: TimeDelta,
    ) -> Option<i64> {
        let map = self.channels.read().await;
        let status = map.get(&channel_id)?;
        let fetched_at = status.fetched_at?;
        if status.is_live && now - fetched_at <= max_age {
            Some(status.livestream_id)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn max_age() -> TimeDelta {
        // poll interval 120 s + freshness leeway 20 s
        TimeDelta::seconds(140)
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn fresh_live_entry_is_attributable() {
        let registry = LiveRegistry::new();
        registry.mark_live(75062, 9, t0()).await;

        let got = registry
            .attributable_at(75062, t0() + TimeDelta::seconds(60), max_age())
            .await;
        assert_eq!(got, Some(9));
    }

    #[tokio::test]
    async fn stale_entry_is_not_attributable() {
        let registry = LiveRegistry::new();
        registry.mark_live(75062, 9, t0()).await;

        // one second past poll interval + leeway
        let got = registry
            .attributable_at(75062, t0() + TimeDelta::seconds(141), max_age())
            .await;
        assert_eq!(got, None);
    }

    #[tokio::test]
    async fn boundary_age_is_still_attributable() {
        let registry = LiveRegistry::new();
        registry.mark_live(75062, 9, t0()).await;

        let got = registry
            .attributable_at(75062, t0() + TimeDelta::seconds(140), max_age())
            .await;
        assert_eq!(got, Some(9));
    }

    #[tokio::test]
    async fn offline_entry_is_not_attributable() {
        let registry = LiveRegistry::new();
        registry.mark_live(75062, 9, t0()).await;
        registry.mark_offline(75062).await;

        let got = registry.attributable_at(75062, t0(), max_age()).await;
        assert_eq!(got, None);
        assert_eq!(registry.status(75062).await, Some(LiveStatus::default()));
    }

    #[tokio::test]
    async fn unknown_channel_is_not_attributable() {
        let registry = LiveRegistry::new();
        let got = registry.attributable_at(1, t0(), max_age()).await;
        assert_eq!(got, None);
        assert_eq!(registry.status(1).await, None);
    }

    #[tokio::test]
    async fn last_writer_wins_on_restamp() {
        let registry = LiveRegistry::new();
        registry.mark_live(75062, 9, t0()).await;
        registry
            .mark_live(75062, 10, t0() + TimeDelta::seconds(120))
            .await;

        let got = registry
            .attributable_at(75062, t0() + TimeDelta::seconds(130), max_age())
            .await;
        assert_eq!(got, Some(10));
    }
}
