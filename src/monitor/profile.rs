//! Streamer profile builder.
//!
//! Runs as a side-effect of each poll: copies the payload's scalar fields,
//! re-derives the followers time-series from every historical channel
//! snapshot, refreshes the ordered report-id list, and upserts the row.

use chrono::Utc;
use serde::Deserialize;

use crate::domain::ChannelPayload;
use crate::error::MonitorError;
use crate::persistence::models::{ChannelSnapshot, FollowerPoint, MonitoredChannel, StreamerProfile};
use crate::persistence::MonitorStore;

/// Partial decode of a stored channel snapshot; only the follower count
/// matters for the series.
#[derive(Debug, Deserialize)]
struct FollowersOnly {
    #[serde(default)]
    followers_count: i64,
}

/// Rebuilds and upserts the profile row for `channel` from `payload`.
///
/// # Errors
///
/// Returns the first persistence or encoding failure; the caller logs it.
pub async fn rebuild(
    store: &MonitorStore,
    channel: &MonitoredChannel,
    payload: &ChannelPayload,
) -> Result<(), MonitorError> {
    let existing = store.profile_by_channel(channel.channel_id).await?;
    let created_at = existing.as_ref().map_or_else(Utc::now, |p| p.created_at);

    let snapshots = store.channel_snapshots(channel.channel_id).await?;
    let followers = followers_series(&snapshots);

    let report_ids = store.report_ids_for_channel(channel.channel_id).await?;

    let user = payload.user.clone().unwrap_or_default();
    let profile = StreamerProfile {
        channel_id: channel.channel_id,
        username: channel.username.clone(),
        verified: payload.verified,
        is_banned: payload.is_banned,
        vod_enabled: payload.vod_enabled,
        is_affiliate: payload.is_affiliate,
        subscription_enabled: payload.subscription_enabled,
        followers_series: serde_json::to_value(&followers)?,
        livestream_report_ids: serde_json::to_value(&report_ids)?,
        bio: user.bio,
        city: user.city.as_text().to_string(),
        state: user.state.as_text().to_string(),
        country: user.country.as_text().to_string(),
        tiktok: user.tiktok,
        discord: user.discord,
        twitter: user.twitter,
        youtube: user.youtube,
        facebook: user.facebook,
        instagram: user.instagram,
        profile_pic: user.profile_pic,
        created_at,
        updated_at: Utc::now(),
    };

    store.upsert_streamer_profile(&profile).await?;
    tracing::debug!(
        channel = %channel.username,
        followers_points = followers.len(),
        reports = report_ids.len(),
        "streamer profile upserted"
    );
    Ok(())
}

/// Derives the followers time-series from historical snapshots, oldest
/// first. Snapshots whose raw document no longer decodes are skipped.
fn followers_series(snapshots: &[ChannelSnapshot]) -> Vec<FollowerPoint> {
    let mut series = Vec::with_capacity(snapshots.len());
    for snapshot in snapshots {
        match serde_json::from_value::<FollowersOnly>(snapshot.raw_json.clone()) {
            Ok(decoded) => series.push(FollowerPoint {
                time: snapshot.captured_at,
                count: decoded.followers_count,
            }),
            Err(err) => {
                tracing::warn!(
                    snapshot = %snapshot.id,
                    %err,
                    "undecodable channel snapshot skipped in followers series"
                );
            }
        }
    }
    series
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone};
    use uuid::Uuid;

    fn snapshot(captured_at: DateTime<Utc>, raw: serde_json::Value) -> ChannelSnapshot {
        ChannelSnapshot {
            id: Uuid::new_v4(),
            channel_id: 75062,
            raw_json: raw,
            captured_at,
        }
    }

    #[test]
    fn followers_series_tracks_snapshots_in_order() {
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2024, 5, 1, 12, 2, 0).unwrap();
        let snapshots = vec![
            snapshot(t0, serde_json::json!({"id": 75062, "followers_count": 100})),
            snapshot(t1, serde_json::json!({"id": 75062, "followers_count": 104})),
        ];

        let series = followers_series(&snapshots);
        assert_eq!(
            series,
            vec![
                FollowerPoint { time: t0, count: 100 },
                FollowerPoint { time: t1, count: 104 },
            ]
        );
    }

    #[test]
    fn missing_follower_count_defaults_to_zero() {
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let snapshots = vec![snapshot(t0, serde_json::json!({"id": 75062}))];
        let series = followers_series(&snapshots);
        assert_eq!(series, vec![FollowerPoint { time: t0, count: 0 }]);
    }

    #[test]
    fn undecodable_snapshot_is_skipped() {
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2024, 5, 1, 12, 2, 0).unwrap();
        let snapshots = vec![
            snapshot(t0, serde_json::json!("not an object")),
            snapshot(t1, serde_json::json!({"followers_count": 7})),
        ];

        let series = followers_series(&snapshots);
        assert_eq!(series, vec![FollowerPoint { time: t1, count: 7 }]);
    }
}
