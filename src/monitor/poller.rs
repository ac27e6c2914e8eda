//! Periodic channel poller.
//!
//! Every tick fetches the channel document through the solver, appends a raw
//! snapshot, records livestream state when a broadcast is live, and rebuilds
//! the streamer profile. Per-tick failures are logged and never terminate
//! the task.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use super::{profile, MonitorContext};
use crate::domain::payload::{parse_snapshot_time, LivestreamPayload};
use crate::error::MonitorError;
use crate::persistence::models::{LivestreamSnapshot, MonitoredChannel};

/// Runs the poll loop for one channel until shutdown. The first tick fires
/// immediately.
pub async fn run(
    ctx: MonitorContext,
    channel: MonitoredChannel,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker =
        tokio::time::interval(Duration::from_secs(ctx.config.poll_interval_secs.max(1)));

    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    tracing::info!(channel = %channel.username, "poller stopping");
                    return;
                }
            }
            _ = ticker.tick() => {
                if let Err(err) = poll_once(&ctx, &channel).await {
                    tracing::warn!(channel = %channel.username, %err, "poll tick failed");
                }
            }
        }
    }
}

/// One poll: fetch, snapshot, registry stamp, profile rebuild.
async fn poll_once(ctx: &MonitorContext, channel: &MonitoredChannel) -> Result<(), MonitorError> {
    let fetched = ctx.solver.fetch_channel(&channel.username).await?;
    let now = Utc::now();

    if let Err(err) = ctx
        .store
        .insert_channel_snapshot(channel.channel_id, &fetched.raw, now)
        .await
    {
        tracing::warn!(channel = %channel.username, %err, "failed to persist channel snapshot");
    }

    match fetched.payload.livestream.as_ref() {
        Some(live) if live.is_live => {
            match build_livestream_snapshot(channel.channel_id, live, now) {
                Ok(snapshot) => match ctx.store.insert_livestream_snapshot(&snapshot).await {
                    Ok(()) => {
                        ctx.registry.mark_live(channel.channel_id, live.id, now).await;
                        tracing::debug!(
                            channel = %channel.username,
                            livestream_id = live.id,
                            viewers = live.viewer_count,
                            "livestream snapshot persisted"
                        );
                    }
                    Err(err) => {
                        tracing::warn!(
                            channel = %channel.username,
                            livestream_id = live.id,
                            %err,
                            "failed to persist livestream snapshot"
                        );
                    }
                },
                Err(err) => {
                    tracing::warn!(
                        channel = %channel.username,
                        livestream_id = live.id,
                        %err,
                        "livestream snapshot skipped"
                    );
                }
            }
        }
        _ => {
            ctx.registry.mark_offline(channel.channel_id).await;
        }
    }

    if let Err(err) = profile::rebuild(&ctx.store, channel, &fetched.payload).await {
        tracing::warn!(channel = %channel.username, %err, "streamer profile rebuild failed");
    }

    Ok(())
}

/// Assembles a [`LivestreamSnapshot`] row from the embedded livestream
/// document, parsing its platform-format timestamps.
///
/// # Errors
///
/// Returns [`MonitorError::PayloadInvalid`] when either timestamp fails to
/// parse; the snapshot is skipped in that case.
fn build_livestream_snapshot(
    channel_id: i64,
    live: &LivestreamPayload,
    captured_at: DateTime<Utc>,
) -> Result<LivestreamSnapshot, MonitorError> {
    let livestream_created_at = parse_snapshot_time(&live.created_at)?;
    let start_time = parse_snapshot_time(&live.start_time)?;

    Ok(LivestreamSnapshot {
        channel_id,
        livestream_id: live.id,
        slug: live.slug.clone(),
        start_time,
        session_title: live.session_title.clone(),
        viewer_count: live.viewer_count,
        livestream_created_at,
        tags: live.tags.clone(),
        is_live: live.is_live,
        duration_seconds: live.duration,
        lang_iso: live.lang_iso.clone(),
        captured_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn live_payload() -> LivestreamPayload {
        LivestreamPayload {
            id: 9,
            slug: "weekly-show".to_string(),
            channel_id: 75062,
            created_at: "2024-05-01 11:58:03".to_string(),
            session_title: "weekly show".to_string(),
            is_live: true,
            start_time: "2024-05-01 11:58:00".to_string(),
            duration: 0,
            language: "English".to_string(),
            is_mature: false,
            viewer_count: 532,
            lang_iso: "en".to_string(),
            tags: serde_json::json!(["irl"]),
        }
    }

    #[test]
    fn snapshot_assembles_with_parsed_timestamps() {
        let captured_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let snapshot =
            build_livestream_snapshot(75062, &live_payload(), captured_at).expect("build");

        assert_eq!(snapshot.livestream_id, 9);
        assert_eq!(
            snapshot.start_time,
            Utc.with_ymd_and_hms(2024, 5, 1, 11, 58, 0).unwrap()
        );
        assert_eq!(
            snapshot.livestream_created_at,
            Utc.with_ymd_and_hms(2024, 5, 1, 11, 58, 3).unwrap()
        );
        assert_eq!(snapshot.captured_at, captured_at);
        assert_eq!(snapshot.tags, serde_json::json!(["irl"]));
    }

    #[test]
    fn malformed_timestamp_skips_snapshot() {
        let mut live = live_payload();
        live.start_time = "not a time".to_string();

        let captured_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        assert!(matches!(
            build_livestream_snapshot(75062, &live, captured_at),
            Err(MonitorError::PayloadInvalid(_))
        ));
    }
}
