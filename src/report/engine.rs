//! Report generation: data pulls, metric aggregation, and persistence.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinSet;

use super::bursts;
use super::metrics::ReportMetrics;
use super::series;
use super::ReportOptions;
use crate::domain::{ReportId, SpamReportId};
use crate::error::MonitorError;
use crate::persistence::models::{ChatEvent, LivestreamReport, SpamReport};
use crate::persistence::MonitorStore;

/// Generates and persists the authenticity report for one livestream.
///
/// Reads a snapshot of the livestream's chat events and viewer snapshots,
/// computes the time-series and spam signals, then writes the spam report,
/// the livestream report, the back-link between them, and the profile
/// report-list append — in that order. Failures in the back-link or the
/// profile append are logged and absorbed; earlier rows stay in place.
///
/// # Errors
///
/// - [`MonitorError::NoData`] when the livestream has no chat events.
/// - [`MonitorError::NotFound`] when no monitored channel owns it.
/// - [`MonitorError::Persistence`] when a data pull or one of the first two
///   writes fails.
pub async fn generate_report(
    store: &MonitorStore,
    livestream_id: i64,
    opts: &ReportOptions,
) -> Result<ReportId, MonitorError> {
    let channel = store
        .channel_for_livestream(livestream_id)
        .await?
        .ok_or_else(|| {
            MonitorError::NotFound(format!("no monitored channel for livestream {livestream_id}"))
        })?;

    let Some((min_sent_at, max_sent_at)) = store.chat_event_time_range(livestream_id).await?
    else {
        return Err(MonitorError::NoData(livestream_id));
    };

    let stream_start = store.earliest_livestream_start(livestream_id).await?;
    let window = series::report_window(min_sent_at, max_sent_at, stream_start, opts.message_block);

    let events = store.chat_events_for_livestream(livestream_id).await?;
    if events.is_empty() {
        return Err(MonitorError::NoData(livestream_id));
    }

    let snapshots = store
        .livestream_snapshots_between(
            channel.channel_id,
            window.start - opts.viewer_block,
            window.end + opts.viewer_block,
        )
        .await?;

    tracing::debug!(
        livestream_id,
        events = events.len(),
        snapshots = snapshots.len(),
        "report inputs fetched"
    );

    let metrics = aggregate_metrics(&events, opts).await?;
    let total_messages = events.len() as i64;
    let unique_chatters = metrics.unique_chatters.len() as i64;

    let viewer_series = series::build_viewer_series(&snapshots, &window, opts.viewer_block);
    let message_series = series::build_message_series(&events, &window, opts.message_block);
    let stats = series::viewer_stats(&snapshots);
    let hours_watched = series::watch_hours(&viewer_series);

    let engagement_pct = if stats.average > 0 {
        unique_chatters as f64 / stats.average as f64 * 100.0
    } else {
        0.0
    };

    let findings = bursts::detect(&events, opts);

    let title = match store.latest_session_title(livestream_id).await {
        Ok(title) => title.unwrap_or_default(),
        Err(err) => {
            tracing::warn!(livestream_id, %err, "failed to fetch session title");
            String::new()
        }
    };

    let now = Utc::now();
    let spam = SpamReport {
        id: SpamReportId::new(),
        livestream_report_id: None,
        channel_id: channel.channel_id,
        livestream_id,
        messages_with_emotes: metrics.messages_with_emotes,
        messages_multi_emote_only: metrics.messages_multi_emote_only,
        duplicate_messages_count: metrics.duplicate_count(),
        repetitive_phrases_count: 0,
        exact_duplicate_bursts: to_json_list(&findings.exact_duplicate_bursts, "exact bursts"),
        similar_message_bursts: to_json_list(&findings.similar_message_bursts, "similar bursts"),
        suspicious_chatters: to_json_list(&findings.suspicious_chatters, "suspicious chatters"),
        created_at: now,
    };
    store.insert_spam_report(&spam).await?;

    let report = LivestreamReport {
        id: ReportId::new(),
        livestream_id,
        channel_id: channel.channel_id,
        username: channel.username.clone(),
        title,
        window_start: window.start,
        window_end: window.end,
        duration_minutes: window.duration_minutes(),
        avg_viewers: stats.average,
        peak_viewers: stats.peak,
        lowest_viewers: stats.lowest,
        engagement_pct,
        hours_watched,
        total_messages,
        unique_chatters,
        messages_from_apps: metrics.messages_from_apps,
        spam_report_id: Some(spam.id),
        viewer_series: to_json_list(&viewer_series, "viewer series"),
        message_series: to_json_list(&message_series, "message series"),
        created_at: now,
    };
    store.insert_livestream_report(&report).await?;

    if let Err(err) = store.link_spam_report(spam.id, report.id).await {
        tracing::warn!(
            spam_report = %spam.id,
            report = %report.id,
            %err,
            "failed to back-link spam report"
        );
    }

    if let Err(err) = store
        .append_profile_report_id(channel.channel_id, report.id)
        .await
    {
        tracing::warn!(
            channel_id = channel.channel_id,
            report = %report.id,
            %err,
            "failed to append report to streamer profile"
        );
    }

    tracing::info!(livestream_id, report = %report.id, "livestream report generated");
    Ok(report.id)
}

/// Drains the event list through a bounded worker pool, accumulating the
/// independent per-message counters under a shared mutex.
async fn aggregate_metrics(
    events: &[ChatEvent],
    opts: &ReportOptions,
) -> Result<ReportMetrics, MonitorError> {
    let metrics = Arc::new(Mutex::new(ReportMetrics::new()));
    let app_senders = Arc::new(opts.app_senders.clone());

    let workers = opts.workers.max(1);
    let chunk_size = events.len().div_ceil(workers);

    let mut set = JoinSet::new();
    for chunk in events.chunks(chunk_size) {
        let chunk: Vec<(String, String)> = chunk
            .iter()
            .map(|e| (e.sender_handle.clone(), e.body.clone()))
            .collect();
        let metrics = Arc::clone(&metrics);
        let app_senders: Arc<HashSet<String>> = Arc::clone(&app_senders);

        set.spawn(async move {
            for (handle, body) in &chunk {
                let mut guard = metrics.lock().await;
                guard.observe(handle, body, &app_senders);
            }
        });
    }
    while set.join_next().await.is_some() {}

    Arc::try_unwrap(metrics)
        .map(Mutex::into_inner)
        .map_err(|_| MonitorError::Internal("metrics still shared after join".to_string()))
}

/// Serialises an opaque list column, logging and substituting `[]` when
/// encoding fails.
fn to_json_list<T: Serialize>(items: &[T], what: &str) -> serde_json::Value {
    serde_json::to_value(items).unwrap_or_else(|err| {
        tracing::warn!(what, %err, "failed to encode list; storing empty");
        serde_json::Value::Array(Vec::new())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeDelta, TimeZone};
    use uuid::Uuid;

    fn t(offset_secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() + TimeDelta::seconds(offset_secs)
    }

    fn event(handle: &str, body: &str, sent_at: DateTime<Utc>) -> ChatEvent {
        ChatEvent {
            id: Uuid::new_v4(),
            chatroom_id: 75033,
            livestream_id: Some(9),
            sender_id: 101,
            sender_handle: handle.to_string(),
            event_tag: "App\\Events\\ChatMessageEvent".to_string(),
            body: body.to_string(),
            metadata: serde_json::Value::Null,
            sent_at,
            stored_at: sent_at,
        }
    }

    #[tokio::test]
    async fn worker_pool_aggregation_matches_sequential() {
        let events: Vec<ChatEvent> = (0..40)
            .map(|k| {
                event(
                    if k % 2 == 0 { "alice" } else { "botrix" },
                    if k % 4 == 0 { "GG" } else { "hello there" },
                    t(k),
                )
            })
            .collect();

        let opts = ReportOptions::default();
        let pooled = aggregate_metrics(&events, &opts).await.expect("aggregate");

        let mut sequential = ReportMetrics::new();
        for e in &events {
            sequential.observe(&e.sender_handle, &e.body, &opts.app_senders);
        }

        assert_eq!(pooled.unique_chatters, sequential.unique_chatters);
        assert_eq!(pooled.messages_from_apps, sequential.messages_from_apps);
        assert_eq!(pooled.duplicate_count(), sequential.duplicate_count());
    }

    #[test]
    fn json_list_encoding_is_lossless() {
        let series = vec![
            series::TimelinePoint { time: t(0), count: 3 },
            series::TimelinePoint { time: t(120), count: 5 },
        ];
        let value = to_json_list(&series, "viewer series");
        let back: Vec<series::TimelinePoint> =
            serde_json::from_value(value).expect("round trip");
        assert_eq!(back, series);
    }
}
