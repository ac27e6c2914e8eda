//! Report windowing and time-series construction.

use std::collections::HashMap;

use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::persistence::models::{ChatEvent, LivestreamSnapshot};

/// One point of a viewer or message time-series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelinePoint {
    pub time: DateTime<Utc>,
    pub count: i64,
}

/// The reporting window of one livestream report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ReportWindow {
    /// Window length in whole minutes.
    #[must_use]
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

/// Floors a timestamp to a block boundary.
fn floor_to(t: DateTime<Utc>, block: TimeDelta) -> DateTime<Utc> {
    t.duration_trunc(block).unwrap_or(t)
}

/// Derives the reporting window from the chat-event time range.
///
/// `window_start = floor(min_t)` and `window_end = floor(max_t + block)`,
/// both on `message_block` boundaries. When the livestream's recorded
/// `start_time` is earlier than the derived start, it becomes the window
/// start instead.
#[must_use]
pub fn report_window(
    min_sent_at: DateTime<Utc>,
    max_sent_at: DateTime<Utc>,
    stream_start: Option<DateTime<Utc>>,
    message_block: TimeDelta,
) -> ReportWindow {
    let mut start = floor_to(min_sent_at, message_block);
    let end = floor_to(max_sent_at + message_block, message_block);

    if let Some(actual) = stream_start {
        if actual < start {
            start = actual;
        }
    }

    ReportWindow { start, end }
}

/// Builds the viewer time-series over `[window.start, window.end)` in
/// `viewer_block` intervals.
///
/// Each interval emits the last snapshot falling inside it; intervals with
/// no snapshot carry the previous value forward, or `0` before the first
/// observation.
#[must_use]
pub fn build_viewer_series(
    snapshots: &[LivestreamSnapshot],
    window: &ReportWindow,
    viewer_block: TimeDelta,
) -> Vec<TimelinePoint> {
    let mut series = Vec::new();
    let mut block_start = floor_to(window.start, viewer_block);

    while block_start < window.end {
        let block_end = block_start + viewer_block;

        let in_block = snapshots
            .iter()
            .rev()
            .find(|s| s.captured_at >= block_start && s.captured_at < block_end)
            .map(|s| i64::from(s.viewer_count));

        let count = match in_block {
            Some(count) => count,
            None => series.last().map_or(0, |p: &TimelinePoint| p.count),
        };

        series.push(TimelinePoint {
            time: block_start,
            count,
        });
        block_start = block_end;
    }

    series
}

/// Builds the message time-series: events grouped by `message_block`,
/// emitting a point (possibly zero) for every block from the window start
/// until its end.
#[must_use]
pub fn build_message_series(
    events: &[ChatEvent],
    window: &ReportWindow,
    message_block: TimeDelta,
) -> Vec<TimelinePoint> {
    let mut block_counts: HashMap<DateTime<Utc>, i64> = HashMap::new();
    for event in events {
        *block_counts
            .entry(floor_to(event.sent_at, message_block))
            .or_insert(0) += 1;
    }

    let mut series = Vec::new();
    let mut block_start = floor_to(window.start, message_block);
    while block_start < window.end {
        series.push(TimelinePoint {
            time: block_start,
            count: block_counts.get(&block_start).copied().unwrap_or(0),
        });
        block_start += message_block;
    }

    series
}

/// Viewer-count aggregates over the fetched snapshots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewerStats {
    pub average: i64,
    pub peak: i64,
    pub lowest: i64,
}

/// Computes mean (integer), peak, and lowest viewer counts; all zero when
/// there are no snapshots.
#[must_use]
pub fn viewer_stats(snapshots: &[LivestreamSnapshot]) -> ViewerStats {
    if snapshots.is_empty() {
        return ViewerStats::default();
    }

    let mut total: i64 = 0;
    let mut peak = i64::MIN;
    let mut lowest = i64::MAX;
    for snapshot in snapshots {
        let count = i64::from(snapshot.viewer_count);
        total += count;
        peak = peak.max(count);
        lowest = lowest.min(count);
    }

    ViewerStats {
        average: total / snapshots.len() as i64,
        peak,
        lowest,
    }
}

/// Approximates ∫ viewers dt over the series with a left-Riemann sum,
/// in hours. Zero when the series has fewer than two points.
#[must_use]
pub fn watch_hours(series: &[TimelinePoint]) -> f64 {
    if series.len() < 2 {
        return 0.0;
    }

    let mut total_seconds = 0.0;
    for pair in series.windows(2) {
        let dt = (pair[1].time - pair[0].time).num_seconds() as f64;
        total_seconds += pair[0].count as f64 * dt;
    }
    total_seconds / 3600.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, h, m, s).unwrap()
    }

    fn snapshot(captured_at: DateTime<Utc>, viewer_count: i32) -> LivestreamSnapshot {
        LivestreamSnapshot {
            channel_id: 75062,
            livestream_id: 9,
            slug: "weekly-show".to_string(),
            start_time: at(11, 58, 0),
            session_title: "weekly show".to_string(),
            viewer_count,
            livestream_created_at: at(11, 58, 3),
            tags: serde_json::Value::Null,
            is_live: true,
            duration_seconds: 0,
            lang_iso: "en".to_string(),
            captured_at,
        }
    }

    fn event(sent_at: DateTime<Utc>) -> ChatEvent {
        ChatEvent {
            id: Uuid::new_v4(),
            chatroom_id: 75033,
            livestream_id: Some(9),
            sender_id: 101,
            sender_handle: "alice".to_string(),
            event_tag: "App\\Events\\ChatMessageEvent".to_string(),
            body: "hi".to_string(),
            metadata: serde_json::Value::Null,
            sent_at,
            stored_at: sent_at,
        }
    }

    fn ten_min() -> TimeDelta {
        TimeDelta::minutes(10)
    }

    fn two_min() -> TimeDelta {
        TimeDelta::minutes(2)
    }

    #[test]
    fn window_floors_and_ceils_to_message_blocks() {
        let window = report_window(at(12, 3, 15), at(12, 47, 42), None, ten_min());
        assert_eq!(window.start, at(12, 0, 0));
        assert_eq!(window.end, at(12, 50, 0));
        assert_eq!(window.duration_minutes(), 50);
    }

    #[test]
    fn window_uses_earlier_stream_start() {
        let window = report_window(at(12, 3, 15), at(12, 47, 42), Some(at(11, 58, 0)), ten_min());
        assert_eq!(window.start, at(11, 58, 0));

        // A later stream start never shrinks the window.
        let window = report_window(at(12, 3, 15), at(12, 47, 42), Some(at(12, 5, 0)), ten_min());
        assert_eq!(window.start, at(12, 0, 0));
    }

    #[test]
    fn message_series_covers_every_block() {
        let window = report_window(at(12, 3, 15), at(12, 47, 42), None, ten_min());
        let events = vec![event(at(12, 3, 15)), event(at(12, 3, 20)), event(at(12, 47, 42))];

        let series = build_message_series(&events, &window, ten_min());
        let times: Vec<_> = series.iter().map(|p| p.time).collect();
        assert_eq!(
            times,
            vec![at(12, 0, 0), at(12, 10, 0), at(12, 20, 0), at(12, 30, 0), at(12, 40, 0)]
        );
        let counts: Vec<_> = series.iter().map(|p| p.count).collect();
        assert_eq!(counts, vec![2, 0, 0, 0, 1]);
    }

    #[test]
    fn viewer_series_takes_last_snapshot_per_block_and_carries_forward() {
        let window = ReportWindow {
            start: at(12, 0, 0),
            end: at(12, 10, 0),
        };
        let snapshots = vec![
            snapshot(at(12, 0, 10), 100),
            snapshot(at(12, 1, 50), 120), // same block, later: wins
            snapshot(at(12, 4, 0), 90),
        ];

        let series = build_viewer_series(&snapshots, &window, two_min());
        assert_eq!(series.len(), 5);
        assert_eq!(series[0].count, 120);
        assert_eq!(series[1].count, 120); // carried forward
        assert_eq!(series[2].count, 90);
        assert_eq!(series[3].count, 90);
        assert_eq!(series[4].count, 90);
    }

    #[test]
    fn viewer_series_is_zero_before_first_observation() {
        let window = ReportWindow {
            start: at(12, 0, 0),
            end: at(12, 6, 0),
        };
        let snapshots = vec![snapshot(at(12, 4, 30), 55)];

        let series = build_viewer_series(&snapshots, &window, two_min());
        let counts: Vec<_> = series.iter().map(|p| p.count).collect();
        assert_eq!(counts, vec![0, 0, 55]);
    }

    #[test]
    fn viewer_series_length_matches_window() {
        let window = report_window(at(12, 3, 15), at(12, 47, 42), None, ten_min());
        let series = build_viewer_series(&[], &window, two_min());

        let expected = ((window.end - window.start).num_seconds() as f64
            / two_min().num_seconds() as f64)
            .ceil() as usize;
        assert_eq!(series.len(), expected);
        assert!(series.iter().all(|p| p.count == 0));
        assert!(series.windows(2).all(|w| w[0].time < w[1].time));
    }

    #[test]
    fn viewer_stats_over_snapshots() {
        let snapshots = vec![
            snapshot(at(12, 0, 0), 100),
            snapshot(at(12, 2, 0), 150),
            snapshot(at(12, 4, 0), 80),
        ];
        let stats = viewer_stats(&snapshots);
        assert_eq!(stats.average, 110);
        assert_eq!(stats.peak, 150);
        assert_eq!(stats.lowest, 80);

        assert_eq!(viewer_stats(&[]), ViewerStats::default());
    }

    #[test]
    fn watch_hours_left_riemann() {
        let series = vec![
            TimelinePoint { time: at(12, 0, 0), count: 60 },
            TimelinePoint { time: at(12, 2, 0), count: 120 },
            TimelinePoint { time: at(12, 4, 0), count: 0 },
        ];
        // 60 viewers × 120 s + 120 viewers × 120 s = 21 600 viewer-seconds = 6 h
        let hours = watch_hours(&series);
        assert!((hours - 6.0).abs() < 1e-9);

        assert_eq!(watch_hours(&series[..1]), 0.0);
        assert_eq!(watch_hours(&[]), 0.0);
    }
}
