//! Report engine: per-livestream viewer/message analytics and spam signals.
//!
//! [`engine::generate_report`] assembles persisted chat events and viewer
//! snapshots into time-series, burst-based spam signals, and a
//! suspicious-chatter roster, then persists the linked report pair.

pub mod bursts;
pub mod engine;
pub mod metrics;
pub mod series;

use std::collections::HashSet;

use chrono::TimeDelta;

use crate::config::MonitorConfig;

pub use engine::generate_report;

/// Tunables for one report generation run.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Viewer time-series interval.
    pub viewer_block: TimeDelta,
    /// Message time-series interval; also the windowing granularity.
    pub message_block: TimeDelta,

    /// Exact-duplicate burst window and minimum count.
    pub exact_window: TimeDelta,
    pub exact_min_count: usize,

    /// Similar-message burst window, minimum count, and Jaccard threshold.
    pub similar_window: TimeDelta,
    pub similar_min_count: usize,
    pub similar_min_similarity: f64,

    /// Rapid-fire burst window and minimum count.
    pub rapid_window: TimeDelta,
    pub rapid_min_count: usize,

    /// Bounded fan-out for per-message analysis.
    pub workers: usize,

    /// Known chat-bot / chat-app sender handles (case-sensitive).
    pub app_senders: HashSet<String>,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            viewer_block: TimeDelta::minutes(2),
            message_block: TimeDelta::minutes(10),
            exact_window: TimeDelta::seconds(5),
            exact_min_count: 3,
            similar_window: TimeDelta::seconds(10),
            similar_min_count: 4,
            similar_min_similarity: 0.7,
            rapid_window: TimeDelta::seconds(3),
            rapid_min_count: 5,
            workers: 4,
            app_senders: ["botrix", "@fossabot", "fossabot", "kicbot"]
                .into_iter()
                .map(ToOwned::to_owned)
                .collect(),
        }
    }
}

impl From<&MonitorConfig> for ReportOptions {
    fn from(config: &MonitorConfig) -> Self {
        Self {
            viewer_block: TimeDelta::seconds(config.viewer_block_secs),
            message_block: TimeDelta::seconds(config.message_block_secs),
            exact_window: TimeDelta::seconds(config.exact_burst_window_secs),
            exact_min_count: config.exact_burst_min_count,
            similar_window: TimeDelta::seconds(config.similar_burst_window_secs),
            similar_min_count: config.similar_burst_min_count,
            similar_min_similarity: config.similar_min_similarity,
            rapid_window: TimeDelta::seconds(config.rapid_burst_window_secs),
            rapid_min_count: config.rapid_burst_min_count,
            workers: config.report_workers,
            app_senders: config.app_senders.iter().cloned().collect(),
        }
    }
}
