//! Database row models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{ReportId, SpamReportId};

/// A row from the `monitored_channels` table.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct MonitoredChannel {
    /// Platform channel identifier (external, unique).
    pub channel_id: i64,
    /// Platform chatroom identifier (external, unique).
    pub chatroom_id: i64,
    pub username: String,
    pub is_active: bool,
    #[schema(value_type = String)]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String)]
    pub updated_at: DateTime<Utc>,
}

/// A raw channel document captured by one poll, from `channel_snapshots`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct ChannelSnapshot {
    pub id: Uuid,
    pub channel_id: i64,
    /// The full upstream channel document, opaque.
    #[schema(value_type = Object)]
    pub raw_json: serde_json::Value,
    #[schema(value_type = String)]
    pub captured_at: DateTime<Utc>,
}

/// One captured reading of a live broadcast, from `livestream_snapshots`.
///
/// Identity is the `(channel_id, livestream_id, captured_at)` triple.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct LivestreamSnapshot {
    pub channel_id: i64,
    pub livestream_id: i64,
    pub slug: String,
    #[schema(value_type = String)]
    pub start_time: DateTime<Utc>,
    pub session_title: String,
    pub viewer_count: i32,
    #[schema(value_type = String)]
    pub livestream_created_at: DateTime<Utc>,
    #[schema(value_type = Object)]
    pub tags: serde_json::Value,
    pub is_live: bool,
    pub duration_seconds: i32,
    pub lang_iso: String,
    #[schema(value_type = String)]
    pub captured_at: DateTime<Utc>,
}

/// A persisted chat message, from `chat_events`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ChatEvent {
    /// Message UUID supplied by the platform.
    pub id: Uuid,
    pub chatroom_id: i64,
    /// Set only when the registry deemed a broadcast current at ingest time.
    pub livestream_id: Option<i64>,
    pub sender_id: i64,
    /// Sender handle (URL slug); reports key chatters on this.
    pub sender_handle: String,
    /// Transport event tag the message arrived under.
    pub event_tag: String,
    pub body: String,
    pub metadata: serde_json::Value,
    /// Original send time, from the platform.
    pub sent_at: DateTime<Utc>,
    /// When this row was written.
    pub stored_at: DateTime<Utc>,
}

/// An authenticity report for one livestream, from `livestream_reports`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct LivestreamReport {
    #[schema(value_type = String)]
    pub id: ReportId,
    pub livestream_id: i64,
    pub channel_id: i64,
    pub username: String,
    pub title: String,
    #[schema(value_type = String)]
    pub window_start: DateTime<Utc>,
    #[schema(value_type = String)]
    pub window_end: DateTime<Utc>,
    pub duration_minutes: i64,
    pub avg_viewers: i64,
    pub peak_viewers: i64,
    pub lowest_viewers: i64,
    pub engagement_pct: f64,
    pub hours_watched: f64,
    pub total_messages: i64,
    pub unique_chatters: i64,
    pub messages_from_apps: i64,
    #[schema(value_type = Option<String>)]
    pub spam_report_id: Option<SpamReportId>,
    #[schema(value_type = Object)]
    pub viewer_series: serde_json::Value,
    #[schema(value_type = Object)]
    pub message_series: serde_json::Value,
    #[schema(value_type = String)]
    pub created_at: DateTime<Utc>,
}

/// Spam signals for one livestream report, from `spam_reports`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct SpamReport {
    #[schema(value_type = String)]
    pub id: SpamReportId,
    /// Back-patched after the livestream report row exists.
    #[schema(value_type = Option<String>)]
    pub livestream_report_id: Option<ReportId>,
    pub channel_id: i64,
    pub livestream_id: i64,
    pub messages_with_emotes: i64,
    pub messages_multi_emote_only: i64,
    pub duplicate_messages_count: i64,
    pub repetitive_phrases_count: i64,
    #[schema(value_type = Object)]
    pub exact_duplicate_bursts: serde_json::Value,
    #[schema(value_type = Object)]
    pub similar_message_bursts: serde_json::Value,
    #[schema(value_type = Object)]
    pub suspicious_chatters: serde_json::Value,
    #[schema(value_type = String)]
    pub created_at: DateTime<Utc>,
}

/// Aggregated per-channel profile, from `streamer_profiles`.
///
/// Exactly one row per monitored channel.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct StreamerProfile {
    pub channel_id: i64,
    pub username: String,
    pub verified: bool,
    pub is_banned: bool,
    pub vod_enabled: bool,
    pub is_affiliate: bool,
    pub subscription_enabled: bool,
    /// Opaque list of `{time, count}` follower readings.
    #[schema(value_type = Object)]
    pub followers_series: serde_json::Value,
    /// Opaque ordered list of livestream report ids.
    #[schema(value_type = Object)]
    pub livestream_report_ids: serde_json::Value,
    pub bio: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub tiktok: String,
    pub discord: String,
    pub twitter: String,
    pub youtube: String,
    pub facebook: String,
    pub instagram: String,
    pub profile_pic: String,
    #[schema(value_type = String)]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String)]
    pub updated_at: DateTime<Utc>,
}

/// A single point of a streamer's followers time-series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FollowerPoint {
    pub time: DateTime<Utc>,
    pub count: i64,
}
