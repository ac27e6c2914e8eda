//! Serde models for upstream platform JSON: channel payloads fetched through
//! the solver proxy and chat frames received over the push transport.
//!
//! Upstream fields that arrive dynamically typed (sometimes string, sometimes
//! null or missing) are modelled as [`MaybeText`] so unparseable content is
//! kept rather than silently discarded.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

use crate::error::MonitorError;

/// Snapshot timestamps as emitted by the platform poller API.
const SNAPSHOT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A channel document as returned by the platform channel API.
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelPayload {
    /// Platform channel identifier.
    pub id: i64,
    #[serde(default)]
    pub user_id: i64,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub is_banned: bool,
    #[serde(default)]
    pub vod_enabled: bool,
    #[serde(default)]
    pub subscription_enabled: bool,
    #[serde(default)]
    pub is_affiliate: bool,
    #[serde(default)]
    pub followers_count: i64,
    #[serde(default)]
    pub verified: bool,
    /// Present only while the channel has an associated broadcast.
    #[serde(default)]
    pub livestream: Option<LivestreamPayload>,
    #[serde(default)]
    pub chatroom: Option<ChatroomPayload>,
    #[serde(default)]
    pub user: Option<UserPayload>,
}

/// The embedded livestream document of a live channel.
#[derive(Debug, Clone, Deserialize)]
pub struct LivestreamPayload {
    /// Platform livestream identifier.
    pub id: i64,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub channel_id: i64,
    /// `"YYYY-MM-DD HH:MM:SS"`, UTC.
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub session_title: String,
    #[serde(default)]
    pub is_live: bool,
    /// `"YYYY-MM-DD HH:MM:SS"`, UTC.
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub duration: i32,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub is_mature: bool,
    #[serde(default)]
    pub viewer_count: i32,
    #[serde(default)]
    pub lang_iso: String,
    /// Kept opaque; stored verbatim alongside the snapshot.
    #[serde(default)]
    pub tags: serde_json::Value,
}

/// The embedded chatroom document; only the identifier matters here.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatroomPayload {
    pub id: i64,
    #[serde(default)]
    pub channel_id: i64,
}

/// The embedded user-profile document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPayload {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub country: MaybeText,
    #[serde(default)]
    pub state: MaybeText,
    #[serde(default)]
    pub city: MaybeText,
    #[serde(default)]
    pub instagram: String,
    #[serde(default)]
    pub twitter: String,
    #[serde(default)]
    pub youtube: String,
    #[serde(default)]
    pub discord: String,
    #[serde(default)]
    pub tiktok: String,
    #[serde(default)]
    pub facebook: String,
    #[serde(default)]
    pub profile_pic: String,
}

/// An upstream field that is sometimes a string and sometimes null, a number,
/// or absent entirely. Non-string content is retained as [`MaybeText::Unknown`].
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MaybeText {
    Text(String),
    Unknown(serde_json::Value),
}

impl MaybeText {
    /// The string content, or `""` when the upstream value was not a string.
    #[must_use]
    pub fn as_text(&self) -> &str {
        match self {
            Self::Text(s) => s,
            Self::Unknown(_) => "",
        }
    }
}

impl Default for MaybeText {
    fn default() -> Self {
        Self::Unknown(serde_json::Value::Null)
    }
}

/// A raw frame from the push-based chat transport.
///
/// `data` is itself a JSON-encoded string whose shape depends on `event`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatFrame {
    pub event: String,
    #[serde(default)]
    pub channel: String,
    #[serde(default)]
    pub data: String,
}

/// The decoded `data` payload of a chat-message event frame.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatEventPayload {
    /// Message identifier, a UUID string supplied by the platform.
    pub id: String,
    pub chatroom_id: i64,
    #[serde(default)]
    pub content: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    /// RFC 3339 with numeric offset.
    pub created_at: String,
    pub sender: ChatSender,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// The sender block of a chat-message event.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatSender {
    pub id: i64,
    #[serde(default)]
    pub username: String,
    /// URL-safe handle; this is what reports key chatters on.
    #[serde(default)]
    pub slug: String,
}

/// Parses a poller snapshot timestamp (`"YYYY-MM-DD HH:MM:SS"`, UTC).
///
/// # Errors
///
/// Returns [`MonitorError::PayloadInvalid`] on malformed input.
pub fn parse_snapshot_time(raw: &str) -> Result<DateTime<Utc>, MonitorError> {
    let naive = NaiveDateTime::parse_from_str(raw, SNAPSHOT_TIME_FORMAT)?;
    Ok(naive.and_utc())
}

/// Parses a chat event timestamp (RFC 3339 with offset), normalised to UTC.
///
/// # Errors
///
/// Returns [`MonitorError::PayloadInvalid`] on malformed input.
pub fn parse_chat_time(raw: &str) -> Result<DateTime<Utc>, MonitorError> {
    Ok(DateTime::parse_from_rfc3339(raw)?.with_timezone(&Utc))
}
