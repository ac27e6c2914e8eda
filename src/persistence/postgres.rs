//! PostgreSQL implementation of the persistence layer.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::models::{
    ChannelSnapshot, ChatEvent, LivestreamReport, LivestreamSnapshot, MonitoredChannel,
    SpamReport, StreamerProfile,
};
use crate::domain::{ReportId, SpamReportId};
use crate::error::MonitorError;

/// PostgreSQL-backed store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct MonitorStore {
    pool: PgPool,
}

/// Categorises a driver error into the service taxonomy: unique violations
/// become `Conflict`, missing rows `NotFound`, everything else `Persistence`.
fn map_db_err(err: sqlx::Error) -> MonitorError {
    match &err {
        sqlx::Error::RowNotFound => MonitorError::NotFound("row not found".to_string()),
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            MonitorError::Conflict(db.to_string())
        }
        _ => MonitorError::Persistence(err.to_string()),
    }
}

impl MonitorStore {
    /// Creates a store over the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // --- monitored channels -------------------------------------------------

    /// Looks up a monitored channel by username.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Persistence`] on database failure.
    pub async fn channel_by_username(
        &self,
        username: &str,
    ) -> Result<Option<MonitoredChannel>, MonitorError> {
        sqlx::query_as::<_, MonitoredChannel>(
            "SELECT channel_id, chatroom_id, username, is_active, created_at, updated_at \
             FROM monitored_channels WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)
    }

    /// Looks up a monitored channel by its platform channel id.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Persistence`] on database failure.
    pub async fn channel_by_id(
        &self,
        channel_id: i64,
    ) -> Result<Option<MonitoredChannel>, MonitorError> {
        sqlx::query_as::<_, MonitoredChannel>(
            "SELECT channel_id, chatroom_id, username, is_active, created_at, updated_at \
             FROM monitored_channels WHERE channel_id = $1",
        )
        .bind(channel_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)
    }

    /// Inserts a new monitored channel row.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Conflict`] when the channel, chatroom, or
    /// username already exists; [`MonitorError::Persistence`] otherwise.
    pub async fn insert_channel(&self, channel: &MonitoredChannel) -> Result<(), MonitorError> {
        sqlx::query(
            "INSERT INTO monitored_channels \
             (channel_id, chatroom_id, username, is_active, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(channel.channel_id)
        .bind(channel.chatroom_id)
        .bind(&channel.username)
        .bind(channel.is_active)
        .bind(channel.created_at)
        .bind(channel.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(())
    }

    /// Flips the `is_active` flag of a channel.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::NotFound`] when the channel does not exist,
    /// [`MonitorError::Persistence`] on other failures.
    pub async fn set_channel_active(
        &self,
        channel_id: i64,
        is_active: bool,
    ) -> Result<(), MonitorError> {
        let result = sqlx::query(
            "UPDATE monitored_channels SET is_active = $2, updated_at = $3 WHERE channel_id = $1",
        )
        .bind(channel_id)
        .bind(is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;

        if result.rows_affected() == 0 {
            return Err(MonitorError::NotFound(format!("channel {channel_id}")));
        }
        Ok(())
    }

    /// Returns all channels currently flagged active.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Persistence`] on database failure.
    pub async fn active_channels(&self) -> Result<Vec<MonitoredChannel>, MonitorError> {
        sqlx::query_as::<_, MonitoredChannel>(
            "SELECT channel_id, chatroom_id, username, is_active, created_at, updated_at \
             FROM monitored_channels WHERE is_active = TRUE ORDER BY username ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)
    }

    /// Returns all monitored channels ordered by username.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Persistence`] on database failure.
    pub async fn all_channels(&self) -> Result<Vec<MonitoredChannel>, MonitorError> {
        sqlx::query_as::<_, MonitoredChannel>(
            "SELECT channel_id, chatroom_id, username, is_active, created_at, updated_at \
             FROM monitored_channels ORDER BY username ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)
    }

    // --- snapshots ----------------------------------------------------------

    /// Appends a raw channel snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Persistence`] on database failure.
    pub async fn insert_channel_snapshot(
        &self,
        channel_id: i64,
        raw_json: &serde_json::Value,
        captured_at: DateTime<Utc>,
    ) -> Result<Uuid, MonitorError> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO channel_snapshots (id, channel_id, raw_json, captured_at) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(id)
        .bind(channel_id)
        .bind(raw_json)
        .bind(captured_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(id)
    }

    /// Returns every channel snapshot for a channel, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Persistence`] on database failure.
    pub async fn channel_snapshots(
        &self,
        channel_id: i64,
    ) -> Result<Vec<ChannelSnapshot>, MonitorError> {
        sqlx::query_as::<_, ChannelSnapshot>(
            "SELECT id, channel_id, raw_json, captured_at FROM channel_snapshots \
             WHERE channel_id = $1 ORDER BY captured_at ASC",
        )
        .bind(channel_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)
    }

    /// Returns the most recent raw channel snapshot for a channel.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Persistence`] on database failure.
    pub async fn latest_channel_snapshot(
        &self,
        channel_id: i64,
    ) -> Result<Option<ChannelSnapshot>, MonitorError> {
        sqlx::query_as::<_, ChannelSnapshot>(
            "SELECT id, channel_id, raw_json, captured_at FROM channel_snapshots \
             WHERE channel_id = $1 ORDER BY captured_at DESC LIMIT 1",
        )
        .bind(channel_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)
    }

    /// Appends a livestream snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Persistence`] on database failure.
    pub async fn insert_livestream_snapshot(
        &self,
        snapshot: &LivestreamSnapshot,
    ) -> Result<(), MonitorError> {
        sqlx::query(
            "INSERT INTO livestream_snapshots \
             (channel_id, livestream_id, slug, start_time, session_title, viewer_count, \
              livestream_created_at, tags, is_live, duration_seconds, lang_iso, captured_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(snapshot.channel_id)
        .bind(snapshot.livestream_id)
        .bind(&snapshot.slug)
        .bind(snapshot.start_time)
        .bind(&snapshot.session_title)
        .bind(snapshot.viewer_count)
        .bind(snapshot.livestream_created_at)
        .bind(&snapshot.tags)
        .bind(snapshot.is_live)
        .bind(snapshot.duration_seconds)
        .bind(&snapshot.lang_iso)
        .bind(snapshot.captured_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(())
    }

    /// Returns the livestream snapshots of a channel captured inside
    /// `[lo, hi]`, ordered by capture time.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Persistence`] on database failure.
    pub async fn livestream_snapshots_between(
        &self,
        channel_id: i64,
        lo: DateTime<Utc>,
        hi: DateTime<Utc>,
    ) -> Result<Vec<LivestreamSnapshot>, MonitorError> {
        sqlx::query_as::<_, LivestreamSnapshot>(
            "SELECT channel_id, livestream_id, slug, start_time, session_title, viewer_count, \
                    livestream_created_at, tags, is_live, duration_seconds, lang_iso, captured_at \
             FROM livestream_snapshots \
             WHERE channel_id = $1 AND captured_at >= $2 AND captured_at <= $3 \
             ORDER BY captured_at ASC",
        )
        .bind(channel_id)
        .bind(lo)
        .bind(hi)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)
    }

    /// Returns the latest snapshot per livestream using `DISTINCT ON`,
    /// optionally restricted to one channel.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Persistence`] on database failure.
    pub async fn latest_livestream_snapshots(
        &self,
        channel_id: Option<i64>,
    ) -> Result<Vec<LivestreamSnapshot>, MonitorError> {
        let query = if channel_id.is_some() {
            "SELECT DISTINCT ON (livestream_id) channel_id, livestream_id, slug, start_time, \
                    session_title, viewer_count, livestream_created_at, tags, is_live, \
                    duration_seconds, lang_iso, captured_at \
             FROM livestream_snapshots WHERE channel_id = $1 \
             ORDER BY livestream_id, captured_at DESC"
        } else {
            "SELECT DISTINCT ON (livestream_id) channel_id, livestream_id, slug, start_time, \
                    session_title, viewer_count, livestream_created_at, tags, is_live, \
                    duration_seconds, lang_iso, captured_at \
             FROM livestream_snapshots \
             ORDER BY livestream_id, captured_at DESC"
        };

        let mut q = sqlx::query_as::<_, LivestreamSnapshot>(query);
        if let Some(id) = channel_id {
            q = q.bind(id);
        }
        q.fetch_all(&self.pool).await.map_err(map_db_err)
    }

    /// Returns the earliest recorded `start_time` for a livestream.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Persistence`] on database failure.
    pub async fn earliest_livestream_start(
        &self,
        livestream_id: i64,
    ) -> Result<Option<DateTime<Utc>>, MonitorError> {
        sqlx::query_scalar::<_, Option<DateTime<Utc>>>(
            "SELECT MIN(start_time) FROM livestream_snapshots WHERE livestream_id = $1",
        )
        .bind(livestream_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_err)
    }

    /// Returns the most recently captured session title for a livestream.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Persistence`] on database failure.
    pub async fn latest_session_title(
        &self,
        livestream_id: i64,
    ) -> Result<Option<String>, MonitorError> {
        sqlx::query_scalar::<_, String>(
            "SELECT session_title FROM livestream_snapshots \
             WHERE livestream_id = $1 ORDER BY captured_at DESC LIMIT 1",
        )
        .bind(livestream_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)
    }

    /// Finds the monitored channel that produced snapshots of a livestream.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Persistence`] on database failure.
    pub async fn channel_for_livestream(
        &self,
        livestream_id: i64,
    ) -> Result<Option<MonitoredChannel>, MonitorError> {
        sqlx::query_as::<_, MonitoredChannel>(
            "SELECT channel_id, chatroom_id, username, is_active, created_at, updated_at \
             FROM monitored_channels \
             WHERE channel_id IN \
                   (SELECT channel_id FROM livestream_snapshots WHERE livestream_id = $1) \
             LIMIT 1",
        )
        .bind(livestream_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)
    }

    // --- chat events --------------------------------------------------------

    /// Appends a chat event.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Conflict`] when the platform message id was
    /// already stored; [`MonitorError::Persistence`] otherwise.
    pub async fn insert_chat_event(&self, event: &ChatEvent) -> Result<(), MonitorError> {
        sqlx::query(
            "INSERT INTO chat_events \
             (id, chatroom_id, livestream_id, sender_id, sender_handle, event_tag, body, \
              metadata, sent_at, stored_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(event.id)
        .bind(event.chatroom_id)
        .bind(event.livestream_id)
        .bind(event.sender_id)
        .bind(&event.sender_handle)
        .bind(&event.event_tag)
        .bind(&event.body)
        .bind(&event.metadata)
        .bind(event.sent_at)
        .bind(event.stored_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(())
    }

    /// Returns every chat event attributed to a livestream, ordered by send
    /// time ascending.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Persistence`] on database failure.
    pub async fn chat_events_for_livestream(
        &self,
        livestream_id: i64,
    ) -> Result<Vec<ChatEvent>, MonitorError> {
        sqlx::query_as::<_, ChatEvent>(
            "SELECT id, chatroom_id, livestream_id, sender_id, sender_handle, event_tag, body, \
                    metadata, sent_at, stored_at \
             FROM chat_events WHERE livestream_id = $1 ORDER BY sent_at ASC",
        )
        .bind(livestream_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)
    }

    /// Returns the minimum and maximum `sent_at` of a livestream's chat
    /// events, or `None` when it has none.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Persistence`] on database failure.
    pub async fn chat_event_time_range(
        &self,
        livestream_id: i64,
    ) -> Result<Option<(DateTime<Utc>, DateTime<Utc>)>, MonitorError> {
        let (min, max) = sqlx::query_as::<_, (Option<DateTime<Utc>>, Option<DateTime<Utc>>)>(
            "SELECT MIN(sent_at), MAX(sent_at) FROM chat_events WHERE livestream_id = $1",
        )
        .bind(livestream_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_err)?;

        Ok(match (min, max) {
            (Some(lo), Some(hi)) => Some((lo, hi)),
            _ => None,
        })
    }

    // --- reports ------------------------------------------------------------

    /// Inserts a spam report row.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Persistence`] on database failure.
    pub async fn insert_spam_report(&self, report: &SpamReport) -> Result<(), MonitorError> {
        sqlx::query(
            "INSERT INTO spam_reports \
             (id, livestream_report_id, channel_id, livestream_id, messages_with_emotes, \
              messages_multi_emote_only, duplicate_messages_count, repetitive_phrases_count, \
              exact_duplicate_bursts, similar_message_bursts, suspicious_chatters, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(report.id)
        .bind(report.livestream_report_id)
        .bind(report.channel_id)
        .bind(report.livestream_id)
        .bind(report.messages_with_emotes)
        .bind(report.messages_multi_emote_only)
        .bind(report.duplicate_messages_count)
        .bind(report.repetitive_phrases_count)
        .bind(&report.exact_duplicate_bursts)
        .bind(&report.similar_message_bursts)
        .bind(&report.suspicious_chatters)
        .bind(report.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(())
    }

    /// Inserts a livestream report row.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Persistence`] on database failure.
    pub async fn insert_livestream_report(
        &self,
        report: &LivestreamReport,
    ) -> Result<(), MonitorError> {
        sqlx::query(
            "INSERT INTO livestream_reports \
             (id, livestream_id, channel_id, username, title, window_start, window_end, \
              duration_minutes, avg_viewers, peak_viewers, lowest_viewers, engagement_pct, \
              hours_watched, total_messages, unique_chatters, messages_from_apps, \
              spam_report_id, viewer_series, message_series, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, \
                     $17, $18, $19, $20)",
        )
        .bind(report.id)
        .bind(report.livestream_id)
        .bind(report.channel_id)
        .bind(&report.username)
        .bind(&report.title)
        .bind(report.window_start)
        .bind(report.window_end)
        .bind(report.duration_minutes)
        .bind(report.avg_viewers)
        .bind(report.peak_viewers)
        .bind(report.lowest_viewers)
        .bind(report.engagement_pct)
        .bind(report.hours_watched)
        .bind(report.total_messages)
        .bind(report.unique_chatters)
        .bind(report.messages_from_apps)
        .bind(report.spam_report_id)
        .bind(&report.viewer_series)
        .bind(&report.message_series)
        .bind(report.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(())
    }

    /// Back-patches the owning livestream report onto a spam report.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::NotFound`] when the spam report does not
    /// exist, [`MonitorError::Persistence`] on other failures.
    pub async fn link_spam_report(
        &self,
        spam_report_id: SpamReportId,
        report_id: ReportId,
    ) -> Result<(), MonitorError> {
        let result =
            sqlx::query("UPDATE spam_reports SET livestream_report_id = $2 WHERE id = $1")
                .bind(spam_report_id)
                .bind(report_id)
                .execute(&self.pool)
                .await
                .map_err(map_db_err)?;

        if result.rows_affected() == 0 {
            return Err(MonitorError::NotFound(format!(
                "spam report {spam_report_id}"
            )));
        }
        Ok(())
    }

    /// Returns one livestream report by id.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Persistence`] on database failure.
    pub async fn report_by_id(
        &self,
        id: ReportId,
    ) -> Result<Option<LivestreamReport>, MonitorError> {
        sqlx::query_as::<_, LivestreamReport>(
            "SELECT id, livestream_id, channel_id, username, title, window_start, window_end, \
                    duration_minutes, avg_viewers, peak_viewers, lowest_viewers, engagement_pct, \
                    hours_watched, total_messages, unique_chatters, messages_from_apps, \
                    spam_report_id, viewer_series, message_series, created_at \
             FROM livestream_reports WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)
    }

    /// Returns one spam report by id.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Persistence`] on database failure.
    pub async fn spam_report_by_id(
        &self,
        id: SpamReportId,
    ) -> Result<Option<SpamReport>, MonitorError> {
        sqlx::query_as::<_, SpamReport>(
            "SELECT id, livestream_report_id, channel_id, livestream_id, messages_with_emotes, \
                    messages_multi_emote_only, duplicate_messages_count, \
                    repetitive_phrases_count, exact_duplicate_bursts, similar_message_bursts, \
                    suspicious_chatters, created_at \
             FROM spam_reports WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)
    }

    /// Returns all livestream reports for a channel, newest window first.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Persistence`] on database failure.
    pub async fn reports_for_channel(
        &self,
        channel_id: i64,
    ) -> Result<Vec<LivestreamReport>, MonitorError> {
        sqlx::query_as::<_, LivestreamReport>(
            "SELECT id, livestream_id, channel_id, username, title, window_start, window_end, \
                    duration_minutes, avg_viewers, peak_viewers, lowest_viewers, engagement_pct, \
                    hours_watched, total_messages, unique_chatters, messages_from_apps, \
                    spam_report_id, viewer_series, message_series, created_at \
             FROM livestream_reports WHERE channel_id = $1 ORDER BY window_start DESC",
        )
        .bind(channel_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)
    }

    /// Returns all reports generated for a livestream, newest window first.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Persistence`] on database failure.
    pub async fn reports_for_livestream(
        &self,
        livestream_id: i64,
    ) -> Result<Vec<LivestreamReport>, MonitorError> {
        sqlx::query_as::<_, LivestreamReport>(
            "SELECT id, livestream_id, channel_id, username, title, window_start, window_end, \
                    duration_minutes, avg_viewers, peak_viewers, lowest_viewers, engagement_pct, \
                    hours_watched, total_messages, unique_chatters, messages_from_apps, \
                    spam_report_id, viewer_series, message_series, created_at \
             FROM livestream_reports WHERE livestream_id = $1 ORDER BY window_start DESC",
        )
        .bind(livestream_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)
    }

    /// Returns the ids of a channel's reports ordered by window start
    /// ascending.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Persistence`] on database failure.
    pub async fn report_ids_for_channel(
        &self,
        channel_id: i64,
    ) -> Result<Vec<ReportId>, MonitorError> {
        sqlx::query_scalar::<_, ReportId>(
            "SELECT id FROM livestream_reports WHERE channel_id = $1 ORDER BY window_start ASC",
        )
        .bind(channel_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)
    }

    // --- streamer profiles --------------------------------------------------

    /// Inserts or fully replaces the profile row for a channel.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Persistence`] on database failure.
    pub async fn upsert_streamer_profile(
        &self,
        profile: &StreamerProfile,
    ) -> Result<(), MonitorError> {
        sqlx::query(
            "INSERT INTO streamer_profiles \
             (channel_id, username, verified, is_banned, vod_enabled, is_affiliate, \
              subscription_enabled, followers_series, livestream_report_ids, bio, city, state, \
              country, tiktok, discord, twitter, youtube, facebook, instagram, profile_pic, \
              created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, \
                     $17, $18, $19, $20, $21, $22) \
             ON CONFLICT (channel_id) DO UPDATE SET \
               username = EXCLUDED.username, \
               verified = EXCLUDED.verified, \
               is_banned = EXCLUDED.is_banned, \
               vod_enabled = EXCLUDED.vod_enabled, \
               is_affiliate = EXCLUDED.is_affiliate, \
               subscription_enabled = EXCLUDED.subscription_enabled, \
               followers_series = EXCLUDED.followers_series, \
               livestream_report_ids = EXCLUDED.livestream_report_ids, \
               bio = EXCLUDED.bio, \
               city = EXCLUDED.city, \
               state = EXCLUDED.state, \
               country = EXCLUDED.country, \
               tiktok = EXCLUDED.tiktok, \
               discord = EXCLUDED.discord, \
               twitter = EXCLUDED.twitter, \
               youtube = EXCLUDED.youtube, \
               facebook = EXCLUDED.facebook, \
               instagram = EXCLUDED.instagram, \
               profile_pic = EXCLUDED.profile_pic, \
               updated_at = EXCLUDED.updated_at",
        )
        .bind(profile.channel_id)
        .bind(&profile.username)
        .bind(profile.verified)
        .bind(profile.is_banned)
        .bind(profile.vod_enabled)
        .bind(profile.is_affiliate)
        .bind(profile.subscription_enabled)
        .bind(&profile.followers_series)
        .bind(&profile.livestream_report_ids)
        .bind(&profile.bio)
        .bind(&profile.city)
        .bind(&profile.state)
        .bind(&profile.country)
        .bind(&profile.tiktok)
        .bind(&profile.discord)
        .bind(&profile.twitter)
        .bind(&profile.youtube)
        .bind(&profile.facebook)
        .bind(&profile.instagram)
        .bind(&profile.profile_pic)
        .bind(profile.created_at)
        .bind(profile.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(())
    }

    /// Looks up a streamer profile by channel id.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Persistence`] on database failure.
    pub async fn profile_by_channel(
        &self,
        channel_id: i64,
    ) -> Result<Option<StreamerProfile>, MonitorError> {
        sqlx::query_as::<_, StreamerProfile>(
            "SELECT channel_id, username, verified, is_banned, vod_enabled, is_affiliate, \
                    subscription_enabled, followers_series, livestream_report_ids, bio, city, \
                    state, country, tiktok, discord, twitter, youtube, facebook, instagram, \
                    profile_pic, created_at, updated_at \
             FROM streamer_profiles WHERE channel_id = $1",
        )
        .bind(channel_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)
    }

    /// Looks up a streamer profile by username.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Persistence`] on database failure.
    pub async fn profile_by_username(
        &self,
        username: &str,
    ) -> Result<Option<StreamerProfile>, MonitorError> {
        sqlx::query_as::<_, StreamerProfile>(
            "SELECT channel_id, username, verified, is_banned, vod_enabled, is_affiliate, \
                    subscription_enabled, followers_series, livestream_report_ids, bio, city, \
                    state, country, tiktok, discord, twitter, youtube, facebook, instagram, \
                    profile_pic, created_at, updated_at \
             FROM streamer_profiles WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)
    }

    /// Appends a report id to a profile's ordered report list, deduplicating.
    ///
    /// Missing profile rows are tolerated: the next poll rebuilds the list
    /// from scratch anyway.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Persistence`] on database failure,
    /// [`MonitorError::PayloadInvalid`] when the stored list fails to decode.
    pub async fn append_profile_report_id(
        &self,
        channel_id: i64,
        report_id: ReportId,
    ) -> Result<(), MonitorError> {
        let Some(profile) = self.profile_by_channel(channel_id).await? else {
            tracing::warn!(channel_id, "no profile to append report id to");
            return Ok(());
        };

        let mut ids: Vec<ReportId> =
            serde_json::from_value(profile.livestream_report_ids.clone())?;
        if ids.contains(&report_id) {
            return Ok(());
        }
        ids.push(report_id);

        sqlx::query(
            "UPDATE streamer_profiles SET livestream_report_ids = $2, updated_at = $3 \
             WHERE channel_id = $1",
        )
        .bind(channel_id)
        .bind(serde_json::to_value(&ids)?)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(())
    }
}
