//! Channel handlers: add-or-reactivate command, channel listing, and
//! per-channel report reads.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{AddChannelRequest, FullReport};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, MonitorError};
use crate::persistence::models::{ChannelSnapshot, MonitoredChannel};

/// `POST /channels` — Add a channel to monitoring or flip its active flag.
///
/// # Errors
///
/// Returns [`MonitorError`] on invalid input, upstream fetch failure, or a
/// concurrent insert.
#[utoipa::path(
    post,
    path = "/api/v1/channels",
    tag = "Channels",
    summary = "Add or reactivate a monitored channel",
    description = "Creates a monitored channel (resolving its platform ids through the solver proxy) or updates the active flag of an existing one. An activated channel gets its monitor launched immediately.",
    request_body = AddChannelRequest,
    responses(
        (status = 201, description = "Channel added", body = MonitoredChannel),
        (status = 200, description = "Existing channel updated", body = MonitoredChannel),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Channel added concurrently", body = ErrorResponse),
        (status = 502, description = "Solver proxy rejected the fetch", body = ErrorResponse),
    )
)]
pub async fn add_channel(
    State(state): State<AppState>,
    Json(req): Json<AddChannelRequest>,
) -> Result<impl IntoResponse, MonitorError> {
    let username = req.username.trim();
    if username.is_empty() {
        return Err(MonitorError::PayloadInvalid(
            "username is required".to_string(),
        ));
    }

    let (channel, created) = state
        .supervisor
        .add_or_reactivate(username, req.is_active)
        .await?;

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(channel)))
}

/// `GET /channels` — List all monitored channels.
///
/// # Errors
///
/// Returns [`MonitorError`] on database failure.
#[utoipa::path(
    get,
    path = "/api/v1/channels",
    tag = "Channels",
    summary = "List monitored channels",
    responses(
        (status = 200, description = "Monitored channels ordered by username", body = [MonitoredChannel]),
    )
)]
pub async fn list_channels(
    State(state): State<AppState>,
) -> Result<Json<Vec<MonitoredChannel>>, MonitorError> {
    state.store.all_channels().await.map(Json)
}

/// `GET /channels/:channel_id/reports` — Reports of one channel, newest
/// window first, each with its spam report attached.
///
/// # Errors
///
/// Returns [`MonitorError`] on database failure.
#[utoipa::path(
    get,
    path = "/api/v1/channels/{channel_id}/reports",
    tag = "Channels",
    summary = "List a channel's livestream reports",
    params(("channel_id" = i64, Path, description = "Platform channel identifier")),
    responses(
        (status = 200, description = "Reports ordered by window start descending", body = [FullReport]),
    )
)]
pub async fn channel_reports(
    State(state): State<AppState>,
    Path(channel_id): Path<i64>,
) -> Result<Json<Vec<FullReport>>, MonitorError> {
    let reports = state.store.reports_for_channel(channel_id).await?;
    Ok(Json(super::report::with_spam_reports(&state, reports).await))
}

/// `GET /channels/:channel_id/info` — The most recent raw channel snapshot.
///
/// # Errors
///
/// Returns [`MonitorError::NotFound`] when no snapshot has been captured
/// yet.
#[utoipa::path(
    get,
    path = "/api/v1/channels/{channel_id}/info",
    tag = "Channels",
    summary = "Latest channel snapshot",
    description = "Returns the most recently captured raw channel document for a channel.",
    params(("channel_id" = i64, Path, description = "Platform channel identifier")),
    responses(
        (status = 200, description = "The latest snapshot", body = ChannelSnapshot),
        (status = 404, description = "No snapshot captured yet", body = ErrorResponse),
    )
)]
pub async fn channel_info(
    State(state): State<AppState>,
    Path(channel_id): Path<i64>,
) -> Result<Json<ChannelSnapshot>, MonitorError> {
    state
        .store
        .latest_channel_snapshot(channel_id)
        .await?
        .map(Json)
        .ok_or_else(|| MonitorError::NotFound(format!("no snapshots for channel {channel_id}")))
}

/// Channel routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/channels", post(add_channel).get(list_channels))
        .route("/channels/{channel_id}/reports", get(channel_reports))
        .route("/channels/{channel_id}/info", get(channel_info))
}
