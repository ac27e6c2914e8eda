//! Streamer profile reads.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};

use crate::app_state::AppState;
use crate::error::{ErrorResponse, MonitorError};
use crate::persistence::models::StreamerProfile;

/// `GET /profiles/:username` — Aggregated profile of one streamer.
///
/// # Errors
///
/// Returns [`MonitorError::NotFound`] when no profile has been built yet.
#[utoipa::path(
    get,
    path = "/api/v1/profiles/{username}",
    tag = "Profiles",
    summary = "Fetch a streamer profile",
    description = "Returns the aggregated profile row, including the followers time-series and the ordered livestream report id list.",
    params(("username" = String, Path, description = "Platform username")),
    responses(
        (status = 200, description = "The profile", body = StreamerProfile),
        (status = 404, description = "Profile not built yet", body = ErrorResponse),
    )
)]
pub async fn get_profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<StreamerProfile>, MonitorError> {
    state
        .store
        .profile_by_username(&username)
        .await?
        .map(Json)
        .ok_or_else(|| MonitorError::NotFound(format!("profile for {username}")))
}

/// Profile routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/profiles/{username}", get(get_profile))
}
