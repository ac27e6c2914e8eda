//! REST endpoint handlers organized by resource.

pub mod channel;
pub mod profile;
pub mod report;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(channel::routes())
        .merge(report::routes())
        .merge(profile::routes())
}
