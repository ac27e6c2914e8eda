//! REST API layer: route handlers, DTOs, and router composition.
//!
//! Commands and reads are mounted under `/api/v1`; the health check lives
//! at the root.

pub mod dto;
pub mod handlers;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI documentation for the streamlens REST API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "streamlens",
        version = "0.1.0",
        description = "Livestream telemetry monitor and chat-authenticity report engine.",
        license(name = "MIT"),
    ),
    tags(
        (name = "System", description = "Health check"),
        (name = "Channels", description = "Monitored channel commands and reads"),
        (name = "Reports", description = "Report generation and reads"),
        (name = "Profiles", description = "Aggregated streamer profiles"),
    ),
    paths(
        handlers::system::health_handler,
        handlers::channel::add_channel,
        handlers::channel::list_channels,
        handlers::channel::channel_reports,
        handlers::channel::channel_info,
        handlers::report::generate_report,
        handlers::report::get_report,
        handlers::report::latest_livestreams,
        handlers::report::livestream_reports,
        handlers::profile::get_profile,
    ),
    components(schemas(
        crate::error::ErrorResponse,
        crate::error::ErrorBody,
        crate::persistence::models::MonitoredChannel,
        crate::persistence::models::ChannelSnapshot,
        crate::persistence::models::LivestreamSnapshot,
        crate::persistence::models::LivestreamReport,
        crate::persistence::models::SpamReport,
        crate::persistence::models::StreamerProfile,
        dto::AddChannelRequest,
        dto::GenerateReportRequest,
        dto::ReportAck,
        dto::FullReport,
    ))
)]
#[derive(Debug)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes())
}
