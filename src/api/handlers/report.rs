//! Report handlers: background generation command and report reads.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use uuid::Uuid;

use crate::api::dto::{FullReport, GenerateReportRequest, LatestLivestreamsParams, ReportAck};
use crate::app_state::AppState;
use crate::domain::ReportId;
use crate::error::{ErrorResponse, MonitorError};
use crate::persistence::models::{LivestreamReport, LivestreamSnapshot};
use crate::report::{self, ReportOptions};

/// Attaches each report's spam report, tolerating fetch failures.
pub(super) async fn with_spam_reports(
    state: &AppState,
    reports: Vec<LivestreamReport>,
) -> Vec<FullReport> {
    let mut full = Vec::with_capacity(reports.len());
    for report in reports {
        let spam_report = match report.spam_report_id {
            Some(spam_id) => match state.store.spam_report_by_id(spam_id).await {
                Ok(spam) => spam,
                Err(err) => {
                    tracing::warn!(report = %report.id, %err, "failed to fetch spam report");
                    None
                }
            },
            None => None,
        };
        full.push(FullReport {
            report,
            spam_report,
        });
    }
    full
}

/// `POST /reports` — Kick off report generation for a livestream.
///
/// The engine runs to completion in the background; completion status is
/// observable through the persisted rows.
///
/// # Errors
///
/// Returns [`MonitorError::PayloadInvalid`] when `livestream_id` is zero.
#[utoipa::path(
    post,
    path = "/api/v1/reports",
    tag = "Reports",
    summary = "Generate a livestream report",
    description = "Queues report generation for the given livestream and returns immediately. Completion is observable through the persisted report rows.",
    request_body = GenerateReportRequest,
    responses(
        (status = 202, description = "Generation started", body = ReportAck),
        (status = 400, description = "Invalid livestream id", body = ErrorResponse),
    )
)]
pub async fn generate_report(
    State(state): State<AppState>,
    Json(req): Json<GenerateReportRequest>,
) -> Result<impl IntoResponse, MonitorError> {
    if req.livestream_id == 0 {
        return Err(MonitorError::PayloadInvalid(
            "livestream_id is required and must be a valid id".to_string(),
        ));
    }

    let store = Arc::clone(&state.store);
    let opts = ReportOptions::from(state.config.as_ref());
    let livestream_id = req.livestream_id;

    tokio::spawn(async move {
        match report::generate_report(&store, livestream_id, &opts).await {
            Ok(report_id) => {
                tracing::info!(livestream_id, report = %report_id, "report generation finished");
            }
            Err(err) => {
                tracing::error!(livestream_id, %err, "report generation failed");
            }
        }
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(ReportAck {
            status: "processing_started".to_string(),
            message: format!("report generation initiated for livestream {livestream_id}"),
        }),
    ))
}

/// `GET /reports/:report_id` — One report with its spam report.
///
/// # Errors
///
/// Returns [`MonitorError::NotFound`] when no such report exists.
#[utoipa::path(
    get,
    path = "/api/v1/reports/{report_id}",
    tag = "Reports",
    summary = "Fetch a livestream report",
    params(("report_id" = String, Path, description = "Report UUID")),
    responses(
        (status = 200, description = "The report", body = FullReport),
        (status = 404, description = "No such report", body = ErrorResponse),
    )
)]
pub async fn get_report(
    State(state): State<AppState>,
    Path(report_id): Path<Uuid>,
) -> Result<Json<FullReport>, MonitorError> {
    let id = ReportId::from_uuid(report_id);
    let report = state
        .store
        .report_by_id(id)
        .await?
        .ok_or_else(|| MonitorError::NotFound(format!("report {report_id}")))?;

    let spam_report = match report.spam_report_id {
        Some(spam_id) => match state.store.spam_report_by_id(spam_id).await {
            Ok(spam) => spam,
            Err(err) => {
                tracing::warn!(report = %report.id, %err, "failed to fetch spam report");
                None
            }
        },
        None => None,
    };

    Ok(Json(FullReport {
        report,
        spam_report,
    }))
}

/// `GET /livestreams/:livestream_id/reports` — Reports generated for one
/// livestream, newest window first, each with its spam report attached.
///
/// # Errors
///
/// Returns [`MonitorError`] on database failure.
#[utoipa::path(
    get,
    path = "/api/v1/livestreams/{livestream_id}/reports",
    tag = "Reports",
    summary = "List a livestream's reports",
    params(("livestream_id" = i64, Path, description = "Platform livestream identifier")),
    responses(
        (status = 200, description = "Reports ordered by window start descending", body = [FullReport]),
    )
)]
pub async fn livestream_reports(
    State(state): State<AppState>,
    Path(livestream_id): Path<i64>,
) -> Result<Json<Vec<FullReport>>, MonitorError> {
    let reports = state.store.reports_for_livestream(livestream_id).await?;
    Ok(Json(with_spam_reports(&state, reports).await))
}

/// `GET /livestreams/latest` — Latest snapshot per livestream, optionally
/// restricted to one channel.
///
/// # Errors
///
/// Returns [`MonitorError`] on database failure.
#[utoipa::path(
    get,
    path = "/api/v1/livestreams/latest",
    tag = "Reports",
    summary = "Latest snapshot per livestream",
    params(LatestLivestreamsParams),
    responses(
        (status = 200, description = "Latest snapshots", body = [LivestreamSnapshot]),
    )
)]
pub async fn latest_livestreams(
    State(state): State<AppState>,
    Query(params): Query<LatestLivestreamsParams>,
) -> Result<Json<Vec<LivestreamSnapshot>>, MonitorError> {
    state
        .store
        .latest_livestream_snapshots(params.channel_id)
        .await
        .map(Json)
}

/// Report routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/reports", post(generate_report))
        .route("/reports/{report_id}", get(get_report))
        .route("/livestreams/latest", get(latest_livestreams))
        .route("/livestreams/{livestream_id}/reports", get(livestream_reports))
}
