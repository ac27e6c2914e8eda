//! Request and response DTOs for the REST surface.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::persistence::models::{LivestreamReport, SpamReport};

/// Body of `POST /channels`: add or reactivate a monitored channel.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AddChannelRequest {
    /// Platform username of the channel.
    pub username: String,
    /// Whether monitoring should be active.
    #[serde(default)]
    pub is_active: bool,
}

/// Body of `POST /reports`: request report generation for a livestream.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct GenerateReportRequest {
    /// Platform livestream identifier. Zero is rejected.
    #[serde(default)]
    pub livestream_id: i64,
}

/// Acknowledgement returned while a report is generated in the background.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReportAck {
    pub status: String,
    pub message: String,
}

/// A livestream report together with its spam report, when present.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FullReport {
    pub report: LivestreamReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spam_report: Option<SpamReport>,
}

/// Query parameters of `GET /livestreams/latest`.
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct LatestLivestreamsParams {
    /// Restrict to one channel.
    pub channel_id: Option<i64>,
}
