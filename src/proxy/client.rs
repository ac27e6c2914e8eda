//! HTTP client for the anti-bot solver proxy.
//!
//! The solver performs the actual upstream fetch (including any challenge
//! negotiation) and hands the target response back inside a JSON envelope.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::MonitorConfig;
use crate::domain::ChannelPayload;
use crate::error::MonitorError;
use crate::proxy::html::extract_embedded_json;

/// Upstream deadline delegated to the solver, in milliseconds.
const SOLVER_MAX_TIMEOUT_MS: u64 = 60_000;

/// Command envelope posted to the solver.
#[derive(Debug, Serialize)]
struct SolverRequest {
    cmd: &'static str,
    url: String,
    #[serde(rename = "maxTimeout")]
    max_timeout: u64,
}

/// Response envelope returned by the solver.
#[derive(Debug, Deserialize)]
struct SolverEnvelope {
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    solution: Option<SolverSolution>,
}

#[derive(Debug, Deserialize)]
struct SolverSolution {
    /// The upstream body, rendered as HTML by the solver's browser.
    #[serde(default)]
    response: String,
}

/// A channel document fetched through the solver: the typed payload plus the
/// raw extracted JSON for opaque snapshot storage.
#[derive(Debug, Clone)]
pub struct FetchedChannel {
    pub payload: ChannelPayload,
    pub raw: serde_json::Value,
}

/// Client for the configured solver endpoint.
#[derive(Debug, Clone)]
pub struct SolverClient {
    http: reqwest::Client,
    solver_url: String,
    channel_endpoint: String,
}

impl SolverClient {
    /// Creates a client for the solver named in `config`.
    ///
    /// The HTTP timeout sits above the solver's own 60 s upstream deadline so
    /// the solver, not this client, decides when an upstream fetch is dead.
    #[must_use]
    pub fn new(config: &MonitorConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(75))
            .build()
            .expect("failed to build HTTP client");

        Self {
            http,
            solver_url: config.proxy_url.clone(),
            channel_endpoint: config.channel_endpoint.clone(),
        }
    }

    /// Fetches the channel document for `username` through the solver.
    ///
    /// # Errors
    ///
    /// - [`MonitorError::Transport`] when the solver is unreachable.
    /// - [`MonitorError::ProxyRejected`] on a non-ok or incomplete envelope.
    /// - [`MonitorError::PayloadInvalid`] when the envelope carries no
    ///   embedded JSON or the JSON does not decode as a channel document.
    pub async fn fetch_channel(&self, username: &str) -> Result<FetchedChannel, MonitorError> {
        let request = SolverRequest {
            cmd: "request.get",
            url: format!("{}/{}", self.channel_endpoint, username),
            max_timeout: SOLVER_MAX_TIMEOUT_MS,
        };

        let body = self
            .http
            .post(&self.solver_url)
            .json(&request)
            .send()
            .await?
            .text()
            .await?;

        decode_solver_response(&body)
    }
}

/// Decodes a solver envelope body into a [`FetchedChannel`].
///
/// Split from the HTTP call so the envelope contract is testable offline.
///
/// # Errors
///
/// See [`SolverClient::fetch_channel`].
pub(crate) fn decode_solver_response(body: &str) -> Result<FetchedChannel, MonitorError> {
    let envelope: SolverEnvelope = serde_json::from_str(body)
        .map_err(|e| MonitorError::ProxyRejected(format!("malformed envelope: {e}")))?;

    if envelope.status != "ok" {
        return Err(MonitorError::ProxyRejected(envelope.message));
    }

    let solution = envelope
        .solution
        .ok_or_else(|| MonitorError::ProxyRejected("envelope missing solution".to_string()))?;

    let json = extract_embedded_json(&solution.response)?;
    let raw: serde_json::Value = serde_json::from_str(&json)?;
    let payload: ChannelPayload = serde_json::from_value(raw.clone())?;

    Ok(FetchedChannel { payload, raw })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(response_html: &str) -> String {
        serde_json::json!({
            "status": "ok",
            "message": "",
            "solution": {
                "url": "https://example.invalid/api/v2/channels/examplestreamer",
                "status": 200,
                "response": response_html
            },
            "startTimestamp": 1_714_564_800_000_i64,
            "endTimestamp": 1_714_564_803_000_i64,
            "version": "3.3.21"
        })
        .to_string()
    }

    #[test]
    fn ok_envelope_decodes_channel() {
        let html = r#"<html><body><pre>{"id": 75062, "slug": "examplestreamer", "followers_count": 10}</pre></body></html>"#;
        let fetched = decode_solver_response(&envelope(html)).expect("decode");
        assert_eq!(fetched.payload.id, 75062);
        assert_eq!(fetched.payload.followers_count, 10);
        assert_eq!(fetched.raw["slug"], "examplestreamer");
    }

    #[test]
    fn non_ok_status_is_rejected_with_message() {
        let body = serde_json::json!({
            "status": "error",
            "message": "challenge failed"
        })
        .to_string();
        match decode_solver_response(&body) {
            Err(MonitorError::ProxyRejected(msg)) => assert_eq!(msg, "challenge failed"),
            other => panic!("expected ProxyRejected, got {other:?}"),
        }
    }

    #[test]
    fn malformed_envelope_is_rejected() {
        assert!(matches!(
            decode_solver_response("not json at all"),
            Err(MonitorError::ProxyRejected(_))
        ));
    }

    #[test]
    fn envelope_without_json_body_is_payload_invalid() {
        let html = "<html><body><h1>Access denied</h1></body></html>";
        assert!(matches!(
            decode_solver_response(&envelope(html)),
            Err(MonitorError::PayloadInvalid(_))
        ));
    }
}
