//! Per-channel monitoring: the periodic snapshot poller and the long-lived
//! chat subscription, plus the streamer-profile builder both feed.

pub mod chat;
pub mod poller;
pub mod profile;

use std::sync::Arc;

use chrono::TimeDelta;

use crate::config::MonitorConfig;
use crate::domain::LiveRegistry;
use crate::persistence::MonitorStore;
use crate::proxy::SolverClient;

/// Shared collaborators handed to every per-channel task.
#[derive(Debug, Clone)]
pub struct MonitorContext {
    pub store: Arc<MonitorStore>,
    pub registry: Arc<LiveRegistry>,
    pub solver: Arc<SolverClient>,
    pub config: Arc<MonitorConfig>,
}

impl MonitorContext {
    /// Maximum age of a registry entry still trusted for chat attribution:
    /// one poll interval plus the freshness leeway.
    #[must_use]
    pub fn freshness_max_age(&self) -> TimeDelta {
        TimeDelta::seconds(
            (self.config.poll_interval_secs + self.config.freshness_leeway_secs) as i64,
        )
    }
}
