//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::config::MonitorConfig;
use crate::persistence::MonitorStore;
use crate::service::Supervisor;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Channel-monitor supervisor for commands.
    pub supervisor: Arc<Supervisor>,
    /// Persistence gateway for read endpoints.
    pub store: Arc<MonitorStore>,
    /// Process-wide configuration.
    pub config: Arc<MonitorConfig>,
}
