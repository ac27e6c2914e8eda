//! Channel-monitor supervisor.
//!
//! Owns the per-channel task pairs (poller + chat subscriber). At startup it
//! scans all active channels and launches a monitor for each; at runtime it
//! services the add-or-reactivate command and stops monitors for channels
//! that get deactivated.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use crate::config::MonitorConfig;
use crate::domain::LiveRegistry;
use crate::error::MonitorError;
use crate::monitor::{chat, poller, MonitorContext};
use crate::persistence::models::MonitoredChannel;
use crate::persistence::MonitorStore;
use crate::proxy::SolverClient;

/// Running tasks of one channel monitor.
#[derive(Debug)]
struct ChannelTasks {
    shutdown: watch::Sender<bool>,
    poller: JoinHandle<()>,
    chat: JoinHandle<()>,
}

/// Launches and supervises per-channel monitors.
#[derive(Debug)]
pub struct Supervisor {
    store: Arc<MonitorStore>,
    registry: Arc<LiveRegistry>,
    solver: Arc<SolverClient>,
    config: Arc<MonitorConfig>,
    running: Mutex<HashMap<i64, ChannelTasks>>,
}

impl Supervisor {
    /// Creates a supervisor over the shared collaborators.
    #[must_use]
    pub fn new(
        store: Arc<MonitorStore>,
        registry: Arc<LiveRegistry>,
        solver: Arc<SolverClient>,
        config: Arc<MonitorConfig>,
    ) -> Self {
        Self {
            store,
            registry,
            solver,
            config,
            running: Mutex::new(HashMap::new()),
        }
    }

    /// Loads all active channels and launches a monitor for each.
    /// Returns how many monitors were started.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Persistence`] when the channel scan fails.
    pub async fn start_active_channels(&self) -> Result<usize, MonitorError> {
        let channels = self.store.active_channels().await?;
        let count = channels.len();
        for channel in channels {
            self.launch(channel).await;
        }
        Ok(count)
    }

    /// Starts the poller and chat subscriber for a channel. No-op when the
    /// channel already has running tasks.
    pub async fn launch(&self, channel: MonitoredChannel) {
        let mut running = self.running.lock().await;
        if running.contains_key(&channel.channel_id) {
            tracing::debug!(channel = %channel.username, "monitor already running");
            return;
        }

        tracing::info!(
            channel = %channel.username,
            channel_id = channel.channel_id,
            chatroom_id = channel.chatroom_id,
            "starting channel monitor"
        );

        self.registry.reset(channel.channel_id).await;

        let ctx = MonitorContext {
            store: Arc::clone(&self.store),
            registry: Arc::clone(&self.registry),
            solver: Arc::clone(&self.solver),
            config: Arc::clone(&self.config),
        };

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let poller_handle = tokio::spawn(poller::run(
            ctx.clone(),
            channel.clone(),
            shutdown_rx.clone(),
        ));
        let chat_handle = tokio::spawn(chat::run(ctx, channel.clone(), shutdown_rx));

        running.insert(
            channel.channel_id,
            ChannelTasks {
                shutdown: shutdown_tx,
                poller: poller_handle,
                chat: chat_handle,
            },
        );
    }

    /// Signals a channel's tasks to stop. In-flight persistence completes;
    /// the tasks exit at their next suspension point.
    pub async fn stop(&self, channel_id: i64) {
        let mut running = self.running.lock().await;
        if let Some(tasks) = running.remove(&channel_id) {
            tracing::info!(channel_id, "stopping channel monitor");
            let _ = tasks.shutdown.send(true);
        }
    }

    /// Whether a channel currently has running monitor tasks.
    pub async fn is_running(&self, channel_id: i64) -> bool {
        self.running.lock().await.contains_key(&channel_id)
    }

    /// Adds a new monitored channel or updates an existing one's active
    /// flag, launching or stopping its monitor accordingly.
    ///
    /// Returns the (possibly updated) channel row and whether it was newly
    /// inserted.
    ///
    /// # Errors
    ///
    /// - [`MonitorError::ProxyRejected`] / [`MonitorError::PayloadInvalid`]
    ///   when the upstream fetch for a new channel fails.
    /// - [`MonitorError::Conflict`] when the channel was inserted
    ///   concurrently.
    /// - [`MonitorError::Persistence`] on database failure.
    pub async fn add_or_reactivate(
        &self,
        username: &str,
        is_active: bool,
    ) -> Result<(MonitoredChannel, bool), MonitorError> {
        if let Some(mut channel) = self.store.channel_by_username(username).await? {
            if channel.is_active != is_active {
                self.store
                    .set_channel_active(channel.channel_id, is_active)
                    .await?;
                channel.is_active = is_active;
                channel.updated_at = Utc::now();

                if is_active {
                    self.launch(channel.clone()).await;
                } else {
                    self.stop(channel.channel_id).await;
                }
            }
            return Ok((channel, false));
        }

        // Unknown channel: resolve its platform ids through the solver.
        let fetched = self.solver.fetch_channel(username).await?;
        let chatroom = fetched.payload.chatroom.as_ref().ok_or_else(|| {
            MonitorError::PayloadInvalid(format!("channel {username} payload has no chatroom"))
        })?;

        // A concurrent request may have inserted the row while we fetched.
        if self
            .store
            .channel_by_id(fetched.payload.id)
            .await?
            .is_some()
        {
            return Err(MonitorError::Conflict(format!(
                "channel {username} was added concurrently"
            )));
        }

        let now = Utc::now();
        let channel = MonitoredChannel {
            channel_id: fetched.payload.id,
            chatroom_id: chatroom.id,
            username: username.to_string(),
            is_active,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_channel(&channel).await?;
        tracing::info!(
            channel = %channel.username,
            channel_id = channel.channel_id,
            is_active,
            "monitored channel added"
        );

        if is_active {
            self.launch(channel.clone()).await;
        }

        Ok((channel, true))
    }
}
