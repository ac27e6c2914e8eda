//! # streamlens
//!
//! Livestream telemetry monitor and chat-authenticity report engine.
//!
//! Per monitored channel the service runs a periodic snapshot poller (through
//! an anti-bot solver proxy) and a long-lived chat subscription over a
//! Pusher-compatible transport, persisting everything it observes. On demand
//! it assembles the persisted chat events and viewer snapshots of a
//! livestream into an authenticity report: viewer/message time-series,
//! burst-based spam signals, and a suspicious-chatter roster.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── REST Handlers (api/)
//!     │
//!     ├── Supervisor (service/)
//!     │       ├── Poller ── SolverClient (proxy/)
//!     │       └── Chat subscriber ── Pusher transport (monitor/)
//!     │
//!     ├── LiveRegistry (domain/)
//!     ├── Report engine (report/)
//!     │
//!     └── PostgreSQL persistence (persistence/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod monitor;
pub mod persistence;
pub mod proxy;
pub mod report;
pub mod service;
pub mod text;
