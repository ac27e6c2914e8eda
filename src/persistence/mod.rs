//! Persistence layer: typed reads and writes for monitored channels,
//! snapshots, chat events, reports, and streamer profiles.
//!
//! Pure CRUD surface — no business logic. The concrete implementation uses
//! `sqlx::PgPool` for async PostgreSQL access; JSONB columns cross the
//! boundary as `serde_json::Value`.

pub mod models;
pub mod postgres;

pub use postgres::MonitorStore;
