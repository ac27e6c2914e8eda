//! Service layer: channel-monitor supervision.

pub mod supervisor;

pub use supervisor::Supervisor;
