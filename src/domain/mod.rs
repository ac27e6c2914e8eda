//! Domain layer: upstream payload models, report identity, and the
//! live-stream state registry.

pub mod live_registry;
pub mod payload;
pub mod report_id;

pub use live_registry::{LiveRegistry, LiveStatus};
pub use payload::{ChannelPayload, ChatEventPayload, ChatFrame, LivestreamPayload, MaybeText};
pub use report_id::{ReportId, SpamReportId};
