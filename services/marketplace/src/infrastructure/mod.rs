//! 基础设施层

pub mod persistence;
pub mod realtime_hub;

pub use persistence::Storage;
pub use realtime_hub::{RealtimeHub, Subscription};
