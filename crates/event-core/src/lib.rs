//! handyhub-event-core - 事件核心库
//!
//! DomainEvent trait、事件信封、进程内事件总线

mod domain_event;
mod event_bus;
mod event_handler;

pub use domain_event::*;
pub use event_bus::*;
pub use event_handler::*;
