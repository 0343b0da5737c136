//! handyhub-ports - 抽象 trait 层
//!
//! 定义所有基础设施的抽象接口

mod query;
mod realtime;
mod repository;

pub use query::*;
pub use realtime::*;
pub use repository::*;
