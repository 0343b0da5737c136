//! handyhub-bootstrap - 统一服务启动骨架
//!
//! 日志初始化、metrics 导出、HTTP 服务与优雅关闭

mod metrics;
mod runtime;
mod server;

pub use metrics::*;
pub use runtime::*;
pub use server::*;
