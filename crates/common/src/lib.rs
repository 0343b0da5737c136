//! handyhub-common - 通用类型和工具库

pub mod types;
pub mod utils;

pub use types::*;
