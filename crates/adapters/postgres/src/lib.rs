//! handyhub-adapter-postgres - PostgreSQL 适配器
//!
//! 聚合以 JSONB 文档形式存放在 `documents` 表中，按集合区分。

mod connection;
mod document_repository;
mod migration;

pub use connection::*;
pub use document_repository::*;
pub use migration::*;
