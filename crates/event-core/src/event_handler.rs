//! Event Handler 定义

use async_trait::async_trait;
use handyhub_errors::AppResult;

use crate::{DomainEvent, EventEnvelope};

/// Event Handler trait
#[async_trait]
pub trait EventHandler<E: DomainEvent>: Send + Sync {
    /// 处理器名称（用于日志）
    fn name(&self) -> &'static str;

    async fn handle(&self, envelope: &EventEnvelope<E>) -> AppResult<()>;
}
