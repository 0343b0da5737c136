//! 进程内事件总线
//!
//! 命令成功提交后发布事件；处理器失败只记录日志，不影响命令结果。

use std::sync::Arc;

use tracing::{debug, warn};

use crate::{DomainEvent, EventEnvelope, EventHandler, EventMetadata};

/// 事件总线
pub struct EventBus<E: DomainEvent> {
    handlers: Vec<Arc<dyn EventHandler<E>>>,
}

impl<E: DomainEvent> EventBus<E> {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// 注册处理器
    pub fn with_handler(mut self, handler: Arc<dyn EventHandler<E>>) -> Self {
        self.handlers.push(handler);
        self
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// 按注册顺序依次分发事件
    pub async fn publish(&self, event: E, metadata: EventMetadata) {
        let envelope = EventEnvelope::new(event, metadata);
        debug!(
            event_type = %envelope.event_type,
            aggregate_id = %envelope.aggregate_id,
            "Publishing domain event"
        );

        for handler in &self.handlers {
            if let Err(e) = handler.handle(&envelope).await {
                warn!(
                    handler = handler.name(),
                    event_type = %envelope.event_type,
                    error = %e,
                    "Event handler failed"
                );
            }
        }
    }
}

impl<E: DomainEvent> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use handyhub_errors::{AppError, AppResult};
    use serde::Serialize;
    use std::sync::Mutex;

    #[derive(Debug, Clone, Serialize)]
    struct Pinged(String);

    impl DomainEvent for Pinged {
        fn event_type(&self) -> &'static str {
            "pinged"
        }

        fn aggregate_type(&self) -> &'static str {
            "ping"
        }

        fn aggregate_id(&self) -> String {
            self.0.clone()
        }
    }

    struct Recorder {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl EventHandler<Pinged> for Recorder {
        fn name(&self) -> &'static str {
            "recorder"
        }

        async fn handle(&self, envelope: &EventEnvelope<Pinged>) -> AppResult<()> {
            self.seen.lock().unwrap().push(envelope.aggregate_id.clone());
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl EventHandler<Pinged> for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn handle(&self, _envelope: &EventEnvelope<Pinged>) -> AppResult<()> {
            Err(AppError::internal("boom"))
        }
    }

    #[tokio::test]
    async fn test_failing_handler_does_not_block_others() {
        let recorder = Arc::new(Recorder {
            seen: Mutex::new(Vec::new()),
        });
        let bus = EventBus::new()
            .with_handler(Arc::new(Failing))
            .with_handler(recorder.clone());

        bus.publish(Pinged("a-1".to_string()), EventMetadata::new().with_user("u"))
            .await;

        assert_eq!(bus.handler_count(), 2);
        assert_eq!(recorder.seen.lock().unwrap().as_slice(), ["a-1".to_string()]);
    }
}
