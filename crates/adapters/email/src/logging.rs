//! 仅记录日志的发送器（未配置 SMTP 时使用）

use crate::{EmailMessage, EmailSender};
use handyhub_errors::AppResult;
use tracing::info;

#[derive(Debug, Default, Clone)]
pub struct LoggingEmailSender;

impl LoggingEmailSender {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl EmailSender for LoggingEmailSender {
    async fn send(&self, message: EmailMessage) -> AppResult<()> {
        info!(
            to = %message.to,
            subject = %message.subject,
            body = %message.text_body,
            "SMTP not configured, email logged instead of sent"
        );
        Ok(())
    }
}
