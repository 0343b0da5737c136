//! Email 适配器
//!
//! 提供邮件发送功能，支持：
//! - SMTP 邮件发送（lettre）
//! - 开发环境下仅记录日志的发送器
//! - 模板渲染（tera）

mod client;
mod logging;
mod template;

pub use client::EmailClient;
pub use logging::LoggingEmailSender;
pub use template::{EmailTemplate, PARTNER_APPROVED, PARTNER_OTP, PARTNER_REJECTED};

pub use handyhub_config::EmailConfig;

use handyhub_errors::AppResult;

/// 邮件消息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html_body: Option<String>,
    pub text_body: String,
}

impl EmailMessage {
    pub fn text(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            html_body: None,
            text_body: body.into(),
        }
    }

    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html_body = Some(html.into());
        self
    }
}

/// 邮件发送接口
#[mockall::automock]
#[async_trait::async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: EmailMessage) -> AppResult<()>;
}
