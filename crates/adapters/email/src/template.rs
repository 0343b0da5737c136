//! 邮件模板

use crate::EmailMessage;
use handyhub_errors::{AppError, AppResult};
use std::collections::HashMap;
use tera::Tera;
use tracing::debug;

pub const PARTNER_OTP: &str = "partner_otp";
pub const PARTNER_APPROVED: &str = "partner_approved";
pub const PARTNER_REJECTED: &str = "partner_rejected";

const BUILTIN: &[(&str, &str)] = &[
    (
        "partner_otp.txt",
        "Hello {{ contact_name }},\n\n\
         Your HandyHub verification code is {{ code }}.\n\
         It expires in {{ ttl_minutes }} minutes.\n",
    ),
    (
        "partner_otp.html",
        "<p>Hello {{ contact_name }},</p>\
         <p>Your HandyHub verification code is <strong>{{ code }}</strong>.</p>\
         <p>It expires in {{ ttl_minutes }} minutes.</p>",
    ),
    (
        "partner_approved.txt",
        "Hello {{ contact_name }},\n\n\
         {{ company_name }} has been approved as a {{ partner_type }} on HandyHub.\n\
         You can now sign in with {{ email }}.\n",
    ),
    (
        "partner_approved.html",
        "<p>Hello {{ contact_name }},</p>\
         <p>{{ company_name }} has been approved as a {{ partner_type }} on HandyHub.</p>\
         <p>You can now sign in with {{ email }}.</p>",
    ),
    (
        "partner_rejected.txt",
        "Hello {{ contact_name }},\n\n\
         We could not approve the partner request for {{ company_name }}.\n\
         Reason: {{ reason }}\n",
    ),
    (
        "partner_rejected.html",
        "<p>Hello {{ contact_name }},</p>\
         <p>We could not approve the partner request for {{ company_name }}.</p>\
         <p>Reason: {{ reason }}</p>",
    ),
];

/// 邮件模板管理器
///
/// 每个模板由 `{name}.txt` 和可选的 `{name}.html` 组成。
pub struct EmailTemplate {
    tera: Tera,
}

impl EmailTemplate {
    /// 从模板目录加载
    pub fn new(template_dir: &str) -> AppResult<Self> {
        let pattern = format!("{}/**/*", template_dir);
        let tera = Tera::new(&pattern)
            .map_err(|e| AppError::internal(format!("Failed to load email templates: {}", e)))?;

        debug!(template_dir = %template_dir, "Email templates loaded");
        Ok(Self { tera })
    }

    /// 内置模板
    pub fn builtin() -> AppResult<Self> {
        Self::from_strings(
            BUILTIN
                .iter()
                .map(|(name, body)| (name.to_string(), body.to_string()))
                .collect(),
        )
    }

    pub fn from_strings(templates: HashMap<String, String>) -> AppResult<Self> {
        let mut tera = Tera::default();
        for (name, content) in templates {
            tera.add_raw_template(&name, &content).map_err(|e| {
                AppError::internal(format!("Failed to add template {}: {}", name, e))
            })?;
        }
        Ok(Self { tera })
    }

    /// 渲染单个模板
    pub fn render(&self, template_name: &str, context: &serde_json::Value) -> AppResult<String> {
        let context = tera::Context::from_serialize(context)
            .map_err(|e| AppError::internal(format!("Failed to create template context: {}", e)))?;

        self.tera.render(template_name, &context).map_err(|e| {
            AppError::internal(format!("Failed to render template {}: {}", template_name, e))
        })
    }

    /// 渲染纯文本与 HTML 两个版本并组装成邮件
    pub fn render_message(
        &self,
        to: &str,
        subject: &str,
        name: &str,
        context: &serde_json::Value,
    ) -> AppResult<EmailMessage> {
        let text = self.render(&format!("{}.txt", name), context)?;
        let html_name = format!("{}.html", name);
        let message = EmailMessage::text(to, subject, text);

        if self.tera.get_template_names().any(|n| n == html_name) {
            Ok(message.with_html(self.render(&html_name, context)?))
        } else {
            Ok(message)
        }
    }
}
