//! SMTP 邮件客户端

use crate::{EmailConfig, EmailMessage, EmailSender};
use handyhub_errors::{AppError, AppResult};
use lettre::message::{MultiPart, SinglePart, header};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use secrecy::ExposeSecret;
use std::time::Duration;
use tracing::{debug, info};

/// 邮件客户端
pub struct EmailClient {
    config: EmailConfig,
}

impl EmailClient {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// 构建 SMTP 传输
    fn build_transport(&self) -> AppResult<SmtpTransport> {
        let credentials = Credentials::new(
            self.config.username.clone(),
            self.config.password.expose_secret().clone(),
        );

        let transport = if self.config.use_tls {
            SmtpTransport::starttls_relay(&self.config.smtp_host)
        } else {
            SmtpTransport::relay(&self.config.smtp_host)
        }
        .map_err(|e| AppError::external_service(format!("Failed to create SMTP transport: {}", e)))?
        .port(self.config.smtp_port)
        .credentials(credentials)
        .timeout(Some(Duration::from_secs(self.config.timeout_secs)))
        .build();

        Ok(transport)
    }

    /// 构建邮件消息
    fn build_message(&self, msg: &EmailMessage) -> AppResult<Message> {
        let from = format!("{} <{}>", self.config.from_name, self.config.from_email)
            .parse()
            .map_err(|e| AppError::internal(format!("Invalid from address: {}", e)))?;

        let to = msg
            .to
            .parse()
            .map_err(|e| AppError::validation(format!("Invalid to address: {}", e)))?;

        let text = SinglePart::builder()
            .header(header::ContentType::TEXT_PLAIN)
            .body(msg.text_body.clone());

        let body = match &msg.html_body {
            Some(html) => MultiPart::alternative().singlepart(text).singlepart(
                SinglePart::builder()
                    .header(header::ContentType::TEXT_HTML)
                    .body(html.clone()),
            ),
            None => MultiPart::alternative().singlepart(text),
        };

        Message::builder()
            .from(from)
            .to(to)
            .subject(&msg.subject)
            .multipart(body)
            .map_err(|e| AppError::internal(format!("Failed to build message: {}", e)))
    }
}

#[async_trait::async_trait]
impl EmailSender for EmailClient {
    async fn send(&self, message: EmailMessage) -> AppResult<()> {
        debug!(to = %message.to, subject = %message.subject, "Sending email");

        let built = self.build_message(&message)?;
        let transport = self.build_transport()?;

        // lettre 的同步传输放到 blocking 线程池
        tokio::task::spawn_blocking(move || {
            transport
                .send(&built)
                .map_err(|e| AppError::external_service(format!("Failed to send email: {}", e)))
        })
        .await
        .map_err(|e| AppError::internal(format!("Task join error: {}", e)))??;

        info!(to = %message.to, subject = %message.subject, "Email sent");
        Ok(())
    }
}
