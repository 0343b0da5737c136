//! 应用装配：存储、适配器、应用服务与路由

use std::sync::Arc;

use axum::Router;
use handyhub_adapter_email::{EmailClient, EmailSender, EmailTemplate, LoggingEmailSender};
use handyhub_adapter_llm::{ChatCompletionClient, LlmClient};
use handyhub_auth_core::TokenService;
use handyhub_bootstrap::MetricsRecorder;
use handyhub_config::AppConfig;
use handyhub_errors::AppResult;
use secrecy::ExposeSecret;
use tracing::{info, warn};

use crate::api::{self, AppState};
use crate::application::{FacadeDependencies, MarketplaceFacade};
use crate::infrastructure::{RealtimeHub, Storage};

/// 组装完成、可直接启动的应用
pub struct Application {
    pub state: AppState,
    pub router: Router,
}

pub fn token_service(config: &AppConfig) -> TokenService {
    TokenService::new(
        config.jwt.secret.expose_secret(),
        config.jwt.expires_in,
        config.jwt.refresh_expires_in,
        config.jwt.issuer.clone(),
        config.jwt.audience.clone(),
    )
}

fn email_sender(config: &AppConfig) -> Arc<dyn EmailSender> {
    match &config.email {
        Some(email) => {
            info!(smtp_host = %email.smtp_host, "SMTP email sender configured");
            Arc::new(EmailClient::new(email.clone()))
        }
        None => {
            warn!("No SMTP configured, outgoing emails will only be logged");
            Arc::new(LoggingEmailSender::new())
        }
    }
}

fn llm_client(config: &AppConfig) -> AppResult<Option<Arc<dyn LlmClient>>> {
    match &config.llm {
        Some(llm) => {
            info!(base_url = %llm.base_url, model = %llm.model, "AI assistant configured");
            Ok(Some(Arc::new(ChatCompletionClient::new(llm.clone())?)))
        }
        None => {
            warn!("No LLM configured, AI estimation is disabled");
            Ok(None)
        }
    }
}

/// 构建应用
///
/// 依次连接存储、创建适配器、装配应用服务，并按配置初始化管理员账号。
pub async fn build_application(config: &AppConfig) -> AppResult<Application> {
    let storage = Storage::connect(config.database.as_ref()).await?;
    let hub = Arc::new(RealtimeHub::new(config.realtime.channel_capacity));
    let tokens = token_service(config);

    let facade = MarketplaceFacade::new(FacadeDependencies {
        repositories: storage.repositories(),
        tokens: tokens.clone(),
        mailer: email_sender(config),
        templates: Arc::new(EmailTemplate::builtin()?),
        llm: llm_client(config)?,
        realtime: hub.clone(),
        otp: config.otp.clone(),
    });

    if let Some(admin) = &config.admin {
        facade.users().ensure_admin(admin).await?;
    }

    let metrics = match MetricsRecorder::install() {
        Ok(recorder) => Some(recorder),
        Err(e) => {
            warn!(error = %e, "Prometheus recorder unavailable, /metrics disabled");
            None
        }
    };

    let state = AppState {
        facade,
        tokens,
        hub,
        storage,
        metrics,
    };
    let router = api::router(state.clone(), &config.server);

    info!(storage = state.storage.kind(), "Application assembled");
    Ok(Application { state, router })
}
