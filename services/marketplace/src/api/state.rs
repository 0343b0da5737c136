//! 路由共享状态

use std::sync::Arc;

use axum::extract::FromRef;
use handyhub_auth_core::TokenService;
use handyhub_bootstrap::MetricsRecorder;

use crate::application::MarketplaceFacade;
use crate::infrastructure::{RealtimeHub, Storage};

#[derive(Clone)]
pub struct AppState {
    pub facade: MarketplaceFacade,
    pub tokens: TokenService,
    pub hub: Arc<RealtimeHub>,
    pub storage: Storage,
    /// 进程内只能安装一次，未安装时 `/metrics` 不可用
    pub metrics: Option<MetricsRecorder>,
}

impl FromRef<AppState> for TokenService {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}
