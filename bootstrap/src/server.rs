//! HTTP 服务启动

use axum::Router;
use handyhub_config::ServerConfig;
use handyhub_errors::{AppError, AppResult};
use std::net::SocketAddr;
use tracing::info;

use crate::runtime::shutdown_signal;

/// 解析监听地址
pub fn bind_address(config: &ServerConfig) -> AppResult<SocketAddr> {
    format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| AppError::validation(format!("Invalid server address: {}", e)))
}

/// 启动 HTTP 服务，收到关闭信号后优雅退出
pub async fn serve(router: Router, config: &ServerConfig) -> AppResult<()> {
    let addr = bind_address(config)?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;

    info!(%addr, "HTTP server starting");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::internal(format!("HTTP server error: {}", e)))?;

    info!("HTTP server stopped");
    Ok(())
}
