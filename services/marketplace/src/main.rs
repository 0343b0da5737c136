//! HandyHub 服务入口

use handyhub_bootstrap::{init_runtime, serve};
use handyhub_config::AppConfig;
use marketplace::startup::build_application;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env 不存在时忽略
    let _ = dotenvy::dotenv();

    let config = AppConfig::load("config")?;
    init_runtime(&config);

    let app = build_application(&config).await?;
    info!(host = %config.server.host, port = config.server.port, "Starting marketplace");

    serve(app.router, &config.server).await?;
    Ok(())
}
