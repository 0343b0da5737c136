//! handyhub-config - 配置加载库
//!
//! 加载顺序：`default.toml` → `{APP_ENV}.toml` → `HANDYHUB_` 前缀环境变量
//! （嵌套键使用 `__` 分隔，如 `HANDYHUB_DATABASE__URL`）。

use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::Deserialize;
use thiserror::Error;

use secrecy::Secret;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    Load(#[from] figment::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// 数据库配置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: Secret<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

fn default_max_connections() -> u32 {
    // 开发环境: 10, 生产环境: 50
    match std::env::var("APP_ENV").as_deref() {
        Ok("production") => 50,
        _ => 10,
    }
}

fn default_true() -> bool {
    true
}

/// JWT 配置
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: Secret<String>,
    #[serde(default = "default_expires_in")]
    pub expires_in: i64,
    #[serde(default = "default_refresh_expires_in")]
    pub refresh_expires_in: i64,
    #[serde(default = "default_issuer")]
    pub issuer: String,
    #[serde(default = "default_audience")]
    pub audience: String,
}

fn default_expires_in() -> i64 {
    3600
}

fn default_refresh_expires_in() -> i64 {
    604800
}

fn default_issuer() -> String {
    "handyhub".to_string()
}

fn default_audience() -> String {
    "handyhub-api".to_string()
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// 允许的 CORS 源，为空时不限制
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// 请求体上限（字节）
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}

/// 遥测配置
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// 邮件配置
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: String,
    pub password: Secret<String>,
    pub from_email: String,
    pub from_name: String,
    #[serde(default)]
    pub use_tls: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

/// OTP 验证码配置（合作伙伴入驻）
#[derive(Debug, Clone, Deserialize)]
pub struct OtpConfig {
    #[serde(default = "default_otp_ttl_minutes")]
    pub ttl_minutes: i64,
    #[serde(default = "default_otp_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_otp_resend_cooldown_secs")]
    pub resend_cooldown_secs: i64,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            ttl_minutes: default_otp_ttl_minutes(),
            max_attempts: default_otp_max_attempts(),
            resend_cooldown_secs: default_otp_resend_cooldown_secs(),
        }
    }
}

fn default_otp_ttl_minutes() -> i64 {
    10
}

fn default_otp_max_attempts() -> u32 {
    5
}

fn default_otp_resend_cooldown_secs() -> i64 {
    60
}

/// LLM 配置（OpenAI 兼容接口，默认 Groq）
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    pub api_key: Secret<String>,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_llm_temperature")]
    pub temperature: f32,
    #[serde(default = "default_llm_max_tokens")]
    pub max_tokens: u32,
}

fn default_llm_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_llm_model() -> String {
    "llama-3.1-8b-instant".to_string()
}

fn default_llm_temperature() -> f32 {
    0.3
}

fn default_llm_max_tokens() -> u32 {
    512
}

/// 启动时初始化的管理员账号
#[derive(Debug, Clone, Deserialize)]
pub struct AdminSeedConfig {
    pub email: String,
    pub password: Secret<String>,
    #[serde(default = "default_admin_name")]
    pub full_name: String,
}

fn default_admin_name() -> String {
    "Administrator".to_string()
}

/// 实时推送配置
#[derive(Debug, Clone, Deserialize)]
pub struct RealtimeConfig {
    /// 每个连接的广播缓冲区大小
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_channel_capacity() -> usize {
    64
}

/// 应用配置
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app_name: String,
    pub app_env: String,
    pub server: ServerConfig,
    /// 未配置时使用内存存储
    pub database: Option<DatabaseConfig>,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    /// 未配置时邮件仅写入日志
    pub email: Option<EmailConfig>,
    #[serde(default)]
    pub otp: OtpConfig,
    /// 未配置时 AI 估价不可用
    pub llm: Option<LlmConfig>,
    pub admin: Option<AdminSeedConfig>,
    #[serde(default)]
    pub realtime: RealtimeConfig,
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    pub fn load(config_dir: &str) -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let figment = Figment::new()
            .merge(Toml::file(format!("{}/default.toml", config_dir)))
            .merge(Toml::file(format!("{}/{}.toml", config_dir, env)))
            .merge(Env::prefixed("HANDYHUB_").split("__"));

        Self::from_figment(figment)
    }

    /// 从任意 Figment 提取并校验
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        use secrecy::ExposeSecret;

        if self.is_production() && self.jwt.secret.expose_secret().len() < 32 {
            return Err(ConfigError::Invalid(
                "jwt.secret must be at least 32 characters in production".to_string(),
            ));
        }
        if self.otp.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "otp.max_attempts must be greater than zero".to_string(),
            ));
        }
        if self.realtime.channel_capacity == 0 {
            return Err(ConfigError::Invalid(
                "realtime.channel_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }

    /// 是否为开发环境
    pub fn is_development(&self) -> bool {
        self.app_env == "development"
    }
}

#[cfg(test)]
mod tests;
