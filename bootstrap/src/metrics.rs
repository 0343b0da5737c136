//! Metrics 模块
//!
//! 提供 Prometheus metrics 导出

use handyhub_errors::{AppError, AppResult};
use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusHandle;

/// Metrics 记录器
#[derive(Clone)]
pub struct MetricsRecorder {
    handle: PrometheusHandle,
}

impl MetricsRecorder {
    /// 安装全局 Prometheus 记录器（进程内只能安装一次）
    pub fn install() -> AppResult<Self> {
        let handle = handyhub_telemetry::init_metrics()
            .map_err(|e| AppError::internal(format!("Failed to install Prometheus recorder: {}", e)))?;
        Ok(Self { handle })
    }

    /// 获取 Prometheus 格式的 metrics
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// 记录 HTTP 请求
pub fn record_http_request(method: &str, route: &str, status: u16, duration_ms: f64) {
    let labels = [
        ("method", method.to_string()),
        ("route", route.to_string()),
        ("status", status.to_string()),
    ];

    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_ms", &labels).record(duration_ms);
}
