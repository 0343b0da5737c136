//! 业务指标

use metrics::counter;

/// 申请/报价的流转结果
pub fn record_application(kind: &'static str, outcome: &'static str) {
    counter!("marketplace_applications_total", "kind" => kind, "outcome" => outcome).increment(1);
}

pub fn record_partner_request(outcome: &'static str) {
    counter!("marketplace_partner_requests_total", "outcome" => outcome).increment(1);
}

/// 实时推送送达的连接数
pub fn record_notifications_pushed(delivered: usize) {
    counter!("marketplace_notifications_pushed_total").increment(delivered as u64);
}
