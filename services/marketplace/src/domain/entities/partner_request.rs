//! 合作伙伴入驻申请实体

use chrono::{DateTime, Duration, Utc};
use handyhub_common::{AuditInfo, UserId};
use handyhub_errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::enums::{PartnerRequestStatus, PartnerType};
use crate::domain::value_objects::PartnerRequestId;

/// 邮箱验证码（只保存哈希）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpChallenge {
    code_hash: String,
    expires_at: DateTime<Utc>,
    attempts: u32,
    sent_at: DateTime<Utc>,
}

impl OtpChallenge {
    /// 生成 6 位数字验证码，返回挑战与明文验证码
    pub fn issue(ttl_minutes: i64, now: DateTime<Utc>) -> (Self, String) {
        use rand::Rng;
        let code = format!("{:06}", rand::thread_rng().gen_range(0..1_000_000));
        let challenge = Self {
            code_hash: hash_code(&code),
            expires_at: now + Duration::minutes(ttl_minutes),
            attempts: 0,
            sent_at: now,
        };
        (challenge, code)
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn sent_at(&self) -> DateTime<Utc> {
        self.sent_at
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    fn matches(&self, code: &str) -> bool {
        hash_code(code.trim()) == self.code_hash
    }
}

fn hash_code(code: &str) -> String {
    hex::encode(Sha256::digest(code.as_bytes()))
}

/// 验证码校验失败原因
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OtpError {
    #[error("Email has already been verified")]
    AlreadyVerified,

    #[error("No active verification code, request a new one")]
    NoActiveCode,

    #[error("Verification code has expired, request a new one")]
    Expired,

    #[error("Invalid verification code, {remaining} attempts left")]
    InvalidCode { remaining: u32 },

    #[error("Too many failed attempts, request a new code")]
    TooManyAttempts,
}

impl From<OtpError> for AppError {
    fn from(err: OtpError) -> Self {
        match err {
            OtpError::AlreadyVerified | OtpError::NoActiveCode | OtpError::Expired => {
                AppError::failed_precondition(err.to_string())
            }
            OtpError::InvalidCode { .. } => AppError::validation(err.to_string()),
            OtpError::TooManyAttempts => AppError::resource_exhausted(err.to_string()),
        }
    }
}

/// 入驻申请
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartnerRequest {
    id: PartnerRequestId,
    email: String,
    company_name: String,
    contact_name: String,
    phone: String,
    partner_type: PartnerType,
    description: Option<String>,
    /// 审批通过时用于创建账号，之后清空
    password_hash: String,
    otp: Option<OtpChallenge>,
    status: PartnerRequestStatus,
    rejection_reason: Option<String>,
    user_id: Option<UserId>,
    audit_info: AuditInfo,
}

impl_document!(PartnerRequest, PartnerRequestId, "partner_requests");

/// 新申请的资料
#[derive(Debug, Clone)]
pub struct PartnerProfile {
    pub email: String,
    pub company_name: String,
    pub contact_name: String,
    pub phone: String,
    pub partner_type: PartnerType,
    pub description: Option<String>,
}

impl PartnerRequest {
    /// 创建申请并签发首个验证码
    pub fn new(
        profile: PartnerProfile,
        password_hash: impl Into<String>,
        ttl_minutes: i64,
        now: DateTime<Utc>,
    ) -> (Self, String) {
        let (challenge, code) = OtpChallenge::issue(ttl_minutes, now);
        let request = Self {
            id: PartnerRequestId::new(),
            email: profile.email,
            company_name: profile.company_name,
            contact_name: profile.contact_name,
            phone: profile.phone,
            partner_type: profile.partner_type,
            description: profile.description,
            password_hash: password_hash.into(),
            otp: Some(challenge),
            status: PartnerRequestStatus::PendingVerification,
            rejection_reason: None,
            user_id: None,
            audit_info: AuditInfo::new(None),
        };
        (request, code)
    }

    // ========== Getters ==========

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn company_name(&self) -> &str {
        &self.company_name
    }

    pub fn contact_name(&self) -> &str {
        &self.contact_name
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn partner_type(&self) -> PartnerType {
        self.partner_type
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn otp(&self) -> Option<&OtpChallenge> {
        self.otp.as_ref()
    }

    pub fn status(&self) -> PartnerRequestStatus {
        self.status
    }

    pub fn rejection_reason(&self) -> Option<&str> {
        self.rejection_reason.as_deref()
    }

    pub fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }

    // ========== 验证码 ==========

    /// 校验验证码；失败时尝试次数的变化同样需要持久化
    pub fn verify_otp(
        &mut self,
        code: &str,
        max_attempts: u32,
        now: DateTime<Utc>,
    ) -> Result<(), OtpError> {
        if self.status != PartnerRequestStatus::PendingVerification {
            return Err(OtpError::AlreadyVerified);
        }
        let challenge = self.otp.as_mut().ok_or(OtpError::NoActiveCode)?;

        if challenge.is_expired(now) {
            self.otp = None;
            self.audit_info.touch(None);
            return Err(OtpError::Expired);
        }

        if !challenge.matches(code) {
            challenge.attempts += 1;
            let attempts = challenge.attempts;
            if attempts >= max_attempts {
                self.otp = None;
                self.audit_info.touch(None);
                return Err(OtpError::TooManyAttempts);
            }
            self.audit_info.touch(None);
            return Err(OtpError::InvalidCode {
                remaining: max_attempts - attempts,
            });
        }

        self.otp = None;
        self.status = PartnerRequestStatus::Pending;
        self.audit_info.touch(None);
        Ok(())
    }

    /// 重新签发验证码，需满足冷却时间
    pub fn resend_otp(
        &mut self,
        ttl_minutes: i64,
        cooldown_secs: i64,
        now: DateTime<Utc>,
    ) -> AppResult<String> {
        if self.status != PartnerRequestStatus::PendingVerification {
            return Err(OtpError::AlreadyVerified.into());
        }
        if let Some(current) = &self.otp {
            let ready_at = current.sent_at + Duration::seconds(cooldown_secs);
            if now < ready_at {
                let wait = (ready_at - now).num_seconds().max(1);
                return Err(AppError::resource_exhausted(format!(
                    "Please wait {} seconds before requesting a new code",
                    wait
                )));
            }
        }

        let (challenge, code) = OtpChallenge::issue(ttl_minutes, now);
        self.otp = Some(challenge);
        self.audit_info.touch(None);
        Ok(code)
    }

    // ========== 审批 ==========

    pub fn approve(&mut self, user_id: UserId, by: &UserId) -> AppResult<()> {
        self.status = self.status.transition(PartnerRequestStatus::Approved)?;
        self.user_id = Some(user_id);
        self.password_hash.clear();
        self.audit_info.touch(Some(by.clone()));
        Ok(())
    }

    pub fn reject(&mut self, reason: &str, by: &UserId) -> AppResult<()> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(AppError::validation("A rejection reason is required"));
        }
        self.status = self.status.transition(PartnerRequestStatus::Rejected)?;
        self.rejection_reason = Some(reason.to_string());
        self.password_hash.clear();
        self.audit_info.touch(Some(by.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> PartnerProfile {
        PartnerProfile {
            email: "build@acme.vn".to_string(),
            company_name: "Acme Build".to_string(),
            contact_name: "Minh".to_string(),
            phone: "0903000000".to_string(),
            partner_type: PartnerType::Contractor,
            description: None,
        }
    }

    #[test]
    fn test_issue_code_format() {
        let (challenge, code) = OtpChallenge::issue(10, Utc::now());
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
        assert!(challenge.matches(&code));
        assert_ne!(challenge.code_hash, code);
    }

    #[test]
    fn test_verify_with_correct_code() {
        let now = Utc::now();
        let (mut req, code) = PartnerRequest::new(profile(), "hash", 10, now);
        req.verify_otp(&code, 5, now).unwrap();
        assert_eq!(req.status(), PartnerRequestStatus::Pending);
        assert!(req.otp().is_none());
        assert_eq!(req.verify_otp(&code, 5, now), Err(OtpError::AlreadyVerified));
    }

    #[test]
    fn test_wrong_codes_exhaust_attempts() {
        let now = Utc::now();
        let (mut req, code) = PartnerRequest::new(profile(), "hash", 10, now);
        let wrong = if code == "000000" { "111111" } else { "000000" };

        assert_eq!(
            req.verify_otp(wrong, 3, now),
            Err(OtpError::InvalidCode { remaining: 2 })
        );
        assert_eq!(
            req.verify_otp(wrong, 3, now),
            Err(OtpError::InvalidCode { remaining: 1 })
        );
        assert_eq!(req.verify_otp(wrong, 3, now), Err(OtpError::TooManyAttempts));
        // 验证码已作废，正确的码也不再可用
        assert_eq!(req.verify_otp(&code, 3, now), Err(OtpError::NoActiveCode));
    }

    #[test]
    fn test_expired_code() {
        let now = Utc::now();
        let (mut req, code) = PartnerRequest::new(profile(), "hash", 10, now);
        let later = now + Duration::minutes(11);
        assert_eq!(req.verify_otp(&code, 5, later), Err(OtpError::Expired));
        assert_eq!(req.status(), PartnerRequestStatus::PendingVerification);
    }

    #[test]
    fn test_resend_respects_cooldown() {
        let now = Utc::now();
        let (mut req, old_code) = PartnerRequest::new(profile(), "hash", 10, now);

        let too_soon = req.resend_otp(10, 60, now + Duration::seconds(5));
        assert!(matches!(too_soon, Err(AppError::ResourceExhausted(_))));

        let later = now + Duration::seconds(61);
        let new_code = req.resend_otp(10, 60, later).unwrap();
        if new_code != old_code {
            assert!(req.verify_otp(&old_code, 5, later).is_err());
        }
        req.verify_otp(&new_code, 5, later).unwrap();
    }

    #[test]
    fn test_approve_requires_verification() {
        let now = Utc::now();
        let admin = UserId::new();
        let (mut req, code) = PartnerRequest::new(profile(), "hash", 10, now);
        assert!(req.approve(UserId::new(), &admin).is_err());

        req.verify_otp(&code, 5, now).unwrap();
        let user_id = UserId::new();
        req.approve(user_id.clone(), &admin).unwrap();
        assert_eq!(req.status(), PartnerRequestStatus::Approved);
        assert_eq!(req.user_id(), Some(&user_id));
        assert!(req.password_hash().is_empty());
    }

    #[test]
    fn test_reject_requires_reason() {
        let now = Utc::now();
        let admin = UserId::new();
        let (mut req, code) = PartnerRequest::new(profile(), "hash", 10, now);
        req.verify_otp(&code, 5, now).unwrap();

        assert!(matches!(req.reject("  ", &admin), Err(AppError::Validation(_))));
        req.reject("Missing business license", &admin).unwrap();
        assert_eq!(req.rejection_reason(), Some("Missing business license"));
    }
}
