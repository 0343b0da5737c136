//! 合作伙伴入驻命令

use handyhub_errors::AppResult;
use serde::Deserialize;

use super::{require_text, validate_email, validate_password, validate_phone};
use crate::domain::enums::{PartnerRequestStatus, PartnerType};

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitPartnerRequestCommand {
    pub email: String,
    pub password: String,
    pub company_name: String,
    pub contact_name: String,
    pub phone: String,
    pub partner_type: PartnerType,
    #[serde(default)]
    pub description: Option<String>,
}

impl SubmitPartnerRequestCommand {
    pub fn validate(&self) -> AppResult<()> {
        validate_email(&self.email)?;
        validate_password(&self.password)?;
        require_text("company_name", &self.company_name, 200)?;
        require_text("contact_name", &self.contact_name, 100)?;
        validate_phone(&self.phone)?;
        if let Some(description) = &self.description {
            if description.chars().count() > 4000 {
                return Err(handyhub_errors::AppError::validation(
                    "description must be at most 4000 characters",
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyOtpCommand {
    pub email: String,
    pub code: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResendOtpCommand {
    pub email: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListPartnerRequestsQuery {
    #[serde(default)]
    pub status: Option<PartnerRequestStatus>,
    #[serde(default)]
    pub keyword: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RejectPartnerRequestCommand {
    pub reason: String,
}
