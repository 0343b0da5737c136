//! 命令与查询参数
//!
//! 命令直接由 HTTP 层反序列化，进入服务前先调用 `validate()`。

pub mod chat_commands;
pub mod partner_commands;
pub mod request_commands;
pub mod user_commands;

pub use chat_commands::*;
pub use partner_commands::*;
pub use request_commands::*;
pub use user_commands::*;

use handyhub_errors::{AppError, AppResult};

pub(crate) const MIN_PASSWORD_LEN: usize = 8;

/// 必填文本，去除首尾空白后校验长度
pub(crate) fn require_text(field: &str, value: &str, max_chars: usize) -> AppResult<()> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::validation(format!("{} is required", field)));
    }
    if value.chars().count() > max_chars {
        return Err(AppError::validation(format!(
            "{} must be at most {} characters",
            field, max_chars
        )));
    }
    Ok(())
}

/// 可选文本，提供时同必填规则
pub(crate) fn optional_text(field: &str, value: Option<&str>, max_chars: usize) -> AppResult<()> {
    match value {
        Some(v) => require_text(field, v, max_chars),
        None => Ok(()),
    }
}

pub(crate) fn validate_email(email: &str) -> AppResult<()> {
    if email_address::EmailAddress::is_valid(email.trim()) {
        Ok(())
    } else {
        Err(AppError::validation(format!("'{}' is not a valid email address", email.trim())))
    }
}

/// 至少 8 位且同时包含字母和数字
pub(crate) fn validate_password(password: &str) -> AppResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    let has_letter = password.chars().any(|c| c.is_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !has_letter || !has_digit {
        return Err(AppError::validation(
            "Password must contain both letters and digits",
        ));
    }
    Ok(())
}

pub(crate) fn validate_phone(phone: &str) -> AppResult<()> {
    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
    let allowed = phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-' | '(' | ')'));
    if !allowed || !(8..=15).contains(&digits) {
        return Err(AppError::validation(format!("'{}' is not a valid phone number", phone)));
    }
    Ok(())
}
