//! 货币值对象

use handyhub_errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// 货币代码
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Currency(pub String);

impl Currency {
    pub fn new(code: &str) -> Self {
        Self(code.trim().to_uppercase())
    }

    pub fn vnd() -> Self {
        Self("VND".to_string())
    }

    pub fn usd() -> Self {
        Self("USD".to_string())
    }

    /// 最小单位的小数位数（VND 没有辅币）
    pub fn minor_units(&self) -> u32 {
        match self.0.as_str() {
            "VND" | "JPY" | "KRW" => 0,
            _ => 2,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.0.len() == 3 && self.0.chars().all(|c| c.is_ascii_uppercase())
    }
}

/// 金额值对象
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// 金额（以最小单位存储）
    pub amount: i64,
    /// 货币代码
    pub currency: Currency,
}

impl Money {
    pub fn new(amount: i64, currency: Currency) -> Self {
        Self { amount, currency }
    }

    pub fn zero(currency: Currency) -> Self {
        Self {
            amount: 0,
            currency,
        }
    }

    pub fn vnd(amount: i64) -> Self {
        Self::new(amount, Currency::vnd())
    }

    /// 转换为浮点数（用于显示）
    pub fn to_decimal(&self) -> f64 {
        self.amount as f64 / 10f64.powi(self.currency.minor_units() as i32)
    }

    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }

    pub fn is_positive(&self) -> bool {
        self.amount > 0
    }

    /// 校验为正数且币种合法
    pub fn ensure_positive(&self, field: &str) -> AppResult<()> {
        if !self.currency.is_valid() {
            return Err(AppError::validation(format!(
                "{} has invalid currency code '{}'",
                field, self.currency.0
            )));
        }
        if !self.is_positive() {
            return Err(AppError::validation(format!("{} must be positive", field)));
        }
        Ok(())
    }

    /// 同币种相加
    pub fn checked_add(&self, other: &Money) -> AppResult<Money> {
        if self.currency != other.currency {
            return Err(AppError::validation(format!(
                "Cannot add {} to {}",
                other.currency.0, self.currency.0
            )));
        }
        let amount = self
            .amount
            .checked_add(other.amount)
            .ok_or_else(|| AppError::validation("Amount overflow"))?;
        Ok(Money::new(amount, self.currency.clone()))
    }

    /// 乘以数量
    pub fn checked_mul(&self, multiplier: i64) -> AppResult<Money> {
        let amount = self
            .amount
            .checked_mul(multiplier)
            .ok_or_else(|| AppError::validation("Amount overflow"))?;
        Ok(Money::new(amount, self.currency.clone()))
    }
}
