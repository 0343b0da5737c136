//! 材料清单条目与报价行

use handyhub_domain_core::Money;
use handyhub_errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// 单个材料需求最多条目数
pub const MAX_MATERIAL_ITEMS: usize = 50;

/// 材料条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialItem {
    pub name: String,
    pub quantity: u32,
    pub unit: String,
}

impl MaterialItem {
    pub fn new(name: impl Into<String>, quantity: u32, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quantity,
            unit: unit.into(),
        }
    }

    pub fn validate(&self, index: usize) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::validation(format!("items[{}].name is required", index)));
        }
        if self.unit.trim().is_empty() {
            return Err(AppError::validation(format!("items[{}].unit is required", index)));
        }
        if self.quantity == 0 {
            return Err(AppError::validation(format!(
                "items[{}].quantity must be greater than zero",
                index
            )));
        }
        Ok(())
    }
}

/// 校验材料清单（1..=50 条）
pub fn validate_items(items: &[MaterialItem]) -> AppResult<()> {
    if items.is_empty() {
        return Err(AppError::validation("At least one material item is required"));
    }
    if items.len() > MAX_MATERIAL_ITEMS {
        return Err(AppError::validation(format!(
            "A material request can contain at most {} items",
            MAX_MATERIAL_ITEMS
        )));
    }
    items
        .iter()
        .enumerate()
        .try_for_each(|(index, item)| item.validate(index))
}

/// 报价行（对应清单中的某一条）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemQuote {
    pub item_index: usize,
    pub unit_price: Money,
}

/// 校验报价覆盖每个条目且仅一次、币种一致，并计算总价
pub fn quote_total(items: &[MaterialItem], quotes: &[ItemQuote]) -> AppResult<Money> {
    if quotes.is_empty() {
        return Err(AppError::validation("At least one quote is required"));
    }
    if quotes.len() != items.len() {
        return Err(AppError::validation(format!(
            "Expected {} quotes, got {}",
            items.len(),
            quotes.len()
        )));
    }

    let mut covered = vec![false; items.len()];
    let currency = quotes[0].unit_price.currency.clone();
    let mut total = Money::zero(currency.clone());

    for quote in quotes {
        let item = items.get(quote.item_index).ok_or_else(|| {
            AppError::validation(format!("Quote references unknown item {}", quote.item_index))
        })?;
        if covered[quote.item_index] {
            return Err(AppError::validation(format!(
                "Item {} is quoted more than once",
                quote.item_index
            )));
        }
        covered[quote.item_index] = true;

        if quote.unit_price.currency != currency {
            return Err(AppError::validation("All quotes must use the same currency"));
        }
        quote
            .unit_price
            .ensure_positive(&format!("quotes[{}].unit_price", quote.item_index))?;

        let line = quote.unit_price.checked_mul(i64::from(item.quantity))?;
        total = total.checked_add(&line)?;
    }

    Ok(total)
}
