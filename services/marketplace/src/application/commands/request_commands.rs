//! 服务需求与材料需求命令

use handyhub_domain_core::Money;
use handyhub_errors::AppResult;
use serde::Deserialize;

use super::{optional_text, require_text};
use crate::domain::entities::ServiceRequestChanges;
use crate::domain::value_objects::{ItemQuote, MaterialItem, validate_items};

const MAX_TITLE: usize = 200;
const MAX_DESCRIPTION: usize = 4000;
const MAX_ADDRESS: usize = 500;
const MAX_CATEGORY: usize = 100;
const MAX_APPLICATION_MESSAGE: usize = 2000;

fn validate_budget(budget: Option<&Money>) -> AppResult<()> {
    match budget {
        Some(money) => money.ensure_positive("budget"),
        None => Ok(()),
    }
}

// ========== 服务需求 ==========

#[derive(Debug, Clone, Deserialize)]
pub struct CreateServiceRequestCommand {
    pub title: String,
    pub description: String,
    pub category: String,
    pub address: String,
    #[serde(default)]
    pub budget: Option<Money>,
}

impl CreateServiceRequestCommand {
    pub fn validate(&self) -> AppResult<()> {
        require_text("title", &self.title, MAX_TITLE)?;
        require_text("description", &self.description, MAX_DESCRIPTION)?;
        require_text("category", &self.category, MAX_CATEGORY)?;
        require_text("address", &self.address, MAX_ADDRESS)?;
        validate_budget(self.budget.as_ref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateServiceRequestCommand {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub budget: Option<Money>,
}

impl UpdateServiceRequestCommand {
    pub fn validate(&self) -> AppResult<()> {
        optional_text("title", self.title.as_deref(), MAX_TITLE)?;
        optional_text("description", self.description.as_deref(), MAX_DESCRIPTION)?;
        optional_text("category", self.category.as_deref(), MAX_CATEGORY)?;
        optional_text("address", self.address.as_deref(), MAX_ADDRESS)?;
        validate_budget(self.budget.as_ref())
    }

    pub fn into_changes(self) -> ServiceRequestChanges {
        ServiceRequestChanges {
            title: self.title.map(|s| s.trim().to_string()),
            description: self.description.map(|s| s.trim().to_string()),
            category: self.category.map(|s| s.trim().to_string()),
            address: self.address.map(|s| s.trim().to_string()),
            budget: self.budget,
        }
    }
}

/// 承包商投标
#[derive(Debug, Clone, Deserialize)]
pub struct ApplyToServiceRequestCommand {
    pub message: String,
    pub estimated_price: Money,
}

impl ApplyToServiceRequestCommand {
    pub fn validate(&self) -> AppResult<()> {
        require_text("message", &self.message, MAX_APPLICATION_MESSAGE)?;
        self.estimated_price.ensure_positive("estimated_price")
    }
}

/// 浏览开放需求
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BrowseRequestsQuery {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub keyword: Option<String>,
}

// ========== 材料需求 ==========

#[derive(Debug, Clone, Deserialize)]
pub struct CreateMaterialRequestCommand {
    pub title: String,
    pub delivery_address: String,
    pub items: Vec<MaterialItem>,
}

impl CreateMaterialRequestCommand {
    pub fn validate(&self) -> AppResult<()> {
        require_text("title", &self.title, MAX_TITLE)?;
        require_text("delivery_address", &self.delivery_address, MAX_ADDRESS)?;
        validate_items(&self.items)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMaterialRequestCommand {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub delivery_address: Option<String>,
    #[serde(default)]
    pub items: Option<Vec<MaterialItem>>,
}

impl UpdateMaterialRequestCommand {
    pub fn validate(&self) -> AppResult<()> {
        optional_text("title", self.title.as_deref(), MAX_TITLE)?;
        optional_text("delivery_address", self.delivery_address.as_deref(), MAX_ADDRESS)?;
        if let Some(items) = &self.items {
            validate_items(items)?;
        }
        Ok(())
    }
}

/// 供应商报价
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitQuoteCommand {
    pub message: String,
    pub quotes: Vec<ItemQuote>,
}

impl SubmitQuoteCommand {
    pub fn validate(&self) -> AppResult<()> {
        require_text("message", &self.message, MAX_APPLICATION_MESSAGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_service_request_validation() {
        let mut cmd = CreateServiceRequestCommand {
            title: "Fix leaking sink".to_string(),
            description: "Kitchen sink drips".to_string(),
            category: "Plumbing".to_string(),
            address: "12 Le Loi, District 1".to_string(),
            budget: Some(Money::vnd(500_000)),
        };
        assert!(cmd.validate().is_ok());

        cmd.budget = Some(Money::vnd(0));
        assert!(cmd.validate().is_err());

        cmd.budget = None;
        cmd.title = " ".to_string();
        assert!(cmd.validate().is_err());
    }

    #[test]
    fn test_update_changes_are_trimmed() {
        let cmd = UpdateServiceRequestCommand {
            title: Some("  New title ".to_string()),
            ..Default::default()
        };
        cmd.validate().unwrap();
        let changes = cmd.into_changes();
        assert_eq!(changes.title.as_deref(), Some("New title"));
        assert!(changes.address.is_none());
    }

    #[test]
    fn test_material_request_requires_items() {
        let cmd = CreateMaterialRequestCommand {
            title: "Cement".to_string(),
            delivery_address: "District 7".to_string(),
            items: Vec::new(),
        };
        assert!(cmd.validate().is_err());
    }
}
