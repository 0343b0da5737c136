//! 通用类型定义

use chrono::{DateTime, Utc};
use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// 用户 ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From)]
#[display("{_0}")]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl FromStr for UserId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

/// 平台角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum Role {
    Customer,
    Contractor,
    Distributor,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "Customer",
            Role::Contractor => "Contractor",
            Role::Distributor => "Distributor",
            Role::Admin => "Admin",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Customer" => Ok(Role::Customer),
            "Contractor" => Ok(Role::Contractor),
            "Distributor" => Ok(Role::Distributor),
            "Admin" => Ok(Role::Admin),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// 审计信息
///
/// `version` 每次修改递增，仓储据此做乐观并发控制。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditInfo {
    pub created_at: DateTime<Utc>,
    pub created_by: Option<UserId>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<UserId>,
    pub version: u64,
}

impl AuditInfo {
    pub fn new(user_id: Option<UserId>) -> Self {
        let now = Utc::now();
        Self {
            created_at: now,
            created_by: user_id.clone(),
            updated_at: now,
            updated_by: user_id,
            version: 1,
        }
    }

    /// 记录一次修改
    pub fn touch(&mut self, user_id: Option<UserId>) {
        self.updated_at = Utc::now();
        self.updated_by = user_id;
        self.version += 1;
    }
}

impl Default for AuditInfo {
    fn default() -> Self {
        Self::new(None)
    }
}

/// 单页最大条数
pub const MAX_PAGE_SIZE: u32 = 100;

/// 分页参数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 20,
        }
    }
}

impl Pagination {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self { page, page_size }.normalized()
    }

    /// 将页码与页大小夹到合法区间
    pub fn normalized(&self) -> Self {
        Self {
            page: self.page.max(1),
            page_size: self.page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// 跳过的条数，页码很大时不会溢出
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size)
    }
}

/// 分页结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

impl<T> PagedResult<T> {
    pub fn new(items: Vec<T>, total: u64, pagination: &Pagination) -> Self {
        Self {
            items,
            total,
            page: pagination.page,
            page_size: pagination.page_size,
        }
    }

    pub fn empty(pagination: &Pagination) -> Self {
        Self::new(Vec::new(), 0, pagination)
    }

    pub fn total_pages(&self) -> u32 {
        if self.page_size == 0 {
            return 0;
        }
        self.total.div_ceil(self.page_size as u64) as u32
    }

    /// 转换条目类型，保留分页信息
    pub fn map<U, F>(self, f: F) -> PagedResult<U>
    where
        F: FnMut(T) -> U,
    {
        PagedResult {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_normalized() {
        let p = Pagination::new(0, 500);
        assert_eq!(p.page, 1);
        assert_eq!(p.page_size, MAX_PAGE_SIZE);

        let p = Pagination::new(3, 0);
        assert_eq!(p.page_size, 1);
        assert_eq!(p.offset(), 2);
    }

    #[test]
    fn test_offset() {
        let p = Pagination::new(3, 20);
        assert_eq!(p.offset(), 40);
    }

    #[test]
    fn test_offset_of_huge_page_does_not_wrap() {
        let p = Pagination::new(u32::MAX, 100);
        assert_eq!(p.offset(), (u64::from(u32::MAX) - 1) * 100);

        let p = Pagination::new(42_949_674, 100);
        assert_eq!(p.offset(), 4_294_967_300);
    }

    #[test]
    fn test_total_pages() {
        let pagination = Pagination::new(1, 20);
        let result: PagedResult<u8> = PagedResult::new(vec![], 41, &pagination);
        assert_eq!(result.total_pages(), 3);

        let result: PagedResult<u8> = PagedResult::empty(&pagination);
        assert_eq!(result.total_pages(), 0);
    }

    #[test]
    fn test_audit_touch_bumps_version() {
        let mut audit = AuditInfo::default();
        assert_eq!(audit.version, 1);
        let user = UserId::new();
        audit.touch(Some(user.clone()));
        assert_eq!(audit.version, 2);
        assert_eq!(audit.updated_by, Some(user));
        assert!(audit.updated_at >= audit.created_at);
    }

    #[test]
    fn test_role_round_trip_through_str() {
        for role in [Role::Customer, Role::Contractor, Role::Distributor, Role::Admin] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("Partner".parse::<Role>().is_err());
    }

    #[test]
    fn test_user_id_serializes_as_plain_string() {
        let id = UserId::new();
        let json = serde_json::to_value(&id).unwrap();
        assert_eq!(json, serde_json::Value::String(id.0.to_string()));
    }
}
