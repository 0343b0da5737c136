//! Repository trait 定义

use async_trait::async_trait;
use handyhub_common::{PagedResult, Pagination};
use handyhub_domain_core::AggregateRoot;
use handyhub_errors::AppResult;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::QueryFilter;

/// 可被通用仓储存储的聚合
pub trait Document: AggregateRoot + Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// 集合名称（表/命名空间）
    const COLLECTION: &'static str;
}

/// 通用 Repository trait
///
/// 所有聚合共用同一套数据访问接口；`update` 以版本号做乐观并发控制，
/// 保证同一聚合同一时刻只有一个写入者成功。
#[async_trait]
pub trait Repository<T: Document>: Send + Sync {
    /// 根据 ID 查找
    async fn find_by_id(&self, id: &T::Id) -> AppResult<Option<T>>;

    /// 新增实体，ID 已存在时返回 Conflict
    async fn insert(&self, entity: &T) -> AppResult<()>;

    /// 更新实体，存储中的版本必须等于 `expected_version`
    async fn update(&self, entity: &T, expected_version: u64) -> AppResult<()>;

    /// 删除实体，不存在时返回 NotFound
    async fn delete(&self, id: &T::Id) -> AppResult<()>;

    /// 检查是否存在
    async fn exists(&self, id: &T::Id) -> AppResult<bool>;

    /// 统计满足条件的数量
    async fn count(&self, filter: &QueryFilter) -> AppResult<u64>;

    /// 按条件查询全部
    async fn find_all(&self, filter: &QueryFilter) -> AppResult<Vec<T>>;

    /// 按条件分页查询
    async fn find_page(
        &self,
        filter: &QueryFilter,
        pagination: &Pagination,
    ) -> AppResult<PagedResult<T>>;

    /// 按条件查询第一条
    async fn find_one(&self, filter: &QueryFilter) -> AppResult<Option<T>> {
        let page = self.find_page(filter, &Pagination::new(1, 1)).await?;
        Ok(page.items.into_iter().next())
    }
}
