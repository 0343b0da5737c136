//! 服务测试用的仓储包装

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use handyhub_adapter_memory::InMemoryRepository;
use handyhub_common::{PagedResult, Pagination};
use handyhub_errors::AppResult;
use handyhub_ports::{Document, QueryFilter, Repository};
use tokio::sync::Barrier;

/// 让两次 `find_by_id` 在读取后互相等待，模拟两个操作基于同一快照并发执行
pub struct InterleavedRepository<T: Document> {
    inner: InMemoryRepository<T>,
    barrier: Barrier,
    gated: AtomicUsize,
}

impl<T: Document> InterleavedRepository<T> {
    pub fn new() -> Self {
        Self {
            inner: InMemoryRepository::new(),
            barrier: Barrier::new(2),
            gated: AtomicUsize::new(0),
        }
    }

    /// 之后的两次按 ID 读取将在屏障处会合
    pub fn interleave_next_loads(&self) {
        self.gated.store(2, Ordering::SeqCst);
    }
}

#[async_trait]
impl<T: Document> Repository<T> for InterleavedRepository<T> {
    async fn find_by_id(&self, id: &T::Id) -> AppResult<Option<T>> {
        let found = self.inner.find_by_id(id).await?;
        let gated = self
            .gated
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if gated {
            self.barrier.wait().await;
        }
        Ok(found)
    }

    async fn insert(&self, entity: &T) -> AppResult<()> {
        self.inner.insert(entity).await
    }

    async fn update(&self, entity: &T, expected_version: u64) -> AppResult<()> {
        self.inner.update(entity, expected_version).await
    }

    async fn delete(&self, id: &T::Id) -> AppResult<()> {
        self.inner.delete(id).await
    }

    async fn exists(&self, id: &T::Id) -> AppResult<bool> {
        self.inner.exists(id).await
    }

    async fn count(&self, filter: &QueryFilter) -> AppResult<u64> {
        self.inner.count(filter).await
    }

    async fn find_all(&self, filter: &QueryFilter) -> AppResult<Vec<T>> {
        self.inner.find_all(filter).await
    }

    async fn find_page(
        &self,
        filter: &QueryFilter,
        pagination: &Pagination,
    ) -> AppResult<PagedResult<T>> {
        self.inner.find_page(filter, pagination).await
    }
}
