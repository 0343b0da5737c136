//! 内存 Repository 实现

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use handyhub_common::{PagedResult, Pagination};
use handyhub_domain_core::{AggregateRoot, Entity, Identifier};
use handyhub_errors::{AppError, AppResult};
use handyhub_ports::{Document, QueryFilter, Repository, SortOrder};
use uuid::Uuid;

/// 基于 HashMap 的通用仓储
pub struct InMemoryRepository<T: Document> {
    items: RwLock<HashMap<Uuid, T>>,
}

impl<T: Document> InMemoryRepository<T> {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(HashMap::new()),
        }
    }

    fn read(&self) -> AppResult<std::sync::RwLockReadGuard<'_, HashMap<Uuid, T>>> {
        self.items
            .read()
            .map_err(|_| AppError::internal(format!("{} store lock poisoned", T::COLLECTION)))
    }

    fn write(&self) -> AppResult<std::sync::RwLockWriteGuard<'_, HashMap<Uuid, T>>> {
        self.items
            .write()
            .map_err(|_| AppError::internal(format!("{} store lock poisoned", T::COLLECTION)))
    }

    /// 过滤并排序
    fn select(&self, filter: &QueryFilter) -> AppResult<Vec<T>> {
        let items = self.read()?;
        let mut selected = Vec::new();
        for item in items.values() {
            let doc = serde_json::to_value(item).map_err(|e| {
                AppError::internal(format!("Failed to serialize {}: {}", T::COLLECTION, e))
            })?;
            if filter.matches(&doc) {
                selected.push(item.clone());
            }
        }
        drop(items);

        selected.sort_by(|a, b| {
            let key_a = (a.audit_info().created_at, a.id().as_uuid());
            let key_b = (b.audit_info().created_at, b.id().as_uuid());
            match filter.sort_order() {
                SortOrder::NewestFirst => key_b.cmp(&key_a),
                SortOrder::OldestFirst => key_a.cmp(&key_b),
            }
        });
        Ok(selected)
    }
}

impl<T: Document> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Document> Repository<T> for InMemoryRepository<T> {
    async fn find_by_id(&self, id: &T::Id) -> AppResult<Option<T>> {
        Ok(self.read()?.get(&id.as_uuid()).cloned())
    }

    async fn insert(&self, entity: &T) -> AppResult<()> {
        let key = entity.id().as_uuid();
        let mut items = self.write()?;
        if items.contains_key(&key) {
            return Err(AppError::conflict(format!(
                "{} {} already exists",
                T::COLLECTION,
                key
            )));
        }
        items.insert(key, entity.clone());
        Ok(())
    }

    async fn update(&self, entity: &T, expected_version: u64) -> AppResult<()> {
        let key = entity.id().as_uuid();
        let mut items = self.write()?;
        let stored = items
            .get_mut(&key)
            .ok_or_else(|| AppError::not_found(format!("{} {} not found", T::COLLECTION, key)))?;

        if stored.version() != expected_version {
            tracing::debug!(
                collection = T::COLLECTION,
                id = %key,
                expected_version,
                actual_version = stored.version(),
                "Optimistic concurrency conflict"
            );
            return Err(AppError::conflict(format!(
                "{} {} was modified concurrently",
                T::COLLECTION,
                key
            )));
        }

        *stored = entity.clone();
        Ok(())
    }

    async fn delete(&self, id: &T::Id) -> AppResult<()> {
        let key = id.as_uuid();
        self.write()?
            .remove(&key)
            .map(|_| ())
            .ok_or_else(|| AppError::not_found(format!("{} {} not found", T::COLLECTION, key)))
    }

    async fn exists(&self, id: &T::Id) -> AppResult<bool> {
        Ok(self.read()?.contains_key(&id.as_uuid()))
    }

    async fn count(&self, filter: &QueryFilter) -> AppResult<u64> {
        Ok(self.select(filter)?.len() as u64)
    }

    async fn find_all(&self, filter: &QueryFilter) -> AppResult<Vec<T>> {
        self.select(filter)
    }

    async fn find_page(
        &self,
        filter: &QueryFilter,
        pagination: &Pagination,
    ) -> AppResult<PagedResult<T>> {
        let pagination = pagination.normalized();
        let selected = self.select(filter)?;
        let total = selected.len() as u64;
        let items = selected
            .into_iter()
            .skip(usize::try_from(pagination.offset()).unwrap_or(usize::MAX))
            .take(pagination.page_size as usize)
            .collect();
        Ok(PagedResult::new(items, total, &pagination))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use handyhub_common::AuditInfo;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    struct NoteId(Uuid);

    impl Identifier for NoteId {
        fn as_uuid(&self) -> Uuid {
            self.0
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Note {
        id: NoteId,
        owner: String,
        body: String,
        audit_info: AuditInfo,
    }

    impl Note {
        fn new(owner: &str, body: &str) -> Self {
            Self {
                id: NoteId(Uuid::now_v7()),
                owner: owner.to_string(),
                body: body.to_string(),
                audit_info: AuditInfo::default(),
            }
        }
    }

    impl Entity for Note {
        type Id = NoteId;

        fn id(&self) -> &NoteId {
            &self.id
        }
    }

    impl AggregateRoot for Note {
        fn audit_info(&self) -> &AuditInfo {
            &self.audit_info
        }

        fn audit_info_mut(&mut self) -> &mut AuditInfo {
            &mut self.audit_info
        }
    }

    impl Document for Note {
        const COLLECTION: &'static str = "notes";
    }

    #[tokio::test]
    async fn test_insert_find_delete() {
        let repo = InMemoryRepository::<Note>::new();
        let note = Note::new("alice", "hello");

        repo.insert(&note).await.unwrap();
        assert!(repo.exists(&note.id).await.unwrap());
        assert!(matches!(repo.insert(&note).await, Err(AppError::Conflict(_))));

        let found = repo.find_by_id(&note.id).await.unwrap().unwrap();
        assert_eq!(found.body, "hello");

        repo.delete(&note.id).await.unwrap();
        assert!(repo.find_by_id(&note.id).await.unwrap().is_none());
        assert!(matches!(repo.delete(&note.id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_checks_version() {
        let repo = InMemoryRepository::<Note>::new();
        let mut note = Note::new("alice", "v1");
        repo.insert(&note).await.unwrap();

        let stale = note.clone();

        let expected = note.version();
        note.body = "v2".to_string();
        note.audit_info.touch(None);
        repo.update(&note, expected).await.unwrap();

        // 基于旧快照的第二个写入者失败
        let mut loser = stale.clone();
        loser.body = "lost".to_string();
        loser.audit_info.touch(None);
        let result = repo.update(&loser, stale.version()).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));

        let stored = repo.find_by_id(&note.id).await.unwrap().unwrap();
        assert_eq!(stored.body, "v2");
        assert_eq!(stored.version(), 2);
    }

    #[tokio::test]
    async fn test_filter_and_paginate_newest_first() {
        let repo = InMemoryRepository::<Note>::new();
        for i in 0..5 {
            let mut note = Note::new(if i % 2 == 0 { "alice" } else { "bob" }, &format!("note {}", i));
            note.audit_info.created_at = chrono::Utc::now() + chrono::Duration::seconds(i);
            repo.insert(&note).await.unwrap();
        }

        let filter = QueryFilter::new().eq("owner", "alice");
        assert_eq!(repo.count(&filter).await.unwrap(), 3);

        let page = repo.find_page(&filter, &Pagination::new(1, 2)).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].body, "note 4");
        assert_eq!(page.items[1].body, "note 2");

        let oldest = repo
            .find_one(&filter.clone().sort(SortOrder::OldestFirst))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(oldest.body, "note 0");
    }

    #[tokio::test]
    async fn test_page_past_the_end_is_empty() {
        let repo = InMemoryRepository::<Note>::new();
        for i in 0..3 {
            repo.insert(&Note::new("alice", &format!("note {}", i))).await.unwrap();
        }

        let filter = QueryFilter::new();
        for page in [2, 42_949_674, u32::MAX] {
            let result = repo.find_page(&filter, &Pagination::new(page, 100)).await.unwrap();
            assert_eq!(result.total, 3);
            assert!(result.items.is_empty(), "page {} should be empty", page);
        }
    }

    #[tokio::test]
    async fn test_search() {
        let repo = InMemoryRepository::<Note>::new();
        repo.insert(&Note::new("alice", "Fix the Roof")).await.unwrap();
        repo.insert(&Note::new("bob", "paint walls")).await.unwrap();

        let filter = QueryFilter::new().search(&["body"], Some("roof"));
        let found = repo.find_all(&filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].owner, "alice");
    }
}
