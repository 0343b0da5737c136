//! 基于 JSONB 文档表的通用 Repository

use std::marker::PhantomData;

use async_trait::async_trait;
use handyhub_common::{PagedResult, Pagination};
use handyhub_domain_core::{AggregateRoot, Entity, Identifier};
use handyhub_errors::{AppError, AppResult};
use handyhub_ports::{Condition, Document, QueryFilter, Repository, SortOrder, field_path};
use sqlx::{PgPool, Postgres, QueryBuilder};

/// PostgreSQL 文档仓储
pub struct PostgresRepository<T: Document> {
    pool: PgPool,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Document> PostgresRepository<T> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _marker: PhantomData,
        }
    }

    fn encode(entity: &T) -> AppResult<(serde_json::Value, i64)> {
        let data = serde_json::to_value(entity).map_err(|e| {
            AppError::internal(format!("Failed to serialize {}: {}", T::COLLECTION, e))
        })?;
        let version = i64::try_from(entity.version())
            .map_err(|_| AppError::internal("Document version out of range"))?;
        Ok((data, version))
    }

    fn decode(data: serde_json::Value) -> AppResult<T> {
        serde_json::from_value(data).map_err(|e| {
            AppError::internal(format!("Failed to deserialize {}: {}", T::COLLECTION, e))
        })
    }
}

/// 转义 LIKE 模式中的通配符
pub(crate) fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// 追加集合与过滤条件
pub(crate) fn push_filter(qb: &mut QueryBuilder<'static, Postgres>, collection: &str, filter: &QueryFilter) {
    qb.push(" WHERE collection = ").push_bind(collection.to_string());

    for condition in filter.conditions() {
        match condition {
            Condition::Eq { field, value } => {
                qb.push(" AND data #>> ")
                    .push_bind(field_path(field))
                    .push(" = ")
                    .push_bind(value.clone());
            }
            Condition::In { field, values } => {
                qb.push(" AND data #>> ")
                    .push_bind(field_path(field))
                    .push(" = ANY(")
                    .push_bind(values.clone())
                    .push(")");
            }
            Condition::Contains { field, value } => {
                let path = field_path(field);
                qb.push(" AND jsonb_typeof(data #> ")
                    .push_bind(path.clone())
                    .push(") = 'array' AND EXISTS (SELECT 1 FROM jsonb_array_elements_text(data #> ")
                    .push_bind(path)
                    .push(") AS elem WHERE elem = ")
                    .push_bind(value.clone())
                    .push(")");
            }
        }
    }

    if let Some(search) = filter.text_search() {
        let pattern = format!("%{}%", escape_like(&search.term));
        qb.push(" AND (");
        for (i, field) in search.fields.iter().enumerate() {
            if i > 0 {
                qb.push(" OR ");
            }
            qb.push("data #>> ")
                .push_bind(field_path(field))
                .push(" ILIKE ")
                .push_bind(pattern.clone());
        }
        qb.push(")");
    }
}

pub(crate) fn push_order(qb: &mut QueryBuilder<'static, Postgres>, order: SortOrder) {
    match order {
        SortOrder::NewestFirst => qb.push(" ORDER BY created_at DESC, id DESC"),
        SortOrder::OldestFirst => qb.push(" ORDER BY created_at ASC, id ASC"),
    };
}

#[async_trait]
impl<T: Document> Repository<T> for PostgresRepository<T> {
    async fn find_by_id(&self, id: &T::Id) -> AppResult<Option<T>> {
        let data: Option<serde_json::Value> =
            sqlx::query_scalar("SELECT data FROM documents WHERE collection = $1 AND id = $2")
                .bind(T::COLLECTION)
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| AppError::database(format!("Failed to load {}: {}", T::COLLECTION, e)))?;

        data.map(Self::decode).transpose()
    }

    async fn insert(&self, entity: &T) -> AppResult<()> {
        let (data, version) = Self::encode(entity)?;
        let audit = entity.audit_info();

        let result = sqlx::query(
            r#"
            INSERT INTO documents (collection, id, data, version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (collection, id) DO NOTHING
            "#,
        )
        .bind(T::COLLECTION)
        .bind(entity.id().as_uuid())
        .bind(data)
        .bind(version)
        .bind(audit.created_at)
        .bind(audit.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to insert {}: {}", T::COLLECTION, e)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::conflict(format!(
                "{} {} already exists",
                T::COLLECTION,
                entity.id().as_uuid()
            )));
        }
        Ok(())
    }

    async fn update(&self, entity: &T, expected_version: u64) -> AppResult<()> {
        let (data, version) = Self::encode(entity)?;
        let expected = i64::try_from(expected_version)
            .map_err(|_| AppError::internal("Document version out of range"))?;
        let key = entity.id().as_uuid();

        let result = sqlx::query(
            r#"
            UPDATE documents
            SET data = $1, version = $2, updated_at = $3
            WHERE collection = $4 AND id = $5 AND version = $6
            "#,
        )
        .bind(data)
        .bind(version)
        .bind(entity.audit_info().updated_at)
        .bind(T::COLLECTION)
        .bind(key)
        .bind(expected)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update {}: {}", T::COLLECTION, e)))?;

        if result.rows_affected() == 0 {
            if self.exists(entity.id()).await? {
                tracing::debug!(
                    collection = T::COLLECTION,
                    id = %key,
                    expected_version,
                    "Optimistic concurrency conflict"
                );
                return Err(AppError::conflict(format!(
                    "{} {} was modified concurrently",
                    T::COLLECTION,
                    key
                )));
            }
            return Err(AppError::not_found(format!("{} {} not found", T::COLLECTION, key)));
        }
        Ok(())
    }

    async fn delete(&self, id: &T::Id) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(T::COLLECTION)
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete {}: {}", T::COLLECTION, e)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!(
                "{} {} not found",
                T::COLLECTION,
                id.as_uuid()
            )));
        }
        Ok(())
    }

    async fn exists(&self, id: &T::Id) -> AppResult<bool> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM documents WHERE collection = $1 AND id = $2)",
        )
        .bind(T::COLLECTION)
        .bind(id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to check {}: {}", T::COLLECTION, e)))
    }

    async fn count(&self, filter: &QueryFilter) -> AppResult<u64> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM documents");
        push_filter(&mut qb, T::COLLECTION, filter);

        let count: i64 = qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to count {}: {}", T::COLLECTION, e)))?;
        Ok(count.max(0) as u64)
    }

    async fn find_all(&self, filter: &QueryFilter) -> AppResult<Vec<T>> {
        let mut qb = QueryBuilder::new("SELECT data FROM documents");
        push_filter(&mut qb, T::COLLECTION, filter);
        push_order(&mut qb, filter.sort_order());

        let rows: Vec<serde_json::Value> = qb
            .build_query_scalar()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to query {}: {}", T::COLLECTION, e)))?;

        rows.into_iter().map(Self::decode).collect()
    }

    async fn find_page(
        &self,
        filter: &QueryFilter,
        pagination: &Pagination,
    ) -> AppResult<PagedResult<T>> {
        let pagination = pagination.normalized();
        let total = self.count(filter).await?;
        if total == 0 {
            return Ok(PagedResult::empty(&pagination));
        }
        if pagination.offset() >= total {
            return Ok(PagedResult::new(Vec::new(), total, &pagination));
        }

        let mut qb = QueryBuilder::new("SELECT data FROM documents");
        push_filter(&mut qb, T::COLLECTION, filter);
        push_order(&mut qb, filter.sort_order());
        qb.push(" LIMIT ")
            .push_bind(i64::from(pagination.page_size))
            .push(" OFFSET ")
            .push_bind(i64::try_from(pagination.offset()).unwrap_or(i64::MAX));

        let rows: Vec<serde_json::Value> = qb
            .build_query_scalar()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to query {}: {}", T::COLLECTION, e)))?;

        let items = rows.into_iter().map(Self::decode).collect::<AppResult<Vec<T>>>()?;
        Ok(PagedResult::new(items, total, &pagination))
    }
}
