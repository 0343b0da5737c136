//! 存储装配：配置了数据库时使用 PostgreSQL，否则使用内存存储

use std::sync::Arc;

use handyhub_adapter_memory::InMemoryRepository;
use handyhub_adapter_postgres::{
    PostgresConfig, PostgresRepository, check_connection, create_pool, run_migrations,
};
use handyhub_config::DatabaseConfig;
use handyhub_errors::AppResult;
use handyhub_ports::{Document, Repository};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::domain::repositories::Repositories;

#[derive(Clone)]
pub enum Storage {
    Memory,
    Postgres(PgPool),
}

impl Storage {
    pub async fn connect(config: Option<&DatabaseConfig>) -> AppResult<Self> {
        let Some(config) = config else {
            warn!("No database configured, data will be kept in memory only");
            return Ok(Storage::Memory);
        };

        let pool = create_pool(
            &PostgresConfig::new(config.url.expose_secret().as_str())
                .with_max_connections(config.max_connections),
        )
        .await?;
        if config.run_migrations {
            run_migrations(&pool).await?;
        }
        info!(max_connections = config.max_connections, "PostgreSQL storage ready");
        Ok(Storage::Postgres(pool))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Storage::Memory => "memory",
            Storage::Postgres(_) => "postgres",
        }
    }

    /// 就绪检查
    pub async fn check(&self) -> AppResult<()> {
        match self {
            Storage::Memory => Ok(()),
            Storage::Postgres(pool) => check_connection(pool).await,
        }
    }

    fn repository<T: Document>(&self) -> Arc<dyn Repository<T>> {
        match self {
            Storage::Memory => Arc::new(InMemoryRepository::<T>::new()),
            Storage::Postgres(pool) => Arc::new(PostgresRepository::<T>::new(pool.clone())),
        }
    }

    pub fn repositories(&self) -> Repositories {
        Repositories {
            users: self.repository(),
            service_requests: self.repository(),
            contractor_applications: self.repository(),
            material_requests: self.repository(),
            distributor_applications: self.repository(),
            partner_requests: self.repository(),
            notifications: self.repository(),
            conversations: self.repository(),
            messages: self.repository(),
        }
    }
}
