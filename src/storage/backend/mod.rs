//! SeaORM storage backend
//!
//! Durable entry storage using SeaORM,
//! supporting SQLite, MySQL/MariaDB, and PostgreSQL.

mod connection;
mod converters;
mod mutations;
mod query;
pub mod retry;

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::errors::{PresenceError, Result};
use crate::storage::EntryStore;
use crate::storage::models::{BackendKind, Entry, EntryKey, StorageConfig};

pub use connection::{connect_generic, connect_sqlite, run_migrations};
pub use converters::{entry_to_active_model, model_to_entry};

/// 从数据库 URL 推断数据库类型
pub fn infer_backend_from_url(database_url: &str) -> Result<String> {
    if database_url.starts_with("sqlite://")
        || database_url.starts_with("sqlite:")
        || database_url.ends_with(".db")
        || database_url.ends_with(".sqlite")
        || database_url == ":memory:"
    {
        Ok("sqlite".to_string())
    } else if database_url.starts_with("mysql://") || database_url.starts_with("mariadb://") {
        Ok("mysql".to_string())
    } else if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        Ok("postgres".to_string())
    } else {
        Err(PresenceError::database_config(format!(
            "无法从 URL 推断数据库类型: {}. 支持的 URL 格式: sqlite://, mysql://, mariadb://, postgres://",
            database_url
        )))
    }
}

/// SeaORM-based durable entry store
#[derive(Clone)]
pub struct SeaOrmStorage {
    db: DatabaseConnection,
    backend_name: String,
    retry_config: retry::RetryConfig,
    operation_timeout_ms: u64,
}

impl SeaOrmStorage {
    /// 连接数据库并执行迁移
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        if config.database_url.is_empty() {
            return Err(PresenceError::database_config("database_url 未设置"));
        }

        let backend_name = infer_backend_from_url(&config.database_url)?;

        let db = if backend_name == "sqlite" {
            connect_sqlite(config).await?
        } else {
            connect_generic(config, &backend_name).await?
        };

        run_migrations(&db).await?;

        let storage = SeaOrmStorage {
            db,
            backend_name,
            retry_config: retry::RetryConfig::from(config),
            operation_timeout_ms: config.operation_timeout_ms,
        };

        info!(
            "{} storage initialized",
            storage.backend_name.to_uppercase()
        );
        Ok(storage)
    }

    pub fn backend_name(&self) -> &str {
        &self.backend_name
    }
}

#[async_trait]
impl EntryStore for SeaOrmStorage {
    fn kind(&self) -> BackendKind {
        BackendKind::Durable
    }

    async fn upsert(&self, key: EntryKey, present_percentage: u8, notes: String) -> Result<Entry> {
        self.upsert_entry(key, present_percentage, notes).await
    }

    async fn find_by_day(&self, day: NaiveDate) -> Result<Vec<Entry>> {
        self.load_range(day, day).await
    }

    async fn find_by_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Entry>> {
        self.load_range(start, end).await
    }

    async fn delete_by_key(&self, key: EntryKey) -> Result<Option<Entry>> {
        self.remove_entry(key).await
    }

    async fn list_all(&self) -> Result<Vec<Entry>> {
        self.load_all_desc().await
    }

    async fn count(&self) -> Result<u64> {
        self.count_entries().await
    }

    async fn get_backend_config(&self) -> StorageConfig {
        StorageConfig {
            kind: BackendKind::Durable,
            storage_type: self.backend_name.clone(),
        }
    }

    async fn ping(&self, timeout: Duration) -> Result<()> {
        match tokio::time::timeout(timeout, self.db.ping()).await {
            Ok(result) => result.map_err(PresenceError::from),
            Err(_) => Err(PresenceError::store_unavailable(format!(
                "{} ping timed out after {}ms",
                self.backend_name,
                timeout.as_millis()
            ))),
        }
    }

    async fn close(&self) -> Result<()> {
        self.db.clone().close().await.map_err(PresenceError::from)?;
        info!("{} connection pool closed", self.backend_name.to_uppercase());
        Ok(())
    }
}
