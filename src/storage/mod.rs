//! Entry storage
//!
//! Two interchangeable [`EntryStore`] implementations share one contract:
//! - `backend::SeaOrmStorage`: durable, SQLite / MySQL / PostgreSQL via SeaORM
//! - `memory::MemoryStorage`: volatile, process-local
//!
//! `selector::BackendSelector` routes every call to one of them based on the
//! observed connectivity of the durable store.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::errors::Result;

pub mod backend;
pub mod memory;
pub mod models;
pub mod selector;

pub use backend::SeaOrmStorage;
pub use memory::MemoryStorage;
pub use models::{BackendKind, Entry, EntryKey, StorageConfig};
pub use selector::{BackendSelector, Served};

#[async_trait]
pub trait EntryStore: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// 按 (day, hour) 插入或更新；首次插入设置 created_at，之后只刷新 updated_at
    async fn upsert(&self, key: EntryKey, present_percentage: u8, notes: String) -> Result<Entry>;

    /// 某日全部记录，按 hour 升序
    async fn find_by_day(&self, day: NaiveDate) -> Result<Vec<Entry>>;

    /// [start, end] 闭区间内的记录，按 (day, hour) 升序
    async fn find_by_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Entry>>;

    /// 删除并返回被删除的记录；不存在时返回 None
    async fn delete_by_key(&self, key: EntryKey) -> Result<Option<Entry>>;

    /// 全部记录，按 (day, hour) 降序
    async fn list_all(&self) -> Result<Vec<Entry>>;

    async fn count(&self) -> Result<u64>;

    async fn get_backend_config(&self) -> StorageConfig;

    /// 连通性探测，内存存储恒为可用
    async fn ping(&self, _timeout: Duration) -> Result<()> {
        Ok(())
    }

    /// 释放底层资源（连接池等）
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
