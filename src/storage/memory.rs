//! Volatile in-process entry store
//!
//! Used when the durable store is unreachable. Data lives only as long as the
//! process and is never reconciled with the database.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry as MapEntry;
use tracing::debug;

use super::models::{BackendKind, Entry, EntryKey, StorageConfig};
use super::EntryStore;
use crate::errors::Result;

/// 以 (day, hour) 为键的内存存储
///
/// DashMap 分片锁保证同一个键的 upsert 串行，不同键互不阻塞。
#[derive(Default)]
pub struct MemoryStorage {
    entries: DashMap<EntryKey, Entry>,
    next_id: AtomicI64,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }

    fn allocate_id(&self) -> i64 {
        // Default 构造时计数器从 0 开始，统一跳过 0
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        if id == 0 {
            self.next_id.fetch_add(1, Ordering::Relaxed)
        } else {
            id
        }
    }

    fn collect_sorted<F>(&self, predicate: F) -> Vec<Entry>
    where
        F: Fn(&EntryKey) -> bool,
    {
        let mut matched: Vec<Entry> = self
            .entries
            .iter()
            .filter(|item| predicate(item.key()))
            .map(|item| item.value().clone())
            .collect();
        matched.sort_by_key(Entry::key);
        matched
    }
}

#[async_trait]
impl EntryStore for MemoryStorage {
    fn kind(&self) -> BackendKind {
        BackendKind::Volatile
    }

    async fn upsert(&self, key: EntryKey, present_percentage: u8, notes: String) -> Result<Entry> {
        // 时间戳在分片锁内取，保证 updated_at 与提交顺序一致
        let entry = match self.entries.entry(key) {
            MapEntry::Occupied(mut occupied) => {
                let now = Utc::now();
                let existing = occupied.get_mut();
                existing.present_percentage = present_percentage;
                existing.notes = notes;
                existing.updated_at = now;
                existing.clone()
            }
            MapEntry::Vacant(vacant) => {
                let now = Utc::now();
                let created = Entry {
                    id: self.allocate_id(),
                    day: key.day,
                    hour: key.hour,
                    present_percentage,
                    notes,
                    created_at: now,
                    updated_at: now,
                };
                vacant.insert(created.clone());
                created
            }
        };

        debug!("Volatile entry upserted: {}", key);
        Ok(entry)
    }

    async fn find_by_day(&self, day: NaiveDate) -> Result<Vec<Entry>> {
        Ok(self.collect_sorted(|key| key.day == day))
    }

    async fn find_by_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Entry>> {
        Ok(self.collect_sorted(|key| key.day >= start && key.day <= end))
    }

    async fn delete_by_key(&self, key: EntryKey) -> Result<Option<Entry>> {
        Ok(self.entries.remove(&key).map(|(_, entry)| entry))
    }

    async fn list_all(&self) -> Result<Vec<Entry>> {
        let mut all = self.collect_sorted(|_| true);
        all.reverse();
        Ok(all)
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.entries.len() as u64)
    }

    async fn get_backend_config(&self) -> StorageConfig {
        StorageConfig {
            kind: BackendKind::Volatile,
            storage_type: "memory".to_string(),
        }
    }
}
