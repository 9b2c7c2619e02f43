//! Storage backend tests
//!
//! Tests for SeaOrmStorage using temporary SQLite databases, and for the
//! selector wired to a real durable store.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use presence_tracker::config::{DatabaseConfig, SelectorConfig};
use presence_tracker::storage::backend::{SeaOrmStorage, infer_backend_from_url};
use presence_tracker::storage::{
    BackendKind, BackendSelector, EntryKey, EntryStore, MemoryStorage,
};
use tempfile::TempDir;

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn sqlite_config(temp_dir: &TempDir) -> DatabaseConfig {
    let db_path = temp_dir.path().join("presence_test.db");
    DatabaseConfig {
        database_url: format!("sqlite://{}?mode=rwc", db_path.display()),
        pool_size: 2,
        ..DatabaseConfig::default()
    }
}

/// 创建临时 SQLite 数据库的存储实例
async fn create_temp_storage() -> (SeaOrmStorage, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let storage = SeaOrmStorage::connect(&sqlite_config(&temp_dir))
        .await
        .expect("Failed to create storage");
    (storage, temp_dir)
}

// =============================================================================
// SeaOrmStorage
// =============================================================================

#[cfg(test)]
mod sea_orm_storage_tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_reports_durable_sqlite() {
        let (storage, _dir) = create_temp_storage().await;
        assert_eq!(storage.backend_name(), "sqlite");
        assert_eq!(storage.kind(), BackendKind::Durable);

        let config = storage.get_backend_config().await;
        assert_eq!(config.storage_type, "sqlite");
        assert_eq!(storage.count().await.unwrap(), 0);
        assert!(storage.ping(Duration::from_secs(1)).await.is_ok());
    }

    #[tokio::test]
    async fn test_upsert_inserts_then_updates_in_place() {
        let (storage, _dir) = create_temp_storage().await;
        let key = EntryKey::new(day(2024, 3, 15), 9);

        let first = storage.upsert(key, 80, "standup".into()).await.unwrap();
        assert!(first.id > 0);
        assert_eq!(first.present_percentage, 80);

        let second = storage.upsert(key, 60, "after lunch".into()).await.unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.present_percentage, 60);
        assert_eq!(second.notes, "after lunch");
        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at >= first.updated_at);

        assert_eq!(storage.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_find_by_day_orders_by_hour() {
        let (storage, _dir) = create_temp_storage().await;
        let d = day(2024, 3, 15);
        for hour in [14u8, 9, 23, 0] {
            storage
                .upsert(EntryKey::new(d, hour), 50, String::new())
                .await
                .unwrap();
        }
        storage
            .upsert(EntryKey::new(day(2024, 3, 16), 1), 10, String::new())
            .await
            .unwrap();

        let hours: Vec<u8> = storage
            .find_by_day(d)
            .await
            .unwrap()
            .iter()
            .map(|e| e.hour)
            .collect();
        assert_eq!(hours, vec![0, 9, 14, 23]);
    }

    #[tokio::test]
    async fn test_find_by_range_is_inclusive() {
        let (storage, _dir) = create_temp_storage().await;
        for d in [day(2024, 3, 13), day(2024, 3, 14), day(2024, 3, 16), day(2024, 3, 17)] {
            storage
                .upsert(EntryKey::new(d, 8), 70, String::new())
                .await
                .unwrap();
        }

        let days: Vec<NaiveDate> = storage
            .find_by_range(day(2024, 3, 14), day(2024, 3, 16))
            .await
            .unwrap()
            .iter()
            .map(|e| e.day)
            .collect();
        assert_eq!(days, vec![day(2024, 3, 14), day(2024, 3, 16)]);
    }

    #[tokio::test]
    async fn test_list_all_is_newest_first() {
        let (storage, _dir) = create_temp_storage().await;
        storage
            .upsert(EntryKey::new(day(2024, 3, 14), 22), 1, String::new())
            .await
            .unwrap();
        storage
            .upsert(EntryKey::new(day(2024, 3, 15), 1), 2, String::new())
            .await
            .unwrap();
        storage
            .upsert(EntryKey::new(day(2024, 3, 15), 10), 3, String::new())
            .await
            .unwrap();

        let keys: Vec<EntryKey> = storage
            .list_all()
            .await
            .unwrap()
            .iter()
            .map(|e| e.key())
            .collect();
        assert_eq!(
            keys,
            vec![
                EntryKey::new(day(2024, 3, 15), 10),
                EntryKey::new(day(2024, 3, 15), 1),
                EntryKey::new(day(2024, 3, 14), 22),
            ]
        );
    }

    #[tokio::test]
    async fn test_delete_returns_removed_entry_once() {
        let (storage, _dir) = create_temp_storage().await;
        let key = EntryKey::new(day(2024, 3, 15), 12);
        storage.upsert(key, 90, "focus".into()).await.unwrap();

        let removed = storage.delete_by_key(key).await.unwrap().unwrap();
        assert_eq!(removed.present_percentage, 90);
        assert_eq!(removed.notes, "focus");

        assert!(storage.delete_by_key(key).await.unwrap().is_none());
        assert_eq!(storage.count().await.unwrap(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_upserts_return_their_own_values() {
        let (storage, _dir) = create_temp_storage().await;
        let storage = Arc::new(storage);
        let key = EntryKey::new(day(2024, 3, 15), 11);

        let mut handles = Vec::new();
        for pct in 0..16u8 {
            let storage = storage.clone();
            handles.push(tokio::spawn(async move {
                let notes = format!("writer {}", pct);
                let entry = storage.upsert(key, pct, notes.clone()).await.unwrap();
                (pct, notes, entry)
            }));
        }

        let mut created = Vec::new();
        for handle in handles {
            let (pct, notes, entry) = handle.await.unwrap();
            // 每个写入方看到的是自己写入的值
            assert_eq!(entry.present_percentage, pct);
            assert_eq!(entry.notes, notes);
            created.push(entry.created_at);
        }

        assert!(created.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(storage.count().await.unwrap(), 1);
        let stored = storage.find_by_day(key.day).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].notes, format!("writer {}", stored[0].present_percentage));
    }

    #[tokio::test]
    async fn test_data_survives_reconnect() {
        let temp_dir = TempDir::new().unwrap();
        let config = sqlite_config(&temp_dir);
        let key = EntryKey::new(day(2024, 3, 15), 7);

        {
            let storage = SeaOrmStorage::connect(&config).await.unwrap();
            storage.upsert(key, 42, String::new()).await.unwrap();
            storage.close().await.unwrap();
        }

        let storage = SeaOrmStorage::connect(&config).await.unwrap();
        let entries = storage.find_by_day(key.day).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].present_percentage, 42);
    }

    #[test]
    fn test_infer_backend_from_url() {
        assert_eq!(infer_backend_from_url("sqlite://x.db").unwrap(), "sqlite");
        assert_eq!(infer_backend_from_url("mysql://localhost/db").unwrap(), "mysql");
        assert!(infer_backend_from_url("redis://localhost").is_err());
    }
}

// =============================================================================
// 内存存储与持久化存储行为一致
// =============================================================================

#[cfg(test)]
mod contract_tests {
    use super::*;

    async fn exercise(store: &dyn EntryStore) {
        let d = day(2024, 3, 15);
        store.upsert(EntryKey::new(d, 9), 80, "a".into()).await.unwrap();
        store.upsert(EntryKey::new(d, 9), 90, "b".into()).await.unwrap();
        store.upsert(EntryKey::new(d, 3), 20, String::new()).await.unwrap();

        let entries = store.find_by_day(d).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].hour, 3);
        assert_eq!(entries[1].present_percentage, 90);
        assert_eq!(entries[1].notes, "b");
        assert_eq!(store.count().await.unwrap(), 2);

        assert!(
            store
                .delete_by_key(EntryKey::new(d, 4))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_memory_store_contract() {
        exercise(&MemoryStorage::new()).await;
    }

    #[tokio::test]
    async fn test_sqlite_store_contract() {
        let (storage, _dir) = create_temp_storage().await;
        exercise(&storage).await;
    }
}

// =============================================================================
// BackendSelector
// =============================================================================

#[cfg(test)]
mod selector_tests {
    use super::*;

    #[tokio::test]
    async fn test_selector_connects_to_sqlite() {
        let temp_dir = TempDir::new().unwrap();
        let selector =
            BackendSelector::connect(&sqlite_config(&temp_dir), SelectorConfig::default()).await;

        assert!(selector.is_durable_connected());
        assert_eq!(selector.active_backend(), BackendKind::Durable);

        let key = EntryKey::new(day(2024, 3, 15), 9);
        let served = selector
            .route("upsert", |store| async move {
                store.upsert(key, 75, String::new()).await
            })
            .await
            .unwrap();
        assert_eq!(served.backend, BackendKind::Durable);

        let status = selector.status().await;
        assert!(status.durable_configured);
        assert_eq!(status.durable_type.as_deref(), Some("sqlite"));

        selector.shutdown().await;
    }

    #[tokio::test]
    async fn test_selector_disabled_uses_volatile_only() {
        let temp_dir = TempDir::new().unwrap();
        let config = SelectorConfig {
            enabled: false,
            ..SelectorConfig::default()
        };
        let selector = BackendSelector::connect(&sqlite_config(&temp_dir), config).await;

        assert!(!selector.is_durable_connected());
        let served = selector
            .route("count", |store| async move { store.count().await })
            .await
            .unwrap();
        assert_eq!(served.backend, BackendKind::Volatile);
        assert!(Arc::new(selector).spawn_monitor().is_none());
    }

    #[tokio::test]
    async fn test_selector_starts_volatile_when_database_unreachable() {
        let database = DatabaseConfig {
            database_url: "postgres://nobody@127.0.0.1:1/presence".to_string(),
            connect_timeout_ms: 200,
            ..DatabaseConfig::default()
        };
        let config = SelectorConfig {
            probe_timeout_ms: 300,
            ..SelectorConfig::default()
        };
        let selector = BackendSelector::connect(&database, config).await;

        assert_eq!(selector.active_backend(), BackendKind::Volatile);
        assert!(!selector.probe().await);

        let key = EntryKey::new(day(2024, 3, 15), 9);
        let served = selector
            .route("upsert", |store| async move {
                store.upsert(key, 50, String::new()).await
            })
            .await
            .unwrap();
        assert_eq!(served.backend, BackendKind::Volatile);
    }
}
