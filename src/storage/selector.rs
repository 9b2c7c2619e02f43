//! Backend selection between the durable and volatile stores
//!
//! Every operation is served by exactly one backend: the durable store when it
//! is believed reachable, the volatile store otherwise. Reachability is tracked
//! by a connectivity flag that is updated by a background probe and by
//! operations that fail with `StoreUnavailable`.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::backend::SeaOrmStorage;
use super::memory::MemoryStorage;
use super::models::BackendKind;
use super::EntryStore;
use crate::config::{DatabaseConfig, SelectorConfig};
use crate::errors::{PresenceError, Result};

type SharedStore = Arc<dyn EntryStore>;

/// 操作结果及实际服务该操作的后端
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Served<T> {
    pub data: T,
    pub backend: BackendKind,
}

impl<T> Served<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Served<U> {
        Served {
            data: f(self.data),
            backend: self.backend,
        }
    }
}

/// 选择器状态快照（健康检查使用）
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectorStatus {
    pub active: BackendKind,
    pub durable_configured: bool,
    pub durable_connected: bool,
    pub durable_type: Option<String>,
    pub last_probe_at: Option<DateTime<Utc>>,
}

pub struct BackendSelector {
    durable: ArcSwapOption<SharedStore>,
    volatile: SharedStore,
    connected: AtomicBool,
    /// 启动时连接失败后，探测任务用它重新建立连接
    reconnect: Option<DatabaseConfig>,
    config: SelectorConfig,
    last_probe_at: ArcSwapOption<DateTime<Utc>>,
    shutdown_tx: watch::Sender<bool>,
}

impl BackendSelector {
    /// 用给定的持久化存储构造；`None` 表示只使用内存存储
    pub fn new(durable: Option<SharedStore>, config: SelectorConfig) -> Self {
        let connected = durable.is_some();
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            durable: ArcSwapOption::from(durable.map(Arc::new)),
            volatile: Arc::new(MemoryStorage::new()),
            connected: AtomicBool::new(connected),
            reconnect: None,
            config,
            last_probe_at: ArcSwapOption::empty(),
            shutdown_tx,
        }
    }

    /// 按配置连接持久化存储
    ///
    /// 连接失败不会阻止启动：选择器以断开状态开始，由探测任务负责重连。
    pub async fn connect(database: &DatabaseConfig, config: SelectorConfig) -> Self {
        if !config.enabled {
            info!("Durable storage disabled, serving from volatile store only");
            return Self::new(None, config);
        }

        match SeaOrmStorage::connect(database).await {
            Ok(storage) => {
                let mut selector = Self::new(Some(Arc::new(storage)), config);
                selector.reconnect = Some(database.clone());
                selector
            }
            Err(e) => {
                warn!(
                    "Durable store unavailable at startup: {}. Falling back to volatile store",
                    e
                );
                let mut selector = Self::new(None, config);
                selector.reconnect = Some(database.clone());
                selector
            }
        }
    }

    pub fn is_durable_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire) && self.durable.load().is_some()
    }

    pub fn active_backend(&self) -> BackendKind {
        if self.is_durable_connected() {
            BackendKind::Durable
        } else {
            BackendKind::Volatile
        }
    }

    pub async fn status(&self) -> SelectorStatus {
        let durable = self.durable.load_full();
        let durable_type = match durable.as_deref() {
            Some(store) => Some(store.get_backend_config().await.storage_type),
            None => None,
        };

        SelectorStatus {
            active: self.active_backend(),
            durable_configured: durable.is_some() || self.reconnect.is_some(),
            durable_connected: self.is_durable_connected(),
            durable_type,
            last_probe_at: self.last_probe_at.load_full().map(|at| *at),
        }
    }

    /// 在当前后端上执行操作
    ///
    /// 持久化存储返回 `StoreUnavailable` 时标记为断开并在内存存储上重试同一操作，
    /// 其他错误原样返回。
    pub async fn route<T, F, Fut>(&self, op_name: &str, op: F) -> Result<Served<T>>
    where
        F: Fn(SharedStore) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(durable) = self.connected_durable() {
            let backend = durable.kind();
            match op(durable).await {
                Ok(data) => return Ok(Served { data, backend }),
                Err(PresenceError::StoreUnavailable(reason)) => {
                    warn!(
                        "Operation '{}' could not reach durable store: {}",
                        op_name, reason
                    );
                    self.set_connected(false, &reason);
                }
                Err(e) => return Err(e),
            }
        }

        debug!("Operation '{}' served by volatile store", op_name);
        let backend = self.volatile.kind();
        let data = op(self.volatile.clone()).await?;
        Ok(Served { data, backend })
    }

    fn connected_durable(&self) -> Option<SharedStore> {
        if !self.connected.load(Ordering::Acquire) {
            return None;
        }
        self.durable.load_full().map(|store| (*store).clone())
    }

    fn set_connected(&self, connected: bool, detail: &str) {
        let previous = self.connected.swap(connected, Ordering::AcqRel);
        match (previous, connected) {
            (true, false) => warn!(
                "Durable store lost ({}); switching to volatile store",
                detail
            ),
            (false, true) => info!("Durable store restored; switching back to durable store"),
            _ => {}
        }
    }

    /// 执行一次连通性探测，返回探测后持久化存储是否可用
    pub async fn probe(&self) -> bool {
        let timeout = Duration::from_millis(self.config.probe_timeout_ms);
        self.last_probe_at.store(Some(Arc::new(Utc::now())));

        if let Some(durable) = self.durable.load_full() {
            return match durable.ping(timeout).await {
                Ok(()) => {
                    self.set_connected(true, "ping ok");
                    true
                }
                Err(e) => {
                    self.set_connected(false, e.message());
                    false
                }
            };
        }

        let Some(database) = &self.reconnect else {
            return false;
        };

        match tokio::time::timeout(timeout, SeaOrmStorage::connect(database)).await {
            Ok(Ok(storage)) => {
                self.durable.store(Some(Arc::new(Arc::new(storage) as SharedStore)));
                self.set_connected(true, "reconnected");
                true
            }
            Ok(Err(e)) => {
                debug!("Durable store reconnect failed: {}", e);
                false
            }
            Err(_) => {
                debug!("Durable store reconnect timed out");
                false
            }
        }
    }

    /// 启动后台探测任务，`shutdown` 后退出
    pub fn spawn_monitor(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        if self.durable.load().is_none() && self.reconnect.is_none() {
            return None;
        }

        let selector = Arc::clone(self);
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let period = Duration::from_secs(self.config.probe_interval_secs.max(1));

        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // interval 的第一次 tick 立即返回
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        selector.probe().await;
                    }
                    _ = shutdown_rx.changed() => {
                        debug!("Connectivity monitor stopped");
                        break;
                    }
                }
            }
        }))
    }

    /// 停止探测任务并关闭持久化存储连接
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);

        if let Some(durable) = self.durable.swap(None) {
            self.connected.store(false, Ordering::Release);
            if let Err(e) = durable.close().await {
                warn!("Failed to close durable store: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::models::{Entry, EntryKey, StorageConfig};
    use async_trait::async_trait;
    use chrono::NaiveDate;

    /// 可切换可用性的持久化存储替身
    struct FlakyStore {
        inner: MemoryStorage,
        up: AtomicBool,
    }

    impl FlakyStore {
        fn new(up: bool) -> Self {
            Self {
                inner: MemoryStorage::new(),
                up: AtomicBool::new(up),
            }
        }

        fn check(&self) -> Result<()> {
            if self.up.load(Ordering::SeqCst) {
                Ok(())
            } else {
                Err(PresenceError::store_unavailable("connection refused"))
            }
        }
    }

    #[async_trait]
    impl EntryStore for FlakyStore {
        fn kind(&self) -> BackendKind {
            BackendKind::Durable
        }

        async fn upsert(&self, key: EntryKey, pct: u8, notes: String) -> Result<Entry> {
            self.check()?;
            self.inner.upsert(key, pct, notes).await
        }

        async fn find_by_day(&self, day: NaiveDate) -> Result<Vec<Entry>> {
            self.check()?;
            self.inner.find_by_day(day).await
        }

        async fn find_by_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Entry>> {
            self.check()?;
            self.inner.find_by_range(start, end).await
        }

        async fn delete_by_key(&self, key: EntryKey) -> Result<Option<Entry>> {
            self.check()?;
            self.inner.delete_by_key(key).await
        }

        async fn list_all(&self) -> Result<Vec<Entry>> {
            self.check()?;
            self.inner.list_all().await
        }

        async fn count(&self) -> Result<u64> {
            self.check()?;
            self.inner.count().await
        }

        async fn get_backend_config(&self) -> StorageConfig {
            StorageConfig {
                kind: BackendKind::Durable,
                storage_type: "flaky".to_string(),
            }
        }

        async fn ping(&self, _timeout: Duration) -> Result<()> {
            self.check()
        }
    }

    fn key() -> EntryKey {
        EntryKey::new(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(), 9)
    }

    #[tokio::test]
    async fn test_routes_to_durable_when_connected() {
        let selector = BackendSelector::new(
            Some(Arc::new(FlakyStore::new(true))),
            SelectorConfig::default(),
        );

        let served = selector
            .route("upsert", |store| async move {
                store.upsert(key(), 80, String::new()).await
            })
            .await
            .unwrap();

        assert_eq!(served.backend, BackendKind::Durable);
        assert_eq!(selector.active_backend(), BackendKind::Durable);
    }

    #[tokio::test]
    async fn test_unavailable_durable_falls_back_and_flips_flag() {
        let flaky = Arc::new(FlakyStore::new(false));
        let selector = BackendSelector::new(Some(flaky.clone()), SelectorConfig::default());

        let served = selector
            .route("upsert", |store| async move {
                store.upsert(key(), 70, String::new()).await
            })
            .await
            .unwrap();

        assert_eq!(served.backend, BackendKind::Volatile);
        assert_eq!(served.data.present_percentage, 70);
        assert!(!selector.is_durable_connected());

        // 断开后后续操作直接走内存存储
        let count = selector
            .route("count", |store| async move { store.count().await })
            .await
            .unwrap();
        assert_eq!(count.backend, BackendKind::Volatile);
        assert_eq!(count.data, 1);
    }

    #[tokio::test]
    async fn test_probe_restores_durable_routing() {
        let flaky = Arc::new(FlakyStore::new(false));
        let selector = BackendSelector::new(Some(flaky.clone()), SelectorConfig::default());

        assert!(!selector.probe().await);
        assert_eq!(selector.active_backend(), BackendKind::Volatile);

        flaky.up.store(true, Ordering::SeqCst);
        assert!(selector.probe().await);
        assert_eq!(selector.active_backend(), BackendKind::Durable);
        assert!(selector.status().await.last_probe_at.is_some());
    }

    #[tokio::test]
    async fn test_non_connectivity_errors_do_not_fall_back() {
        let selector = BackendSelector::new(
            Some(Arc::new(FlakyStore::new(true))),
            SelectorConfig::default(),
        );

        let result: Result<Served<()>> = selector
            .route("broken", |_store| async {
                Err(PresenceError::database_operation("constraint violated"))
            })
            .await;

        assert!(matches!(result, Err(PresenceError::DatabaseOperation(_))));
        assert!(selector.is_durable_connected());
    }

    #[tokio::test]
    async fn test_volatile_only_selector() {
        let selector = Arc::new(BackendSelector::new(None, SelectorConfig::default()));
        assert_eq!(selector.active_backend(), BackendKind::Volatile);
        assert!(!selector.probe().await);
        assert!(selector.spawn_monitor().is_none());

        let status = selector.status().await;
        assert!(!status.durable_configured);
        assert!(status.durable_type.is_none());
    }
}
