use std::sync::Arc;

use anyhow::Result;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::{RouteConfig, StaticConfig, get_config};
use crate::services::EntryService;
use crate::storage::BackendSelector;

pub struct StartupContext {
    pub selector: Arc<BackendSelector>,
    pub entry_service: Arc<EntryService>,
    pub route_config: RouteConfig,
    pub monitor: Option<JoinHandle<()>>,
}

/// 准备服务器启动的上下文
///
/// 持久化存储连接失败不会中止启动，选择器会以内存存储开始并在后台重连。
pub async fn prepare_server_startup() -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    // sqlx 的 rustls 需要进程级 crypto provider；重复安装返回 Err，可忽略
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("rustls crypto provider already installed");
    }

    let config = get_config();
    let context = build_context(&config).await;

    info!(
        "Pre-startup completed in {:?}, active backend: {}",
        start_time.elapsed(),
        context.selector.active_backend()
    );
    Ok(context)
}

/// 由给定配置组装服务组件（测试中可直接调用）
pub async fn build_context(config: &StaticConfig) -> StartupContext {
    let selector = Arc::new(
        BackendSelector::connect(&config.database, config.selector.clone()).await,
    );

    let status = selector.status().await;
    match status.durable_type.as_deref() {
        Some(kind) if status.durable_connected => info!("Using durable storage: {}", kind),
        _ if config.selector.enabled => {
            warn!("Durable storage not connected, serving from volatile store")
        }
        _ => info!("Using volatile storage only"),
    }

    let monitor = selector.spawn_monitor();
    if monitor.is_some() {
        debug!(
            "Connectivity monitor started (interval {}s, timeout {}ms)",
            config.selector.probe_interval_secs, config.selector.probe_timeout_ms
        );
    }

    let entry_service = Arc::new(EntryService::new(
        selector.clone(),
        config.calendar.clone(),
    ));

    StartupContext {
        selector,
        entry_service,
        route_config: config.routes.clone(),
        monitor,
    }
}
