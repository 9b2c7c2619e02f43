use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::storage::BackendSelector;

/// 关闭超时时间（秒）
const SHUTDOWN_TIMEOUT_SECS: u64 = 10;

pub async fn listen_for_shutdown(selector: Arc<BackendSelector>, monitor: Option<JoinHandle<()>>) {
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received, closing storage...");
        }
        Err(e) => {
            warn!(
                "Failed to listen for Ctrl+C: {}. Proceeding with shutdown anyway.",
                e
            );
        }
    }

    match timeout(
        Duration::from_secs(SHUTDOWN_TIMEOUT_SECS),
        perform_shutdown_tasks(selector, monitor),
    )
    .await
    {
        Ok(()) => info!("All shutdown tasks completed successfully"),
        Err(_) => error!(
            "Shutdown tasks timed out after {} seconds",
            SHUTDOWN_TIMEOUT_SECS
        ),
    }
}

/// 停止探测任务并关闭数据库连接池
pub async fn perform_shutdown_tasks(
    selector: Arc<BackendSelector>,
    monitor: Option<JoinHandle<()>>,
) {
    selector.shutdown().await;

    if let Some(handle) = monitor
        && let Err(e) = handle.await
    {
        warn!("Connectivity monitor ended abnormally: {}", e);
    }
}
