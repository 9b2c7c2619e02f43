//! 数据库操作重试与连通性判定
//!
//! 短暂故障（锁冲突、连接抖动）在本层重试；重试耗尽后仍是连接类错误的，
//! 交给 BackendSelector 切换到内存存储。

use std::future::Future;
use std::ops::Deref;
use std::time::Duration;

use sea_orm::DbErr;
use sea_orm::error::RuntimeErr;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::DatabaseConfig;

const TIMEOUT_MARKER: &str = "timed out";

/// 连接类错误：数据库不可达、连接池耗尽、操作超时
pub fn is_connectivity_error(err: &DbErr) -> bool {
    match err {
        DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => true,
        DbErr::Exec(runtime_err) | DbErr::Query(runtime_err) => {
            is_connectivity_runtime_error(runtime_err)
        }
        DbErr::Custom(msg) => msg.contains(TIMEOUT_MARKER),
        _ => false,
    }
}

fn is_connectivity_runtime_error(err: &RuntimeErr) -> bool {
    match err {
        RuntimeErr::SqlxError(sqlx_err) => matches!(
            sqlx_err.deref(),
            sea_orm::sqlx::Error::Io(_)
                | sea_orm::sqlx::Error::PoolTimedOut
                | sea_orm::sqlx::Error::PoolClosed
                | sea_orm::sqlx::Error::WorkerCrashed
        ),
        RuntimeErr::Internal(msg) => {
            let msg = msg.to_lowercase();
            msg.contains("connection refused") || msg.contains("broken pipe")
        }
        #[allow(unreachable_patterns)]
        _ => false,
    }
}

/// 判断数据库错误是否可重试
pub fn is_retryable_error(err: &DbErr) -> bool {
    if is_connectivity_error(err) {
        return true;
    }
    match err {
        DbErr::Exec(runtime_err) | DbErr::Query(runtime_err) => is_lock_conflict(runtime_err),
        _ => false,
    }
}

/// 死锁、锁等待超时、SQLite BUSY
fn is_lock_conflict(err: &RuntimeErr) -> bool {
    match err {
        RuntimeErr::SqlxError(sqlx_err) => {
            if let Some(db_err) = sqlx_err.deref().as_database_error()
                && let Some(code) = db_err.code()
            {
                return matches!(
                    code.as_ref(),
                    // MySQL 死锁和锁超时
                    "1213" | "1205" |
                    // PostgreSQL 序列化失败和死锁
                    "40001" | "40P01" |
                    // SQLite BUSY 和 LOCKED
                    "5" | "6"
                );
            }
            is_lock_conflict_message(&sqlx_err.to_string().to_lowercase())
        }
        RuntimeErr::Internal(msg) => is_lock_conflict_message(&msg.to_lowercase()),
        #[allow(unreachable_patterns)]
        _ => false,
    }
}

fn is_lock_conflict_message(err_str: &str) -> bool {
    err_str.contains("deadlock")
        || err_str.contains("lock wait timeout")
        || err_str.contains("database is locked")
        || err_str.contains("serialization failure")
}

/// 重试配置
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay_ms: 100,
            max_delay_ms: 1000,
        }
    }
}

impl From<&DatabaseConfig> for RetryConfig {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            max_retries: config.retry_count,
            base_delay_ms: config.retry_base_delay_ms,
            max_delay_ms: config.retry_max_delay_ms,
        }
    }
}

/// 计算指数退避延迟（带 0-25% 抖动）
fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> u64 {
    use rand::RngExt;
    let exp_delay = base_ms.saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)));
    let capped = exp_delay.min(max_ms);
    let jitter = rand::rng().random_range(0..=capped / 4);
    capped.saturating_add(jitter)
}

/// 带单次超时的指数退避重试
///
/// 每次尝试独立计时；超时按可重试处理，耗尽后返回含 "timed out" 的 `DbErr::Custom`，
/// `is_connectivity_error` 会把它识别为连接类错误。
pub async fn with_retry_timeout<T, F, Fut>(
    operation_name: &str,
    config: RetryConfig,
    timeout_ms: u64,
    mut operation: F,
) -> Result<T, DbErr>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DbErr>>,
{
    let timeout_duration = Duration::from_millis(timeout_ms);
    let mut attempt = 0;

    loop {
        let err = match tokio::time::timeout(timeout_duration, operation()).await {
            Ok(Ok(value)) => {
                if attempt > 0 {
                    debug!(
                        "Operation '{}' succeeded after {} retries",
                        operation_name, attempt
                    );
                }
                return Ok(value);
            }
            Ok(Err(e)) => e,
            Err(_elapsed) => DbErr::Custom(format!(
                "Operation '{}' {} after {}ms",
                operation_name, TIMEOUT_MARKER, timeout_ms
            )),
        };

        if !is_retryable_error(&err) {
            debug!(
                "Operation '{}' failed with non-retryable error: {}",
                operation_name, err
            );
            return Err(err);
        }

        if attempt >= config.max_retries {
            warn!(
                "Operation '{}' failed, retries exhausted: {}",
                operation_name, err
            );
            return Err(err);
        }

        attempt += 1;
        let delay = calculate_backoff(attempt, config.base_delay_ms, config.max_delay_ms);
        warn!(
            "Operation '{}' failed (attempt {}/{}): {}; retrying in {} ms",
            operation_name,
            attempt,
            config.max_retries + 1,
            err,
            delay
        );
        sleep(Duration::from_millis(delay)).await;
    }
}
