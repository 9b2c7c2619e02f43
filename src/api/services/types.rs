//! API 类型定义

use serde::{Deserialize, Serialize};

use crate::services::StorageHealth;
use crate::storage::BackendKind;

/// 统一响应信封
///
/// `storage` 标明实际处理请求的后端；校验失败等未触达存储的响应不带该字段。
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<BackendKind>,
}

/// `?date=YYYY-MM-DD`（兼容 `day`）
#[derive(Deserialize, Debug, Default)]
pub struct DateQuery {
    #[serde(alias = "day")]
    pub date: Option<String>,
}

/// `?startDate=..&endDate=..`
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct RangeQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// `?date=..&hour=..`
#[derive(Deserialize, Debug, Default)]
pub struct EntryKeyQuery {
    #[serde(alias = "day")]
    pub date: Option<String>,
    pub hour: Option<i64>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub uptime: u64,
    pub storage: StorageHealth,
    pub response_time_ms: u64,
}
