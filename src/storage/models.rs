use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};
use ts_rs::TS;

/// 前端类型导出路径（相对 TS_RS_EXPORT_DIR，默认 ./bindings）
pub const TS_EXPORT_PATH: &str = "presence.generated.ts";

/// 记录唯一键：日历日 + 小时
///
/// 按 (day, hour) 排序，日期比较只看日历日，不带时区。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryKey {
    pub day: NaiveDate,
    pub hour: u8,
}

impl EntryKey {
    pub fn new(day: NaiveDate, hour: u8) -> Self {
        Self { day, hour }
    }
}

impl std::fmt::Display for EntryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{:02}", self.day.format("%Y-%m-%d"), self.hour)
    }
}

/// 某一天某个小时的专注度记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: i64,
    #[ts(type = "string")]
    pub day: NaiveDate,
    pub hour: u8,
    pub present_percentage: u8,
    pub notes: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

impl Entry {
    pub fn key(&self) -> EntryKey {
        EntryKey::new(self.day, self.hour)
    }
}

/// 实际处理请求的存储后端
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, Display, AsRefStr,
)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BackendKind {
    /// 数据库（SQLite / MySQL / PostgreSQL）
    Durable,
    /// 进程内存，重启即丢失
    Volatile,
}

/// 后端描述信息
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct StorageConfig {
    pub kind: BackendKind,
    pub storage_type: String,
}
