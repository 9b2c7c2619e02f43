use chrono::{DateTime, Utc};
use tracing::warn;

use crate::storage::models::{Entry, EntryKey};
use migration::entities::presence_entry;

/// 将 Sea-ORM Model 转换为 Entry
pub fn model_to_entry(model: presence_entry::Model) -> Entry {
    // 数据库约束之外的脏数据按边界截断，并记录原值
    let (hour, hour_clamped) = clamp_column(model.hour, 23);
    let (present_percentage, pct_clamped) = clamp_column(model.present_percentage, 100);
    if hour_clamped || pct_clamped {
        warn!(
            "Row {} ({}) has out-of-range columns: hour={}, present_percentage={}; clamped to {}/{}",
            model.id, model.day, model.hour, model.present_percentage, hour, present_percentage
        );
    }

    Entry {
        id: i64::from(model.id),
        day: model.day,
        hour,
        present_percentage,
        notes: model.notes,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

/// 截断到 `0..=max`，返回值和是否发生截断
fn clamp_column(raw: i16, max: i16) -> (u8, bool) {
    let value = raw.clamp(0, max);
    (value as u8, value != raw)
}

/// 构造插入用 ActiveModel；id 由数据库分配
pub fn entry_to_active_model(
    key: EntryKey,
    present_percentage: u8,
    notes: String,
    now: DateTime<Utc>,
) -> presence_entry::ActiveModel {
    use sea_orm::ActiveValue::*;

    presence_entry::ActiveModel {
        id: NotSet,
        day: Set(key.day),
        hour: Set(i16::from(key.hour)),
        present_percentage: Set(i16::from(present_percentage)),
        notes: Set(notes),
        created_at: Set(now),
        updated_at: Set(now),
    }
}
