//! Mutation operations for SeaOrmStorage
//!
//! This module contains all write database operations.

use chrono::Utc;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, TransactionTrait, sea_query::OnConflict};
use tracing::{debug, info};

use super::SeaOrmStorage;
use super::converters::{entry_to_active_model, model_to_entry};
use super::retry;
use crate::errors::{PresenceError, Result};
use crate::storage::models::{Entry, EntryKey};

use migration::entities::presence_entry;

impl SeaOrmStorage {
    /// 使用 ON CONFLICT (day, hour) 的原子 upsert
    ///
    /// 冲突时只更新 present_percentage / notes / updated_at，created_at 保持首次写入的值。
    /// 写入与回读在同一事务内；回读失败时事务回滚，不留下已提交的写入。
    pub(super) async fn upsert_entry(
        &self,
        key: EntryKey,
        present_percentage: u8,
        notes: String,
    ) -> Result<Entry> {
        let db = &self.db;

        let stored = retry::with_retry_timeout(
            &format!("upsert({})", key),
            self.retry_config,
            self.operation_timeout_ms,
            || {
                let model = entry_to_active_model(key, present_percentage, notes.clone(), Utc::now());
                async move {
                    let txn = db.begin().await?;

                    presence_entry::Entity::insert(model)
                        .on_conflict(
                            OnConflict::columns([
                                presence_entry::Column::Day,
                                presence_entry::Column::Hour,
                            ])
                            .update_columns([
                                presence_entry::Column::PresentPercentage,
                                presence_entry::Column::Notes,
                                presence_entry::Column::UpdatedAt,
                            ])
                            .to_owned(),
                        )
                        .exec_without_returning(&txn)
                        .await?;

                    let stored = presence_entry::Entity::find()
                        .filter(presence_entry::Column::Day.eq(key.day))
                        .filter(presence_entry::Column::Hour.eq(i16::from(key.hour)))
                        .one(&txn)
                        .await?;

                    txn.commit().await?;
                    Ok(stored)
                }
            },
        )
        .await?;

        let stored = stored.map(model_to_entry).ok_or_else(|| {
            PresenceError::internal(format!("Entry {} missing right after upsert", key))
        })?;

        debug!("Durable entry upserted: {}", key);
        Ok(stored)
    }

    /// 删除并返回被删除的记录
    pub(super) async fn remove_entry(&self, key: EntryKey) -> Result<Option<Entry>> {
        let Some(existing) = self.find_one(key).await? else {
            return Ok(None);
        };

        let db = &self.db;
        let result = retry::with_retry_timeout(
            &format!("remove({})", key),
            self.retry_config,
            self.operation_timeout_ms,
            || async {
                presence_entry::Entity::delete_many()
                    .filter(presence_entry::Column::Day.eq(key.day))
                    .filter(presence_entry::Column::Hour.eq(i16::from(key.hour)))
                    .exec(db)
                    .await
            },
        )
        .await?;

        // 并发删除时另一方可能已先删掉
        if result.rows_affected == 0 {
            return Ok(None);
        }

        info!("Entry deleted: {}", key);
        Ok(Some(existing))
    }
}
