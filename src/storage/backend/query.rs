//! Query operations for SeaOrmStorage
//!
//! This module contains all read-only database operations.

use chrono::NaiveDate;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use tracing::debug;

use super::converters::model_to_entry;
use super::{SeaOrmStorage, retry};
use crate::errors::Result;
use crate::storage::models::{Entry, EntryKey};

use migration::entities::presence_entry;

impl SeaOrmStorage {
    pub(super) async fn find_one(&self, key: EntryKey) -> Result<Option<Entry>> {
        let db = &self.db;

        let model = retry::with_retry_timeout(
            &format!("get({})", key),
            self.retry_config,
            self.operation_timeout_ms,
            || async {
                presence_entry::Entity::find()
                    .filter(presence_entry::Column::Day.eq(key.day))
                    .filter(presence_entry::Column::Hour.eq(i16::from(key.hour)))
                    .one(db)
                    .await
            },
        )
        .await?;

        Ok(model.map(model_to_entry))
    }

    /// [start, end] 闭区间，按 (day, hour) 升序
    pub(super) async fn load_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Entry>> {
        let db = &self.db;

        let models = retry::with_retry_timeout(
            &format!("load_range({}..={})", start, end),
            self.retry_config,
            self.operation_timeout_ms,
            || async {
                presence_entry::Entity::find()
                    .filter(presence_entry::Column::Day.between(start, end))
                    .order_by_asc(presence_entry::Column::Day)
                    .order_by_asc(presence_entry::Column::Hour)
                    .all(db)
                    .await
            },
        )
        .await?;

        debug!(
            "Loaded {} entries between {} and {}",
            models.len(),
            start,
            end
        );
        Ok(models.into_iter().map(model_to_entry).collect())
    }

    /// 全部记录，按 (day, hour) 降序
    pub(super) async fn load_all_desc(&self) -> Result<Vec<Entry>> {
        let db = &self.db;

        let models = retry::with_retry_timeout(
            "load_all",
            self.retry_config,
            self.operation_timeout_ms,
            || async {
                presence_entry::Entity::find()
                    .order_by_desc(presence_entry::Column::Day)
                    .order_by_desc(presence_entry::Column::Hour)
                    .all(db)
                    .await
            },
        )
        .await?;

        Ok(models.into_iter().map(model_to_entry).collect())
    }

    pub(super) async fn count_entries(&self) -> Result<u64> {
        let db = &self.db;

        let count = retry::with_retry_timeout(
            "count",
            self.retry_config,
            self.operation_timeout_ms,
            || async { presence_entry::Entity::find().count(db).await },
        )
        .await?;

        Ok(count)
    }
}
