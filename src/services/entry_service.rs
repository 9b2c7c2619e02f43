//! Entry service
//!
//! Business logic shared by every interface: validates input, routes each
//! operation through the backend selector, and aggregates results.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use super::aggregation::{
    self, DailySummary, HourlySlot, RangeOverview, daily_summaries, hourly_breakdown,
};
use super::validation::{self, EntryDraft};
use crate::config::CalendarConfig;
use crate::errors::{PresenceError, Result};
use crate::storage::selector::SelectorStatus;
use crate::storage::{BackendKind, BackendSelector, Entry, Served};

/// Entry counts and connectivity, as reported by the health endpoint
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageHealth {
    pub connected: bool,
    pub selector: SelectorStatus,
    /// Entries in the store that would serve the next request
    pub active_entry_count: Option<u64>,
}

pub struct EntryService {
    selector: Arc<BackendSelector>,
    calendar: CalendarConfig,
}

impl EntryService {
    pub fn new(selector: Arc<BackendSelector>, calendar: CalendarConfig) -> Self {
        Self { selector, calendar }
    }

    pub fn selector(&self) -> &Arc<BackendSelector> {
        &self.selector
    }

    pub fn today(&self) -> NaiveDate {
        self.calendar.today()
    }

    /// Create or replace the entry for `(day, hour)`.
    pub async fn upsert(&self, draft: EntryDraft) -> Result<Served<Entry>> {
        self.upsert_as_of(draft, self.today()).await
    }

    /// Same as [`upsert`](Self::upsert) with an explicit "today".
    pub async fn upsert_as_of(&self, draft: EntryDraft, today: NaiveDate) -> Result<Served<Entry>> {
        let valid = validation::validate_entry(draft, &self.calendar, today)
            .inspect_err(|e| warn!("Entry rejected: {}", e))?;

        let (key, pct) = (valid.key, valid.present_percentage);
        let served = self
            .selector
            .route("upsert", |store| {
                let notes = valid.notes.clone();
                async move { store.upsert(key, pct, notes).await }
            })
            .await?;

        info!("Entry saved: {} = {}% ({})", key, pct, served.backend);
        Ok(served)
    }

    pub async fn entries_for_day(&self, date: Option<&str>) -> Result<Served<Vec<Entry>>> {
        let day = validation::require_day(date, &self.calendar)?;
        self.selector
            .route("entries_for_day", |store| async move {
                store.find_by_day(day).await
            })
            .await
    }

    pub async fn entries_for_range(
        &self,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<Served<Vec<Entry>>> {
        let (start, end) = validation::require_range(start, end, &self.calendar)?;
        self.load_range(start, end).await
    }

    pub async fn daily_summary(
        &self,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<Served<Vec<DailySummary>>> {
        let (start, end) = validation::require_range(start, end, &self.calendar)?;
        let served = self.load_range(start, end).await?;
        Ok(served.map(|entries| daily_summaries(&entries)))
    }

    pub async fn hourly_breakdown(&self, date: Option<&str>) -> Result<Served<Vec<HourlySlot>>> {
        let day = validation::require_day(date, &self.calendar)?;
        let served = self
            .selector
            .route("hourly_breakdown", |store| async move {
                store.find_by_day(day).await
            })
            .await?;
        Ok(served.map(|entries| hourly_breakdown(day, &entries)))
    }

    pub async fn overview(
        &self,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<Served<RangeOverview>> {
        let (start, end) = validation::require_range(start, end, &self.calendar)?;
        let served = self.load_range(start, end).await?;
        Ok(served.map(|entries| aggregation::overview(start, end, &daily_summaries(&entries))))
    }

    /// Delete the entry for `(date, hour)` and return it.
    pub async fn delete(&self, date: Option<&str>, hour: Option<i64>) -> Result<Served<Entry>> {
        let key = validation::require_key(date, hour, &self.calendar)?;

        let served = self
            .selector
            .route("delete", |store| async move { store.delete_by_key(key).await })
            .await?;

        let backend = served.backend;
        match served.data {
            Some(entry) => {
                info!("Entry deleted: {} ({})", key, backend);
                Ok(Served {
                    data: entry,
                    backend,
                })
            }
            None => Err(PresenceError::not_found(format!(
                "Entry not found for {} hour {}",
                key.day, key.hour
            ))),
        }
    }

    pub async fn list_all(&self) -> Result<Served<Vec<Entry>>> {
        self.selector
            .route("list_all", |store| async move { store.list_all().await })
            .await
    }

    pub async fn storage_health(&self) -> StorageHealth {
        let active_entry_count = match self
            .selector
            .route("count", |store| async move { store.count().await })
            .await
        {
            Ok(served) => Some(served.data),
            Err(e) => {
                warn!("Entry count failed during health check: {}", e);
                None
            }
        };

        let selector = self.selector.status().await;
        StorageHealth {
            connected: selector.active == BackendKind::Durable,
            selector,
            active_entry_count,
        }
    }

    async fn load_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Served<Vec<Entry>>> {
        self.selector
            .route("entries_for_range", |store| async move {
                store.find_by_range(start, end).await
            })
            .await
    }
}
