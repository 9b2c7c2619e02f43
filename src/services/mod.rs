//! Service layer for business logic
//!
//! Validation and aggregation are pure; `EntryService` ties them to storage
//! through the backend selector.

pub mod aggregation;
mod entry_service;
pub mod validation;

pub use aggregation::{DailySummary, HourlySlot, RangeOverview};
pub use entry_service::*;
pub use validation::{DayInput, EntryDraft, ValidEntry};
