//! Aggregation over entries
//!
//! Pure functions: they take entries already loaded from a store and never
//! touch storage themselves.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use ts_rs::TS;

use crate::storage::Entry;
use crate::storage::models::TS_EXPORT_PATH;

pub const HOURS_PER_DAY: u8 = 24;

/// Per-day rollup
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    #[ts(type = "string")]
    pub day: NaiveDate,
    pub average_present: f64,
    pub entry_count: u32,
}

/// One hour of a day, possibly unset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "camelCase")]
pub struct HourlySlot {
    pub hour: u8,
    pub present_percentage: Option<u8>,
    pub notes: String,
    #[ts(type = "string")]
    pub day: NaiveDate,
}

/// Headline numbers for a date range
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "camelCase")]
pub struct RangeOverview {
    #[ts(type = "string")]
    pub start_date: NaiveDate,
    #[ts(type = "string")]
    pub end_date: NaiveDate,
    pub days_with_entries: u32,
    pub total_entries: u32,
    /// Mean of the daily averages; `None` when the range has no entries
    pub average_present: Option<f64>,
}

/// `sum / count` rounded to one decimal, half away from zero.
///
/// Works in integer tenths so that halves are detected exactly. Inputs are
/// non-negative, where half away from zero is half up.
pub fn rounded_mean(sum: u64, count: u64) -> f64 {
    if count == 0 {
        return 0.0;
    }
    let tenths = (20 * sum + count) / (2 * count);
    tenths as f64 / 10.0
}

/// Group entries by day; empty days are omitted, days ascend.
pub fn daily_summaries(entries: &[Entry]) -> Vec<DailySummary> {
    let mut by_day: BTreeMap<NaiveDate, (u64, u64)> = BTreeMap::new();
    for entry in entries {
        let (sum, count) = by_day.entry(entry.day).or_default();
        *sum += u64::from(entry.present_percentage);
        *count += 1;
    }

    by_day
        .into_iter()
        .map(|(day, (sum, count))| DailySummary {
            day,
            average_present: rounded_mean(sum, count),
            entry_count: count as u32,
        })
        .collect()
}

/// Exactly 24 slots for `day`, ascending by hour.
///
/// Entries for other days are ignored.
pub fn hourly_breakdown(day: NaiveDate, entries: &[Entry]) -> Vec<HourlySlot> {
    let mut slots: Vec<HourlySlot> = (0..HOURS_PER_DAY)
        .map(|hour| HourlySlot {
            hour,
            present_percentage: None,
            notes: String::new(),
            day,
        })
        .collect();

    for entry in entries.iter().filter(|e| e.day == day) {
        if let Some(slot) = slots.get_mut(usize::from(entry.hour)) {
            slot.present_percentage = Some(entry.present_percentage);
            slot.notes = entry.notes.clone();
        }
    }
    slots
}

pub fn overview(start: NaiveDate, end: NaiveDate, summaries: &[DailySummary]) -> RangeOverview {
    let days = summaries.len() as u64;
    let total_entries: u32 = summaries.iter().map(|s| s.entry_count).sum();

    // 日均值本身已是一位小数，按十分位整数求和避免浮点误差
    let tenths_sum: u64 = summaries
        .iter()
        .map(|s| (s.average_present * 10.0).round() as u64)
        .sum();

    RangeOverview {
        start_date: start,
        end_date: end,
        days_with_entries: days as u32,
        total_entries,
        average_present: (days > 0).then(|| rounded_mean(tenths_sum, days * 10)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn entry(day: u32, hour: u8, pct: u8) -> Entry {
        let now = Utc::now();
        Entry {
            id: i64::from(hour),
            day: date(day),
            hour,
            present_percentage: pct,
            notes: format!("h{}", hour),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_rounded_mean_half_away_from_zero() {
        assert_eq!(rounded_mean(170, 2), 85.0);
        assert_eq!(rounded_mean(100, 3), 33.3);
        assert_eq!(rounded_mean(200, 3), 66.7);
        // 33.35 -> 33.4
        assert_eq!(rounded_mean(667, 20), 33.4);
        // 0.05 -> 0.1
        assert_eq!(rounded_mean(1, 20), 0.1);
        assert_eq!(rounded_mean(0, 0), 0.0);
    }

    #[test]
    fn test_daily_summaries_skip_empty_days() {
        let entries = vec![entry(14, 9, 80), entry(14, 10, 90), entry(16, 8, 50)];
        let summaries = daily_summaries(&entries);

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].day, date(14));
        assert_eq!(summaries[0].average_present, 85.0);
        assert_eq!(summaries[0].entry_count, 2);
        assert_eq!(summaries[1].day, date(16));
        assert_eq!(summaries[1].average_present, 50.0);
        assert_eq!(summaries[1].entry_count, 1);
    }

    #[test]
    fn test_hourly_breakdown_fills_24_slots() {
        let entries = vec![entry(15, 0, 10), entry(15, 23, 95), entry(16, 5, 40)];
        let slots = hourly_breakdown(date(15), &entries);

        assert_eq!(slots.len(), 24);
        assert!(slots.iter().enumerate().all(|(i, s)| s.hour as usize == i));
        assert_eq!(slots[0].present_percentage, Some(10));
        assert_eq!(slots[23].present_percentage, Some(95));
        assert_eq!(slots[23].notes, "h23");
        assert_eq!(slots[5].present_percentage, None);
        assert_eq!(slots[5].notes, "");
        assert!(slots.iter().all(|s| s.day == date(15)));
    }

    #[test]
    fn test_overview_averages_daily_means() {
        let summaries = daily_summaries(&[entry(14, 9, 80), entry(14, 10, 90), entry(16, 8, 50)]);
        let view = overview(date(10), date(16), &summaries);

        assert_eq!(view.days_with_entries, 2);
        assert_eq!(view.total_entries, 3);
        // (85.0 + 50.0) / 2 = 67.5
        assert_eq!(view.average_present, Some(67.5));

        let empty = overview(date(1), date(7), &[]);
        assert_eq!(empty.average_present, None);
        assert_eq!(empty.total_entries, 0);
    }

    #[test]
    fn test_summary_json_shape() {
        let summaries = daily_summaries(&[entry(14, 9, 80)]);
        let json = serde_json::to_value(&summaries[0]).unwrap();
        assert_eq!(json["day"], "2024-03-14");
        assert_eq!(json["averagePresent"], 80.0);
        assert_eq!(json["entryCount"], 1);
    }
}
