//! Day streaks over work sessions.
//!
//! Streak logic runs on every dated record in the log. The calendar view
//! is a separate, clamped display window and never limits the streaks.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::last_n_days;
use crate::session::SessionRecord;

const MAX_CALENDAR_DAYS: i64 = 365;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakSummary {
    pub calendar: Vec<CalendarDay>,
    pub current_streak: u32,
    pub best_streak: u32,
}

impl StreakSummary {
    /// Calendar for `year` up to `today`, plus both streaks.
    pub fn build(records: &[SessionRecord], year: i32, today: NaiveDate) -> Self {
        Self {
            calendar: calendar_data(records, year, today),
            current_streak: current_streak(records, today),
            best_streak: best_streak(records),
        }
    }

    /// Same as [`build`](Self::build) for the year `today` falls in.
    pub fn for_current_year(records: &[SessionRecord], today: NaiveDate) -> Self {
        Self::build(records, today.year(), today)
    }
}

/// Work-session count per calendar day, ascending by date.
fn work_counts_by_day(records: &[SessionRecord]) -> BTreeMap<NaiveDate, u32> {
    let mut counts = BTreeMap::new();
    for record in records.iter().filter(|r| r.is_work()) {
        *counts.entry(record.date).or_insert(0) += 1;
    }
    counts
}

/// Consecutive days with work, counted backward from `today`.
///
/// An empty `today` does not break the streak; the day is still running.
pub fn current_streak(records: &[SessionRecord], today: NaiveDate) -> u32 {
    let counts = work_counts_by_day(records);
    let mut streak = 0;
    let mut day = today;
    loop {
        if counts.contains_key(&day) {
            streak += 1;
        } else if day != today {
            break;
        }
        day = match day.pred_opt() {
            Some(prev) => prev,
            None => break,
        };
    }
    streak
}

/// Longest run of consecutive days with work anywhere in the log.
pub fn best_streak(records: &[SessionRecord]) -> u32 {
    let dates: Vec<NaiveDate> = work_counts_by_day(records).into_keys().collect();
    let mut best: u32 = 0;
    let mut run: u32 = 0;
    for (i, date) in dates.iter().enumerate() {
        run += 1;
        if let Some(next) = dates.get(i + 1) {
            if (*next - *date).num_days() > 1 {
                best = best.max(run);
                run = 0;
            }
        }
    }
    best.max(run)
}

/// Daily work counts from Jan 1 of `year` through `today`, at most 365
/// days and at least one (today).
pub fn calendar_data(records: &[SessionRecord], year: i32, today: NaiveDate) -> Vec<CalendarDay> {
    let span = NaiveDate::from_ymd_opt(year, 1, 1)
        .map(|start| (today - start).num_days() + 1)
        .unwrap_or(1)
        .clamp(1, MAX_CALENDAR_DAYS);
    let counts = work_counts_by_day(records);
    last_n_days(today, span as usize)
        .into_iter()
        .map(|date| CalendarDay {
            date,
            count: counts.get(&date).copied().unwrap_or(0),
        })
        .collect()
}
