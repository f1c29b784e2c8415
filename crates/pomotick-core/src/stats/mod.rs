//! Statistics over the session log.
//!
//! Every function here is a pure projection over `&[SessionRecord]` and an
//! explicit `today`, so results are reproducible for any fixed date.

mod daily;
mod streak;

pub use daily::{
    best_day, daily_stats, sessions_by_type, today_sessions, today_total_minutes,
    today_work_sessions, weekly_average, weekly_sessions, weekly_total_minutes,
    weekly_work_sessions, DailyStat, StatsReport,
};

pub use streak::{best_streak, calendar_data, current_streak, CalendarDay, StreakSummary};

use chrono::{Duration, NaiveDate, Utc};

/// The `n` calendar days ending with `today`, oldest first.
pub fn last_n_days(today: NaiveDate, n: usize) -> Vec<NaiveDate> {
    (0..n as i64)
        .rev()
        .map(|offset| today - Duration::days(offset))
        .collect()
}

/// Current UTC date; session records are dated the same way.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}
