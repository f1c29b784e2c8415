//! Daily and weekly session totals.
//!
//! Only work sessions count toward totals; breaks are visible through
//! `today_sessions` and `sessions_by_type`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::last_n_days;
use crate::session::SessionRecord;
use crate::timer::SessionType;

/// Work totals for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStat {
    pub date: NaiveDate,
    pub count: u32,
    pub total_minutes: u32,
    pub is_today: bool,
}

/// Everything the stats view shows, computed in one pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsReport {
    pub today: NaiveDate,
    pub today_sessions: u32,
    pub today_work_sessions: u32,
    pub today_total_minutes: u32,
    pub weekly_work_sessions: u32,
    pub weekly_total_minutes: u32,
    pub weekly_average: f64,
    pub daily: Vec<DailyStat>,
    pub best_day: Option<DailyStat>,
}

impl StatsReport {
    pub fn build(records: &[SessionRecord], today: NaiveDate) -> Self {
        let daily = daily_stats(records, today, 7);
        Self {
            today,
            today_sessions: today_sessions(records, today).len() as u32,
            today_work_sessions: today_work_sessions(records, today).len() as u32,
            today_total_minutes: today_total_minutes(records, today),
            weekly_work_sessions: weekly_work_sessions(records, today).len() as u32,
            weekly_total_minutes: weekly_total_minutes(records, today),
            weekly_average: weekly_average(records, today),
            best_day: best_of(&daily),
            daily,
        }
    }
}

pub fn today_sessions(records: &[SessionRecord], today: NaiveDate) -> Vec<&SessionRecord> {
    records.iter().filter(|r| r.date == today).collect()
}

pub fn today_work_sessions(records: &[SessionRecord], today: NaiveDate) -> Vec<&SessionRecord> {
    records
        .iter()
        .filter(|r| r.date == today && r.is_work())
        .collect()
}

pub fn today_total_minutes(records: &[SessionRecord], today: NaiveDate) -> u32 {
    today_work_sessions(records, today)
        .iter()
        .map(|r| r.duration_min)
        .sum()
}

/// Sessions from the last seven days, today included.
pub fn weekly_sessions(records: &[SessionRecord], today: NaiveDate) -> Vec<&SessionRecord> {
    let week = last_n_days(today, 7);
    records.iter().filter(|r| week.contains(&r.date)).collect()
}

pub fn weekly_work_sessions(records: &[SessionRecord], today: NaiveDate) -> Vec<&SessionRecord> {
    weekly_sessions(records, today)
        .into_iter()
        .filter(|r| r.is_work())
        .collect()
}

pub fn weekly_total_minutes(records: &[SessionRecord], today: NaiveDate) -> u32 {
    weekly_work_sessions(records, today)
        .iter()
        .map(|r| r.duration_min)
        .sum()
}

/// Work totals for each of the last `n` days, oldest first.
pub fn daily_stats(records: &[SessionRecord], today: NaiveDate, n: usize) -> Vec<DailyStat> {
    last_n_days(today, n)
        .into_iter()
        .map(|date| {
            let (count, total_minutes) = records
                .iter()
                .filter(|r| r.date == date && r.is_work())
                .fold((0, 0), |(c, m), r| (c + 1, m + r.duration_min));
            DailyStat {
                date,
                count,
                total_minutes,
                is_today: date == today,
            }
        })
        .collect()
}

/// Weekly work sessions divided by seven, rounded to one decimal.
///
/// Always divides by seven, even when the history is younger than a week.
pub fn weekly_average(records: &[SessionRecord], today: NaiveDate) -> f64 {
    let count = weekly_work_sessions(records, today).len() as f64;
    (count / 7.0 * 10.0).round() / 10.0
}

/// Day of the last week with the most work sessions. Ties go to the
/// earliest day.
pub fn best_day(records: &[SessionRecord], today: NaiveDate) -> Option<DailyStat> {
    best_of(&daily_stats(records, today, 7))
}

fn best_of(daily: &[DailyStat]) -> Option<DailyStat> {
    let mut days = daily.iter();
    let first = days.next()?;
    let best = days.fold(first, |best, day| if day.count > best.count { day } else { best });
    Some(best.clone())
}

pub fn sessions_by_type(records: &[SessionRecord], session_type: SessionType) -> Vec<&SessionRecord> {
    records
        .iter()
        .filter(|r| r.session_type == session_type)
        .collect()
}
