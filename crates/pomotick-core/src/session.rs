//! Completed-session records and the bounded session log.
//!
//! The log is insertion-ordered and capped (1000 records by default);
//! appending past the cap evicts the oldest record. Records are never
//! mutated once created.

use std::collections::VecDeque;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::timer::SessionType;

pub const DEFAULT_HISTORY_LIMIT: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    /// Free-text task label captured at completion. May be empty.
    #[serde(default)]
    pub task: String,
    #[serde(rename = "type")]
    pub session_type: SessionType,
    pub duration_min: u32,
    pub completed_at: DateTime<Utc>,
    /// UTC calendar day of `completed_at`.
    pub date: NaiveDate,
}

impl SessionRecord {
    pub fn new(
        task: impl Into<String>,
        session_type: SessionType,
        duration_min: u32,
        completed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            task: task.into(),
            session_type,
            duration_min,
            completed_at,
            date: completed_at.date_naive(),
        }
    }

    pub fn is_work(&self) -> bool {
        self.session_type == SessionType::Work
    }
}

/// Append-only, capacity-bounded sequence of session records.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionLog {
    records: VecDeque<SessionRecord>,
    capacity: usize,
}

impl Default for SessionLog {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionLog {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_LIMIT)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Rebuild a log from persisted records, keeping the newest `capacity`.
    pub fn from_records(records: Vec<SessionRecord>, capacity: usize) -> Self {
        let mut log = Self::with_capacity(capacity);
        let skip = records.len().saturating_sub(log.capacity);
        log.records.extend(records.into_iter().skip(skip));
        log
    }

    /// Add a record at the tail. Returns the evicted head when the log
    /// was already full.
    pub fn append(&mut self, record: SessionRecord) -> Option<SessionRecord> {
        self.records.push_back(record);
        if self.records.len() > self.capacity {
            self.records.pop_front()
        } else {
            None
        }
    }

    /// Drop every record completed at or before `cutoff`.
    /// Returns how many were removed.
    pub fn prune_older_than(&mut self, cutoff: DateTime<Utc>) -> usize {
        let before = self.records.len();
        self.records.retain(|r| r.completed_at > cutoff);
        before - self.records.len()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &SessionRecord> {
        self.records.iter()
    }

    /// Contiguous copy of the records, oldest first.
    pub fn to_vec(&self) -> Vec<SessionRecord> {
        self.records.iter().cloned().collect()
    }
}

impl Serialize for SessionLog {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.records.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn record_at(ts: DateTime<Utc>, task: &str) -> SessionRecord {
        SessionRecord::new(task, SessionType::Work, 25, ts)
    }

    #[test]
    fn new_record_derives_date_from_completion() {
        let ts = Utc.with_ymd_and_hms(2026, 1, 12, 23, 59, 0).unwrap();
        let r = record_at(ts, "write report");
        assert_eq!(r.date, NaiveDate::from_ymd_opt(2026, 1, 12).unwrap());
        assert!(!r.id.is_empty());
        assert!(r.is_work());
    }

    #[test]
    fn record_ids_are_unique() {
        let ts = Utc::now();
        assert_ne!(record_at(ts, "a").id, record_at(ts, "a").id);
    }

    #[test]
    fn append_past_capacity_evicts_oldest() {
        let base = Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap();
        let mut log = SessionLog::new();
        for i in 0..1000 {
            assert!(log.append(record_at(base + Duration::minutes(i), &i.to_string())).is_none());
        }
        assert_eq!(log.len(), 1000);

        let evicted = log.append(record_at(base + Duration::minutes(1000), "1000"));
        assert_eq!(evicted.map(|r| r.task), Some("0".to_string()));
        assert_eq!(log.len(), 1000);

        let tasks: Vec<_> = log.iter().map(|r| r.task.clone()).collect();
        assert_eq!(tasks.first().map(String::as_str), Some("1"));
        assert_eq!(tasks.last().map(String::as_str), Some("1000"));
        assert!(tasks
            .windows(2)
            .all(|w| w[0].parse::<u32>().unwrap() < w[1].parse::<u32>().unwrap()));
    }

    #[test]
    fn prune_removes_only_old_records() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let mut log = SessionLog::new();
        log.append(record_at(now - Duration::days(45), "old"));
        log.append(record_at(now - Duration::days(31), "older than cutoff"));
        log.append(record_at(now - Duration::days(2), "recent"));

        let removed = log.prune_older_than(now - Duration::days(30));
        assert_eq!(removed, 2);
        assert_eq!(log.len(), 1);
        assert_eq!(log.iter().next().unwrap().task, "recent");
    }

    #[test]
    fn from_records_keeps_newest() {
        let base = Utc::now();
        let records: Vec<_> = (0..5)
            .map(|i| record_at(base + Duration::seconds(i), &i.to_string()))
            .collect();
        let log = SessionLog::from_records(records, 3);
        let tasks: Vec<_> = log.iter().map(|r| r.task.as_str()).collect();
        assert_eq!(tasks, vec!["2", "3", "4"]);
    }

    #[test]
    fn record_json_uses_type_and_date_keys() {
        let ts = Utc.with_ymd_and_hms(2026, 1, 12, 8, 30, 0).unwrap();
        let r = SessionRecord::new("", SessionType::ShortBreak, 5, ts);
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["type"], "short-break");
        assert_eq!(json["date"], "2026-01-12");
        assert_eq!(json["task"], "");
    }
}
