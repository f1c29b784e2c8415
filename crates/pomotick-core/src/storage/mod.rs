mod backend;
mod config;
pub mod sqlite;

pub use backend::{KvBackend, MemoryStore};
pub use config::{Config, LogConfig, NotificationsConfig, StorageConfig, TimerConfig};
pub use sqlite::SqliteStore;

use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StorageError;
use crate::session::{SessionLog, SessionRecord, DEFAULT_HISTORY_LIMIT};
use crate::state::{AppState, CurrentTask};
use crate::timer::Settings;

/// Persisted record keys.
pub mod keys {
    pub const SETTINGS: &str = "settings";
    pub const CURRENT_TASK: &str = "current_task";
    pub const SESSIONS: &str = "sessions";
    pub const APP_STATE: &str = "app_state";

    pub const ALL: [&str; 4] = [SETTINGS, CURRENT_TASK, SESSIONS, APP_STATE];
}

/// Returns the data directory, creating it if missing.
///
/// `POMOTICK_DATA_DIR` overrides the location. Otherwise it is
/// `~/.config/pomotick[-dev]/`, with `POMOTICK_ENV=dev` selecting the
/// development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let dir = match std::env::var_os("POMOTICK_DATA_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("POMOTICK_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("pomotick-dev")
            } else {
                base_dir.join("pomotick")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Typed, exception-safe access to a [`KvBackend`].
///
/// Reads fall back to the caller's default on any failure and writes
/// report `false` instead of erroring. When the backend is out of room a
/// write prunes old session records and retries exactly once.
pub struct Store {
    backend: Box<dyn KvBackend>,
    history_limit: usize,
    prune_after_days: i64,
}

impl Store {
    pub fn new(backend: impl KvBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            history_limit: DEFAULT_HISTORY_LIMIT,
            prune_after_days: 30,
        }
    }

    /// Non-persistent store, mainly for tests and dry runs.
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }

    /// Open the on-disk store described by `config`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened.
    pub fn open(config: &StorageConfig) -> Result<Self, StorageError> {
        let mut db = SqliteStore::open_default()?;
        if let Some(pages) = config.max_pages {
            db = db.with_max_pages(pages)?;
        }
        Ok(Self::new(db).with_limits(config.history_limit, config.prune_after_days))
    }

    /// History cap (clamped to `1..=1000`) and prune age in days.
    pub fn with_limits(mut self, history_limit: usize, prune_after_days: i64) -> Self {
        if history_limit > DEFAULT_HISTORY_LIMIT {
            tracing::warn!(
                requested = history_limit,
                max = DEFAULT_HISTORY_LIMIT,
                "history limit too large, clamping"
            );
        }
        self.history_limit = history_limit.clamp(1, DEFAULT_HISTORY_LIMIT);
        self.prune_after_days = prune_after_days.max(0);
        self
    }

    pub fn history_limit(&self) -> usize {
        self.history_limit
    }

    // ── Generic contract ─────────────────────────────────────────────

    /// Read and decode `key`, or return `default` when missing or unreadable.
    pub fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match self.backend.read(key) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(v) => v,
                Err(e) => {
                    tracing::warn!(key, error = %e, "stored value unreadable, using default");
                    default
                }
            },
            Ok(None) => default,
            Err(e) => {
                tracing::warn!(key, error = %e, "storage read failed, using default");
                default
            }
        }
    }

    /// Encode and write `value`. Returns `false` if it could not be stored.
    pub fn set<T: Serialize>(&mut self, key: &str, value: &T) -> bool {
        match self.write_json(key, value) {
            Ok(()) => true,
            Err(StorageError::QuotaExceeded) => {
                tracing::warn!(key, "storage quota exceeded, pruning old sessions");
                self.clean_old_sessions(Utc::now());
                match self.write_json(key, value) {
                    Ok(()) => true,
                    Err(e) => {
                        tracing::warn!(key, error = %e, "write failed after pruning");
                        false
                    }
                }
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "storage write failed");
                false
            }
        }
    }

    pub fn remove(&mut self, key: &str) {
        if let Err(e) = self.backend.delete(key) {
            tracing::warn!(key, error = %e, "storage delete failed");
        }
    }

    fn write_json<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value).map_err(|source| StorageError::Serialization {
            key: key.to_string(),
            source,
        })?;
        self.backend.write(key, &raw)
    }

    // ── Records ──────────────────────────────────────────────────────

    /// Stored settings, or defaults when missing or out of range.
    pub fn settings(&self) -> Settings {
        let settings = self.get(keys::SETTINGS, Settings::default());
        match settings.validate() {
            Ok(()) => settings,
            Err(e) => {
                tracing::warn!(error = %e, "stored settings invalid, using defaults");
                Settings::default()
            }
        }
    }

    pub fn save_settings(&mut self, settings: &Settings) -> bool {
        self.set(keys::SETTINGS, settings)
    }

    pub fn current_task(&self) -> Option<CurrentTask> {
        self.get(keys::CURRENT_TASK, None)
    }

    pub fn save_current_task(&mut self, text: &str) -> bool {
        self.set(keys::CURRENT_TASK, &CurrentTask::new(text))
    }

    pub fn app_state(&self) -> AppState {
        self.get(keys::APP_STATE, AppState::default())
    }

    pub fn save_app_state(&mut self, state: &AppState) -> bool {
        self.set(keys::APP_STATE, state)
    }

    /// Full session history, oldest first.
    pub fn sessions(&self) -> SessionLog {
        let records: Vec<SessionRecord> = self.get(keys::SESSIONS, Vec::new());
        SessionLog::from_records(records, self.history_limit)
    }

    /// Append a completed session to the persisted log.
    ///
    /// On quota exhaustion the in-memory log (new record included) is pruned
    /// and written once more. Returns `false` if the record was dropped.
    pub fn append_session(&mut self, record: SessionRecord) -> bool {
        let mut log = self.sessions();
        if let Some(evicted) = log.append(record) {
            tracing::debug!(id = %evicted.id, "session history full, evicted oldest");
        }
        match self.write_json(keys::SESSIONS, &log) {
            Ok(()) => true,
            Err(StorageError::QuotaExceeded) => {
                let removed = log.prune_older_than(self.prune_cutoff(Utc::now()));
                tracing::warn!(removed, "storage quota exceeded, retrying session append");
                match self.write_json(keys::SESSIONS, &log) {
                    Ok(()) => true,
                    Err(e) => {
                        tracing::warn!(error = %e, "session dropped after pruning");
                        false
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "session append failed");
                false
            }
        }
    }

    /// Drop records older than the prune age. Returns how many went.
    pub fn clean_old_sessions(&mut self, now: DateTime<Utc>) -> usize {
        let mut log = self.sessions();
        let removed = log.prune_older_than(self.prune_cutoff(now));
        if removed > 0 {
            if let Err(e) = self.write_json(keys::SESSIONS, &log) {
                tracing::warn!(error = %e, "failed to write pruned sessions");
                return 0;
            }
            tracing::info!(removed, "pruned old sessions");
        }
        removed
    }

    /// Remove every persisted record.
    pub fn reset_all(&mut self) {
        for key in keys::ALL {
            self.remove(key);
        }
    }

    fn prune_cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(self.prune_after_days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::SessionType;

    /// Backend whose every operation fails.
    struct BrokenBackend;

    impl KvBackend for BrokenBackend {
        fn read(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Io(std::io::Error::other("disk gone")))
        }
        fn write(&mut self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Io(std::io::Error::other("disk gone")))
        }
        fn delete(&mut self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Io(std::io::Error::other("disk gone")))
        }
    }

    fn old_record(days_ago: i64, task: &str) -> SessionRecord {
        SessionRecord::new(task, SessionType::Work, 25, Utc::now() - Duration::days(days_ago))
    }

    #[test]
    fn get_returns_default_for_missing_and_garbage() {
        let mut backend = MemoryStore::new();
        backend.write(keys::APP_STATE, "{not json").unwrap();
        let store = Store::new(backend);
        assert_eq!(store.app_state(), AppState::default());
        assert_eq!(store.get("missing", 7u32), 7);
    }

    #[test]
    fn broken_backend_never_propagates() {
        let mut store = Store::new(BrokenBackend);
        assert_eq!(store.settings(), Settings::default());
        assert!(!store.save_settings(&Settings::default()));
        assert!(!store.append_session(old_record(0, "x")));
        store.remove(keys::SETTINGS);
        store.reset_all();
    }

    #[test]
    fn invalid_stored_settings_fall_back() {
        let mut store = Store::in_memory();
        let bad = Settings {
            work_duration: 500,
            ..Settings::default()
        };
        assert!(store.set(keys::SETTINGS, &bad));
        assert_eq!(store.settings(), Settings::default());
    }

    #[test]
    fn settings_and_task_roundtrip() {
        let mut store = Store::in_memory();
        let s = Settings {
            work_duration: 50,
            ..Settings::default()
        };
        assert!(store.save_settings(&s));
        assert_eq!(store.settings(), s);

        assert!(store.current_task().is_none());
        assert!(store.save_current_task("review PR"));
        assert_eq!(store.current_task().unwrap().text, "review PR");
    }

    #[test]
    fn append_respects_history_limit() {
        let mut store = Store::in_memory().with_limits(3, 30);
        for i in 0..5 {
            assert!(store.append_session(old_record(0, &i.to_string())));
        }
        let tasks: Vec<_> = store.sessions().iter().map(|r| r.task.clone()).collect();
        assert_eq!(tasks, vec!["2", "3", "4"]);
    }

    #[test]
    fn history_limit_never_exceeds_cap() {
        assert_eq!(Store::in_memory().with_limits(5_000, 30).history_limit(), DEFAULT_HISTORY_LIMIT);
        assert_eq!(Store::in_memory().with_limits(0, 30).history_limit(), 1);

        let mut store = Store::in_memory().with_limits(usize::MAX, 30);
        let records: Vec<_> = (0..=DEFAULT_HISTORY_LIMIT)
            .map(|i| old_record(0, &i.to_string()))
            .collect();
        assert!(store.set(keys::SESSIONS, &records));
        let log = store.sessions();
        assert_eq!(log.len(), DEFAULT_HISTORY_LIMIT);
        assert_eq!(log.iter().next().unwrap().task, "1");
    }

    #[test]
    fn quota_on_append_prunes_and_retries_once() {
        let mut store = Store::new(MemoryStore::with_quota(3_000));
        // Stale records fill most of the quota.
        let mut log = SessionLog::new();
        for i in 0..12 {
            log.append(old_record(40, &format!("stale {i}")));
        }
        assert!(store.set(keys::SESSIONS, &log));

        let fresh = SessionRecord::new("x".repeat(1_500), SessionType::Work, 25, Utc::now());
        assert!(store.append_session(fresh));

        let kept = store.sessions();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept.iter().next().unwrap().task.len(), 1_500);
    }

    #[test]
    fn quota_on_other_key_prunes_stored_sessions() {
        let mut store = Store::new(MemoryStore::with_quota(3_000));
        let mut log = SessionLog::new();
        for i in 0..12 {
            log.append(old_record(40, &format!("stale {i}")));
        }
        assert!(store.set(keys::SESSIONS, &log));

        let task = CurrentTask::new("y".repeat(1_500));
        assert!(store.set(keys::CURRENT_TASK, &task));
        assert!(store.sessions().is_empty());
        assert_eq!(store.current_task().unwrap().text.len(), 1_500);
    }

    #[test]
    fn write_is_dropped_when_pruning_cannot_help() {
        let mut store = Store::new(MemoryStore::with_quota(200));
        let task = CurrentTask::new("z".repeat(1_000));
        assert!(!store.set(keys::CURRENT_TASK, &task));
        assert!(store.current_task().is_none());
    }

    #[test]
    fn clean_old_sessions_keeps_recent() {
        let mut store = Store::in_memory();
        store.append_session(old_record(31, "old"));
        store.append_session(old_record(1, "new"));
        assert_eq!(store.clean_old_sessions(Utc::now()), 1);
        let tasks: Vec<_> = store.sessions().iter().map(|r| r.task.clone()).collect();
        assert_eq!(tasks, vec!["new"]);
    }

    #[test]
    fn reset_all_removes_every_key() {
        let mut store = Store::in_memory();
        store.save_settings(&Settings::default());
        store.save_current_task("t");
        store.save_app_state(&AppState {
            session_count: 2,
            last_session_type: Some(SessionType::Work),
        });
        store.append_session(old_record(0, "t"));

        store.reset_all();
        assert!(store.current_task().is_none());
        assert!(store.sessions().is_empty());
        assert_eq!(store.app_state(), AppState::default());
    }
}
