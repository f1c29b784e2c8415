//! Timer engine implementation.
//!
//! The engine is a tick-driven state machine. It does not use internal
//! threads - the caller invokes `tick()` once per elapsed second.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> (Paused | Completed)
//! Paused -> Running
//! Completed -> Idle   (reset, or the automatic advance after a short delay)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(settings, store, notifier, task);
//! engine.start();
//! // Once per second:
//! engine.tick(); // Returns Some(Event) on completion and on auto-advance
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::settings::{SessionType, Settings};
use super::task_source::TaskSource;
use crate::events::Event;
use crate::notify::Notifier;
use crate::session::SessionRecord;
use crate::state::AppState;
use crate::storage::Store;

pub const COMPLETION_TITLE: &str = "Session complete!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    Completed,
}

/// Point-in-time view of the engine. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub state: TimerState,
    pub session_type: SessionType,
    pub seconds_remaining: u32,
    pub total_seconds: u32,
    /// 0.0 ..= 100.0 progress within the current session.
    pub progress_percent: f64,
    pub session_count: u32,
}

/// Core timer engine.
///
/// Owns the countdown, the session-type sequence and the long-break
/// bookkeeping. Completed sessions go to the store's session log and the
/// notifier is told about each one.
pub struct TimerEngine {
    settings: Settings,
    state: TimerState,
    session_type: SessionType,
    seconds_remaining: u32,
    app_state: AppState,
    /// Ticks left before the post-completion advance fires.
    pending_advance: Option<u32>,
    auto_advance_ticks: u32,
    /// Outcome of the one-time permission request.
    permission: Option<bool>,
    store: Store,
    notifier: Box<dyn Notifier>,
    task: Box<dyn TaskSource>,
}

impl TimerEngine {
    /// Create an engine in `Idle` with a work session ready.
    ///
    /// `settings` must already be validated. Long-break bookkeeping is
    /// restored from the store.
    pub fn new(
        settings: Settings,
        store: Store,
        notifier: impl Notifier + 'static,
        task: impl TaskSource + 'static,
    ) -> Self {
        debug_assert!(settings.validate().is_ok(), "engine given invalid settings");
        let app_state = store.app_state();
        let mut engine = Self {
            seconds_remaining: settings.duration_secs(SessionType::Work),
            settings,
            state: TimerState::Idle,
            session_type: SessionType::Work,
            app_state,
            pending_advance: None,
            auto_advance_ticks: 1,
            permission: None,
            store,
            notifier: Box::new(notifier),
            task: Box::new(task),
        };
        engine.clamp_session_count();
        engine
    }

    /// Ticks between completion and the automatic advance (minimum 1).
    pub fn with_auto_advance(mut self, ticks: u32) -> Self {
        self.auto_advance_ticks = ticks.max(1);
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn session_type(&self) -> SessionType {
        self.session_type
    }

    pub fn seconds_remaining(&self) -> u32 {
        self.seconds_remaining
    }

    pub fn total_seconds(&self) -> u32 {
        self.settings.duration_secs(self.session_type)
    }

    pub fn session_count(&self) -> u32 {
        self.app_state.session_count
    }

    pub fn app_state(&self) -> &AppState {
        &self.app_state
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut Store {
        &mut self.store
    }

    /// `None` until the first start from Idle asked for permission.
    pub fn notification_permission(&self) -> Option<bool> {
        self.permission
    }

    /// Ticks left before an armed auto-advance fires.
    pub fn pending_advance(&self) -> Option<u32> {
        self.pending_advance
    }

    /// 0.0 ..= 100.0 progress within the current session.
    pub fn progress_percent(&self) -> f64 {
        let total = self.total_seconds() as f64;
        if total == 0.0 {
            return 0.0;
        }
        ((total - self.seconds_remaining as f64) / total * 100.0).clamp(0.0, 100.0)
    }

    /// Session type that follows the current one.
    pub fn next_session_type(&self) -> SessionType {
        match self.session_type {
            SessionType::Work => {
                if self.app_state.session_count + 1 >= self.settings.sessions_until_long_break {
                    SessionType::LongBreak
                } else {
                    SessionType::ShortBreak
                }
            }
            SessionType::ShortBreak | SessionType::LongBreak => SessionType::Work,
        }
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            state: self.state,
            session_type: self.session_type,
            seconds_remaining: self.seconds_remaining,
            total_seconds: self.total_seconds(),
            progress_percent: self.progress_percent(),
            session_count: self.app_state.session_count,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        let resumed = match self.state {
            TimerState::Idle => {
                if self.permission.is_none() {
                    self.request_permission();
                }
                false
            }
            TimerState::Paused => true,
            TimerState::Running | TimerState::Completed => return None,
        };
        self.state = TimerState::Running;
        tracing::info!(session = %self.session_type, remaining = self.seconds_remaining, resumed, "timer started");
        Some(Event::TimerStarted {
            session_type: self.session_type,
            seconds_remaining: self.seconds_remaining,
            resumed,
            at: Utc::now(),
        })
    }

    pub fn pause(&mut self) -> Option<Event> {
        if self.state != TimerState::Running {
            return None;
        }
        self.state = TimerState::Paused;
        tracing::info!(remaining = self.seconds_remaining, "timer paused");
        Some(Event::TimerPaused {
            session_type: self.session_type,
            seconds_remaining: self.seconds_remaining,
            at: Utc::now(),
        })
    }

    /// Back to `Idle` with the full duration of the current session type.
    /// Counters are untouched and nothing is logged.
    ///
    /// A pending auto-advance stays armed and still fires on a later tick.
    pub fn reset(&mut self) -> Option<Event> {
        if self.state == TimerState::Idle {
            return None;
        }
        self.state = TimerState::Idle;
        self.seconds_remaining = self.total_seconds();
        tracing::info!(session = %self.session_type, "timer reset");
        Some(Event::TimerReset {
            session_type: self.session_type,
            seconds_remaining: self.seconds_remaining,
            at: Utc::now(),
        })
    }

    /// Abandon the current interval and move to the next session type.
    /// Bookkeeping matches a natural completion; no record is created.
    pub fn skip(&mut self) -> Option<Event> {
        Some(self.advance(false))
    }

    /// Call once per elapsed second.
    ///
    /// Counts down an armed auto-advance in any state and performs it when
    /// it fires. While `Running` this also counts down the session and
    /// completes it at zero.
    pub fn tick(&mut self) -> Option<Event> {
        if let Some(ticks) = self.pending_advance {
            if ticks <= 1 {
                return Some(self.advance(true));
            }
            self.pending_advance = Some(ticks - 1);
        }
        if self.state != TimerState::Running {
            return None;
        }
        self.seconds_remaining = self.seconds_remaining.saturating_sub(1);
        tracing::trace!(remaining = self.seconds_remaining, "tick");
        if self.seconds_remaining == 0 {
            return self.complete();
        }
        None
    }

    /// Finish the running session: log it, notify, and arm the advance.
    pub fn complete(&mut self) -> Option<Event> {
        if self.state != TimerState::Running {
            return None;
        }
        let finished = self.session_type;
        self.state = TimerState::Completed;
        self.seconds_remaining = 0;

        let record = SessionRecord::new(
            self.task.current_task(),
            finished,
            self.settings.duration_min(finished),
            Utc::now(),
        );
        let persisted = self.store.append_session(record.clone());
        if !persisted {
            tracing::warn!(id = %record.id, "completed session could not be saved");
        }

        let body = format!("{} finished", finished.label());
        if let Err(e) = self.notifier.notify(COMPLETION_TITLE, &body) {
            tracing::warn!(error = %e, "notification failed");
        }

        self.pending_advance = Some(self.auto_advance_ticks);
        tracing::info!(session = %finished, id = %record.id, "session completed");
        Some(Event::TimerCompleted {
            session_type: finished,
            record,
            persisted,
            at: Utc::now(),
        })
    }

    /// Swap in new settings.
    ///
    /// A running or paused countdown keeps its remaining time; an idle one
    /// is resized to the new duration.
    pub fn update_settings(&mut self, settings: Settings) {
        debug_assert!(settings.validate().is_ok(), "engine given invalid settings");
        self.settings = settings;
        self.clamp_session_count();
        if self.state == TimerState::Idle {
            self.seconds_remaining = self.total_seconds();
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn request_permission(&mut self) {
        let granted = match self.notifier.request_permission() {
            Ok(granted) => granted,
            Err(e) => {
                tracing::warn!(error = %e, "notification permission request failed");
                false
            }
        };
        tracing::debug!(granted, "notification permission");
        self.permission = Some(granted);
    }

    fn advance(&mut self, automatic: bool) -> Event {
        let from = self.session_type;
        let to = self.next_session_type();

        match from {
            SessionType::Work => {
                let next = self.app_state.session_count + 1;
                self.app_state.session_count = if next >= self.settings.sessions_until_long_break {
                    0
                } else {
                    next
                };
            }
            SessionType::LongBreak => self.app_state.session_count = 0,
            SessionType::ShortBreak => {}
        }
        self.app_state.last_session_type = Some(from);
        if !self.store.save_app_state(&self.app_state) {
            tracing::warn!("session count could not be saved");
        }

        self.session_type = to;
        self.seconds_remaining = self.settings.duration_secs(to);
        self.state = TimerState::Idle;
        self.pending_advance = None;
        tracing::info!(%from, %to, automatic, count = self.app_state.session_count, "advanced session");
        Event::TimerSkipped {
            from,
            to,
            automatic,
            session_count: self.app_state.session_count,
            at: Utc::now(),
        }
    }

    fn clamp_session_count(&mut self) {
        let limit = self.settings.sessions_until_long_break.saturating_sub(1);
        if self.app_state.session_count > limit {
            self.app_state.session_count = limit;
            if !self.store.save_app_state(&self.app_state) {
                tracing::warn!("clamped session count could not be saved");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NotifyError;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Calls {
        permission_requests: Arc<Mutex<u32>>,
        notifications: Arc<Mutex<Vec<(String, String)>>>,
    }

    struct RecordingNotifier {
        calls: Calls,
        fail: bool,
    }

    impl Notifier for RecordingNotifier {
        fn request_permission(&mut self) -> Result<bool, NotifyError> {
            *self.calls.permission_requests.lock().unwrap() += 1;
            if self.fail {
                Err(NotifyError::PermissionDenied)
            } else {
                Ok(true)
            }
        }

        fn notify(&mut self, title: &str, body: &str) -> Result<(), NotifyError> {
            self.calls
                .notifications
                .lock()
                .unwrap()
                .push((title.to_string(), body.to_string()));
            if self.fail {
                Err(NotifyError::Delivery("speaker unplugged".into()))
            } else {
                Ok(())
            }
        }
    }

    fn short_settings() -> Settings {
        Settings {
            work_duration: 1,
            short_break_duration: 1,
            long_break_duration: 2,
            sessions_until_long_break: 4,
            volume: 0.5,
        }
    }

    fn engine_with(settings: Settings, fail: bool) -> (TimerEngine, Calls) {
        let calls = Calls::default();
        let notifier = RecordingNotifier {
            calls: calls.clone(),
            fail,
        };
        let engine = TimerEngine::new(settings, Store::in_memory(), notifier, || "focus".to_string());
        (engine, calls)
    }

    fn run_to_completion(engine: &mut TimerEngine) -> Option<Event> {
        engine.start();
        let mut last = None;
        while engine.state() == TimerState::Running {
            last = engine.tick();
        }
        last
    }

    #[test]
    fn idle_remaining_matches_configured_duration() {
        let (engine, _) = engine_with(Settings::default(), false);
        assert_eq!(engine.state(), TimerState::Idle);
        assert_eq!(engine.session_type(), SessionType::Work);
        assert_eq!(engine.seconds_remaining(), 25 * 60);
        assert_eq!(engine.progress_percent(), 0.0);
    }

    #[test]
    fn start_pause_resume() {
        let (mut engine, calls) = engine_with(Settings::default(), false);
        assert!(matches!(engine.start(), Some(Event::TimerStarted { resumed: false, .. })));
        assert_eq!(engine.state(), TimerState::Running);
        assert!(engine.start().is_none());

        engine.tick();
        assert!(engine.pause().is_some());
        assert_eq!(engine.state(), TimerState::Paused);
        let frozen = engine.seconds_remaining();
        assert!(engine.tick().is_none());
        assert_eq!(engine.seconds_remaining(), frozen);
        assert!(engine.pause().is_none());

        assert!(matches!(engine.start(), Some(Event::TimerStarted { resumed: true, .. })));
        assert_eq!(*calls.permission_requests.lock().unwrap(), 1);
        assert_eq!(engine.notification_permission(), Some(true));
    }

    #[test]
    fn tick_decrements_by_one() {
        let (mut engine, _) = engine_with(Settings::default(), false);
        engine.start();
        let before = engine.seconds_remaining();
        assert!(engine.tick().is_none());
        assert_eq!(engine.seconds_remaining(), before - 1);
        assert_eq!(engine.state(), TimerState::Running);
    }

    #[test]
    fn pause_only_from_running() {
        let (mut engine, _) = engine_with(Settings::default(), false);
        assert!(engine.pause().is_none());
        assert_eq!(engine.state(), TimerState::Idle);
    }

    #[test]
    fn completion_logs_once_and_notifies_once() {
        let (mut engine, calls) = engine_with(short_settings(), false);
        let event = run_to_completion(&mut engine);

        assert_eq!(engine.state(), TimerState::Completed);
        assert_eq!(engine.seconds_remaining(), 0);
        assert_eq!(engine.progress_percent(), 100.0);
        match event {
            Some(Event::TimerCompleted {
                session_type,
                record,
                persisted,
                ..
            }) => {
                assert_eq!(session_type, SessionType::Work);
                assert_eq!(record.task, "focus");
                assert_eq!(record.duration_min, 1);
                assert!(persisted);
            }
            other => panic!("expected TimerCompleted, got {other:?}"),
        }

        assert_eq!(engine.store().sessions().len(), 1);
        let notes = calls.notifications.lock().unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].0, COMPLETION_TITLE);
        assert_eq!(notes[0].1, "Work finished");
    }

    #[test]
    fn completion_auto_advances_on_next_tick() {
        let (mut engine, _) = engine_with(short_settings(), false);
        run_to_completion(&mut engine);
        assert_eq!(engine.pending_advance(), Some(1));

        match engine.tick() {
            Some(Event::TimerSkipped {
                from,
                to,
                automatic,
                session_count,
                ..
            }) => {
                assert_eq!(from, SessionType::Work);
                assert_eq!(to, SessionType::ShortBreak);
                assert!(automatic);
                assert_eq!(session_count, 1);
            }
            other => panic!("expected TimerSkipped, got {other:?}"),
        }
        assert_eq!(engine.state(), TimerState::Idle);
        assert_eq!(engine.seconds_remaining(), 60);
        assert_eq!(engine.store().sessions().len(), 1);
    }

    #[test]
    fn longer_auto_advance_delay_waits() {
        let (engine, _) = engine_with(short_settings(), false);
        let mut engine = engine.with_auto_advance(3);
        run_to_completion(&mut engine);
        assert!(engine.tick().is_none());
        assert!(engine.tick().is_none());
        assert!(matches!(engine.tick(), Some(Event::TimerSkipped { automatic: true, .. })));
    }

    #[test]
    fn skip_creates_no_record() {
        let (mut engine, calls) = engine_with(short_settings(), false);
        engine.start();
        engine.tick();
        assert!(matches!(engine.skip(), Some(Event::TimerSkipped { automatic: false, .. })));
        assert_eq!(engine.state(), TimerState::Idle);
        assert_eq!(engine.session_type(), SessionType::ShortBreak);
        assert_eq!(engine.session_count(), 1);
        assert!(engine.store().sessions().is_empty());
        assert!(calls.notifications.lock().unwrap().is_empty());
    }

    #[test]
    fn reset_restores_full_duration_without_bookkeeping() {
        let (mut engine, _) = engine_with(Settings::default(), false);
        assert!(engine.reset().is_none());
        engine.start();
        engine.tick();
        engine.tick();
        assert!(engine.reset().is_some());
        assert_eq!(engine.state(), TimerState::Idle);
        assert_eq!(engine.seconds_remaining(), 25 * 60);
        assert_eq!(engine.session_count(), 0);
        assert!(engine.store().sessions().is_empty());
    }

    #[test]
    fn reset_from_completed_keeps_auto_advance() {
        let (mut engine, _) = engine_with(short_settings(), false);
        run_to_completion(&mut engine);
        assert!(engine.reset().is_some());
        assert_eq!(engine.state(), TimerState::Idle);
        assert_eq!(engine.pending_advance(), Some(1));

        assert!(matches!(
            engine.tick(),
            Some(Event::TimerSkipped { automatic: true, to: SessionType::ShortBreak, .. })
        ));
        assert_eq!(engine.session_type(), SessionType::ShortBreak);
        assert_eq!(engine.session_count(), 1);
        assert_eq!(engine.app_state().last_session_type, Some(SessionType::Work));
        assert_eq!(engine.store().sessions().len(), 1);
        assert_eq!(engine.pending_advance(), None);
    }

    #[test]
    fn advance_fires_even_after_restart_from_reset() {
        let (engine, _) = engine_with(short_settings(), false);
        let mut engine = engine.with_auto_advance(2);
        run_to_completion(&mut engine);
        engine.reset();
        engine.start();
        assert!(engine.tick().is_none());
        assert!(matches!(engine.tick(), Some(Event::TimerSkipped { automatic: true, .. })));
        assert_eq!(engine.state(), TimerState::Idle);
        assert_eq!(engine.session_type(), SessionType::ShortBreak);
    }

    #[test]
    fn clamped_count_is_persisted() {
        let (mut engine, _) = engine_with(short_settings(), false);
        for _ in 0..6 {
            engine.skip();
        }
        engine.update_settings(Settings {
            sessions_until_long_break: 2,
            ..short_settings()
        });
        assert_eq!(engine.store().app_state().session_count, 1);
    }

    #[test]
    fn fourth_work_session_leads_to_long_break() {
        let (mut engine, _) = engine_with(short_settings(), false);
        let mut sequence = Vec::new();
        for _ in 0..8 {
            sequence.push((engine.session_type(), engine.session_count()));
            engine.skip();
        }
        assert_eq!(
            sequence,
            vec![
                (SessionType::Work, 0),
                (SessionType::ShortBreak, 1),
                (SessionType::Work, 1),
                (SessionType::ShortBreak, 2),
                (SessionType::Work, 2),
                (SessionType::ShortBreak, 3),
                (SessionType::Work, 3),
                (SessionType::LongBreak, 0),
            ]
        );
        assert_eq!(engine.session_type(), SessionType::Work);
        assert_eq!(engine.session_count(), 0);
        assert_eq!(engine.app_state().last_session_type, Some(SessionType::LongBreak));
    }

    #[test]
    fn bookkeeping_is_persisted() {
        let (mut engine, _) = engine_with(short_settings(), false);
        engine.skip();
        assert_eq!(engine.store().app_state().session_count, 1);
        assert_eq!(
            engine.store().app_state().last_session_type,
            Some(SessionType::Work)
        );
    }

    #[test]
    fn notifier_failures_do_not_affect_completion() {
        let (mut engine, calls) = engine_with(short_settings(), true);
        run_to_completion(&mut engine);
        assert_eq!(engine.notification_permission(), Some(false));
        assert_eq!(engine.state(), TimerState::Completed);
        assert_eq!(engine.store().sessions().len(), 1);
        assert_eq!(calls.notifications.lock().unwrap().len(), 1);
    }

    #[test]
    fn settings_change_while_running_keeps_remaining() {
        let (mut engine, _) = engine_with(Settings::default(), false);
        engine.start();
        engine.tick();
        let remaining = engine.seconds_remaining();
        engine.update_settings(Settings {
            work_duration: 50,
            ..Settings::default()
        });
        assert_eq!(engine.seconds_remaining(), remaining);

        engine.pause();
        engine.update_settings(Settings {
            work_duration: 10,
            ..Settings::default()
        });
        assert_eq!(engine.seconds_remaining(), remaining);
        // Remaining exceeds the new total; progress stays in range.
        assert_eq!(engine.progress_percent(), 0.0);
    }

    #[test]
    fn settings_change_while_idle_resyncs() {
        let (mut engine, _) = engine_with(Settings::default(), false);
        engine.update_settings(Settings {
            work_duration: 45,
            ..Settings::default()
        });
        assert_eq!(engine.seconds_remaining(), 45 * 60);
    }

    #[test]
    fn shrinking_long_break_interval_clamps_count() {
        let (mut engine, _) = engine_with(short_settings(), false);
        for _ in 0..6 {
            engine.skip();
        }
        assert_eq!(engine.session_count(), 3);
        engine.update_settings(Settings {
            sessions_until_long_break: 2,
            ..short_settings()
        });
        assert_eq!(engine.session_count(), 1);
        assert_eq!(engine.next_session_type(), SessionType::LongBreak);
    }

    #[test]
    fn snapshot_reports_progress() {
        let (mut engine, _) = engine_with(short_settings(), false);
        engine.start();
        for _ in 0..15 {
            engine.tick();
        }
        let snap = engine.snapshot();
        assert_eq!(snap.state, TimerState::Running);
        assert_eq!(snap.seconds_remaining, 45);
        assert_eq!(snap.total_seconds, 60);
        assert_eq!(snap.progress_percent, 25.0);
    }

    #[test]
    fn restored_count_above_limit_is_clamped() {
        let mut store = Store::in_memory();
        store.save_app_state(&AppState {
            session_count: 9,
            last_session_type: Some(SessionType::Work),
        });
        let engine = TimerEngine::new(short_settings(), store, crate::notify::NullNotifier, String::new);
        assert_eq!(engine.session_count(), 3);
    }
}
