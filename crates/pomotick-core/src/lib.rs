//! # Pomotick Core Library
//!
//! Business logic for the Pomotick Pomodoro timer. Front ends (the
//! `pomotick` CLI today) are thin layers over this crate.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a tick-driven state machine; the caller invokes
//!   `tick()` once per second, or hands the engine to a [`TimerRunner`]
//! - **Storage**: a typed key-value [`Store`] over SQLite, plus the TOML
//!   [`Config`] file
//! - **Session Log**: bounded history of completed sessions
//! - **Stats**: daily/weekly totals and day streaks computed from the log
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`Store`]: Persistence for settings, task, history and counters
//! - [`Notifier`]: Completion alerts, injected by the front end

pub mod error;
pub mod events;
pub mod format;
pub mod notify;
pub mod session;
pub mod state;
pub mod stats;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, NotifyError, StorageError, ValidationError};
pub use events::Event;
pub use notify::{Notifier, NullNotifier};
pub use session::{SessionLog, SessionRecord};
pub use state::{AppState, CurrentTask};
pub use stats::{StatsReport, StreakSummary};
pub use storage::{Config, SqliteStore, Store};
pub use timer::{
    Command, SessionType, Settings, SharedTask, TaskSource, TimerEngine, TimerRunner,
    TimerSnapshot, TimerState,
};
