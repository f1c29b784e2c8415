mod engine;
mod runner;
mod settings;
mod task_source;

pub use engine::{TimerEngine, TimerSnapshot, TimerState, COMPLETION_TITLE};
pub use runner::{Command, TimerRunner};
pub use settings::{
    SessionType, Settings, MAX_DURATION_MIN, MAX_SESSIONS_UNTIL_LONG_BREAK, MIN_DURATION_MIN,
    MIN_SESSIONS_UNTIL_LONG_BREAK,
};
pub use task_source::{SharedTask, TaskSource};
