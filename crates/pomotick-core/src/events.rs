use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::SessionRecord;
use crate::timer::{SessionType, TimerSnapshot};

/// Every timer state change produces an Event.
/// Front ends render them; the runner forwards them over a channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        session_type: SessionType,
        seconds_remaining: u32,
        /// True when continuing from Paused.
        resumed: bool,
        at: DateTime<Utc>,
    },
    TimerPaused {
        session_type: SessionType,
        seconds_remaining: u32,
        at: DateTime<Utc>,
    },
    TimerReset {
        session_type: SessionType,
        seconds_remaining: u32,
        at: DateTime<Utc>,
    },
    /// Moved to the next session, by the user or by the post-completion
    /// auto-advance.
    TimerSkipped {
        from: SessionType,
        to: SessionType,
        automatic: bool,
        session_count: u32,
        at: DateTime<Utc>,
    },
    TimerCompleted {
        session_type: SessionType,
        record: SessionRecord,
        /// False when the store dropped the record.
        persisted: bool,
        at: DateTime<Utc>,
    },
    StateSnapshot(TimerSnapshot),
}
