//! Small persisted records that survive restarts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::SessionType;

/// Long-break bookkeeping carried across restarts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppState {
    /// Completed work sessions since the last long break.
    /// Always below `sessions_until_long_break`.
    #[serde(default)]
    pub session_count: u32,
    #[serde(default)]
    pub last_session_type: Option<SessionType>,
}

/// The task the user is focusing on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentTask {
    pub text: String,
    pub started_at: DateTime<Utc>,
}

impl CurrentTask {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            started_at: Utc::now(),
        }
    }
}
