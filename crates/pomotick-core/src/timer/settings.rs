use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub const MIN_DURATION_MIN: u32 = 1;
pub const MAX_DURATION_MIN: u32 = 60;
pub const MIN_SESSIONS_UNTIL_LONG_BREAK: u32 = 2;
pub const MAX_SESSIONS_UNTIL_LONG_BREAK: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionType {
    Work,
    ShortBreak,
    LongBreak,
}

impl SessionType {
    pub fn label(&self) -> &'static str {
        match self {
            SessionType::Work => "Work",
            SessionType::ShortBreak => "Short break",
            SessionType::LongBreak => "Long break",
        }
    }

    pub fn is_break(&self) -> bool {
        !matches!(self, SessionType::Work)
    }
}

impl std::fmt::Display for SessionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            SessionType::Work => "work",
            SessionType::ShortBreak => "short-break",
            SessionType::LongBreak => "long-break",
        })
    }
}

/// User-tunable timer settings.
///
/// Durations are whole minutes. Values are validated at the boundary
/// (`validate`) and the engine assumes they are in range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_work_duration")]
    pub work_duration: u32,
    #[serde(default = "default_short_break")]
    pub short_break_duration: u32,
    #[serde(default = "default_long_break")]
    pub long_break_duration: u32,
    #[serde(default = "default_sessions_until_long_break")]
    pub sessions_until_long_break: u32,
    #[serde(default = "default_volume")]
    pub volume: f64,
}

fn default_work_duration() -> u32 {
    25
}
fn default_short_break() -> u32 {
    5
}
fn default_long_break() -> u32 {
    15
}
fn default_sessions_until_long_break() -> u32 {
    4
}
fn default_volume() -> f64 {
    0.5
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            work_duration: default_work_duration(),
            short_break_duration: default_short_break(),
            long_break_duration: default_long_break(),
            sessions_until_long_break: default_sessions_until_long_break(),
            volume: default_volume(),
        }
    }
}

impl Settings {
    /// Configured duration in minutes for a session type.
    pub fn duration_min(&self, session_type: SessionType) -> u32 {
        match session_type {
            SessionType::Work => self.work_duration,
            SessionType::ShortBreak => self.short_break_duration,
            SessionType::LongBreak => self.long_break_duration,
        }
    }

    /// Configured duration in seconds for a session type.
    ///
    /// Uses saturating arithmetic to prevent overflow with large values.
    pub fn duration_secs(&self, session_type: SessionType) -> u32 {
        self.duration_min(session_type).saturating_mul(60)
    }

    /// Check every field against its bounds.
    ///
    /// # Errors
    /// Returns the first field found out of range.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let durations = [
            ("work_duration", self.work_duration),
            ("short_break_duration", self.short_break_duration),
            ("long_break_duration", self.long_break_duration),
        ];
        for (field, value) in durations {
            check_range(field, value as f64, MIN_DURATION_MIN as f64, MAX_DURATION_MIN as f64)?;
        }
        check_range(
            "sessions_until_long_break",
            self.sessions_until_long_break as f64,
            MIN_SESSIONS_UNTIL_LONG_BREAK as f64,
            MAX_SESSIONS_UNTIL_LONG_BREAK as f64,
        )?;
        check_range("volume", self.volume, 0.0, 1.0)?;
        Ok(())
    }

    /// Return a copy with `field` set from its string form, validated.
    ///
    /// # Errors
    /// Returns an error for unknown fields, unparsable values, or values
    /// out of range.
    pub fn with_field(&self, field: &str, value: &str) -> Result<Settings, ValidationError> {
        let mut next = self.clone();
        let parse_min = |v: &str| {
            v.trim().parse::<u32>().map_err(|e| ValidationError::InvalidValue {
                field: field.to_string(),
                message: e.to_string(),
            })
        };
        match field {
            "work_duration" => next.work_duration = parse_min(value)?,
            "short_break_duration" => next.short_break_duration = parse_min(value)?,
            "long_break_duration" => next.long_break_duration = parse_min(value)?,
            "sessions_until_long_break" => next.sessions_until_long_break = parse_min(value)?,
            "volume" => {
                next.volume = value.trim().parse::<f64>().map_err(|e| {
                    ValidationError::InvalidValue {
                        field: field.to_string(),
                        message: e.to_string(),
                    }
                })?
            }
            other => return Err(ValidationError::UnknownField(other.to_string())),
        }
        next.validate()?;
        Ok(next)
    }

    /// Look up a field by name as a display string.
    pub fn field(&self, field: &str) -> Option<String> {
        match field {
            "work_duration" => Some(self.work_duration.to_string()),
            "short_break_duration" => Some(self.short_break_duration.to_string()),
            "long_break_duration" => Some(self.long_break_duration.to_string()),
            "sessions_until_long_break" => Some(self.sessions_until_long_break.to_string()),
            "volume" => Some(self.volume.to_string()),
            _ => None,
        }
    }
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ValidationError> {
    // NaN fails both comparisons, so test for inclusion.
    if value >= min && value <= max {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange { field, min, max, value })
    }
}
