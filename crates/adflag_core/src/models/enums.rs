//! Core enums used throughout the application.

use serde::{Deserialize, Serialize};

/// Status of a flagging run.
///
/// Stored both on the recording (flag state visible to players) and on an
/// attached job record. `Done` and `Errored` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// No run has touched this recording yet.
    #[default]
    Pending,
    /// A run is active; the skip-list is growing.
    InProgress,
    /// Run finished normally.
    Done,
    /// Run aborted with an error.
    Errored,
}

impl RunStatus {
    /// Get display string for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in-progress",
            Self::Done => "done",
            Self::Errored => "errored",
        }
    }

    /// Whether this status can no longer change.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Errored)
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of a markup entry.
///
/// The numeric wire values (4 = break start, 5 = break end) are the markup
/// table constants players already understand; the skip-list rendering uses
/// them verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkKind {
    BreakStart,
    BreakEnd,
}

impl MarkKind {
    /// Numeric value used in the skip-list wire format.
    pub fn value(&self) -> u32 {
        match self {
            Self::BreakStart => 4,
            Self::BreakEnd => 5,
        }
    }
}
