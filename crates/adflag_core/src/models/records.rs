//! Recording and job records.
//!
//! These mirror what the external record store holds about a recording and
//! an optional flagging job attached to it. The store owns the data; this
//! crate reads identity/metadata and writes status, comment, and markup.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::RunStatus;

/// Identity of a recording: channel plus UTC start time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordingId {
    /// Channel identifier.
    pub chan_id: u32,
    /// Recording start time (naive UTC).
    pub start_time: NaiveDateTime,
}

impl RecordingId {
    pub fn new(chan_id: u32, start_time: NaiveDateTime) -> Self {
        Self {
            chan_id,
            start_time,
        }
    }

    /// Key used to address player update messages:
    /// `<chanid>_<ISO start time with 'T' separator>`.
    pub fn run_key(&self) -> String {
        format!("{}_{}", self.chan_id, self.start_time.format("%Y-%m-%dT%H:%M:%S"))
    }
}

impl std::fmt::Display for RecordingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.run_key())
    }
}

/// Recording metadata as held by the record store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recording {
    /// Recording identity.
    pub id: RecordingId,
    /// Programme title.
    pub title: String,
    /// Programme subtitle (may be empty).
    #[serde(default)]
    pub subtitle: String,
    /// Channel callsign, e.g. "BBC1".
    pub callsign: String,
    /// File name within the storage group.
    pub basename: String,
    /// Storage group the file lives in.
    pub storage_group: String,
    /// Current flag state.
    #[serde(default)]
    pub status: RunStatus,
}

/// A flagging job attached to a recording.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    /// Job identifier.
    pub id: u64,
    /// Recording this job targets.
    pub recording: RecordingId,
    /// Current job status.
    #[serde(default)]
    pub status: RunStatus,
    /// Human-readable progress/result comment.
    #[serde(default)]
    pub comment: String,
}

/// Error parsing a start-time string.
#[derive(Error, Debug)]
#[error("invalid start time '{0}' (expected YYYY-MM-DD HH:MM:SS, ISO-T, or YYYYMMDDHHMMSS)")]
pub struct TimestampError(pub String);

/// Parse a recording start time from the forms accepted on the command line.
pub fn parse_start_time(raw: &str) -> Result<NaiveDateTime, TimestampError> {
    const FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y%m%d%H%M%S"];

    let raw = raw.trim();
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .ok_or_else(|| TimestampError(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_key_uses_t_separator() {
        let id = RecordingId::new(1021, parse_start_time("2024-05-01 20:00:00").unwrap());
        assert_eq!(id.run_key(), "1021_2024-05-01T20:00:00");
    }

    #[test]
    fn parse_accepts_space_and_t_forms() {
        let a = parse_start_time("2024-05-01 20:00:00").unwrap();
        let b = parse_start_time("2024-05-01T20:00:00").unwrap();
        let c = parse_start_time("20240501200000").unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(parse_start_time("yesterday").is_err());
        assert!(parse_start_time("").is_err());
    }

    #[test]
    fn recording_roundtrips_through_json() {
        let rec = Recording {
            id: RecordingId::new(7, parse_start_time("2024-01-02T03:04:05").unwrap()),
            title: "News".to_string(),
            subtitle: String::new(),
            callsign: "NEWS1".to_string(),
            basename: "7_20240102030405.ts".to_string(),
            storage_group: "Default".to_string(),
            status: RunStatus::Pending,
        };

        let json = serde_json::to_string(&rec).unwrap();
        let back: Recording = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, rec.id);
        assert_eq!(back.basename, rec.basename);
    }
}
