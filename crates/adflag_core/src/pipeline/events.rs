//! Detector output protocol.
//!
//! The detector writes one event per line in the form `tag@payload`. Known
//! tags: `cut` (a detected break), `info`/`debug`/`err` (log passthrough).
//! Each line decodes to exactly one [`DetectorEvent`]; nothing the detector
//! can emit terminates the stream loop early.

use std::io::{self, BufRead};
use std::sync::OnceLock;

use regex::Regex;

/// Log severity carried by detector log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Debug,
    Err,
}

/// One decoded line of detector output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectorEvent {
    /// A detected advert break, frame-accurate.
    Break {
        start: u64,
        end: u64,
        /// The raw payload, surfaced as an informational log line.
        detail: String,
    },
    /// A log passthrough line.
    Log {
        severity: Severity,
        message: String,
    },
    /// Protocol drift: unknown tag, missing separator, or malformed cut
    /// payload. Surfaced as a warning, never fatal.
    Protocol { message: String },
}

fn digit_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+").expect("literal regex"))
}

/// Extract the first two runs of decimal digits as (start, end).
fn extract_marks(payload: &str) -> Option<(u64, u64)> {
    let mut runs = digit_runs()
        .find_iter(payload)
        .filter_map(|m| m.as_str().parse::<u64>().ok());
    Some((runs.next()?, runs.next()?))
}

/// Decode one detector output line.
pub fn parse_line(line: &str) -> DetectorEvent {
    let Some((tag, payload)) = line.split_once('@') else {
        // No separator at all: surface the whole line rather than dropping it.
        return DetectorEvent::Protocol {
            message: line.to_string(),
        };
    };

    match tag {
        "cut" => match extract_marks(payload) {
            Some((start, end)) => DetectorEvent::Break {
                start,
                end,
                detail: payload.to_string(),
            },
            None => DetectorEvent::Protocol {
                message: payload.to_string(),
            },
        },
        "info" => DetectorEvent::Log {
            severity: Severity::Info,
            message: payload.to_string(),
        },
        "debug" => DetectorEvent::Log {
            severity: Severity::Debug,
            message: payload.to_string(),
        },
        "err" => DetectorEvent::Log {
            severity: Severity::Err,
            message: payload.to_string(),
        },
        // Unexpected tag: the tag itself is the message.
        other => DetectorEvent::Protocol {
            message: other.to_string(),
        },
    }
}

/// Lazy event sequence over the detector's stdout.
///
/// Yields events in emission order and ends cleanly when the underlying
/// stream reaches EOF. Read exactly once, from the start.
pub struct EventReader<R> {
    lines: io::Lines<R>,
}

impl<R: BufRead> EventReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }
}

impl<R: BufRead> Iterator for EventReader<R> {
    type Item = io::Result<DetectorEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        self.lines
            .next()
            .map(|result| result.map(|line| parse_line(&line)))
    }
}
