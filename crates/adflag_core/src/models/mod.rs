//! Core data types shared across the crate.

mod enums;
mod records;
mod skiplist;

pub use enums::{MarkKind, RunStatus};
pub use records::{parse_start_time, JobRecord, Recording, RecordingId, TimestampError};
pub use skiplist::{format_skip_list, skip_list, BreakRegion, Mark};
