//! Recording/job record store.
//!
//! The store is an external collaborator as far as the run is concerned; the
//! [`RecordStore`] trait is the seam. [`JsonStore`] persists to a single JSON
//! document with atomic writes and flushes every mutation synchronously, so
//! an observer polling the file always sees a consistent, monotonically
//! growing break list. [`MemoryStore`] is the in-memory double used by tests.

mod json;
mod memory;

use std::io;

use thiserror::Error;

pub use json::JsonStore;
pub use memory::MemoryStore;

use crate::models::{JobRecord, Mark, Recording, RecordingId, RunStatus};

/// Errors from record store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// File I/O error.
    #[error("I/O error in {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: io::Error,
    },

    /// Store document could not be parsed or serialized.
    #[error("Store data error: {0}")]
    Data(#[from] serde_json::Error),

    /// No recording with this identity.
    #[error("Recording {0} not found")]
    RecordingNotFound(RecordingId),

    /// No job with this id.
    #[error("Job {0} not found")]
    JobNotFound(u64),
}

impl StoreError {
    pub(crate) fn io(operation: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Interface to the recording/job record store.
///
/// Mutations must be durable before they return: the publisher relies on
/// each appended break being flushed before the next event is processed.
pub trait RecordStore {
    /// Fetch a recording's metadata.
    fn recording(&self, id: &RecordingId) -> StoreResult<Recording>;

    /// Fetch a job record.
    fn job(&self, job_id: u64) -> StoreResult<JobRecord>;

    /// Set the recording's flag status. Idempotent: setting the current
    /// status again is not an error.
    fn set_status(&mut self, id: &RecordingId, status: RunStatus) -> StoreResult<()>;

    /// Remove all markup for the recording.
    fn clear_markup(&mut self, id: &RecordingId) -> StoreResult<()>;

    /// Append marks to the recording's markup, preserving order.
    fn append_marks(&mut self, id: &RecordingId, marks: &[Mark]) -> StoreResult<()>;

    /// Read back the recording's full markup in append order.
    fn markup(&self, id: &RecordingId) -> StoreResult<Vec<Mark>>;

    /// Update a job's status and comment.
    fn update_job(&mut self, job_id: u64, status: RunStatus, comment: &str) -> StoreResult<()>;
}
