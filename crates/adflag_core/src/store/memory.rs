//! In-memory record store (for testing and embedding).

use std::collections::HashMap;

use super::{RecordStore, StoreError, StoreResult};
use crate::models::{JobRecord, Mark, Recording, RecordingId, RunStatus};

/// Record store held entirely in memory. Mirrors [`super::JsonStore`]
/// semantics without the disk round-trip.
#[derive(Debug, Default)]
pub struct MemoryStore {
    recordings: HashMap<RecordingId, Recording>,
    markup: HashMap<RecordingId, Vec<Mark>>,
    jobs: HashMap<u64, JobRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: seed a recording.
    pub fn with_recording(mut self, recording: Recording) -> Self {
        self.markup.insert(recording.id, Vec::new());
        self.recordings.insert(recording.id, recording);
        self
    }

    /// Builder: seed a job.
    pub fn with_job(mut self, job: JobRecord) -> Self {
        self.jobs.insert(job.id, job);
        self
    }
}

impl RecordStore for MemoryStore {
    fn recording(&self, id: &RecordingId) -> StoreResult<Recording> {
        self.recordings
            .get(id)
            .cloned()
            .ok_or(StoreError::RecordingNotFound(*id))
    }

    fn job(&self, job_id: u64) -> StoreResult<JobRecord> {
        self.jobs
            .get(&job_id)
            .cloned()
            .ok_or(StoreError::JobNotFound(job_id))
    }

    fn set_status(&mut self, id: &RecordingId, status: RunStatus) -> StoreResult<()> {
        let rec = self
            .recordings
            .get_mut(id)
            .ok_or(StoreError::RecordingNotFound(*id))?;
        rec.status = status;
        Ok(())
    }

    fn clear_markup(&mut self, id: &RecordingId) -> StoreResult<()> {
        if !self.recordings.contains_key(id) {
            return Err(StoreError::RecordingNotFound(*id));
        }
        self.markup.entry(*id).or_default().clear();
        Ok(())
    }

    fn append_marks(&mut self, id: &RecordingId, marks: &[Mark]) -> StoreResult<()> {
        if !self.recordings.contains_key(id) {
            return Err(StoreError::RecordingNotFound(*id));
        }
        self.markup.entry(*id).or_default().extend_from_slice(marks);
        Ok(())
    }

    fn markup(&self, id: &RecordingId) -> StoreResult<Vec<Mark>> {
        if !self.recordings.contains_key(id) {
            return Err(StoreError::RecordingNotFound(*id));
        }
        Ok(self.markup.get(id).cloned().unwrap_or_default())
    }

    fn update_job(&mut self, job_id: u64, status: RunStatus, comment: &str) -> StoreResult<()> {
        let job = self
            .jobs
            .get_mut(&job_id)
            .ok_or(StoreError::JobNotFound(job_id))?;
        job.status = status;
        job.comment = comment.to_string();
        Ok(())
    }
}
