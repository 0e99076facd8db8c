//! JSON-file record store.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{RecordStore, StoreError, StoreResult};
use crate::models::{JobRecord, Mark, Recording, RecordingId, RunStatus};

/// Persistent store state (saved as one JSON document).
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreState {
    /// Store format version.
    version: u32,
    /// Known recordings with their markup.
    recordings: Vec<RecordingEntry>,
    /// Flagging jobs.
    jobs: Vec<JobRecord>,
}

impl Default for StoreState {
    fn default() -> Self {
        Self {
            version: 1,
            recordings: Vec::new(),
            jobs: Vec::new(),
        }
    }
}

/// A recording record plus its store-owned markup.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RecordingEntry {
    #[serde(flatten)]
    recording: Recording,
    #[serde(default)]
    markup: Vec<Mark>,
}

/// Record store backed by a single JSON file.
///
/// Every mutation rewrites the file atomically (temp file + rename) before
/// returning, which gives the durability the publisher requires.
#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    state: StoreState,
}

impl JsonStore {
    /// Open a store file, creating an empty store if it doesn't exist yet.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();

        let state = if path.exists() {
            let content = fs::read_to_string(&path)
                .map_err(|e| StoreError::io(format!("read {}", path.display()), e))?;
            serde_json::from_str(&content)?
        } else {
            StoreState::default()
        };

        Ok(Self { path, state })
    }

    /// The store file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Add a recording record (no-op markup) and persist.
    pub fn add_recording(&mut self, recording: Recording) -> StoreResult<()> {
        self.state.recordings.push(RecordingEntry {
            recording,
            markup: Vec::new(),
        });
        self.persist()
    }

    /// Add a job record and persist.
    pub fn add_job(&mut self, job: JobRecord) -> StoreResult<()> {
        self.state.jobs.push(job);
        self.persist()
    }

    fn entry(&self, id: &RecordingId) -> StoreResult<&RecordingEntry> {
        self.state
            .recordings
            .iter()
            .find(|e| e.recording.id == *id)
            .ok_or(StoreError::RecordingNotFound(*id))
    }

    fn entry_mut(&mut self, id: &RecordingId) -> StoreResult<&mut RecordingEntry> {
        self.state
            .recordings
            .iter_mut()
            .find(|e| e.recording.id == *id)
            .ok_or(StoreError::RecordingNotFound(*id))
    }

    /// Flush the full state to disk atomically.
    fn persist(&self) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| StoreError::io(format!("create {}", parent.display()), e))?;
            }
        }

        let json = serde_json::to_string_pretty(&self.state)?;

        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, &json)
            .map_err(|e| StoreError::io(format!("write {}", temp_path.display()), e))?;
        fs::rename(&temp_path, &self.path)
            .map_err(|e| StoreError::io(format!("rename to {}", self.path.display()), e))?;

        tracing::debug!("persisted store to {}", self.path.display());
        Ok(())
    }
}

impl RecordStore for JsonStore {
    fn recording(&self, id: &RecordingId) -> StoreResult<Recording> {
        Ok(self.entry(id)?.recording.clone())
    }

    fn job(&self, job_id: u64) -> StoreResult<JobRecord> {
        self.state
            .jobs
            .iter()
            .find(|j| j.id == job_id)
            .cloned()
            .ok_or(StoreError::JobNotFound(job_id))
    }

    fn set_status(&mut self, id: &RecordingId, status: RunStatus) -> StoreResult<()> {
        self.entry_mut(id)?.recording.status = status;
        self.persist()
    }

    fn clear_markup(&mut self, id: &RecordingId) -> StoreResult<()> {
        self.entry_mut(id)?.markup.clear();
        self.persist()
    }

    fn append_marks(&mut self, id: &RecordingId, marks: &[Mark]) -> StoreResult<()> {
        self.entry_mut(id)?.markup.extend_from_slice(marks);
        self.persist()
    }

    fn markup(&self, id: &RecordingId) -> StoreResult<Vec<Mark>> {
        Ok(self.entry(id)?.markup.clone())
    }

    fn update_job(&mut self, job_id: u64, status: RunStatus, comment: &str) -> StoreResult<()> {
        let job = self
            .state
            .jobs
            .iter_mut()
            .find(|j| j.id == job_id)
            .ok_or(StoreError::JobNotFound(job_id))?;
        job.status = status;
        job.comment = comment.to_string();
        self.persist()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::parse_start_time;
    use tempfile::tempdir;

    fn make_recording() -> Recording {
        Recording {
            id: RecordingId::new(1021, parse_start_time("2024-05-01 20:00:00").unwrap()),
            title: "News".to_string(),
            subtitle: String::new(),
            callsign: "NEWS1".to_string(),
            basename: "1021_20240501200000.ts".to_string(),
            storage_group: "Default".to_string(),
            status: RunStatus::Pending,
        }
    }

    #[test]
    fn open_missing_file_gives_empty_store() {
        let dir = tempdir().unwrap();
        let store = JsonStore::open(dir.path().join("store.json")).unwrap();
        assert!(!store.path().exists());
    }

    #[test]
    fn mutations_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        let rec = make_recording();
        let id = rec.id;

        {
            let mut store = JsonStore::open(&path).unwrap();
            store.add_recording(rec).unwrap();
            store.set_status(&id, RunStatus::InProgress).unwrap();
            store
                .append_marks(&id, &[Mark::start(1200), Mark::end(1500)])
                .unwrap();
        }

        let store = JsonStore::open(&path).unwrap();
        assert_eq!(store.recording(&id).unwrap().status, RunStatus::InProgress);
        assert_eq!(
            store.markup(&id).unwrap(),
            vec![Mark::start(1200), Mark::end(1500)]
        );
    }

    #[test]
    fn clear_markup_empties_only_markup() {
        let dir = tempdir().unwrap();
        let mut store = JsonStore::open(dir.path().join("store.json")).unwrap();
        let rec = make_recording();
        let id = rec.id;
        store.add_recording(rec).unwrap();
        store.append_marks(&id, &[Mark::start(10)]).unwrap();

        store.clear_markup(&id).unwrap();

        assert!(store.markup(&id).unwrap().is_empty());
        assert_eq!(store.recording(&id).unwrap().title, "News");
    }

    #[test]
    fn set_status_is_idempotent() {
        let dir = tempdir().unwrap();
        let mut store = JsonStore::open(dir.path().join("store.json")).unwrap();
        let rec = make_recording();
        let id = rec.id;
        store.add_recording(rec).unwrap();

        store.set_status(&id, RunStatus::InProgress).unwrap();
        store.set_status(&id, RunStatus::InProgress).unwrap();

        assert_eq!(store.recording(&id).unwrap().status, RunStatus::InProgress);
    }

    #[test]
    fn unknown_recording_errors() {
        let dir = tempdir().unwrap();
        let mut store = JsonStore::open(dir.path().join("store.json")).unwrap();
        let id = RecordingId::new(9, parse_start_time("2024-01-01 00:00:00").unwrap());

        assert!(matches!(
            store.set_status(&id, RunStatus::Done),
            Err(StoreError::RecordingNotFound(_))
        ));
    }

    #[test]
    fn job_updates_persist() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        let rec = make_recording();
        let rec_id = rec.id;

        {
            let mut store = JsonStore::open(&path).unwrap();
            store.add_recording(rec).unwrap();
            store
                .add_job(JobRecord {
                    id: 42,
                    recording: rec_id,
                    status: RunStatus::Pending,
                    comment: String::new(),
                })
                .unwrap();
            store
                .update_job(42, RunStatus::Done, "Detected 3 adverts.")
                .unwrap();
        }

        let store = JsonStore::open(&path).unwrap();
        let job = store.job(42).unwrap();
        assert_eq!(job.status, RunStatus::Done);
        assert_eq!(job.comment, "Detected 3 adverts.");
    }

    #[test]
    fn no_temp_file_left_behind() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        let mut store = JsonStore::open(&path).unwrap();
        store.add_recording(make_recording()).unwrap();

        assert!(!path.with_extension("json.tmp").exists());
    }
}
