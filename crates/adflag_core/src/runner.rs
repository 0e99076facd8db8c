//! Top-level run controller.
//!
//! Sequences one flagging run: resolve identity, locate the source file,
//! resolve presets, clear stale markup, start the pipeline, drive the event
//! stream to completion, and record the outcome. Failures after identity
//! resolution are reported to any attached job record (best effort) before
//! propagating.

use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::config::Settings;
use crate::models::{RecordingId, RunStatus};
use crate::notify::UpdateChannel;
use crate::pipeline::{DetectorEvent, EventReader, PipelineError, PipelineHandle, Severity};
use crate::presets;
use crate::publish::{BreakPublisher, PublishError};
use crate::store::{RecordStore, StoreError};

/// Delay after the final status write. Finishing too quickly can race a
/// downstream status consumer against process teardown.
const SETTLE_DELAY: Duration = Duration::from_secs(1);

/// How the run's target recording is identified.
///
/// Exactly one of the two CLI input modes; "neither" is rejected by the CLI
/// before a request is ever built.
#[derive(Debug, Clone, Copy)]
pub enum RunIdentity {
    /// Via an attached job record.
    Job(u64),
    /// Manual operation on an explicit recording.
    Manual {
        chan_id: u32,
        start_time: NaiveDateTime,
    },
}

/// Everything needed to start a run.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub identity: RunIdentity,
    /// Explicit preset override string.
    pub preset: Option<String>,
    /// Preset file matched against recording metadata.
    pub preset_file: Option<PathBuf>,
}

/// Result of a completed run.
#[derive(Debug, Clone, Copy)]
pub struct RunOutcome {
    pub recording: RecordingId,
    pub breaks: u32,
}

/// Errors that abort a run.
#[derive(Error, Debug)]
pub enum RunError {
    /// The recording file could not be located in its storage group.
    #[error("Can't access file {basename} from {group}")]
    SourceNotFound { basename: String, group: String },

    /// Record store failure.
    #[error("Record store failure: {0}")]
    Store(#[from] StoreError),

    /// Pipeline could not be started or wired.
    #[error("Pipeline failure: {0}")]
    Pipeline(#[from] PipelineError),

    /// A break could not be persisted.
    #[error("Publish failure: {0}")]
    Publish(#[from] PublishError),

    /// The detector stream failed mid-read.
    #[error("Detector stream failed: {0}")]
    Stream(#[source] io::Error),
}

/// Execute a flagging run to completion.
pub fn run<S: RecordStore, C: UpdateChannel>(
    request: &RunRequest,
    settings: &Settings,
    store: &mut S,
    channel: &mut C,
) -> Result<RunOutcome, RunError> {
    let job_id = match request.identity {
        RunIdentity::Job(id) => Some(id),
        RunIdentity::Manual { .. } => None,
    };

    match run_inner(request, settings, store, channel, job_id) {
        Ok(outcome) => {
            thread::sleep(SETTLE_DELAY);
            Ok(outcome)
        }
        Err(e) => {
            if let Some(job_id) = job_id {
                let comment = match &e {
                    RunError::SourceNotFound { .. } => "Couldn't access file",
                    _ => "Failed.",
                };
                if let Err(update_err) = store.update_job(job_id, RunStatus::Errored, comment) {
                    tracing::error!(
                        "failed to record job {} failure: {}",
                        job_id,
                        update_err
                    );
                }
            }
            Err(e)
        }
    }
}

fn run_inner<S: RecordStore, C: UpdateChannel>(
    request: &RunRequest,
    settings: &Settings,
    store: &mut S,
    channel: &mut C,
    job_id: Option<u64>,
) -> Result<RunOutcome, RunError> {
    let rec_id = match request.identity {
        RunIdentity::Job(id) => {
            tracing::info!("starting job {}", id);
            store.job(id)?.recording
        }
        RunIdentity::Manual {
            chan_id,
            start_time,
        } => RecordingId::new(chan_id, start_time),
    };

    tracing::info!(
        "seeking chanid {}, starttime {}",
        rec_id.chan_id,
        rec_id.start_time
    );
    let recording = store.recording(&rec_id)?;
    tracing::info!(
        "Processing: {}, {}, \"{} - {}\"",
        recording.callsign,
        rec_id.start_time,
        recording.title,
        recording.subtitle
    );

    let Some(source) = settings
        .storage
        .find_file(&recording.storage_group, &recording.basename)
    else {
        tracing::error!(
            "Can't access file {} from {}",
            recording.basename,
            recording.storage_group
        );
        return Err(RunError::SourceNotFound {
            basename: recording.basename.clone(),
            group: recording.storage_group.clone(),
        });
    };

    let params = presets::resolve(
        request.preset.as_deref(),
        request.preset_file.as_deref(),
        &recording.title,
        &recording.callsign,
    );

    // Purge any stale skip-list and flag as in-progress before the first
    // event can arrive.
    store.clear_markup(&rec_id)?;
    store.set_status(&rec_id, RunStatus::InProgress)?;

    let mut pipeline =
        PipelineHandle::start(&source, settings.audio.channels, &params, &settings.tools)?;
    let output = pipeline.take_output()?;

    let mut publisher = BreakPublisher::new(store, channel, rec_id);
    drive_events(EventReader::new(BufReader::new(output)), &mut publisher)?;
    let breaks = publisher.breaks();
    drop(publisher);

    // EOF on the detector's stdout is the finish signal; now the stages can
    // be reaped without blocking the run.
    pipeline.reap();

    complete(store, &rec_id, job_id, breaks)?;

    Ok(RunOutcome {
        recording: rec_id,
        breaks,
    })
}

/// Dispatch the event stream until it ends.
pub fn drive_events<R: BufRead, S: RecordStore, C: UpdateChannel>(
    events: EventReader<R>,
    publisher: &mut BreakPublisher<'_, S, C>,
) -> Result<(), RunError> {
    for event in events {
        match event.map_err(RunError::Stream)? {
            DetectorEvent::Break { start, end, detail } => {
                tracing::info!("{}", detail.trim_end());
                publisher.on_break(start, end)?;
            }
            DetectorEvent::Log { severity, message } => match severity {
                Severity::Info => tracing::info!("{}", message),
                Severity::Debug => tracing::debug!("{}", message),
                Severity::Err => tracing::error!("{}", message),
            },
            DetectorEvent::Protocol { message } => tracing::warn!("{}", message),
        }
    }
    Ok(())
}

/// Record a normal finish: recording done, job done with the break count.
fn complete<S: RecordStore>(
    store: &mut S,
    rec_id: &RecordingId,
    job_id: Option<u64>,
    breaks: u32,
) -> Result<(), RunError> {
    store.set_status(rec_id, RunStatus::Done)?;

    tracing::info!("Detected {} adverts.", breaks);
    if let Some(job_id) = job_id {
        store.update_job(job_id, RunStatus::Done, &format!("Detected {} adverts.", breaks))?;
    }

    Ok(())
}
