//! Break-list publisher.
//!
//! Applies detected breaks to the persisted markup and pushes the updated
//! skip-list to players. Persistence is the hard requirement; notification
//! is best-effort.

use thiserror::Error;

use crate::models::{format_skip_list, skip_list, Mark, RecordingId};
use crate::notify::{flag_update_message, UpdateChannel};
use crate::store::{RecordStore, StoreError};

/// Errors applying a break. Only store failures surface; notification
/// failures are contained here by design.
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Failed to persist break: {0}")]
    Store(#[from] StoreError),
}

/// Applies cut events for one run.
pub struct BreakPublisher<'a, S: RecordStore, C: UpdateChannel> {
    store: &'a mut S,
    channel: &'a mut C,
    recording: RecordingId,
    run_key: String,
    breaks: u32,
}

impl<'a, S: RecordStore, C: UpdateChannel> BreakPublisher<'a, S, C> {
    pub fn new(store: &'a mut S, channel: &'a mut C, recording: RecordingId) -> Self {
        let run_key = recording.run_key();
        Self {
            store,
            channel,
            recording,
            run_key,
            breaks: 0,
        }
    }

    /// Apply one detected break.
    ///
    /// The start/end marks are appended and flushed before anything else
    /// happens, so the break is durable even if the notification never
    /// arrives. The notification carries the full recomputed skip-list, not
    /// just the new pair — players need the cumulative list.
    pub fn on_break(&mut self, start: u64, end: u64) -> Result<(), PublishError> {
        self.store
            .append_marks(&self.recording, &[Mark::start(start), Mark::end(end)])?;
        self.breaks += 1;

        let marks = self.store.markup(&self.recording)?;
        let formatted = format_skip_list(&skip_list(&marks));
        let message = flag_update_message(&self.run_key, &formatted);

        match self.channel.send(&message) {
            Ok(ack) if ack == "OK" => {}
            Ok(ack) => tracing::error!(
                "sending update message to backend failed, response = {}, message = {}",
                ack,
                message
            ),
            Err(e) => tracing::error!(
                "sending update message to backend failed: {}, message = {}",
                e,
                message
            ),
        }

        Ok(())
    }

    /// Number of breaks applied in this run.
    pub fn breaks(&self) -> u32 {
        self.breaks
    }
}
