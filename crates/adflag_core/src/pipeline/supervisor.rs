//! Pipeline supervisor: spawns and wires the three stages.
//!
//! The supervisor owns process lifecycles but never initiates shutdown. The
//! recorder finishing makes the detector kill the reader (it receives the
//! reader's PID as its first argument), EOF cascades through the transcoder
//! and detector, and the detector's stdout reaching EOF is the finish signal
//! the caller acts on. Reader/transcoder exit statuses are never part of the
//! success criteria.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};

use thiserror::Error;

use crate::config::ToolSettings;
use crate::presets::ParameterSet;

/// Errors starting or wiring the pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Source file missing: fatal precondition, nothing was spawned.
    #[error("Cannot access source file {0}")]
    SourceNotFound(PathBuf),

    /// A stage failed to spawn.
    #[error("Failed to spawn {stage} ({command}): {source}")]
    Spawn {
        stage: &'static str,
        command: String,
        #[source]
        source: io::Error,
    },

    /// A stage's standard stream was not captured.
    #[error("Pipeline stage {0} produced no capturable stdout")]
    MissingStdout(&'static str),
}

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Arguments for the tailing reader: replay from offset 0, follow growth.
pub fn reader_args(source: &Path) -> Vec<String> {
    vec![
        "--follow".to_string(),
        "--bytes=+1".to_string(),
        source.to_string_lossy().to_string(),
    ]
}

/// Arguments for the transcoder: stdin to uncompressed AU on stdout, fixed
/// channel count, minimal logging noise.
pub fn transcoder_args(channels: u32) -> Vec<String> {
    vec![
        "-loglevel".to_string(),
        "quiet".to_string(),
        "-i".to_string(),
        "pipe:0".to_string(),
        "-f".to_string(),
        "au".to_string(),
        "-ac".to_string(),
        channels.to_string(),
        "-".to_string(),
    ]
}

/// Arguments for the detector: reader PID first, then the six tuning values
/// in fixed order.
pub fn detector_args(reader_pid: u32, params: &ParameterSet) -> Vec<String> {
    let mut args = vec![reader_pid.to_string()];
    args.extend(params.to_args());
    args
}

/// The three live stage processes of one run.
pub struct PipelineHandle {
    reader: Child,
    transcoder: Child,
    detector: Child,
}

impl PipelineHandle {
    /// Spawn and wire all three stages.
    ///
    /// The source file must already exist; that is checked before anything
    /// is spawned. If a later stage fails to spawn, the earlier ones are
    /// killed so no orphan keeps the source file tailed forever.
    pub fn start(
        source: &Path,
        channels: u32,
        params: &ParameterSet,
        tools: &ToolSettings,
    ) -> PipelineResult<Self> {
        if !source.exists() {
            return Err(PipelineError::SourceNotFound(source.to_path_buf()));
        }

        tracing::debug!(
            "starting pipeline: {} {} | {} {} | {} <pid> {}",
            tools.reader,
            reader_args(source).join(" "),
            tools.transcoder,
            transcoder_args(channels).join(" "),
            tools.detector,
            params.to_args().join(" ")
        );

        let mut reader = Command::new(&tools.reader)
            .args(reader_args(source))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|e| spawn_error("reader", &tools.reader, e))?;

        let reader_out = match reader.stdout.take() {
            Some(out) => out,
            None => {
                kill_quietly(&mut reader);
                return Err(PipelineError::MissingStdout("reader"));
            }
        };
        let reader_pid = reader.id();

        let mut transcoder = match Command::new(&tools.transcoder)
            .args(transcoder_args(channels))
            .stdin(Stdio::from(reader_out))
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                kill_quietly(&mut reader);
                return Err(spawn_error("transcoder", &tools.transcoder, e));
            }
        };

        let transcoder_out = match transcoder.stdout.take() {
            Some(out) => out,
            None => {
                kill_quietly(&mut transcoder);
                kill_quietly(&mut reader);
                return Err(PipelineError::MissingStdout("transcoder"));
            }
        };

        let detector = match Command::new(&tools.detector)
            .args(detector_args(reader_pid, params))
            .stdin(Stdio::from(transcoder_out))
            .stdout(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                kill_quietly(&mut transcoder);
                kill_quietly(&mut reader);
                return Err(spawn_error("detector", &tools.detector, e));
            }
        };

        Ok(Self {
            reader,
            transcoder,
            detector,
        })
    }

    /// PID of the reader stage (handed to the detector as its kill target).
    pub fn reader_pid(&self) -> u32 {
        self.reader.id()
    }

    /// Take the detector's stdout for line-by-line consumption.
    pub fn take_output(&mut self) -> PipelineResult<ChildStdout> {
        self.detector
            .stdout
            .take()
            .ok_or(PipelineError::MissingStdout("detector"))
    }

    /// Reap all three stages after the output stream has ended.
    ///
    /// Exit statuses are logged at debug level only and never decide
    /// success; the reader is expected to have been killed by the detector,
    /// so non-zero statuses here are normal. The upstream stages are killed
    /// before being waited on - if the EOF cascade already ran its course
    /// that is a no-op, and if it didn't (detector crash) it keeps a wedged
    /// reader from blocking the run forever.
    pub fn reap(mut self) {
        match self.detector.wait() {
            Ok(status) => tracing::debug!("detector exited with {}", status),
            Err(e) => tracing::warn!("failed to reap detector: {}", e),
        }

        for (stage, child) in [
            ("transcoder", &mut self.transcoder),
            ("reader", &mut self.reader),
        ] {
            let _ = child.kill();
            match child.wait() {
                Ok(status) => tracing::debug!("{} exited with {}", stage, status),
                Err(e) => tracing::warn!("failed to reap {}: {}", stage, e),
            }
        }
    }
}

fn spawn_error(stage: &'static str, command: &str, source: io::Error) -> PipelineError {
    PipelineError::Spawn {
        stage,
        command: command.to_string(),
        source,
    }
}

fn kill_quietly(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}
