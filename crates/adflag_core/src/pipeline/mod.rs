//! Detection pipeline: three external processes chained by pipes, plus the
//! parser for the detector's line protocol.
//!
//! ```text
//! reader (tail) ──► transcoder (ffmpeg) ──► detector ──► EventReader
//! ```
//!
//! The recording is still being written while the pipeline runs; the reader
//! follows file growth forever and the detector kills it (via the PID it is
//! handed) once its own input goes quiet. The resulting EOF cascade down the
//! chain is the only finish signal this side ever acts on.

mod events;
mod supervisor;

pub use events::{parse_line, DetectorEvent, EventReader, Severity};
pub use supervisor::{
    detector_args, reader_args, transcoder_args, PipelineError, PipelineHandle, PipelineResult,
};
