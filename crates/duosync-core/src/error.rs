use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Failures from the external media tool (ffmpeg / ffprobe).
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("failed to run {tool}, is it installed?")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to wait for {tool}")]
    Wait {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited with {status}: {stderr}")]
    ToolFailed {
        tool: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("{tool} reported success but {} was not written", path.display())]
    MissingOutput { tool: String, path: PathBuf },
}

/// Failures producing or reading alignment results.
#[derive(Debug, Error)]
pub enum AlignmentError {
    #[error("aligner returned {got} results for {expected} inputs")]
    ResultCount { expected: usize, got: usize },

    #[error("alignment result {index} has no stream with a frame rate")]
    MissingFps { index: usize },

    #[error("failed to parse alignment output")]
    Parse(#[from] serde_json::Error),

    #[error("alignment I/O failed")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Media(#[from] MediaError),
}

/// Invalid inputs to the offset resolver.
#[derive(Debug, Error, PartialEq)]
pub enum OffsetError {
    #[error("frame rate must be finite and positive, got {0}")]
    InvalidFps(f64),

    #[error("trim values must be finite, got a={trim_a}, b={trim_b}")]
    InvalidTrim { trim_a: f64, trim_b: f64 },
}
