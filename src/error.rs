use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the trainer.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid pitch class '{0}'")]
    InvalidPitchClass(String),

    #[error("interval index {index} out of range ({len} intervals)")]
    InvalidIndex { index: usize, len: usize },

    #[error("step duration must be positive, got {0}")]
    InvalidDuration(f64),

    #[error("interval of {semitones} semitones exceeds the limit of {max}")]
    IntervalTooLarge { semitones: u32, max: u32 },

    #[error("audio engine not ready")]
    EngineNotReady,

    #[error("audio: {0}")]
    Audio(String),

    #[error("config {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    #[error("terminal: {0}")]
    Terminal(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
