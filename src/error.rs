//! Error taxonomy for the batch TTS pipeline.
//!
//! Each variant maps to a distinct failure policy: `Read` and `MissingColumn`
//! abort the run, `NoAudio`/`InvalidParameter`/`Synthesis` abort only the
//! current item, `Decode` aborts a whole concatenation. Nothing is retried.

use thiserror::Error;

/// Errors produced by the pipeline stages.
#[derive(Debug, Error)]
pub enum Error {
    /// Input table could not be read (missing file, malformed or unsupported format).
    #[error("failed to read input table: {0}")]
    Read(String),

    /// The input table is missing a required column.
    #[error("input table is missing required column '{name}' (found {found} columns)")]
    MissingColumn { name: &'static str, found: usize },

    /// The TTS service produced no audio for the given text.
    #[error("no audio received for \"{0}\"")]
    NoAudio(String),

    /// The TTS service rejected a voice or rate parameter.
    #[error("invalid synthesis parameter: {0}")]
    InvalidParameter(String),

    /// The TTS service call failed (transport or non-parameter status error).
    #[error("speech synthesis failed: {0}")]
    Synthesis(String),

    /// An audio segment could not be decoded during assembly.
    #[error("audio decode error: {0}")]
    Decode(String),

    /// Archive construction failed.
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Filesystem error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type used throughout the pipeline.
pub type Result<T> = std::result::Result<T, Error>;
