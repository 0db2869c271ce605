//! Error handling for Tapedeck
//!
//! Every control-plane call reports failure through [`TransportError`].
//! The audio callback never returns errors; it fills silence instead.

use std::path::PathBuf;

use thiserror::Error;

use crate::engine::transport::TransportState;

/// Result type alias for Tapedeck operations
pub type Result<T> = std::result::Result<T, TransportError>;

/// Main error type for Tapedeck operations
#[derive(Error, Debug)]
pub enum TransportError {
    // Argument Errors
    #[error("Line index {index} out of range (line count {count})")]
    LineOutOfRange { index: usize, count: usize },

    #[error("Invalid file count {requested} (allowed 1..={max})")]
    InvalidFileCount { requested: usize, max: usize },

    #[error("Line {index} was reassigned while opening a file")]
    LineReassigned { index: usize },

    // File Errors
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("Invalid audio file: {reason}")]
    InvalidAudio {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    // Transport Errors
    #[error("Illegal transition: cannot request {requested} while {from}")]
    IllegalTransition {
        from: TransportState,
        requested: TransportState,
    },

    #[error("No recorder attached")]
    NoRecorder,

    #[error("File is loaded on line {line}: {}", path.display())]
    FileInUse { path: PathBuf, line: usize },

    // State Errors
    #[error("Corrupt state information: {reason}")]
    CorruptState { reason: String },

    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TransportError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            TransportError::LineOutOfRange { .. } => "LINE_OUT_OF_RANGE",
            TransportError::InvalidFileCount { .. } => "INVALID_FILE_COUNT",
            TransportError::LineReassigned { .. } => "LINE_REASSIGNED",
            TransportError::FileNotFound { .. } => "FILE_NOT_FOUND",
            TransportError::InvalidAudio { .. } => "INVALID_AUDIO",
            TransportError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            TransportError::IllegalTransition { .. } => "ILLEGAL_TRANSITION",
            TransportError::NoRecorder => "NO_RECORDER",
            TransportError::FileInUse { .. } => "FILE_IN_USE",
            TransportError::CorruptState { .. } => "CORRUPT_STATE",
            TransportError::Config { .. } => "CONFIG_ERROR",
            TransportError::Io(_) => "IO_ERROR",
            TransportError::Wav(_) => "WAV_ERROR",
            TransportError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if the caller can fix this error and retry
    ///
    /// Nothing is retried internally; a failed open must be retried by the
    /// caller after fixing the path or the arguments.
    pub fn is_recoverable(&self) -> bool {
        match self {
            TransportError::LineOutOfRange { .. } => true,
            TransportError::InvalidFileCount { .. } => true,
            TransportError::LineReassigned { .. } => true,
            TransportError::FileNotFound { .. } => true,
            TransportError::InvalidAudio { .. } => true,
            TransportError::UnsupportedFormat { .. } => true,
            TransportError::IllegalTransition { .. } => true,
            TransportError::FileInUse { .. } => true,
            _ => false,
        }
    }
}
