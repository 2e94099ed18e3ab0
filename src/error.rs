//! Error types for buffer sizing and capture sources.
//!
//! The recording session never returns these to its callers; they surface in
//! logs and in the session state. Collaborator implementations return them.

use thiserror::Error;

/// Failure to resolve a usable capture buffer size.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BufferSizeError {
    #[error("sample rate must be positive")]
    InvalidSampleRate,

    #[error("invalid buffer size reported by minimum-size query: {0}")]
    InvalidBufferSize(i32),
}

/// Errors reported by a capture source.
#[derive(Error, Debug)]
pub enum CaptureError {
    /// The source could not be initialized with the requested parameters.
    #[error("capture source not initialized: {0}")]
    Uninitialized(String),

    #[error("capture source not started")]
    NotStarted,

    /// A single read failed with a source-specific code.
    #[error("read failed with code {0}")]
    Read(i32),

    #[error("capture source reached end of stream")]
    EndOfStream,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CaptureError {
    /// Whether this error means no further reads can succeed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, CaptureError::EndOfStream | CaptureError::Io(_))
    }
}
