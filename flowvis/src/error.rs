//! # Pipeline errors

use thiserror::Error;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Every failure that can abort a run.
///
/// Errors are never retried. Any opened reader or writer is released through its `Drop`
/// implementation while the error propagates.
#[derive(Error, Debug)]
pub enum Error {
    #[error("cannot open video source {path}: {reason}")]
    SourceUnavailable { path: String, reason: String },

    #[error("failed to decode frame {index}: {reason}")]
    DecodeError { index: u64, reason: String },

    #[error("cannot open {path} for writing: {reason}")]
    DestinationUnwritable { path: String, reason: String },

    #[error("failed to encode frame {index}: {reason}")]
    EncodeError { index: u64, reason: String },

    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("flow estimation failed: {0}")]
    Backend(String),

    #[error("cancelled")]
    Cancelled,
}

impl Error {
    /// Process exit code for the error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::SourceUnavailable { .. } => 2,
            Self::DecodeError { .. } => 3,
            Self::DestinationUnwritable { .. } => 4,
            Self::EncodeError { .. } => 5,
            Self::InvalidFrame(_) | Self::Config(_) => 6,
            Self::Backend(_) => 1,
            Self::Cancelled => 130,
        }
    }

    /// Name of the stage the error originated from.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::SourceUnavailable { .. } | Self::DecodeError { .. } => "reader",
            Self::DestinationUnwritable { .. } | Self::EncodeError { .. } => "writer",
            Self::InvalidFrame(_) | Self::Backend(_) => "colorizer",
            Self::Config(_) => "configuration",
            Self::Cancelled => "pipeline",
        }
    }
}
