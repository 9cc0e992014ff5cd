//! Error taxonomy for WAV message extraction.
//!
//! Every variant is terminal for a run. The CLI maps each category to its own
//! process exit status via [`ExtractError::exit_code`] so scripts can branch
//! on the failure class.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the library.
pub type ExtractResult<T> = Result<T, ExtractError>;

#[derive(Debug, Error)]
pub enum ExtractError {
    /// Bad bit width or other caller-supplied parameter.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The input WAV file could not be opened for reading.
    #[error("could not open wav file {}", .path.display())]
    FileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The `fmt ` chunk describes audio this decoder cannot walk.
    #[error(
        "incompatible format: audio format {audio_format}, {channels} channel(s), \
         {bits_per_sample} bits per sample (need PCM, mono/stereo, 8/16/24/32-bit)"
    )]
    UnsupportedFormat {
        audio_format: u16,
        channels: u16,
        bits_per_sample: u16,
    },

    /// The RIFF structure ended before a header or declared chunk body was satisfied,
    /// including a `data` payload that stops on a frame boundary.
    #[error("truncated file while reading {context}: needed {needed} bytes, {available} available")]
    TruncatedFile {
        context: &'static str,
        needed: u64,
        available: u64,
    },

    /// The stream was exhausted before a chunk with the requested tag appeared.
    #[error("chunk {tag:?} not found")]
    ChunkNotFound { tag: String },

    /// A `fmt ` chunk too small to hold the 16 standard bytes.
    #[error("invalid fmt chunk: declared size {size} is smaller than 16 bytes")]
    InvalidFmtChunk { size: u32 },

    /// The `data` payload ended in the middle of a sample frame.
    #[error(
        "truncated sample data after {samples_read} samples: \
         frame needs {frame_bytes} bytes, got {got}"
    )]
    TruncatedData {
        samples_read: u64,
        frame_bytes: usize,
        got: usize,
    },

    /// The recovered message could not be written.
    #[error("could not write output file {}", .path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractError {
    /// Process exit status for this failure class.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::InvalidArgument(_) => 1,
            Self::FileOpen { .. } => 2,
            Self::UnsupportedFormat { .. } => 3,
            Self::TruncatedFile { .. }
            | Self::ChunkNotFound { .. }
            | Self::InvalidFmtChunk { .. }
            | Self::TruncatedData { .. } => 4,
            Self::OutputWrite { .. } => 5,
            Self::Io(_) => 6,
        }
    }
}
