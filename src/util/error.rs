//! Error types for glyphmatch.

use crate::solve::SolveState;
use thiserror::Error;

/// Result alias for glyphmatch operations.
pub type GlyphMatchResult<T> = std::result::Result<T, GlyphMatchError>;

/// Errors that can occur when decoding, segmenting or solving challenges.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GlyphMatchError {
    /// The payload is not valid base64 or not a decodable image container.
    #[error("failed to decode image payload: {reason}")]
    Decode { reason: String },
    /// The raster has zero width or height.
    #[error("invalid image dimensions {width}x{height}")]
    InvalidImage { width: usize, height: usize },
    /// The pixel buffer does not match the declared dimensions.
    #[error("pixel buffer has {got} bytes, expected {needed}")]
    BufferTooSmall { needed: usize, got: usize },
    /// Only 1-channel (grey) and 3-channel (RGB) rasters are supported.
    #[error("unsupported channel count {channels}")]
    UnsupportedChannels { channels: usize },
    /// A challenge was driven through an illegal state transition.
    #[error("cannot {action} a challenge in state {state:?}")]
    InvalidState {
        state: SolveState,
        action: &'static str,
    },
    /// Filesystem access to the corpus failed.
    #[error("corpus i/o failed: {reason}")]
    Io { reason: String },
    /// The challenge source could not fetch or submit.
    #[error("challenge transport failed: {reason}")]
    Transport { reason: String },
    /// The input data or parameters are invalid.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
}

impl From<std::io::Error> for GlyphMatchError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            reason: err.to_string(),
        }
    }
}
