//! Owned pixel rasters and payload decoding.
//!
//! A `Raster` is a contiguous, row-major `u8` buffer with either one (grey) or
//! three (RGB) interleaved channels. It is immutable once constructed; every
//! later pipeline stage reads it through `pixel`.

use crate::util::{GlyphMatchError, GlyphMatchResult};

pub mod decode;

/// Owned image buffer with 1 or 3 interleaved channels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raster {
    data: Vec<u8>,
    width: usize,
    height: usize,
    channels: usize,
}

impl Raster {
    /// Creates a raster from a row-major interleaved buffer.
    pub fn new(
        data: Vec<u8>,
        width: usize,
        height: usize,
        channels: usize,
    ) -> GlyphMatchResult<Self> {
        if width == 0 || height == 0 {
            return Err(GlyphMatchError::InvalidImage { width, height });
        }
        if channels != 1 && channels != 3 {
            return Err(GlyphMatchError::UnsupportedChannels { channels });
        }
        let needed = width
            .checked_mul(height)
            .and_then(|v| v.checked_mul(channels))
            .ok_or(GlyphMatchError::InvalidImage { width, height })?;
        if data.len() != needed {
            return Err(GlyphMatchError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            channels,
        })
    }

    /// Creates a single-channel raster.
    pub fn from_gray(data: Vec<u8>, width: usize, height: usize) -> GlyphMatchResult<Self> {
        Self::new(data, width, height, 1)
    }

    /// Creates a three-channel RGB raster.
    pub fn from_rgb(data: Vec<u8>, width: usize, height: usize) -> GlyphMatchResult<Self> {
        Self::new(data, width, height, 3)
    }

    /// Wraps a grey buffer whose dimensions are already known to be valid.
    pub(crate) fn gray_unchecked(data: Vec<u8>, width: usize, height: usize) -> Self {
        debug_assert_eq!(data.len(), width * height);
        Self {
            data,
            width,
            height,
            channels: 1,
        }
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the number of interleaved channels (1 or 3).
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Returns the backing buffer.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the channel values at `(x, y)` if it is within bounds.
    pub fn pixel(&self, x: usize, y: usize) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let start = (y * self.width + x) * self.channels;
        self.data.get(start..start + self.channels)
    }
}
