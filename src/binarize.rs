//! Grey-level reduction and fixed-threshold binarization.
//!
//! The grey level of an RGB pixel is `R/3 + G/3 + B/3` with each channel
//! floor-divided before summing, which can never overflow `u8`. A grey pixel
//! `v` is treated as `R = G = B = v`. Levels below the threshold are ink
//! (dark strokes); everything else is background.

use crate::image::Raster;
use crate::util::{GlyphMatchError, GlyphMatchResult};

/// Default binarization threshold on the 0..=255 grey scale.
pub const DEFAULT_THRESHOLD: u8 = 128;

/// Ink/background grid stored column-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BinaryGrid {
    ink: Vec<bool>,
    width: usize,
    height: usize,
}

impl BinaryGrid {
    /// Builds a grid by evaluating `f(x, y)`; `true` marks ink.
    pub fn from_fn<F>(width: usize, height: usize, mut f: F) -> GlyphMatchResult<Self>
    where
        F: FnMut(usize, usize) -> bool,
    {
        if width == 0 || height == 0 {
            return Err(GlyphMatchError::InvalidImage { width, height });
        }
        let len = width
            .checked_mul(height)
            .ok_or(GlyphMatchError::InvalidImage { width, height })?;
        let mut ink = Vec::with_capacity(len);
        for x in 0..width {
            for y in 0..height {
                ink.push(f(x, y));
            }
        }
        Ok(Self { ink, width, height })
    }

    /// Returns the grid width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the grid height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns whether `(x, y)` is ink, or `None` out of bounds.
    pub fn is_ink(&self, x: usize, y: usize) -> Option<bool> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.ink.get(x * self.height + y).copied()
    }

    /// Returns column `x` top to bottom.
    pub fn column(&self, x: usize) -> Option<&[bool]> {
        if x >= self.width {
            return None;
        }
        let start = x * self.height;
        self.ink.get(start..start + self.height)
    }

    /// Counts ink pixels in column `x` (zero out of bounds).
    pub fn ink_in_column(&self, x: usize) -> usize {
        self.column(x)
            .map_or(0, |col| col.iter().filter(|&&ink| ink).count())
    }

    /// Returns the contiguous column-major slice for columns `start..end`.
    pub(crate) fn columns(&self, start: usize, end: usize) -> &[bool] {
        &self.ink[start * self.height..end * self.height]
    }

    /// Renders the grid as a grey raster: ink is 0, background is 255.
    pub fn to_raster(&self) -> Raster {
        let mut data = vec![255u8; self.width * self.height];
        for x in 0..self.width {
            for y in 0..self.height {
                if self.ink[x * self.height + y] {
                    data[y * self.width + x] = 0;
                }
            }
        }
        Raster::gray_unchecked(data, self.width, self.height)
    }
}

/// Saturation-safe average of three channel values.
#[inline]
pub fn gray_level(r: u8, g: u8, b: u8) -> u8 {
    r / 3 + g / 3 + b / 3
}

/// Binarizes a raster with the given threshold.
pub fn binarize(raster: &Raster, threshold: u8) -> BinaryGrid {
    let width = raster.width();
    let height = raster.height();
    let channels = raster.channels();
    let data = raster.data();
    let mut ink = Vec::with_capacity(width * height);
    for x in 0..width {
        for y in 0..height {
            let idx = (y * width + x) * channels;
            let level = if channels == 3 {
                gray_level(data[idx], data[idx + 1], data[idx + 2])
            } else {
                let v = data[idx];
                gray_level(v, v, v)
            };
            ink.push(level < threshold);
        }
    }
    BinaryGrid { ink, width, height }
}
