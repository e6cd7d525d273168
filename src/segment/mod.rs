//! Column-scan glyph segmentation.
//!
//! Columns are scanned left to right. A column whose ink count exceeds the
//! noise tolerance belongs to the currently open glyph; any other column is a
//! separator and closes it. Each glyph keeps the full grid height and is
//! flattened column-major, the same order used for templates, so glyphs of the
//! same shape compare position by position without any alignment search.

use crate::binarize::{binarize, BinaryGrid, DEFAULT_THRESHOLD};
use crate::image::decode::decode_payload;
use crate::image::Raster;
use crate::util::bits::BitVec;
use crate::util::{GlyphMatchError, GlyphMatchResult};

/// Default number of ink pixels a column may hold and still count as a gap.
pub const DEFAULT_NOISE_TOLERANCE: usize = 1;

/// Settings shared by every decode → binarize → segment run.
///
/// Templates and challenges must go through the same settings, otherwise
/// their glyph vectors are not comparable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Grey levels below this value are ink.
    pub threshold: u8,
    /// Columns with at most this many ink pixels separate glyphs.
    pub noise_tolerance: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            noise_tolerance: DEFAULT_NOISE_TOLERANCE,
        }
    }
}

/// A contiguous column range of a binary grid, flattened column-major.
///
/// Equality and hashing consider shape and pixels only, not `start_column`.
#[derive(Clone, Debug)]
pub struct GlyphRegion {
    bits: BitVec,
    start_column: usize,
    width: usize,
    height: usize,
}

impl GlyphRegion {
    /// Creates a region from column-major ink flags.
    pub fn from_bools(ink: &[bool], width: usize, height: usize) -> GlyphMatchResult<Self> {
        if width == 0 || height == 0 {
            return Err(GlyphMatchError::InvalidImage { width, height });
        }
        let needed = width
            .checked_mul(height)
            .ok_or(GlyphMatchError::InvalidImage { width, height })?;
        if ink.len() != needed {
            return Err(GlyphMatchError::BufferTooSmall {
                needed,
                got: ink.len(),
            });
        }
        Ok(Self {
            bits: BitVec::from_bools(ink.iter().copied()),
            start_column: 0,
            width,
            height,
        })
    }

    /// Number of pixels in the region (`width * height`).
    pub fn pixel_count(&self) -> usize {
        self.bits.len()
    }

    /// Width in columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in rows (the source grid height).
    pub fn height(&self) -> usize {
        self.height
    }

    /// First column of the region in the source grid.
    pub fn start_column(&self) -> usize {
        self.start_column
    }

    /// Number of ink pixels.
    pub fn ink_count(&self) -> usize {
        self.bits.count_ones()
    }

    /// Returns the flattened ink flags, column-major.
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.bits.iter()
    }

    /// Whether two regions have the same flattened length.
    pub fn is_comparable(&self, other: &GlyphRegion) -> bool {
        self.bits.len() == other.bits.len()
    }

    /// Count of positionally equal pixels, `None` if lengths differ.
    pub fn matching_pixels(&self, other: &GlyphRegion) -> Option<usize> {
        self.bits.hamming(&other.bits).map(|d| self.bits.len() - d)
    }

    /// Fraction of positionally equal pixels, `None` if lengths differ.
    pub fn similarity(&self, other: &GlyphRegion) -> Option<f64> {
        self.matching_pixels(other)
            .map(|m| m as f64 / self.bits.len() as f64)
    }
}

impl PartialEq for GlyphRegion {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width && self.height == other.height && self.bits == other.bits
    }
}

impl Eq for GlyphRegion {}

impl std::hash::Hash for GlyphRegion {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.width.hash(state);
        self.height.hash(state);
        self.bits.hash(state);
    }
}

/// Splits a binary grid into glyph regions, left to right.
///
/// A grid without ink yields no regions.
pub fn segment(grid: &BinaryGrid, noise_tolerance: usize) -> Vec<GlyphRegion> {
    let height = grid.height();
    let mut regions = Vec::new();
    let mut open: Option<usize> = None;

    for x in 0..grid.width() {
        if grid.ink_in_column(x) > noise_tolerance {
            if open.is_none() {
                open = Some(x);
            }
        } else if let Some(start) = open.take() {
            regions.push(region_from(grid, start, x, height));
        }
    }
    if let Some(start) = open {
        regions.push(region_from(grid, start, grid.width(), height));
    }

    regions.retain(|r| r.pixel_count() != 0);
    regions
}

fn region_from(grid: &BinaryGrid, start: usize, end: usize, height: usize) -> GlyphRegion {
    GlyphRegion {
        bits: BitVec::from_bools(grid.columns(start, end).iter().copied()),
        start_column: start,
        width: end - start,
        height,
    }
}

/// Binarizes and segments a raster.
pub fn segment_raster(raster: &Raster, cfg: &PipelineConfig) -> Vec<GlyphRegion> {
    let grid = binarize(raster, cfg.threshold);
    segment(&grid, cfg.noise_tolerance)
}

/// Decodes a base64 payload, then binarizes and segments it.
pub fn segment_payload(
    payload: &[u8],
    cfg: &PipelineConfig,
) -> GlyphMatchResult<Vec<GlyphRegion>> {
    let raster = decode_payload(payload)?;
    Ok(segment_raster(&raster, cfg))
}
