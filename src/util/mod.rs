//! Shared utility helpers.

pub mod error;
pub(crate) mod bits;

pub use error::{GlyphMatchError, GlyphMatchResult};
