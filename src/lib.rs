//! glyphmatch solves single-word image challenges by template matching.
//!
//! The pipeline decodes a base64 image payload, binarizes it with a fixed
//! threshold, splits it into glyphs along blank columns and classifies each
//! glyph against labeled templates by pixel agreement. Templates come from a
//! labeled corpus run through the same pipeline. Glyphs of one challenge can
//! be classified in parallel via the `rayon` feature.

pub mod binarize;
pub mod classify;
pub mod image;
pub mod io;
pub mod segment;
pub mod session;
pub mod solve;
pub mod template;
mod trace;
pub mod util;

pub use binarize::{binarize, BinaryGrid};
pub use classify::{classify, Candidate, Classification, Classifier};
pub use crate::image::decode::decode_payload;
pub use crate::image::Raster;
pub use segment::{segment, GlyphRegion, PipelineConfig};
pub use session::{
    AttackConfig, AttackLoop, AttackOutcome, ChallengeSource, FailurePolicy, LabelDecision,
    Labeler, ScoreState, StopReason, Verdict,
};
pub use solve::{solve, Answer, Challenge, SolveConfig, SolveState, Solver};
pub use template::{CorpusReport, LabeledExample, Template, TemplateStore};
pub use util::{GlyphMatchError, GlyphMatchResult};
