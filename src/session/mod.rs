//! Collaborator seams around the solver: challenge sources and labelers.
//!
//! The library defines only the traits and the loops that drive them. HTTP,
//! HTML scraping and terminal prompts live in the CLI crate.

use crate::image::Raster;
use crate::util::GlyphMatchResult;

pub mod attack;
pub mod collect;

pub use attack::{AttackConfig, AttackLoop, AttackOutcome, FailurePolicy, ScoreState, StopReason};
pub use collect::{collect_examples, CollectReport};

/// Server response to a submitted answer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Verdict {
    /// Whether the answer was accepted.
    pub accepted: bool,
    /// Server-side score, when the page reports one.
    pub score: Option<u32>,
    /// Completion token, once the server reveals it.
    pub token: Option<String>,
    /// Payload of the next challenge, if the server issued one.
    pub next: Option<Vec<u8>>,
}

/// A session-serial supplier of challenges.
pub trait ChallengeSource {
    /// Opens the session and returns the first challenge payload.
    fn fetch(&mut self) -> GlyphMatchResult<Vec<u8>>;

    /// Submits an answer for the current challenge.
    fn submit(&mut self, answer: &str) -> GlyphMatchResult<Verdict>;
}

/// What a labeler decided for one image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LabelDecision {
    /// Ground-truth word for the image.
    Label(String),
    /// Do not keep this image.
    Skip,
    /// End the collection run.
    Stop,
}

/// Capability that shows an image and obtains its ground-truth word.
pub trait Labeler {
    /// Labels one decoded challenge.
    fn label(&mut self, raster: &Raster, payload: &[u8]) -> GlyphMatchResult<LabelDecision>;
}
