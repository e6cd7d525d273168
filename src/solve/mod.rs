//! Single-challenge solving: decode, binarize, segment, classify, join.
//!
//! A [`Challenge`] moves through
//! `AwaitingChallenge → Decoding → Segmenting → Classifying → AnswerReady →
//! Submitted`, or into `Failed` when decoding or segmentation errors. The
//! solver never retries; re-fetching is the caller's decision. Unrecognized
//! glyphs are skipped, which shortens the answer instead of failing it.

use crate::binarize::{binarize, BinaryGrid};
use crate::classify::{Classification, Classifier};
use crate::image::decode::decode_payload;
use crate::segment::{segment, GlyphRegion};
use crate::template::TemplateStore;
use crate::trace::{trace_event, trace_span};
use crate::util::{GlyphMatchError, GlyphMatchResult};

/// Lifecycle of one challenge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SolveState {
    /// Payload received, nothing processed yet.
    AwaitingChallenge,
    /// Base64 and image container decoding.
    Decoding,
    /// Binarization and glyph segmentation.
    Segmenting,
    /// Per-glyph template classification.
    Classifying,
    /// Answer assembled, not yet sent.
    AnswerReady,
    /// Answer handed to the server.
    Submitted,
    /// Decoding or segmentation failed.
    Failed,
}

/// Configuration for the solver.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SolveConfig {
    /// Candidates below this similarity are ignored (0 disables the floor).
    pub min_similarity: f64,
    /// Classify glyphs of one challenge in parallel (requires `rayon`).
    pub parallel: bool,
}

impl Default for SolveConfig {
    fn default() -> Self {
        Self {
            min_similarity: 0.0,
            parallel: false,
        }
    }
}

/// Answer assembled for one challenge.
#[derive(Clone, Debug, PartialEq)]
pub struct Answer {
    /// Concatenated labels of recognized glyphs.
    pub text: String,
    /// Per-glyph outcomes, left to right.
    pub glyphs: Vec<Classification>,
}

impl Answer {
    /// Number of glyphs that had no usable template.
    pub fn unrecognized(&self) -> usize {
        self.glyphs
            .iter()
            .filter(|g| matches!(g, Classification::Unrecognized))
            .count()
    }
}

/// One challenge instance and its progress.
#[derive(Clone, Debug)]
pub struct Challenge {
    payload: Vec<u8>,
    state: SolveState,
    answer: Option<Answer>,
}

impl Challenge {
    /// Wraps a base64 image payload.
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: payload.into(),
            state: SolveState::AwaitingChallenge,
            answer: None,
        }
    }

    /// Current state.
    pub fn state(&self) -> SolveState {
        self.state
    }

    /// The raw payload.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// The assembled answer, once `AnswerReady` or later.
    pub fn answer(&self) -> Option<&Answer> {
        self.answer.as_ref()
    }

    /// Records that the answer was sent.
    pub fn mark_submitted(&mut self) -> GlyphMatchResult<&str> {
        if self.state != SolveState::AnswerReady {
            return Err(GlyphMatchError::InvalidState {
                state: self.state,
                action: "submit",
            });
        }
        self.state = SolveState::Submitted;
        Ok(self.answer.as_ref().map_or("", |a| a.text.as_str()))
    }

    fn fail(&mut self, err: GlyphMatchError) -> GlyphMatchError {
        self.state = SolveState::Failed;
        err
    }
}

/// Solves challenges against a borrowed template store.
#[derive(Clone, Copy, Debug)]
pub struct Solver<'a> {
    store: &'a TemplateStore,
    cfg: SolveConfig,
}

impl<'a> Solver<'a> {
    /// Creates a solver with default configuration.
    pub fn new(store: &'a TemplateStore) -> Self {
        Self {
            store,
            cfg: SolveConfig::default(),
        }
    }

    /// Overrides the solver configuration.
    pub fn with_config(mut self, cfg: SolveConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &SolveConfig {
        &self.cfg
    }

    /// Returns the template store.
    pub fn store(&self) -> &'a TemplateStore {
        self.store
    }

    /// Drives `challenge` from `AwaitingChallenge` to `AnswerReady`.
    pub fn run<'c>(&self, challenge: &'c mut Challenge) -> GlyphMatchResult<&'c Answer> {
        if challenge.state != SolveState::AwaitingChallenge {
            return Err(GlyphMatchError::InvalidState {
                state: challenge.state,
                action: "solve",
            });
        }
        let _span = trace_span!("solve").entered();

        challenge.state = SolveState::Decoding;
        let raster = decode_payload(&challenge.payload).map_err(|err| challenge.fail(err))?;
        trace_event!("decoded", width = raster.width(), height = raster.height());

        challenge.state = SolveState::Segmenting;
        let pipeline = self.store.pipeline();
        let grid = binarize(&raster, pipeline.threshold);
        let glyphs = segment(&grid, pipeline.noise_tolerance);
        trace_event!("segmented", glyphs = glyphs.len());

        challenge.state = SolveState::Classifying;
        let answer = self.answer_glyphs(&glyphs);
        trace_event!(
            "answer_ready",
            answer = answer.text.as_str(),
            unrecognized = answer.unrecognized(),
        );

        challenge.state = SolveState::AnswerReady;
        Ok(challenge.answer.insert(answer))
    }

    /// Decodes and solves a base64 payload.
    pub fn solve(&self, payload: &[u8]) -> GlyphMatchResult<Answer> {
        let mut challenge = Challenge::new(payload);
        self.run(&mut challenge)?;
        challenge
            .answer
            .ok_or(GlyphMatchError::InvalidInput("challenge finished without an answer"))
    }

    /// Solves an already binarized grid.
    pub fn solve_grid(&self, grid: &BinaryGrid) -> Answer {
        let glyphs = segment(grid, self.store.pipeline().noise_tolerance);
        self.answer_glyphs(&glyphs)
    }

    /// Classifies segmented glyphs and joins the recognized labels.
    pub fn answer_glyphs(&self, glyphs: &[GlyphRegion]) -> Answer {
        let glyphs = self.classify_all(glyphs);
        let text = glyphs.iter().filter_map(Classification::label).collect();
        Answer { text, glyphs }
    }

    fn classify_all(&self, glyphs: &[GlyphRegion]) -> Vec<Classification> {
        let classifier = Classifier::new(self.store).with_min_similarity(self.cfg.min_similarity);

        #[cfg(feature = "rayon")]
        {
            use rayon::prelude::*;
            if self.cfg.parallel {
                return glyphs.par_iter().map(|g| classifier.classify(g)).collect();
            }
        }

        glyphs.iter().map(|g| classifier.classify(g)).collect()
    }
}

/// Solves one base64 payload against `store`, returning the answer text.
pub fn solve(
    payload: &[u8],
    store: &TemplateStore,
    cfg: &SolveConfig,
) -> GlyphMatchResult<String> {
    Solver::new(store)
        .with_config(*cfg)
        .solve(payload)
        .map(|answer| answer.text)
}

#[cfg(test)]
mod tests {
    use super::{Challenge, SolveState, Solver};
    use crate::segment::PipelineConfig;
    use crate::template::TemplateStore;
    use crate::GlyphMatchError;

    #[test]
    fn decode_failure_moves_to_failed() {
        let store = TemplateStore::new(PipelineConfig::default());
        let solver = Solver::new(&store);
        let mut challenge = Challenge::new(b"@@not-base64@@".to_vec());
        let err = solver.run(&mut challenge).unwrap_err();
        assert!(matches!(err, GlyphMatchError::Decode { .. }));
        assert_eq!(challenge.state(), SolveState::Failed);
        assert!(challenge.answer().is_none());
    }

    #[test]
    fn failed_challenge_cannot_be_rerun_or_submitted() {
        let store = TemplateStore::new(PipelineConfig::default());
        let solver = Solver::new(&store);
        let mut challenge = Challenge::new(b"@@".to_vec());
        let _ = solver.run(&mut challenge);
        assert_eq!(
            solver.run(&mut challenge).unwrap_err(),
            GlyphMatchError::InvalidState {
                state: SolveState::Failed,
                action: "solve",
            }
        );
        assert_eq!(
            challenge.mark_submitted().unwrap_err(),
            GlyphMatchError::InvalidState {
                state: SolveState::Failed,
                action: "submit",
            }
        );
    }

    #[test]
    fn fresh_challenge_cannot_be_submitted() {
        let mut challenge = Challenge::new(Vec::new());
        assert!(challenge.mark_submitted().is_err());
        assert_eq!(challenge.state(), SolveState::AwaitingChallenge);
    }
}
