//! Template ranking by pixel agreement.
//!
//! A glyph is compared only with templates of identical flattened length.
//! Similarity is the fraction of positionally equal pixels. Candidates are
//! ranked by descending similarity; equal scores keep template insertion
//! order, so the earliest-inserted template wins a tie. Repeated
//! `(label, similarity)` pairs collapse onto their first occurrence.

use crate::segment::GlyphRegion;
use crate::template::TemplateStore;
use std::cmp::Ordering;
use std::collections::HashSet;

/// One ranked label proposal for a glyph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Candidate {
    /// Template label.
    pub label: char,
    /// Number of positionally equal pixels.
    pub matching: usize,
    /// Number of pixels compared (the glyph length).
    pub pixels: usize,
    /// Index of the first template that produced this pair.
    pub template_index: usize,
}

impl Candidate {
    /// Fraction of equal pixels in `[0, 1]`.
    pub fn similarity(&self) -> f64 {
        if self.pixels == 0 {
            return 0.0;
        }
        self.matching as f64 / self.pixels as f64
    }
}

fn candidate_cmp_desc(a: &Candidate, b: &Candidate) -> Ordering {
    // Every candidate of one glyph shares `pixels`, so matching counts order
    // exactly like similarities.
    b.matching
        .cmp(&a.matching)
        .then_with(|| a.template_index.cmp(&b.template_index))
}

/// Outcome of classifying one glyph.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Classification {
    /// Best-ranked candidate.
    Recognized(Candidate),
    /// No template had a comparable length (or none cleared the floor).
    Unrecognized,
}

impl Classification {
    /// The recognized label, if any.
    pub fn label(&self) -> Option<char> {
        match self {
            Classification::Recognized(c) => Some(c.label),
            Classification::Unrecognized => None,
        }
    }

    /// The winning similarity, if any.
    pub fn similarity(&self) -> Option<f64> {
        match self {
            Classification::Recognized(c) => Some(c.similarity()),
            Classification::Unrecognized => None,
        }
    }
}

/// Ranks every comparable template against `glyph`, best first.
pub fn rank(glyph: &GlyphRegion, store: &TemplateStore) -> Vec<Candidate> {
    let pixels = glyph.pixel_count();
    let mut seen: HashSet<(char, usize)> = HashSet::new();
    let mut candidates = Vec::new();

    for (template_index, template) in store.all().enumerate() {
        let Some(matching) = glyph.matching_pixels(template.region()) else {
            continue;
        };
        if seen.insert((template.label(), matching)) {
            candidates.push(Candidate {
                label: template.label(),
                matching,
                pixels,
                template_index,
            });
        }
    }

    candidates.sort_by(candidate_cmp_desc);
    candidates
}

/// Classifies `glyph` against every template in `store`.
pub fn classify(glyph: &GlyphRegion, store: &TemplateStore) -> Classification {
    Classifier::new(store).classify(glyph)
}

/// Read-only classifier over a borrowed template store.
#[derive(Clone, Copy, Debug)]
pub struct Classifier<'a> {
    store: &'a TemplateStore,
    min_similarity: f64,
}

impl<'a> Classifier<'a> {
    /// Creates a classifier with no similarity floor.
    pub fn new(store: &'a TemplateStore) -> Self {
        Self {
            store,
            min_similarity: 0.0,
        }
    }

    /// Discards candidates scoring below `min_similarity`.
    pub fn with_min_similarity(mut self, min_similarity: f64) -> Self {
        self.min_similarity = min_similarity;
        self
    }

    /// Returns the ranked candidates that clear the similarity floor.
    pub fn rank(&self, glyph: &GlyphRegion) -> Vec<Candidate> {
        let mut ranked = rank(glyph, self.store);
        ranked.retain(|c| c.similarity() >= self.min_similarity);
        ranked
    }

    /// Returns the best candidate, or `Unrecognized`.
    pub fn classify(&self, glyph: &GlyphRegion) -> Classification {
        rank(glyph, self.store)
            .into_iter()
            .next()
            .filter(|c| c.similarity() >= self.min_similarity)
            .map_or(Classification::Unrecognized, Classification::Recognized)
    }
}
