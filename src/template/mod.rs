//! Labeled glyph templates and corpus ingestion.
//!
//! A corpus example is decoded and segmented with the store's pipeline
//! settings. It contributes templates only when the glyph count equals the
//! number of characters in its label; otherwise it is dropped and counted in
//! the returned [`CorpusReport`]. Templates are kept in insertion order and
//! never deduplicated, since the classifier's tie-break relies on that order.

use crate::segment::{segment_payload, GlyphRegion, PipelineConfig};
use crate::trace::{trace_event, trace_span, trace_warn};

/// A glyph region paired with the character it depicts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Template {
    region: GlyphRegion,
    label: char,
}

impl Template {
    /// Creates a template from a region and its label.
    pub fn new(region: GlyphRegion, label: char) -> Self {
        Self { region, label }
    }

    /// Returns the stored glyph region.
    pub fn region(&self) -> &GlyphRegion {
        &self.region
    }

    /// Returns the character label.
    pub fn label(&self) -> char {
        self.label
    }
}

/// One labeled corpus entry: a base64 image payload and its ground truth.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabeledExample {
    /// Ground-truth word, one character per glyph.
    pub label: String,
    /// Base64-encoded image container.
    pub payload: Vec<u8>,
}

impl LabeledExample {
    /// Creates an example from a label and payload.
    pub fn new(label: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            label: label.into(),
            payload: payload.into(),
        }
    }
}

/// Counters describing one corpus ingestion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CorpusReport {
    /// Examples that contributed templates.
    pub accepted: usize,
    /// Examples whose glyph count differed from the label length.
    pub dropped_mismatch: usize,
    /// Examples whose payload could not be decoded.
    pub dropped_decode: usize,
    /// Templates added across all accepted examples.
    pub templates_added: usize,
}

impl CorpusReport {
    /// Total number of examples seen.
    pub fn examples(&self) -> usize {
        self.accepted + self.dropped_mismatch + self.dropped_decode
    }
}

/// Process-lifetime set of templates, read-only once built.
#[derive(Clone, Debug, Default)]
pub struct TemplateStore {
    templates: Vec<Template>,
    pipeline: PipelineConfig,
}

impl TemplateStore {
    /// Creates an empty store bound to the given pipeline settings.
    pub fn new(pipeline: PipelineConfig) -> Self {
        Self {
            templates: Vec::new(),
            pipeline,
        }
    }

    /// Builds a store from a labeled corpus.
    pub fn build<I>(corpus: I, pipeline: PipelineConfig) -> Self
    where
        I: IntoIterator<Item = LabeledExample>,
    {
        Self::build_with_report(corpus, pipeline).0
    }

    /// Builds a store and returns the ingestion report alongside it.
    pub fn build_with_report<I>(corpus: I, pipeline: PipelineConfig) -> (Self, CorpusReport)
    where
        I: IntoIterator<Item = LabeledExample>,
    {
        let mut store = Self::new(pipeline);
        let report = store.add(corpus);
        (store, report)
    }

    /// Ingests a labeled corpus, dropping undecodable or mis-segmented examples.
    pub fn add<I>(&mut self, corpus: I) -> CorpusReport
    where
        I: IntoIterator<Item = LabeledExample>,
    {
        let _span = trace_span!("build_templates").entered();
        let mut report = CorpusReport::default();

        for example in corpus {
            let regions = match segment_payload(&example.payload, &self.pipeline) {
                Ok(regions) => regions,
                Err(err) => {
                    let reason = err.to_string();
                    trace_warn!(
                        "corpus_example_undecodable",
                        label = example.label.as_str(),
                        reason = reason.as_str(),
                    );
                    report.dropped_decode += 1;
                    continue;
                }
            };
            let glyphs = regions.len();
            match self.add_regions(regions, &example.label) {
                Some(added) => {
                    report.accepted += 1;
                    report.templates_added += added;
                }
                None => {
                    trace_event!(
                        "corpus_example_dropped",
                        label = example.label.as_str(),
                        glyphs = glyphs,
                    );
                    report.dropped_mismatch += 1;
                }
            }
        }

        trace_event!(
            "templates_built",
            accepted = report.accepted,
            dropped_mismatch = report.dropped_mismatch,
            dropped_decode = report.dropped_decode,
            templates = self.templates.len(),
        );
        report
    }

    /// Zips already segmented regions with the characters of `label`.
    ///
    /// Returns the number of templates added, or `None` (adding nothing) when
    /// the region count differs from the label's character count.
    pub fn add_regions(&mut self, regions: Vec<GlyphRegion>, label: &str) -> Option<usize> {
        if regions.len() != label.chars().count() {
            return None;
        }
        let added = regions.len();
        self.templates.extend(
            regions
                .into_iter()
                .zip(label.chars())
                .map(|(region, ch)| Template::new(region, ch)),
        );
        Some(added)
    }

    /// Appends a single template.
    pub fn insert(&mut self, template: Template) {
        self.templates.push(template);
    }

    /// Iterates templates in insertion order.
    pub fn all(&self) -> impl Iterator<Item = &Template> + '_ {
        self.templates.iter()
    }

    /// Returns the templates as a slice in insertion order.
    pub fn as_slice(&self) -> &[Template] {
        &self.templates
    }

    /// Returns the number of templates.
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Returns `true` if the store holds no templates.
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Pipeline settings used for templates and for challenges solved against them.
    pub fn pipeline(&self) -> &PipelineConfig {
        &self.pipeline
    }
}
