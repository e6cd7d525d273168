//! Interactive corpus collection.

use crate::image::decode::decode_payload;
use crate::session::{ChallengeSource, LabelDecision, Labeler};
use crate::template::LabeledExample;
use crate::trace::{trace_event, trace_span, trace_warn};
use crate::util::GlyphMatchResult;

/// Counters for one collection run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CollectReport {
    /// Challenges fetched from the source.
    pub fetched: usize,
    /// Examples handed to the sink.
    pub labeled: usize,
    /// Challenges the labeler skipped (or labeled with an empty word).
    pub skipped: usize,
    /// Challenges whose payload did not decode.
    pub undecodable: usize,
}

/// Fetches challenges, asks `labeler` for each one and passes labeled
/// examples to `sink`.
///
/// After every challenge an empty answer is submitted to obtain the next one.
/// Stops after `limit` labeled examples (unbounded when `None`), when the
/// labeler says stop, or when the source has nothing more to offer.
/// Undecodable payloads are skipped; labeler, sink and transport errors end
/// the run.
pub fn collect_examples<S, L, F>(
    source: &mut S,
    labeler: &mut L,
    limit: Option<usize>,
    mut sink: F,
) -> GlyphMatchResult<CollectReport>
where
    S: ChallengeSource,
    L: Labeler,
    F: FnMut(LabeledExample) -> GlyphMatchResult<()>,
{
    let _span = trace_span!("collect").entered();
    let mut report = CollectReport::default();
    let mut payload = source.fetch()?;

    loop {
        if limit.is_some_and(|limit| report.labeled >= limit) {
            break;
        }
        report.fetched += 1;
        match decode_payload(&payload) {
            Ok(raster) => match labeler.label(&raster, &payload)? {
                LabelDecision::Label(label) if !label.is_empty() => {
                    trace_event!("labeled", label = label.as_str());
                    sink(LabeledExample::new(label, payload))?;
                    report.labeled += 1;
                }
                LabelDecision::Label(_) | LabelDecision::Skip => report.skipped += 1,
                LabelDecision::Stop => break,
            },
            Err(err) => {
                let reason = err.to_string();
                trace_warn!("challenge_undecodable", reason = reason.as_str());
                report.undecodable += 1;
            }
        }

        match source.submit("")?.next {
            Some(next) => payload = next,
            None => break,
        }
    }

    Ok(report)
}
