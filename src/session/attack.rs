//! Repeated solve-and-submit run against a challenge source.

use crate::session::{ChallengeSource, Verdict};
use crate::solve::{Challenge, SolveState, Solver};
use crate::trace::{trace_event, trace_span, trace_warn};
use crate::util::{GlyphMatchError, GlyphMatchResult};
use std::time::{Duration, Instant};

/// Number of accepted answers the server requires by default.
pub const DEFAULT_TARGET: u32 = 100;

/// What to do when a challenge cannot be decoded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop the run and report the error.
    #[default]
    Abort,
    /// Submit an empty answer to obtain a fresh challenge.
    Skip,
}

/// Configuration for an attack run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttackConfig {
    /// Accepted answers needed to finish.
    pub target: u32,
    /// Wall-clock budget for the whole run.
    pub time_budget: Option<Duration>,
    /// Handling of per-challenge failures.
    pub on_failure: FailurePolicy,
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            target: DEFAULT_TARGET,
            time_budget: None,
            on_failure: FailurePolicy::Abort,
        }
    }
}

/// Counters for one run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScoreState {
    /// Answers submitted.
    pub attempts: u32,
    /// Answers accepted.
    pub successes: u32,
    /// Challenges that failed to decode.
    pub failures: u32,
    /// Accepted answers needed to finish.
    pub target: u32,
}

impl ScoreState {
    /// Fresh counters for a run with the given target.
    pub fn new(target: u32) -> Self {
        Self {
            target,
            ..Self::default()
        }
    }

    /// Records one submitted answer.
    pub fn record(&mut self, accepted: bool) {
        self.attempts += 1;
        if accepted {
            self.successes += 1;
        }
    }

    /// Whether the target has been reached.
    pub fn is_complete(&self) -> bool {
        self.successes >= self.target
    }

    /// Accepted answers per submission (0 before the first submission).
    pub fn success_ratio(&self) -> f64 {
        if self.attempts == 0 {
            return 0.0;
        }
        f64::from(self.successes) / f64::from(self.attempts)
    }
}

/// Why a run ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// The success target was reached.
    TargetReached,
    /// The wall-clock budget ran out.
    TimeBudgetExhausted,
    /// The source issued no further challenge.
    SourceExhausted,
    /// A challenge failed under [`FailurePolicy::Abort`].
    Aborted(GlyphMatchError),
}

/// Final state of a run.
#[derive(Clone, Debug, PartialEq)]
pub struct AttackOutcome {
    /// Counters at the end of the run.
    pub score: ScoreState,
    /// First completion token observed.
    pub token: Option<String>,
    /// Why the run ended.
    pub stop: StopReason,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
}

/// Drives a [`Solver`] against a [`ChallengeSource`] until a stop condition.
pub struct AttackLoop<'a> {
    solver: Solver<'a>,
    cfg: AttackConfig,
}

impl<'a> AttackLoop<'a> {
    /// Creates a run with the given configuration.
    pub fn new(solver: Solver<'a>, cfg: AttackConfig) -> Self {
        Self { solver, cfg }
    }

    /// Runs until the target, the time budget, source exhaustion or an abort.
    ///
    /// Transport errors from the source are returned as `Err`; solve errors
    /// follow the failure policy.
    pub fn run<S: ChallengeSource>(&self, source: &mut S) -> GlyphMatchResult<AttackOutcome> {
        let _span = trace_span!("attack", goal = self.cfg.target).entered();
        let started = Instant::now();
        let mut score = ScoreState::new(self.cfg.target);
        let mut token: Option<String> = None;
        let mut payload = source.fetch()?;

        let stop = loop {
            if score.is_complete() {
                break StopReason::TargetReached;
            }
            if self
                .cfg
                .time_budget
                .is_some_and(|budget| started.elapsed() >= budget)
            {
                break StopReason::TimeBudgetExhausted;
            }

            let mut challenge = Challenge::new(payload);
            let answer = match self.solver.run(&mut challenge) {
                Ok(answer) => answer.text.clone(),
                Err(err) => {
                    score.failures += 1;
                    let reason = err.to_string();
                    trace_warn!("challenge_failed", reason = reason.as_str());
                    match self.cfg.on_failure {
                        FailurePolicy::Abort => break StopReason::Aborted(err),
                        FailurePolicy::Skip => String::new(),
                    }
                }
            };
            let verdict = submit_answer(source, &mut challenge, &answer)?;
            score.record(verdict.accepted);
            trace_event!(
                "verdict",
                answer = answer.as_str(),
                accepted = verdict.accepted,
                successes = score.successes,
                attempts = score.attempts,
            );
            if token.is_none() {
                token = verdict.token;
            }

            match verdict.next {
                Some(next) => payload = next,
                None if score.is_complete() => break StopReason::TargetReached,
                None => break StopReason::SourceExhausted,
            }
        };

        Ok(AttackOutcome {
            score,
            token,
            stop,
            elapsed: started.elapsed(),
        })
    }
}

/// Sends `answer` and only then marks a solved challenge as submitted.
fn submit_answer<S: ChallengeSource + ?Sized>(
    source: &mut S,
    challenge: &mut Challenge,
    answer: &str,
) -> GlyphMatchResult<Verdict> {
    let verdict = source.submit(answer)?;
    if challenge.state() == SolveState::AnswerReady {
        challenge.mark_submitted()?;
    }
    Ok(verdict)
}

#[cfg(test)]
mod tests {
    use super::{submit_answer, ScoreState};
    use crate::session::{ChallengeSource, Verdict};
    use crate::solve::{Challenge, SolveState, Solver};
    use crate::template::TemplateStore;
    use crate::{GlyphMatchError, GlyphMatchResult, PipelineConfig};
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use std::io::Cursor;

    struct FlakySource {
        fail_submit: bool,
    }

    impl ChallengeSource for FlakySource {
        fn fetch(&mut self) -> GlyphMatchResult<Vec<u8>> {
            Ok(Vec::new())
        }

        fn submit(&mut self, _answer: &str) -> GlyphMatchResult<Verdict> {
            if self.fail_submit {
                return Err(GlyphMatchError::Transport {
                    reason: "connection reset".into(),
                });
            }
            Ok(Verdict {
                accepted: true,
                ..Verdict::default()
            })
        }
    }

    fn solved_blank_challenge(store: &TemplateStore) -> Challenge {
        let img = image::DynamicImage::ImageLuma8(image::GrayImage::from_pixel(
            6,
            4,
            image::Luma([255]),
        ));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        let mut challenge = Challenge::new(STANDARD.encode(buf.into_inner()).into_bytes());
        Solver::new(store).run(&mut challenge).unwrap();
        assert_eq!(challenge.state(), SolveState::AnswerReady);
        challenge
    }

    #[test]
    fn failed_submit_leaves_challenge_ready() {
        let store = TemplateStore::new(PipelineConfig::default());
        let mut challenge = solved_blank_challenge(&store);
        let mut source = FlakySource { fail_submit: true };
        let err = submit_answer(&mut source, &mut challenge, "").unwrap_err();
        assert!(matches!(err, GlyphMatchError::Transport { .. }));
        assert_eq!(challenge.state(), SolveState::AnswerReady);

        source.fail_submit = false;
        let verdict = submit_answer(&mut source, &mut challenge, "").unwrap();
        assert!(verdict.accepted);
        assert_eq!(challenge.state(), SolveState::Submitted);
    }

    #[test]
    fn score_state_tracks_ratio_and_completion() {
        let mut score = ScoreState::new(2);
        assert_eq!(score.success_ratio(), 0.0);
        score.record(true);
        score.record(false);
        assert!(!score.is_complete());
        score.record(true);
        assert!(score.is_complete());
        assert_eq!(score.attempts, 3);
        assert!((score.success_ratio() - 2.0 / 3.0).abs() < 1e-12);
    }
}
