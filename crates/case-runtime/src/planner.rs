//! Turn Planner - builds the performance plan for one response
//!
//! classify -> synthesize -> phoneme timeline -> rig catalog -> resolve.
//! Every external failure short of an invalid plan degrades the turn
//! instead of failing it: no classifier means a neutral face, no speech or
//! no usable phonemes means a closed-mouth hold.

use case_core::{CaseError, CaseResult, Outcome, PlanSequence};
use case_visual::{
    ClassifierAdapter, ExpressionClassifier, PerformancePlan, RigCatalogProvider, TrackResolver,
};
use case_voice::{AudioHandle, SpeechProvider, TimelineBuilder};
use tracing::{info, warn};

use crate::ResponseAssembler;

/// Plan for one turn plus the audio it is synchronized to
#[derive(Debug, Clone)]
pub struct PlannedTurn {
    pub plan: PerformancePlan,
    /// `None` when synthesis failed and the plan is a silent hold
    pub audio: Option<AudioHandle>,
}

#[derive(Clone, Debug, Default)]
pub struct PlannerStats {
    pub turns: u64,
    pub degraded_turns: u64,
    pub speech_failures: u64,
    pub rest_holds: u64,
}

type BoxedClassifier = Box<dyn ExpressionClassifier + Send>;

/// Turn Planner
pub struct TurnPlanner {
    classifier: ClassifierAdapter<BoxedClassifier>,
    speech: Box<dyn SpeechProvider + Send>,
    catalog: Box<dyn RigCatalogProvider + Send>,
    timeline: TimelineBuilder,
    resolver: TrackResolver,
    sequence: PlanSequence,
    stats: PlannerStats,
}

impl TurnPlanner {
    pub fn new(
        classifier: impl ExpressionClassifier + Send + 'static,
        speech: impl SpeechProvider + Send + 'static,
        catalog: impl RigCatalogProvider + Send + 'static,
    ) -> Self {
        TurnPlanner {
            classifier: ClassifierAdapter::new(Box::new(classifier) as BoxedClassifier),
            speech: Box::new(speech),
            catalog: Box::new(catalog),
            timeline: TimelineBuilder::default(),
            resolver: TrackResolver::default(),
            sequence: PlanSequence::new(),
            stats: PlannerStats::default(),
        }
    }

    pub fn with_timeline(mut self, timeline: TimelineBuilder) -> Self {
        self.timeline = timeline;
        self
    }

    pub fn with_resolver(mut self, resolver: TrackResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn stats(&self) -> &PlannerStats {
        &self.stats
    }

    /// Plan the complete response `text`.
    ///
    /// Degradations are returned as warnings on the outcome. The only error
    /// is `InvalidPlan`.
    pub fn plan_turn(&mut self, text: &str) -> CaseResult<Outcome<PlannedTurn>> {
        let (intent, mut warnings) = self.classifier.classify_reported(text).into_parts();

        let (audio, phonemes) = match self.speech.synthesize(text) {
            Ok(output) => (Some(output.audio), output.phonemes),
            Err(err) => {
                warn!(error = %err, "speech unavailable, holding mouth closed");
                self.stats.speech_failures += 1;
                let err = match err {
                    CaseError::SpeechUnavailable(_) => err,
                    other => CaseError::SpeechUnavailable(other.to_string()),
                };
                warnings.push(err);
                (None, Vec::new())
            }
        };

        let (timeline, timeline_err) = self.timeline.build_or_rest(&phonemes);
        if let Some(err) = timeline_err {
            // Already reported when synthesis itself failed
            if audio.is_some() {
                warn!(error = %err, "no usable phonemes, holding mouth closed");
                warnings.push(err.into());
            }
            self.stats.rest_holds += 1;
        }

        let catalog = self.catalog.catalog();
        let stamp = self.sequence.next_stamp();
        let (plan, resolve_warnings) = self
            .resolver
            .resolve(stamp, &intent, timeline.visemes(), &catalog)?
            .into_parts();
        warnings.extend(resolve_warnings);

        self.stats.turns += 1;
        if !warnings.is_empty() {
            self.stats.degraded_turns += 1;
        }
        info!(
            plan = %plan.id(),
            expression = intent.expression.name(),
            keyframes = plan.keyframe_count(),
            duration_ms = plan.duration_ms(),
            warnings = warnings.len(),
            "turn planned"
        );

        Ok(Outcome::with_warnings(PlannedTurn { plan, audio }, warnings))
    }

    /// Plan a streamed response once every token has arrived
    pub fn plan_stream<I, S>(&mut self, tokens: I) -> CaseResult<Outcome<PlannedTurn>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut assembler = ResponseAssembler::new();
        assembler.extend(tokens);
        let text = assembler.finish();
        self.plan_turn(&text)
    }
}
