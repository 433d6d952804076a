//! End-to-end Integration Test Suite
//!
//! Drives complete turns through planning and playback:
//! - Response text to plan to rig calls
//! - Degradation when services or rig targets are missing
//! - Interruption by a newer turn
//! - Playback under jittered frame times
//! - Playback driven by the audio position

use std::time::Duration;

use case_core::{ms_to_duration, CaseError, CaseResult, PlanId, RigTargetId};
use case_runtime::{Performer, PerformerConfig, PlaybackState, TickReport, TurnPlanner};
use case_visual::{
    Expression, ExpressionClassifier, KeywordClassifier, RecordingRig, RigCatalog, TrackKind,
};
use case_voice::SpeechProvider;

use crate::jitter::{ClockJitter, JitterConfig};
use crate::providers::{face_rig, full_rig, LetterSpeech, ScriptedClassifier, ScriptedSpeech};

// ============================================================================
// SCENARIO CONFIGURATION
// ============================================================================

/// Clock the performer runs on
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScenarioClock {
    /// Runner pushes each jittered frame delta
    Frames,
    /// Runner plays the audio and reports its position; frames after the
    /// audio ends are slept for real
    Audio,
}

/// Scenario configuration
#[derive(Clone, Debug)]
pub struct ScenarioConfig {
    /// Render loop behaviour
    pub jitter: JitterConfig,
    pub clock: ScenarioClock,
    /// Random seed (for reproducibility)
    pub seed: u64,
    /// Give up after this many ticks
    pub max_ticks: usize,
    /// Targets the host rig defines
    pub catalog: RigCatalog,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            jitter: JitterConfig::default(),
            clock: ScenarioClock::Frames,
            seed: 42,
            max_ticks: 2_000,
            catalog: full_rig(),
        }
    }
}

impl ScenarioConfig {
    /// Steady 60 Hz loop
    pub fn minimal() -> Self {
        Self {
            jitter: JitterConfig::steady(),
            ..Default::default()
        }
    }

    /// Noisy frames with occasional stalls
    pub fn standard() -> Self {
        Self {
            jitter: JitterConfig::uneven(),
            ..Default::default()
        }
    }

    /// Overloaded host
    pub fn stress() -> Self {
        Self {
            jitter: JitterConfig::hostile(),
            seed: 7,
            ..Default::default()
        }
    }

    /// Steady loop synchronized to the speech audio
    pub fn audio() -> Self {
        Self {
            clock: ScenarioClock::Audio,
            ..Self::minimal()
        }
    }

    pub fn with_catalog(mut self, catalog: RigCatalog) -> Self {
        self.catalog = catalog;
        self
    }
}

// ============================================================================
// SCENARIO RESULT
// ============================================================================

/// Result of one played turn
#[derive(Clone, Debug)]
pub struct ScenarioResult {
    pub plan: PlanId,
    pub expression: Expression,
    /// Degradation warnings from planning
    pub warnings: Vec<CaseError>,
    /// Ticks run until playback returned to idle
    pub ticks: usize,
    pub completed: bool,
    /// Keyframes entered, in order
    pub entered: Vec<(TrackKind, usize)>,
    /// Keyframes the plan held
    pub keyframes: usize,
    /// Keyframes entered that belonged to another plan
    pub foreign_entries: usize,
    pub rig_applications: usize,
    /// Every target back at rest when playback ended
    pub at_rest: bool,
    /// Targets left away from rest when playback ended
    pub held: Vec<RigTargetId>,
}

impl ScenarioResult {
    /// Completed, every keyframe entered once, nothing foreign applied
    pub fn passed(&self) -> bool {
        self.completed
            && self.foreign_entries == 0
            && self.entered.len() == self.keyframes
            && self.monotonic()
    }

    /// Entered indices strictly increase on each track
    pub fn monotonic(&self) -> bool {
        TrackKind::ALL.iter().all(|kind| {
            let indices: Vec<usize> = self
                .entered
                .iter()
                .filter(|(k, _)| k == kind)
                .map(|(_, i)| *i)
                .collect();
            indices.windows(2).all(|w| w[0] < w[1])
        })
    }

    pub fn is_degraded(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn holds(&self, target: &str) -> bool {
        self.held.iter().any(|t| t.as_str() == target)
    }
}

/// Speech audio the runner is playing back
#[derive(Clone, Copy, Debug)]
struct AudioPlayback {
    position: Duration,
    end: Duration,
}

// ============================================================================
// SCENARIO RUNNER
// ============================================================================

/// Planner, performer and a recording rig wired together
pub struct ScenarioRunner {
    config: ScenarioConfig,
    planner: TurnPlanner,
    performer: Performer,
    rig: RecordingRig,
    jitter: ClockJitter,
    audio: Option<AudioPlayback>,
}

impl ScenarioRunner {
    pub fn new(
        config: ScenarioConfig,
        classifier: impl ExpressionClassifier + Send + 'static,
        speech: impl SpeechProvider + Send + 'static,
    ) -> Self {
        let performer = match config.clock {
            ScenarioClock::Frames => PerformerConfig::manual(),
            ScenarioClock::Audio => PerformerConfig::default(),
        };
        Self {
            planner: TurnPlanner::new(classifier, speech, config.catalog.clone()),
            performer: Performer::with_config(performer),
            rig: RecordingRig::new(),
            jitter: ClockJitter::new(config.jitter.clone(), config.seed),
            audio: None,
            config,
        }
    }

    /// Keyword classifier and letter speech
    pub fn standard(config: ScenarioConfig) -> Self {
        Self::new(config, KeywordClassifier::default(), LetterSpeech::new())
    }

    /// Plan `text` and queue it on the performer
    pub fn submit(&mut self, text: &str) -> CaseResult<(PlanId, Expression, usize, Vec<CaseError>)> {
        let (turn, warnings) = match self.planner.plan_turn(text) {
            Ok(outcome) => outcome.into_parts(),
            Err(err) => {
                self.performer.handle().stop();
                return Err(err);
            }
        };
        let id = turn.plan.id();
        let expression = turn.plan.intent().expression;
        let keyframes = turn.plan.keyframe_count();
        // The mouth closes where the last phoneme ends
        self.audio = turn.audio.and_then(|_| {
            let end = turn.plan.track(TrackKind::Mouth).keyframes().last()?.time_ms;
            Some(AudioPlayback {
                position: Duration::ZERO,
                end: ms_to_duration(end),
            })
        });
        self.performer.handle().submit_turn(Ok(turn.plan))?;
        Ok((id, expression, keyframes, warnings))
    }

    /// One jittered frame
    pub fn tick(&mut self) -> TickReport {
        let delta = self.jitter.next_delta();
        match self.config.clock {
            ScenarioClock::Frames => self.performer.tick_by(delta, &mut self.rig),
            ScenarioClock::Audio => {
                match self.audio.as_mut() {
                    Some(audio) if audio.position < audio.end => {
                        audio.position = (audio.position + delta).min(audio.end);
                        self.performer.report_audio_position(audio.position);
                    }
                    _ => std::thread::sleep(delta),
                }
                self.performer.tick(&mut self.rig)
            }
        }
    }

    /// Plan `text` and play it until the performer is idle again
    pub fn run_turn(&mut self, text: &str) -> CaseResult<ScenarioResult> {
        let (plan, expression, keyframes, warnings) = self.submit(text)?;
        let mut result = ScenarioResult {
            plan,
            expression,
            warnings,
            ticks: 0,
            completed: false,
            entered: Vec::new(),
            keyframes,
            foreign_entries: 0,
            rig_applications: 0,
            at_rest: false,
            held: Vec::new(),
        };
        self.play(&mut result);
        Ok(result)
    }

    /// Start `first`, interrupt it with `second` after `after_ticks`, and
    /// play `second` to the end
    pub fn run_interrupted(
        &mut self,
        first: &str,
        second: &str,
        after_ticks: usize,
    ) -> CaseResult<ScenarioResult> {
        self.submit(first)?;
        for _ in 0..after_ticks {
            self.tick();
        }
        self.run_turn(second)
    }

    /// Stop whatever is playing
    pub fn stop(&mut self) -> bool {
        self.performer.handle().stop();
        self.tick();
        self.rig.is_at_rest()
    }

    fn play(&mut self, result: &mut ScenarioResult) {
        while result.ticks < self.config.max_ticks {
            let report = self.tick();
            result.ticks += 1;
            result.rig_applications += report.applications;

            if report.plan == Some(result.plan) {
                result.entered.extend(report.entered.iter().copied());
            } else {
                result.foreign_entries += report.entered.len();
            }
            if report.completed() == Some(result.plan) {
                result.completed = true;
            }
            if self.performer.state() == PlaybackState::Idle {
                break;
            }
        }
        result.at_rest = self.rig.is_at_rest();
        result.held = self.rig.posed_targets().cloned().collect();
    }

    pub fn rig(&self) -> &RecordingRig {
        &self.rig
    }

    pub fn performer(&self) -> &Performer {
        &self.performer
    }

    pub fn planner(&self) -> &TurnPlanner {
        &self.planner
    }

    pub fn jitter(&self) -> &ClockJitter {
        &self.jitter
    }
}

// ============================================================================
// SCENARIOS
// ============================================================================

/// A cheerful reply played on a steady loop
pub fn scenario_happy_reply() -> CaseResult<ScenarioResult> {
    ScenarioRunner::standard(ScenarioConfig::minimal()).run_turn("I am so happy to see you")
}

/// Several turns under frame jitter
pub fn scenario_conversation_with_jitter() -> CaseResult<Vec<ScenarioResult>> {
    let mut runner = ScenarioRunner::standard(ScenarioConfig::standard());
    [
        "Hello there",
        "Wow that is amazing",
        "Sorry to hear that",
        "Yes exactly",
    ]
    .into_iter()
    .map(|text| runner.run_turn(text))
    .collect()
}

/// Contrasting turns, each synchronized to its speech audio
pub fn scenario_conversation_on_audio_clock() -> CaseResult<Vec<ScenarioResult>> {
    let mut runner = ScenarioRunner::standard(ScenarioConfig::audio());
    [
        "I am so happy to see you",
        "Sorry to hear that",
        "Wow",
        "Okay",
    ]
    .into_iter()
    .map(|text| runner.run_turn(text))
    .collect()
}

/// Playback on an overloaded host
pub fn scenario_stress() -> CaseResult<ScenarioResult> {
    ScenarioRunner::standard(ScenarioConfig::stress())
        .run_turn("Hello and welcome, it is wonderful to meet you")
}

/// A new turn cuts into a long one
pub fn scenario_interruption() -> CaseResult<ScenarioResult> {
    ScenarioRunner::standard(ScenarioConfig::standard()).run_interrupted(
        "Unfortunately this is a rather long and sad story about many things",
        "Oh wow",
        12,
    )
}

/// Speech provider returns no timing at all
pub fn scenario_silent_speech() -> CaseResult<ScenarioResult> {
    ScenarioRunner::new(
        ScenarioConfig::minimal(),
        KeywordClassifier::default(),
        ScriptedSpeech::silent(),
    )
    .run_turn("great")
}

/// Neither classifier nor speech is reachable
pub fn scenario_services_offline() -> CaseResult<ScenarioResult> {
    ScenarioRunner::new(
        ScenarioConfig::minimal(),
        ScriptedClassifier::Unavailable,
        ScriptedSpeech::offline(),
    )
    .run_turn("anything at all")
}

/// Greeting on a rig without arms
pub fn scenario_partial_rig() -> CaseResult<ScenarioResult> {
    ScenarioRunner::standard(ScenarioConfig::minimal().with_catalog(face_rig())).run_turn("hello")
}

#[cfg(test)]
mod tests {
    use super::*;
    use case_visual::PoseValue;
    use proptest::prelude::*;

    #[test]
    fn test_happy_reply() {
        let result = scenario_happy_reply().unwrap();

        assert!(result.passed(), "{result:?}");
        assert_eq!(result.expression, Expression::Smile);
        assert!(!result.is_degraded());
    }

    #[test]
    fn test_happy_reply_drives_smile_and_mouth() {
        let mut runner = ScenarioRunner::standard(ScenarioConfig::minimal());
        let result = runner.run_turn("I am so happy to see you").unwrap();
        assert!(result.completed);

        let smile = RigTargetId::new("FaceSmile");
        let mouth = RigTargetId::new("Mouth");
        assert!(runner.rig().applications_for(&smile).count() > 0);
        assert!(runner.rig().applications_for(&mouth).count() > 0);
        // Expression is held, the mouth closes
        assert!(runner
            .rig()
            .pose_of(&smile)
            .unwrap()
            .approx_eq(&PoseValue::weight(1.0)));
        assert!(runner.rig().pose_of(&mouth).unwrap().is_rest());

        assert!(runner.stop());
    }

    #[test]
    fn test_conversation_with_jitter() {
        let results = scenario_conversation_with_jitter().unwrap();
        let expressions: Vec<_> = results.iter().map(|r| r.expression).collect();
        assert_eq!(
            expressions,
            vec![
                Expression::Wave,
                Expression::Surprise,
                Expression::Frown,
                Expression::Nod,
            ]
        );
        for result in &results {
            assert!(result.passed(), "{result:?}");
        }
        assert!(results.windows(2).all(|w| w[0].plan < w[1].plan));
    }

    #[test]
    fn test_conversation_on_audio_clock() {
        let results = scenario_conversation_on_audio_clock().unwrap();
        let expressions: Vec<_> = results.iter().map(|r| r.expression).collect();
        assert_eq!(
            expressions,
            vec![
                Expression::Smile,
                Expression::Frown,
                Expression::Surprise,
                Expression::Neutral,
            ]
        );
        for result in &results {
            assert!(result.passed(), "{result:?}");
            assert!(!result.holds("Mouth"), "{result:?}");
        }

        assert!(results[0].holds("FaceSmile"));
        assert!(results[1].holds("FaceSad"));
        assert!(!results[1].holds("FaceSmile"), "{:?}", results[1]);
        assert!(results[2].holds("FaceSurprised"));
        assert!(!results[2].holds("FaceSad"));
        assert!(results[3].at_rest, "{:?}", results[3]);
    }

    #[test]
    fn test_conversation_never_stacks_expressions() {
        let results = scenario_conversation_with_jitter().unwrap();
        let faces = ["FaceSmile", "FaceSurprised", "FaceSad"];
        for result in &results {
            let held = faces.iter().filter(|face| result.holds(face)).count();
            assert!(held <= 1, "{result:?}");
        }
        // Wave and Nod end at rest
        assert!(results[0].at_rest, "{:?}", results[0]);
        assert!(results[3].at_rest, "{:?}", results[3]);
    }

    #[test]
    fn test_stress() {
        let result = scenario_stress().unwrap();
        assert!(result.passed(), "{result:?}");
    }

    #[test]
    fn test_interruption() {
        let result = scenario_interruption().unwrap();
        assert!(result.passed(), "{result:?}");
        assert_eq!(result.expression, Expression::Surprise);
    }

    #[test]
    fn test_interrupted_plan_never_resumes() {
        let mut runner = ScenarioRunner::standard(ScenarioConfig::minimal());
        let (first, ..) = runner.submit("hello hello hello hello hello").unwrap();
        for _ in 0..5 {
            runner.tick();
        }
        let (second, ..) = runner.submit("yes").unwrap();

        for _ in 0..400 {
            let report = runner.tick();
            assert_ne!(report.plan, Some(first));
        }
        assert_eq!(runner.performer().stats().plans_interrupted, 1);
        assert_eq!(runner.performer().stats().plans_completed, 1);
        assert!(second > first);
    }

    #[test]
    fn test_silent_speech_holds_rest() {
        let result = scenario_silent_speech().unwrap();
        assert!(result.completed);
        assert_eq!(result.expression, Expression::Smile);
        assert!(result
            .warnings
            .iter()
            .any(|w| matches!(w, CaseError::EmptySpeechTimeline(_))));
    }

    #[test]
    fn test_services_offline() {
        let result = scenario_services_offline().unwrap();
        assert!(result.completed);
        assert_eq!(result.expression, Expression::Neutral);
        assert_eq!(result.warnings.len(), 2);
    }

    #[test]
    fn test_partial_rig() {
        let result = scenario_partial_rig().unwrap();
        assert!(result.passed(), "{result:?}");
        assert_eq!(result.expression, Expression::Wave);
        let missing: Vec<_> = result
            .warnings
            .iter()
            .filter_map(|w| match w {
                CaseError::UnknownRigTarget(target) => Some(target.as_str().to_owned()),
                _ => None,
            })
            .collect();
        assert_eq!(missing, vec!["RightLowerArm", "RightUpperArm"]);
    }

    #[test]
    fn test_happy_reply_on_mouthless_rig() {
        let catalog: RigCatalog = ["FaceSmile"].into_iter().collect();
        let mut planner =
            TurnPlanner::new(KeywordClassifier::default(), LetterSpeech::new(), catalog);
        let turn = planner.plan_turn("I am so happy to see you").unwrap().value;

        let expression = turn.plan.track(TrackKind::Expression);
        assert_eq!(expression.len(), 1);
        assert_eq!(expression.keyframes()[0].target, RigTargetId::new("FaceSmile"));
        assert!(turn.plan.track(TrackKind::Mouth).is_empty());
    }

    #[test]
    fn test_stop_mid_turn_returns_rig_to_rest() {
        let mut runner = ScenarioRunner::standard(ScenarioConfig::standard());
        runner.submit("what a wonderful surprise").unwrap();
        for _ in 0..10 {
            runner.tick();
        }
        assert!(!runner.rig().is_at_rest());
        assert!(runner.stop());
        assert_eq!(runner.performer().state(), PlaybackState::Idle);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_any_reply_plays_through(
            words in prop::collection::vec("[a-z]{1,8}", 1..12),
            seed in any::<u64>(),
        ) {
            let config = ScenarioConfig {
                seed,
                ..ScenarioConfig::stress()
            };
            let mut runner = ScenarioRunner::standard(config);
            let result = runner.run_turn(&words.join(" ")).unwrap();
            prop_assert!(result.passed(), "{:?}", result);
        }
    }
}
