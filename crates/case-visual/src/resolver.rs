//! Animation Track Resolver - intent + visemes + rig catalog to a plan
//!
//! Mappings name rig targets. A target the loaded rig does not define is
//! skipped for that keyframe and reported, so a partial rig still gets a
//! valid, if reduced, performance.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use case_core::{CaseError, CaseResult, Outcome, PlanStamp, RigTargetId};
use case_voice::{PhonemeClass, Viseme};
use tracing::debug;

use crate::{
    AnimationTrack, Expression, ExpressiveIntent, Keyframe, PerformancePlan, PoseValue,
    RigCatalog, Rotation3D, TrackKind,
};

/// Default blendshape driven by visemes
pub const DEFAULT_MOUTH_TARGET: &str = "Mouth";

/// Resolver configuration
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Longest blend into a viseme shape (shortened for short visemes)
    pub viseme_blend_in_ms: u32,

    /// Blend used to close the mouth after the last viseme
    pub mouth_close_blend_ms: u32,

    /// Shortest performance, so silent turns still show the expression
    pub min_duration_ms: u32,

    /// Keep the expression after the performance ends
    pub hold_expression: bool,

    /// Blend used to release a non-held expression
    pub expression_release_ms: u32,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            viseme_blend_in_ms: 60,
            mouth_close_blend_ms: 80,
            min_duration_ms: 1000,
            hold_expression: true,
            expression_release_ms: 250,
        }
    }
}

/// Viseme class to rig targets
#[derive(Debug, Clone)]
pub struct VisemeMap {
    entries: HashMap<PhonemeClass, Vec<(RigTargetId, PoseValue)>>,
}

impl Default for VisemeMap {
    /// Every class drives the `Mouth` blendshape by its openness
    fn default() -> Self {
        let mouth = RigTargetId::new(DEFAULT_MOUTH_TARGET);
        let entries = PhonemeClass::ALL
            .iter()
            .map(|&class| (class, vec![(mouth.clone(), PoseValue::weight(class.openness()))]))
            .collect();
        Self { entries }
    }
}

impl VisemeMap {
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Replace the mapping for one class
    pub fn set(&mut self, class: PhonemeClass, targets: Vec<(RigTargetId, PoseValue)>) {
        self.entries.insert(class, targets);
    }

    pub fn get(&self, class: PhonemeClass) -> &[(RigTargetId, PoseValue)] {
        self.entries.get(&class).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// When an expression phase starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseAnchor {
    /// Offset from performance start (clamped to the end)
    Start(u32),
    /// Performance end
    End,
}

/// One keyframe template of an expression
#[derive(Debug, Clone)]
pub struct ExpressionPhase {
    pub anchor: PhaseAnchor,
    pub target: RigTargetId,
    pub pose: PoseValue,
    pub blend_in_ms: u32,
}

impl ExpressionPhase {
    pub fn new(anchor: PhaseAnchor, target: &str, pose: PoseValue, blend_in_ms: u32) -> Self {
        Self {
            anchor,
            target: RigTargetId::new(target),
            pose,
            blend_in_ms,
        }
    }
}

/// Expression to keyframe templates (enter, hold, exit)
#[derive(Debug, Clone)]
pub struct ExpressionMap {
    profiles: HashMap<Expression, Vec<ExpressionPhase>>,
}

impl Default for ExpressionMap {
    fn default() -> Self {
        use PhaseAnchor::{End, Start};

        let rotation = |yaw, pitch, roll| PoseValue::Rotation(Rotation3D::from_euler(yaw, pitch, roll));
        let rest = PoseValue::Rotation(Rotation3D::identity());

        let mut map = Self::empty();
        map.set(
            Expression::Smile,
            vec![ExpressionPhase::new(Start(0), "FaceSmile", PoseValue::weight(1.0), 250)],
        );
        map.set(
            Expression::Surprise,
            vec![ExpressionPhase::new(Start(0), "FaceSurprised", PoseValue::weight(1.0), 150)],
        );
        map.set(
            Expression::Frown,
            vec![ExpressionPhase::new(Start(0), "FaceSad", PoseValue::weight(0.8), 300)],
        );
        map.set(
            Expression::Nod,
            vec![
                ExpressionPhase::new(Start(0), "Head", rotation(0.0, 0.25, 0.0), 200),
                ExpressionPhase::new(Start(350), "Head", rest, 250),
            ],
        );
        map.set(
            Expression::Wave,
            vec![
                ExpressionPhase::new(Start(0), "RightUpperArm", rotation(0.0, 0.0, -1.2), 300),
                ExpressionPhase::new(Start(400), "RightLowerArm", rotation(0.6, 0.0, 0.0), 200),
                ExpressionPhase::new(End, "RightLowerArm", rest, 250),
                ExpressionPhase::new(End, "RightUpperArm", rest, 300),
            ],
        );
        map
    }
}

impl ExpressionMap {
    pub fn empty() -> Self {
        Self {
            profiles: HashMap::new(),
        }
    }

    pub fn set(&mut self, expression: Expression, phases: Vec<ExpressionPhase>) {
        self.profiles.insert(expression, phases);
    }

    pub fn get(&self, expression: Expression) -> &[ExpressionPhase] {
        self.profiles
            .get(&expression)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Animation Track Resolver
#[derive(Debug, Clone, Default)]
pub struct TrackResolver {
    config: ResolverConfig,
    visemes: VisemeMap,
    expressions: ExpressionMap,
}

impl TrackResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn with_maps(config: ResolverConfig, visemes: VisemeMap, expressions: ExpressionMap) -> Self {
        Self {
            config,
            visemes,
            expressions,
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Build the plan for one turn.
    ///
    /// Missing rig targets are reported as `UnknownRigTarget` warnings. The
    /// only error is `InvalidPlan`, raised when `visemes` is not ordered.
    pub fn resolve(
        &self,
        stamp: PlanStamp,
        intent: &ExpressiveIntent,
        visemes: &[Viseme],
        catalog: &RigCatalog,
    ) -> CaseResult<Outcome<PerformancePlan>> {
        let mut missing = BTreeSet::new();

        let speech_end = visemes.last().map(|v| v.end_ms).unwrap_or(0);
        let end_ms = speech_end.max(self.config.min_duration_ms);

        let mouth = self.mouth_track(visemes, catalog, &mut missing);
        let expression = self.expression_track(intent, end_ms, catalog, &mut missing);

        let plan = PerformancePlan::new(stamp, *intent, expression, mouth, end_ms)?;

        let warnings = missing
            .into_iter()
            .map(|target| {
                debug!(plan = %stamp.id, %target, "rig lacks target, keyframes skipped");
                CaseError::UnknownRigTarget(target)
            })
            .collect();

        Ok(Outcome::with_warnings(plan, warnings))
    }

    fn mouth_track(
        &self,
        visemes: &[Viseme],
        catalog: &RigCatalog,
        missing: &mut BTreeSet<RigTargetId>,
    ) -> AnimationTrack {
        let mut track = AnimationTrack::new(TrackKind::Mouth);
        let mut last_pose: BTreeMap<RigTargetId, PoseValue> = BTreeMap::new();

        for viseme in visemes {
            let blend_in_ms = self.config.viseme_blend_in_ms.min(viseme.duration_ms());
            for (target, pose) in self.visemes.get(viseme.class) {
                if !catalog.contains(target) {
                    missing.insert(target.clone());
                    continue;
                }
                track.push(Keyframe::new(viseme.start_ms, target.clone(), *pose, blend_in_ms));
                last_pose.insert(target.clone(), *pose);
            }
        }

        // Close the mouth once speech ends unless it already rests
        if let Some(last) = visemes.last() {
            if !last.class.is_rest() {
                for (target, pose) in last_pose {
                    if !pose.is_rest() {
                        track.push(Keyframe::new(
                            last.end_ms,
                            target,
                            pose.rest(),
                            self.config.mouth_close_blend_ms,
                        ));
                    }
                }
            }
        }

        track
    }

    fn expression_track(
        &self,
        intent: &ExpressiveIntent,
        end_ms: u32,
        catalog: &RigCatalog,
        missing: &mut BTreeSet<RigTargetId>,
    ) -> AnimationTrack {
        let strength = intent.strength();
        let mut keyframes: Vec<Keyframe> = Vec::new();

        for phase in self.expressions.get(intent.expression) {
            if !catalog.contains(&phase.target) {
                missing.insert(phase.target.clone());
                continue;
            }
            let time_ms = match phase.anchor {
                PhaseAnchor::Start(offset) => offset.min(end_ms),
                PhaseAnchor::End => end_ms,
            };
            keyframes.push(Keyframe::new(
                time_ms,
                phase.target.clone(),
                phase.pose.at_intensity(strength),
                phase.blend_in_ms,
            ));
        }

        // Stable: phases at the same time keep their declared order
        keyframes.sort_by_key(|k| k.time_ms);

        if !self.config.hold_expression {
            let mut last_pose: BTreeMap<RigTargetId, PoseValue> = BTreeMap::new();
            for keyframe in &keyframes {
                last_pose.insert(keyframe.target.clone(), keyframe.pose);
            }
            for (target, pose) in last_pose {
                if !pose.is_rest() {
                    keyframes.push(Keyframe::new(
                        end_ms,
                        target,
                        pose.rest(),
                        self.config.expression_release_ms,
                    ));
                }
            }
        }

        AnimationTrack::from_keyframes(TrackKind::Expression, keyframes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use case_core::PlanSequence;
    use case_voice::{PhonemeEvent, TimelineBuilder, VisemeTimeline};

    fn catalog(targets: &[&str]) -> RigCatalog {
        targets.iter().copied().collect()
    }

    fn speech() -> VisemeTimeline {
        let raw = vec![
            PhonemeEvent::new("h", 0, 60),
            PhonemeEvent::new("a", 60, 180),
            PhonemeEvent::new("p", 180, 240),
            PhonemeEvent::new("iy", 240, 400),
        ];
        TimelineBuilder::default().build(&raw).unwrap()
    }

    #[test]
    fn test_missing_mouth_degrades_gracefully() {
        let resolver = TrackResolver::default();
        let mut seq = PlanSequence::new();
        let intent = ExpressiveIntent::new(Expression::Smile);

        let outcome = resolver
            .resolve(seq.next_stamp(), &intent, speech().visemes(), &catalog(&["FaceSmile"]))
            .unwrap();
        let plan = &outcome.value;

        assert_eq!(plan.mouth().len(), 0);
        assert_eq!(plan.expression().len(), 1);
        assert_eq!(plan.expression().keyframes()[0].target.as_str(), "FaceSmile");
        assert_eq!(
            outcome.warnings,
            vec![CaseError::UnknownRigTarget("Mouth".into())]
        );
    }

    #[test]
    fn test_full_rig_plan() {
        let resolver = TrackResolver::default();
        let mut seq = PlanSequence::new();
        let intent = ExpressiveIntent::new(Expression::Smile);
        let timeline = speech();

        let outcome = resolver
            .resolve(seq.next_stamp(), &intent, timeline.visemes(), &catalog(&["Mouth", "FaceSmile"]))
            .unwrap();
        let plan = outcome.value;

        assert!(outcome.warnings.is_empty());
        // one keyframe per viseme plus the closing rest
        assert_eq!(plan.mouth().len(), timeline.len() + 1);
        let close = plan.mouth().keyframes().last().unwrap();
        assert_eq!(close.time_ms, 400);
        assert!(close.pose.is_rest());
        assert_eq!(plan.duration_ms(), 1000);
    }

    #[test]
    fn test_viseme_blend_shortened_for_short_visemes() {
        let resolver = TrackResolver::default();
        let mut seq = PlanSequence::new();
        let visemes = [
            Viseme::new(PhonemeClass::PP, 0, 30),
            Viseme::new(PhonemeClass::AA, 30, 200),
        ];

        let plan = resolver
            .resolve(seq.next_stamp(), &ExpressiveIntent::neutral(), &visemes, &catalog(&["Mouth"]))
            .unwrap()
            .value;

        assert_eq!(plan.mouth().keyframes()[0].blend_in_ms, 30);
        assert_eq!(plan.mouth().keyframes()[1].blend_in_ms, 60);
    }

    #[test]
    fn test_rest_hold_yields_single_keyframe() {
        let resolver = TrackResolver::default();
        let mut seq = PlanSequence::new();
        let fallback = VisemeTimeline::rest_hold(500);

        let plan = resolver
            .resolve(seq.next_stamp(), &ExpressiveIntent::neutral(), fallback.visemes(), &catalog(&["Mouth"]))
            .unwrap()
            .value;

        assert_eq!(plan.mouth().len(), 1);
        assert!(plan.mouth().keyframes()[0].pose.is_rest());
        assert!(plan.expression().is_empty());
    }

    #[test]
    fn test_unordered_visemes_rejected() {
        let resolver = TrackResolver::default();
        let mut seq = PlanSequence::new();
        let visemes = [
            Viseme::new(PhonemeClass::AA, 200, 300),
            Viseme::new(PhonemeClass::EH, 0, 100),
        ];

        let result = resolver.resolve(
            seq.next_stamp(),
            &ExpressiveIntent::neutral(),
            &visemes,
            &catalog(&["Mouth"]),
        );

        assert!(matches!(result, Err(CaseError::InvalidPlan { .. })));
    }

    #[test]
    fn test_wave_enter_hold_exit() {
        let resolver = TrackResolver::default();
        let mut seq = PlanSequence::new();
        let rig = catalog(&["RightUpperArm", "RightLowerArm"]);

        let plan = resolver
            .resolve(seq.next_stamp(), &ExpressiveIntent::new(Expression::Wave), &[], &rig)
            .unwrap()
            .value;
        let times: Vec<u32> = plan.expression().keyframes().iter().map(|k| k.time_ms).collect();

        assert_eq!(times, vec![0, 400, 1000, 1000]);
        assert!(plan.expression().keyframes()[3].pose.is_rest());
    }

    #[test]
    fn test_intensity_scales_expression() {
        let resolver = TrackResolver::default();
        let mut seq = PlanSequence::new();
        let intent = ExpressiveIntent::new(Expression::Smile).with_intensity(0.5);

        let plan = resolver
            .resolve(seq.next_stamp(), &intent, &[], &catalog(&["FaceSmile"]))
            .unwrap()
            .value;

        assert!(plan.expression().keyframes()[0]
            .pose
            .approx_eq(&PoseValue::BlendWeight(0.5)));
    }

    #[test]
    fn test_release_when_not_holding() {
        let resolver = TrackResolver::new(ResolverConfig {
            hold_expression: false,
            ..Default::default()
        });
        let mut seq = PlanSequence::new();

        let plan = resolver
            .resolve(
                seq.next_stamp(),
                &ExpressiveIntent::new(Expression::Smile),
                &[],
                &catalog(&["FaceSmile"]),
            )
            .unwrap()
            .value;

        assert_eq!(plan.expression().len(), 2);
        let release = &plan.expression().keyframes()[1];
        assert_eq!(release.time_ms, 1000);
        assert!(release.pose.is_rest());
    }

    #[test]
    fn test_custom_viseme_map() {
        let mut visemes = VisemeMap::empty();
        visemes.set(
            PhonemeClass::AA,
            vec![
                ("jawOpen".into(), PoseValue::weight(0.9)),
                ("mouthFunnel".into(), PoseValue::weight(0.1)),
            ],
        );
        let resolver = TrackResolver::with_maps(ResolverConfig::default(), visemes, ExpressionMap::default());
        let mut seq = PlanSequence::new();

        let plan = resolver
            .resolve(
                seq.next_stamp(),
                &ExpressiveIntent::neutral(),
                &[Viseme::new(PhonemeClass::AA, 0, 100)],
                &catalog(&["jawOpen", "mouthFunnel"]),
            )
            .unwrap()
            .value;

        // two shapes at 0, two closing rests at 100
        assert_eq!(plan.mouth().len(), 4);
        assert_eq!(plan.mouth().targets().len(), 2);
    }

    proptest! {
        #[test]
        fn prop_resolved_tracks_are_ordered(
            spans in prop::collection::vec(("[a-z]{1,2}", 1u32..200, 0u32..120), 1..30),
            expression in prop::sample::select(Expression::PRIORITY.to_vec()),
            hold in any::<bool>(),
        ) {
            let mut at = 0;
            let raw: Vec<PhonemeEvent> = spans
                .into_iter()
                .map(|(phoneme, len, gap)| {
                    let event = PhonemeEvent::new(phoneme, at + gap, at + gap + len);
                    at += gap + len;
                    event
                })
                .collect();
            let timeline = TimelineBuilder::default().build(&raw).unwrap();
            let config = ResolverConfig {
                hold_expression: hold,
                ..Default::default()
            };
            let catalog = catalog(&[
                "Mouth", "FaceSmile", "FaceSurprised", "FaceSad", "Head", "RightUpperArm",
                "RightLowerArm",
            ]);

            let outcome = TrackResolver::new(config)
                .resolve(
                    PlanSequence::new().next_stamp(),
                    &ExpressiveIntent::new(expression),
                    timeline.visemes(),
                    &catalog,
                )
                .unwrap();
            prop_assert!(!outcome.is_degraded());
            for track in outcome.value.tracks() {
                prop_assert!(track.validate().is_ok());
            }
        }
    }
}
