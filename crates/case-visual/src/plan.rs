//! Performance Plan - the immutable animation for one conversational turn
//!
//! A plan is validated once when built and never edited afterwards.
//! Cancelling a performance discards the whole plan by id.

use std::collections::BTreeSet;

use case_core::{CaseResult, LogicalTime, PlanId, PlanStamp, RigTargetId};

use crate::{AnimationTrack, ExpressiveIntent, TrackKind};

/// Performance Plan
#[derive(Debug, Clone)]
pub struct PerformancePlan {
    stamp: PlanStamp,
    intent: ExpressiveIntent,
    tracks: [AnimationTrack; 2],
    duration_ms: u32,
}

impl PerformancePlan {
    /// Assemble a plan, rejecting tracks whose keyframe times decrease
    pub fn new(
        stamp: PlanStamp,
        intent: ExpressiveIntent,
        expression: AnimationTrack,
        mouth: AnimationTrack,
        duration_ms: u32,
    ) -> CaseResult<Self> {
        expression.validate()?;
        mouth.validate()?;

        let last_keyframe = expression
            .last_time_ms()
            .into_iter()
            .chain(mouth.last_time_ms())
            .max()
            .unwrap_or(0);

        // Tracks are stored by kind regardless of what the caller labelled them
        let expression =
            AnimationTrack::from_keyframes(TrackKind::Expression, expression.into_keyframes());
        let mouth = AnimationTrack::from_keyframes(TrackKind::Mouth, mouth.into_keyframes());

        Ok(Self {
            stamp,
            intent,
            tracks: [expression, mouth],
            duration_ms: duration_ms.max(last_keyframe),
        })
    }

    /// Plan with no keyframes, e.g. for a silent neutral turn
    pub fn empty(stamp: PlanStamp) -> Self {
        Self {
            stamp,
            intent: ExpressiveIntent::neutral(),
            tracks: [
                AnimationTrack::new(TrackKind::Expression),
                AnimationTrack::new(TrackKind::Mouth),
            ],
            duration_ms: 0,
        }
    }

    pub fn id(&self) -> PlanId {
        self.stamp.id
    }

    pub fn created_at(&self) -> LogicalTime {
        self.stamp.created_at
    }

    pub fn stamp(&self) -> PlanStamp {
        self.stamp
    }

    pub fn intent(&self) -> &ExpressiveIntent {
        &self.intent
    }

    pub fn track(&self, kind: TrackKind) -> &AnimationTrack {
        &self.tracks[kind.index()]
    }

    pub fn tracks(&self) -> &[AnimationTrack; 2] {
        &self.tracks
    }

    pub fn expression(&self) -> &AnimationTrack {
        self.track(TrackKind::Expression)
    }

    pub fn mouth(&self) -> &AnimationTrack {
        self.track(TrackKind::Mouth)
    }

    /// Nominal length of the performance (at least the last keyframe time)
    pub fn duration_ms(&self) -> u32 {
        self.duration_ms
    }

    /// Time at which the last blend of any track is fully reached
    pub fn settled_at_ms(&self) -> u32 {
        self.tracks
            .iter()
            .map(AnimationTrack::settled_at_ms)
            .max()
            .unwrap_or(0)
    }

    pub fn keyframe_count(&self) -> usize {
        self.tracks.iter().map(AnimationTrack::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.keyframe_count() == 0
    }

    /// Every target any track drives
    pub fn targets(&self) -> BTreeSet<RigTargetId> {
        self.tracks.iter().flat_map(|t| t.targets()).collect()
    }
}
