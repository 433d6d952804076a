//! Keyframes and animation tracks
//!
//! A keyframe says: at `time_ms`, start blending `target` towards `pose`,
//! reaching it `blend_in_ms` later. A track is an ordered list of keyframes.

use std::collections::BTreeSet;

use case_core::{CaseError, CaseResult, RigTargetId};

use crate::PoseValue;

/// Which track a keyframe belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TrackKind {
    /// Facial expression and gesture
    Expression,
    /// Viseme-driven mouth shapes
    Mouth,
}

impl TrackKind {
    pub const ALL: [TrackKind; 2] = [TrackKind::Expression, TrackKind::Mouth];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            TrackKind::Expression => 0,
            TrackKind::Mouth => 1,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TrackKind::Expression => "expression",
            TrackKind::Mouth => "mouth",
        }
    }
}

/// Keyframe - timed pose for one rig target
#[derive(Debug, Clone, PartialEq)]
pub struct Keyframe {
    /// Offset from plan start
    pub time_ms: u32,

    /// Joint or blendshape to drive
    pub target: RigTargetId,

    /// Pose to reach
    pub pose: PoseValue,

    /// Interpolation window from the previously applied pose
    pub blend_in_ms: u32,
}

impl Keyframe {
    pub fn new(time_ms: u32, target: RigTargetId, pose: PoseValue, blend_in_ms: u32) -> Self {
        Self {
            time_ms,
            target,
            pose,
            blend_in_ms,
        }
    }

    /// Time at which the keyframe pose is fully reached
    pub fn settled_at_ms(&self) -> u32 {
        self.time_ms.saturating_add(self.blend_in_ms)
    }
}

/// Ordered keyframes for one track
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationTrack {
    kind: TrackKind,
    keyframes: Vec<Keyframe>,
}

impl AnimationTrack {
    pub fn new(kind: TrackKind) -> Self {
        Self {
            kind,
            keyframes: Vec::new(),
        }
    }

    pub fn from_keyframes(kind: TrackKind, keyframes: Vec<Keyframe>) -> Self {
        Self { kind, keyframes }
    }

    pub fn push(&mut self, keyframe: Keyframe) {
        self.keyframes.push(keyframe);
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    pub fn into_keyframes(self) -> Vec<Keyframe> {
        self.keyframes
    }

    pub fn get(&self, index: usize) -> Option<&Keyframe> {
        self.keyframes.get(index)
    }

    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    pub fn last_time_ms(&self) -> Option<u32> {
        self.keyframes.last().map(|k| k.time_ms)
    }

    /// Latest time at which any keyframe in the track settles
    pub fn settled_at_ms(&self) -> u32 {
        self.keyframes
            .iter()
            .map(Keyframe::settled_at_ms)
            .max()
            .unwrap_or(0)
    }

    /// Distinct targets driven by this track
    pub fn targets(&self) -> BTreeSet<RigTargetId> {
        self.keyframes.iter().map(|k| k.target.clone()).collect()
    }

    /// Check the ordering invariant: non-decreasing `time_ms`
    pub fn validate(&self) -> CaseResult<()> {
        for (index, pair) in self.keyframes.windows(2).enumerate() {
            if pair[1].time_ms < pair[0].time_ms {
                return Err(CaseError::InvalidPlan {
                    track: self.kind.name(),
                    index: index + 1,
                    time_ms: pair[1].time_ms,
                    previous_ms: pair[0].time_ms,
                });
            }
        }
        Ok(())
    }
}
