//! Rig Binding - the only way CASE touches a model
//!
//! The render/animation host owns the rig. CASE sees two things:
//! - a catalog of the targets the loaded asset defines
//! - a binding it calls to set a target's pose each tick

use std::collections::{BTreeMap, BTreeSet};

use case_core::RigTargetId;

use crate::PoseValue;

/// Sink for resolved poses, implemented by the host
pub trait RigBinding {
    /// Set `target` to `pose`.
    ///
    /// `pose` is already interpolated by the scheduler; `blend_factor` in
    /// [0, 1] reports how far through its blend-in the keyframe is (1.0 once
    /// the keyframe pose is reached).
    fn apply(&mut self, target: &RigTargetId, pose: &PoseValue, blend_factor: f32);
}

impl<R: RigBinding + ?Sized> RigBinding for &mut R {
    fn apply(&mut self, target: &RigTargetId, pose: &PoseValue, blend_factor: f32) {
        (**self).apply(target, pose, blend_factor)
    }
}

impl<R: RigBinding + ?Sized> RigBinding for Box<R> {
    fn apply(&mut self, target: &RigTargetId, pose: &PoseValue, blend_factor: f32) {
        (**self).apply(target, pose, blend_factor)
    }
}

/// Set of targets the loaded asset defines
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RigCatalog {
    targets: BTreeSet<RigTargetId>,
}

impl RigCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, target: impl Into<RigTargetId>) -> bool {
        self.targets.insert(target.into())
    }

    pub fn contains(&self, target: &RigTargetId) -> bool {
        self.targets.contains(target)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RigTargetId> {
        self.targets.iter()
    }
}

impl<T: Into<RigTargetId>> FromIterator<T> for RigCatalog {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        RigCatalog {
            targets: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Host-side source of the rig catalog, queried once per plan build
pub trait RigCatalogProvider {
    fn catalog(&self) -> RigCatalog;
}

impl RigCatalogProvider for RigCatalog {
    fn catalog(&self) -> RigCatalog {
        self.clone()
    }
}

impl<P: RigCatalogProvider + ?Sized> RigCatalogProvider for Box<P> {
    fn catalog(&self) -> RigCatalog {
        (**self).catalog()
    }
}

/// One recorded `apply` call
#[derive(Debug, Clone, PartialEq)]
pub struct RigApplication {
    pub target: RigTargetId,
    pub pose: PoseValue,
    pub blend_factor: f32,
}

/// Rig binding that records every call, for tests and debugging hosts
#[derive(Debug, Default)]
pub struct RecordingRig {
    applications: Vec<RigApplication>,
    current: BTreeMap<RigTargetId, PoseValue>,
}

impl RecordingRig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call, in order
    pub fn applications(&self) -> &[RigApplication] {
        &self.applications
    }

    /// Calls for one target, in order
    pub fn applications_for<'a>(
        &'a self,
        target: &'a RigTargetId,
    ) -> impl Iterator<Item = &'a RigApplication> + 'a {
        self.applications.iter().filter(move |a| &a.target == target)
    }

    /// Latest pose applied to `target`
    pub fn pose_of(&self, target: &RigTargetId) -> Option<&PoseValue> {
        self.current.get(target)
    }

    /// Is every target the rig has seen back at rest?
    pub fn is_at_rest(&self) -> bool {
        self.current.values().all(PoseValue::is_rest)
    }

    /// Targets whose latest pose is away from rest
    pub fn posed_targets(&self) -> impl Iterator<Item = &RigTargetId> + '_ {
        self.current
            .iter()
            .filter(|(_, pose)| !pose.is_rest())
            .map(|(target, _)| target)
    }

    pub fn len(&self) -> usize {
        self.applications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.applications.is_empty()
    }

    /// Forget recorded calls but keep the current pose
    pub fn clear_log(&mut self) {
        self.applications.clear();
    }
}

impl RigBinding for RecordingRig {
    fn apply(&mut self, target: &RigTargetId, pose: &PoseValue, blend_factor: f32) {
        self.current.insert(target.clone(), *pose);
        self.applications.push(RigApplication {
            target: target.clone(),
            pose: *pose,
            blend_factor,
        });
    }
}
