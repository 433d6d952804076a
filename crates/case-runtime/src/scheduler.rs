//! Performance Scheduler - plays one plan at a time against a rig
//!
//! The scheduler owns the playback cursor. Every tick advances the shared
//! elapsed time, enters the keyframes that became due on each track, and
//! drives the active per-target blends into the rig. Starting a plan while
//! another is playing interrupts the old one; nothing of the old plan is
//! applied after that point. Targets the previous plan left away from rest
//! that the new plan never drives are released to rest, so a held
//! expression does not outlive its turn.

use std::collections::BTreeMap;
use std::time::Duration;

use case_core::{duration_to_ms, progress, PlanId, RigTargetId};
use case_visual::{PerformancePlan, PoseValue, RigBinding, TrackKind};
use tracing::{debug, info, trace, warn};

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaybackState {
    /// Nothing loaded
    Idle,
    /// A plan is advancing
    Playing,
    /// The plan ran to its end; next tick returns to Idle
    Completed,
    /// The plan was superseded or stopped; next tick returns to Idle
    Interrupted,
}

impl PlaybackState {
    pub fn name(self) -> &'static str {
        match self {
            PlaybackState::Idle => "idle",
            PlaybackState::Playing => "playing",
            PlaybackState::Completed => "completed",
            PlaybackState::Interrupted => "interrupted",
        }
    }
}

/// One state change, tagged with the plan it concerns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: PlaybackState,
    pub to: PlaybackState,
    pub plan: Option<PlanId>,
}

/// Playback cursor over the active plan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackCursor {
    active_plan: Option<PlanId>,
    elapsed: Duration,
    /// Next keyframe index per track
    next: [usize; 2],
}

impl PlaybackCursor {
    fn reset(&mut self, plan: Option<PlanId>) {
        self.active_plan = plan;
        self.elapsed = Duration::ZERO;
        self.next = [0; 2];
    }

    pub fn active_plan(&self) -> Option<PlanId> {
        self.active_plan
    }

    /// Time since the active plan started
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn elapsed_ms(&self) -> u32 {
        duration_to_ms(self.elapsed)
    }

    /// Index of the last keyframe entered on `kind`, if any
    pub fn last_applied(&self, kind: TrackKind) -> Option<usize> {
        self.next[kind.index()].checked_sub(1)
    }

    /// Index of the next keyframe due on `kind`
    pub fn next_index(&self, kind: TrackKind) -> usize {
        self.next[kind.index()]
    }
}

/// Blend in progress for one target
#[derive(Debug, Clone, Copy, PartialEq)]
struct ActiveBlend {
    from: PoseValue,
    to: PoseValue,
    start_ms: u32,
    blend_in_ms: u32,
}

impl ActiveBlend {
    fn factor(&self, now_ms: u32) -> f32 {
        progress(now_ms.saturating_sub(self.start_ms), self.blend_in_ms)
    }
}

/// What one tick did
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    /// Plan the tick ran against
    pub plan: Option<PlanId>,
    /// Cursor position after the tick
    pub elapsed_ms: u32,
    /// Keyframes entered this tick, as (track, index)
    pub entered: Vec<(TrackKind, usize)>,
    /// Number of rig `apply` calls made
    pub applications: usize,
    pub transitions: Vec<Transition>,
}

impl TickReport {
    /// Plan that completed during this tick
    pub fn completed(&self) -> Option<PlanId> {
        self.transitions
            .iter()
            .find(|t| t.to == PlaybackState::Completed)
            .and_then(|t| t.plan)
    }
}

/// What a start did
#[derive(Debug, Clone)]
pub struct StartReport {
    pub plan: PlanId,
    /// Plan interrupted by this start
    pub superseded: Option<PlanId>,
    pub transitions: Vec<Transition>,
}

/// What a stop did
#[derive(Debug, Clone, Default)]
pub struct StopReport {
    pub interrupted: Option<PlanId>,
    /// Targets returned to rest
    pub rest_applications: usize,
    pub transitions: Vec<Transition>,
}

/// Blend used to release targets a new plan leaves undriven
pub const DEFAULT_RELEASE_MS: u32 = 200;

/// Performance Scheduler
#[derive(Debug)]
pub struct PerformanceScheduler {
    state: PlaybackState,
    release_ms: u32,
    plan: Option<PerformancePlan>,
    cursor: PlaybackCursor,
    blends: BTreeMap<RigTargetId, ActiveBlend>,
    /// Last pose emitted per target, across plans
    emitted: BTreeMap<RigTargetId, PoseValue>,
}

impl Default for PerformanceScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl PerformanceScheduler {
    pub fn new() -> Self {
        PerformanceScheduler {
            state: PlaybackState::Idle,
            release_ms: DEFAULT_RELEASE_MS,
            plan: None,
            cursor: PlaybackCursor::default(),
            blends: BTreeMap::new(),
            emitted: BTreeMap::new(),
        }
    }

    pub fn with_release_ms(mut self, release_ms: u32) -> Self {
        self.release_ms = release_ms;
        self
    }

    pub fn release_ms(&self) -> u32 {
        self.release_ms
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn cursor(&self) -> &PlaybackCursor {
        &self.cursor
    }

    /// Plan currently loaded (playing, or just finished)
    pub fn plan(&self) -> Option<&PerformancePlan> {
        self.plan.as_ref()
    }

    /// Last pose the scheduler emitted for `target`
    pub fn emitted_pose(&self, target: &RigTargetId) -> Option<&PoseValue> {
        self.emitted.get(target)
    }

    /// Number of blends still converging
    pub fn active_blends(&self) -> usize {
        self.blends.len()
    }

    fn set_state(
        &mut self,
        to: PlaybackState,
        plan: Option<PlanId>,
        transitions: &mut Vec<Transition>,
    ) {
        let from = self.state;
        if from == to {
            return;
        }
        trace!(from = from.name(), to = to.name(), ?plan, "playback transition");
        self.state = to;
        transitions.push(Transition { from, to, plan });
    }

    /// Load `plan` and start playing it from zero.
    ///
    /// A plan already playing is interrupted first; its pending keyframes and
    /// unfinished blends are discarded. Targets left off rest that `plan`
    /// never drives blend back to rest over `release_ms`.
    pub fn start(&mut self, plan: PerformancePlan) -> StartReport {
        let mut transitions = Vec::new();
        let previous = self.cursor.active_plan;

        let superseded = match self.state {
            PlaybackState::Playing => {
                warn!(
                    superseded = ?previous,
                    by = %plan.id(),
                    at_ms = self.cursor.elapsed_ms(),
                    "performance interrupted by new plan"
                );
                self.set_state(PlaybackState::Interrupted, previous, &mut transitions);
                previous
            }
            PlaybackState::Completed | PlaybackState::Interrupted => {
                self.set_state(PlaybackState::Idle, previous, &mut transitions);
                None
            }
            PlaybackState::Idle => None,
        };

        let id = plan.id();
        info!(
            plan = %id,
            expression = plan.intent().expression.name(),
            keyframes = plan.keyframe_count(),
            duration_ms = plan.duration_ms(),
            settles_ms = plan.settled_at_ms(),
            "performance started"
        );

        self.blends.clear();
        self.release_undriven(&plan);
        self.cursor.reset(Some(id));
        self.plan = Some(plan);
        self.set_state(PlaybackState::Playing, Some(id), &mut transitions);

        StartReport {
            plan: id,
            superseded,
            transitions,
        }
    }

    fn release_undriven(&mut self, plan: &PerformancePlan) {
        let driven = plan.targets();

        for (target, pose) in &self.emitted {
            if pose.is_rest() || driven.contains(target) {
                continue;
            }
            debug!(plan = %plan.id(), target = %target, "releasing target left by previous plan");
            self.blends.insert(
                target.clone(),
                ActiveBlend {
                    from: *pose,
                    to: pose.rest(),
                    start_ms: 0,
                    blend_in_ms: self.release_ms,
                },
            );
        }
    }

    /// Advance playback by `delta` and drive the rig
    pub fn tick<R: RigBinding + ?Sized>(&mut self, delta: Duration, rig: &mut R) -> TickReport {
        let mut report = TickReport {
            plan: self.cursor.active_plan,
            elapsed_ms: self.cursor.elapsed_ms(),
            ..Default::default()
        };

        match self.state {
            PlaybackState::Idle => return report,
            PlaybackState::Completed | PlaybackState::Interrupted => {
                let finished = self.cursor.active_plan;
                self.plan = None;
                self.blends.clear();
                self.cursor.reset(None);
                self.set_state(PlaybackState::Idle, finished, &mut report.transitions);
                return report;
            }
            PlaybackState::Playing => {}
        }

        let Some(plan) = self.plan.as_ref() else {
            // Playing without a plan cannot be reached through the public API
            self.set_state(PlaybackState::Idle, None, &mut report.transitions);
            return report;
        };
        let plan_id = plan.id();

        self.cursor.elapsed = self.cursor.elapsed.saturating_add(delta);
        let now = self.cursor.elapsed_ms();
        report.elapsed_ms = now;

        for kind in TrackKind::ALL {
            let track = plan.track(kind);
            let slot = kind.index();
            while let Some(keyframe) = track.get(self.cursor.next[slot]) {
                if keyframe.time_ms > now {
                    break;
                }
                let index = self.cursor.next[slot];
                self.cursor.next[slot] += 1;

                let from = self
                    .emitted
                    .get(&keyframe.target)
                    .filter(|pose| pose.same_kind(&keyframe.pose))
                    .copied()
                    .unwrap_or_else(|| keyframe.pose.rest());
                self.blends.insert(
                    keyframe.target.clone(),
                    ActiveBlend {
                        from,
                        to: keyframe.pose,
                        start_ms: keyframe.time_ms,
                        blend_in_ms: keyframe.blend_in_ms,
                    },
                );
                debug!(
                    plan = %plan_id,
                    track = kind.name(),
                    index,
                    target = %keyframe.target,
                    at_ms = keyframe.time_ms,
                    "keyframe entered"
                );
                report.entered.push((kind, index));
            }
        }

        let exhausted = TrackKind::ALL
            .iter()
            .all(|kind| self.cursor.next[kind.index()] >= plan.track(*kind).len());

        for (target, blend) in &self.blends {
            let factor = blend.factor(now);
            let pose = blend.from.lerp(&blend.to, factor);
            rig.apply(target, &pose, factor);
            self.emitted.insert(target.clone(), pose);
            report.applications += 1;
        }
        self.blends.retain(|_, blend| blend.factor(now) < 1.0);

        if exhausted && self.blends.is_empty() {
            info!(plan = %plan_id, elapsed_ms = now, "performance completed");
            self.set_state(
                PlaybackState::Completed,
                Some(plan_id),
                &mut report.transitions,
            );
        }

        report
    }

    /// Interrupt the active plan and return every touched target to rest.
    ///
    /// Calling it again with nothing playing applies nothing.
    pub fn stop<R: RigBinding + ?Sized>(&mut self, rig: &mut R) -> StopReport {
        let mut report = StopReport::default();
        let active = self.cursor.active_plan;

        if self.state == PlaybackState::Playing {
            info!(plan = ?active, at_ms = self.cursor.elapsed_ms(), "performance stopped");
            self.set_state(PlaybackState::Interrupted, active, &mut report.transitions);
            report.interrupted = active;
        }
        self.set_state(PlaybackState::Idle, active, &mut report.transitions);

        self.plan = None;
        self.blends.clear();
        self.cursor.reset(None);

        for (target, pose) in self.emitted.iter_mut() {
            if pose.is_rest() {
                continue;
            }
            let rest = pose.rest();
            rig.apply(target, &rest, 1.0);
            *pose = rest;
            report.rest_applications += 1;
        }

        report
    }
}
