//! Performer - render-thread driver around the scheduler
//!
//! The performer owns the scheduler and the playback timer. Planning
//! happens elsewhere; finished plans reach the render thread through a
//! [`PerformanceHandle`], whose commands are drained at the top of every
//! tick so a start always takes effect before that tick's keyframes.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use case_core::{CaseError, CaseResult};
use case_time::{PlaybackTimer, TimerConfig};
use case_visual::{PerformancePlan, RigBinding};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::{
    PerformanceScheduler, PlaybackState, StartReport, StopReport, TickReport, DEFAULT_RELEASE_MS,
};

/// Performer configuration
#[derive(Clone, Debug)]
pub struct PerformerConfig {
    /// Clock driving playback
    pub timer: TimerConfig,
    /// Maximum pending commands between two ticks
    pub queue_capacity: usize,
    /// Blend returning targets a new plan leaves undriven to rest
    pub release_ms: u32,
}

impl Default for PerformerConfig {
    fn default() -> Self {
        PerformerConfig {
            timer: TimerConfig::default(),
            queue_capacity: 8,
            release_ms: DEFAULT_RELEASE_MS,
        }
    }
}

impl PerformerConfig {
    /// Host drives time explicitly with `tick_by`
    pub fn manual() -> Self {
        PerformerConfig {
            timer: TimerConfig::manual(),
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct PerformanceStats {
    pub ticks: u64,
    pub plans_started: u64,
    pub plans_completed: u64,
    pub plans_interrupted: u64,
    pub keyframes_entered: u64,
    pub rig_applications: u64,
    pub commands_drained: u64,
    pub last_tick_duration: Duration,
}

/// Command sent to the render thread
#[derive(Debug, Clone)]
pub enum Command {
    Start(PerformancePlan),
    Stop,
}

#[derive(Debug)]
struct CommandQueue {
    pending: VecDeque<Command>,
    capacity: usize,
}

/// Cloneable, thread-safe sender of performer commands
#[derive(Debug, Clone)]
pub struct PerformanceHandle {
    queue: Arc<Mutex<CommandQueue>>,
}

impl PerformanceHandle {
    /// Queue `plan` to start on the next tick
    pub fn start(&self, plan: PerformancePlan) -> CaseResult<()> {
        let mut queue = self.queue.lock();
        if queue.pending.len() >= queue.capacity {
            warn!(plan = %plan.id(), capacity = queue.capacity, "command queue full");
            return Err(CaseError::QueueFull {
                capacity: queue.capacity,
            });
        }
        queue.pending.push_back(Command::Start(plan));
        Ok(())
    }

    /// Queue a stop. Anything queued before it would be undone by it, so the
    /// stop replaces the pending commands and never fails.
    pub fn stop(&self) {
        let mut queue = self.queue.lock();
        queue.pending.clear();
        queue.pending.push_back(Command::Stop);
    }

    /// Hand over the result of planning a turn.
    ///
    /// A valid plan is queued to start. A fatal planning error stops the
    /// current performance and is passed back to the caller.
    pub fn submit_turn(&self, plan: CaseResult<PerformancePlan>) -> CaseResult<()> {
        match plan {
            Ok(plan) => self.start(plan),
            Err(err) => {
                if err.is_fatal() {
                    warn!(error = %err, "turn rejected, stopping performance");
                    self.stop();
                }
                Err(err)
            }
        }
    }

    /// Commands waiting for the next tick
    pub fn pending(&self) -> usize {
        self.queue.lock().pending.len()
    }
}

/// Performer - owns playback on the render thread
pub struct Performer {
    scheduler: PerformanceScheduler,
    timer: PlaybackTimer,
    queue: Arc<Mutex<CommandQueue>>,
    config: PerformerConfig,
    stats: PerformanceStats,
}

impl Default for Performer {
    fn default() -> Self {
        Self::new()
    }
}

impl Performer {
    pub fn new() -> Self {
        Self::with_config(PerformerConfig::default())
    }

    pub fn with_config(config: PerformerConfig) -> Self {
        let queue = CommandQueue {
            pending: VecDeque::with_capacity(config.queue_capacity),
            capacity: config.queue_capacity.max(1),
        };
        Performer {
            scheduler: PerformanceScheduler::new().with_release_ms(config.release_ms),
            timer: PlaybackTimer::with_config(config.timer.clone()),
            queue: Arc::new(Mutex::new(queue)),
            config,
            stats: PerformanceStats::default(),
        }
    }

    /// Sender for other threads
    pub fn handle(&self) -> PerformanceHandle {
        PerformanceHandle {
            queue: Arc::clone(&self.queue),
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.scheduler.state()
    }

    pub fn scheduler(&self) -> &PerformanceScheduler {
        &self.scheduler
    }

    pub fn timer(&self) -> &PlaybackTimer {
        &self.timer
    }

    pub fn config(&self) -> &PerformerConfig {
        &self.config
    }

    pub fn stats(&self) -> &PerformanceStats {
        &self.stats
    }

    /// Start `plan` immediately, from the render thread
    pub fn start(&mut self, plan: PerformancePlan) -> StartReport {
        self.timer.reset();
        let report = self.scheduler.start(plan);
        self.stats.plans_started += 1;
        if report.superseded.is_some() {
            self.stats.plans_interrupted += 1;
        }
        report
    }

    /// Start a planning result; a failed plan stops the current performance
    pub fn start_result<R: RigBinding + ?Sized>(
        &mut self,
        plan: CaseResult<PerformancePlan>,
        rig: &mut R,
    ) -> CaseResult<StartReport> {
        match plan {
            Ok(plan) => Ok(self.start(plan)),
            Err(err) => {
                warn!(error = %err, "turn rejected, stopping performance");
                self.stop(rig);
                Err(err)
            }
        }
    }

    /// Stop immediately and return the rig to rest
    pub fn stop<R: RigBinding + ?Sized>(&mut self, rig: &mut R) -> StopReport {
        let report = self.scheduler.stop(rig);
        if report.interrupted.is_some() {
            self.stats.plans_interrupted += 1;
        }
        self.stats.rig_applications += report.rest_applications as u64;
        report
    }

    /// Forward the audio host's playback position
    pub fn report_audio_position(&mut self, position: Duration) {
        self.timer.report_audio_position(position);
    }

    /// The audio host finished the utterance; wall time drives what remains
    pub fn end_of_audio(&mut self) {
        self.timer.end_of_audio();
    }

    /// Queue a host-measured frame delta (manual clock source)
    pub fn push_delta(&mut self, dt: Duration) {
        self.timer.push_delta(dt);
    }

    /// Execute one tick, taking the delta from the playback timer
    pub fn tick<R: RigBinding + ?Sized>(&mut self, rig: &mut R) -> TickReport {
        let start = Instant::now();
        self.drain_commands(rig);
        let delta = self.timer.advance();
        self.finish_tick(start, delta, rig)
    }

    /// Execute one tick with an explicit delta, bypassing the timer
    pub fn tick_by<R: RigBinding + ?Sized>(&mut self, delta: Duration, rig: &mut R) -> TickReport {
        let start = Instant::now();
        self.drain_commands(rig);
        self.finish_tick(start, delta, rig)
    }

    fn finish_tick<R: RigBinding + ?Sized>(
        &mut self,
        start: Instant,
        delta: Duration,
        rig: &mut R,
    ) -> TickReport {
        let report = self.scheduler.tick(delta, rig);

        self.stats.ticks += 1;
        self.stats.keyframes_entered += report.entered.len() as u64;
        self.stats.rig_applications += report.applications as u64;
        if report.completed().is_some() {
            self.stats.plans_completed += 1;
        }
        self.stats.last_tick_duration = start.elapsed();
        report
    }

    fn drain_commands<R: RigBinding + ?Sized>(&mut self, rig: &mut R) {
        let commands: Vec<Command> = self.queue.lock().pending.drain(..).collect();
        for command in commands {
            self.stats.commands_drained += 1;
            match command {
                Command::Start(plan) => {
                    debug!(plan = %plan.id(), "queued plan starting");
                    self.start(plan);
                }
                Command::Stop => {
                    self.stop(rig);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use case_core::{LogicalTime, PlanId, PlanStamp, RigTargetId};
    use case_visual::{
        AnimationTrack, Expression, ExpressiveIntent, Keyframe, PoseValue, RecordingRig, TrackKind,
    };

    fn plan(id: u64, mouth_at: &[u32]) -> PerformancePlan {
        let mouth = mouth_at
            .iter()
            .map(|t| Keyframe::new(*t, RigTargetId::new("Mouth"), PoseValue::weight(0.6), 0))
            .collect();
        PerformancePlan::new(
            PlanStamp {
                id: PlanId::new(id),
                created_at: LogicalTime(id),
            },
            ExpressiveIntent::new(Expression::Smile),
            AnimationTrack::new(TrackKind::Expression),
            AnimationTrack::from_keyframes(TrackKind::Mouth, mouth),
            0,
        )
        .unwrap()
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_queued_start_applies_before_tick() {
        let mut performer = Performer::with_config(PerformerConfig::manual());
        let mut rig = RecordingRig::new();
        let handle = performer.handle();

        handle.start(plan(1, &[0, 100])).unwrap();
        assert_eq!(handle.pending(), 1);

        let report = performer.tick_by(ms(0), &mut rig);
        assert_eq!(report.plan, Some(PlanId::new(1)));
        assert_eq!(report.entered, vec![(TrackKind::Mouth, 0)]);
        assert_eq!(handle.pending(), 0);
        assert_eq!(performer.stats().plans_started, 1);
    }

    #[test]
    fn test_handle_is_send() {
        fn assert_send<T: Send + Sync + Clone>(_: &T) {}
        let performer = Performer::new();
        assert_send(&performer.handle());

        let handle = performer.handle();
        std::thread::spawn(move || handle.start(plan(7, &[0])).unwrap())
            .join()
            .unwrap();
        assert_eq!(performer.handle().pending(), 1);
    }

    #[test]
    fn test_queue_capacity() {
        let config = PerformerConfig {
            queue_capacity: 2,
            ..PerformerConfig::manual()
        };
        let performer = Performer::with_config(config);
        let handle = performer.handle();

        handle.start(plan(1, &[0])).unwrap();
        handle.start(plan(2, &[0])).unwrap();
        assert_eq!(
            handle.start(plan(3, &[0])),
            Err(CaseError::QueueFull { capacity: 2 })
        );

        handle.stop();
        assert_eq!(handle.pending(), 1);
    }

    #[test]
    fn test_invalid_turn_stops_performance() {
        let mut performer = Performer::with_config(PerformerConfig::manual());
        let mut rig = RecordingRig::new();
        let handle = performer.handle();

        handle.submit_turn(Ok(plan(1, &[0, 500]))).unwrap();
        performer.tick_by(ms(10), &mut rig);
        assert_eq!(performer.state(), PlaybackState::Playing);

        let invalid = CaseError::InvalidPlan {
            track: "mouth",
            index: 1,
            time_ms: 10,
            previous_ms: 20,
        };
        assert_eq!(handle.submit_turn(Err(invalid.clone())), Err(invalid));

        performer.tick_by(ms(10), &mut rig);
        assert_eq!(performer.state(), PlaybackState::Idle);
        assert!(rig.is_at_rest());
        assert_eq!(performer.stats().plans_interrupted, 1);
    }

    #[test]
    fn test_start_result_error_returns_to_idle() {
        let mut performer = Performer::with_config(PerformerConfig::manual());
        let mut rig = RecordingRig::new();
        performer.start(plan(1, &[0, 500]));
        performer.tick_by(ms(10), &mut rig);

        let result = performer.start_result(
            Err(CaseError::InvalidPlan {
                track: "expression",
                index: 3,
                time_ms: 0,
                previous_ms: 40,
            }),
            &mut rig,
        );
        assert!(result.is_err());
        assert_eq!(performer.state(), PlaybackState::Idle);

        performer.tick_by(ms(1_000), &mut rig);
        assert_eq!(performer.state(), PlaybackState::Idle);
    }

    #[test]
    fn test_manual_timer_drives_tick() {
        let mut performer = Performer::with_config(PerformerConfig::manual());
        let mut rig = RecordingRig::new();
        performer.start(plan(1, &[0, 100]));

        performer.push_delta(ms(60));
        performer.tick(&mut rig);
        assert_eq!(performer.scheduler().cursor().elapsed_ms(), 60);

        performer.push_delta(ms(60));
        let report = performer.tick(&mut rig);
        assert_eq!(report.entered, vec![(TrackKind::Mouth, 1)]);
        assert_eq!(report.completed(), Some(PlanId::new(1)));
        assert_eq!(performer.stats().plans_completed, 1);
        assert_eq!(performer.stats().keyframes_entered, 2);
    }

    #[test]
    fn test_audio_clock_plays_past_end_of_audio() {
        let mut performer = Performer::with_config(PerformerConfig {
            timer: TimerConfig {
                audio_timeout: ms(20),
                ..Default::default()
            },
            ..Default::default()
        });
        let mut rig = RecordingRig::new();
        performer.start(plan(1, &[0, 300, 600]));

        for position in [100, 200] {
            performer.report_audio_position(ms(position));
            performer.tick(&mut rig);
        }
        assert_eq!(performer.scheduler().cursor().elapsed_ms(), 200);

        let mut completed = false;
        for _ in 0..500 {
            std::thread::sleep(ms(2));
            completed |= performer.tick(&mut rig).completed() == Some(PlanId::new(1));
            if performer.state() == PlaybackState::Idle {
                break;
            }
        }
        assert!(completed);
        assert!(performer.timer().audio_ended());
        assert_eq!(performer.stats().keyframes_entered, 3);
    }

    #[test]
    fn test_end_of_audio_resumes_wall_time() {
        let mut performer = Performer::new();
        let mut rig = RecordingRig::new();
        performer.start(plan(1, &[0, 150]));
        performer.report_audio_position(ms(100));
        performer.tick(&mut rig);
        performer.end_of_audio();

        for _ in 0..200 {
            std::thread::sleep(ms(2));
            performer.tick(&mut rig);
            if performer.state() == PlaybackState::Idle {
                break;
            }
        }
        assert_eq!(performer.state(), PlaybackState::Idle);
        assert_eq!(performer.stats().plans_completed, 1);
    }
}
