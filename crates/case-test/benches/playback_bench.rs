//! Benchmarks for CASE playback: scheduler tick and timer

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use case_core::{PlanSequence, RigTargetId};
use case_runtime::PerformanceScheduler;
use case_test::{full_rig, LetterSpeech};
use case_time::{PlaybackTimer, TimerConfig};
use case_visual::{
    Expression, ExpressiveIntent, PerformancePlan, PoseValue, RecordingRig, RigBinding,
    TrackResolver,
};
use case_voice::TimelineBuilder;

/// Rig binding that discards everything, so the bench measures the scheduler
struct NullRig;

impl RigBinding for NullRig {
    fn apply(&mut self, target: &RigTargetId, pose: &PoseValue, blend_factor: f32) {
        black_box((target, pose, blend_factor));
    }
}

fn plan() -> PerformancePlan {
    let timeline = TimelineBuilder::default()
        .build(&LetterSpeech::phonemes(
            "It is wonderful to see you again after such a long time",
        ))
        .unwrap();
    TrackResolver::default()
        .resolve(
            PlanSequence::new().next_stamp(),
            &ExpressiveIntent::new(Expression::Wave),
            timeline.visemes(),
            &full_rig(),
        )
        .unwrap()
        .value
}

fn bench_scheduler_tick(c: &mut Criterion) {
    let plan = plan();
    let frame = Duration::from_millis(16);

    c.bench_function("scheduler_full_performance", |b| {
        b.iter(|| {
            let mut scheduler = PerformanceScheduler::new();
            let mut rig = NullRig;
            scheduler.start(plan.clone());
            while scheduler.is_playing() {
                black_box(scheduler.tick(frame, &mut rig));
            }
        })
    });
}

fn bench_scheduler_recording(c: &mut Criterion) {
    let plan = plan();

    c.bench_function("scheduler_recording_rig", |b| {
        b.iter(|| {
            let mut scheduler = PerformanceScheduler::new();
            let mut rig = RecordingRig::new();
            scheduler.start(plan.clone());
            while scheduler.is_playing() {
                scheduler.tick(Duration::from_millis(16), &mut rig);
            }
            black_box(rig.len())
        })
    });
}

fn bench_timer_advance(c: &mut Criterion) {
    let mut timer = PlaybackTimer::with_config(TimerConfig::manual());

    c.bench_function("timer_manual_advance", |b| {
        b.iter(|| {
            timer.push_delta(black_box(Duration::from_millis(16)));
            timer.advance()
        })
    });
}

criterion_group!(
    benches,
    bench_scheduler_tick,
    bench_scheduler_recording,
    bench_timer_advance,
);
criterion_main!(benches);
