//! Playback Timer - chooses the clock that drives the scheduler

use std::time::Duration;

use tracing::{debug, warn};

use crate::{AudioClock, ManualClock, PlaybackClock, WallClock};

/// Which clock drives playback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockSource {
    /// Audio position when reported, wall clock otherwise
    Audio,
    /// Wall clock only
    Wall,
    /// Host-pushed deltas only
    Manual,
}

impl ClockSource {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "audio" => Some(ClockSource::Audio),
            "wall" => Some(ClockSource::Wall),
            "manual" => Some(ClockSource::Manual),
            _ => None,
        }
    }
}

/// Timer configuration
#[derive(Clone, Debug)]
pub struct TimerConfig {
    /// Preferred clock
    pub source: ClockSource,
    /// Largest wall-clock step handed out per tick
    pub max_step: Duration,
    /// Audio/wall divergence that is worth a warning
    pub drift_warn: Duration,
    /// Wall time without audio progress after which the audio is treated
    /// as finished and the wall clock takes over
    pub audio_timeout: Duration,
}

impl Default for TimerConfig {
    fn default() -> Self {
        TimerConfig {
            source: ClockSource::Audio,
            max_step: Duration::from_millis(100),
            drift_warn: Duration::from_millis(40),
            audio_timeout: Duration::from_millis(100),
        }
    }
}

impl TimerConfig {
    /// Fixed-step configuration for hosts that pass their own frame deltas
    pub fn manual() -> Self {
        TimerConfig {
            source: ClockSource::Manual,
            ..Default::default()
        }
    }
}

/// Playback Timer - one delta per tick, from the configured source
pub struct PlaybackTimer {
    config: TimerConfig,
    wall: WallClock,
    audio: AudioClock,
    manual: ManualClock,
    /// Accumulated audio minus wall time (microseconds) since reset
    drift_us: i64,
    drift_warned: bool,
    /// Wall time since the audio position last moved
    audio_idle: Duration,
    /// Audio finished; wall clock drives the rest of the plan
    audio_ended: bool,
}

impl PlaybackTimer {
    pub fn new() -> Self {
        Self::with_config(TimerConfig::default())
    }

    pub fn with_config(config: TimerConfig) -> Self {
        PlaybackTimer {
            wall: WallClock::new(config.max_step),
            audio: AudioClock::new(),
            manual: ManualClock::new(),
            drift_us: 0,
            drift_warned: false,
            audio_idle: Duration::ZERO,
            audio_ended: false,
            config,
        }
    }

    /// Delta for the coming tick.
    ///
    /// With the audio source, audio deltas are used while the host keeps
    /// reporting progress. Once the position has not moved for
    /// `audio_timeout`, or [`end_of_audio`](Self::end_of_audio) was called,
    /// the wall clock carries playback past the end of the audio.
    pub fn advance(&mut self) -> Duration {
        match self.config.source {
            ClockSource::Wall => self.wall.delta(),
            ClockSource::Manual => self.manual.delta(),
            ClockSource::Audio => {
                let wall_dt = self.wall.delta();
                if self.audio_ended || !self.audio.is_reporting() {
                    return wall_dt;
                }
                let audio_dt = self.audio.delta();
                if !audio_dt.is_zero() {
                    self.audio_idle = Duration::ZERO;
                    self.track_drift(audio_dt, wall_dt);
                    return audio_dt;
                }

                self.audio_idle = self.audio_idle.saturating_add(wall_dt);
                if self.audio_idle < self.config.audio_timeout {
                    return Duration::ZERO;
                }
                debug!(
                    audio_ms = self.audio.position().as_millis() as u64,
                    idle_ms = self.audio_idle.as_millis() as u64,
                    "audio position stalled, following wall clock"
                );
                self.audio_ended = true;
                std::mem::take(&mut self.audio_idle)
            }
        }
    }

    /// The utterance's audio has finished; follow the wall clock until reset
    pub fn end_of_audio(&mut self) {
        if self.config.source == ClockSource::Audio && !self.audio_ended {
            debug!(
                audio_ms = self.audio.position().as_millis() as u64,
                "end of audio, following wall clock"
            );
        }
        self.audio_ended = true;
        self.audio_idle = Duration::ZERO;
    }

    /// Is the wall clock standing in for finished audio?
    pub fn audio_ended(&self) -> bool {
        self.audio_ended
    }

    /// Restart all clocks, called when a new plan starts
    pub fn reset(&mut self) {
        self.wall.reset();
        self.audio.reset();
        self.manual.reset();
        self.drift_us = 0;
        self.drift_warned = false;
        self.audio_idle = Duration::ZERO;
        self.audio_ended = false;
    }

    /// Forward the audio host's playback position
    pub fn report_audio_position(&mut self, position: Duration) {
        self.audio.report(position);
    }

    /// Queue a host-provided delta (manual source)
    pub fn push_delta(&mut self, dt: Duration) {
        self.manual.advance(dt);
    }

    /// Audio minus wall time since reset, in milliseconds
    pub fn drift_ms(&self) -> i64 {
        self.drift_us / 1000
    }

    pub fn drift_warned(&self) -> bool {
        self.drift_warned
    }

    pub fn source(&self) -> ClockSource {
        self.config.source
    }

    pub fn config(&self) -> &TimerConfig {
        &self.config
    }

    fn track_drift(&mut self, audio_dt: Duration, wall_dt: Duration) {
        self.drift_us += audio_dt.as_micros() as i64 - wall_dt.as_micros() as i64;

        let limit = self.config.drift_warn.as_micros() as i64;
        if !self.drift_warned && self.drift_us.abs() > limit {
            self.drift_warned = true;
            warn!(
                drift_ms = self.drift_ms(),
                "audio clock diverging from wall clock"
            );
        }
    }
}

impl Default for PlaybackTimer {
    fn default() -> Self {
        Self::new()
    }
}
