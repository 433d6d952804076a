//! Clock implementations for CASE playback

use std::time::{Duration, Instant};

use tracing::debug;

/// Source of per-tick deltas
pub trait PlaybackClock {
    /// Time elapsed since the previous call (or since reset)
    fn delta(&mut self) -> Duration;

    /// Restart measurement from now
    fn reset(&mut self);
}

/// Wall clock - monotonic, local-driven
/// INVARIANT: never yields more than `max_step` per call, so a stalled render
/// loop does not skip a whole sentence of visemes at once
pub struct WallClock {
    last: Instant,
    max_step: Duration,
}

impl WallClock {
    pub fn new(max_step: Duration) -> Self {
        WallClock {
            last: Instant::now(),
            max_step,
        }
    }

    pub fn max_step(&self) -> Duration {
        self.max_step
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new(Duration::from_millis(100))
    }
}

impl PlaybackClock for WallClock {
    fn delta(&mut self) -> Duration {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last);
        self.last = now;

        // Clamp to prevent large jumps (e.g., after system sleep)
        elapsed.min(self.max_step)
    }

    fn reset(&mut self) {
        self.last = Instant::now();
    }
}

/// Audio clock - playback position reported by the audio host
/// Only moves forward; a report behind the current position is ignored.
#[derive(Debug, Default)]
pub struct AudioClock {
    /// Latest reported position
    position: Duration,
    /// Position already handed out as deltas
    consumed: Duration,
    /// Has the host reported at least once since reset?
    reported: bool,
}

impl AudioClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report the current playback position of the utterance's audio
    pub fn report(&mut self, position: Duration) {
        if position < self.position {
            debug!(
                reported_ms = position.as_millis() as u64,
                current_ms = self.position.as_millis() as u64,
                "ignoring backwards audio position"
            );
            return;
        }
        self.position = position;
        self.reported = true;
    }

    /// Has a position been reported since the last reset?
    pub fn is_reporting(&self) -> bool {
        self.reported
    }

    pub fn position(&self) -> Duration {
        self.position
    }
}

impl PlaybackClock for AudioClock {
    fn delta(&mut self) -> Duration {
        let delta = self.position.saturating_sub(self.consumed);
        self.consumed = self.position;
        delta
    }

    fn reset(&mut self) {
        *self = AudioClock::default();
    }
}

/// Manual clock - the host pushes the deltas
#[derive(Debug, Default)]
pub struct ManualClock {
    pending: Duration,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add time to be handed out on the next `delta()` call
    pub fn advance(&mut self, dt: Duration) {
        self.pending = self.pending.saturating_add(dt);
    }
}

impl PlaybackClock for ManualClock {
    fn delta(&mut self) -> Duration {
        std::mem::take(&mut self.pending)
    }

    fn reset(&mut self) {
        self.pending = Duration::ZERO;
    }
}
