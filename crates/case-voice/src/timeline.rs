//! Phoneme Timeline Builder - raw provider timing to a normalised viseme timeline

use case_core::TimelineError;
use tracing::debug;

use crate::{PhonemeEvent, Viseme, VisemeTimeline};

/// Timeline normalisation configuration
#[derive(Debug, Clone)]
pub struct TimelineConfig {
    /// Gaps at least this long get an explicit rest viseme
    pub rest_gap_threshold_ms: u32,

    /// Merge touching visemes of the same class
    pub merge_adjacent: bool,

    /// Length of the closed-mouth hold used when timing is unavailable
    pub rest_hold_ms: u32,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            rest_gap_threshold_ms: 80,
            merge_adjacent: true,
            rest_hold_ms: 500,
        }
    }
}

/// Phoneme Timeline Builder
#[derive(Debug, Clone, Default)]
pub struct TimelineBuilder {
    config: TimelineConfig,
}

impl TimelineBuilder {
    pub fn new(config: TimelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TimelineConfig {
        &self.config
    }

    /// Normalise raw provider events.
    ///
    /// Fails with `EmptyInput` on zero events and `NoUsableEvents` when every
    /// event is degenerate; callers fall back to [`Self::fallback`].
    pub fn build(&self, raw: &[PhonemeEvent]) -> Result<VisemeTimeline, TimelineError> {
        if raw.is_empty() {
            return Err(TimelineError::EmptyInput);
        }

        let mut dropped = 0;
        let mut events: Vec<Viseme> = raw
            .iter()
            .filter_map(|event| {
                if event.is_degenerate() {
                    dropped += 1;
                    debug!(
                        phoneme = %event.phoneme,
                        start_ms = event.start_ms,
                        end_ms = event.end_ms,
                        "dropping degenerate phoneme event"
                    );
                    return None;
                }
                Some(Viseme::new(event.class(), event.start_ms, event.end_ms))
            })
            .collect();

        if events.is_empty() {
            return Err(TimelineError::NoUsableEvents { dropped });
        }

        // Stable: providers that emit equal starts keep their order
        events.sort_by_key(|v| v.start_ms);

        let clipped = clip_overlaps(events);
        Ok(VisemeTimeline::from_normalized(self.fill_gaps(clipped)))
    }

    /// Closed-mouth timeline for turns without usable speech timing
    pub fn fallback(&self) -> VisemeTimeline {
        VisemeTimeline::rest_hold(self.config.rest_hold_ms)
    }

    /// Build, falling back to the rest hold on failure
    pub fn build_or_rest(&self, raw: &[PhonemeEvent]) -> (VisemeTimeline, Option<TimelineError>) {
        match self.build(raw) {
            Ok(timeline) => (timeline, None),
            Err(err) => (self.fallback(), Some(err)),
        }
    }

    fn fill_gaps(&self, clipped: Vec<Viseme>) -> Vec<Viseme> {
        let threshold = self.config.rest_gap_threshold_ms;
        let mut out: Vec<Viseme> = Vec::with_capacity(clipped.len() * 2);

        for viseme in clipped {
            let gap_start = out.last().map(|v| v.end_ms).unwrap_or(0);
            let gap = viseme.start_ms - gap_start;
            if gap > 0 && gap >= threshold {
                self.push(&mut out, Viseme::rest(gap_start, viseme.start_ms));
            }
            self.push(&mut out, viseme);
        }

        out
    }

    fn push(&self, out: &mut Vec<Viseme>, viseme: Viseme) {
        if self.config.merge_adjacent {
            if let Some(last) = out.last_mut() {
                if last.class == viseme.class && last.end_ms == viseme.start_ms {
                    last.end_ms = viseme.end_ms;
                    return;
                }
            }
        }
        out.push(viseme);
    }
}

/// Truncate the earlier of two overlapping events.
/// Input must be sorted by start; output is non-overlapping.
fn clip_overlaps(events: Vec<Viseme>) -> Vec<Viseme> {
    let mut clipped: Vec<Viseme> = Vec::with_capacity(events.len());

    for viseme in events {
        if let Some(prev) = clipped.last_mut() {
            if viseme.start_ms < prev.end_ms {
                debug!(
                    class = ?prev.class,
                    from_ms = prev.end_ms,
                    to_ms = viseme.start_ms,
                    "clipping overlapping viseme"
                );
                prev.end_ms = viseme.start_ms;
                if prev.end_ms <= prev.start_ms {
                    clipped.pop();
                }
            }
        }
        clipped.push(viseme);
    }

    clipped
}
