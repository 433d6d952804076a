//! Time primitives for CASE
//!
//! Track timelines are expressed in whole milliseconds (`u32`) relative to the
//! start of a plan. Clocks produce `Duration`s; these helpers convert between
//! the two without overflow.

use std::time::Duration;

/// Longest offset representable on a track timeline
pub const MAX_TRACK_MS: u32 = u32::MAX;

/// Convert a duration to track milliseconds, saturating at `MAX_TRACK_MS`
#[inline]
pub fn duration_to_ms(d: Duration) -> u32 {
    d.as_millis().min(MAX_TRACK_MS as u128) as u32
}

/// Convert track milliseconds to a duration
#[inline]
pub fn ms_to_duration(ms: u32) -> Duration {
    Duration::from_millis(ms as u64)
}

/// Fraction of `span_ms` covered by `elapsed_ms`, clamped to [0, 1]
/// A zero span is complete immediately.
#[inline]
pub fn progress(elapsed_ms: u32, span_ms: u32) -> f32 {
    if span_ms == 0 {
        return 1.0;
    }
    (elapsed_ms as f32 / span_ms as f32).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_duration_roundtrip() {
        assert_eq!(duration_to_ms(Duration::from_millis(120)), 120);
        assert_eq!(ms_to_duration(120), Duration::from_millis(120));
        assert_eq!(duration_to_ms(Duration::from_micros(1999)), 1);
    }

    #[test]
    fn test_duration_saturates() {
        let huge = Duration::from_secs(u64::MAX / 2);
        assert_eq!(duration_to_ms(huge), MAX_TRACK_MS);
    }

    #[test]
    fn test_progress_zero_span() {
        assert_eq!(progress(0, 0), 1.0);
        assert_eq!(progress(30, 60), 0.5);
        assert_eq!(progress(90, 60), 1.0);
    }

    proptest! {
        #[test]
        fn progress_is_bounded(elapsed in any::<u32>(), span in any::<u32>()) {
            let p = progress(elapsed, span);
            prop_assert!((0.0..=1.0).contains(&p));
        }
    }
}
