//! Visemes and the normalised viseme timeline

use crate::PhonemeClass;

/// A mouth shape held over a time span
/// INVARIANT (inside a `VisemeTimeline`): `start_ms < end_ms`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viseme {
    pub class: PhonemeClass,
    pub start_ms: u32,
    pub end_ms: u32,
}

impl Viseme {
    pub fn new(class: PhonemeClass, start_ms: u32, end_ms: u32) -> Self {
        Self {
            class,
            start_ms,
            end_ms,
        }
    }

    pub fn rest(start_ms: u32, end_ms: u32) -> Self {
        Self::new(PhonemeClass::Rest, start_ms, end_ms)
    }

    pub fn duration_ms(&self) -> u32 {
        self.end_ms.saturating_sub(self.start_ms)
    }

    pub fn contains(&self, ms: u32) -> bool {
        self.start_ms <= ms && ms < self.end_ms
    }
}

/// Ordered, non-overlapping viseme sequence
///
/// Only the timeline builder (and the rest-hold fallback) construct one, so
/// every instance satisfies `visemes[i].end_ms <= visemes[i + 1].start_ms`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisemeTimeline {
    visemes: Vec<Viseme>,
}

impl VisemeTimeline {
    pub(crate) fn from_normalized(visemes: Vec<Viseme>) -> Self {
        debug_assert!(visemes
            .windows(2)
            .all(|w| w[0].end_ms <= w[1].start_ms));
        Self { visemes }
    }

    /// Closed-mouth hold used when speech timing is unavailable
    pub fn rest_hold(duration_ms: u32) -> Self {
        Self {
            visemes: vec![Viseme::rest(0, duration_ms.max(1))],
        }
    }

    pub fn visemes(&self) -> &[Viseme] {
        &self.visemes
    }

    pub fn iter(&self) -> impl Iterator<Item = &Viseme> {
        self.visemes.iter()
    }

    pub fn len(&self) -> usize {
        self.visemes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visemes.is_empty()
    }

    /// End of the last viseme (0 for an empty timeline)
    pub fn end_ms(&self) -> u32 {
        self.visemes.last().map(|v| v.end_ms).unwrap_or(0)
    }

    /// Does the timeline only ever hold the mouth at rest?
    pub fn is_rest_only(&self) -> bool {
        self.visemes.iter().all(|v| v.class.is_rest())
    }

    /// Mouth class active at `ms` (Rest in gaps and past the end)
    pub fn class_at(&self, ms: u32) -> PhonemeClass {
        let idx = self.visemes.partition_point(|v| v.end_ms <= ms);
        match self.visemes.get(idx) {
            Some(v) if v.contains(ms) => v.class,
            _ => PhonemeClass::Rest,
        }
    }

    pub fn into_visemes(self) -> Vec<Viseme> {
        self.visemes
    }
}

impl<'a> IntoIterator for &'a VisemeTimeline {
    type Item = &'a Viseme;
    type IntoIter = std::slice::Iter<'a, Viseme>;

    fn into_iter(self) -> Self::IntoIter {
        self.visemes.iter()
    }
}
