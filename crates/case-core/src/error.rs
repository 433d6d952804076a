//! Error types for CASE
//!
//! Most failures in CASE degrade to a safe visual default rather than abort a
//! turn. Those are carried upward as warnings inside an [`Outcome`]; only
//! the variants for which [`CaseError::is_fatal`] holds are returned as `Err`.

use thiserror::Error;

use crate::RigTargetId;

/// Phoneme timeline construction errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimelineError {
    #[error("No phoneme events")]
    EmptyInput,

    #[error("All {dropped} phoneme events were degenerate")]
    NoUsableEvents { dropped: usize },
}

/// Core CASE errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CaseError {
    // Expression errors
    #[error("Expression classifier unavailable: {0}")]
    ClassificationUnavailable(String),

    #[error("Unrecognized expression label: {0}")]
    UnrecognizedLabel(String),

    // Speech errors
    #[error("Speech provider failed: {0}")]
    SpeechUnavailable(String),

    #[error("Empty speech timeline: {0}")]
    EmptySpeechTimeline(#[from] TimelineError),

    // Rig errors
    #[error("Rig target not in catalog: {0}")]
    UnknownRigTarget(RigTargetId),

    // Plan errors
    #[error("Invalid plan: {track} keyframe {index} at {time_ms}ms precedes {previous_ms}ms")]
    InvalidPlan {
        track: &'static str,
        index: usize,
        time_ms: u32,
        previous_ms: u32,
    },

    // Host errors
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error("Command queue full ({capacity} pending)")]
    QueueFull { capacity: usize },
}

impl CaseError {
    /// Whether the error aborts the operation that raised it.
    /// Everything else degrades to a neutral or rest pose and continues.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CaseError::InvalidPlan { .. }
                | CaseError::Config(_)
                | CaseError::Logging(_)
                | CaseError::QueueFull { .. }
        )
    }
}

/// Result type for CASE operations
pub type CaseResult<T> = Result<T, CaseError>;

/// A value produced on a possibly degraded path, with the warnings raised
/// while producing it
#[derive(Debug, Clone)]
pub struct Outcome<T> {
    pub value: T,
    pub warnings: Vec<CaseError>,
}

impl<T> Outcome<T> {
    pub fn clean(value: T) -> Self {
        Self {
            value,
            warnings: Vec::new(),
        }
    }

    pub fn with_warnings(value: T, warnings: Vec<CaseError>) -> Self {
        Self { value, warnings }
    }

    pub fn is_degraded(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn warn(&mut self, warning: CaseError) {
        self.warnings.push(warning);
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            value: f(self.value),
            warnings: self.warnings,
        }
    }

    pub fn into_parts(self) -> (T, Vec<CaseError>) {
        (self.value, self.warnings)
    }
}
