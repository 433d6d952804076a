//! CASE Time - Clock sources for the performance scheduler
//!
//! The scheduler advances by a delta each tick. This crate produces that delta:
//! - Audio clock: position reported by the audio host, preferred because it
//!   tracks the audible phonemes exactly
//! - Wall clock: monotonic OS time, used when no audio position is available
//! - Manual clock: deltas pushed by the host (fixed-step loops, tests)

pub mod clock;
pub mod timer;

pub use clock::*;
pub use timer::*;
