//! CASE Voice - Speech timing as mouth state
//!
//! This is NOT speech synthesis. Audio comes from an external speech
//! provider; this crate only consumes the provider's phoneme timing.
//!
//! Raw provider output is unordered, may overlap, and leaves gaps between
//! words. The timeline builder turns it into the single source of truth for
//! the mouth track:
//! - sorted by start time
//! - overlaps clipped on the earlier event (audio already heard is never
//!   retimed)
//! - rest visemes inserted into gaps so the mouth closes between words

pub mod phoneme;
pub mod viseme;
pub mod timeline;
pub mod speech;

pub use phoneme::*;
pub use viseme::*;
pub use timeline::*;
pub use speech::*;
