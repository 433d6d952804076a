//! CASE Core - Fundamental types and primitives
//!
//! This crate defines the types shared by every CASE crate:
//! - Identifiers (PlanId, RigTargetId, LogicalTime, PlanStamp)
//! - Millisecond time helpers for track timelines
//! - The error taxonomy and the `Outcome` wrapper for degraded results

pub mod id;
pub mod time;
pub mod error;

pub use id::*;
pub use time::*;
pub use error::*;
