//! CASE Test Harness - scenario testing and playback validation
//!
//! This crate provides:
//! - Scripted speech and classifier providers
//! - Frame jitter for render-loop torture testing
//! - End-to-end scenarios from response text to rig calls

pub mod integration;
pub mod jitter;
pub mod providers;

pub use integration::*;
pub use jitter::*;
pub use providers::*;
