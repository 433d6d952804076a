//! CASE Runtime - turn planning and performance playback
//!
//! Two sides meet here:
//! - the planning side turns a finished response into a `PerformancePlan`
//!   (`TurnPlanner`, `ResponseAssembler`)
//! - the render side plays plans against the host rig one tick at a time
//!   (`PerformanceScheduler`, `Performer`)
//!
//! Plans cross from one side to the other through a `PerformanceHandle`.

pub mod config;
pub mod logging;
pub mod performer;
pub mod planner;
pub mod response;
pub mod scheduler;

pub use config::*;
pub use logging::*;
pub use performer::*;
pub use planner::*;
pub use response::*;
pub use scheduler::*;
