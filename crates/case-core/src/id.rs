//! Identity types for CASE
//!
//! Plans are numbered from a single monotonically increasing sequence so the
//! scheduler can tell a superseded plan from the live one without comparing
//! contents. Rig targets are named, since assets expose joints and
//! blendshapes by name.

use std::fmt;
use std::sync::Arc;

/// Performance plan identity - monotonically increasing per process
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PlanId(pub u64);

impl PlanId {
    pub const ZERO: PlanId = PlanId(0);

    #[inline]
    pub fn new(id: u64) -> Self {
        PlanId(id)
    }

    #[inline]
    pub fn next(self) -> Self {
        PlanId(self.0.wrapping_add(1))
    }
}

impl fmt::Debug for PlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Plan({})", self.0)
    }
}

impl fmt::Display for PlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Logical clock value stamped on a plan when it is built
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct LogicalTime(pub u64);

impl LogicalTime {
    pub const ZERO: LogicalTime = LogicalTime(0);

    #[inline]
    pub fn tick(self) -> Self {
        LogicalTime(self.0.saturating_add(1))
    }
}

impl fmt::Debug for LogicalTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "λ{}", self.0)
    }
}

/// Identity and build time of one plan
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PlanStamp {
    pub id: PlanId,
    pub created_at: LogicalTime,
}

/// Issues plan stamps with strictly increasing ids and clock values
#[derive(Debug, Default)]
pub struct PlanSequence {
    last_id: PlanId,
    clock: LogicalTime,
}

impl PlanSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the stamp for the next plan
    pub fn next_stamp(&mut self) -> PlanStamp {
        self.last_id = self.last_id.next();
        self.clock = self.clock.tick();
        PlanStamp {
            id: self.last_id,
            created_at: self.clock,
        }
    }

    /// Last allocated plan id (ZERO if none)
    pub fn last_id(&self) -> PlanId {
        self.last_id
    }
}

/// Rig target identity - a named joint or blendshape on the loaded asset
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RigTargetId(Arc<str>);

impl RigTargetId {
    pub fn new(name: impl AsRef<str>) -> Self {
        RigTargetId(Arc::from(name.as_ref()))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RigTargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Target({})", self.0)
    }
}

impl fmt::Display for RigTargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RigTargetId {
    fn from(name: &str) -> Self {
        RigTargetId::new(name)
    }
}

impl From<String> for RigTargetId {
    fn from(name: String) -> Self {
        RigTargetId(Arc::from(name))
    }
}

impl AsRef<str> for RigTargetId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
