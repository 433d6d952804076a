//! CASE Visual - Expressive state and rig performance plans
//!
//! This is NOT a renderer and NOT an asset loader. The host owns the model;
//! this crate decides what the model should do for one conversational turn.
//!
//! # Flow
//!
//! Response text → classifier adapter → expressive intent
//! Viseme timeline + intent + rig catalog → resolver → performance plan
//!
//! The plan is a pair of keyframe tracks (expression, mouth) that the
//! runtime's scheduler plays against a [`RigBinding`].

pub mod classifier;
pub mod expression;
pub mod keyframe;
pub mod plan;
pub mod pose;
pub mod resolver;
pub mod rig;

pub use classifier::*;
pub use expression::*;
pub use keyframe::*;
pub use plan::*;
pub use pose::*;
pub use resolver::*;
pub use rig::*;
