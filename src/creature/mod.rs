//! Creature module
//!
//! Agent state, motion integration and per-frame pose output

mod agent;
mod components;
mod motion;
mod pose;

pub use agent::Agent;
pub use components::{AgentKind, Appearance, JellyVariety, Orientation, wrap_angle};
pub use motion::{
    ForceBreakdown, MotionInput, MotionProfile, MotionState, OrientationRates, compute_forces,
    integrate, jitter, reflect_into, smoothing,
};
pub use pose::{AgentPose, PoseInstance, pose_instances};
