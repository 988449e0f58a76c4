//! Autonomous underwater creature behavior built in Rust
//!
//! This crate provides:
//! - Steering primitives, migration patterns and a behavior state machine
//! - Damped force-based motion for fish and jellyfish
//! - A deterministic, seeded population with optional parallel ticks
//! - Procedural swim animation channels for rendering

pub mod ai;
pub mod animation;
pub mod core;
pub mod creature;

// Re-exports for convenience
pub use glam;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::ai::{BehaviorState, MigrationPattern, PatternKind};
    pub use crate::animation::AnimationChannels;
    pub use crate::core::{
        ConfigError, Population, PopulationStats, SimClock, SimulationConfig, SpeciesConfig,
    };
    pub use crate::creature::{Agent, AgentKind, AgentPose, Orientation, PoseInstance};
    pub use glam::{Quat, Vec2, Vec3};
}
