//! Creature decision making
//!
//! Provides steering primitives, migration patterns and the behavior state machine.

mod behavior;
mod migration;
mod steering;

pub use behavior::{
    BehaviorMachine, BehaviorState, MigrationAssignment, Multipliers, StateTable, SwitchRules,
    Transition,
};
pub use migration::{
    AreaList, CurrentParams, DepthCycleParams, DriftParams, FeedingParams, FigureEightParams,
    MigrationPattern, OrbitParams, PatternContext, PatternKind, SwayParams, ThermalParams,
    TidalParams, VerticalParams, WanderParams, WanderState, active_area_index, choose_pattern,
    default_feeding_areas, evaluate_target, random_phase, wander_extent,
};
pub use steering::{Bounds, SteeringOutput, avoid, boundary_repel, seek};
