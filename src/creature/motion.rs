//! Motion integration for a single agent
//!
//! Sums the steering forces, integrates velocity and position with damping,
//! enforces the speed limit and bounds, and eases the body orientation toward
//! the direction of travel.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::components::{Orientation, wrap_angle};
use crate::ai::{Bounds, SteeringOutput, avoid, boundary_repel, seek};
use crate::core::Span;

/// Speeds below this keep the previous heading
const MIN_HEADING_SPEED: f32 = 0.001;

/// Exponential smoothing rates (per second) for each orientation axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrientationRates {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

/// Tuning constants of a species' motion model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionProfile {
    /// Base max speed range, drawn per agent
    pub max_speed: Span,
    /// Seek force clamp range, drawn per agent
    pub max_force: Span,
    /// Converts summed force into acceleration
    pub agility: f32,
    /// Fraction of the effective max speed used as the seek speed
    pub seek_gain: f32,
    /// Weight of the vertical component of the seek force
    pub vertical_seek_weight: f32,
    /// Seek is disabled inside this distance of the target
    pub arrival_tolerance: f32,
    pub avoid_radius: f32,
    pub avoid_strength: f32,
    /// Avoidance clamp as a multiple of the agent's max force
    pub avoid_force_scale: f32,
    pub bounds: Bounds,
    /// Per-axis distance over which the boundary push reaches `boundary_strength`
    pub boundary_margin: Vec3,
    pub boundary_strength: f32,
    /// Migration targets are clamped into the bounds shrunk by this much
    pub target_inset: Vec3,
    /// Clamp position onto the bounds and reflect velocity
    pub hard_bounds: bool,
    /// Velocity factor applied on a hard-bound hit: (horizontal, vertical)
    pub restitution: Vec2,
    pub jitter_strength: f32,
    /// Angular frequency of the jitter sinusoid per axis
    pub jitter_frequency: Vec3,
    /// Phase shift per unit of agent id, per axis
    pub jitter_id_phase: Vec3,
    /// Per-axis jitter amplitude weight
    pub jitter_weight: Vec3,
    /// Vertical force from bell pulses; zero for swimmers without a bell
    pub pulse_strength: f32,
    /// Velocity multiplier applied every tick, in (0, 1)
    pub damping: f32,
    /// Converts force-domain velocity into world units per second
    pub position_scale: f32,
    pub orientation_rates: OrientationRates,
    /// Pitch per unit of vertical heading
    pub pitch_gain: f32,
    /// Roll per unit of lateral acceleration
    pub roll_gain: f32,
}

impl MotionProfile {
    /// Fish: soft bounds, strong player avoidance, quick turns
    #[must_use]
    pub fn fish() -> Self {
        Self {
            max_speed: Span::new(0.32, 0.77),
            max_force: Span::new(0.5, 0.8),
            agility: 6.0,
            seek_gain: 0.6,
            vertical_seek_weight: 1.0,
            arrival_tolerance: 1.5,
            avoid_radius: 8.0,
            avoid_strength: 2.5,
            avoid_force_scale: 2.0,
            bounds: Bounds::horizontal(35.0, -9.0, 3.0),
            boundary_margin: Vec3::new(8.0, 3.0, 8.0),
            boundary_strength: 0.5,
            target_inset: Vec3::new(2.0, 1.0, 2.0),
            hard_bounds: false,
            restitution: Vec2::ZERO,
            jitter_strength: 0.015,
            jitter_frequency: Vec3::new(0.4, 0.3, 0.35),
            jitter_id_phase: Vec3::new(0.3, 0.7, 0.5),
            jitter_weight: Vec3::new(1.0, 0.5, 1.0),
            pulse_strength: 0.0,
            damping: 0.92,
            position_scale: 8.0,
            orientation_rates: OrientationRates {
                pitch: 2.5,
                yaw: 3.0,
                roll: 2.0,
            },
            pitch_gain: 0.4,
            roll_gain: 1.0,
        }
    }

    /// Jellyfish: lazy drifting, bell pulses, hard reflective bounds
    #[must_use]
    pub fn jellyfish() -> Self {
        Self {
            max_speed: Span::new(0.24, 0.40),
            max_force: Span::new(0.3, 0.5),
            agility: 4.0,
            seek_gain: 0.8,
            vertical_seek_weight: 0.5,
            arrival_tolerance: 0.8,
            avoid_radius: 5.0,
            avoid_strength: 4.0,
            avoid_force_scale: 1.5,
            bounds: Bounds::horizontal(30.0, -8.0, 3.0),
            boundary_margin: Vec3::new(6.0, 2.0, 6.0),
            boundary_strength: 0.3,
            target_inset: Vec3::new(1.5, 0.5, 1.5),
            hard_bounds: true,
            restitution: Vec2::new(-0.3, -0.2),
            jitter_strength: 0.01,
            jitter_frequency: Vec3::new(0.25, 0.0, 0.2),
            jitter_id_phase: Vec3::new(0.9, 0.0, 1.3),
            jitter_weight: Vec3::new(1.0, 0.0, 1.0),
            pulse_strength: 0.15,
            damping: 0.88,
            position_scale: 2.5,
            orientation_rates: OrientationRates {
                pitch: 1.0,
                yaw: 1.2,
                roll: 0.8,
            },
            pitch_gain: 0.2,
            roll_gain: 0.3,
        }
    }

    /// Bounds that migration targets are clamped into
    #[must_use]
    pub fn target_bounds(&self) -> Bounds {
        self.bounds.inset(self.target_inset)
    }
}

/// Kinematic state of one agent
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MotionState {
    pub position: Vec3,
    pub velocity: Vec3,
    /// Smoothed orientation emitted to the renderer
    pub orientation: Orientation,
    /// Orientation the body is easing toward
    pub target_orientation: Orientation,
    /// Acceleration applied during the last tick
    pub acceleration: Vec3,
}

impl MotionState {
    #[must_use]
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.position.is_finite()
            && self.velocity.is_finite()
            && self.acceleration.is_finite()
            && self.orientation.is_finite()
    }
}

/// Per-tick inputs to [`integrate`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionInput {
    pub dt: f32,
    pub time: f32,
    pub agent_id: u32,
    /// Migration target (clamped by [`integrate`])
    pub target: Vec3,
    pub player: Vec3,
    /// Base max speed times the state multiplier
    pub effective_max_speed: f32,
    pub max_force: f32,
    /// State speed multiplier, scales the pulse force
    pub speed_multiplier: f32,
    /// Current bell pulse signal in `[-1, 1]`
    pub pulse: f32,
}

/// Individual forces of one tick, for inspection
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ForceBreakdown {
    pub seek: SteeringOutput,
    pub avoid: SteeringOutput,
    pub boundary: SteeringOutput,
    pub jitter: SteeringOutput,
    pub pulse: SteeringOutput,
    /// Summed forces times agility
    pub acceleration: Vec3,
}

/// Deterministic wobble keyed by agent id and time
#[must_use]
pub fn jitter(time: f32, agent_id: u32, profile: &MotionProfile) -> Vec3 {
    let id = agent_id as f32;
    let phase = profile.jitter_frequency * time + profile.jitter_id_phase * id;
    Vec3::new(phase.x.sin(), phase.y.sin(), phase.z.cos())
        * profile.jitter_weight
        * profile.jitter_strength
}

/// Evaluate every steering force for the current state
#[must_use]
pub fn compute_forces(state: &MotionState, input: &MotionInput, profile: &MotionProfile) -> ForceBreakdown {
    let target = profile.target_bounds().clamp(input.target);

    let seek = seek(
        state.position,
        state.velocity,
        target,
        input.effective_max_speed * profile.seek_gain,
        input.max_force,
        profile.arrival_tolerance,
    );
    let seek = SteeringOutput::new(seek.linear * Vec3::new(1.0, profile.vertical_seek_weight, 1.0));

    let avoid = avoid(
        state.position,
        state.velocity,
        input.player,
        profile.avoid_radius,
        profile.avoid_strength,
        input.effective_max_speed,
        input.max_force * profile.avoid_force_scale,
    );

    let boundary = boundary_repel(
        state.position,
        &profile.bounds,
        profile.boundary_margin,
        profile.boundary_strength,
    )
    .clamp_length(input.max_force);

    let jitter = SteeringOutput::new(jitter(input.time, input.agent_id, profile));
    let pulse = SteeringOutput::new(Vec3::Y * input.pulse * profile.pulse_strength * input.speed_multiplier);

    let total = seek.combine(avoid).combine(boundary).combine(jitter).combine(pulse);
    ForceBreakdown {
        seek,
        avoid,
        boundary,
        jitter,
        pulse,
        acceleration: total.linear * profile.agility,
    }
}

/// Advance one agent by `input.dt` seconds.
///
/// Returns the forces that were applied. If the step produces a non-finite
/// value the agent is rolled back to its previous position and stopped.
pub fn integrate(state: &mut MotionState, input: &MotionInput, profile: &MotionProfile) -> ForceBreakdown {
    let previous = *state;
    let dt = input.dt;
    let max_speed = input.effective_max_speed.max(0.0);

    let forces = compute_forces(state, input, profile);
    state.acceleration = forces.acceleration;

    state.velocity += forces.acceleration * dt;
    state.velocity *= profile.damping;
    state.velocity = state.velocity.clamp_length_max(max_speed);

    state.position += state.velocity * dt * profile.position_scale;

    if profile.hard_bounds {
        reflect_into(state, &profile.bounds, profile.restitution);
    }

    update_orientation(state, dt, profile);

    if !state.is_finite() {
        log::warn!(
            "Agent {} produced a non-finite state, rolling back to {:?}",
            input.agent_id,
            previous.position
        );
        *state = MotionState {
            velocity: Vec3::ZERO,
            acceleration: Vec3::ZERO,
            ..previous
        };
    }

    forces
}

/// Clamp position onto the bounds and bounce velocity off any wall that was hit
pub fn reflect_into(state: &mut MotionState, bounds: &Bounds, restitution: Vec2) {
    let factors = [restitution.x, restitution.y, restitution.x];
    for (axis, factor) in factors.into_iter().enumerate() {
        let value = state.position[axis];
        if value > bounds.max[axis] {
            state.position[axis] = bounds.max[axis];
            state.velocity[axis] *= factor;
        } else if value < bounds.min[axis] {
            state.position[axis] = bounds.min[axis];
            state.velocity[axis] *= factor;
        }
    }
}

fn update_orientation(state: &mut MotionState, dt: f32, profile: &MotionProfile) {
    if state.velocity.length() > MIN_HEADING_SPEED {
        let direction = state.velocity.normalize_or_zero();
        state.target_orientation = Orientation {
            pitch: -direction.y * profile.pitch_gain,
            yaw: direction.x.atan2(direction.z),
            roll: -state.acceleration.x * profile.roll_gain,
        };
    }

    let rates = profile.orientation_rates;
    let target = state.target_orientation;
    let current = &mut state.orientation;

    current.pitch += (target.pitch - current.pitch) * smoothing(rates.pitch, dt);
    current.roll += (target.roll - current.roll) * smoothing(rates.roll, dt);
    let yaw_error = wrap_angle(target.yaw - current.yaw);
    current.yaw = wrap_angle(current.yaw + yaw_error * smoothing(rates.yaw, dt));
}

/// Fraction of the remaining gap closed in `dt` at `rate` per second
#[must_use]
pub fn smoothing(rate: f32, dt: f32) -> f32 {
    1.0 - (-rate.max(0.0) * dt.max(0.0)).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn input(target: Vec3, player: Vec3) -> MotionInput {
        MotionInput {
            dt: DT,
            time: 0.0,
            agent_id: 0,
            target,
            player,
            effective_max_speed: 0.5,
            max_force: 0.6,
            speed_multiplier: 1.0,
            pulse: 0.0,
        }
    }

    #[test]
    fn test_moves_toward_target() {
        let profile = MotionProfile::fish();
        let mut state = MotionState::at(Vec3::ZERO);
        let target = Vec3::new(20.0, 0.0, 0.0);
        let far_player = Vec3::new(-100.0, 0.0, 0.0);

        for _ in 0..120 {
            integrate(&mut state, &input(target, far_player), &profile);
        }

        assert!(state.position.x > 1.0);
        assert!(state.velocity.x > 0.0);
    }

    #[test]
    fn test_speed_limit() {
        let profile = MotionProfile::fish();
        let mut state = MotionState::at(Vec3::ZERO);
        state.velocity = Vec3::new(10.0, 0.0, 0.0);

        integrate(&mut state, &input(Vec3::X * 30.0, Vec3::splat(100.0)), &profile);
        assert!(state.velocity.length() <= 0.5 + 1e-5);
    }

    #[test]
    fn test_avoidance_dominates_close_player() {
        let profile = MotionProfile::fish();
        let state = MotionState::at(Vec3::new(2.0, -3.0, 0.0));
        let player = Vec3::new(0.0, -3.0, 0.0);
        // Target on the far side of the player
        let forces = compute_forces(&state, &input(Vec3::new(-20.0, -3.0, 0.0), player), &profile);

        let away = (state.position - player).normalize();
        assert!(forces.avoid.linear.dot(away) > 0.0);
        assert!(forces.acceleration.dot(away) > 0.0);
    }

    #[test]
    fn test_jellyfish_avoidance_dominates_close_player() {
        let profile = MotionProfile::jellyfish();
        let state = MotionState::at(Vec3::new(2.0, -5.0, 0.0));
        let player = Vec3::new(0.0, -5.0, 0.0);
        let target = Vec3::new(-20.0, -5.0, 0.0);
        let away = (state.position - player).normalize();

        let forces = compute_forces(&state, &input(target, player), &profile);
        assert!(forces.avoid.linear.dot(away) > 0.0);
        assert!(forces.acceleration.dot(away) > 0.0);

        // Resting at the slowest speed, across the whole jitter cycle
        for agent_id in 0..8 {
            for step in 0..100 {
                let resting = MotionInput {
                    time: step as f32 * 0.5,
                    agent_id,
                    effective_max_speed: 0.036,
                    max_force: 0.3,
                    ..input(target, player)
                };
                let forces = compute_forces(&state, &resting, &profile);
                assert!(forces.avoid.linear.dot(away) > 0.0);
                assert!(forces.acceleration.dot(away) > 0.0, "id {agent_id} t {}", resting.time);
            }
        }
    }

    #[test]
    fn test_target_is_clamped_into_bounds() {
        let profile = MotionProfile::fish();
        let state = MotionState::at(Vec3::new(30.0, -3.0, 0.0));
        let forces = compute_forces(&state, &input(Vec3::new(80.0, -3.0, 0.0), Vec3::splat(100.0)), &profile);

        // Target is clamped to x = 33, so we still seek outward but only a little
        assert!(forces.seek.linear.x > 0.0);
        let stopped = MotionState::at(Vec3::new(33.0, -3.0, 0.0));
        let forces = compute_forces(&stopped, &input(Vec3::new(80.0, -3.0, 0.0), Vec3::splat(100.0)), &profile);
        assert_eq!(forces.seek, SteeringOutput::ZERO);
    }

    #[test]
    fn test_hard_bounds_reflect() {
        let profile = MotionProfile::jellyfish();
        let mut state = MotionState::at(Vec3::new(29.99, -3.0, 0.0));
        state.velocity = Vec3::new(0.4, 0.0, 0.0);

        let mut step = input(Vec3::new(29.0, -3.0, 0.0), Vec3::splat(100.0));
        step.effective_max_speed = 0.4;
        step.dt = 0.1;
        integrate(&mut state, &step, &profile);

        assert!(state.position.x <= 30.0);
        assert!(state.velocity.x <= 0.0);
    }

    #[test]
    fn test_orientation_follows_heading() {
        let profile = MotionProfile::fish();
        let mut state = MotionState::at(Vec3::ZERO);
        let far_player = Vec3::splat(100.0);

        for _ in 0..600 {
            integrate(&mut state, &input(Vec3::new(0.0, 0.0, 30.0), far_player), &profile);
        }

        // Heading +Z => yaw 0
        assert!(state.orientation.yaw.abs() < 0.15);
    }

    #[test]
    fn test_orientation_wraps_shortest_way() {
        let profile = MotionProfile::fish();
        let mut state = MotionState::at(Vec3::ZERO);
        state.orientation.yaw = 3.1;
        state.target_orientation.yaw = -3.1;

        update_orientation(&mut state, DT, &profile);

        // Crossing +PI, not sweeping back through zero
        assert!(state.orientation.yaw.abs() > 3.09);
    }

    #[test]
    fn test_non_finite_input_rolls_back() {
        let profile = MotionProfile::fish();
        let start = Vec3::new(1.0, -2.0, 3.0);
        let mut state = MotionState::at(start);

        integrate(&mut state, &input(Vec3::ZERO, Vec3::splat(f32::NAN)), &profile);

        assert_eq!(state.position, start);
        assert_eq!(state.velocity, Vec3::ZERO);
    }

    #[test]
    fn test_jitter_is_deterministic() {
        let profile = MotionProfile::fish();
        assert_eq!(jitter(12.5, 4, &profile), jitter(12.5, 4, &profile));
        assert_ne!(jitter(12.5, 4, &profile), jitter(12.5, 5, &profile));
        assert!(jitter(12.5, 4, &profile).length() <= profile.jitter_strength * 1.51);
    }

    #[test]
    fn test_smoothing() {
        assert_eq!(smoothing(3.0, 0.0), 0.0);
        assert!((smoothing(3.0, 100.0) - 1.0).abs() < 1e-6);
        assert!(smoothing(3.0, DT) > smoothing(2.0, DT));
    }
}
