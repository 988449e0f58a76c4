//! Steering primitives for autonomous swimmers
//!
//! Stateless force functions. Callers sum the results; there is no priority
//! arbitration between forces.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Output from a steering primitive
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SteeringOutput {
    /// Linear force
    pub linear: Vec3,
}

impl SteeringOutput {
    /// Zero steering
    pub const ZERO: Self = Self { linear: Vec3::ZERO };

    /// Wrap a raw force vector
    #[must_use]
    pub const fn new(linear: Vec3) -> Self {
        Self { linear }
    }

    /// Combine with another steering output
    #[must_use]
    pub fn combine(self, other: Self) -> Self {
        Self {
            linear: self.linear + other.linear,
        }
    }

    /// Scale the output
    #[must_use]
    pub fn scale(self, factor: f32) -> Self {
        Self {
            linear: self.linear * factor,
        }
    }

    /// Limit the force magnitude
    #[must_use]
    pub fn clamp_length(self, max: f32) -> Self {
        Self {
            linear: self.linear.clamp_length_max(max.max(0.0)),
        }
    }

    /// Force magnitude
    #[must_use]
    pub fn magnitude(&self) -> f32 {
        self.linear.length()
    }
}

/// Axis-aligned volume an agent should stay inside
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    /// Symmetric horizontal extent with an explicit vertical range
    #[must_use]
    pub const fn horizontal(half_extent: f32, min_y: f32, max_y: f32) -> Self {
        Self {
            min: Vec3::new(-half_extent, min_y, -half_extent),
            max: Vec3::new(half_extent, max_y, half_extent),
        }
    }

    /// Whether a point lies inside (inclusive), widened by `tolerance`
    #[must_use]
    pub fn contains(&self, point: Vec3, tolerance: f32) -> bool {
        point.cmpge(self.min - Vec3::splat(tolerance)).all()
            && point.cmple(self.max + Vec3::splat(tolerance)).all()
    }

    /// Clamp a point into the volume
    #[must_use]
    pub fn clamp(&self, point: Vec3) -> Vec3 {
        point.clamp(self.min, self.max)
    }

    /// Shrink the volume on every side; collapses to the center if too thin
    #[must_use]
    pub fn inset(&self, amount: Vec3) -> Self {
        let center = (self.min + self.max) * 0.5;
        Self {
            min: (self.min + amount).min(center),
            max: (self.max - amount).max(center),
        }
    }

    /// Whether min <= max on every axis and all coordinates are finite
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min.cmple(self.max).all()
    }
}

/// Steer toward `target`.
///
/// Returns zero inside `arrival_tolerance` so an agent sitting on its goal
/// does not jitter.
#[must_use]
pub fn seek(
    position: Vec3,
    velocity: Vec3,
    target: Vec3,
    max_speed: f32,
    max_force: f32,
    arrival_tolerance: f32,
) -> SteeringOutput {
    let to_target = target - position;
    if to_target.length() <= arrival_tolerance {
        return SteeringOutput::ZERO;
    }

    let desired = to_target.normalize_or_zero() * max_speed;
    SteeringOutput::new(desired - velocity).clamp_length(max_force)
}

/// Steer away from `threat` while it is closer than `radius`.
///
/// Urgency grows with the square of proximity. When the agent sits exactly on
/// the threat it escapes upward.
#[must_use]
pub fn avoid(
    position: Vec3,
    velocity: Vec3,
    threat: Vec3,
    radius: f32,
    strength: f32,
    max_speed: f32,
    max_force: f32,
) -> SteeringOutput {
    let away = position - threat;
    let distance = away.length();
    if radius <= 0.0 || distance >= radius {
        return SteeringOutput::ZERO;
    }

    let proximity = ((radius - distance) / radius).powi(2);
    let direction = away.try_normalize().unwrap_or(Vec3::Y);
    let desired = direction * max_speed * strength * proximity;
    SteeringOutput::new(desired - velocity).clamp_length(max_force)
}

/// Push back toward the inside of `bounds`.
///
/// Zero inside; outside, each axis grows quadratically with the overshoot
/// measured in units of that axis' `margin`.
#[must_use]
pub fn boundary_repel(position: Vec3, bounds: &Bounds, margin: Vec3, strength: f32) -> SteeringOutput {
    let axis = |value: f32, min: f32, max: f32, margin: f32| -> f32 {
        if margin <= 0.0 {
            return 0.0;
        }
        if value > max {
            -((value - max) / margin).powi(2) * strength
        } else if value < min {
            ((min - value) / margin).powi(2) * strength
        } else {
            0.0
        }
    };

    SteeringOutput::new(Vec3::new(
        axis(position.x, bounds.min.x, bounds.max.x, margin.x),
        axis(position.y, bounds.min.y, bounds.max.y, margin.y),
        axis(position.z, bounds.min.z, bounds.max.z, margin.z),
    ))
}
