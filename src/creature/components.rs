//! Common creature components

use std::f32::consts::{PI, TAU};
use std::fmt;

use glam::{EulerRot, Quat, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::Span;

/// Species of an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentKind {
    Fish,
    Jellyfish,
}

impl AgentKind {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            AgentKind::Fish => "fish",
            AgentKind::Jellyfish => "jellyfish",
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Jellyfish body type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JellyVariety {
    Moon,
    Crystal,
    Bioluminescent,
    Deep,
}

impl JellyVariety {
    pub const ALL: [JellyVariety; 4] = [
        JellyVariety::Moon,
        JellyVariety::Crystal,
        JellyVariety::Bioluminescent,
        JellyVariety::Deep,
    ];

    /// Multiplier on the species base max speed
    #[must_use]
    pub const fn speed_factor(self) -> f32 {
        match self {
            JellyVariety::Moon => 1.0,
            JellyVariety::Crystal => 1.2,
            JellyVariety::Bioluminescent => 0.7,
            JellyVariety::Deep => 0.5,
        }
    }

    /// Bell pulse rate range
    #[must_use]
    pub const fn pulse_speed(self) -> Span {
        match self {
            JellyVariety::Moon => Span::new(0.3, 0.45),
            JellyVariety::Crystal => Span::new(0.35, 0.53),
            JellyVariety::Bioluminescent => Span::new(0.25, 0.37),
            JellyVariety::Deep => Span::new(0.2, 0.3),
        }
    }

    /// Whether the bell emits light
    #[must_use]
    pub const fn glows(self) -> bool {
        matches!(self, JellyVariety::Bioluminescent | JellyVariety::Deep)
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        JellyVariety::ALL[rng.gen_range(0..JellyVariety::ALL.len())]
    }
}

/// Visual parameters; carried through to the renderer untouched
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Appearance {
    /// Per-axis body scale
    pub scale: Vec3,
    /// Index into the renderer's color palette
    pub palette_index: u32,
    /// Jellyfish only
    pub variety: Option<JellyVariety>,
    /// Emissive strength for glowing varieties
    pub glow_intensity: f32,
}

impl Default for Appearance {
    fn default() -> Self {
        Self {
            scale: Vec3::ONE,
            palette_index: 0,
            variety: None,
            glow_intensity: 0.0,
        }
    }
}

/// Smoothed body orientation in radians
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Orientation {
    /// Nose up/down
    pub pitch: f32,
    /// Heading around the vertical axis
    pub yaw: f32,
    /// Bank
    pub roll: f32,
}

impl Orientation {
    #[must_use]
    pub const fn new(pitch: f32, yaw: f32, roll: f32) -> Self {
        Self { pitch, yaw, roll }
    }

    /// Angles as `(pitch, yaw, roll)`
    #[must_use]
    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.pitch, self.yaw, self.roll)
    }

    /// Rotation quaternion, XYZ order like a three.js Euler
    #[must_use]
    pub fn to_quat(self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, self.pitch, self.yaw, self.roll)
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.pitch.is_finite() && self.yaw.is_finite() && self.roll.is_finite()
    }
}

/// Wrap an angle into `[-PI, PI]`
#[must_use]
pub fn wrap_angle(angle: f32) -> f32 {
    (angle + PI).rem_euclid(TAU) - PI
}
