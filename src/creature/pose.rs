//! Per-tick output handed to the renderer

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use super::components::{AgentKind, Orientation};
use crate::animation::AnimationChannels;

/// Everything the renderer needs to draw one agent for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentPose {
    pub id: u32,
    pub kind: AgentKind,
    pub position: Vec3,
    pub orientation: Orientation,
    pub animation: AnimationChannels,
    /// Emissive strength, zero for creatures that do not glow
    pub glow: f32,
}

/// GPU instance data for one agent
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PoseInstance {
    /// World position
    pub position: [f32; 3],
    /// Agent id
    pub id: u32,
    /// Rotation quaternion (xyzw)
    pub rotation: [f32; 4],
    /// Body, tail, fin, bob
    pub channels: [f32; 4],
    /// Emissive strength
    pub glow: f32,
    /// 0 = fish, 1 = jellyfish
    pub kind: u32,
    /// Padding
    _padding: [u32; 2],
}

impl From<&AgentPose> for PoseInstance {
    fn from(pose: &AgentPose) -> Self {
        Self {
            position: pose.position.to_array(),
            id: pose.id,
            rotation: pose.orientation.to_quat().to_array(),
            channels: pose.animation.to_array(),
            glow: pose.glow,
            kind: match pose.kind {
                AgentKind::Fish => 0,
                AgentKind::Jellyfish => 1,
            },
            _padding: [0; 2],
        }
    }
}

/// Convert a pose slice into an instance buffer
#[must_use]
pub fn pose_instances(poses: &[AgentPose]) -> Vec<PoseInstance> {
    poses.iter().map(PoseInstance::from).collect()
}
