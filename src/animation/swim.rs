//! Procedural swim animation
//!
//! Turns an agent's speed and behavior into a handful of oscillator values the
//! renderer applies to body parts. Phases accumulate per agent so that two
//! creatures moving identically still do not flap in lockstep.

use std::f32::consts::FRAC_PI_2;

use serde::{Deserialize, Serialize};

/// Secondary motion channels consumed by the renderer
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimationChannels {
    /// Body yaw wave (fish) or bell pulse (jellyfish)
    pub body_wave: f32,
    /// Tail yaw (fish) or tentacle sway (jellyfish)
    pub tail_wave: f32,
    /// Pectoral fin flap (fish) or tentacle contraction (jellyfish)
    pub fin_wave: f32,
    /// Vertical bob offset
    pub bob: f32,
}

impl AnimationChannels {
    /// Channels as `[body, tail, fin, bob]`
    #[must_use]
    pub const fn to_array(self) -> [f32; 4] {
        [self.body_wave, self.tail_wave, self.fin_wave, self.bob]
    }
}

/// Which rig the oscillators drive
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SwimStyle {
    /// Body wave with tail and fins, driven by speed
    Fish,
    /// Bell pulses with trailing tentacles
    Jellyfish {
        /// Bell pulse rate
        pulse_speed: f32,
    },
}

/// Per-agent oscillator state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwimAnimator {
    style: SwimStyle,
    /// Fish stroke phase or jellyfish bell phase
    phase: f32,
    /// Jellyfish only
    tentacle_phase: f32,
}

impl SwimAnimator {
    /// Create an animator with starting phases
    #[must_use]
    pub const fn new(style: SwimStyle, phase: f32, tentacle_phase: f32) -> Self {
        Self {
            style,
            phase,
            tentacle_phase,
        }
    }

    #[must_use]
    pub const fn style(&self) -> SwimStyle {
        self.style
    }

    #[must_use]
    pub const fn phase(&self) -> f32 {
        self.phase
    }

    /// Bell contraction signal in `[-1, 1]`; zero for fish
    #[must_use]
    pub fn pulse(&self) -> f32 {
        match self.style {
            SwimStyle::Fish => 0.0,
            SwimStyle::Jellyfish { .. } => self.phase.sin(),
        }
    }

    /// Advance the oscillators and sample every channel.
    ///
    /// `speed` is the agent's velocity magnitude, `intensity` the behavior
    /// state's animation multiplier.
    pub fn update(&mut self, dt: f32, time: f32, agent_id: u32, speed: f32, intensity: f32) -> AnimationChannels {
        let dt = dt.max(0.0);
        let id = agent_id as f32;
        let bob = (time * 1.2 + id * 0.5).sin() * 0.015 * intensity;

        match self.style {
            SwimStyle::Fish => {
                self.phase += dt * 1.2;
                let p = self.phase;
                let drive = speed * 8.0 * intensity;

                AnimationChannels {
                    body_wave: (p * 2.0).sin() * 0.05 * drive,
                    tail_wave: (p * 2.0 + FRAC_PI_2).sin() * 0.25 * drive,
                    fin_wave: (p * 3.0).sin() * 0.15 * drive,
                    bob,
                }
            }
            SwimStyle::Jellyfish { pulse_speed } => {
                self.phase += dt * pulse_speed * 0.4;
                let p = self.phase;
                self.tentacle_phase += dt * (0.2 + p.sin() * 0.1);

                AnimationChannels {
                    body_wave: p.sin() * 0.15 * intensity,
                    tail_wave: self.tentacle_phase.sin() * 0.08 * intensity,
                    fin_wave: (p + 0.2).sin() * 0.05 * intensity,
                    bob,
                }
            }
        }
    }
}

/// Emissive pulse of a glowing jellyfish
#[must_use]
pub fn glow_pulse(time: f32, agent_id: u32, glow_intensity: f32) -> f32 {
    ((time * 0.8 + agent_id as f32).sin() * 0.3 + 0.7) * glow_intensity
}
