//! Procedural animation module
//!
//! Maps agent motion and behavior onto oscillators the renderer applies to body parts.

mod swim;

pub use swim::{AnimationChannels, SwimAnimator, SwimStyle, glow_pulse};
