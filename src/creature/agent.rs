//! A single autonomous swimmer

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::components::{AgentKind, Appearance, JellyVariety};
use super::motion::{MotionInput, MotionState, integrate};
use super::pose::AgentPose;
use crate::ai::{
    BehaviorMachine, MigrationAssignment, MigrationPattern, PatternContext, StateTable, Transition,
    WanderState, choose_pattern, evaluate_target, random_phase, wander_extent,
};
use crate::animation::{SwimAnimator, SwimStyle, glow_pulse};
use crate::core::SpeciesConfig;

/// One fish or jellyfish with all of its per-agent state
#[derive(Debug, Clone)]
pub struct Agent {
    /// Dense index in population order
    pub id: u32,
    pub kind: AgentKind,
    pub motion: MotionState,
    pub appearance: Appearance,
    /// Spawn position; patterns default their centers to it
    pub anchor: Vec3,
    pub migration: MigrationAssignment,
    pub behavior: BehaviorMachine,
    pub wander: WanderState,
    /// Desynchronizes agents sharing a pattern
    pub migration_phase: f32,
    /// Base max speed before the state multiplier
    pub max_speed: f32,
    pub max_force: f32,
    pub animator: SwimAnimator,
    rng: ChaCha8Rng,
}

impl Agent {
    /// Create an agent at `anchor`, drawing every random attribute from `rng`
    pub fn new(id: u32, kind: AgentKind, anchor: Vec3, config: &SpeciesConfig, mut rng: ChaCha8Rng) -> Self {
        let variety = match kind {
            AgentKind::Fish => None,
            AgentKind::Jellyfish => Some(JellyVariety::random(&mut rng)),
        };

        let speed_factor = variety.map_or(1.0, JellyVariety::speed_factor);
        let max_speed = config.motion.max_speed.sample(&mut rng) * speed_factor;
        let max_force = config.motion.max_force.sample(&mut rng);

        let spawn = &config.spawn;
        let appearance = Appearance {
            scale: Vec3::new(
                spawn.scale.sample(&mut rng),
                spawn.scale.sample(&mut rng),
                spawn.scale.sample(&mut rng),
            ),
            palette_index: if spawn.palette_size == 0 {
                0
            } else {
                rng.gen_range(0..spawn.palette_size)
            },
            variety,
            glow_intensity: if variety.is_some_and(JellyVariety::glows) {
                spawn.glow.sample(&mut rng)
            } else {
                0.0
            },
        };

        let pattern_kind = choose_pattern(&config.patterns, &mut rng);
        let pattern = MigrationPattern::generate(pattern_kind, anchor, kind, &mut rng);
        let migration = MigrationAssignment::new(pattern, config.initial_switch.sample(&mut rng));
        let behavior = BehaviorMachine::random(&mut rng, config.initial_dwell);
        let wander = WanderState::new(
            anchor,
            Self::wander_box(&migration.pattern, config),
            config.initial_wander,
            &mut rng,
        );

        let style = match variety {
            Some(variety) => SwimStyle::Jellyfish {
                pulse_speed: variety.pulse_speed().sample(&mut rng),
            },
            None => SwimStyle::Fish,
        };
        let animator = SwimAnimator::new(style, random_phase(&mut rng), random_phase(&mut rng));

        Self {
            id,
            kind,
            motion: MotionState::at(anchor),
            appearance,
            anchor,
            migration,
            behavior,
            wander,
            migration_phase: random_phase(&mut rng),
            max_speed,
            max_force,
            animator,
            rng,
        }
    }

    /// Create an agent whose stream is seeded from `seed`
    pub fn with_seed(id: u32, kind: AgentKind, anchor: Vec3, config: &SpeciesConfig, seed: u64) -> Self {
        Self::new(id, kind, anchor, config, ChaCha8Rng::seed_from_u64(seed))
    }

    /// Base max speed scaled by the current state's multiplier
    #[must_use]
    pub fn effective_max_speed(&self, states: &StateTable) -> f32 {
        self.max_speed * states.get(self.behavior.current_state()).speed
    }

    /// Inputs for evaluating the current migration pattern
    #[must_use]
    pub fn pattern_context(&self) -> PatternContext {
        PatternContext {
            wander_target: self.wander.target,
            ..PatternContext::new(self.anchor, self.migration_phase, self.id)
        }
    }

    /// Where the migration pattern is currently leading
    #[must_use]
    pub fn migration_target(&self, time: f32) -> Vec3 {
        evaluate_target(time, &self.migration.pattern, &self.pattern_context())
    }

    /// Advance the agent by `dt` seconds.
    ///
    /// Runs the behavior machine, the seasonal pattern switch, the wander
    /// re-roll, motion integration and animation, in that order.
    pub fn step(&mut self, dt: f32, time: f32, player: Vec3, config: &SpeciesConfig) -> AgentPose {
        if let Transition::To(state) = self.behavior.update(dt, config.dwell, &mut self.rng) {
            log::debug!("{} {} is now {}", self.kind, self.id, state.label(self.kind));
        }

        let rules = config.switch_rules(self.kind);
        let (migration, switched) = self.migration.advance(dt, self.anchor, &rules, &mut self.rng);
        if switched {
            log::debug!(
                "{} {} switched migration {} -> {}",
                self.kind,
                self.id,
                self.migration.pattern.kind(),
                migration.pattern.kind()
            );
        }
        self.migration = migration;

        if let MigrationPattern::RandomWander(params) = &self.migration.pattern {
            let extent = wander_extent(params, config.wander_range, config.wander_vertical_range);
            if switched {
                self.wander
                    .reroll(self.motion.position, extent, config.wander_interval, &mut self.rng);
            } else {
                self.wander
                    .update(dt, self.motion.position, extent, config.wander_interval, &mut self.rng);
            }
        }

        let multipliers = config.states.get(self.behavior.current_state());
        let input = MotionInput {
            dt,
            time,
            agent_id: self.id,
            target: self.migration_target(time),
            player,
            effective_max_speed: self.max_speed * multipliers.speed,
            max_force: self.max_force,
            speed_multiplier: multipliers.speed,
            pulse: self.animator.pulse(),
        };
        integrate(&mut self.motion, &input, &config.motion);

        let animation = self.animator.update(
            dt,
            time,
            self.id,
            self.motion.velocity.length(),
            multipliers.animation,
        );

        AgentPose {
            id: self.id,
            kind: self.kind,
            position: self.motion.position,
            orientation: self.motion.orientation,
            animation,
            glow: self.glow(time),
        }
    }

    /// Current emissive strength
    #[must_use]
    pub fn glow(&self, time: f32) -> f32 {
        match self.appearance.variety {
            Some(variety) if variety.glows() => glow_pulse(time, self.id, self.appearance.glow_intensity),
            _ => 0.0,
        }
    }

    fn wander_box(pattern: &MigrationPattern, config: &SpeciesConfig) -> Vec3 {
        match pattern {
            MigrationPattern::RandomWander(params) => {
                wander_extent(params, config.wander_range, config.wander_vertical_range)
            }
            _ => wander_extent(&Default::default(), config.wander_range, config.wander_vertical_range),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{BehaviorState, PatternKind};

    #[test]
    fn test_new_agent_is_well_formed() {
        let config = SpeciesConfig::jellyfish();
        let agent = Agent::with_seed(3, AgentKind::Jellyfish, Vec3::new(4.0, -3.0, 2.0), &config, 17);

        assert_eq!(agent.motion.position, agent.anchor);
        assert_eq!(agent.motion.velocity, Vec3::ZERO);
        assert!(agent.appearance.variety.is_some());
        assert!(config.patterns.contains(&agent.migration.pattern.kind()));
        assert!(config.initial_switch.contains(agent.migration.switch_timer));
        assert!(config.initial_dwell.contains(agent.behavior.dwell_remaining()));
        assert!(matches!(agent.animator.style(), SwimStyle::Jellyfish { .. }));

        let factor = agent.appearance.variety.map_or(1.0, JellyVariety::speed_factor);
        assert!(agent.max_speed <= config.motion.max_speed.max * factor + 1e-6);
    }

    #[test]
    fn test_only_glowing_varieties_glow() {
        let config = SpeciesConfig::jellyfish();
        for seed in 0..32 {
            let agent = Agent::with_seed(0, AgentKind::Jellyfish, Vec3::ZERO, &config, seed);
            let glows = agent.appearance.variety.is_some_and(JellyVariety::glows);
            assert_eq!(agent.glow(1.0) > 0.0, glows);
        }

        let fish = Agent::with_seed(0, AgentKind::Fish, Vec3::ZERO, &SpeciesConfig::fish(), 1);
        assert_eq!(fish.glow(1.0), 0.0);
        assert_eq!(fish.appearance.variety, None);
    }

    #[test]
    fn test_effective_speed_follows_state() {
        let config = SpeciesConfig::fish();
        let mut agent = Agent::with_seed(0, AgentKind::Fish, Vec3::ZERO, &config, 5);

        agent.behavior.transition(BehaviorState::Resting, 10.0);
        let resting = agent.effective_max_speed(&config.states);
        agent.behavior.transition(BehaviorState::Migrating, 10.0);
        let migrating = agent.effective_max_speed(&config.states);

        assert!((resting - agent.max_speed * 0.4).abs() < 1e-6);
        assert!((migrating - agent.max_speed * 1.8).abs() < 1e-6);
    }

    #[test]
    fn test_step_respects_speed_limit() {
        let config = SpeciesConfig::fish();
        let mut agent = Agent::with_seed(1, AgentKind::Fish, Vec3::new(10.0, -4.0, 5.0), &config, 99);
        let player = Vec3::new(9.0, -4.0, 5.0);

        for i in 0..2_000 {
            let pose = agent.step(1.0 / 60.0, i as f32 / 60.0, player, &config);
            assert_eq!(pose.position, agent.motion.position);
            assert!(agent.motion.velocity.length() <= agent.effective_max_speed(&config.states) + 1e-5);
            assert!(agent.behavior.dwell_remaining() >= 0.0);
            assert!(agent.migration.switch_timer >= 0.0);
        }
    }

    #[test]
    fn test_switch_to_wander_rerolls_target() {
        let mut config = SpeciesConfig::fish();
        config.patterns = vec![PatternKind::RandomWander];
        config.switch_chance = 1.0;

        let mut agent = Agent::with_seed(0, AgentKind::Fish, Vec3::ZERO, &config, 31);
        agent.migration = MigrationAssignment::new(MigrationPattern::with_defaults(PatternKind::Circular), 0.0);
        agent.wander = WanderState {
            target: Vec3::splat(1000.0),
            timer: 20.0,
        };
        let position = Vec3::new(5.0, -4.0, 5.0);
        agent.motion.position = position;

        agent.step(1.0 / 60.0, 0.0, Vec3::splat(100.0), &config);

        assert_eq!(agent.migration.pattern.kind(), PatternKind::RandomWander);
        let offset = (agent.wander.target - position).abs();
        assert!(offset.cmple(Vec3::new(10.0, 4.0, 10.0) + Vec3::splat(1e-4)).all());
        assert!(config.wander_interval.contains(agent.wander.timer));
    }

    #[test]
    fn test_same_seed_same_agent() {
        let config = SpeciesConfig::fish();
        let mut a = Agent::with_seed(2, AgentKind::Fish, Vec3::ONE, &config, 1234);
        let mut b = Agent::with_seed(2, AgentKind::Fish, Vec3::ONE, &config, 1234);

        for i in 0..300 {
            let t = i as f32 * 0.05;
            assert_eq!(a.step(0.05, t, Vec3::ZERO, &config), b.step(0.05, t, Vec3::ZERO, &config));
        }
    }
}
