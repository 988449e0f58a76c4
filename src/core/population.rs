//! Population manager
//!
//! Owns every agent, spawns them once at startup and advances them each tick.
//! Agents never interact with each other; the only shared input is the player
//! position, which they read but never modify. That makes the per-agent update
//! order irrelevant and lets [`Population::tick_parallel`] split the work
//! across threads without changing the result.

use std::f32::consts::TAU;

use glam::{Vec2, Vec3, Vec3Swizzles};
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::config::SimulationConfig;
use super::debug::PopulationStats;
use super::error::ConfigError;
use super::span::Span;
use crate::creature::{Agent, AgentKind, AgentPose};

/// Where and how a species is placed at startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnPolicy {
    /// Inner radius of the spawn ring
    pub min_radius: f32,
    /// Outer radius of the spawn ring
    pub max_radius: f32,
    /// Random extra angle added to each agent's slot on the ring
    pub angle_jitter: f32,
    /// Full width of the per-axis horizontal scatter
    pub scatter: f32,
    /// Nothing spawns closer than this to the world origin
    pub exclusion_radius: f32,
    /// Spawn height range
    pub depth: Span,
    /// Per-axis body scale range
    pub scale: Span,
    /// Glow intensity range for glowing varieties
    pub glow: Span,
    /// Number of renderer palette entries to pick from
    pub palette_size: u32,
}

impl SpawnPolicy {
    #[must_use]
    pub fn fish() -> Self {
        Self {
            min_radius: 8.0,
            max_radius: 30.0,
            angle_jitter: 0.5,
            scatter: 12.0,
            exclusion_radius: 6.0,
            depth: Span::new(-8.0, -1.0),
            scale: Span::new(0.7, 1.5),
            glow: Span::fixed(0.0),
            palette_size: 18,
        }
    }

    #[must_use]
    pub fn jellyfish() -> Self {
        Self {
            min_radius: 6.0,
            max_radius: 26.0,
            angle_jitter: 0.8,
            scatter: 10.0,
            exclusion_radius: 5.0,
            depth: Span::new(-6.0, -1.0),
            scale: Span::new(0.6, 1.6),
            glow: Span::new(0.6, 1.6),
            palette_size: 4,
        }
    }

    /// Spawn position of agent `index` out of `count`
    pub fn position<R: Rng + ?Sized>(&self, index: usize, count: usize, rng: &mut R) -> Vec3 {
        let slot = index as f32 / count.max(1) as f32 * TAU;
        let angle = slot + Span::new(0.0, self.angle_jitter).sample(rng);
        let distance = Span::new(self.min_radius, self.max_radius).sample(rng);
        let half = self.scatter * 0.5;

        let x = angle.cos() * distance + Span::new(-half, half).sample(rng);
        let z = angle.sin() * distance + Span::new(-half, half).sample(rng);
        let y = self.depth.sample(rng);

        let mut position = Vec3::new(x, y, z);
        let horizontal = position.xz();
        let radial = horizontal.length();
        if radial < self.exclusion_radius {
            let direction = horizontal
                .try_normalize()
                .unwrap_or_else(|| Vec2::from_angle(angle));
            let pushed = direction * self.exclusion_radius;
            position.x = pushed.x;
            position.z = pushed.y;
        }
        position
    }

    /// Check ring and range values
    ///
    /// # Errors
    ///
    /// Returns the first offending field
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ring = Span::new(self.min_radius, self.max_radius);
        if !ring.is_valid() || ring.min < 0.0 {
            return Err(ConfigError::invalid(
                "spawn.radius",
                format!("[{}, {}] is not a valid ring", ring.min, ring.max),
            ));
        }
        for (field, value) in [
            ("spawn.angle_jitter", self.angle_jitter),
            ("spawn.scatter", self.scatter),
            ("spawn.exclusion_radius", self.exclusion_radius),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::invalid(field, format!("{value} must be finite and non-negative")));
            }
        }
        for (field, span) in [
            ("spawn.depth", self.depth),
            ("spawn.scale", self.scale),
            ("spawn.glow", self.glow),
        ] {
            if !span.is_valid() {
                return Err(ConfigError::invalid(
                    field,
                    format!("[{}, {}] is inverted or not finite", span.min, span.max),
                ));
            }
        }
        Ok(())
    }
}

/// All agents of a simulation run
#[derive(Debug, Clone)]
pub struct Population {
    config: SimulationConfig,
    agents: Vec<Agent>,
    poses: Vec<AgentPose>,
    rng: ChaCha8Rng,
}

impl Population {
    /// Validate `config` and spawn every species
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid
    pub fn initialize(config: &SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut population = Self {
            config: config.clone(),
            agents: Vec::with_capacity(config.fish.count + config.jellyfish.count),
            poses: Vec::new(),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
        };
        population.spawn(AgentKind::Fish, config.fish.count);
        population.spawn(AgentKind::Jellyfish, config.jellyfish.count);

        log::info!(
            "Spawned {} fish and {} jellyfish (seed {})",
            config.fish.count,
            config.jellyfish.count,
            config.seed
        );
        Ok(population)
    }

    /// Add `count` agents of `kind` on the species' spawn ring
    pub fn spawn(&mut self, kind: AgentKind, count: usize) {
        let species = self.config.species(kind);
        let bounds = species.motion.bounds;

        for i in 0..count {
            let position = bounds.clamp(species.spawn.position(i, count, &mut self.rng));
            let id = self.agents.len() as u32;
            let rng = ChaCha8Rng::seed_from_u64(self.rng.next_u64());
            self.agents.push(Agent::new(id, kind, position, species, rng));
        }
    }

    /// Delta time actually applied for a raw frame delta
    #[must_use]
    pub fn clamp_delta(&self, dt: f32) -> f32 {
        if dt.is_nan() {
            0.0
        } else {
            dt.clamp(0.0, self.config.max_delta)
        }
    }

    /// Advance every agent in id order and return their poses
    pub fn tick(&mut self, dt: f32, time: f32, player: Vec3) -> &[AgentPose] {
        let dt = self.clamp_delta(dt);
        let config = &self.config;

        self.poses.clear();
        self.poses.extend(
            self.agents
                .iter_mut()
                .map(|agent| agent.step(dt, time, player, config.species(agent.kind))),
        );
        &self.poses
    }

    /// Same as [`Population::tick`], spread over the rayon thread pool
    pub fn tick_parallel(&mut self, dt: f32, time: f32, player: Vec3) -> &[AgentPose] {
        let dt = self.clamp_delta(dt);
        let config = &self.config;

        self.agents
            .par_iter_mut()
            .map(|agent| agent.step(dt, time, player, config.species(agent.kind)))
            .collect_into_vec(&mut self.poses);
        &self.poses
    }

    #[must_use]
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agents_mut(&mut self) -> &mut [Agent] {
        &mut self.agents
    }

    /// Poses produced by the last tick
    #[must_use]
    pub fn poses(&self) -> &[AgentPose] {
        &self.poses
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Snapshot of the population's current state
    #[must_use]
    pub fn stats(&self) -> PopulationStats {
        PopulationStats::collect(&self.agents, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn orbiting_player(time: f32) -> Vec3 {
        Vec3::new((time * 0.3).cos() * 12.0, -3.0, (time * 0.3).sin() * 12.0)
    }

    #[test]
    fn test_initialize_counts_and_ids() {
        let config = SimulationConfig::default().with_counts(5, 4);
        let population = Population::initialize(&config).unwrap();

        assert_eq!(population.len(), 9);
        for (i, agent) in population.agents().iter().enumerate() {
            assert_eq!(agent.id, i as u32);
            let expected = if i < 5 { AgentKind::Fish } else { AgentKind::Jellyfish };
            assert_eq!(agent.kind, expected);
        }
    }

    #[test]
    fn test_initialize_rejects_invalid_config() {
        let mut config = SimulationConfig::default();
        config.max_delta = 0.0;
        assert!(Population::initialize(&config).is_err());
    }

    #[test]
    fn test_spawn_outside_exclusion_radius() {
        let config = SimulationConfig::default().with_counts(200, 200).with_seed(21);
        let population = Population::initialize(&config).unwrap();

        for agent in population.agents() {
            let species = config.species(agent.kind);
            assert!(agent.anchor.xz().length() >= species.spawn.exclusion_radius - 1e-4);
            assert!(species.motion.bounds.contains(agent.anchor, 0.0));
            assert!(species.spawn.depth.contains(agent.anchor.y));
        }
    }

    #[test]
    fn test_exclusion_push_out() {
        let mut policy = SpawnPolicy::fish();
        policy.min_radius = 0.0;
        policy.max_radius = 0.0;
        policy.scatter = 0.0;
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let position = policy.position(0, 4, &mut rng);
        assert!((position.xz().length() - policy.exclusion_radius).abs() < 1e-4);
    }

    #[test]
    fn test_velocity_never_exceeds_effective_max() {
        let config = SimulationConfig::default().with_seed(3);
        let mut population = Population::initialize(&config).unwrap();

        for frame in 0..3_000 {
            let time = frame as f32 * DT;
            population.tick(DT, time, orbiting_player(time));

            for agent in population.agents() {
                let limit = agent.effective_max_speed(&config.species(agent.kind).states);
                assert!(agent.motion.velocity.length() <= limit + 1e-5);
            }
        }
    }

    #[test]
    fn test_deterministic_with_same_seed() {
        let config = SimulationConfig::default().with_seed(77);
        let mut a = Population::initialize(&config).unwrap();
        let mut b = Population::initialize(&config).unwrap();

        for frame in 0..600 {
            let time = frame as f32 * DT;
            let player = orbiting_player(time);
            assert_eq!(a.tick(DT, time, player), b.tick(DT, time, player));
        }
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let config = SimulationConfig::default().with_seed(8).with_counts(40, 40);
        let mut sequential = Population::initialize(&config).unwrap();
        let mut parallel = sequential.clone();

        for frame in 0..600 {
            let time = frame as f32 * DT;
            let player = orbiting_player(time);
            let expected = sequential.tick(DT, time, player).to_vec();
            assert_eq!(parallel.tick_parallel(DT, time, player), expected.as_slice());
        }
    }

    #[test]
    fn test_delta_is_clamped() {
        let config = SimulationConfig::default().with_seed(4);
        let mut spiked = Population::initialize(&config).unwrap();
        let mut capped = spiked.clone();
        let mut frozen = spiked.clone();
        let mut zero = spiked.clone();

        assert_eq!(spiked.tick(5.0, 1.0, Vec3::ZERO), capped.tick(config.max_delta, 1.0, Vec3::ZERO));
        assert_eq!(frozen.tick(f32::NAN, 1.0, Vec3::ZERO), zero.tick(0.0, 1.0, Vec3::ZERO));
        assert_eq!(spiked.clamp_delta(-1.0), 0.0);
    }

    #[test]
    fn test_out_of_bounds_agents_return() {
        let config = SimulationConfig::default().with_seed(12).with_counts(4, 4);
        let mut population = Population::initialize(&config).unwrap();
        let far_player = Vec3::new(0.0, 50.0, 0.0);

        for agent in population.agents_mut() {
            agent.motion.position = Vec3::new(60.0, -3.0, -45.0);
        }

        let mut time = 0.0;
        for frame in 0..10_000 {
            population.tick(DT, time, far_player);
            time += DT;

            if frame >= 8_000 {
                for agent in population.agents() {
                    let bounds = config.species(agent.kind).motion.bounds;
                    assert!(
                        bounds.contains(agent.motion.position, 1e-3),
                        "{} {} left bounds at {:?}",
                        agent.kind,
                        agent.id,
                        agent.motion.position
                    );
                }
            }
        }
    }

    #[test]
    fn test_stats_cover_population() {
        let config = SimulationConfig::default();
        let mut population = Population::initialize(&config).unwrap();
        population.tick(DT, 0.0, Vec3::ZERO);

        let stats = population.stats();
        assert_eq!(stats.agents, population.len());
        assert_eq!(stats.state_counts.iter().sum::<usize>(), population.len());
        assert_eq!(stats.pattern_counts.iter().sum::<usize>(), population.len());
    }
}
