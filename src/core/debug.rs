//! Debug and statistics module

use std::fmt::Write as _;

use crate::ai::{BehaviorState, PatternKind};
use crate::core::SimulationConfig;
use crate::creature::Agent;

/// Snapshot of what the population is doing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PopulationStats {
    /// Number of agents
    pub agents: usize,
    /// Mean of `|velocity| / effective max speed`
    pub mean_speed_ratio: f32,
    /// Largest `|velocity| / effective max speed`
    pub peak_speed_ratio: f32,
    /// Agents per behavior state, indexed like [`BehaviorState::ALL`]
    pub state_counts: [usize; 5],
    /// Agents per migration pattern, indexed like [`PatternKind::ALL`]
    pub pattern_counts: [usize; 11],
    /// Agents currently outside their species' bounds
    pub out_of_bounds: usize,
}

impl PopulationStats {
    /// Gather statistics over `agents`
    #[must_use]
    pub fn collect(agents: &[Agent], config: &SimulationConfig) -> Self {
        let mut stats = Self {
            agents: agents.len(),
            ..Default::default()
        };
        let mut ratio_sum = 0.0;

        for agent in agents {
            let species = config.species(agent.kind);
            let limit = agent.effective_max_speed(&species.states);
            let ratio = if limit > 0.0 {
                agent.motion.velocity.length() / limit
            } else {
                0.0
            };

            ratio_sum += ratio;
            stats.peak_speed_ratio = stats.peak_speed_ratio.max(ratio);
            stats.state_counts[agent.behavior.current_state().index()] += 1;
            stats.pattern_counts[agent.migration.pattern.kind().index()] += 1;
            if !species.motion.bounds.contains(agent.motion.position, 0.0) {
                stats.out_of_bounds += 1;
            }
        }

        if !agents.is_empty() {
            stats.mean_speed_ratio = ratio_sum / agents.len() as f32;
        }
        stats
    }

    /// Agents in `state`
    #[must_use]
    pub fn in_state(&self, state: BehaviorState) -> usize {
        self.state_counts[state.index()]
    }

    /// Agents following `pattern`
    #[must_use]
    pub fn following(&self, pattern: PatternKind) -> usize {
        self.pattern_counts[pattern.index()]
    }

    /// Get a formatted stats string
    #[must_use]
    pub fn format_stats(&self) -> String {
        let mut line = format!(
            "Agents: {} | Speed: {:.0}% (peak {:.0}%) | Out of bounds: {}",
            self.agents,
            self.mean_speed_ratio * 100.0,
            self.peak_speed_ratio * 100.0,
            self.out_of_bounds
        );

        line.push_str(" | States:");
        for state in BehaviorState::ALL {
            let _ = write!(line, " {}={}", state.name(), self.in_state(state));
        }
        line.push_str(" | Patterns:");
        for pattern in PatternKind::ALL {
            let count = self.following(pattern);
            if count > 0 {
                let _ = write!(line, " {pattern}={count}");
            }
        }
        line
    }
}
