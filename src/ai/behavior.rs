//! Behavior state machine for autonomous swimmers
//!
//! Every agent is always in exactly one coarse [`BehaviorState`]. The state
//! only changes when its dwell timer runs out, at which point a new state is
//! drawn uniformly from the full set (staying put is allowed) and the timer is
//! reset to a fresh random duration.
//!
//! A second, slower timer governs seasonal migration changes. It is expressed
//! as a pure transition on [`MigrationAssignment`] values rather than by
//! mutating pattern parameters in place.
//!
//! # Example
//!
//! ```ignore
//! let mut machine = BehaviorMachine::random(&mut rng, Span::new(8.0, 23.0));
//! if let Transition::To(state) = machine.update(dt, Span::new(8.0, 23.0), &mut rng) {
//!     log::debug!("now {}", state.name());
//! }
//! let speed = base_speed * table.get(machine.current_state()).speed;
//! ```

use std::fmt;

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::ai::migration::{MigrationPattern, PatternKind, choose_pattern};
use crate::core::Span;
use crate::creature::AgentKind;

// ============================================================================
// States
// ============================================================================

/// Coarse behavioral mode of an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BehaviorState {
    Resting,
    /// Drifting, for jellyfish
    #[default]
    Wandering,
    /// Pulsing, for jellyfish
    Exploring,
    Feeding,
    Migrating,
}

impl BehaviorState {
    /// Every state; transitions draw uniformly from this list
    pub const ALL: [BehaviorState; 5] = [
        BehaviorState::Wandering,
        BehaviorState::Resting,
        BehaviorState::Exploring,
        BehaviorState::Feeding,
        BehaviorState::Migrating,
    ];

    /// State name for debugging and logging.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            BehaviorState::Resting => "resting",
            BehaviorState::Wandering => "wandering",
            BehaviorState::Exploring => "exploring",
            BehaviorState::Feeding => "feeding",
            BehaviorState::Migrating => "migrating",
        }
    }

    /// Name as the species would describe it
    #[must_use]
    pub const fn label(self, kind: AgentKind) -> &'static str {
        match (kind, self) {
            (AgentKind::Jellyfish, BehaviorState::Wandering) => "drifting",
            (AgentKind::Jellyfish, BehaviorState::Exploring) => "pulsing",
            _ => self.name(),
        }
    }

    /// Position in [`BehaviorState::ALL`]
    #[must_use]
    pub fn index(self) -> usize {
        BehaviorState::ALL
            .iter()
            .position(|state| *state == self)
            .unwrap_or_default()
    }

    /// Draw a state uniformly
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        BehaviorState::ALL[rng.gen_range(0..BehaviorState::ALL.len())]
    }
}

impl fmt::Display for BehaviorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a state scales movement and animation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Multipliers {
    /// Applied to the base max speed
    pub speed: f32,
    /// Applied to procedural animation amplitude
    pub animation: f32,
}

impl Multipliers {
    #[must_use]
    pub const fn new(speed: f32, animation: f32) -> Self {
        Self { speed, animation }
    }
}

/// Per-state multipliers for one species
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateTable {
    pub resting: Multipliers,
    pub wandering: Multipliers,
    pub exploring: Multipliers,
    pub feeding: Multipliers,
    pub migrating: Multipliers,
}

impl StateTable {
    /// Fish: lazy when resting, fastest when migrating
    pub const FISH: Self = Self {
        resting: Multipliers::new(0.4, 0.2),
        wandering: Multipliers::new(1.0, 0.7),
        exploring: Multipliers::new(1.5, 1.0),
        feeding: Multipliers::new(0.6, 0.7),
        migrating: Multipliers::new(1.8, 1.2),
    };

    /// Jellyfish: slower at rest, bigger bursts when pulsing and migrating
    pub const JELLYFISH: Self = Self {
        resting: Multipliers::new(0.3, 0.3),
        wandering: Multipliers::new(1.0, 0.8),
        exploring: Multipliers::new(1.8, 1.3),
        feeding: Multipliers::new(0.6, 0.7),
        migrating: Multipliers::new(2.2, 1.1),
    };

    #[must_use]
    pub const fn get(&self, state: BehaviorState) -> Multipliers {
        match state {
            BehaviorState::Resting => self.resting,
            BehaviorState::Wandering => self.wandering,
            BehaviorState::Exploring => self.exploring,
            BehaviorState::Feeding => self.feeding,
            BehaviorState::Migrating => self.migrating,
        }
    }

    /// Largest speed multiplier over all states
    #[must_use]
    pub fn peak_speed(&self) -> f32 {
        BehaviorState::ALL
            .iter()
            .map(|state| self.get(*state).speed)
            .fold(0.0, f32::max)
    }

    /// Every multiplier is finite and positive
    #[must_use]
    pub fn is_valid(&self) -> bool {
        BehaviorState::ALL.iter().all(|state| {
            let m = self.get(*state);
            m.speed.is_finite() && m.speed > 0.0 && m.animation.is_finite() && m.animation >= 0.0
        })
    }
}

// ============================================================================
// Transition
// ============================================================================

/// Result of advancing the machine by one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Dwell timer still running
    None,
    /// Timer expired; the new state (possibly the same one)
    To(BehaviorState),
}

// ============================================================================
// State Machine
// ============================================================================

/// Current state plus the seconds left before the next re-roll
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BehaviorMachine {
    current: BehaviorState,
    dwell: f32,
}

impl BehaviorMachine {
    /// Create a machine in `state` with `dwell` seconds remaining
    #[must_use]
    pub fn new(state: BehaviorState, dwell: f32) -> Self {
        Self {
            current: state,
            dwell: dwell.max(0.0),
        }
    }

    /// Random initial state and dwell
    pub fn random<R: Rng + ?Sized>(rng: &mut R, initial_dwell: Span) -> Self {
        let state = BehaviorState::random(rng);
        Self::new(state, initial_dwell.sample(rng))
    }

    /// Count down the dwell timer and re-roll the state on expiry.
    pub fn update<R: Rng + ?Sized>(&mut self, dt: f32, dwell_range: Span, rng: &mut R) -> Transition {
        self.dwell -= dt.max(0.0);
        if self.dwell > 0.0 {
            return Transition::None;
        }

        self.current = BehaviorState::random(rng);
        self.dwell = dwell_range.sample(rng).max(0.0);
        Transition::To(self.current)
    }

    /// Force a state with a fresh dwell time
    pub fn transition(&mut self, state: BehaviorState, dwell: f32) {
        self.current = state;
        self.dwell = dwell.max(0.0);
    }

    /// Overwrite the remaining dwell time
    pub fn set_dwell(&mut self, dwell: f32) {
        self.dwell = dwell.max(0.0);
    }

    #[must_use]
    pub const fn current_state(&self) -> BehaviorState {
        self.current
    }

    /// Get the name of the current state.
    #[must_use]
    pub const fn current_state_name(&self) -> &'static str {
        self.current.name()
    }

    /// Check if the machine is in the given state.
    #[must_use]
    pub fn is_in_state(&self, state: BehaviorState) -> bool {
        self.current == state
    }

    /// Seconds before the next re-roll
    #[must_use]
    pub const fn dwell_remaining(&self) -> f32 {
        self.dwell
    }
}

// ============================================================================
// Seasonal pattern switching
// ============================================================================

/// Knobs for seasonal pattern changes of one species
#[derive(Debug, Clone, Copy)]
pub struct SwitchRules<'a> {
    /// Timer reset range
    pub interval: Span,
    /// Probability of switching when the timer expires
    pub chance: f32,
    /// Patterns a switch may pick from
    pub pool: &'a [PatternKind],
    pub species: AgentKind,
}

/// An agent's migration pattern and the countdown to its next possible change
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationAssignment {
    pub pattern: MigrationPattern,
    /// Seconds until the next switch roll
    pub switch_timer: f32,
}

impl MigrationAssignment {
    #[must_use]
    pub fn new(pattern: MigrationPattern, switch_timer: f32) -> Self {
        Self {
            pattern,
            switch_timer: switch_timer.max(0.0),
        }
    }

    /// Advance the seasonal timer.
    ///
    /// On expiry the timer is reset and, with probability `rules.chance`, a
    /// new pattern is drawn from the pool with freshly generated parameters
    /// around `anchor`. Returns the next assignment and whether the pattern was
    /// replaced.
    pub fn advance<R: Rng + ?Sized>(
        &self,
        dt: f32,
        anchor: Vec3,
        rules: &SwitchRules<'_>,
        rng: &mut R,
    ) -> (Self, bool) {
        let remaining = self.switch_timer - dt.max(0.0);
        if remaining > 0.0 {
            return (Self::new(self.pattern.clone(), remaining), false);
        }

        let next_timer = rules.interval.sample(rng);
        if rng.gen_bool(f64::from(rules.chance.clamp(0.0, 1.0))) {
            let kind = choose_pattern(rules.pool, rng);
            let pattern = MigrationPattern::generate(kind, anchor, rules.species, rng);
            (Self::new(pattern, next_timer), true)
        } else {
            (Self::new(self.pattern.clone(), next_timer), false)
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const FISH_DWELL: Span = Span::new(8.0, 23.0);

    #[test]
    fn test_machine_initial_state() {
        let machine = BehaviorMachine::new(BehaviorState::Resting, 5.0);
        assert_eq!(machine.current_state_name(), "resting");
        assert!(machine.is_in_state(BehaviorState::Resting));
    }

    #[test]
    fn test_no_transition_while_dwelling() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut machine = BehaviorMachine::new(BehaviorState::Feeding, 5.0);

        assert_eq!(machine.update(1.0, FISH_DWELL, &mut rng), Transition::None);
        assert!((machine.dwell_remaining() - 4.0).abs() < 1e-6);
        assert!(machine.is_in_state(BehaviorState::Feeding));
    }

    #[test]
    fn test_expired_dwell_rerolls() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut seen = [false; 5];

        for _ in 0..500 {
            let mut machine = BehaviorMachine::new(BehaviorState::Wandering, 10.0);
            machine.set_dwell(0.0);

            let Transition::To(state) = machine.update(0.0, FISH_DWELL, &mut rng) else {
                panic!("expired dwell must transition");
            };
            assert_eq!(state, machine.current_state());
            assert!(FISH_DWELL.contains(machine.dwell_remaining()));
            seen[state.index()] = true;
        }

        // Uniform draws over the full set, self-transition included
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn test_dwell_never_negative() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut machine = BehaviorMachine::random(&mut rng, FISH_DWELL);

        for _ in 0..10_000 {
            machine.update(0.25, FISH_DWELL, &mut rng);
            assert!(machine.dwell_remaining() >= 0.0);
        }
    }

    #[test]
    fn test_forced_transition() {
        let mut machine = BehaviorMachine::new(BehaviorState::Resting, 5.0);
        machine.transition(BehaviorState::Migrating, -3.0);

        assert_eq!(machine.current_state(), BehaviorState::Migrating);
        assert_eq!(machine.dwell_remaining(), 0.0);
    }

    #[test]
    fn test_state_tables() {
        assert!(StateTable::FISH.is_valid());
        assert!(StateTable::JELLYFISH.is_valid());
        assert!((StateTable::FISH.peak_speed() - 1.8).abs() < 1e-6);
        assert!((StateTable::JELLYFISH.get(BehaviorState::Resting).speed - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_jellyfish_labels() {
        assert_eq!(BehaviorState::Wandering.label(AgentKind::Jellyfish), "drifting");
        assert_eq!(BehaviorState::Exploring.label(AgentKind::Jellyfish), "pulsing");
        assert_eq!(BehaviorState::Exploring.label(AgentKind::Fish), "exploring");
    }

    #[test]
    fn test_assignment_counts_down() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let rules = SwitchRules {
            interval: Span::new(45.0, 105.0),
            chance: 1.0,
            pool: &[PatternKind::Circular],
            species: AgentKind::Fish,
        };
        let assignment = MigrationAssignment::new(MigrationPattern::default(), 10.0);

        let (next, switched) = assignment.advance(4.0, Vec3::ZERO, &rules, &mut rng);
        assert!(!switched);
        assert_eq!(next.pattern, assignment.pattern);
        assert!((next.switch_timer - 6.0).abs() < 1e-6);
    }

    #[test]
    fn test_assignment_switches_on_expiry() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let rules = SwitchRules {
            interval: Span::new(45.0, 105.0),
            chance: 1.0,
            pool: &[PatternKind::TidalDrift],
            species: AgentKind::Jellyfish,
        };
        let assignment = MigrationAssignment::new(MigrationPattern::default(), 0.5);

        let (next, switched) = assignment.advance(1.0, Vec3::ZERO, &rules, &mut rng);
        assert!(switched);
        assert_eq!(next.pattern.kind(), PatternKind::TidalDrift);
        assert!(rules.interval.contains(next.switch_timer));
        // The previous value is untouched
        assert_eq!(assignment.pattern.kind(), PatternKind::RandomWander);
    }

    #[test]
    fn test_assignment_zero_chance_keeps_pattern() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let rules = SwitchRules {
            interval: Span::new(45.0, 105.0),
            chance: 0.0,
            pool: &PatternKind::ALL,
            species: AgentKind::Fish,
        };
        let assignment = MigrationAssignment::new(MigrationPattern::default(), 0.0);

        let (next, switched) = assignment.advance(0.016, Vec3::ZERO, &rules, &mut rng);
        assert!(!switched);
        assert_eq!(next.pattern, assignment.pattern);
        assert!(rules.interval.contains(next.switch_timer));
    }
}
