//! Simulation configuration
//!
//! Every tuning constant of the engine lives here, grouped per species. A
//! configuration can be stored as RON or JSON and is validated before any
//! agent is spawned.

use std::fs;
use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::error::ConfigError;
use super::population::SpawnPolicy;
use super::span::Span;
use crate::ai::{PatternKind, StateTable, SwitchRules};
use crate::creature::{AgentKind, MotionProfile};

/// Tuning for one species
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesConfig {
    /// Number of agents spawned at initialization
    pub count: usize,
    pub spawn: SpawnPolicy,
    pub motion: MotionProfile,
    /// Speed and animation multipliers per behavior state
    pub states: StateTable,
    /// Migration patterns agents may be assigned
    pub patterns: Vec<PatternKind>,
    /// Probability of changing pattern when the switch timer expires
    pub switch_chance: f32,
    pub initial_dwell: Span,
    pub dwell: Span,
    pub initial_switch: Span,
    pub switch_interval: Span,
    pub initial_wander: Span,
    pub wander_interval: Span,
    /// Horizontal size of the wander re-roll box
    pub wander_range: f32,
    /// Vertical size of the wander re-roll box
    pub wander_vertical_range: f32,
}

impl SpeciesConfig {
    /// Default fish school
    #[must_use]
    pub fn fish() -> Self {
        Self {
            count: 12,
            spawn: SpawnPolicy::fish(),
            motion: MotionProfile::fish(),
            states: StateTable::FISH,
            patterns: vec![
                PatternKind::RandomWander,
                PatternKind::Circular,
                PatternKind::FigureEight,
                PatternKind::Vertical,
                PatternKind::SeasonalDrift,
                PatternKind::FeedingMigration,
                PatternKind::DeepShallowCycle,
            ],
            switch_chance: 0.1,
            initial_dwell: Span::new(8.0, 23.0),
            dwell: Span::new(8.0, 23.0),
            initial_switch: Span::new(0.0, 60.0),
            switch_interval: Span::new(45.0, 105.0),
            initial_wander: Span::new(8.0, 20.0),
            wander_interval: Span::new(8.0, 23.0),
            wander_range: 20.0,
            wander_vertical_range: 8.0,
        }
    }

    /// Default jellyfish bloom
    #[must_use]
    pub fn jellyfish() -> Self {
        Self {
            count: 10,
            spawn: SpawnPolicy::jellyfish(),
            motion: MotionProfile::jellyfish(),
            states: StateTable::JELLYFISH,
            patterns: vec![
                PatternKind::RandomWander,
                PatternKind::Vertical,
                PatternKind::Circular,
                PatternKind::GentleSway,
                PatternKind::DeepCurrent,
                PatternKind::FeedingMigration,
                PatternKind::ThermalLayers,
                PatternKind::TidalDrift,
            ],
            switch_chance: 0.15,
            initial_dwell: Span::new(15.0, 35.0),
            dwell: Span::new(12.0, 37.0),
            initial_switch: Span::new(0.0, 80.0),
            switch_interval: Span::new(60.0, 140.0),
            initial_wander: Span::new(10.0, 25.0),
            wander_interval: Span::new(10.0, 30.0),
            wander_range: 15.0,
            wander_vertical_range: 5.0,
        }
    }

    /// Seasonal switching rules for agents of `species`
    #[must_use]
    pub fn switch_rules(&self, species: AgentKind) -> SwitchRules<'_> {
        SwitchRules {
            interval: self.switch_interval,
            chance: self.switch_chance,
            pool: &self.patterns,
            species,
        }
    }

    /// Check every value against its allowed domain
    ///
    /// # Errors
    ///
    /// Returns the first offending field
    pub fn validate(&self) -> Result<(), ConfigError> {
        let motion = &self.motion;

        positive_span("max_speed", motion.max_speed)?;
        positive_span("max_force", motion.max_force)?;
        positive("agility", motion.agility)?;
        positive("position_scale", motion.position_scale)?;
        non_negative("seek_gain", motion.seek_gain)?;
        non_negative("arrival_tolerance", motion.arrival_tolerance)?;
        non_negative("avoid_radius", motion.avoid_radius)?;
        non_negative("avoid_strength", motion.avoid_strength)?;
        non_negative("boundary_strength", motion.boundary_strength)?;
        non_negative("vertical_seek_weight", motion.vertical_seek_weight)?;
        non_negative("avoid_force_scale", motion.avoid_force_scale)?;
        non_negative("jitter_strength", motion.jitter_strength)?;
        non_negative("pulse_strength", motion.pulse_strength)?;
        finite("pitch_gain", motion.pitch_gain)?;
        finite("roll_gain", motion.roll_gain)?;
        finite_vec3("jitter_frequency", motion.jitter_frequency)?;
        finite_vec3("jitter_id_phase", motion.jitter_id_phase)?;
        finite_vec3("jitter_weight", motion.jitter_weight)?;

        let rates = motion.orientation_rates;
        for value in [rates.pitch, rates.yaw, rates.roll] {
            non_negative("orientation_rates", value)?;
        }

        if !(motion.damping > 0.0 && motion.damping < 1.0) {
            return Err(ConfigError::invalid(
                "damping",
                format!("{} is outside (0, 1)", motion.damping),
            ));
        }
        if !motion.bounds.is_valid() {
            return Err(ConfigError::invalid("bounds", "min exceeds max or is not finite"));
        }
        if !motion.boundary_margin.is_finite() || motion.boundary_margin.min_element() <= 0.0 {
            return Err(ConfigError::invalid("boundary_margin", "must be positive on every axis"));
        }
        if !motion.target_inset.is_finite() || motion.target_inset.min_element() < 0.0 {
            return Err(ConfigError::invalid("target_inset", "must be non-negative on every axis"));
        }
        if !motion.restitution.is_finite() || motion.restitution.abs().max_element() > 1.0 {
            return Err(ConfigError::invalid("restitution", "factors must lie in [-1, 1]"));
        }
        if !self.states.is_valid() {
            return Err(ConfigError::invalid("states", "multipliers must be finite and positive"));
        }
        if !(0.0..=1.0).contains(&self.switch_chance) {
            return Err(ConfigError::invalid(
                "switch_chance",
                format!("{} is outside [0, 1]", self.switch_chance),
            ));
        }
        if self.patterns.is_empty() {
            return Err(ConfigError::invalid("patterns", "pool is empty"));
        }

        for (field, span) in [
            ("initial_dwell", self.initial_dwell),
            ("dwell", self.dwell),
            ("initial_switch", self.initial_switch),
            ("switch_interval", self.switch_interval),
            ("initial_wander", self.initial_wander),
            ("wander_interval", self.wander_interval),
        ] {
            if !span.is_valid() || span.min < 0.0 {
                return Err(ConfigError::invalid(
                    field,
                    format!("[{}, {}] is not a valid duration range", span.min, span.max),
                ));
            }
        }

        non_negative("wander_range", self.wander_range)?;
        non_negative("wander_vertical_range", self.wander_vertical_range)?;

        self.spawn.validate()
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("{value} must be finite and positive")))
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("{value} must be finite and non-negative")))
    }
}

fn finite(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("{value} is not finite")))
    }
}

fn finite_vec3(field: &'static str, value: Vec3) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("{value} is not finite")))
    }
}

fn positive_span(field: &'static str, span: Span) -> Result<(), ConfigError> {
    if !span.is_valid() {
        return Err(ConfigError::invalid(
            field,
            format!("[{}, {}] is inverted or not finite", span.min, span.max),
        ));
    }
    positive(field, span.min)
}

/// Top-level configuration of a simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Seed of the population RNG
    pub seed: u64,
    /// Upper bound on a single tick's delta time, in seconds
    pub max_delta: f32,
    pub fish: SpeciesConfig,
    pub jellyfish: SpeciesConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 0x5EA_F100,
            max_delta: 0.1,
            fish: SpeciesConfig::fish(),
            jellyfish: SpeciesConfig::jellyfish(),
        }
    }
}

impl SimulationConfig {
    /// Default configuration with the given seed
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the agent count of each species
    #[must_use]
    pub fn with_counts(mut self, fish: usize, jellyfish: usize) -> Self {
        self.fish.count = fish;
        self.jellyfish.count = jellyfish;
        self
    }

    /// Tuning of the given species
    #[must_use]
    pub fn species(&self, kind: AgentKind) -> &SpeciesConfig {
        match kind {
            AgentKind::Fish => &self.fish,
            AgentKind::Jellyfish => &self.jellyfish,
        }
    }

    /// Validate the whole configuration
    ///
    /// # Errors
    ///
    /// Returns the first value outside its allowed domain
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("max_delta", self.max_delta)?;
        self.fish.validate()?;
        self.jellyfish.validate()
    }

    /// Save the configuration to a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails
    pub fn save_ron(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let ron_string = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;
        fs::write(path, ron_string).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }

    /// Load and validate a configuration from a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated
    pub fn load_ron(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        let config: SimulationConfig =
            ron::from_str(&content).map_err(|e| ConfigError::DeserializeError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save the configuration to a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json_string = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;
        fs::write(path, json_string).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }

    /// Load and validate a configuration from a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        let config: SimulationConfig = serde_json::from_str(&content)
            .map_err(|e| ConfigError::DeserializeError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `.ron` or `.json`, chosen by file extension
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnsupportedFormat`] for any other extension
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("ron") => Self::load_ron(path),
            Some("json") => Self::load_json(path),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }
}
