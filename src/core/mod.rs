//! Core simulation module
//!
//! Contains the population manager, configuration and clock

mod config;
mod debug;
mod error;
mod population;
mod span;
mod time;

pub use config::{SimulationConfig, SpeciesConfig};
pub use debug::PopulationStats;
pub use error::ConfigError;
pub use population::{Population, SpawnPolicy};
pub use span::Span;
pub use time::SimClock;
