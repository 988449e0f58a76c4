//! Headless demo: runs a population around an orbiting player and logs stats

use std::env;

use shoal::prelude::*;

const FRAME_DELTA: f32 = 1.0 / 60.0;
const STATS_INTERVAL: u64 = 600;

/// Player circling the origin at diver depth
fn player_position(time: f32) -> Vec3 {
    Vec3::new((time * 0.2).cos() * 10.0, -3.0, (time * 0.2).sin() * 10.0)
}

fn run() -> Result<(), ConfigError> {
    let mut args = env::args().skip(1);

    let config = match args.next() {
        Some(path) => {
            log::info!("Loading config from {path}");
            SimulationConfig::load(&path)?
        }
        None => SimulationConfig::default(),
    };
    let ticks = match args.next() {
        Some(value) => value
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidValue {
                field: "ticks",
                reason: e.to_string(),
            })?,
        None => 3_600,
    };

    let mut population = Population::initialize(&config)?;
    let mut clock = SimClock::new(config.max_delta);

    while clock.frame_count() < ticks {
        let dt = clock.advance(FRAME_DELTA);
        let time = clock.elapsed_seconds();
        population.tick_parallel(dt, time, player_position(time));

        if clock.frame_count() % STATS_INTERVAL == 0 {
            log::info!("t={time:.1}s {}", population.stats().format_stats());
        }
    }

    let instances: Vec<PoseInstance> = population.poses().iter().map(PoseInstance::from).collect();
    log::info!(
        "Finished {} ticks, {} bytes of instance data",
        clock.frame_count(),
        bytemuck::cast_slice::<PoseInstance, u8>(&instances).len()
    );
    Ok(())
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Simulation error: {}", e);
    }
}
