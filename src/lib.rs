//! Rally Racer - Race simulation core
//!
//! Provides the race simulation and a headless runner for driving a whole
//! race without a frontend.

pub mod race_sim;

use race_sim::race::{Race, RaceResult, RaceStatus};
use race_sim::RaceConfig;
use serde::{Deserialize, Serialize};

/// Outcome of a headless race
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceReport {
    /// Seed the AI field was drawn from, for replaying the same race
    pub seed: u64,
    pub status: RaceStatus,
    pub elapsed_time: f32,
    pub ticks: u64,
    pub results: Vec<RaceResult>,
}

/// Run a race at a fixed timestep until every car finishes or
/// `max_seconds` of race time have passed
pub fn run_race(config: RaceConfig, dt: f32, max_seconds: f32) -> RaceReport {
    if config.include_human {
        log::warn!("headless race includes a human car; it will sit on the grid");
    }

    let mut race = Race::new(config);
    race.start();

    let mut ticks = 0;
    while race.status == RaceStatus::Racing && race.elapsed_time < max_seconds {
        let before = race.elapsed_time;
        race.tick(dt);
        if race.elapsed_time <= before {
            log::warn!("timestep {} does not advance the race, stopping", dt);
            break;
        }
        ticks += 1;
    }

    if race.status != RaceStatus::Finished {
        log::info!(
            "stopped after {:.1}s with {} of {} cars finished",
            race.elapsed_time,
            race.finish_order.len(),
            race.vehicles.len()
        );
    }

    RaceReport {
        seed: race.seed,
        status: race.status,
        elapsed_time: race.elapsed_time,
        ticks,
        results: race.results(),
    }
}
