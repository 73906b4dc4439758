//! Progress - Lap, checkpoint and start/finish line tracking
//!
//! Runs after movement on each car's `(prev_position, position)` segment.
//! The same rules apply to human and AI cars.

use serde::{Deserialize, Serialize};

use crate::race_sim::config::SimConfig;
use crate::race_sim::geometry::segments_intersect;
use crate::race_sim::track::Course;
use crate::race_sim::vehicle::VehicleState;

/// Something that happened to a car's race this tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ProgressEvent {
    RaceStarted,
    CheckpointReached { index: usize },
    LapCompleted { lap: u32, lap_time: f32 },
    Finished { total_time: f32 },
}

/// Progress tracking logic
pub struct RaceProgressTracker;

impl RaceProgressTracker {
    /// Squared distance a car must move in one tick for a line crossing to count
    const MIN_MOVEMENT_SQ: f32 = 0.1;

    /// Evaluate checkpoint arrival and line crossing for one car at race time `now`
    pub fn update(state: &mut VehicleState, course: &Course, now: f32, cfg: &SimConfig) -> Vec<ProgressEvent> {
        let mut events = Vec::new();
        if state.progress.race_finished {
            return events;
        }

        Self::check_checkpoint(state, course, cfg, &mut events);

        if Self::crossed_line(state, course, now, cfg) {
            state.progress.last_line_crossing_time = now;
            Self::on_line_crossing(state, course, now, &mut events);
        }

        for event in &events {
            match event {
                ProgressEvent::RaceStarted => log::info!("car {} started at {:.2}s", state.id, now),
                ProgressEvent::CheckpointReached { index } => {
                    log::debug!("car {} reached checkpoint {}", state.id, index)
                }
                ProgressEvent::LapCompleted { lap, lap_time } => {
                    log::info!("car {} completed lap {} in {:.2}s", state.id, lap, lap_time)
                }
                ProgressEvent::Finished { total_time } => {
                    log::info!("car {} finished in {:.2}s", state.id, total_time)
                }
            }
        }
        events
    }

    fn check_checkpoint(state: &mut VehicleState, course: &Course, cfg: &SimConfig, events: &mut Vec<ProgressEvent>) {
        if !state.progress.race_started {
            return;
        }
        let index = state.progress.next_checkpoint_index;
        let Some(checkpoint) = course.checkpoint(index) else {
            return;
        };

        let radius = cfg.checkpoint_rounding_radius;
        if (checkpoint.position - state.position).norm_squared() < radius * radius {
            state.progress.next_checkpoint_index = index + 1;
            events.push(ProgressEvent::CheckpointReached { index });
        }
    }

    /// Whether this tick's movement crossed the start/finish line, outside the debounce window
    pub fn crossed_line(state: &VehicleState, course: &Course, now: f32, cfg: &SimConfig) -> bool {
        if now - state.progress.last_line_crossing_time < cfg.line_crossing_debounce {
            return false;
        }
        if (state.position - state.prev_position).norm_squared() <= Self::MIN_MOVEMENT_SQ {
            return false;
        }
        let (a, b) = course.start_line;
        segments_intersect(state.prev_position, state.position, a, b)
    }

    fn on_line_crossing(state: &mut VehicleState, course: &Course, now: f32, events: &mut Vec<ProgressEvent>) {
        let progress = &mut state.progress;

        if !progress.race_started {
            progress.race_started = true;
            progress.current_lap = 1;
            progress.next_checkpoint_index = 0;
            progress.lap_start_time = now;
            events.push(ProgressEvent::RaceStarted);
            return;
        }

        if progress.next_checkpoint_index < course.len() {
            // Lap not complete; only the debounce clock moves
            return;
        }

        let lap_time = now - progress.lap_start_time;
        progress.lap_times.push(lap_time);
        events.push(ProgressEvent::LapCompleted {
            lap: progress.current_lap,
            lap_time,
        });

        if progress.current_lap >= progress.total_laps {
            progress.race_finished = true;
            progress.finish_time = Some(now);
            events.push(ProgressEvent::Finished {
                total_time: progress.total_time(),
            });
        } else {
            progress.current_lap += 1;
            progress.next_checkpoint_index = 0;
            progress.lap_start_time = now;
        }
    }
}
