//! Race - Race setup, tick ordering and results
//!
//! Owns every car in the race and advances them together: AI decisions,
//! terrain and jumps, physics, lap tracking, then collisions.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::race_sim::ai::{AiDriver, AiTuning};
use crate::race_sim::collision::resolve_collisions;
use crate::race_sim::config::RaceConfig;
use crate::race_sim::error::RaceError;
use crate::race_sim::physics::PhysicsIntegrator;
use crate::race_sim::progress::{ProgressEvent, RaceProgressTracker};
use crate::race_sim::track::{apply_jump_contacts, Course, TrackLayout, TrackQuery};
use crate::race_sim::vehicle::{Controls, PhysicsTuning, VehicleSnapshot, VehicleState};

/// Race status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RaceStatus {
    NotStarted,
    Racing,
    Finished,
}

/// Final standing of one car
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceResult {
    pub vehicle_id: u32,
    pub name: String,
    pub is_ai: bool,
    pub position: u32,
    /// Sum of lap times, `None` if the car did not finish
    pub total_time: Option<f32>,
    pub best_lap: Option<f32>,
    pub lap_times: Vec<f32>,
}

impl RaceResult {
    fn new(vehicle: &VehicleState, position: u32) -> Self {
        Self {
            vehicle_id: vehicle.id,
            name: vehicle.name.clone(),
            is_ai: vehicle.is_ai(),
            position,
            total_time: vehicle
                .progress
                .race_finished
                .then(|| vehicle.progress.total_time()),
            best_lap: vehicle.progress.best_lap(),
            lap_times: vehicle.progress.lap_times.clone(),
        }
    }
}

/// Complete race state
#[derive(Debug, Clone)]
pub struct Race<T = TrackLayout> {
    /// Race configuration
    pub config: RaceConfig,
    /// Current race status
    pub status: RaceStatus,
    /// Every car, human first when present
    pub vehicles: Vec<VehicleState>,
    /// Elapsed race time (seconds)
    pub elapsed_time: f32,
    /// Finish order
    pub finish_order: Vec<RaceResult>,
    /// Seed the AI tuning was drawn from
    pub seed: u64,
    track: T,
}

impl Race<TrackLayout> {
    /// Create a race on the layout from its own configuration
    pub fn new(config: RaceConfig) -> Self {
        let track = config.track.clone();
        Self::with_track(config, track)
    }
}

impl<T: TrackQuery> Race<T> {
    /// Brake held by a human car once it has finished
    const HUMAN_FINISHED_BRAKE: f32 = 0.2;

    /// Create a race against any terrain source
    pub fn with_track(config: RaceConfig, track: T) -> Self {
        let seed = config.seed.unwrap_or_else(rand::random);
        let mut race = Self {
            config,
            status: RaceStatus::NotStarted,
            vehicles: Vec::new(),
            elapsed_time: 0.0,
            finish_order: Vec::new(),
            seed,
            track,
        };
        race.generate_vehicles();
        race.setup_starting_positions();

        log::info!(
            "race ready: {} cars, {} laps, {} AI, seed {}",
            race.vehicles.len(),
            race.config.total_laps,
            race.config.difficulty,
            seed
        );
        race
    }

    /// Build the entrants: the human (if any) then AI opponents
    fn generate_vehicles(&mut self) {
        self.vehicles.clear();
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let sim = &self.config.sim;
        let base = PhysicsTuning::from_setup(self.config.setup, sim);

        if self.config.include_human {
            self.vehicles.push(VehicleState::new(0, "Player".into(), base, None, sim));
        }

        for i in 0..self.config.opponents {
            let id = self.vehicles.len() as u32;
            let tuning = base.with_ai_variation(&mut rng, sim);
            let ai = AiTuning::for_difficulty(self.config.difficulty, &mut rng);
            log::debug!("AI {} tuning {:?}", i + 1, ai);
            self.vehicles
                .push(VehicleState::new(id, format!("AI {}", i + 1), tuning, Some(ai), sim));
        }
    }

    /// Put every car on the grid with fresh race progress
    pub fn setup_starting_positions(&mut self) {
        let course = &self.config.course;
        let sim = &self.config.sim;
        let mut ai_index = 0;

        for vehicle in &mut self.vehicles {
            let start = if vehicle.is_ai() {
                let slot = course.grid_position(ai_index, vehicle.tuning.collision_radius);
                ai_index += 1;
                slot
            } else {
                course.grid_origin
            };
            vehicle.reset(start, course.start_heading, self.config.total_laps, sim);
        }
    }

    /// Begin racing; ticks before this do nothing
    pub fn start(&mut self) {
        if self.status == RaceStatus::NotStarted {
            self.status = RaceStatus::Racing;
            log::info!("race started");
        }
    }

    /// Back to the grid with the same entrants
    pub fn restart(&mut self) {
        self.setup_starting_positions();
        self.status = RaceStatus::NotStarted;
        self.elapsed_time = 0.0;
        self.finish_order.clear();
    }

    pub fn course(&self) -> &Course {
        &self.config.course
    }

    /// Set the controls of a human car
    pub fn set_controls(&mut self, id: u32, controls: Controls) -> Result<(), RaceError> {
        let vehicle = self
            .vehicles
            .iter_mut()
            .find(|v| v.id == id)
            .ok_or(RaceError::UnknownVehicle(id))?;
        if vehicle.is_ai() {
            log::warn!("ignoring controls for AI car {}", id);
            return Err(RaceError::NotHuman(id));
        }
        vehicle.set_controls(controls);
        Ok(())
    }

    /// Advance the race by `dt` seconds, clamped to `max_dt`.
    ///
    /// Returns the progress events of this tick, tagged with the car id.
    pub fn tick(&mut self, dt: f32) -> Vec<(u32, ProgressEvent)> {
        let mut events = Vec::new();
        if self.status == RaceStatus::NotStarted {
            return events;
        }
        let dt = dt.min(self.config.max_dt);
        if !(dt > 0.0) {
            return events;
        }

        self.elapsed_time += dt;
        let now = self.elapsed_time;
        let course = &self.config.course;
        let sim = &self.config.sim;

        // Controls
        for vehicle in &mut self.vehicles {
            if vehicle.is_ai() {
                let controls = AiDriver::decide(vehicle, course, sim);
                vehicle.set_controls(controls);
            } else if vehicle.progress.race_finished {
                vehicle.set_controls(Controls::coast(Self::HUMAN_FINISHED_BRAKE));
            }
        }

        // Terrain and jumps
        for vehicle in &mut self.vehicles {
            vehicle.surface = self.track.surface_at(vehicle.position);
            let contacts = self
                .track
                .jump_contacts(vehicle.position, vehicle.tuning.collision_radius);
            apply_jump_contacts(vehicle, &contacts, sim);
        }

        for vehicle in &mut self.vehicles {
            PhysicsIntegrator::advance(vehicle, dt, sim);
        }

        for vehicle in &mut self.vehicles {
            for event in RaceProgressTracker::update(vehicle, course, now, sim) {
                if let ProgressEvent::Finished { .. } = event {
                    let position = self.finish_order.len() as u32 + 1;
                    self.finish_order.push(RaceResult::new(vehicle, position));
                }
                events.push((vehicle.id, event));
            }
        }

        resolve_collisions(&mut self.vehicles, sim);

        if self.status == RaceStatus::Racing
            && !self.vehicles.is_empty()
            && self.vehicles.iter().all(|v| v.progress.race_finished)
        {
            self.status = RaceStatus::Finished;
            log::info!("race finished after {:.2}s", self.elapsed_time);
        }

        events
    }

    /// Standings: finishers in order, then everyone else by distance covered
    pub fn results(&self) -> Vec<RaceResult> {
        let mut results = self.finish_order.clone();

        let mut running: Vec<&VehicleState> = self
            .vehicles
            .iter()
            .filter(|v| !self.finish_order.iter().any(|r| r.vehicle_id == v.id))
            .collect();
        running.sort_by_key(|v| std::cmp::Reverse((v.progress.current_lap, v.progress.next_checkpoint_index)));

        for vehicle in running {
            let position = results.len() as u32 + 1;
            results.push(RaceResult::new(vehicle, position));
        }
        results
    }

    /// Get compact snapshot for the presentation layer
    pub fn get_snapshot(&self) -> RaceSnapshot {
        RaceSnapshot {
            status: self.status,
            elapsed_time: self.elapsed_time,
            vehicles: self.vehicles.iter().map(VehicleSnapshot::from).collect(),
            finisher_count: self.finish_order.len() as u32,
        }
    }

    /// Car currently in first place
    pub fn get_leader(&self) -> Option<&VehicleState> {
        if let Some(first) = self.finish_order.first() {
            return self.get_vehicle(first.vehicle_id);
        }
        self.vehicles
            .iter()
            .max_by_key(|v| (v.progress.current_lap, v.progress.next_checkpoint_index))
    }

    /// Get vehicle by ID
    pub fn get_vehicle(&self, id: u32) -> Option<&VehicleState> {
        self.vehicles.iter().find(|v| v.id == id)
    }
}

/// Compact race snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceSnapshot {
    pub status: RaceStatus,
    pub elapsed_time: f32,
    pub vehicles: Vec<VehicleSnapshot>,
    pub finisher_count: u32,
}
