//! Vehicle - Per-car state, tuning and race data
//!
//! Each car has kinematics, control inputs, surface/jump flags, physical
//! tuning and race progress. The race driver mutates these every tick.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::race_sim::ai::AiTuning;
use crate::race_sim::config::{SimConfig, VehicleSetup};
use crate::race_sim::geometry::{lerp, normalize_angle, Vec2};
use crate::race_sim::track::JumpSourceId;

/// Driver inputs for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Controls {
    /// 0..=1
    pub throttle: f32,
    /// 0..=1
    pub brake: f32,
    /// -1 (left) ..= 1 (right)
    pub steer: f32,
    /// 0..=1
    pub handbrake: f32,
}

impl Controls {
    /// Gentle coast-and-brake used once a car has finished
    pub fn coast(brake: f32) -> Self {
        Self {
            brake,
            ..Default::default()
        }
    }

    /// Clamp every input into its valid range; NaN becomes zero
    pub fn clamped(self) -> Self {
        let unit = |v: f32| if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) };
        Self {
            throttle: unit(self.throttle),
            brake: unit(self.brake),
            steer: if self.steer.is_nan() {
                0.0
            } else {
                self.steer.clamp(-1.0, 1.0)
            },
            handbrake: unit(self.handbrake),
        }
    }
}

/// Terrain under the car, set by the track each tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceFlags {
    pub on_road: bool,
    pub on_mud: bool,
    pub on_grass: bool,
}

/// Vehicle state flags
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct VehicleFlags {
    pub drifting: bool,
    pub handbraking: bool,
    pub airborne: bool,
}

/// Physical tuning, derived from `SimConfig` and a `VehicleSetup`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicsTuning {
    pub max_speed: f32,
    pub engine_power: f32,
    pub brake_power: f32,
    /// Per-second velocity retention
    pub base_friction: f32,
    pub drift_friction_mul: f32,
    pub handbrake_friction_mul: f32,
    pub handbrake_side_grip_loss: f32,
    pub drift_threshold_speed: f32,
    pub mass: f32,
    pub collision_radius: f32,
}

impl PhysicsTuning {
    /// Scale the base car by the setup's top speed and grip percentages
    pub fn from_setup(setup: VehicleSetup, cfg: &SimConfig) -> Self {
        let speed_scale = (setup.top_speed_percent / 100.0).max(0.0);
        let power_scale = speed_scale.powf(1.5);
        let grip = (setup.grip_percent / 100.0).clamp(0.5, 2.5);
        let t = (grip - 0.5) / 2.0;

        let max_speed = cfg.base_max_speed * speed_scale;
        Self {
            max_speed,
            engine_power: cfg.base_engine_power * power_scale,
            brake_power: cfg.base_brake_power * power_scale,
            base_friction: lerp(0.80, 0.98, t),
            drift_friction_mul: lerp(0.85, 0.99, t),
            handbrake_friction_mul: lerp(0.75, 0.97, t),
            handbrake_side_grip_loss: lerp(0.6, 0.98, t),
            drift_threshold_speed: max_speed * cfg.drift_threshold_speed_factor,
            mass: cfg.vehicle_mass,
            collision_radius: cfg.collision_radius,
        }
    }

    /// Small per-car spread so AI cars of the same setup differ
    pub fn with_ai_variation<R: Rng + ?Sized>(mut self, rng: &mut R, cfg: &SimConfig) -> Self {
        self.max_speed *= rng.gen_range(0.95..=1.05);
        self.engine_power *= rng.gen_range(0.93..=1.07);
        self.drift_threshold_speed = self.max_speed * cfg.drift_threshold_speed_factor;
        self
    }
}

/// Lap and checkpoint progress
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceProgress {
    pub race_started: bool,
    pub race_finished: bool,
    pub current_lap: u32,
    pub total_laps: u32,
    pub next_checkpoint_index: usize,
    pub lap_start_time: f32,
    pub lap_times: Vec<f32>,
    pub last_line_crossing_time: f32,
    /// Race clock when the final lap was completed
    pub finish_time: Option<f32>,
}

impl RaceProgress {
    pub fn new(total_laps: u32, debounce: f32) -> Self {
        Self {
            race_started: false,
            race_finished: false,
            current_lap: 0,
            total_laps,
            next_checkpoint_index: 0,
            lap_start_time: 0.0,
            lap_times: Vec::new(),
            last_line_crossing_time: -debounce,
            finish_time: None,
        }
    }

    pub fn best_lap(&self) -> Option<f32> {
        self.lap_times.iter().copied().reduce(f32::min)
    }

    pub fn total_time(&self) -> f32 {
        self.lap_times.iter().sum()
    }
}

/// Complete state for a single car
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleState {
    pub id: u32,
    /// Cosmetic identity tag
    pub name: String,

    pub position: Vec2,
    pub prev_position: Vec2,
    pub velocity: Vec2,
    /// Always `|velocity|` after an integration step
    pub speed: f32,
    /// Degrees in `[0, 360)`
    pub heading: f32,
    pub rpm: f32,

    pub controls: Controls,
    pub flags: VehicleFlags,
    /// Seconds of hang time left, only meaningful while airborne
    pub airborne_timer: f32,
    pub surface: SurfaceFlags,
    /// Last ramp or crest that launched this car
    pub last_jump_source: Option<JumpSourceId>,

    pub tuning: PhysicsTuning,
    /// Present only for AI-driven cars
    pub ai: Option<AiTuning>,
    pub progress: RaceProgress,
}

impl VehicleState {
    pub fn new(id: u32, name: String, tuning: PhysicsTuning, ai: Option<AiTuning>, cfg: &SimConfig) -> Self {
        Self {
            id,
            name,
            position: Vec2::zeros(),
            prev_position: Vec2::zeros(),
            velocity: Vec2::zeros(),
            speed: 0.0,
            heading: 180.0,
            rpm: cfg.idle_rpm,
            controls: Controls::default(),
            flags: VehicleFlags::default(),
            airborne_timer: 0.0,
            surface: SurfaceFlags::default(),
            last_jump_source: None,
            tuning,
            ai,
            progress: RaceProgress::new(0, cfg.line_crossing_debounce),
        }
    }

    pub fn is_ai(&self) -> bool {
        self.ai.is_some()
    }

    /// Reset to a start pose with zeroed dynamics and fresh race progress
    pub fn reset(&mut self, start: Vec2, heading: f32, total_laps: u32, cfg: &SimConfig) {
        self.position = start;
        self.prev_position = start;
        self.velocity = Vec2::zeros();
        self.speed = 0.0;
        self.heading = normalize_angle(heading);
        self.rpm = cfg.idle_rpm;
        self.controls = Controls::default();
        self.flags = VehicleFlags::default();
        self.airborne_timer = 0.0;
        self.surface = SurfaceFlags::default();
        self.last_jump_source = None;
        self.progress = RaceProgress::new(total_laps, cfg.line_crossing_debounce);
    }

    pub fn set_controls(&mut self, controls: Controls) {
        self.controls = controls.clamped();
    }

    pub fn sync_speed(&mut self) {
        self.speed = self.velocity.norm();
    }
}

/// Compact per-car state for the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleSnapshot {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub heading: f32,
    pub speed: f32,
    pub rpm: f32,
    pub airborne: bool,
    pub drifting: bool,
    pub handbraking: bool,
    pub on_mud: bool,
    pub current_lap: u32,
    pub next_checkpoint: usize,
    pub lap_times: Vec<f32>,
    pub started: bool,
    pub finished: bool,
}

impl From<&VehicleState> for VehicleSnapshot {
    fn from(state: &VehicleState) -> Self {
        Self {
            id: state.id,
            x: state.position.x,
            y: state.position.y,
            heading: state.heading,
            speed: state.speed,
            rpm: state.rpm,
            airborne: state.flags.airborne,
            drifting: state.flags.drifting,
            handbraking: state.flags.handbraking,
            on_mud: state.surface.on_mud,
            current_lap: state.progress.current_lap,
            next_checkpoint: state.progress.next_checkpoint_index,
            lap_times: state.progress.lap_times.clone(),
            started: state.progress.race_started,
            finished: state.progress.race_finished,
        }
    }
}
