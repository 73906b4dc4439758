//! Config - Immutable simulation constants and per-race configuration
//!
//! `SimConfig` holds every tuning constant the integrator, tracker and
//! resolver read. `RaceConfig` is what a race is set up from and can be
//! loaded from JSON; omitted fields fall back to their defaults.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::race_sim::ai::Difficulty;
use crate::race_sim::error::ConfigError;
use crate::race_sim::geometry::EPSILON;
use crate::race_sim::track::{Course, TrackLayout};

/// Friction/speed adjustment for one terrain class
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceModel {
    /// Multiplies the vehicle's per-second friction coefficient
    pub friction_mul: f32,
    /// Extra per-second speed retention, applied as `speed_damping^dt`
    pub speed_damping: f32,
}

impl SurfaceModel {
    pub const NEUTRAL: SurfaceModel = SurfaceModel {
        friction_mul: 1.0,
        speed_damping: 1.0,
    };
}

/// Simulation constants shared by every vehicle in a race
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    // Base car physics, scaled by `VehicleSetup`
    pub base_max_speed: f32,
    pub base_engine_power: f32,
    pub base_brake_power: f32,
    pub vehicle_mass: f32,
    pub collision_radius: f32,

    // Handling
    /// Degrees per second at full lock
    pub turn_rate: f32,
    pub min_turn_effectiveness: f32,
    pub airborne_turn_effectiveness: f32,
    pub handbrake_throttle_dampening: f32,
    /// Degrees between heading and velocity before a slide counts as a drift
    pub drift_threshold_angle: f32,
    /// Fraction of max speed below which the car never drifts
    pub drift_threshold_speed_factor: f32,
    pub friction_cap: f32,
    pub creep_speed: f32,

    // Terrain
    pub airborne_friction: f32,
    pub road: SurfaceModel,
    pub mud: SurfaceModel,
    pub grass: SurfaceModel,

    // Engine
    pub idle_rpm: f32,
    pub max_rpm: f32,
    /// Per 60 Hz frame
    pub rpm_smoothing: f32,

    // Jumps
    pub min_jump_speed_factor: f32,
    pub base_airborne_duration: f32,
    pub max_airborne_duration: f32,

    // Race rules
    pub checkpoint_rounding_radius: f32,
    pub line_crossing_debounce: f32,
    pub restitution: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            base_max_speed: 350.0,
            base_engine_power: 150.0,
            base_brake_power: 150.0,
            vehicle_mass: 1.0,
            collision_radius: 18.0,

            turn_rate: 150.0,
            min_turn_effectiveness: 0.4,
            airborne_turn_effectiveness: 0.05,
            handbrake_throttle_dampening: 0.8,
            drift_threshold_angle: 35.0,
            drift_threshold_speed_factor: 0.25,
            friction_cap: 0.999,
            creep_speed: 0.5,

            airborne_friction: 0.99,
            road: SurfaceModel {
                friction_mul: 1.03,
                speed_damping: 1.0,
            },
            mud: SurfaceModel {
                friction_mul: 0.85,
                speed_damping: 0.7,
            },
            grass: SurfaceModel {
                friction_mul: 0.97,
                speed_damping: 0.92,
            },

            idle_rpm: 800.0,
            max_rpm: 7000.0,
            rpm_smoothing: 0.15,

            min_jump_speed_factor: 0.3,
            base_airborne_duration: 0.25,
            max_airborne_duration: 0.5,

            checkpoint_rounding_radius: 75.0,
            line_crossing_debounce: 1.0,
            restitution: 0.6,
        }
    }
}

/// Player-facing car setup, in percent of the base car
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleSetup {
    pub top_speed_percent: f32,
    pub grip_percent: f32,
}

impl Default for VehicleSetup {
    fn default() -> Self {
        Self {
            top_speed_percent: 100.0,
            grip_percent: 100.0,
        }
    }
}

/// Race configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RaceConfig {
    /// Laps needed to finish
    pub total_laps: u32,
    /// Number of AI opponents
    pub opponents: u32,
    /// Whether a human-controlled car takes the first grid slot
    pub include_human: bool,
    pub difficulty: Difficulty,
    /// Seed for AI tuning; `None` draws one from the OS
    pub seed: Option<u64>,
    /// Upper bound on a single tick's timestep (seconds)
    pub max_dt: f32,
    pub setup: VehicleSetup,
    pub course: Course,
    pub track: TrackLayout,
    pub sim: SimConfig,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            total_laps: 3,
            opponents: 3,
            include_human: true,
            difficulty: Difficulty::Medium,
            seed: None,
            max_dt: 0.1,
            setup: VehicleSetup::default(),
            course: Course::default(),
            track: TrackLayout::default(),
            sim: SimConfig::default(),
        }
    }
}

impl RaceConfig {
    const MAX_CHECKPOINTS: usize = 64;

    /// Parse and validate a JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: RaceConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.total_laps == 0 {
            return Err(ConfigError::Invalid("total_laps must be at least 1".into()));
        }
        if !(self.max_dt > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "max_dt must be positive, got {}",
                self.max_dt
            )));
        }
        if !(self.setup.top_speed_percent > 0.0) || !(self.setup.grip_percent > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "setup percentages must be positive, got speed {} grip {}",
                self.setup.top_speed_percent, self.setup.grip_percent
            )));
        }
        let (a, b) = self.course.start_line;
        if (b - a).norm_squared() <= EPSILON {
            return Err(ConfigError::Invalid("start/finish line has zero length".into()));
        }
        if self.course.checkpoints.len() > Self::MAX_CHECKPOINTS {
            return Err(ConfigError::Invalid(format!(
                "course has {} checkpoints, at most {} allowed",
                self.course.checkpoints.len(),
                Self::MAX_CHECKPOINTS
            )));
        }
        if self.sim.line_crossing_debounce < 0.0 {
            return Err(ConfigError::Invalid("line_crossing_debounce must not be negative".into()));
        }
        Ok(())
    }
}
