//! Race Simulation Module
//!
//! Vehicle dynamics, AI drivers, lap tracking and car-to-car collisions for
//! a top-down rally race. Pure simulation: no rendering, input or audio.

pub mod ai;
pub mod collision;
pub mod config;
pub mod error;
pub mod geometry;
pub mod physics;
pub mod progress;
pub mod race;
pub mod track;
pub mod vehicle;

pub use ai::{AiDriver, AiTuning, Difficulty};
pub use config::{RaceConfig, SimConfig, VehicleSetup};
pub use error::{ConfigError, RaceError};
pub use physics::PhysicsIntegrator;
pub use progress::{ProgressEvent, RaceProgressTracker};
pub use race::{Race, RaceResult, RaceSnapshot, RaceStatus};
pub use track::{Course, TrackLayout, TrackQuery};
pub use vehicle::{Controls, VehicleSnapshot, VehicleState};
