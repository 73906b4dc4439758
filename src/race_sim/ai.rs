//! AI - Difficulty presets and the waypoint-following driver
//!
//! AI cars steer at a target (the start line, the next checkpoint, then the
//! finish), ease off for sharp turns, brake when arriving fast and back off
//! in mud. Per-car tuning comes from a difficulty preset plus jitter so no
//! two opponents drive identically.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::race_sim::config::SimConfig;
use crate::race_sim::geometry::{angle_difference, bearing, Vec2};
use crate::race_sim::track::Course;
use crate::race_sim::vehicle::{Controls, VehicleState};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
    Random,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
            Difficulty::Random => "Random",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Difficulty::Easy => Difficulty::Medium,
            Difficulty::Medium => Difficulty::Hard,
            Difficulty::Hard => Difficulty::Random,
            Difficulty::Random => Difficulty::Easy,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Difficulty::Easy => Difficulty::Random,
            Difficulty::Medium => Difficulty::Easy,
            Difficulty::Hard => Difficulty::Medium,
            Difficulty::Random => Difficulty::Hard,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            "random" => Ok(Difficulty::Random),
            other => Err(format!("unknown difficulty '{other}'")),
        }
    }
}

/// Behavioural parameters for one AI driver
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AiTuning {
    /// Throttle held on straights
    pub throttle_control: f32,
    pub brake_factor: f32,
    pub steer_sharpness: f32,
    /// Scales how early a checkpoint counts as rounded
    pub lookahead_factor: f32,
    /// Degrees of heading error before easing off the throttle
    pub turn_threshold: f32,
    /// Throttle multiplier on mud
    pub mud_reaction: f32,
}

impl Default for AiTuning {
    fn default() -> Self {
        Self::BASE.scaled_medium()
    }
}

impl AiTuning {
    const BASE: AiTuning = AiTuning {
        throttle_control: 0.95,
        brake_factor: 0.8,
        steer_sharpness: 0.8,
        lookahead_factor: 1.5,
        turn_threshold: 20.0,
        mud_reaction: 0.5,
    };
    const RANDOM_STD_DEV_FACTOR: f32 = 0.25;
    const JITTER: f32 = 0.10;
    const TURN_JITTER: f32 = 7.0;

    fn scaled_medium(self) -> Self {
        Self {
            throttle_control: self.throttle_control * 0.90,
            brake_factor: self.brake_factor * 1.15,
            steer_sharpness: self.steer_sharpness * 0.85,
            lookahead_factor: self.lookahead_factor * 0.90,
            turn_threshold: self.turn_threshold + 8.0,
            mud_reaction: self.mud_reaction * 1.1,
        }
    }

    /// Preset for a difficulty, before per-car jitter
    pub fn preset<R: Rng + ?Sized>(difficulty: Difficulty, rng: &mut R) -> Self {
        match difficulty {
            Difficulty::Easy => Self {
                throttle_control: 0.78,
                brake_factor: 0.85,
                steer_sharpness: 0.45,
                lookahead_factor: 1.0,
                turn_threshold: 45.0,
                mud_reaction: 0.8,
            },
            Difficulty::Medium => Self::BASE.scaled_medium(),
            Difficulty::Hard => Self {
                throttle_control: 0.98,
                brake_factor: 0.9,
                steer_sharpness: 0.9,
                lookahead_factor: 1.8,
                turn_threshold: 15.0,
                mud_reaction: 0.4,
            },
            Difficulty::Random => {
                let base = Self::BASE;
                let mut gauss = |mean: f32, lo: f32, hi: f32| {
                    Normal::new(mean, mean * Self::RANDOM_STD_DEV_FACTOR)
                        .map(|n| n.sample(&mut *rng))
                        .unwrap_or(mean)
                        .clamp(lo, hi)
                };
                Self {
                    throttle_control: gauss(base.throttle_control, 0.65, 1.0),
                    brake_factor: gauss(base.brake_factor, 0.5, 1.2),
                    steer_sharpness: gauss(base.steer_sharpness, 0.4, 1.0),
                    mud_reaction: gauss(base.mud_reaction, 0.3, 0.9),
                    lookahead_factor: gauss(base.lookahead_factor, 0.9, 2.2),
                    turn_threshold: gauss(base.turn_threshold, 10.0, 50.0),
                }
            }
        }
    }

    /// Per-car spread applied on top of a preset
    pub fn jittered<R: Rng + ?Sized>(self, rng: &mut R) -> Self {
        let spread = 1.0 - Self::JITTER..=1.0 + Self::JITTER;
        Self {
            throttle_control: (self.throttle_control * rng.gen_range(spread.clone())).clamp(0.6, 1.0),
            brake_factor: (self.brake_factor * rng.gen_range(spread.clone())).clamp(0.4, 1.3),
            steer_sharpness: (self.steer_sharpness * rng.gen_range(spread.clone())).clamp(0.3, 1.0),
            lookahead_factor: (self.lookahead_factor * rng.gen_range(spread.clone())).clamp(0.8, 2.5),
            turn_threshold: (self.turn_threshold + rng.gen_range(-Self::TURN_JITTER..=Self::TURN_JITTER))
                .clamp(10.0, 55.0),
            mud_reaction: (self.mud_reaction * rng.gen_range(spread)).clamp(0.2, 0.95),
        }
    }

    /// Preset plus jitter, what each AI entrant is built with
    pub fn for_difficulty<R: Rng + ?Sized>(difficulty: Difficulty, rng: &mut R) -> Self {
        Self::preset(difficulty, rng).jittered(rng)
    }
}

/// Driving policy for AI cars
pub struct AiDriver;

impl AiDriver {
    /// Heading error (degrees) to steer input
    const STEER_GAIN: f32 = 0.05;
    const THROTTLE_EASE_START: f32 = 0.75;
    const MAX_THROTTLE_REDUCTION: f32 = 0.6;
    const BRAKE_LOOKAHEAD: f32 = 1.2;
    /// Below this speed the AI never brakes for a waypoint
    const MIN_BRAKING_SPEED: f32 = 15.0;
    const BRAKING_THROTTLE: f32 = 0.3;
    const MUD_BRAKE: f32 = 0.15;
    const MIN_SLIP_SPEED: f32 = 15.0;
    /// Degrees of travel-direction error added to the steering error
    const MAX_SLIP_CORRECTION: f32 = 45.0;
    pub const FINISHED_BRAKE: f32 = 0.5;

    /// Compute this tick's controls for an AI car.
    ///
    /// Rounding a checkpoint advances the car's `next_checkpoint_index`.
    pub fn decide(state: &mut VehicleState, course: &Course, cfg: &SimConfig) -> Controls {
        if state.progress.race_finished {
            return Controls::coast(Self::FINISHED_BRAKE);
        }

        let ai = state.ai.unwrap_or_default();
        let target = Self::select_target(state, course, &ai, cfg);

        let distance = (target - state.position).norm();
        let to_target = bearing(state.position, target);
        let mut error = angle_difference(to_target, state.heading);
        if state.progress.race_started && state.speed > Self::MIN_SLIP_SPEED {
            // Steer the velocity onto the target, not just the nose. Not re-wrapped,
            // so a target behind the car keeps one steering direction.
            let slip = angle_difference(to_target, bearing(Vec2::zeros(), state.velocity));
            error += slip.clamp(-Self::MAX_SLIP_CORRECTION, Self::MAX_SLIP_CORRECTION);
        }

        let steer = (error * ai.steer_sharpness * Self::STEER_GAIN).clamp(-1.0, 1.0);

        let mut throttle = ai.throttle_control;
        if error.abs() > ai.turn_threshold * Self::THROTTLE_EASE_START {
            throttle *= 1.0 - (error.abs() / 90.0).clamp(0.0, Self::MAX_THROTTLE_REDUCTION);
        }

        let mut brake = 0.0;
        if state.progress.race_started {
            let threshold = state.speed * ai.brake_factor * Self::BRAKE_LOOKAHEAD;
            if distance < threshold && state.speed > Self::MIN_BRAKING_SPEED {
                let closeness = if threshold > 1e-3 { distance / threshold } else { 1.0 };
                brake = ai.brake_factor * (1.0 - closeness).clamp(0.2, 0.8);
                throttle *= Self::BRAKING_THROTTLE;
            }
        }

        if state.surface.on_mud {
            throttle *= ai.mud_reaction;
            brake = (brake + Self::MUD_BRAKE).clamp(0.0, 1.0);
        }

        Controls {
            throttle,
            brake,
            steer,
            handbrake: 0.0,
        }
        .clamped()
    }

    /// Where the car should be heading this tick
    fn select_target(state: &mut VehicleState, course: &Course, ai: &AiTuning, cfg: &SimConfig) -> Vec2 {
        if !state.progress.race_started {
            return course.start_target();
        }

        let index = state.progress.next_checkpoint_index;
        let Some(checkpoint) = course.checkpoint(index) else {
            // Lap complete, or an index past the end: head for the line
            return course.start_midpoint();
        };

        let radius = cfg.checkpoint_rounding_radius * ai.lookahead_factor;
        if (checkpoint.position - state.position).norm_squared() < radius * radius {
            state.progress.next_checkpoint_index = index + 1;
            if state.progress.next_checkpoint_index >= course.len() {
                return course.start_midpoint();
            }
        }
        checkpoint.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::race_sim::config::VehicleSetup;
    use crate::race_sim::geometry::vec2;
    use crate::race_sim::vehicle::PhysicsTuning;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const STEADY: AiTuning = AiTuning {
        throttle_control: 0.9,
        brake_factor: 0.8,
        steer_sharpness: 0.8,
        lookahead_factor: 1.0,
        turn_threshold: 20.0,
        mud_reaction: 0.5,
    };

    fn ai_car(position: Vec2, heading: f32, started: bool) -> (VehicleState, SimConfig) {
        let cfg = SimConfig::default();
        let tuning = PhysicsTuning::from_setup(VehicleSetup::default(), &cfg);
        let mut state = VehicleState::new(1, "AI".into(), tuning, Some(STEADY), &cfg);
        state.reset(position, heading, 3, &cfg);
        if started {
            state.progress.race_started = true;
            state.progress.current_lap = 1;
        }
        (state, cfg)
    }

    fn with_speed(state: &mut VehicleState, speed: f32) {
        state.velocity = crate::race_sim::geometry::heading_vector(state.heading) * speed;
        state.sync_speed();
    }

    #[test]
    fn difficulty_cycles() {
        let mut d = Difficulty::default();
        assert_eq!(d, Difficulty::Medium);
        for _ in 0..4 {
            d = d.next();
        }
        assert_eq!(d, Difficulty::Medium);
        assert_eq!(Difficulty::Easy.prev(), Difficulty::Random);
        assert_eq!(Difficulty::Hard.to_string(), "Hard");
        assert_eq!("random".parse::<Difficulty>(), Ok(Difficulty::Random));
        assert!("insane".parse::<Difficulty>().is_err());
    }

    #[test]
    fn fixed_presets() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let easy = AiTuning::preset(Difficulty::Easy, &mut rng);
        assert_eq!(easy.throttle_control, 0.78);
        assert_eq!(easy.turn_threshold, 45.0);

        let medium = AiTuning::preset(Difficulty::Medium, &mut rng);
        assert!((medium.throttle_control - 0.855).abs() < 1e-5);
        assert!((medium.brake_factor - 0.92).abs() < 1e-5);
        assert!((medium.lookahead_factor - 1.35).abs() < 1e-5);
        assert_eq!(medium.turn_threshold, 28.0);

        let hard = AiTuning::preset(Difficulty::Hard, &mut rng);
        assert_eq!(hard.lookahead_factor, 1.8);
        assert_eq!(hard.mud_reaction, 0.4);
    }

    #[test]
    fn random_preset_stays_clamped() {
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        for _ in 0..200 {
            let t = AiTuning::preset(Difficulty::Random, &mut rng);
            assert!((0.65..=1.0).contains(&t.throttle_control));
            assert!((0.5..=1.2).contains(&t.brake_factor));
            assert!((0.4..=1.0).contains(&t.steer_sharpness));
            assert!((0.3..=0.9).contains(&t.mud_reaction));
            assert!((0.9..=2.2).contains(&t.lookahead_factor));
            assert!((10.0..=50.0).contains(&t.turn_threshold));
        }
    }

    #[test]
    fn jitter_stays_clamped() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard, Difficulty::Random] {
            for _ in 0..50 {
                let t = AiTuning::for_difficulty(difficulty, &mut rng);
                assert!((0.6..=1.0).contains(&t.throttle_control));
                assert!((0.4..=1.3).contains(&t.brake_factor));
                assert!((0.3..=1.0).contains(&t.steer_sharpness));
                assert!((0.8..=2.5).contains(&t.lookahead_factor));
                assert!((10.0..=55.0).contains(&t.turn_threshold));
                assert!((0.2..=0.95).contains(&t.mud_reaction));
            }
        }
    }

    #[test]
    fn same_seed_same_tuning() {
        let a = AiTuning::for_difficulty(Difficulty::Random, &mut ChaCha8Rng::seed_from_u64(42));
        let b = AiTuning::for_difficulty(Difficulty::Random, &mut ChaCha8Rng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn aims_past_the_line_before_starting() {
        let course = Course::default();
        let (mut state, cfg) = ai_car(vec2(0.0, 20.0), 180.0, false);
        with_speed(&mut state, 200.0);

        let controls = AiDriver::decide(&mut state, &course, &cfg);
        // Target (-250, 0) is slightly to the right of straight ahead
        assert!(controls.steer > 0.0 && controls.steer < 0.5);
        assert_eq!(controls.brake, 0.0);
        assert_eq!(controls.throttle, STEADY.throttle_control);
        assert_eq!(controls.handbrake, 0.0);
    }

    #[test]
    fn steers_toward_checkpoint() {
        let course = Course::new(&[vec2(1000.0, 100.0), vec2(1000.0, -100.0)]);
        let (mut state, cfg) = ai_car(vec2(0.0, 0.0), 0.0, true);

        let controls = AiDriver::decide(&mut state, &course, &cfg);
        assert!(controls.steer > 0.0);
        assert_eq!(controls.throttle, STEADY.throttle_control);
        assert_eq!(state.progress.next_checkpoint_index, 0);
    }

    #[test]
    fn sharp_turn_eases_throttle() {
        let course = Course::new(&[vec2(0.0, 1000.0)]);
        let (mut state, cfg) = ai_car(vec2(0.0, 0.0), 0.0, true);

        let controls = AiDriver::decide(&mut state, &course, &cfg);
        assert_eq!(controls.steer, 1.0);
        // 90 degrees off: throttle reduced by the 60% cap
        assert!((controls.throttle - STEADY.throttle_control * 0.4).abs() < 1e-5);
    }

    #[test]
    fn brakes_when_arriving_fast() {
        let course = Course::new(&[vec2(100.0, 0.0), vec2(100.0, 500.0)]);
        let (mut state, cfg) = ai_car(vec2(0.0, 0.0), 0.0, true);
        with_speed(&mut state, 200.0);

        let controls = AiDriver::decide(&mut state, &course, &cfg);
        assert!(controls.brake > 0.0);
        assert!(controls.throttle <= STEADY.throttle_control * 0.3 + 1e-5);
    }

    #[test]
    fn sliding_car_steers_its_travel_onto_the_target() {
        let course = Course::new(&[vec2(1000.0, 0.0)]);
        let (mut state, cfg) = ai_car(vec2(0.0, 0.0), 0.0, true);
        // Nose on the target, but sliding 45 degrees off it
        state.velocity = vec2(100.0, 100.0);
        state.sync_speed();

        let controls = AiDriver::decide(&mut state, &course, &cfg);
        assert_eq!(controls.steer, -1.0);

        // Gripping at the same speed: nothing to correct
        with_speed(&mut state, 100.0 * std::f32::consts::SQRT_2);
        let controls = AiDriver::decide(&mut state, &course, &cfg);
        assert!(controls.steer.abs() < 1e-4);
    }

    #[test]
    fn target_behind_keeps_turning_the_same_way() {
        let (mut state, cfg) = ai_car(vec2(0.0, 0.0), 0.0, true);
        with_speed(&mut state, 200.0);

        let right = Course::new(&[vec2(-1000.0, 10.0)]);
        assert_eq!(AiDriver::decide(&mut state, &right, &cfg).steer, 1.0);

        let left = Course::new(&[vec2(-1000.0, -10.0)]);
        assert_eq!(AiDriver::decide(&mut state, &left, &cfg).steer, -1.0);
    }

    #[test]
    fn slow_cars_do_not_brake() {
        let course = Course::new(&[vec2(100.0, 0.0)]);
        let (mut state, cfg) = ai_car(vec2(0.0, 0.0), 0.0, true);
        with_speed(&mut state, 10.0);

        let controls = AiDriver::decide(&mut state, &course, &cfg);
        assert_eq!(controls.brake, 0.0);
    }

    #[test]
    fn mud_backs_off() {
        let course = Course::new(&[vec2(1000.0, 0.0)]);
        let (mut state, cfg) = ai_car(vec2(0.0, 0.0), 0.0, true);
        state.surface.on_mud = true;

        let controls = AiDriver::decide(&mut state, &course, &cfg);
        assert!((controls.throttle - STEADY.throttle_control * STEADY.mud_reaction).abs() < 1e-5);
        assert!((controls.brake - 0.15).abs() < 1e-6);
    }

    #[test]
    fn rounding_a_checkpoint_advances() {
        let course = Course::new(&[vec2(50.0, 0.0), vec2(1000.0, 0.0)]);
        let (mut state, cfg) = ai_car(vec2(0.0, 0.0), 0.0, true);

        AiDriver::decide(&mut state, &course, &cfg);
        assert_eq!(state.progress.next_checkpoint_index, 1);
    }

    #[test]
    fn last_checkpoint_retargets_finish() {
        let course = Course::new(&[vec2(-150.0, 0.0)]);
        let (mut state, cfg) = ai_car(vec2(-100.0, 0.0), 180.0, true);

        let controls = AiDriver::decide(&mut state, &course, &cfg);
        assert_eq!(state.progress.next_checkpoint_index, 1);
        // Finish midpoint (-200, 0) is dead ahead
        assert!(controls.steer.abs() < 1e-4);
    }

    #[test]
    fn out_of_range_index_heads_for_finish() {
        let course = Course::default();
        let (mut state, cfg) = ai_car(vec2(0.0, 0.0), 180.0, true);
        state.progress.next_checkpoint_index = 40;

        let controls = AiDriver::decide(&mut state, &course, &cfg);
        assert!(controls.steer.abs() < 1e-4);
        assert_eq!(state.progress.next_checkpoint_index, 40);
    }

    #[test]
    fn finished_cars_coast() {
        let course = Course::default();
        let (mut state, cfg) = ai_car(vec2(0.0, 0.0), 0.0, true);
        state.progress.race_finished = true;

        let controls = AiDriver::decide(&mut state, &course, &cfg);
        assert_eq!(controls, Controls::coast(AiDriver::FINISHED_BRAKE));
    }
}
