//! Physics - Arcade vehicle integrator
//!
//! Advances one car by one tick from its current controls and the surface
//! flags the track set for it. Each phase is its own function so it can be
//! exercised in isolation; `advance` composes them in a fixed order.
//! Every per-second decay is applied as `coefficient^dt`.

use crate::race_sim::config::{SimConfig, SurfaceModel};
use crate::race_sim::geometry::{
    angle_difference, bearing, direction_or_zero, heading_vector, lerp, normalize_angle, vec2, Vec2, EPSILON,
};
use crate::race_sim::vehicle::VehicleState;

/// Vehicle physics logic
pub struct PhysicsIntegrator;

impl PhysicsIntegrator {
    /// Brakes do nothing below this speed
    const BRAKE_EPSILON: f32 = 0.01;
    /// Inputs below this count as released
    const INPUT_DEADZONE: f32 = 0.01;
    const HANDBRAKE_ENGAGED: f32 = 0.5;
    /// Fraction the rpm relaxes toward idle when the car parks
    const IDLE_SETTLE: f32 = 0.1;
    /// Reference frame rate for `rpm_smoothing`
    const RPM_REFERENCE_HZ: f32 = 60.0;

    /// Advance a single car by `dt` seconds
    pub fn advance(state: &mut VehicleState, dt: f32, cfg: &SimConfig) {
        if !(dt > 0.0) {
            return;
        }

        state.prev_position = state.position;
        state.flags.handbraking = state.controls.handbrake > Self::HANDBRAKE_ENGAGED;

        Self::apply_steering(state, dt, cfg);
        let forward = heading_vector(state.heading);

        if !state.flags.airborne {
            Self::apply_acceleration(state, forward, dt, cfg);
            Self::apply_braking(state, dt);
        }

        Self::apply_friction(state, forward, dt, cfg);
        Self::clamp_speed(state);
        Self::stop_creep(state, cfg);

        state.position += state.velocity * dt;

        Self::update_rpm(state, dt, cfg);
        Self::tick_airborne(state, dt);
        state.sync_speed();
    }

    /// Launch the car off a ramp or crest; faster entry hangs longer.
    ///
    /// Returns whether a jump started.
    pub fn trigger_jump(state: &mut VehicleState, cfg: &SimConfig) -> bool {
        if state.flags.airborne {
            return false;
        }

        let ratio = speed_ratio(state.velocity.norm(), state.tuning.max_speed);
        let hang_time = lerp(cfg.base_airborne_duration, cfg.max_airborne_duration, ratio);
        if !(hang_time > 0.0) {
            return false;
        }

        state.flags.airborne = true;
        state.flags.drifting = false;
        state.airborne_timer = hang_time;
        log::debug!("car {} airborne for {:.2}s", state.id, hang_time);
        true
    }

    /// How much of the steering input turns the car at its current speed
    pub fn turn_effectiveness(speed: f32, max_speed: f32, airborne: bool, cfg: &SimConfig) -> f32 {
        let floor = if airborne {
            cfg.airborne_turn_effectiveness
        } else {
            cfg.min_turn_effectiveness
        };
        let factor = floor + (1.0 - floor) * (1.0 - speed_ratio(speed, max_speed));
        if airborne {
            factor * cfg.airborne_turn_effectiveness
        } else {
            factor
        }
    }

    pub fn apply_steering(state: &mut VehicleState, dt: f32, cfg: &SimConfig) {
        let effectiveness = Self::turn_effectiveness(
            state.velocity.norm(),
            state.tuning.max_speed,
            state.flags.airborne,
            cfg,
        );
        let turn = state.controls.steer * cfg.turn_rate * effectiveness * dt;
        state.heading = normalize_angle(state.heading + turn);
    }

    pub fn apply_acceleration(state: &mut VehicleState, forward: Vec2, dt: f32, cfg: &SimConfig) {
        let throttle =
            state.controls.throttle * (1.0 - state.controls.handbrake * cfg.handbrake_throttle_dampening);
        let accel = state.tuning.engine_power * throttle.max(0.0);
        state.velocity += forward * (accel * dt);
    }

    /// Brake impulse against the direction of travel; never reverses an axis
    pub fn apply_braking(state: &mut VehicleState, dt: f32) {
        if state.controls.brake <= 0.0 || state.velocity.norm() <= Self::BRAKE_EPSILON {
            return;
        }

        let impulse = -direction_or_zero(state.velocity) * (state.tuning.brake_power * state.controls.brake * dt);
        let v = &mut state.velocity;
        v.x = if impulse.x.abs() >= v.x.abs() { 0.0 } else { v.x + impulse.x };
        v.y = if impulse.y.abs() >= v.y.abs() { 0.0 } else { v.y + impulse.y };
    }

    /// Per-second friction coefficient and speed damping for the current terrain.
    ///
    /// Priority is airborne, road, mud, grass, then bare ground.
    pub fn surface_friction(state: &VehicleState, cfg: &SimConfig) -> (f32, f32) {
        if state.flags.airborne {
            return (cfg.airborne_friction, 1.0);
        }

        let surface = if state.surface.on_road {
            cfg.road
        } else if state.surface.on_mud {
            cfg.mud
        } else if state.surface.on_grass {
            cfg.grass
        } else {
            SurfaceModel::NEUTRAL
        };
        (state.tuning.base_friction * surface.friction_mul, surface.speed_damping)
    }

    /// Whether the car slides: fast enough and pointing away from its travel
    pub fn is_drifting(state: &VehicleState, cfg: &SimConfig) -> bool {
        let speed = state.velocity.norm();
        if speed <= state.tuning.drift_threshold_speed || speed <= EPSILON {
            return false;
        }
        let travel = bearing(Vec2::zeros(), state.velocity);
        angle_difference(state.heading, travel).abs() > cfg.drift_threshold_angle
    }

    /// Friction, surface drag and grip loss on the forward/sideways split
    pub fn apply_friction(state: &mut VehicleState, forward: Vec2, dt: f32, cfg: &SimConfig) {
        let (coefficient, damping) = Self::surface_friction(state, cfg);

        state.flags.drifting = !state.flags.airborne && Self::is_drifting(state, cfg);

        let (slide_mul, grip_loss) = if state.flags.airborne {
            (1.0, 1.0)
        } else if state.flags.handbraking {
            (state.tuning.handbrake_friction_mul, state.tuning.handbrake_side_grip_loss)
        } else if state.flags.drifting {
            (state.tuning.drift_friction_mul, 1.0)
        } else {
            (1.0, 1.0)
        };

        let decay = |c: f32| c.clamp(0.0, cfg.friction_cap).powf(dt);
        let damping = damping.clamp(0.0, 1.0).powf(dt);
        let forward_factor = decay(coefficient) * damping;
        let side_factor = decay(coefficient * slide_mul) * grip_loss.clamp(0.0, 1.0).powf(dt) * damping;

        let right = vec2(-forward.y, forward.x);
        let forward_speed = state.velocity.dot(&forward) * forward_factor;
        let side_speed = state.velocity.dot(&right) * side_factor;
        state.velocity = forward * forward_speed + right * side_speed;
    }

    pub fn clamp_speed(state: &mut VehicleState) {
        let speed = state.velocity.norm();
        let max_speed = state.tuning.max_speed.max(0.0);
        if speed > max_speed {
            state.velocity *= max_speed / speed;
        }
        state.sync_speed();
    }

    /// Park the car when it is barely moving with no input, avoiding jitter at rest
    pub fn stop_creep(state: &mut VehicleState, cfg: &SimConfig) {
        let idle_inputs = state.controls.throttle < Self::INPUT_DEADZONE
            && state.controls.brake < Self::INPUT_DEADZONE;
        if state.speed < cfg.creep_speed && idle_inputs && !state.flags.airborne {
            state.velocity = Vec2::zeros();
            state.speed = 0.0;
            state.rpm = lerp(state.rpm, cfg.idle_rpm, Self::IDLE_SETTLE);
        }
    }

    pub fn target_rpm(throttle: f32, speed: f32, max_speed: f32, cfg: &SimConfig) -> f32 {
        let ratio = speed_ratio(speed, max_speed);
        if throttle > 0.1 {
            cfg.idle_rpm + (cfg.max_rpm - cfg.idle_rpm) * (0.2 + 0.8 * throttle) * (0.4 + 0.6 * ratio)
        } else if speed > 0.1 {
            cfg.idle_rpm + cfg.max_rpm * 0.5 * ratio
        } else {
            cfg.idle_rpm
        }
    }

    pub fn update_rpm(state: &mut VehicleState, dt: f32, cfg: &SimConfig) {
        let target = Self::target_rpm(state.controls.throttle, state.speed, state.tuning.max_speed, cfg);
        let alpha = 1.0 - (1.0 - cfg.rpm_smoothing.clamp(0.0, 1.0)).powf(dt * Self::RPM_REFERENCE_HZ);
        let rpm = lerp(state.rpm, target, alpha);
        state.rpm = rpm.clamp(cfg.idle_rpm * 0.8, cfg.max_rpm.max(cfg.idle_rpm * 0.8));
    }

    pub fn tick_airborne(state: &mut VehicleState, dt: f32) {
        if !state.flags.airborne {
            state.airborne_timer = 0.0;
            return;
        }
        state.airborne_timer -= dt;
        if state.airborne_timer <= 0.0 {
            state.airborne_timer = 0.0;
            state.flags.airborne = false;
            log::debug!("car {} landed", state.id);
        }
    }
}

/// `speed / max_speed` in `[0, 1]`, zero for a car that cannot move
fn speed_ratio(speed: f32, max_speed: f32) -> f32 {
    if max_speed > EPSILON {
        (speed / max_speed).clamp(0.0, 1.0)
    } else {
        0.0
    }
}
